//! # Commands
//!
//! Reversible user actions and the history that undoes and redoes them.
//!
//! ## Command Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Command Lifecycle                              │
//! │                                                                         │
//! │   new(ctx, args)                                                        │
//! │        │                                                                │
//! │        ▼  can_execute()?  ── no ──► CommandError::CannotExecute         │
//! │   ┌─────────┐                                                           │
//! │   │ pending │── execute() ─► capture undo data                          │
//! │   └─────────┘                mutate Store                               │
//! │        ▲                     emit outbound event                        │
//! │        │                     queue notification                         │
//! │        │                           │                                    │
//! │     undo()                         ▼                                    │
//! │        │                    ┌────────────┐                              │
//! │        └────────────────────│  executed  │── redo() = undo? + execute   │
//! │                             └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Variants
//! - [`AddToBasket`], [`RemoveFromBasket`], [`ClearBasket`] - basket
//! - [`UpdateOrderField`] - checkout form
//! - [`OpenModal`], [`CloseModal`] - modal slot
//! - [`LoadCatalog`] - catalog fetch through a [`CatalogSource`](crate::catalog::CatalogSource)

mod basket;
mod catalog;
mod manager;
mod modal;
mod order;

pub use basket::{AddToBasket, ClearBasket, RemoveFromBasket};
pub use catalog::{LoadCatalog, CATALOG_ERROR_MESSAGE};
pub use manager::{CommandManager, DEFAULT_COMMAND_HISTORY};
pub use modal::{CloseModal, OpenModal};
pub use order::UpdateOrderField;

use std::sync::Arc;

use async_trait::async_trait;
use larek_core::NewNotification;

use crate::bus::{Event, EventBus};
use crate::config::NotificationSettings;
use crate::error::CommandResult;
use crate::store::Store;

// =============================================================================
// Command Trait
// =============================================================================

/// A reversible action against the store.
///
/// Implementations keep their own undo data and flip `is_executed` as soon
/// as their state mutation has been applied.
#[async_trait]
pub trait Command: Send + Sync {
    /// Precondition checked by the manager before `execute`.
    fn can_execute(&self) -> bool;

    async fn execute(&mut self) -> CommandResult<()>;

    async fn undo(&mut self) -> CommandResult<()>;

    /// Re-applies the command, undoing first if it is still applied.
    async fn redo(&mut self) -> CommandResult<()> {
        if self.is_executed() {
            self.undo().await?;
        }
        self.execute().await
    }

    /// Human-readable summary for logs and history views.
    fn description(&self) -> String;

    fn is_executed(&self) -> bool;
}

// =============================================================================
// Command Context
// =============================================================================

/// Collaborators every command works against.
#[derive(Clone)]
pub struct CommandContext {
    pub store: Arc<Store>,
    pub bus: Arc<EventBus>,
    pub notifications: NotificationSettings,
}

impl CommandContext {
    pub fn new(store: Arc<Store>, bus: Arc<EventBus>, notifications: NotificationSettings) -> Self {
        CommandContext {
            store,
            bus,
            notifications,
        }
    }

    /// Emits an outbound event tagged with the issuing command.
    pub(crate) async fn emit(&self, event: Event, source: &str) -> CommandResult<()> {
        self.bus.emit(event, source, None).await?;
        Ok(())
    }

    /// Queues a success toast with the info delay.
    pub(crate) fn notify_success(&self, message: String) {
        self.store.add_notification(
            NewNotification::success(message).dismiss_after_ms(self.notifications.info_ms),
        );
    }

    /// Queues an info toast with the info delay.
    pub(crate) fn notify_info(&self, message: String) {
        self.store.add_notification(
            NewNotification::info(message).dismiss_after_ms(self.notifications.info_ms),
        );
    }

    /// Queues an error toast with the error delay.
    pub(crate) fn notify_error(&self, message: String) {
        self.store.add_notification(
            NewNotification::error(message).dismiss_after_ms(self.notifications.error_ms),
        );
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}
