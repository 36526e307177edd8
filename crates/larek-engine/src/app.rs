//! # Storefront
//!
//! The composition root: owns the store, the bus and the command history,
//! and turns inbound events into commands.
//!
//! ## Event Routing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Storefront Routing                            │
//! │                                                                         │
//! │  Event (priority 1)            Command             On failure           │
//! │  ─────────────────────         ────────────────    ──────────────────   │
//! │  product:add-to-basket    ──►  AddToBasket         error toast          │
//! │  product:remove-from-...  ──►  RemoveFromBasket    error toast          │
//! │  basket:clear             ──►  ClearBasket         error toast          │
//! │  order:field:change       ──►  UpdateOrderField    log only             │
//! │  modal:open               ──►  OpenModal           log only             │
//! │  modal:close              ──►  CloseModal          log only             │
//! │                                                                         │
//! │  error (priority 0)       ──►  system error toast                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Re-entrancy
//! Commands run while the command history lock is held. A subscriber of an
//! outbound event that emits an inbound event inline would wait on that same
//! lock, so such a command is rejected with `CommandError::Reentrant` and
//! logged. Spawn a task to issue follow-up commands instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use larek_core::{AppState, Money, ModalKind, NewNotification, OrderState};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use crate::bus::{Event, EventBus, EventKind};
use crate::catalog::CatalogSource;
use crate::command::{
    AddToBasket, ClearBasket, CloseModal, Command, CommandContext, CommandManager, LoadCatalog,
    OpenModal, RemoveFromBasket, UpdateOrderField,
};
use crate::config::StorefrontConfig;
use crate::error::{BusResult, CommandError, CommandResult};
use crate::store::{ListenerId, Store};

/// Priority of the command-routing handlers.
const COMMAND_PRIORITY: i32 = 1;

/// Priority of the system error handler (runs before everything else).
const ERROR_PRIORITY: i32 = 0;

/// Source tag of events the storefront itself emits.
const SOURCE: &str = "storefront";

/// Source tag of events emitted on behalf of renderers.
const UI_SOURCE: &str = "ui";

tokio::task_local! {
    /// Set on the task that holds the command history lock.
    static COMMAND_IN_PROGRESS: ();
}

fn in_command() -> bool {
    COMMAND_IN_PROGRESS.try_with(|_| ()).is_ok()
}

fn reject_reentrant(description: &str) -> CommandResult<()> {
    if in_command() {
        warn!(command = %description, "Command issued from inside another command");
        return Err(CommandError::Reentrant {
            description: description.to_string(),
        });
    }
    Ok(())
}

/// Runs `command` through the history unless this task is already inside one.
async fn run_command(
    commands: &AsyncMutex<CommandManager>,
    command: Box<dyn Command>,
) -> CommandResult<()> {
    reject_reentrant(&command.description())?;
    let mut manager = commands.lock().await;
    COMMAND_IN_PROGRESS
        .scope((), manager.execute_command(command))
        .await
}

// =============================================================================
// Storefront
// =============================================================================

/// The running storefront.
pub struct Storefront {
    config: StorefrontConfig,
    store: Arc<Store>,
    bus: Arc<EventBus>,
    commands: Arc<AsyncMutex<CommandManager>>,
    catalog: Arc<dyn CatalogSource>,
    listeners: Mutex<Vec<ListenerId>>,
    initialized: AtomicBool,
}

impl Storefront {
    /// Builds the storefront and wires every event handler.
    pub fn new(config: StorefrontConfig, catalog: Arc<dyn CatalogSource>) -> Self {
        let storefront = Storefront {
            store: Arc::new(Store::new()),
            bus: Arc::new(EventBus::from_settings(&config.bus)),
            commands: Arc::new(AsyncMutex::new(CommandManager::new(
                config.commands.history_capacity,
            ))),
            catalog,
            listeners: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
            config,
        };

        storefront.register_validators();
        storefront.register_handlers();
        storefront
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &StorefrontConfig {
        &self.config
    }

    /// The current state snapshot.
    pub fn state(&self) -> Arc<AppState> {
        self.store.state()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// A context for commands built outside the event handlers.
    pub fn context(&self) -> CommandContext {
        CommandContext::new(
            Arc::clone(&self.store),
            Arc::clone(&self.bus),
            self.config.notifications,
        )
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Loads the catalog (forced) and announces `app:ready`.
    ///
    /// A second call only logs a warning.
    pub async fn initialize(&self) -> CommandResult<()> {
        if self.is_initialized() {
            warn!("Storefront already initialized");
            return Ok(());
        }

        let load = LoadCatalog::new(
            self.context(),
            Arc::clone(&self.catalog),
            self.config.api.cdn_url(),
            true,
        );
        self.execute(Box::new(load)).await?;

        self.watch_basket();
        self.initialized.store(true, Ordering::SeqCst);

        self.bus.emit(Event::AppReady, SOURCE, None).await?;
        info!(
            products = self.store.state().catalog.items.len(),
            "Storefront ready"
        );
        Ok(())
    }

    /// Drops state listeners, forgets command and event history and cancels
    /// notification timers. Event handlers stay registered, so the
    /// storefront can be initialized again.
    pub async fn destroy(&self) {
        let listeners: Vec<ListenerId> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for id in listeners {
            self.store.unsubscribe(id);
        }

        if in_command() {
            warn!("Destroy called from inside a command; command history kept");
        } else {
            self.commands.lock().await.clear_history();
        }
        self.bus.clear_history();
        self.store.cancel_notification_timers();
        self.initialized.store(false, Ordering::SeqCst);

        info!("Storefront destroyed");
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Runs a command through the shared history.
    pub async fn execute(&self, command: Box<dyn Command>) -> CommandResult<()> {
        run_command(&self.commands, command).await
    }

    pub async fn undo(&self) -> CommandResult<()> {
        reject_reentrant("undo")?;
        let mut manager = self.commands.lock().await;
        COMMAND_IN_PROGRESS.scope((), manager.undo()).await
    }

    pub async fn redo(&self) -> CommandResult<()> {
        reject_reentrant("redo")?;
        let mut manager = self.commands.lock().await;
        COMMAND_IN_PROGRESS.scope((), manager.redo()).await
    }

    /// False when asked from inside a running command.
    pub async fn can_undo(&self) -> bool {
        !in_command() && self.commands.lock().await.can_undo()
    }

    /// False when asked from inside a running command.
    pub async fn can_redo(&self) -> bool {
        !in_command() && self.commands.lock().await.can_redo()
    }

    /// Descriptions of the recorded commands, oldest first. Empty when asked
    /// from inside a running command.
    pub async fn command_history(&self) -> Vec<String> {
        if in_command() {
            return Vec::new();
        }
        self.commands.lock().await.descriptions()
    }

    // =========================================================================
    // Renderer Entry Points
    // =========================================================================

    /// Emits an event on behalf of a renderer.
    pub async fn dispatch(&self, event: Event) -> BusResult<()> {
        self.bus.emit(event, UI_SOURCE, None).await
    }

    /// Completes checkout: remembers the basket total for the success screen,
    /// clears the basket and opens the success modal.
    ///
    /// ## Returns
    /// The total that was ordered.
    pub async fn submit_order(&self) -> BusResult<Money> {
        let total = self.store.state().basket.total;
        self.store.update_order(|order| OrderState {
            last_order_total: total,
            ..order.clone()
        });
        info!(%total, "Order submitted");

        self.dispatch(Event::BasketClear).await?;
        self.dispatch(Event::ModalOpen {
            content: ModalKind::Success.as_str().to_string(),
            modal_type: Some(ModalKind::Success),
            product: None,
        })
        .await?;

        Ok(total)
    }

    // =========================================================================
    // Wiring
    // =========================================================================

    fn register_validators(&self) {
        self.bus.add_validator(EventKind::ProductAddToBasket, |event| {
            matches!(event, Event::ProductAddToBasket { product_id, .. } if !product_id.is_empty())
        });
        self.bus.add_validator(EventKind::ProductRemoveFromBasket, |event| {
            matches!(event, Event::ProductRemoveFromBasket { product_id } if !product_id.is_empty())
        });
        self.bus.add_validator(EventKind::ModalOpen, |event| {
            matches!(event, Event::ModalOpen { content, .. } if !content.is_empty())
        });
    }

    fn register_handlers(&self) {
        self.route(
            EventKind::ProductAddToBasket,
            Some("Could not add product to basket"),
            |ctx, event| match event {
                Event::ProductAddToBasket {
                    product_id,
                    product,
                } => Some(Box::new(AddToBasket::new(ctx, product_id, product)) as Box<dyn Command>),
                _ => None,
            },
        );

        self.route(
            EventKind::ProductRemoveFromBasket,
            Some("Could not remove product from basket"),
            |ctx, event| match event {
                Event::ProductRemoveFromBasket { product_id } => {
                    Some(Box::new(RemoveFromBasket::new(ctx, product_id)) as Box<dyn Command>)
                }
                _ => None,
            },
        );

        self.route(
            EventKind::BasketClear,
            Some("Could not clear basket"),
            |ctx, _| Some(Box::new(ClearBasket::new(ctx)) as Box<dyn Command>),
        );

        self.route(EventKind::OrderFieldChange, None, |ctx, event| match event {
            Event::OrderFieldChange { field, value } => {
                Some(Box::new(UpdateOrderField::new(ctx, field, value)) as Box<dyn Command>)
            }
            _ => None,
        });

        self.route(EventKind::ModalOpen, None, |ctx, event| match event {
            Event::ModalOpen {
                content,
                modal_type,
                product,
            } => Some(Box::new(OpenModal::new(ctx, content, modal_type, product)) as Box<dyn Command>),
            _ => None,
        });

        self.route(EventKind::ModalClose, None, |ctx, _| {
            Some(Box::new(CloseModal::new(ctx)) as Box<dyn Command>)
        });

        let store = Arc::clone(&self.store);
        let duration_ms = self.config.notifications.system_error_ms;
        self.bus
            .on_with_priority(EventKind::Error, ERROR_PRIORITY, move |event, context| {
                let store = Arc::clone(&store);
                async move {
                    if let Event::Error { message } = event {
                        error!(source = %context.source, %message, "System error");
                    }
                    store.add_notification(
                        NewNotification::error("A system error occurred")
                            .dismiss_after_ms(duration_ms),
                    );
                    Ok(())
                }
            });
    }

    /// Subscribes a handler that builds a command from the event and runs it.
    ///
    /// With `failure_message` set, a failed command also raises an error
    /// toast; otherwise the failure is only logged.
    fn route<B>(&self, kind: EventKind, failure_message: Option<&'static str>, build: B)
    where
        B: Fn(CommandContext, Event) -> Option<Box<dyn Command>> + Send + Sync + 'static,
    {
        let ctx = self.context();
        let commands = Arc::clone(&self.commands);
        let build = Arc::new(build);

        self.bus
            .on_with_priority(kind, COMMAND_PRIORITY, move |event, _| {
                let ctx = ctx.clone();
                let commands = Arc::clone(&commands);
                let build = Arc::clone(&build);

                async move {
                    let Some(command) = build(ctx.clone(), event) else {
                        return Ok(());
                    };
                    let description = command.description();

                    if let Err(e) = run_command(&commands, command).await {
                        error!(event = %kind, command = %description, error = %e, "Command failed");
                        if let Some(message) = failure_message {
                            ctx.notify_error(message.to_string());
                        }
                    }
                    Ok(())
                }
            });
    }

    /// Logs basket changes; the headless stand-in for the basket counter.
    fn watch_basket(&self) {
        let id = self.store.subscribe_with(
            |state| (state.basket.items.len(), state.basket.total),
            |state, _| {
                debug!(
                    items = state.basket.items.len(),
                    total = %state.basket.total,
                    "Basket changed"
                );
            },
        );
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(id);
    }
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("initialized", &self.is_initialized())
            .field("store", &self.store)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
