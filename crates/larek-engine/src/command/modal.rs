//! Modal commands.
//!
//! Both commands remember the modal they replaced, so undo is always the
//! exact inverse, whatever was on screen before.

use async_trait::async_trait;
use larek_core::{ModalKind, ModalState, Product, DEFAULT_MODAL_CONTENT};

use super::{Command, CommandContext};
use crate::bus::Event;
use crate::error::CommandResult;

/// Event matching a modal state: `modal:opened` or `modal:closed`.
fn modal_event(modal: &ModalState) -> Event {
    if modal.is_open {
        Event::ModalOpened {
            content: modal.content.clone(),
            product: modal.product.clone(),
        }
    } else {
        Event::ModalClosed
    }
}

/// Puts `modal` on screen and returns what it replaced.
fn swap_modal(ctx: &CommandContext, modal: ModalState) -> ModalState {
    let previous = ctx.store.state().ui.modal.clone();
    ctx.store.update_ui(|ui| {
        let mut ui = ui.clone();
        ui.modal = modal;
        ui
    });
    previous
}

// =============================================================================
// OpenModal
// =============================================================================

/// Opens the modal slot.
pub struct OpenModal {
    ctx: CommandContext,
    content: String,
    modal_type: Option<ModalKind>,
    product: Option<Product>,
    executed: bool,
    previous: Option<ModalState>,
}

impl OpenModal {
    const SOURCE: &'static str = "open_modal";

    pub fn new(
        ctx: CommandContext,
        content: impl Into<String>,
        modal_type: Option<ModalKind>,
        product: Option<Product>,
    ) -> Self {
        OpenModal {
            ctx,
            content: content.into(),
            modal_type,
            product,
            executed: false,
            previous: None,
        }
    }

    /// Content to render: explicit content, else the modal kind, else the
    /// default content.
    fn resolved_content(&self) -> String {
        if !self.content.is_empty() {
            self.content.clone()
        } else if let Some(kind) = self.modal_type {
            kind.as_str().to_string()
        } else {
            DEFAULT_MODAL_CONTENT.to_string()
        }
    }
}

#[async_trait]
impl Command for OpenModal {
    fn can_execute(&self) -> bool {
        !self.executed && !self.content.is_empty()
    }

    async fn execute(&mut self) -> CommandResult<()> {
        let modal = ModalState::open(self.resolved_content(), self.product.clone());
        let event = modal_event(&modal);

        self.previous = Some(swap_modal(&self.ctx, modal));
        self.executed = true;

        self.ctx.emit(event, Self::SOURCE).await
    }

    async fn undo(&mut self) -> CommandResult<()> {
        let Some(previous) = self.previous.take() else {
            return Ok(());
        };
        let event = modal_event(&previous);

        swap_modal(&self.ctx, previous);
        self.executed = false;

        self.ctx.emit(event, Self::SOURCE).await
    }

    fn description(&self) -> String {
        let kind = self.modal_type.map_or(DEFAULT_MODAL_CONTENT, |k| k.as_str());
        format!("Open modal: {}", kind)
    }

    fn is_executed(&self) -> bool {
        self.executed
    }
}

// =============================================================================
// CloseModal
// =============================================================================

/// Closes the modal slot.
pub struct CloseModal {
    ctx: CommandContext,
    executed: bool,
    previous: Option<ModalState>,
}

impl CloseModal {
    const SOURCE: &'static str = "close_modal";

    pub fn new(ctx: CommandContext) -> Self {
        CloseModal {
            ctx,
            executed: false,
            previous: None,
        }
    }
}

#[async_trait]
impl Command for CloseModal {
    fn can_execute(&self) -> bool {
        !self.executed
    }

    async fn execute(&mut self) -> CommandResult<()> {
        self.previous = Some(swap_modal(&self.ctx, ModalState::closed()));
        self.executed = true;

        self.ctx.emit(Event::ModalClosed, Self::SOURCE).await
    }

    async fn undo(&mut self) -> CommandResult<()> {
        let Some(previous) = self.previous.take() else {
            return Ok(());
        };
        let event = modal_event(&previous);

        swap_modal(&self.ctx, previous);
        self.executed = false;

        self.ctx.emit(event, Self::SOURCE).await
    }

    fn description(&self) -> String {
        "Close modal".to_string()
    }

    fn is_executed(&self) -> bool {
        self.executed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::test_support::{context, product};

    #[tokio::test]
    async fn test_open_sets_content_and_product() {
        let ctx = context();
        let item = product("p1", 100);
        let mut cmd = OpenModal::new(
            ctx.clone(),
            "preview",
            Some(ModalKind::Preview),
            Some(item.clone()),
        );

        cmd.execute().await.unwrap();

        let modal = ctx.store.state().ui.modal.clone();
        assert!(modal.is_open);
        assert_eq!(modal.content.as_deref(), Some("preview"));
        assert_eq!(modal.product, Some(item));
    }

    #[tokio::test]
    async fn test_open_requires_content() {
        let ctx = context();
        let cmd = OpenModal::new(ctx, "", Some(ModalKind::Basket), None);
        assert!(!cmd.can_execute());
        assert_eq!(cmd.resolved_content(), "basket");
    }

    #[tokio::test]
    async fn test_open_undo_restores_previous_modal() {
        let ctx = context();
        OpenModal::new(ctx.clone(), "basket", Some(ModalKind::Basket), None)
            .execute()
            .await
            .unwrap();
        let basket_modal = ctx.store.state().ui.modal.clone();

        let mut order = OpenModal::new(ctx.clone(), "order", Some(ModalKind::Order), None);
        order.execute().await.unwrap();
        order.undo().await.unwrap();

        assert_eq!(ctx.store.state().ui.modal, basket_modal);
        assert_eq!(
            ctx.bus.history().pop().unwrap().payload,
            Event::ModalOpened {
                content: Some("basket".into()),
                product: None
            }
        );
    }

    #[tokio::test]
    async fn test_open_undo_from_closed_closes() {
        let ctx = context();
        let mut cmd = OpenModal::new(ctx.clone(), "basket", None, None);
        cmd.execute().await.unwrap();
        cmd.undo().await.unwrap();

        assert_eq!(ctx.store.state().ui.modal, ModalState::closed());
        assert_eq!(ctx.bus.history().pop().unwrap().payload, Event::ModalClosed);
    }

    #[tokio::test]
    async fn test_close_and_undo() {
        let ctx = context();
        let item = product("p9", 900);
        OpenModal::new(ctx.clone(), "preview", Some(ModalKind::Preview), Some(item))
            .execute()
            .await
            .unwrap();
        let open = ctx.store.state().ui.modal.clone();

        let mut close = CloseModal::new(ctx.clone());
        close.execute().await.unwrap();
        let closed = ctx.store.state().ui.modal.clone();
        assert!(!closed.is_open);
        assert_eq!(closed.content, None);
        assert_eq!(closed.product, None);

        close.undo().await.unwrap();
        assert_eq!(ctx.store.state().ui.modal, open);
    }
}
