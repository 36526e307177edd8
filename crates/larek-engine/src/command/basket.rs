//! Basket commands.

use async_trait::async_trait;
use larek_core::{BasketLine, BasketState, Product};
use tracing::debug;

use super::{Command, CommandContext};
use crate::bus::{BasketAction, Event};
use crate::error::{CommandError, CommandResult};

// =============================================================================
// AddToBasket
// =============================================================================

/// Appends a line for `product_id` to the basket.
///
/// Adding a product that is already in the basket succeeds without changing
/// anything, and undoing such an add leaves the existing line alone.
pub struct AddToBasket {
    ctx: CommandContext,
    product_id: String,
    product: Product,
    executed: bool,
    added: bool,
}

impl AddToBasket {
    const SOURCE: &'static str = "add_to_basket";

    pub fn new(ctx: CommandContext, product_id: impl Into<String>, product: Product) -> Self {
        AddToBasket {
            ctx,
            product_id: product_id.into(),
            product,
            executed: false,
            added: false,
        }
    }
}

#[async_trait]
impl Command for AddToBasket {
    fn can_execute(&self) -> bool {
        !self.executed && !self.product_id.is_empty()
    }

    async fn execute(&mut self) -> CommandResult<()> {
        let id = self.product_id.clone();

        self.added = !self.ctx.store.state().basket.contains(&id);
        if self.added {
            self.ctx
                .store
                .update_basket(|basket| basket.with_product(&id, &self.product));
        } else {
            debug!(product = %id, "Product already in basket");
        }
        self.executed = true;

        self.ctx
            .emit(
                Event::BasketUpdated {
                    product_id: id,
                    action: BasketAction::Add,
                },
                Self::SOURCE,
            )
            .await?;

        self.ctx
            .notify_success(format!("\"{}\" added to basket", self.product.title));
        Ok(())
    }

    async fn undo(&mut self) -> CommandResult<()> {
        if !self.executed {
            return Ok(());
        }
        let id = self.product_id.clone();

        if self.added {
            self.ctx.store.update_basket(|basket| {
                basket.without(&id).unwrap_or_else(|_| basket.clone())
            });
            self.added = false;
        }
        self.executed = false;

        self.ctx
            .emit(
                Event::BasketUpdated {
                    product_id: id,
                    action: BasketAction::Remove,
                },
                Self::SOURCE,
            )
            .await
    }

    fn description(&self) -> String {
        format!("Add \"{}\" to basket", self.product.title)
    }

    fn is_executed(&self) -> bool {
        self.executed
    }
}

// =============================================================================
// RemoveFromBasket
// =============================================================================

/// Removes a product line; undo puts it back where it was.
pub struct RemoveFromBasket {
    ctx: CommandContext,
    product_id: String,
    executed: bool,
    removed: Option<(usize, BasketLine)>,
}

impl RemoveFromBasket {
    const SOURCE: &'static str = "remove_from_basket";

    pub fn new(ctx: CommandContext, product_id: impl Into<String>) -> Self {
        RemoveFromBasket {
            ctx,
            product_id: product_id.into(),
            executed: false,
            removed: None,
        }
    }
}

#[async_trait]
impl Command for RemoveFromBasket {
    fn can_execute(&self) -> bool {
        !self.executed && !self.product_id.is_empty()
    }

    async fn execute(&mut self) -> CommandResult<()> {
        let basket = self.ctx.store.state().basket.clone();
        let position = basket
            .position(&self.product_id)
            .ok_or_else(|| CommandError::NotInBasket(self.product_id.clone()))?;
        let line = basket.items[position].clone();

        self.ctx.store.update_basket(|basket| {
            basket.without(&self.product_id).unwrap_or_else(|_| basket.clone())
        });
        let title = line.title.clone();
        self.removed = Some((position, line));
        self.executed = true;

        self.ctx
            .emit(
                Event::BasketUpdated {
                    product_id: self.product_id.clone(),
                    action: BasketAction::Remove,
                },
                Self::SOURCE,
            )
            .await?;

        self.ctx
            .notify_info(format!("\"{}\" removed from basket", title));
        Ok(())
    }

    async fn undo(&mut self) -> CommandResult<()> {
        let Some((position, line)) = self.removed.take() else {
            return Ok(());
        };

        self.ctx.store.update_basket(|basket| {
            if basket.contains(&line.id) {
                basket.clone()
            } else {
                basket.with_line_at(position, line.clone())
            }
        });
        self.executed = false;

        self.ctx
            .emit(
                Event::BasketUpdated {
                    product_id: line.id,
                    action: BasketAction::Add,
                },
                Self::SOURCE,
            )
            .await
    }

    fn description(&self) -> String {
        format!("Remove product {} from basket", self.product_id)
    }

    fn is_executed(&self) -> bool {
        self.executed
    }
}

// =============================================================================
// ClearBasket
// =============================================================================

/// Empties the basket; undo restores the exact previous basket.
pub struct ClearBasket {
    ctx: CommandContext,
    executed: bool,
    cleared: Option<BasketState>,
}

impl ClearBasket {
    const SOURCE: &'static str = "clear_basket";

    pub fn new(ctx: CommandContext) -> Self {
        ClearBasket {
            ctx,
            executed: false,
            cleared: None,
        }
    }
}

#[async_trait]
impl Command for ClearBasket {
    fn can_execute(&self) -> bool {
        !self.executed
    }

    async fn execute(&mut self) -> CommandResult<()> {
        self.cleared = Some(self.ctx.store.state().basket.clone());
        self.ctx.store.update_basket(|_| BasketState::default());
        self.executed = true;

        self.ctx.emit(Event::BasketCleared, Self::SOURCE).await?;
        self.ctx.notify_info("Basket cleared".to_string());
        Ok(())
    }

    async fn undo(&mut self) -> CommandResult<()> {
        let Some(snapshot) = self.cleared.take() else {
            return Ok(());
        };

        self.ctx.store.update_basket(|_| snapshot);
        self.executed = false;

        self.ctx.emit(Event::BasketRestored, Self::SOURCE).await
    }

    fn description(&self) -> String {
        "Clear basket".to_string()
    }

    fn is_executed(&self) -> bool {
        self.executed
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
