//! Checkout form command.

use async_trait::async_trait;
use larek_core::validation::validate_field;
use larek_core::OrderField;

use super::{Command, CommandContext};
use crate::bus::Event;
use crate::error::CommandResult;

/// Writes one checkout field and re-validates only that field.
///
/// The value and its validation message land in a single store update, so
/// listeners never see the new value paired with a stale message.
pub struct UpdateOrderField {
    ctx: CommandContext,
    field: OrderField,
    value: String,
    executed: bool,
    previous: Option<(String, Option<String>)>,
}

impl UpdateOrderField {
    const SOURCE: &'static str = "update_order_field";

    pub fn new(ctx: CommandContext, field: OrderField, value: impl Into<String>) -> Self {
        UpdateOrderField {
            ctx,
            field,
            value: value.into(),
            executed: false,
            previous: None,
        }
    }
}

#[async_trait]
impl Command for UpdateOrderField {
    fn can_execute(&self) -> bool {
        !self.executed
    }

    async fn execute(&mut self) -> CommandResult<()> {
        let field = self.field;
        let order = self.ctx.store.state().order.clone();
        self.previous = Some((
            order.value(field).to_string(),
            order.validation.get(field).map(str::to_string),
        ));

        let error = validate_field(field, &self.value)
            .err()
            .map(|e| e.to_string());
        self.ctx
            .store
            .update_order(|order| order.with_field(field, self.value.clone(), error));
        self.executed = true;

        self.ctx
            .emit(
                Event::OrderFieldUpdated {
                    field,
                    value: self.value.clone(),
                },
                Self::SOURCE,
            )
            .await
    }

    async fn undo(&mut self) -> CommandResult<()> {
        let Some((value, error)) = self.previous.take() else {
            return Ok(());
        };
        let field = self.field;

        self.ctx
            .store
            .update_order(|order| order.with_field(field, value.clone(), error));
        self.executed = false;

        self.ctx
            .emit(Event::OrderFieldUpdated { field, value }, Self::SOURCE)
            .await
    }

    fn description(&self) -> String {
        format!("Update order field: {}", self.field)
    }

    fn is_executed(&self) -> bool {
        self.executed
    }
}
