//! # Command Manager
//!
//! Linear undo/redo history.
//!
//! ## History Layout
//! ```text
//!   history:  [ c0 ][ c1 ][ c2 ][ c3 ]
//!                         ▲
//!                       cursor (last applied command)
//!
//!   undo():   c2.undo(),  cursor → c1
//!   redo():   cursor → c3, c3.redo()
//!   execute(c4) with cursor on c2:
//!             c3 dropped, c4 appended, cursor → c4
//!   overflow: oldest entry evicted, cursor stays on the newest
//! ```

use tracing::{debug, info, warn};

use super::Command;
use crate::error::{CommandError, CommandResult};

/// Default number of undoable commands kept.
pub const DEFAULT_COMMAND_HISTORY: usize = 100;

/// Executes commands and owns their history.
pub struct CommandManager {
    history: Vec<Box<dyn Command>>,
    /// Number of commands currently applied; `history[..applied]` is done,
    /// `history[applied..]` is the redo tail.
    applied: usize,
    capacity: usize,
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_HISTORY)
    }
}

impl CommandManager {
    pub fn new(capacity: usize) -> Self {
        CommandManager {
            history: Vec::new(),
            applied: 0,
            capacity: capacity.max(1),
        }
    }

    /// Validates, records and executes a command.
    ///
    /// ## Returns
    /// - `Err(CommandError::CannotExecute)` if `can_execute()` is false;
    ///   history is untouched
    /// - otherwise the result of `execute()`
    ///
    /// The command takes its history slot (dropping the redo tail) before it
    /// runs, so a command that fails or does nothing still occupies the
    /// cursor. Undoing it is a no-op since it captured no undo data.
    pub async fn execute_command(&mut self, command: Box<dyn Command>) -> CommandResult<()> {
        let description = command.description();
        if !command.can_execute() {
            warn!(command = %description, "Command cannot be executed");
            return Err(CommandError::CannotExecute { description });
        }

        self.record(command);
        let Some(command) = self.history.last_mut() else {
            return Ok(());
        };

        let result = command.execute().await;
        match &result {
            Ok(()) => debug!(command = %description, history = self.history.len(), "Command executed"),
            Err(e) => debug!(command = %description, error = %e, "Command failed"),
        }
        result
    }

    /// Reverts the last applied command. No-op when nothing is applied.
    pub async fn undo(&mut self) -> CommandResult<()> {
        let Some(index) = self.applied.checked_sub(1) else {
            return Ok(());
        };

        let command = &mut self.history[index];
        command.undo().await?;
        self.applied = index;

        info!(command = %command.description(), "Undo");
        Ok(())
    }

    /// Re-applies the next undone command. No-op without a redo tail.
    pub async fn redo(&mut self) -> CommandResult<()> {
        let index = self.applied;
        let Some(command) = self.history.get_mut(index) else {
            return Ok(());
        };

        self.applied = index + 1;
        command.redo().await?;

        info!(command = %command.description(), "Redo");
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.history.len()
    }

    /// Forgets every command without reverting any state.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.applied = 0;
    }

    /// Index of the last applied command.
    pub fn cursor(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Descriptions of the recorded commands, oldest first.
    pub fn descriptions(&self) -> Vec<String> {
        self.history.iter().map(|c| c.description()).collect()
    }

    fn record(&mut self, command: Box<dyn Command>) {
        self.history.truncate(self.applied);
        self.history.push(command);
        if self.history.len() > self.capacity {
            self.history.remove(0);
        }
        self.applied = self.history.len();
    }
}

impl std::fmt::Debug for CommandManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandManager")
            .field("history", &self.descriptions())
            .field("cursor", &self.cursor())
            .field("capacity", &self.capacity)
            .finish()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::test_support::{context, product};
    use crate::catalog::StaticCatalog;
    use crate::command::{
        AddToBasket, ClearBasket, CloseModal, CommandContext, LoadCatalog, OpenModal,
        RemoveFromBasket, UpdateOrderField,
    };
    use async_trait::async_trait;
    use larek_core::{AppState, ModalKind, Money, OrderField};
    use proptest::prelude::*;
    use std::sync::{Arc, Mutex};

    /// Appends its label to a shared log on execute and pops on undo.
    struct Push {
        log: Arc<Mutex<Vec<u32>>>,
        label: u32,
        executed: bool,
    }

    impl Push {
        fn boxed(log: &Arc<Mutex<Vec<u32>>>, label: u32) -> Box<dyn Command> {
            Box::new(Push {
                log: Arc::clone(log),
                label,
                executed: false,
            })
        }
    }

    #[async_trait]
    impl Command for Push {
        fn can_execute(&self) -> bool {
            !self.executed
        }

        async fn execute(&mut self) -> CommandResult<()> {
            self.log.lock().unwrap().push(self.label);
            self.executed = true;
            Ok(())
        }

        async fn undo(&mut self) -> CommandResult<()> {
            self.log.lock().unwrap().retain(|l| *l != self.label);
            self.executed = false;
            Ok(())
        }

        fn description(&self) -> String {
            format!("push {}", self.label)
        }

        fn is_executed(&self) -> bool {
            self.executed
        }
    }

    #[tokio::test]
    async fn test_undo_redo_walks_the_cursor() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = CommandManager::default();

        for label in 1..=3 {
            manager.execute_command(Push::boxed(&log, label)).await.unwrap();
        }
        assert_eq!(manager.cursor(), Some(2));
        assert!(!manager.can_redo());

        manager.undo().await.unwrap();
        manager.undo().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec![1]);
        assert_eq!(manager.cursor(), Some(0));
        assert!(manager.can_redo());

        manager.redo().await.unwrap();
        assert_eq!(*log.lock().unwrap(), vec![1, 2]);
        assert_eq!(manager.cursor(), Some(1));
    }

    #[tokio::test]
    async fn test_new_command_drops_redo_tail() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = CommandManager::default();

        manager.execute_command(Push::boxed(&log, 1)).await.unwrap();
        manager.execute_command(Push::boxed(&log, 2)).await.unwrap();
        manager.undo().await.unwrap();

        manager.execute_command(Push::boxed(&log, 3)).await.unwrap();

        assert_eq!(manager.descriptions(), vec!["push 1", "push 3"]);
        assert!(!manager.can_redo());
    }

    #[tokio::test]
    async fn test_undo_and_redo_on_empty_history_are_noops() {
        let mut manager = CommandManager::default();
        assert!(!manager.can_undo());
        assert!(!manager.can_redo());
        manager.undo().await.unwrap();
        manager.redo().await.unwrap();
        assert_eq!(manager.cursor(), None);
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut manager = CommandManager::default();

        for label in 0..101 {
            manager.execute_command(Push::boxed(&log, label)).await.unwrap();
        }

        assert_eq!(manager.len(), 100);
        assert_eq!(manager.cursor(), Some(99));
        assert_eq!(manager.descriptions()[0], "push 1");
        assert!(manager.can_undo());
        assert!(!manager.can_redo());
    }

    #[tokio::test]
    async fn test_cannot_execute_leaves_history() {
        let ctx = context();
        let mut manager = CommandManager::default();

        let mut done = AddToBasket::new(ctx.clone(), "p1", product("p1", 10));
        done.execute().await.unwrap();

        let err = manager.execute_command(Box::new(done)).await.unwrap_err();

        assert!(matches!(err, CommandError::CannotExecute { .. }));
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_failed_command_still_takes_history_slot() {
        let ctx = context();
        let mut manager = CommandManager::default();
        manager
            .execute_command(Box::new(AddToBasket::new(ctx.clone(), "a", product("a", 100))))
            .await
            .unwrap();
        manager.undo().await.unwrap();
        assert!(manager.can_redo());

        let err = manager
            .execute_command(Box::new(RemoveFromBasket::new(ctx.clone(), "ghost")))
            .await
            .unwrap_err();

        assert_eq!(err, CommandError::NotInBasket("ghost".into()));
        assert_eq!(manager.len(), 1);
        assert!(manager.can_undo());
        assert!(!manager.can_redo());

        manager.undo().await.unwrap();
        assert!(ctx.store.state().basket.is_empty());
        assert!(!manager.can_undo());
    }

    #[tokio::test]
    async fn test_round_trip_restores_state() {
        let ctx = context();
        let mut manager = CommandManager::default();

        manager
            .execute_command(Box::new(AddToBasket::new(ctx.clone(), "a", product("a", 100))))
            .await
            .unwrap();
        manager
            .execute_command(Box::new(AddToBasket::new(ctx.clone(), "b", product("b", 250))))
            .await
            .unwrap();
        let before = ctx.store.state().basket.clone();

        let steps: Vec<Box<dyn Command>> = vec![
            Box::new(RemoveFromBasket::new(ctx.clone(), "a")),
            Box::new(UpdateOrderField::new(ctx.clone(), OrderField::Email, "bad")),
            Box::new(ClearBasket::new(ctx.clone())),
        ];
        for step in steps {
            manager.execute_command(step).await.unwrap();
        }
        assert!(ctx.store.state().basket.is_empty());

        for _ in 0..3 {
            manager.undo().await.unwrap();
        }
        let state = ctx.store.state();
        assert_eq!(state.basket, before);
        assert_eq!(state.order.email, "");
        assert_eq!(state.order.validation.email, None);

        for _ in 0..3 {
            manager.redo().await.unwrap();
        }
        assert!(ctx.store.state().basket.is_empty());
        assert_eq!(ctx.store.state().basket.total, Money::zero());
    }

    /// The parts of the state a command owns; notifications carry fresh ids.
    fn owned(state: &AppState) -> AppState {
        let mut state = state.clone();
        state.ui.notifications.clear();
        state
    }

    /// Execute, undo, redo: redo must land on the state execute produced.
    async fn assert_redo_reapplies(ctx: &CommandContext, mut command: Box<dyn Command>) {
        command.execute().await.unwrap();
        let applied = owned(&ctx.store.state());

        command.undo().await.unwrap();
        assert!(!command.is_executed());

        command.redo().await.unwrap();
        assert!(command.is_executed());
        assert_eq!(owned(&ctx.store.state()), applied);
    }

    #[tokio::test]
    async fn test_redo_reapplies_add_to_basket() {
        let ctx = context();
        ctx.store.update_basket(|b| b.with_product("a", &product("a", 100)));

        let add = AddToBasket::new(ctx.clone(), "b", product("b", 250));
        assert_redo_reapplies(&ctx, Box::new(add)).await;
        assert_eq!(ctx.store.state().basket.len(), 2);
    }

    #[tokio::test]
    async fn test_redo_reapplies_clear_basket() {
        let ctx = context();
        ctx.store.update_basket(|b| b.with_product("a", &product("a", 100)));

        assert_redo_reapplies(&ctx, Box::new(ClearBasket::new(ctx.clone()))).await;
        assert!(ctx.store.state().basket.is_empty());
    }

    #[tokio::test]
    async fn test_redo_reapplies_order_field() {
        let ctx = context();
        let update = UpdateOrderField::new(ctx.clone(), OrderField::Email, "bad");

        assert_redo_reapplies(&ctx, Box::new(update)).await;
        assert_eq!(ctx.store.state().order.email, "bad");
    }

    #[tokio::test]
    async fn test_redo_reapplies_open_modal() {
        let ctx = context();
        let open = OpenModal::new(
            ctx.clone(),
            "preview",
            Some(ModalKind::Preview),
            Some(product("p1", 100)),
        );

        assert_redo_reapplies(&ctx, Box::new(open)).await;
        assert!(ctx.store.state().ui.modal.is_open);
    }

    #[tokio::test]
    async fn test_redo_reapplies_close_modal() {
        let ctx = context();
        OpenModal::new(ctx.clone(), "basket", Some(ModalKind::Basket), None)
            .execute()
            .await
            .unwrap();

        assert_redo_reapplies(&ctx, Box::new(CloseModal::new(ctx.clone()))).await;
        assert!(!ctx.store.state().ui.modal.is_open);
    }

    #[tokio::test]
    async fn test_redo_reapplies_load_catalog() {
        let ctx = context();
        let source = Arc::new(StaticCatalog::new(vec![product("a", 100), product("b", 200)]));
        let load = LoadCatalog::new(ctx.clone(), source, "https://cdn.test", false);

        assert_redo_reapplies(&ctx, Box::new(load)).await;
        assert_eq!(ctx.store.state().catalog.items.len(), 2);
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Add(usize, i64),
        Remove(usize),
        Clear,
        Undo,
        Redo,
    }

    const IDS: [&str; 3] = ["a", "b", "c"];

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..IDS.len(), 1i64..10_000).prop_map(|(i, price)| Op::Add(i, price)),
            (0..IDS.len()).prop_map(Op::Remove),
            Just(Op::Clear),
            Just(Op::Undo),
            Just(Op::Redo),
        ]
    }

    proptest! {
        #[test]
        fn test_random_sequences_keep_basket_consistent(ops in prop::collection::vec(op(), 0..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let ctx = context();
                let mut manager = CommandManager::default();

                for op in ops {
                    // Rejected and failed commands are part of the sequence.
                    let _ = match op {
                        Op::Add(i, price) => {
                            let add = AddToBasket::new(ctx.clone(), IDS[i], product(IDS[i], price));
                            manager.execute_command(Box::new(add)).await
                        }
                        Op::Remove(i) => {
                            let remove = RemoveFromBasket::new(ctx.clone(), IDS[i]);
                            manager.execute_command(Box::new(remove)).await
                        }
                        Op::Clear => {
                            manager.execute_command(Box::new(ClearBasket::new(ctx.clone()))).await
                        }
                        Op::Undo => manager.undo().await,
                        Op::Redo => manager.redo().await,
                    };

                    let basket = ctx.store.state().basket.clone();
                    assert!(basket.is_consistent(), "{op:?} left {basket:?}");
                    assert!(manager.len() <= DEFAULT_COMMAND_HISTORY);
                }
            });
        }
    }
}
