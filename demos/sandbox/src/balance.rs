//! Wallet bookkeeping.

use std::collections::BTreeMap;
use std::sync::Arc;

use engine_bus::{Delivery, Event};
use engine_component::{Entity, InterestSet, interest};
use engine_system::System;
use parking_lot::RwLock;
use tracing::info;

use crate::components::Wallet;
use crate::events::BalanceChange;

interest! {
    /// What the balance system keeps per entity.
    #[derive(Debug)]
    pub struct Account {
        pub wallet: Wallet,
    }
}

/// Read-only mirror of the balance system's wallets, for code that is not a
/// subscriber (dialog scripts).
#[derive(Debug, Clone, Default)]
pub struct BalanceBook(Arc<RwLock<BTreeMap<Entity, i64>>>);

impl BalanceBook {
    /// The last known balance of `entity`.
    #[must_use]
    pub fn balance(&self, entity: Entity) -> Option<i64> {
        self.0.read().get(&entity).copied()
    }

    fn record(&self, entity: Entity, balance: i64) {
        self.0.write().insert(entity, balance);
    }

    fn forget(&self, entity: Entity) {
        self.0.write().remove(&entity);
    }
}

/// Owns every wallet and applies [`BalanceChange`] events.
///
/// A change for an entity without a wallet is a protocol violation.
#[derive(Debug, Default)]
pub struct BalanceSystem {
    accounts: InterestSet<Account>,
    book: BalanceBook,
}

impl BalanceSystem {
    #[must_use]
    pub fn new(book: BalanceBook) -> Self {
        Self {
            accounts: InterestSet::new(),
            book,
        }
    }

    /// The wallets currently tracked.
    #[must_use]
    pub fn accounts(&self) -> &InterestSet<Account> {
        &self.accounts
    }
}

impl System for BalanceSystem {
    fn name(&self) -> &str {
        "balance"
    }

    async fn handle(&mut self, delivery: &Delivery) {
        let event = delivery.event();
        match event {
            Event::EntityAdded { entity, .. } => {
                if event.track(&mut self.accounts) {
                    let balance = self.accounts.require(*entity, "new wallet").wallet.balance;
                    self.book.record(*entity, balance);
                }
            }
            Event::EntityRemoved { entity } => {
                if event.track(&mut self.accounts) {
                    self.book.forget(*entity);
                }
            }
            _ => {
                if let Some(change) = event.downcast::<BalanceChange>() {
                    let account = self.accounts.require_mut(change.entity, "balance change");
                    account.wallet.balance += change.change;
                    let balance = account.wallet.balance;
                    self.book.record(change.entity, balance);
                    info!(entity = %change.entity, change = change.change, balance, "balance changed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_app::{EngineConfig, TickConfig, TickLoop};
    use engine_component::bundle;
    use engine_math::Transform2D;

    use super::*;

    fn tick_loop() -> TickLoop {
        TickLoop::new(EngineConfig {
            tick: TickConfig {
                tick_rate: 0.0,
                max_ticks: 0,
            },
            ..EngineConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_only_wallet_holders_are_tracked_and_changes_apply() {
        let book = BalanceBook::default();
        let mut tick_loop = tick_loop();
        let commands = tick_loop.commands();
        let balance = tick_loop.add_system(BalanceSystem::new(book.clone())).unwrap();

        let a = commands.create(bundle![
            Transform2D::at(0.0, 0.0),
            Wallet { balance: 100 }
        ]);
        let b = commands.create(bundle![Transform2D::at(5.0, 0.0)]);
        tick_loop.tick().await;
        assert_eq!(book.balance(a), Some(100));
        assert_eq!(book.balance(b), None);

        commands.schedule_next_frame(Event::user(BalanceChange {
            entity: a,
            change: -20,
        }));
        tick_loop.tick().await;
        assert_eq!(book.balance(a), Some(80));
        tick_loop.shutdown();

        let balance = balance.join().await.unwrap();
        let tracked: Vec<Entity> = balance.accounts().entities().collect();
        assert_eq!(tracked, vec![a]);
        assert_eq!(balance.accounts().require(a, "test").wallet.balance, 80);
    }

    #[tokio::test]
    async fn test_removed_wallets_leave_the_book() {
        let book = BalanceBook::default();
        let mut tick_loop = tick_loop();
        let commands = tick_loop.commands();
        let _balance = tick_loop.add_system(BalanceSystem::new(book.clone())).unwrap();

        let a = commands.create(bundle![Wallet { balance: 1 }]);
        tick_loop.tick().await;
        commands.destroy(a);
        tick_loop.tick().await;
        assert_eq!(book.balance(a), None);
        tick_loop.shutdown();
    }

    #[tokio::test]
    #[should_panic(expected = "failed while handling BalanceChange")]
    async fn test_change_for_unknown_wallet_is_a_violation() {
        let mut tick_loop = tick_loop();
        let commands = tick_loop.commands();
        let _balance = tick_loop.add_system(BalanceSystem::default()).unwrap();

        commands.schedule_next_frame(Event::user(BalanceChange {
            entity: Entity(42),
            change: 5,
        }));
        tick_loop.tick().await;
    }
}
