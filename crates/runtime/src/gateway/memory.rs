//! In-memory gateway implementation for tests and local runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use economy_core::{Catalog, EconomyRecord, ItemId, OwnedItem, PlayerId, derive_rate, price};

use super::{GatewayError, PersistenceGateway, Result};

/// One call made against the gateway, recorded in order of arrival.
///
/// Scenario tests use this to assert protocol ordering (e.g. that a save of
/// the latest balance reaches the store before the grant does).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayOp {
    LoadEconomy,
    LoadOwnedItems,
    SaveEconomy { credits: u64, total_clicks: u64 },
    GrantItem(ItemId),
}

/// [`PersistenceGateway`] backed by in-memory maps.
///
/// Behaves like the real record store at the contract level: it stamps
/// `last_save_at` on every write, re-validates affordability on grants at
/// the current price-curve position, and re-derives the stored accrual rate
/// from owned items. Fault injection flags let tests exercise the transient
/// failure paths.
pub struct InMemoryGateway {
    catalog: Arc<dyn Catalog>,
    players: RwLock<HashMap<PlayerId, EconomyRecord>>,
    owned: RwLock<HashMap<PlayerId, BTreeMap<ItemId, u32>>>,
    fail_next_save: AtomicBool,
    fail_next_grant: AtomicBool,
    operations: Mutex<Vec<GatewayOp>>,
}

impl InMemoryGateway {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            players: RwLock::new(HashMap::new()),
            owned: RwLock::new(HashMap::new()),
            fail_next_save: AtomicBool::new(false),
            fail_next_grant: AtomicBool::new(false),
            operations: Mutex::new(Vec::new()),
        }
    }

    /// Insert a player record and owned items directly, bypassing the
    /// operation log. Test and seeding use only.
    pub fn seed_player(&self, record: EconomyRecord, items: Vec<OwnedItem>) {
        let player = record.player.clone();
        self.players
            .write()
            .expect("gateway lock poisoned")
            .insert(player.clone(), record);
        self.owned.write().expect("gateway lock poisoned").insert(
            player,
            items
                .into_iter()
                .map(|entry| (entry.item, entry.quantity))
                .collect(),
        );
    }

    /// Current persisted record for a player, if any.
    pub fn record(&self, player: &PlayerId) -> Option<EconomyRecord> {
        self.players
            .read()
            .expect("gateway lock poisoned")
            .get(player)
            .cloned()
    }

    /// Make the next `save_economy` call fail with a transient error.
    pub fn fail_next_save(&self) {
        self.fail_next_save.store(true, Ordering::SeqCst);
    }

    /// Make the next `grant_item` call fail with a transient error.
    pub fn fail_next_grant(&self) {
        self.fail_next_grant.store(true, Ordering::SeqCst);
    }

    /// All operations received so far, in arrival order.
    pub fn operations(&self) -> Vec<GatewayOp> {
        self.operations
            .lock()
            .expect("gateway lock poisoned")
            .clone()
    }

    fn log(&self, op: GatewayOp) {
        if let Ok(mut ops) = self.operations.lock() {
            ops.push(op);
        }
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn load_economy(&self, player: &PlayerId) -> Result<EconomyRecord> {
        self.log(GatewayOp::LoadEconomy);
        let players = self
            .players
            .read()
            .map_err(|_| GatewayError::Transient("gateway lock poisoned".into()))?;
        players
            .get(player)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(player.clone()))
    }

    async fn load_owned_items(&self, player: &PlayerId) -> Result<Vec<OwnedItem>> {
        self.log(GatewayOp::LoadOwnedItems);
        let owned = self
            .owned
            .read()
            .map_err(|_| GatewayError::Transient("gateway lock poisoned".into()))?;
        Ok(owned
            .get(player)
            .map(|items| {
                items
                    .iter()
                    .map(|(item, &quantity)| OwnedItem::new(item.clone(), quantity))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn save_economy(
        &self,
        player: &PlayerId,
        credits: u64,
        total_clicks: u64,
    ) -> Result<()> {
        self.log(GatewayOp::SaveEconomy {
            credits,
            total_clicks,
        });
        if self.fail_next_save.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Transient("injected save failure".into()));
        }

        let mut players = self
            .players
            .write()
            .map_err(|_| GatewayError::Transient("gateway lock poisoned".into()))?;
        let record = players
            .get_mut(player)
            .ok_or_else(|| GatewayError::NotFound(player.clone()))?;

        record.credits = credits;
        // Lifetime clicks never regress on the record.
        record.total_clicks = record.total_clicks.max(total_clicks);
        record.last_save_at = Utc::now();
        Ok(())
    }

    async fn grant_item(&self, player: &PlayerId, item: &ItemId) -> Result<EconomyRecord> {
        self.log(GatewayOp::GrantItem(item.clone()));
        if self.fail_next_grant.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Transient("injected grant failure".into()));
        }

        let def = self
            .catalog
            .definition(item)
            .ok_or_else(|| GatewayError::Transient(format!("unknown catalog item {item}")))?;

        let mut players = self
            .players
            .write()
            .map_err(|_| GatewayError::Transient("gateway lock poisoned".into()))?;
        let mut owned = self
            .owned
            .write()
            .map_err(|_| GatewayError::Transient("gateway lock poisoned".into()))?;

        let record = players
            .get_mut(player)
            .ok_or_else(|| GatewayError::NotFound(player.clone()))?;
        let items = owned.entry(player.clone()).or_default();

        let quantity = items.get(item).copied().unwrap_or(0);
        let current_price = price(def.base_cost, quantity);
        if record.credits < current_price {
            return Err(GatewayError::InsufficientFunds {
                price: current_price,
                balance: record.credits,
            });
        }

        record.credits -= current_price;
        *items.entry(item.clone()).or_insert(0) += 1;
        record.accrual_rate = derive_rate(items, self.catalog.as_ref());
        record.last_save_at = Utc::now();
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use economy_core::{ItemDefinition, ItemEffect};

    struct OneItemCatalog;

    impl Catalog for OneItemCatalog {
        fn definition(&self, id: &ItemId) -> Option<ItemDefinition> {
            (id.as_str() == "wrench").then(|| ItemDefinition {
                id: ItemId::new("wrench"),
                name: "Wrench".into(),
                base_cost: 10,
                effect: ItemEffect::FlatRateBonus {
                    credits_per_second: 0.5,
                },
                category: "tool".into(),
            })
        }

        fn all_definitions(&self) -> Vec<ItemDefinition> {
            vec![self.definition(&ItemId::new("wrench")).unwrap()]
        }
    }

    fn seeded(credits: u64) -> (InMemoryGateway, PlayerId) {
        let gateway = InMemoryGateway::new(Arc::new(OneItemCatalog));
        let player = PlayerId::new("p1");
        gateway.seed_player(
            EconomyRecord {
                player: player.clone(),
                display_name: "Player One".into(),
                credits,
                total_clicks: 0,
                accrual_rate: 0.0,
                last_save_at: Utc::now(),
                created_at: Utc::now(),
            },
            Vec::new(),
        );
        (gateway, player)
    }

    #[tokio::test]
    async fn grant_debits_current_price_and_derives_rate() {
        let (gateway, player) = seeded(100);
        let item = ItemId::new("wrench");

        let record = gateway.grant_item(&player, &item).await.unwrap();
        assert_eq!(record.credits, 90);
        assert_eq!(record.accrual_rate, 0.5);

        // Second unit costs floor(10 * 1.15) = 11.
        let record = gateway.grant_item(&player, &item).await.unwrap();
        assert_eq!(record.credits, 79);
        assert_eq!(record.accrual_rate, 1.0);
    }

    #[tokio::test]
    async fn grant_rejects_when_recorded_balance_is_short() {
        let (gateway, player) = seeded(5);
        let err = gateway
            .grant_item(&player, &ItemId::new("wrench"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::InsufficientFunds {
                price: 10,
                balance: 5
            }
        ));
        // Nothing was persisted.
        assert_eq!(gateway.record(&player).unwrap().credits, 5);
        assert!(
            gateway
                .load_owned_items(&player)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn save_updates_record_and_keeps_clicks_monotonic() {
        let (gateway, player) = seeded(0);
        gateway.save_economy(&player, 42, 10).await.unwrap();
        gateway.save_economy(&player, 50, 3).await.unwrap();

        let record = gateway.record(&player).unwrap();
        assert_eq!(record.credits, 50);
        assert_eq!(record.total_clicks, 10);
    }

    #[tokio::test]
    async fn unknown_player_is_not_found() {
        let gateway = InMemoryGateway::new(Arc::new(OneItemCatalog));
        let err = gateway
            .load_economy(&PlayerId::new("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn injected_failures_fire_once() {
        let (gateway, player) = seeded(100);
        gateway.fail_next_save();
        assert!(gateway.save_economy(&player, 1, 1).await.is_err());
        assert!(gateway.save_economy(&player, 1, 1).await.is_ok());
    }
}
