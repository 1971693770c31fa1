//! Scenario tests for the purchase-settlement protocol.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use catalog::StaticCatalog;
use economy_core::{
    Catalog, EconomyRecord, ItemDefinition, ItemEffect, ItemId, OwnedItem, PlayerId, SessionState,
};
use session_runtime::{
    GatewayError, GatewayOp, InMemoryGateway, SessionConfig, SessionError, SessionRuntime,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn record(player: &PlayerId, credits: u64) -> EconomyRecord {
    EconomyRecord {
        player: player.clone(),
        display_name: "Test Player".into(),
        credits,
        total_clicks: 0,
        accrual_rate: 0.0,
        last_save_at: Utc::now(),
        created_at: Utc::now(),
    }
}

/// Config with schedulers pushed far out so tests drive every mutation.
fn quiet_config() -> SessionConfig {
    SessionConfig {
        passive_tick_period: Duration::from_secs(3600),
        autosave_period: Duration::from_secs(3600),
        ..SessionConfig::default()
    }
}

fn start_runtime(
    gateway: Arc<InMemoryGateway>,
    catalog: Arc<dyn Catalog>,
    player: &PlayerId,
    credits: u64,
    owned: Vec<OwnedItem>,
) -> SessionRuntime {
    let seed = record(player, credits);
    gateway.seed_player(seed.clone(), owned.clone());

    let state = SessionState::from_record(&seed, owned, 0.0);
    SessionRuntime::builder()
        .player(player.clone())
        .initial_state(state)
        .gateway(gateway)
        .catalog(catalog)
        .config(quiet_config())
        .build()
        .expect("runtime should build")
}

#[tokio::test]
async fn purchase_settles_and_mirrors_authoritative_state() {
    init_tracing();
    let catalog: Arc<dyn Catalog> = Arc::new(catalog::builtin());
    let gateway = Arc::new(InMemoryGateway::new(catalog.clone()));
    let player = PlayerId::new("p1");

    let runtime = start_runtime(gateway.clone(), catalog, &player, 100, Vec::new());
    let handle = runtime.handle();

    let item = ItemId::new("pneumatic_wrench");
    let outcome = handle.purchase(item.clone()).await.expect("purchase should settle");

    assert_eq!(outcome.item, item);
    assert_eq!(outcome.quantity, 1);
    assert_eq!(outcome.price, 15);
    assert_eq!(outcome.credits, 85);
    assert_eq!(outcome.accrual_rate, 0.1);

    // Session now mirrors the gateway's record.
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.credits, 85);
    assert_eq!(snapshot.accrual_rate, 0.1);

    let persisted = gateway.record(&player).unwrap();
    assert_eq!(persisted.credits, 85);
    assert_eq!(persisted.accrual_rate, 0.1);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn balance_is_synced_to_gateway_before_grant() {
    init_tracing();
    let catalog: Arc<dyn Catalog> = Arc::new(catalog::builtin());
    let gateway = Arc::new(InMemoryGateway::new(catalog.clone()));
    let player = PlayerId::new("p1");

    let runtime = start_runtime(gateway.clone(), catalog, &player, 10, Vec::new());
    let handle = runtime.handle();

    // Earn the missing credits in-session; the gateway still holds 10.
    for _ in 0..5 {
        handle.click().await.unwrap();
    }
    assert_eq!(gateway.record(&player).unwrap().credits, 10);

    let item = ItemId::new("pneumatic_wrench");
    handle.purchase(item.clone()).await.expect("purchase should settle");

    // The grant must have been preceded by a save of the latest balance,
    // otherwise the gateway would have rejected 15 > 10.
    let ops = gateway.operations();
    let save_pos = ops
        .iter()
        .position(|op| {
            matches!(
                op,
                GatewayOp::SaveEconomy {
                    credits: 15,
                    total_clicks: 5
                }
            )
        })
        .expect("sync save should have reached the gateway");
    let grant_pos = ops
        .iter()
        .position(|op| matches!(op, GatewayOp::GrantItem(i) if *i == item))
        .expect("grant should have reached the gateway");
    assert!(save_pos < grant_pos, "ops out of order: {ops:?}");

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn short_balance_is_rejected_without_any_gateway_call() {
    init_tracing();
    // The classic scenario: balance 50, price 60.
    let mut custom = StaticCatalog::new();
    custom.add_definition(ItemDefinition {
        id: ItemId::new("impact_driver"),
        name: "Impact Driver".into(),
        base_cost: 60,
        effect: ItemEffect::FlatRateBonus {
            credits_per_second: 0.5,
        },
        category: "tool".into(),
    });
    let catalog: Arc<dyn Catalog> = Arc::new(custom);
    let gateway = Arc::new(InMemoryGateway::new(catalog.clone()));
    let player = PlayerId::new("p1");

    let runtime = start_runtime(gateway.clone(), catalog, &player, 50, Vec::new());
    let handle = runtime.handle();

    let err = handle
        .purchase(ItemId::new("impact_driver"))
        .await
        .expect_err("purchase should be rejected");
    assert!(matches!(
        err,
        SessionError::InsufficientFunds {
            price: 60,
            balance: 50
        }
    ));

    // Balance unchanged, and the settlement never left the session.
    assert_eq!(handle.snapshot().await.unwrap().credits, 50);
    assert!(gateway.operations().is_empty(), "gateway was called: {:?}", gateway.operations());

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn failed_grant_leaves_session_state_unchanged() {
    init_tracing();
    let catalog: Arc<dyn Catalog> = Arc::new(catalog::builtin());
    let gateway = Arc::new(InMemoryGateway::new(catalog.clone()));
    let player = PlayerId::new("p1");

    let runtime = start_runtime(gateway.clone(), catalog, &player, 100, Vec::new());
    let handle = runtime.handle();

    gateway.fail_next_grant();
    let item = ItemId::new("pneumatic_wrench");
    let err = handle.purchase(item.clone()).await.expect_err("grant should fail");
    assert!(matches!(err, SessionError::Gateway(GatewayError::Transient(_))));

    // No local debit was applied and nothing was granted.
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.credits, 100);
    assert!(snapshot.owned.is_empty());

    // The same purchase goes through once the gateway recovers, at the
    // same price (no retry happened in between).
    let outcome = handle.purchase(item).await.expect("retry should settle");
    assert_eq!(outcome.price, 15);
    assert_eq!(outcome.quantity, 1);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn concurrent_purchases_serialize_to_at_most_one_grant_each() {
    init_tracing();
    let catalog: Arc<dyn Catalog> = Arc::new(catalog::builtin());
    let gateway = Arc::new(InMemoryGateway::new(catalog.clone()));
    let player = PlayerId::new("p1");

    // Enough for exactly one pneumatic wrench (15); the second purchase
    // must fail whichever order the two requests land in.
    let runtime = start_runtime(gateway.clone(), catalog, &player, 20, Vec::new());

    let item = ItemId::new("pneumatic_wrench");
    let first = {
        let handle = runtime.handle();
        let item = item.clone();
        tokio::spawn(async move { handle.purchase(item).await })
    };
    let second = {
        let handle = runtime.handle();
        let item = item.clone();
        tokio::spawn(async move { handle.purchase(item).await })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one purchase should settle: {results:?}");
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(SessionError::InsufficientFunds { .. }))),
        "the loser should see insufficient funds: {results:?}"
    );

    // Exactly one grant reached the gateway; nothing lost, nothing doubled.
    let grants = gateway
        .operations()
        .iter()
        .filter(|op| matches!(op, GatewayOp::GrantItem(_)))
        .count();
    assert_eq!(grants, 1);

    let handle = runtime.handle();
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.owned, vec![OwnedItem::new(item, 1)]);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn unknown_item_is_rejected_locally() {
    init_tracing();
    let catalog: Arc<dyn Catalog> = Arc::new(catalog::builtin());
    let gateway = Arc::new(InMemoryGateway::new(catalog.clone()));
    let player = PlayerId::new("p1");

    let runtime = start_runtime(gateway.clone(), catalog, &player, 1_000_000, Vec::new());
    let handle = runtime.handle();

    let err = handle
        .purchase(ItemId::new("flux_capacitor"))
        .await
        .expect_err("unknown item should be rejected");
    assert!(matches!(err, SessionError::UnknownItem(_)));
    assert!(gateway.operations().is_empty());

    runtime.shutdown().await.unwrap();
}
