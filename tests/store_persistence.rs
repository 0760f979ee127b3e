mod common;

use order_watch::bootstrap::open_store;
use order_watch::domain::{EnrichedOrder, OrderStatus, PriceTick};
use order_watch::persistence::Store;
use rust_decimal_macros::dec;

#[tokio::test]
async fn state_survives_reopening_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}", dir.path().join("watch.db").display());
    let config = common::config(&url);

    {
        let store = open_store(&config.database).await.unwrap();
        let order = common::order("BTCUSDT", 1, dec!(100), OrderStatus::New, 10);
        store
            .replace_snapshot(
                &[EnrichedOrder::derive(order, Some(dec!(95)), None)],
                &[PriceTick::new("BTCUSDT", dec!(95))],
            )
            .await
            .unwrap();
        for _ in 0..3 {
            store.reserve_auth_attempt("192.0.2.1", 3).await.unwrap();
        }
    }

    // migrations are idempotent on an existing file
    let store = open_store(&config.database).await.unwrap();
    let orders = store.orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].spread, Some(dec!(5)));
    assert_eq!(orders[0].percent_completed, None);

    let record = store.auth_attempt("192.0.2.1").await.unwrap().unwrap();
    assert!(record.is_locked(config.auth.max_attempts));

    assert!(store.clear_auth_source("192.0.2.1").await.unwrap());
    assert!(!store.clear_auth_source("192.0.2.1").await.unwrap());
}
