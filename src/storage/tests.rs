//! Tests for the SQLite order store.

use super::*;
use crate::domain::{CartItem, ShippingAddress};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::TempDir;

async fn open_storage() -> (SqliteStorage, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.db");
    let storage = SqliteStorage::new(SqliteStorageConfig {
        path: path.to_string_lossy().to_string(),
        max_connections: 2,
    })
    .await
    .unwrap();
    (storage, dir)
}

fn order_for(user_id: &str, minutes_ago: i64) -> Order {
    let items = vec![CartItem {
        product_id: "p1".to_string(),
        name: "Palm oil".to_string(),
        price: Decimal::from_str("4.25").unwrap(),
        quantity: 2,
        image: Some("https://cdn.example/p1.png".to_string()),
    }];
    let address = ShippingAddress {
        street: "12 Market St".to_string(),
        city: "Accra".to_string(),
        country: "GH".to_string(),
        postal_code: "00233".to_string(),
    };
    Order::from_cart_items(
        user_id,
        &items,
        address,
        "card",
        None,
        Utc::now() - Duration::minutes(minutes_ago),
    )
    .unwrap()
}

fn query(user_id: &str, status: Option<OrderStatus>, offset: u64, limit: u32) -> OrderQuery {
    OrderQuery {
        user_id: user_id.to_string(),
        status,
        offset,
        limit,
    }
}

// ==================== Insert / read tests ====================

#[tokio::test]
async fn test_insert_and_get_round_trip() {
    let (storage, _dir) = open_storage().await;
    let order = order_for("u1", 0);

    assert!(storage.insert(&order).await.unwrap());

    let loaded = storage.get_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, order.id);
    assert_eq!(loaded.items, order.items);
    assert_eq!(loaded.total_amount, Decimal::from_str("8.50").unwrap());
    assert_eq!(loaded.shipping_address, order.shipping_address);
    assert_eq!(loaded.status, OrderStatus::Pending);
    assert_eq!(loaded.payment_status, PaymentStatus::Pending);
    assert_eq!(loaded.created_at, order.created_at);
    assert_eq!(storage.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_get_missing_order() {
    let (storage, _dir) = open_storage().await;
    assert!(storage.get_by_id("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_for_user_hides_other_users_orders() {
    let (storage, _dir) = open_storage().await;
    let order = order_for("owner", 0);
    storage.insert(&order).await.unwrap();

    assert!(storage.get_for_user("owner", &order.id).await.unwrap().is_some());
    assert!(storage.get_for_user("intruder", &order.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_idempotency_key_is_not_inserted() {
    let (storage, _dir) = open_storage().await;

    let mut first = order_for("u1", 0);
    first.idempotency_key = Some("checkout-1".to_string());
    let mut second = order_for("u1", 0);
    second.idempotency_key = Some("checkout-1".to_string());

    assert!(storage.insert(&first).await.unwrap());
    assert!(!storage.insert(&second).await.unwrap());
    assert_eq!(storage.count().await.unwrap(), 1);

    let found = storage
        .get_by_idempotency_key("u1", "checkout-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, first.id);
}

#[tokio::test]
async fn test_same_key_for_different_users_is_allowed() {
    let (storage, _dir) = open_storage().await;

    let mut a = order_for("u1", 0);
    a.idempotency_key = Some("k".to_string());
    let mut b = order_for("u2", 0);
    b.idempotency_key = Some("k".to_string());

    assert!(storage.insert(&a).await.unwrap());
    assert!(storage.insert(&b).await.unwrap());
}

#[tokio::test]
async fn test_orders_without_key_never_collide() {
    let (storage, _dir) = open_storage().await;
    assert!(storage.insert(&order_for("u1", 0)).await.unwrap());
    assert!(storage.insert(&order_for("u1", 0)).await.unwrap());
    assert_eq!(storage.count().await.unwrap(), 2);
}

// ==================== Status write tests ====================

#[tokio::test]
async fn test_set_payment_outcome() {
    let (storage, _dir) = open_storage().await;
    let order = order_for("u1", 0);
    storage.insert(&order).await.unwrap();

    let later = order.updated_at + Duration::seconds(1);
    let updated = storage
        .set_payment_outcome(&order.id, PaymentStatus::Paid, OrderStatus::Processing, later)
        .await
        .unwrap();
    assert!(updated);

    let loaded = storage.get_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(loaded.payment_status, PaymentStatus::Paid);
    assert_eq!(loaded.status, OrderStatus::Processing);
    assert_eq!(loaded.updated_at, later);
    assert_eq!(loaded.created_at, order.created_at);
}

#[tokio::test]
async fn test_transition_status_respects_from_set() {
    let (storage, _dir) = open_storage().await;
    let order = order_for("u1", 0);
    storage.insert(&order).await.unwrap();

    let moved = storage
        .transition_status(
            "u1",
            &order.id,
            OrderStatus::cancellable(),
            OrderStatus::Cancelled,
            Utc::now(),
        )
        .await
        .unwrap();
    assert!(moved);

    let again = storage
        .transition_status(
            "u1",
            &order.id,
            OrderStatus::cancellable(),
            OrderStatus::Cancelled,
            Utc::now(),
        )
        .await
        .unwrap();
    assert!(!again);
}

#[tokio::test]
async fn test_transition_status_checks_owner() {
    let (storage, _dir) = open_storage().await;
    let order = order_for("u1", 0);
    storage.insert(&order).await.unwrap();

    let moved = storage
        .transition_status(
            "u2",
            &order.id,
            OrderStatus::cancellable(),
            OrderStatus::Cancelled,
            Utc::now(),
        )
        .await
        .unwrap();
    assert!(!moved);

    let loaded = storage.get_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_overwrite_status_ignores_current_state() {
    let (storage, _dir) = open_storage().await;
    let order = order_for("u1", 0);
    storage.insert(&order).await.unwrap();

    storage
        .overwrite_status(&order.id, OrderStatus::Cancelled, Utc::now())
        .await
        .unwrap();
    let reopened = storage
        .overwrite_status(&order.id, OrderStatus::Pending, Utc::now())
        .await
        .unwrap();
    assert!(reopened);

    let loaded = storage.get_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(loaded.status, OrderStatus::Pending);
}

#[tokio::test]
async fn test_overwrite_status_missing_order() {
    let (storage, _dir) = open_storage().await;
    let updated = storage
        .overwrite_status("missing", OrderStatus::Completed, Utc::now())
        .await
        .unwrap();
    assert!(!updated);
}

// ==================== Listing tests ====================

#[tokio::test]
async fn test_list_newest_first_with_offset() {
    let (storage, _dir) = open_storage().await;

    let mut ids = Vec::new();
    for minutes_ago in [30, 10, 20, 0] {
        let order = order_for("u1", minutes_ago);
        storage.insert(&order).await.unwrap();
        ids.push((minutes_ago, order.id));
    }
    ids.sort_by_key(|(minutes_ago, _)| *minutes_ago);
    let expected: Vec<String> = ids.into_iter().map(|(_, id)| id).collect();

    let page1 = storage.list(&query("u1", None, 0, 2)).await.unwrap();
    let page2 = storage.list(&query("u1", None, 2, 2)).await.unwrap();

    let got: Vec<String> = page1.iter().chain(page2.iter()).map(|o| o.id.clone()).collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_list_same_timestamp_newest_insert_first() {
    let (storage, _dir) = open_storage().await;

    let first = order_for("u1", 0);
    let mut second = order_for("u1", 0);
    second.created_at = first.created_at;
    storage.insert(&first).await.unwrap();
    storage.insert(&second).await.unwrap();

    let orders = storage.list(&query("u1", None, 0, 10)).await.unwrap();
    assert_eq!(orders[0].id, second.id);
    assert_eq!(orders[1].id, first.id);
}

#[tokio::test]
async fn test_list_filters_by_status_and_user() {
    let (storage, _dir) = open_storage().await;

    let pending = order_for("u1", 2);
    let cancelled = order_for("u1", 1);
    let foreign = order_for("u2", 0);
    for order in [&pending, &cancelled, &foreign] {
        storage.insert(order).await.unwrap();
    }
    storage
        .overwrite_status(&cancelled.id, OrderStatus::Cancelled, Utc::now())
        .await
        .unwrap();

    let q = query("u1", Some(OrderStatus::Cancelled), 0, 10);
    let orders = storage.list(&q).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, cancelled.id);
    assert_eq!(storage.count_matching(&q).await.unwrap(), 1);

    let all = query("u1", None, 0, 10);
    assert_eq!(storage.count_matching(&all).await.unwrap(), 2);
    assert_eq!(storage.count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.db").to_string_lossy().to_string();
    let config = SqliteStorageConfig {
        path,
        max_connections: 1,
    };

    let order = order_for("u1", 0);
    {
        let storage = SqliteStorage::new(config.clone()).await.unwrap();
        storage.insert(&order).await.unwrap();
        storage.close().await.unwrap();
    }

    let storage = SqliteStorage::new(config).await.unwrap();
    assert!(storage.get_by_id(&order.id).await.unwrap().is_some());
}

#[test]
fn test_config_from_storage_section() {
    let defaults = SqliteStorageConfig::from(&crate::config::StorageConfig::default());
    assert_eq!(defaults.path, "orders.db");
    assert_eq!(defaults.max_connections, 5);

    let custom = SqliteStorageConfig::from(&crate::config::StorageConfig {
        path: Some("/data/orders.db".to_string()),
        max_connections: Some(12),
    });
    assert_eq!(custom.path, "/data/orders.db");
    assert_eq!(custom.max_connections, 12);
}
