//! Batch ledger tests
//!
//! Availability is a projection over batches and deliveries: purchased
//! composition minus non-returned bars, never negative after any sequence
//! of valid operations.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use engine::services::batch::CreateBatchInput;
use engine::store::MemoryStore;
use engine::{Config, Engine};
use shared::{BarState, CompositionLine, RegisterClientInput, RequestedItem};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn test_engine() -> Engine {
    Engine::new(Arc::new(MemoryStore::new()), Config::default())
}

fn line(weight: &str, count: u32) -> CompositionLine {
    CompositionLine {
        weight_grams: dec(weight),
        count,
    }
}

fn item(weight: &str, count: u32) -> RequestedItem {
    RequestedItem {
        weight_grams: dec(weight),
        count,
    }
}

async fn seed_client(engine: &Engine, name: &str) -> Uuid {
    engine
        .clients()
        .register_client(RegisterClientInput {
            name: name.to_string(),
            phone: None,
            email: None,
            notes: None,
        })
        .await
        .unwrap()
        .id
}

async fn seed_batch(engine: &Engine, name: &str, composition: Vec<CompositionLine>) -> Uuid {
    engine
        .batches()
        .create_batch(CreateBatchInput {
            name: name.to_string(),
            acquisition_date: chrono::NaiveDate::from_ymd_opt(2028, 1, 15).unwrap(),
            year_label: "2028".to_string(),
            composition,
            price_per_gram: None,
        })
        .await
        .unwrap()
        .id
}

async fn availability_for(engine: &Engine, batch_id: Uuid, weight: &str) -> i64 {
    engine
        .stock()
        .availability_for_weight(batch_id, dec(weight))
        .await
        .unwrap()
}

/// Scenario: batch "28-1" purchased as 10x50g; deliver 3, return 1
#[tokio::test]
async fn delivery_and_return_move_availability() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![line("50", 10)]).await;

    assert_eq!(availability_for(&engine, batch, "50").await, 10);

    let delivery = engine
        .deliveries()
        .create_delivery(engine::services::delivery::CreateDeliveryInput {
            client_id: client,
            batch_id: batch,
            delivery_date: chrono::NaiveDate::from_ymd_opt(2028, 2, 1).unwrap(),
            items: vec![item("50", 3)],
            actor: "ana".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(availability_for(&engine, batch, "50").await, 7);

    let returned = engine
        .deliveries()
        .return_bars(delivery.id, &[0], "ana")
        .await
        .unwrap();

    assert_eq!(availability_for(&engine, batch, "50").await, 8);
    assert!(matches!(returned.bars[0].state, BarState::Returned { .. }));
    assert!(returned.bars[1].is_in_progress());
}

#[tokio::test]
async fn cancel_return_consumes_stock_again() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-2", vec![line("100", 4)]).await;

    let delivery = engine
        .deliveries()
        .create_delivery(engine::services::delivery::CreateDeliveryInput {
            client_id: client,
            batch_id: batch,
            delivery_date: chrono::NaiveDate::from_ymd_opt(2028, 2, 1).unwrap(),
            items: vec![item("100", 2)],
            actor: "ana".to_string(),
        })
        .await
        .unwrap();

    engine
        .deliveries()
        .return_bars(delivery.id, &[1], "ana")
        .await
        .unwrap();
    assert_eq!(availability_for(&engine, batch, "100").await, 3);

    engine
        .deliveries()
        .cancel_return(delivery.id, 1, "ana")
        .await
        .unwrap();
    assert_eq!(availability_for(&engine, batch, "100").await, 2);
}

#[tokio::test]
async fn availability_tracks_each_weight_class_separately() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-3", vec![line("50", 10), line("100", 5)]).await;

    engine
        .deliveries()
        .create_delivery(engine::services::delivery::CreateDeliveryInput {
            client_id: client,
            batch_id: batch,
            delivery_date: chrono::NaiveDate::from_ymd_opt(2028, 2, 1).unwrap(),
            items: vec![item("50", 4), item("100", 5)],
            actor: "ana".to_string(),
        })
        .await
        .unwrap();

    let lines = engine.stock().availability(batch).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(availability_for(&engine, batch, "50").await, 6);
    assert_eq!(availability_for(&engine, batch, "100").await, 0);
}

#[tokio::test]
async fn unknown_batch_is_not_found() {
    let engine = test_engine();
    let err = engine
        .stock()
        .availability(Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn global_stock_aggregates_batches_with_breakdown() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let first = seed_batch(&engine, "28-1", vec![line("50", 10)]).await;
    let second = seed_batch(&engine, "28-2", vec![line("50", 5), line("100", 2)]).await;

    engine
        .deliveries()
        .create_delivery(engine::services::delivery::CreateDeliveryInput {
            client_id: client,
            batch_id: first,
            delivery_date: chrono::NaiveDate::from_ymd_opt(2028, 2, 1).unwrap(),
            items: vec![item("50", 4)],
            actor: "ana".to_string(),
        })
        .await
        .unwrap();

    let stock = engine.stock().global_stock().await.unwrap();
    assert_eq!(stock.len(), 2);

    let fifty = stock.iter().find(|l| l.weight_grams == dec("50")).unwrap();
    assert_eq!(fifty.count, 11); // 6 + 5
    assert_eq!(fifty.per_batch.len(), 2);
    let first_share = fifty.per_batch.iter().find(|s| s.batch_id == first).unwrap();
    assert_eq!(first_share.count, 6);
    let second_share = fifty
        .per_batch
        .iter()
        .find(|s| s.batch_id == second)
        .unwrap();
    assert_eq!(second_share.count, 5);

    let hundred = stock.iter().find(|l| l.weight_grams == dec("100")).unwrap();
    assert_eq!(hundred.count, 2);
}
