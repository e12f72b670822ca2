//! Delivery orchestrator tests
//!
//! All-or-nothing creation, bulk close across deliveries, deletion guards
//! and the audit log.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use engine::services::batch::CreateBatchInput;
use engine::services::delivery::CreateDeliveryInput;
use engine::services::settlement::SettlementInput;
use engine::store::{DeliveryFilter, MemoryStore, Store};
use engine::{AppError, Config, Engine};
use shared::{BarRef, BarState, CompositionLine, LogCategory, RegisterClientInput, RequestedItem};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn test_engine() -> Engine {
    Engine::new(Arc::new(MemoryStore::new()), Config::default())
}

fn item(weight: &str, count: u32) -> RequestedItem {
    RequestedItem {
        weight_grams: dec(weight),
        count,
    }
}

fn close_input(devolution: &str) -> SettlementInput {
    SettlementInput {
        spot_price_per_ounce: dec("3693.42"),
        client_base_price_per_gram: dec("118.76"),
        reference_cost_price_per_gram: dec("119.01"),
        margin_percent: dec("6"),
        invoice_ref: Some("F-2028-021".to_string()),
        close_date: chrono::NaiveDate::from_ymd_opt(2028, 3, 4).unwrap(),
        devolution_grams: dec(devolution),
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

async fn seed_batch(engine: &Engine, name: &str, composition: Vec<(&str, u32)>) -> Uuid {
    engine
        .batches()
        .create_batch(CreateBatchInput {
            name: name.to_string(),
            acquisition_date: chrono::NaiveDate::from_ymd_opt(2028, 1, 15).unwrap(),
            year_label: "2028".to_string(),
            composition: composition
                .into_iter()
                .map(|(weight, count)| CompositionLine {
                    weight_grams: dec(weight),
                    count,
                })
                .collect(),
            price_per_gram: None,
        })
        .await
        .unwrap()
        .id
}

async fn deliver(
    engine: &Engine,
    client: Uuid,
    batch: Uuid,
    items: Vec<RequestedItem>,
) -> shared::Delivery {
    engine
        .deliveries()
        .create_delivery(CreateDeliveryInput {
            client_id: client,
            batch_id: batch,
            delivery_date: chrono::NaiveDate::from_ymd_opt(2028, 2, 1).unwrap(),
            items,
            actor: "ana".to_string(),
        })
        .await
        .unwrap()
}

// ============================================================================
// Creation
// ============================================================================

/// One weight class short by a single unit rejects the whole request
#[tokio::test]
async fn creation_is_all_or_nothing() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 10), ("100", 2)]).await;

    let err = engine
        .deliveries()
        .create_delivery(CreateDeliveryInput {
            client_id: client,
            batch_id: batch,
            delivery_date: chrono::NaiveDate::from_ymd_opt(2028, 2, 1).unwrap(),
            items: vec![item("50", 3), item("100", 3)],
            actor: "ana".to_string(),
        })
        .await
        .unwrap_err();

    // the failure names the short weight class exactly
    match err {
        AppError::InsufficientStock {
            weight_grams,
            requested,
            available,
        } => {
            assert_eq!(weight_grams, dec("100"));
            assert_eq!(requested, 3);
            assert_eq!(available, 2);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // zero state change
    let deliveries = engine
        .store
        .list_deliveries(&DeliveryFilter::default())
        .await
        .unwrap();
    assert!(deliveries.is_empty());
    assert_eq!(
        engine
            .stock()
            .availability_for_weight(batch, dec("50"))
            .await
            .unwrap(),
        10
    );
}

#[tokio::test]
async fn creation_requires_known_client_and_batch() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 10)]).await;

    let missing_client = engine
        .deliveries()
        .create_delivery(CreateDeliveryInput {
            client_id: Uuid::new_v4(),
            batch_id: batch,
            delivery_date: chrono::NaiveDate::from_ymd_opt(2028, 2, 1).unwrap(),
            items: vec![item("50", 1)],
            actor: "ana".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(missing_client.code(), "NOT_FOUND");

    let missing_batch = engine
        .deliveries()
        .create_delivery(CreateDeliveryInput {
            client_id: client,
            batch_id: Uuid::new_v4(),
            delivery_date: chrono::NaiveDate::from_ymd_opt(2028, 2, 1).unwrap(),
            items: vec![item("50", 1)],
            actor: "ana".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(missing_batch.code(), "NOT_FOUND");
}

#[tokio::test]
async fn creation_writes_initial_audit_entry() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 10)]).await;

    let delivery = deliver(&engine, client, batch, vec![item("50", 3)]).await;

    assert_eq!(delivery.log.len(), 1);
    assert_eq!(delivery.log[0].category, LogCategory::Delivery);
    assert_eq!(delivery.log[0].actor, "ana");
    assert!(delivery.log[0].description.contains("3 bars"));
    assert!(delivery.log[0].description.contains("150"));
}

// ============================================================================
// Bulk close
// ============================================================================

#[tokio::test]
async fn close_spans_deliveries_of_different_clients() {
    let engine = test_engine();
    let first_client = seed_client(&engine, "Client X").await;
    let second_client = seed_client(&engine, "Client Y").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 10)]).await;

    let first = deliver(&engine, first_client, batch, vec![item("50", 2)]).await;
    let second = deliver(&engine, second_client, batch, vec![item("50", 1)]).await;

    let refs = [
        BarRef {
            delivery_id: first.id,
            bar_index: 0,
        },
        BarRef {
            delivery_id: first.id,
            bar_index: 1,
        },
        BarRef {
            delivery_id: second.id,
            bar_index: 0,
        },
    ];
    let updated = engine
        .deliveries()
        .close_bars(&refs, close_input("0"), "ana")
        .await
        .unwrap();

    assert_eq!(updated.len(), 2);
    for delivery in &updated {
        for bar in delivery
            .bars
            .iter()
            .filter(|b| !matches!(b.state, BarState::InProgress))
        {
            let settlement = bar.settlement().unwrap();
            assert_eq!(settlement.client_price_per_gram, dec("125.89"));
            assert_eq!(settlement.invoice_amount, dec("6294.50"));
        }
        // one close entry on top of the creation entry
        assert_eq!(delivery.log.len(), 2);
        assert_eq!(delivery.log[1].category, LogCategory::Close);
    }
}

/// Known behavior: the single devolution value applies to every bar of the
/// call regardless of each bar's own weight
#[tokio::test]
async fn uniform_devolution_applies_across_mixed_weights() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 2), ("100", 2)]).await;

    let delivery = deliver(&engine, client, batch, vec![item("50", 1), item("100", 1)]).await;

    let refs = [
        BarRef {
            delivery_id: delivery.id,
            bar_index: 0,
        },
        BarRef {
            delivery_id: delivery.id,
            bar_index: 1,
        },
    ];
    let updated = engine
        .deliveries()
        .close_bars(&refs, close_input("1.5"), "ana")
        .await
        .unwrap();

    let bars = &updated[0].bars;
    let fifty = bars.iter().find(|b| b.weight_grams == dec("50")).unwrap();
    let hundred = bars.iter().find(|b| b.weight_grams == dec("100")).unwrap();

    // both bars carry the same 1.5g credit and bill net weight
    assert_eq!(
        fifty.settlement().unwrap().returned_weight_grams,
        dec("1.5")
    );
    assert_eq!(
        hundred.settlement().unwrap().returned_weight_grams,
        dec("1.5")
    );
    // 125.89 * 48.5 = 6105.665, rounded to the cent
    assert_eq!(fifty.settlement().unwrap().invoice_amount, dec("6105.67"));
    // 125.89 * 98.5 = 12400.165, rounded to the cent
    assert_eq!(
        hundred.settlement().unwrap().invoice_amount,
        dec("12400.17")
    );
}

/// The reporting layer reads deliveries as JSON; the bar state carries its
/// settlement fields inline under a status tag
#[tokio::test]
async fn closed_delivery_serializes_with_tagged_state() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 5)]).await;

    let delivery = deliver(&engine, client, batch, vec![item("50", 1)]).await;
    let updated = engine
        .deliveries()
        .close_bars(
            &[BarRef {
                delivery_id: delivery.id,
                bar_index: 0,
            }],
            close_input("0"),
            "ana",
        )
        .await
        .unwrap();

    let json = serde_json::to_value(&updated[0]).unwrap();
    assert_eq!(json["bars"][0]["state"]["status"], "awaiting_payment");
    assert_eq!(json["bars"][0]["state"]["invoice_ref"], "F-2028-021");
}

#[tokio::test]
async fn close_validates_every_ref_before_writing() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 5)]).await;

    let delivery = deliver(&engine, client, batch, vec![item("50", 2)]).await;

    let refs = [
        BarRef {
            delivery_id: delivery.id,
            bar_index: 0,
        },
        BarRef {
            delivery_id: delivery.id,
            bar_index: 9, // out of range
        },
    ];
    let err = engine
        .deliveries()
        .close_bars(&refs, close_input("0"), "ana")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    // nothing was closed
    let reread = engine.store.get_delivery(delivery.id).await.unwrap();
    assert!(reread.bars.iter().all(|b| b.is_in_progress()));
    assert_eq!(reread.log.len(), 1);
}

#[tokio::test]
async fn close_rejects_devolution_at_or_above_bar_weight() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 5)]).await;

    let delivery = deliver(&engine, client, batch, vec![item("50", 1)]).await;

    let refs = [BarRef {
        delivery_id: delivery.id,
        bar_index: 0,
    }];
    let err = engine
        .deliveries()
        .close_bars(&refs, close_input("50"), "ana")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "VALIDATION_ERROR");
}

// ============================================================================
// Deletion and classification
// ============================================================================

#[tokio::test]
async fn delete_releases_stock_while_all_in_progress() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 10)]).await;

    let delivery = deliver(&engine, client, batch, vec![item("50", 4)]).await;
    assert_eq!(
        engine
            .stock()
            .availability_for_weight(batch, dec("50"))
            .await
            .unwrap(),
        6
    );

    engine.deliveries().delete_delivery(delivery.id).await.unwrap();
    assert_eq!(
        engine
            .stock()
            .availability_for_weight(batch, dec("50"))
            .await
            .unwrap(),
        10
    );
}

#[tokio::test]
async fn delete_rejected_once_a_bar_is_closed() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 10)]).await;

    let delivery = deliver(&engine, client, batch, vec![item("50", 2)]).await;
    engine
        .deliveries()
        .close_bars(
            &[BarRef {
                delivery_id: delivery.id,
                bar_index: 0,
            }],
            close_input("0"),
            "ana",
        )
        .await
        .unwrap();

    let err = engine
        .deliveries()
        .delete_delivery(delivery.id)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
}

#[tokio::test]
async fn delivery_open_until_settled_with_invoice() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 10)]).await;

    let delivery = deliver(&engine, client, batch, vec![item("50", 1)]).await;
    assert!(delivery.bars[0].is_in_progress());

    let closed = engine
        .deliveries()
        .close_bars(
            &[BarRef {
                delivery_id: delivery.id,
                bar_index: 0,
            }],
            close_input("0"),
            "ana",
        )
        .await
        .unwrap();
    assert!(closed[0].is_open());

    let paid = engine
        .deliveries()
        .mark_paid(delivery.id, 0, "ana")
        .await
        .unwrap();
    // settled and carrying an invoice ref: nothing left to do
    assert!(!paid.is_open());
}

// ============================================================================
// Batch guards
// ============================================================================

#[tokio::test]
async fn batch_composition_frozen_once_allocated() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 10)]).await;

    deliver(&engine, client, batch, vec![item("50", 1)]).await;

    let err = engine
        .batches()
        .update_composition(
            batch,
            vec![CompositionLine {
                weight_grams: dec("50"),
                count: 20,
            }],
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
}

/// Returned bars still pin the composition: shrinking the purchase under
/// them and then cancelling the returns would drive availability negative
#[tokio::test]
async fn batch_recompose_rejected_even_after_all_bars_returned() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let batch = seed_batch(&engine, "28-1", vec![("50", 2)]).await;

    let delivery = deliver(&engine, client, batch, vec![item("50", 2)]).await;
    engine
        .deliveries()
        .return_bars(delivery.id, &[0, 1], "ana")
        .await
        .unwrap();

    let err = engine
        .batches()
        .update_composition(
            batch,
            vec![CompositionLine {
                weight_grams: dec("50"),
                count: 1,
            }],
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFLICT");

    engine
        .deliveries()
        .cancel_return(delivery.id, 0, "ana")
        .await
        .unwrap();
    engine
        .deliveries()
        .cancel_return(delivery.id, 1, "ana")
        .await
        .unwrap();
    assert_eq!(
        engine
            .stock()
            .availability_for_weight(batch, dec("50"))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn batch_deletable_only_while_untouched() {
    let engine = test_engine();
    let client = seed_client(&engine, "Client X").await;
    let untouched = seed_batch(&engine, "28-1", vec![("50", 10)]).await;
    let touched = seed_batch(&engine, "28-2", vec![("50", 10)]).await;

    deliver(&engine, client, touched, vec![item("50", 1)]).await;

    assert!(engine.batches().delete_batch(untouched).await.is_ok());
    let err = engine.batches().delete_batch(touched).await.unwrap_err();
    assert_eq!(err.code(), "CONFLICT");
}
