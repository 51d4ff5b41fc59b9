mod common;

use assert_matches::assert_matches;
use esteh_inventory::{
    entities::StockLocation,
    errors::ServiceError,
    services::stock_ledger::{reasons, AdjustStock, MovementRef},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

fn credit(bahan_id: i64, delta: Decimal) -> AdjustStock {
    AdjustStock {
        location: StockLocation::Gudang,
        bahan_id,
        delta,
        reason: reasons::MANUAL_ADJUSTMENT.to_string(),
        reference: None,
        idempotency_key: None,
    }
}

#[tokio::test]
async fn missing_record_reads_as_zero() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;

    let quantity = state
        .services
        .stock_ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(quantity, Decimal::ZERO);

    let quantity = state
        .services
        .stock_ledger
        .get_quantity(StockLocation::Outlet(3), material.id)
        .await
        .unwrap();
    assert_eq!(quantity, Decimal::ZERO);
}

#[tokio::test]
async fn adjust_creates_and_accumulates() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;
    let ledger = &state.services.stock_ledger;

    let outcome = ledger.adjust(credit(material.id, dec!(500))).await.unwrap();
    assert_eq!(outcome.previous_quantity, dec!(0));
    assert_eq!(outcome.new_quantity, dec!(500));

    let outcome = ledger.adjust(credit(material.id, dec!(-120))).await.unwrap();
    assert_eq!(outcome.new_quantity, dec!(380));

    let quantity = ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(quantity, dec!(380));
}

#[tokio::test]
async fn debit_below_zero_fails_without_clamping() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;
    let ledger = &state.services.stock_ledger;

    ledger.adjust(credit(material.id, dec!(100))).await.unwrap();

    let err = ledger
        .adjust(credit(material.id, dec!(-150)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // Quantity must be exactly what it was, not clamped to zero
    let quantity = ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(quantity, dec!(100));
}

#[tokio::test]
async fn zero_delta_is_rejected() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;

    let err = state
        .services
        .stock_ledger
        .adjust(credit(material.id, dec!(0)))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn set_absolute_rejects_negative_targets() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;

    let err = state
        .services
        .stock_ledger
        .set_absolute(
            StockLocation::Gudang,
            material.id,
            dec!(-1),
            reasons::STOK_OPNAME,
            None,
        )
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn idempotency_key_replay_does_not_double_apply() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;
    let ledger = &state.services.stock_ledger;

    let key = Uuid::new_v4();
    let command = AdjustStock {
        location: StockLocation::Gudang,
        bahan_id: material.id,
        delta: dec!(250),
        reason: reasons::BARANG_MASUK.to_string(),
        reference: Some(MovementRef::barang_masuk(1)),
        idempotency_key: Some(key),
    };

    let first = ledger.adjust(command.clone()).await.unwrap();
    assert!(!first.replayed);
    assert_eq!(first.new_quantity, dec!(250));

    let second = ledger.adjust(command).await.unwrap();
    assert!(second.replayed);
    assert_eq!(second.movement_id, first.movement_id);
    assert_eq!(second.new_quantity, dec!(250));

    let quantity = ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(quantity, dec!(250));
}

#[tokio::test]
async fn outlet_ledger_is_independent_of_gudang() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;
    let ledger = &state.services.stock_ledger;

    ledger.adjust(credit(material.id, dec!(900))).await.unwrap();
    ledger
        .adjust(AdjustStock {
            location: StockLocation::Outlet(2),
            ..credit(material.id, dec!(40))
        })
        .await
        .unwrap();

    assert_eq!(
        ledger
            .get_quantity(StockLocation::Gudang, material.id)
            .await
            .unwrap(),
        dec!(900)
    );
    assert_eq!(
        ledger
            .get_quantity(StockLocation::Outlet(2), material.id)
            .await
            .unwrap(),
        dec!(40)
    );
}

#[tokio::test]
async fn invalid_outlet_id_is_rejected() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;

    let err = state
        .services
        .stock_ledger
        .adjust(AdjustStock {
            location: StockLocation::Outlet(-1),
            ..credit(material.id, dec!(10))
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

/// Concurrent adjustments on one key must serialize: the final quantity is
/// the initial quantity plus the sum of every applied delta, with no lost
/// updates.
#[tokio::test]
async fn concurrent_adjusts_lose_no_updates() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;
    let ledger = state.services.stock_ledger.clone();

    ledger.adjust(credit(material.id, dec!(100))).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let ledger = ledger.clone();
        let bahan_id = material.id;
        // Alternate credits of 5 and debits of 3
        let delta = if i % 2 == 0 { dec!(5) } else { dec!(-3) };
        tasks.push(tokio::spawn(async move {
            ledger.adjust(credit(bahan_id, delta)).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // 100 + 10 * 5 - 10 * 3 = 120
    let quantity = ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(quantity, dec!(120));
}

/// Over-subscribed concurrent debits: exactly the affordable number succeed,
/// the rest fail `InsufficientStock`, and the ledger never goes negative.
#[tokio::test]
async fn concurrent_debits_never_oversell() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;
    let ledger = state.services.stock_ledger.clone();

    ledger.adjust(credit(material.id, dec!(10))).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let ledger = ledger.clone();
        let bahan_id = material.id;
        tasks.push(tokio::spawn(async move {
            ledger.adjust(credit(bahan_id, dec!(-1))).await.is_ok()
        }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.unwrap() {
            successes += 1;
        }
    }
    assert_eq!(successes, 10, "exactly 10 debits of 1 should succeed");

    let quantity = ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(quantity, dec!(0));
}
