mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use esteh_inventory::{
    config::ReservationPolicy,
    entities::StockLocation,
    errors::ServiceError,
    services::stock_ledger::{reasons, AdjustStock},
    services::transfer_requests::CreatePermintaanStok,
};
use rust_decimal_macros::dec;

async fn approved_request(
    state: &esteh_inventory::AppState,
    bahan_id: i64,
    jumlah: rust_decimal::Decimal,
) -> i64 {
    let request = state
        .services
        .transfer_requests
        .create(CreatePermintaanStok {
            outlet_id: 1,
            bahan_id,
            jumlah,
        })
        .await
        .unwrap();
    state
        .services
        .transfer_requests
        .approve(request.id)
        .await
        .unwrap();
    request.id
}

async fn seed_gudang(
    state: &esteh_inventory::AppState,
    bahan_id: i64,
    quantity: rust_decimal::Decimal,
) {
    state
        .services
        .stock_ledger
        .adjust(AdjustStock {
            location: StockLocation::Gudang,
            bahan_id,
            delta: quantity,
            reason: reasons::MANUAL_ADJUSTMENT.to_string(),
            reference: None,
            idempotency_key: None,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn reserve_on_create_debits_at_creation() {
    let state = common::setup_state_with_policy(ReservationPolicy::ReserveOnCreate).await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;
    seed_gudang(&state, material.id, dec!(200)).await;

    let permintaan_id = approved_request(&state, material.id, dec!(50)).await;
    let shipment = state
        .services
        .outgoing_goods
        .create_from_request(permintaan_id, Utc::now())
        .await
        .unwrap();

    // Debited immediately, before dispatch or receive
    let gudang_qty = state
        .services
        .stock_ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(gudang_qty, dec!(150));

    state
        .services
        .outgoing_goods
        .dispatch(shipment.header.id)
        .await
        .unwrap();
    state
        .services
        .outgoing_goods
        .receive(shipment.header.id)
        .await
        .unwrap();

    // Receive only credits the outlet; the warehouse is not debited twice
    let ledger = &state.services.stock_ledger;
    assert_eq!(
        ledger
            .get_quantity(StockLocation::Gudang, material.id)
            .await
            .unwrap(),
        dec!(150)
    );
    assert_eq!(
        ledger
            .get_quantity(StockLocation::Outlet(1), material.id)
            .await
            .unwrap(),
        dec!(50)
    );
}

#[tokio::test]
async fn reserve_on_create_fails_early_when_short() {
    let state = common::setup_state_with_policy(ReservationPolicy::ReserveOnCreate).await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;
    seed_gudang(&state, material.id, dec!(40)).await;

    let permintaan_id = approved_request(&state, material.id, dec!(50)).await;
    let err = state
        .services
        .outgoing_goods
        .create_from_request(permintaan_id, Utc::now())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InsufficientStock(_));

    // Failed creation leaves no shipment and no debit
    let gudang_qty = state
        .services
        .stock_ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(gudang_qty, dec!(40));
}

#[tokio::test]
async fn reserve_on_create_refunds_on_cancel() {
    let state = common::setup_state_with_policy(ReservationPolicy::ReserveOnCreate).await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;
    seed_gudang(&state, material.id, dec!(200)).await;

    let permintaan_id = approved_request(&state, material.id, dec!(50)).await;
    let shipment = state
        .services
        .outgoing_goods
        .create_from_request(permintaan_id, Utc::now())
        .await
        .unwrap();

    state
        .services
        .outgoing_goods
        .cancel(shipment.header.id)
        .await
        .unwrap();

    let gudang_qty = state
        .services
        .stock_ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(gudang_qty, dec!(200));
}
