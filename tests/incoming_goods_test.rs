mod common;

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use esteh_inventory::{
    entities::StockLocation,
    errors::ServiceError,
    services::incoming_goods::RecordBarangMasuk,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn receipt(bahan_id: i64) -> RecordBarangMasuk {
    RecordBarangMasuk {
        bahan_id,
        supplier: "CV Sumber Manis".to_string(),
        jumlah: dec!(1000),
        tanggal: Utc::now(),
        idempotency_key: None,
    }
}

#[tokio::test]
async fn record_credits_the_warehouse() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;

    let record = state
        .services
        .incoming_goods
        .record(receipt(material.id))
        .await
        .unwrap();
    assert_eq!(record.jumlah, dec!(1000));

    let quantity = state
        .services
        .stock_ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(quantity, dec!(1000));
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;

    for jumlah in [dec!(0), dec!(-5)] {
        let err = state
            .services
            .incoming_goods
            .record(RecordBarangMasuk {
                jumlah,
                ..receipt(material.id)
            })
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(_));
    }

    // Ledger untouched by the failures
    let quantity = state
        .services
        .stock_ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(quantity, dec!(0));
}

#[tokio::test]
async fn empty_supplier_is_rejected() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;

    let err = state
        .services
        .incoming_goods
        .record(RecordBarangMasuk {
            supplier: String::new(),
            ..receipt(material.id)
        })
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn unknown_material_is_rejected() {
    let state = common::setup_state().await;

    let err = state
        .services
        .incoming_goods
        .record(receipt(9999))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::NotFound(_));
}

#[tokio::test]
async fn idempotent_retry_returns_original_receipt() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;

    let command = RecordBarangMasuk {
        idempotency_key: Some(Uuid::new_v4()),
        ..receipt(material.id)
    };

    let first = state
        .services
        .incoming_goods
        .record(command.clone())
        .await
        .unwrap();
    let second = state
        .services
        .incoming_goods
        .record(command)
        .await
        .unwrap();
    assert_eq!(second.id, first.id);

    // Credited exactly once
    let quantity = state
        .services
        .stock_ledger
        .get_quantity(StockLocation::Gudang, material.id)
        .await
        .unwrap();
    assert_eq!(quantity, dec!(1000));
}

#[tokio::test]
async fn date_range_listing_uses_explicit_bounds() {
    let state = common::setup_state().await;
    let material = common::seed_bahan(&state, "Gula Pasir").await;
    let incoming = &state.services.incoming_goods;

    let day_one = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let day_two = Utc.with_ymd_and_hms(2026, 3, 2, 14, 30, 0).unwrap();
    let day_three = Utc.with_ymd_and_hms(2026, 3, 3, 8, 15, 0).unwrap();

    for (tanggal, supplier, jumlah) in [
        (day_one, "CV Sumber Manis", dec!(500)),
        (day_two, "PT Tani Jaya", dec!(700)),
        (day_two + Duration::hours(2), "PT Tani Jaya", dec!(300)),
        (day_three, "CV Sumber Manis", dec!(250)),
    ] {
        incoming
            .record(RecordBarangMasuk {
                bahan_id: material.id,
                supplier: supplier.to_string(),
                jumlah,
                tanggal,
                idempotency_key: None,
            })
            .await
            .unwrap();
    }

    // "Today" for day two, bounds supplied by the caller
    let start = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap();

    let listed = incoming.list_between(start, end).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|r| r.supplier == "PT Tani Jaya"));

    let summary = incoming.summary_between(start, end).await.unwrap();
    assert_eq!(summary.receipts, 2);
    assert_eq!(summary.total_quantity, dec!(1000));
    assert_eq!(summary.top_supplier.as_deref(), Some("PT Tani Jaya"));

    // Whole range sees all four receipts, with the tie on supplier count
    // broken deterministically
    let all = incoming
        .summary_between(day_one, day_three + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(all.receipts, 4);
    assert_eq!(all.total_quantity, dec!(1750));
    assert_eq!(all.top_supplier.as_deref(), Some("CV Sumber Manis"));
}
