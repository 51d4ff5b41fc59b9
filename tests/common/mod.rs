use esteh_inventory::{
    config::{AppConfig, ReservationPolicy},
    db,
    entities::bahan,
    events,
    services::materials::CreateBahan,
    AppState,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

/// Builds an engine over a fresh named in-memory SQLite database. Each call
/// gets its own database, so tests can run in parallel.
pub async fn setup_state() -> AppState {
    setup_state_with_policy(ReservationPolicy::DebitOnReceive).await
}

pub async fn setup_state_with_policy(policy: ReservationPolicy) -> AppState {
    let database_url = format!(
        "sqlite:file:{}?mode=memory&cache=shared",
        Uuid::new_v4().simple()
    );
    let pool = db::establish_connection(&database_url)
        .await
        .expect("failed to connect to test database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    let mut config = AppConfig::new(database_url);
    config.reservation_policy = policy;

    let (event_sender, rx) = events::channel(config.event_buffer_size);
    tokio::spawn(events::process_events(rx));

    AppState::new(Arc::new(pool), config, Arc::new(event_sender))
}

/// Seeds a weight-tracked material: 1 kg packages of 1000 g, warehouse
/// minimum 100 g, outlet minimum 50 g.
pub async fn seed_bahan(state: &AppState, nama: &str) -> bahan::Model {
    seed_bahan_with(state, nama, dec!(100), dec!(50)).await
}

pub async fn seed_bahan_with(
    state: &AppState,
    nama: &str,
    min_gudang: Decimal,
    min_outlet: Decimal,
) -> bahan::Model {
    state
        .services
        .materials
        .create(CreateBahan {
            nama: nama.to_string(),
            satuan: "kg".to_string(),
            isi_per_satuan: Some(dec!(1)),
            berat_per_isi: Some(dec!(1000)),
            stok_minimum_gudang: min_gudang,
            stok_minimum_outlet: min_outlet,
        })
        .await
        .expect("failed to seed material")
}
