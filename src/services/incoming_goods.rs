use crate::{
    db::DbPool,
    entities::{bahan, barang_masuk, StockLocation},
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock_ledger::{reasons, MovementRef, StockLedgerService},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordBarangMasuk {
    pub bahan_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub supplier: String,
    /// Received amount in base units; must be positive.
    pub jumlah: Decimal,
    /// Caller-supplied receipt timestamp.
    pub tanggal: DateTime<Utc>,
    /// Supply a key when the call may be retried after a storage error.
    pub idempotency_key: Option<Uuid>,
}

/// Aggregates over a caller-bounded date range of receipts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingSummary {
    pub receipts: u64,
    pub total_quantity: Decimal,
    pub top_supplier: Option<String>,
}

/// Records supplier receipts into the warehouse: one transaction covers the
/// append-only `barang_masuk` row and the warehouse ledger credit, so neither
/// can exist without the other.
#[derive(Clone)]
pub struct IncomingGoodsService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    ledger: Arc<StockLedgerService>,
}

impl IncomingGoodsService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        ledger: Arc<StockLedgerService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            ledger,
        }
    }

    #[instrument(skip(self, command), fields(bahan_id = command.bahan_id, jumlah = %command.jumlah))]
    pub async fn record(
        &self,
        command: RecordBarangMasuk,
    ) -> Result<barang_masuk::Model, ServiceError> {
        command.validate()?;
        if command.jumlah <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "received amount must be positive, got {}",
                command.jumlah
            )));
        }

        bahan::Entity::find_by_id(command.bahan_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("bahan {} not found", command.bahan_id))
            })?;

        let key = (StockLocation::Gudang.location_id(), command.bahan_id);
        let _guards = self.ledger.lock_keys(&[key]).await;

        let (model, replayed) = self
            .db_pool
            .transaction::<_, (barang_masuk::Model, bool), ServiceError>(move |txn| {
                Box::pin(async move {
                    // A replayed idempotency key points back at the receipt
                    // the first attempt committed.
                    if let Some(idempotency_key) = command.idempotency_key {
                        let prior = StockLedgerService::find_movement_by_key(txn, idempotency_key)
                            .await?;
                        if let Some(movement) = prior {
                            let existing_id = movement.reference_id.ok_or_else(|| {
                                ServiceError::InternalError(format!(
                                    "movement {} has no barang_masuk reference",
                                    movement.id
                                ))
                            })?;
                            let existing = barang_masuk::Entity::find_by_id(existing_id)
                                .one(txn)
                                .await?
                                .ok_or_else(|| {
                                    ServiceError::InternalError(format!(
                                        "barang_masuk {} referenced by movement {} is missing",
                                        existing_id, movement.id
                                    ))
                                })?;
                            return Ok((existing, true));
                        }
                    }

                    let model = barang_masuk::ActiveModel {
                        bahan_id: Set(command.bahan_id),
                        supplier: Set(command.supplier.clone()),
                        jumlah: Set(command.jumlah),
                        tanggal: Set(command.tanggal.into()),
                        created_at: Set(Utc::now().into()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    StockLedgerService::apply_delta(
                        txn,
                        StockLocation::Gudang,
                        command.bahan_id,
                        command.jumlah,
                        reasons::BARANG_MASUK,
                        Some(&MovementRef::barang_masuk(model.id)),
                        command.idempotency_key,
                    )
                    .await?;

                    Ok((model, false))
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        if !replayed {
            info!(barang_masuk_id = model.id, "incoming goods recorded");
            self.event_sender
                .send(Event::BarangMasukRecorded {
                    barang_masuk_id: model.id,
                    bahan_id: model.bahan_id,
                    jumlah: model.jumlah,
                })
                .await
                .map_err(ServiceError::EventError)?;
        }
        Ok(model)
    }

    pub async fn get(&self, barang_masuk_id: i64) -> Result<barang_masuk::Model, ServiceError> {
        barang_masuk::Entity::find_by_id(barang_masuk_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("barang_masuk {} not found", barang_masuk_id))
            })
    }

    /// Receipts with `start <= tanggal < end`. The caller supplies its own
    /// local day/month boundaries.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<barang_masuk::Model>, ServiceError> {
        let records = barang_masuk::Entity::find()
            .filter(barang_masuk::Column::Tanggal.gte(start))
            .filter(barang_masuk::Column::Tanggal.lt(end))
            .order_by_desc(barang_masuk::Column::Tanggal)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(records)
    }

    /// Receipt count, total received quantity and most frequent supplier for
    /// a caller-bounded range.
    pub async fn summary_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<IncomingSummary, ServiceError> {
        let records = self.list_between(start, end).await?;

        let mut total_quantity = Decimal::ZERO;
        let mut per_supplier: HashMap<&str, u64> = HashMap::new();
        for record in &records {
            total_quantity += record.jumlah;
            *per_supplier.entry(record.supplier.as_str()).or_insert(0) += 1;
        }

        let top_supplier = per_supplier
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(supplier, _)| supplier.to_string());

        Ok(IncomingSummary {
            receipts: records.len() as u64,
            total_quantity,
            top_supplier,
        })
    }
}
