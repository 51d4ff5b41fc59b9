use crate::{
    db::DbPool,
    entities::{stock_movement, stock_record, StockLocation},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument};
use uuid::Uuid;
use validator::Validate;

/// Well-known movement reasons written to the journal.
pub mod reasons {
    pub const MANUAL_ADJUSTMENT: &str = "manual_adjustment";
    pub const BARANG_MASUK: &str = "barang_masuk";
    pub const BARANG_KELUAR_RESERVE: &str = "barang_keluar_reserve";
    pub const BARANG_KELUAR_RECEIVE: &str = "barang_keluar_receive";
    pub const BARANG_KELUAR_CANCEL: &str = "barang_keluar_cancel";
    pub const STOK_OPNAME: &str = "stok_opname";
}

/// Document a movement points back to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRef {
    pub reference_type: String,
    pub reference_id: i64,
}

impl MovementRef {
    pub fn barang_masuk(id: i64) -> Self {
        Self {
            reference_type: "barang_masuk".to_string(),
            reference_id: id,
        }
    }

    pub fn barang_keluar(id: i64) -> Self {
        Self {
            reference_type: "barang_keluar".to_string(),
            reference_id: id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdjustStock {
    pub location: StockLocation,
    pub bahan_id: i64,
    /// Signed delta in base units. Must be non-zero; a negative delta that
    /// would drive the quantity below zero fails with `InsufficientStock`.
    pub delta: Decimal,
    #[validate(length(min = 1, max = 50))]
    pub reason: String,
    pub reference: Option<MovementRef>,
    /// Supply a key when the call may be retried after a storage error;
    /// replaying a key returns the recorded outcome without re-applying.
    pub idempotency_key: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovementOutcome {
    pub movement_id: Uuid,
    pub location: StockLocation,
    pub bahan_id: i64,
    pub previous_quantity: Decimal,
    pub new_quantity: Decimal,
    /// True when an idempotency key matched an existing movement and the
    /// recorded outcome was returned instead of applying a new delta.
    pub replayed: bool,
}

impl StockMovementOutcome {
    fn replayed_from(movement: stock_movement::Model) -> Self {
        Self {
            movement_id: movement.id,
            location: StockLocation::from_location_id(movement.location_id),
            bahan_id: movement.bahan_id,
            previous_quantity: movement.previous_quantity,
            new_quantity: movement.new_quantity,
            replayed: true,
        }
    }
}

/// The authoritative per-`(location, material)` quantity record.
///
/// Every mutation runs inside a database transaction under a per-key lock;
/// multi-key operations (shipment receive, opname finalize) acquire their
/// locks in sorted key order through [`lock_keys`](Self::lock_keys) before
/// opening the transaction.
pub struct StockLedgerService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    key_locks: DashMap<(i64, i64), Arc<Mutex<()>>>,
}

impl StockLedgerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
            key_locks: DashMap::new(),
        }
    }

    /// Current quantity at a key; zero when no record exists.
    ///
    /// Non-blocking snapshot read: it may be stale with respect to an
    /// in-flight write.
    pub async fn get_quantity(
        &self,
        location: StockLocation,
        bahan_id: i64,
    ) -> Result<Decimal, ServiceError> {
        location.ensure_valid()?;
        let record = stock_record::Entity::find()
            .filter(stock_record::Column::LocationId.eq(location.location_id()))
            .filter(stock_record::Column::BahanId.eq(bahan_id))
            .one(self.db_pool.as_ref())
            .await?;
        Ok(record.map(|r| r.quantity).unwrap_or(Decimal::ZERO))
    }

    /// All `(bahan_id, quantity)` pairs recorded at a location, ordered by
    /// material id. Feeds opname session start and the stock overview.
    pub async fn snapshot(
        &self,
        location: StockLocation,
    ) -> Result<Vec<(i64, Decimal)>, ServiceError> {
        location.ensure_valid()?;
        let records = stock_record::Entity::find()
            .filter(stock_record::Column::LocationId.eq(location.location_id()))
            .order_by_asc(stock_record::Column::BahanId)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(records.into_iter().map(|r| (r.bahan_id, r.quantity)).collect())
    }

    /// Applies a signed delta, failing with `InsufficientStock` rather than
    /// ever clamping below zero. Returns the committed movement.
    #[instrument(skip(self, command), fields(bahan_id = command.bahan_id, delta = %command.delta))]
    pub async fn adjust(&self, command: AdjustStock) -> Result<StockMovementOutcome, ServiceError> {
        command.validate()?;
        command.location.ensure_valid()?;
        if command.delta == Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "adjustment delta must be non-zero".to_string(),
            ));
        }

        let key = (command.location.location_id(), command.bahan_id);
        let _guards = self.lock_keys(&[key]).await;

        let outcome = self
            .db_pool
            .transaction::<_, StockMovementOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    Self::apply_delta(
                        txn,
                        command.location,
                        command.bahan_id,
                        command.delta,
                        &command.reason,
                        command.reference.as_ref(),
                        command.idempotency_key,
                    )
                    .await
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        if !outcome.replayed {
            self.emit_stock_adjusted(&outcome).await?;
        }
        Ok(outcome)
    }

    /// Overwrites a key with an absolute quantity, journaling the implied
    /// delta. Used by opname finalize; negative targets are rejected.
    #[instrument(skip(self), fields(bahan_id, quantity = %quantity))]
    pub async fn set_absolute(
        &self,
        location: StockLocation,
        bahan_id: i64,
        quantity: Decimal,
        reason: &str,
        idempotency_key: Option<Uuid>,
    ) -> Result<StockMovementOutcome, ServiceError> {
        location.ensure_valid()?;
        if quantity < Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "absolute quantity must be non-negative, got {}",
                quantity
            )));
        }

        let key = (location.location_id(), bahan_id);
        let _guards = self.lock_keys(&[key]).await;

        let reason = reason.to_string();
        let outcome = self
            .db_pool
            .transaction::<_, StockMovementOutcome, ServiceError>(move |txn| {
                Box::pin(async move {
                    Self::apply_absolute(txn, location, bahan_id, quantity, &reason, idempotency_key)
                        .await
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        if !outcome.replayed {
            self.emit_stock_adjusted(&outcome).await?;
        }
        Ok(outcome)
    }

    /// Acquires the per-key mutexes for `keys` in sorted order, so that
    /// overlapping multi-key operations can never deadlock against each
    /// other. Guards are held until dropped.
    pub(crate) async fn lock_keys(&self, keys: &[(i64, i64)]) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted: Vec<(i64, i64)> = keys.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in sorted {
            let lock = self
                .key_locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone();
            guards.push(lock.lock_owned().await);
        }
        guards
    }

    /// Looks up a journaled movement by idempotency key inside the caller's
    /// transaction.
    pub(crate) async fn find_movement_by_key(
        txn: &DatabaseTransaction,
        idempotency_key: Uuid,
    ) -> Result<Option<stock_movement::Model>, ServiceError> {
        let movement = stock_movement::Entity::find()
            .filter(stock_movement::Column::IdempotencyKey.eq(idempotency_key))
            .one(txn)
            .await?;
        Ok(movement)
    }

    /// Transaction-level delta application, composable by the workflow
    /// services into larger atomic units. Callers must already hold the
    /// per-key locks for every touched key.
    pub(crate) async fn apply_delta(
        txn: &DatabaseTransaction,
        location: StockLocation,
        bahan_id: i64,
        delta: Decimal,
        reason: &str,
        reference: Option<&MovementRef>,
        idempotency_key: Option<Uuid>,
    ) -> Result<StockMovementOutcome, ServiceError> {
        if let Some(key) = idempotency_key {
            if let Some(prior) = Self::find_movement_by_key(txn, key).await? {
                debug!(idempotency_key = %key, "replaying recorded movement");
                return Ok(StockMovementOutcome::replayed_from(prior));
            }
        }

        let location_id = location.location_id();
        let record = stock_record::Entity::find()
            .filter(stock_record::Column::LocationId.eq(location_id))
            .filter(stock_record::Column::BahanId.eq(bahan_id))
            .one(txn)
            .await?;

        let previous = record.as_ref().map(|r| r.quantity).unwrap_or(Decimal::ZERO);
        let new_quantity = previous + delta;
        if new_quantity < Decimal::ZERO {
            return Err(ServiceError::InsufficientStock(format!(
                "bahan {} at {}: available {}, requested {}",
                bahan_id, location, previous, -delta
            )));
        }

        let now = Utc::now().into();
        match record {
            Some(model) => {
                let mut active: stock_record::ActiveModel = model.into();
                active.quantity = Set(new_quantity);
                active.updated_at = Set(now);
                active.update(txn).await?;
            }
            None => {
                let active = stock_record::ActiveModel {
                    location_id: Set(location_id),
                    bahan_id: Set(bahan_id),
                    quantity: Set(new_quantity),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(txn).await?;
            }
        }

        let movement_id = Uuid::new_v4();
        let movement = stock_movement::ActiveModel {
            id: Set(movement_id),
            location_id: Set(location_id),
            bahan_id: Set(bahan_id),
            delta: Set(delta),
            previous_quantity: Set(previous),
            new_quantity: Set(new_quantity),
            reason: Set(reason.to_string()),
            reference_type: Set(reference.map(|r| r.reference_type.clone())),
            reference_id: Set(reference.map(|r| r.reference_id)),
            idempotency_key: Set(idempotency_key),
            created_at: Set(now),
        };
        movement.insert(txn).await?;

        Ok(StockMovementOutcome {
            movement_id,
            location,
            bahan_id,
            previous_quantity: previous,
            new_quantity,
            replayed: false,
        })
    }

    /// Transaction-level absolute overwrite. The caller guarantees
    /// `quantity >= 0` and holds the key lock.
    pub(crate) async fn apply_absolute(
        txn: &DatabaseTransaction,
        location: StockLocation,
        bahan_id: i64,
        quantity: Decimal,
        reason: &str,
        idempotency_key: Option<Uuid>,
    ) -> Result<StockMovementOutcome, ServiceError> {
        if let Some(key) = idempotency_key {
            if let Some(prior) = Self::find_movement_by_key(txn, key).await? {
                debug!(idempotency_key = %key, "replaying recorded movement");
                return Ok(StockMovementOutcome::replayed_from(prior));
            }
        }

        let location_id = location.location_id();
        let record = stock_record::Entity::find()
            .filter(stock_record::Column::LocationId.eq(location_id))
            .filter(stock_record::Column::BahanId.eq(bahan_id))
            .one(txn)
            .await?;

        let previous = record.as_ref().map(|r| r.quantity).unwrap_or(Decimal::ZERO);
        let delta = quantity - previous;

        let now = Utc::now().into();
        match record {
            Some(model) => {
                let mut active: stock_record::ActiveModel = model.into();
                active.quantity = Set(quantity);
                active.updated_at = Set(now);
                active.update(txn).await?;
            }
            None => {
                let active = stock_record::ActiveModel {
                    location_id: Set(location_id),
                    bahan_id: Set(bahan_id),
                    quantity: Set(quantity),
                    updated_at: Set(now),
                    ..Default::default()
                };
                active.insert(txn).await?;
            }
        }

        let movement_id = Uuid::new_v4();
        let movement = stock_movement::ActiveModel {
            id: Set(movement_id),
            location_id: Set(location_id),
            bahan_id: Set(bahan_id),
            delta: Set(delta),
            previous_quantity: Set(previous),
            new_quantity: Set(quantity),
            reason: Set(reason.to_string()),
            reference_type: Set(None),
            reference_id: Set(None),
            idempotency_key: Set(idempotency_key),
            created_at: Set(now),
        };
        movement.insert(txn).await?;

        Ok(StockMovementOutcome {
            movement_id,
            location,
            bahan_id,
            previous_quantity: previous,
            new_quantity: quantity,
            replayed: false,
        })
    }

    async fn emit_stock_adjusted(
        &self,
        outcome: &StockMovementOutcome,
    ) -> Result<(), ServiceError> {
        self.event_sender
            .send(Event::StockAdjusted {
                location_id: outcome.location.location_id(),
                bahan_id: outcome.bahan_id,
                previous_quantity: outcome.previous_quantity,
                new_quantity: outcome.new_quantity,
                movement_id: outcome.movement_id,
            })
            .await
            .map_err(ServiceError::EventError)
    }
}
