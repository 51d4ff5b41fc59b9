use crate::{
    db::DbPool,
    entities::{bahan, StockLocation},
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock_ledger::{reasons, StockLedgerService},
};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::Display;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Per-material state inside an opname session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OpnameItemStatus {
    /// No physical count recorded yet.
    Pending,
    /// Counted quantity matches the system quantity.
    Sesuai,
    /// Counted quantity differs from the system quantity.
    Selisih,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpnameItem {
    pub bahan_id: i64,
    pub nama: String,
    pub satuan: String,
    /// Ledger quantity snapshotted when the session started.
    pub stok_sistem: Decimal,
    /// Operator-entered physical count; `None` until recorded.
    pub stok_fisik: Option<Decimal>,
    /// `stok_fisik - stok_sistem`; zero until a count is recorded.
    pub selisih: Decimal,
    pub status: OpnameItemStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpnameSession {
    pub id: Uuid,
    pub location: StockLocation,
    pub started_at: DateTime<Utc>,
    pub items: Vec<OpnameItem>,
}

/// Result of a finalized session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpnameReport {
    pub session_id: Uuid,
    pub location: StockLocation,
    /// Items whose count differed and were committed to the ledger.
    pub adjusted: usize,
    /// Items counted and found matching; the ledger was not touched.
    pub unchanged: usize,
}

/// Physical stock count reconciliation.
///
/// Sessions are transient and purely in memory: nothing reaches the ledger
/// until `finalize`, which commits every variance in a single transaction
/// and clears the session.
pub struct StockOpnameService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    ledger: Arc<StockLedgerService>,
    sessions: DashMap<Uuid, OpnameSession>,
}

impl StockOpnameService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        ledger: Arc<StockLedgerService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            ledger,
            sessions: DashMap::new(),
        }
    }

    /// Snapshots the ledger at a location into a fresh counting session.
    /// Every stock record at the location becomes one `pending` item.
    #[instrument(skip(self))]
    pub async fn start_session(
        &self,
        location: StockLocation,
    ) -> Result<OpnameSession, ServiceError> {
        location.ensure_valid()?;

        let snapshot = self.ledger.snapshot(location).await?;
        let bahan_ids: Vec<i64> = snapshot.iter().map(|(id, _)| *id).collect();
        let materials = bahan::Entity::find()
            .filter(bahan::Column::Id.is_in(bahan_ids))
            .all(self.db_pool.as_ref())
            .await?;

        let items = snapshot
            .into_iter()
            .map(|(bahan_id, quantity)| {
                let material = materials.iter().find(|m| m.id == bahan_id);
                OpnameItem {
                    bahan_id,
                    nama: material.map(|m| m.nama.clone()).unwrap_or_default(),
                    satuan: material.map(|m| m.satuan.clone()).unwrap_or_default(),
                    stok_sistem: quantity,
                    stok_fisik: None,
                    selisih: Decimal::ZERO,
                    status: OpnameItemStatus::Pending,
                }
            })
            .collect();

        let session = OpnameSession {
            id: Uuid::new_v4(),
            location,
            started_at: Utc::now(),
            items,
        };
        info!(session_id = %session.id, %location, items = session.items.len(), "opname session started");
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    /// Records (or overwrites) the physical count for one material in the
    /// session. The session itself is untouched in the ledger until finalize.
    #[instrument(skip(self), fields(session_id = %session_id, bahan_id))]
    pub fn record_physical_count(
        &self,
        session_id: Uuid,
        bahan_id: i64,
        counted: Decimal,
    ) -> Result<OpnameItem, ServiceError> {
        if counted < Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "physical count must be non-negative, got {}",
                counted
            )));
        }

        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!("opname session {} not found", session_id))
            })?;

        let item = session
            .items
            .iter_mut()
            .find(|item| item.bahan_id == bahan_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "bahan {} is not part of opname session {}",
                    bahan_id, session_id
                ))
            })?;

        item.stok_fisik = Some(counted);
        item.selisih = counted - item.stok_sistem;
        item.status = if item.selisih == Decimal::ZERO {
            OpnameItemStatus::Sesuai
        } else {
            OpnameItemStatus::Selisih
        };
        Ok(item.clone())
    }

    pub fn get_session(&self, session_id: Uuid) -> Result<OpnameSession, ServiceError> {
        self.sessions
            .get(&session_id)
            .map(|entry| entry.clone())
            .ok_or_else(|| {
                ServiceError::NotFound(format!("opname session {} not found", session_id))
            })
    }

    /// Commits every recorded variance as an absolute ledger overwrite, all
    /// in one transaction, then clears the session. Finalizing a session
    /// with no recorded counts — or one that was already finalized — fails
    /// with `NothingToFinalize` and leaves the ledger alone.
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn finalize(&self, session_id: Uuid) -> Result<OpnameReport, ServiceError> {
        // Claim the session up front so a concurrent finalize sees it gone.
        let (_, session) = self
            .sessions
            .remove(&session_id)
            .ok_or(ServiceError::NothingToFinalize)?;

        let counted: Vec<&OpnameItem> = session
            .items
            .iter()
            .filter(|item| item.status != OpnameItemStatus::Pending)
            .collect();
        if counted.is_empty() {
            return Err(ServiceError::NothingToFinalize);
        }

        let to_commit: Vec<(i64, Decimal)> = counted
            .iter()
            .filter(|item| item.selisih != Decimal::ZERO)
            .filter_map(|item| item.stok_fisik.map(|fisik| (item.bahan_id, fisik)))
            .collect();
        let unchanged = counted.len() - to_commit.len();

        if !to_commit.is_empty() {
            let location = session.location;
            let keys: Vec<(i64, i64)> = to_commit
                .iter()
                .map(|(bahan_id, _)| (location.location_id(), *bahan_id))
                .collect();
            let _guards = self.ledger.lock_keys(&keys).await;

            let commits = to_commit.clone();
            let result = self
                .db_pool
                .transaction::<_, (), ServiceError>(move |txn| {
                    Box::pin(async move {
                        for (bahan_id, stok_fisik) in commits {
                            StockLedgerService::apply_absolute(
                                txn,
                                location,
                                bahan_id,
                                stok_fisik,
                                reasons::STOK_OPNAME,
                                None,
                            )
                            .await?;
                        }
                        Ok(())
                    })
                })
                .await
                .map_err(ServiceError::from_transaction);

            if let Err(err) = result {
                // Nothing was committed; put the session back for another try.
                warn!(session_id = %session_id, error = %err, "opname finalize rolled back");
                self.sessions.insert(session_id, session);
                return Err(err);
            }
        }

        let report = OpnameReport {
            session_id,
            location: session.location,
            adjusted: to_commit.len(),
            unchanged,
        };
        info!(
            session_id = %session_id,
            adjusted = report.adjusted,
            unchanged = report.unchanged,
            "opname session finalized"
        );
        self.event_sender
            .send(Event::OpnameFinalized {
                session_id,
                location_id: session.location.location_id(),
                adjusted_items: report.adjusted,
            })
            .await
            .map_err(ServiceError::EventError)?;
        Ok(report)
    }
}
