use crate::{
    db::DbPool,
    entities::{bahan, permintaan_stok, permintaan_stok::PermintaanStatus, StockLocation},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePermintaanStok {
    pub outlet_id: i64,
    pub bahan_id: i64,
    /// Requested amount in base units; must be positive.
    pub jumlah: Decimal,
}

/// Per-status request counts for the warehouse demand view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemandSummary {
    pub diajukan: u64,
    pub disetujui: u64,
    pub ditolak: u64,
    pub fulfilled: u64,
    /// `diajukan + disetujui`: everything the warehouse still has to act on.
    pub open_demand: u64,
    pub total: u64,
}

/// Outlet-to-warehouse transfer request workflow.
///
/// `diajukan -> {disetujui, ditolak}` through warehouse approval;
/// `disetujui -> fulfilled` only when a shipment referencing the request is
/// received (driven by the outgoing-goods workflow).
#[derive(Clone)]
pub struct TransferRequestService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl TransferRequestService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, command), fields(outlet_id = command.outlet_id, bahan_id = command.bahan_id))]
    pub async fn create(
        &self,
        command: CreatePermintaanStok,
    ) -> Result<permintaan_stok::Model, ServiceError> {
        command.validate()?;
        StockLocation::Outlet(command.outlet_id).ensure_valid()?;
        if command.jumlah <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "requested amount must be positive, got {}",
                command.jumlah
            )));
        }

        // The material must exist before demand can be raised against it
        bahan::Entity::find_by_id(command.bahan_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("bahan {} not found", command.bahan_id))
            })?;

        let now = Utc::now().into();
        let model = permintaan_stok::ActiveModel {
            outlet_id: Set(command.outlet_id),
            bahan_id: Set(command.bahan_id),
            jumlah: Set(command.jumlah),
            status: Set(PermintaanStatus::Diajukan.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db_pool.as_ref())
        .await?;

        info!(permintaan_id = model.id, "transfer request created");
        self.event_sender
            .send(Event::TransferRequestCreated(model.id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn approve(&self, permintaan_id: i64) -> Result<permintaan_stok::Model, ServiceError> {
        let model = self
            .transition(permintaan_id, PermintaanStatus::Disetujui)
            .await?;
        self.event_sender
            .send(Event::TransferRequestApproved(permintaan_id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(model)
    }

    #[instrument(skip(self))]
    pub async fn reject(&self, permintaan_id: i64) -> Result<permintaan_stok::Model, ServiceError> {
        let model = self
            .transition(permintaan_id, PermintaanStatus::Ditolak)
            .await?;
        self.event_sender
            .send(Event::TransferRequestRejected(permintaan_id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(model)
    }

    pub async fn get(&self, permintaan_id: i64) -> Result<permintaan_stok::Model, ServiceError> {
        permintaan_stok::Entity::find_by_id(permintaan_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("permintaan {} not found", permintaan_id))
            })
    }

    /// Open demand the warehouse view works from: both freshly submitted and
    /// already-approved requests. Rejected and fulfilled ones are excluded.
    pub async fn pending_demand(&self) -> Result<Vec<permintaan_stok::Model>, ServiceError> {
        let requests = permintaan_stok::Entity::find()
            .filter(
                permintaan_stok::Column::Status.is_in([
                    PermintaanStatus::Diajukan.as_str(),
                    PermintaanStatus::Disetujui.as_str(),
                ]),
            )
            .order_by_asc(permintaan_stok::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(requests)
    }

    pub async fn list_for_outlet(
        &self,
        outlet_id: i64,
    ) -> Result<Vec<permintaan_stok::Model>, ServiceError> {
        StockLocation::Outlet(outlet_id).ensure_valid()?;
        let requests = permintaan_stok::Entity::find()
            .filter(permintaan_stok::Column::OutletId.eq(outlet_id))
            .order_by_asc(permintaan_stok::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(requests)
    }

    pub async fn demand_summary(&self) -> Result<DemandSummary, ServiceError> {
        let requests = permintaan_stok::Entity::find()
            .all(self.db_pool.as_ref())
            .await?;

        let mut summary = DemandSummary::default();
        for request in &requests {
            match request.parsed_status()? {
                PermintaanStatus::Diajukan => summary.diajukan += 1,
                PermintaanStatus::Disetujui => summary.disetujui += 1,
                PermintaanStatus::Ditolak => summary.ditolak += 1,
                PermintaanStatus::Fulfilled => summary.fulfilled += 1,
            }
        }
        summary.open_demand = summary.diajukan + summary.disetujui;
        summary.total = requests.len() as u64;
        Ok(summary)
    }

    /// Marks an approved request fulfilled inside the caller's transaction.
    /// Only the shipment-receive transition may do this.
    pub(crate) async fn mark_fulfilled(
        txn: &DatabaseTransaction,
        permintaan_id: i64,
    ) -> Result<permintaan_stok::Model, ServiceError> {
        let model = permintaan_stok::Entity::find_by_id(permintaan_id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("permintaan {} not found", permintaan_id))
            })?;

        let status = model.parsed_status()?;
        if status != PermintaanStatus::Disetujui {
            return Err(ServiceError::InvalidStatus(format!(
                "permintaan {} cannot be fulfilled from status '{}'",
                permintaan_id, status
            )));
        }

        let mut active: permintaan_stok::ActiveModel = model.into();
        active.status = Set(PermintaanStatus::Fulfilled.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(txn).await?)
    }

    /// Approval-stage transition, valid only from `diajukan`. Runs in its own
    /// transaction so two concurrent decisions cannot both win.
    async fn transition(
        &self,
        permintaan_id: i64,
        target: PermintaanStatus,
    ) -> Result<permintaan_stok::Model, ServiceError> {
        let model = self
            .db_pool
            .transaction::<_, permintaan_stok::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let model = permintaan_stok::Entity::find_by_id(permintaan_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "permintaan {} not found",
                                permintaan_id
                            ))
                        })?;

                    let status = model.parsed_status()?;
                    if status != PermintaanStatus::Diajukan {
                        return Err(ServiceError::InvalidStatus(format!(
                            "permintaan {} cannot move to '{}' from '{}'",
                            permintaan_id, target, status
                        )));
                    }

                    let mut active: permintaan_stok::ActiveModel = model.into();
                    active.status = Set(target.as_str().to_string());
                    active.updated_at = Set(Utc::now().into());
                    Ok(active.update(txn).await?)
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        info!(permintaan_id, status = %target, "transfer request transitioned");
        Ok(model)
    }
}
