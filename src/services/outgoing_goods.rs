use crate::{
    config::ReservationPolicy,
    db::DbPool,
    entities::{
        barang_keluar, barang_keluar::BarangKeluarStatus, barang_keluar_detail, permintaan_stok,
        permintaan_stok::PermintaanStatus, StockLocation, GUDANG_LOCATION_ID,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock_ledger::{reasons, MovementRef, StockLedgerService},
    services::transfer_requests::TransferRequestService,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// A shipment header together with its material lines.
#[derive(Debug, Clone)]
pub struct Shipment {
    pub header: barang_keluar::Model,
    pub details: Vec<barang_keluar_detail::Model>,
}

/// Warehouse shipment workflow fulfilling approved transfer requests.
///
/// `pending -> in_transit -> received`, with `pending -> cancelled` as the
/// only other exit. When the shipment is received the warehouse is debited
/// and the destination outlet credited in one transaction, and the
/// originating request flips to `fulfilled`. The [`ReservationPolicy`]
/// decides whether the warehouse debit happens at receive (historical
/// behavior) or already at creation.
pub struct OutgoingGoodsService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    ledger: Arc<StockLedgerService>,
    reservation_policy: ReservationPolicy,
}

impl OutgoingGoodsService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        ledger: Arc<StockLedgerService>,
        reservation_policy: ReservationPolicy,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            ledger,
            reservation_policy,
        }
    }

    /// Creates a `pending` shipment from an approved request, copying the
    /// request line into the shipment details. Only one non-cancelled
    /// shipment may exist per request.
    #[instrument(skip(self))]
    pub async fn create_from_request(
        &self,
        permintaan_id: i64,
        tanggal_keluar: DateTime<Utc>,
    ) -> Result<Shipment, ServiceError> {
        // Peek at the request to learn which ledger key a reservation would
        // touch; everything is re-validated inside the transaction.
        let request = permintaan_stok::Entity::find_by_id(permintaan_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("permintaan {} not found", permintaan_id))
            })?;

        let reserve = self.reservation_policy == ReservationPolicy::ReserveOnCreate;
        let _guards = if reserve {
            Some(
                self.ledger
                    .lock_keys(&[(GUDANG_LOCATION_ID, request.bahan_id)])
                    .await,
            )
        } else {
            None
        };

        let shipment = self
            .db_pool
            .transaction::<_, Shipment, ServiceError>(move |txn| {
                Box::pin(async move {
                    let request = permintaan_stok::Entity::find_by_id(permintaan_id)
                        .one(txn)
                        .await?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!(
                                "permintaan {} not found",
                                permintaan_id
                            ))
                        })?;

                    let status = request.parsed_status()?;
                    if status != PermintaanStatus::Disetujui {
                        return Err(ServiceError::InvalidStatus(format!(
                            "permintaan {} must be 'disetujui' to ship, found '{}'",
                            permintaan_id, status
                        )));
                    }

                    let active_shipment = barang_keluar::Entity::find()
                        .filter(barang_keluar::Column::PermintaanId.eq(permintaan_id))
                        .filter(
                            barang_keluar::Column::Status
                                .ne(BarangKeluarStatus::Cancelled.as_str()),
                        )
                        .one(txn)
                        .await?;
                    if let Some(existing) = active_shipment {
                        return Err(ServiceError::InvalidStatus(format!(
                            "permintaan {} already has shipment {} ({})",
                            permintaan_id, existing.id, existing.status
                        )));
                    }

                    let now = Utc::now().into();
                    let header = barang_keluar::ActiveModel {
                        permintaan_id: Set(permintaan_id),
                        outlet_id: Set(request.outlet_id),
                        tanggal_keluar: Set(tanggal_keluar.into()),
                        status: Set(BarangKeluarStatus::Pending.as_str().to_string()),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    let detail = barang_keluar_detail::ActiveModel {
                        barang_keluar_id: Set(header.id),
                        bahan_id: Set(request.bahan_id),
                        jumlah: Set(request.jumlah),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    if reserve {
                        StockLedgerService::apply_delta(
                            txn,
                            StockLocation::Gudang,
                            detail.bahan_id,
                            -detail.jumlah,
                            reasons::BARANG_KELUAR_RESERVE,
                            Some(&MovementRef::barang_keluar(header.id)),
                            None,
                        )
                        .await?;
                    }

                    Ok(Shipment {
                        header,
                        details: vec![detail],
                    })
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        info!(
            barang_keluar_id = shipment.header.id,
            permintaan_id, "outgoing goods created"
        );
        self.event_sender
            .send(Event::BarangKeluarCreated(shipment.header.id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(shipment)
    }

    /// `pending -> in_transit`. No ledger effect: goods in transit stay on
    /// whichever side the reservation policy left them.
    #[instrument(skip(self))]
    pub async fn dispatch(&self, barang_keluar_id: i64) -> Result<barang_keluar::Model, ServiceError> {
        let header = self
            .db_pool
            .transaction::<_, barang_keluar::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let header = Self::load_header(txn, barang_keluar_id).await?;
                    let status = header.parsed_status()?;
                    if status != BarangKeluarStatus::Pending {
                        return Err(ServiceError::InvalidStatus(format!(
                            "barang keluar {} cannot be dispatched from '{}'",
                            barang_keluar_id, status
                        )));
                    }

                    let mut active: barang_keluar::ActiveModel = header.into();
                    active.status = Set(BarangKeluarStatus::InTransit.as_str().to_string());
                    active.updated_at = Set(Utc::now().into());
                    Ok(active.update(txn).await?)
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        info!(barang_keluar_id, "outgoing goods dispatched");
        self.event_sender
            .send(Event::BarangKeluarDispatched(barang_keluar_id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(header)
    }

    /// `in_transit -> received`: debits the warehouse (unless already
    /// reserved at creation), credits the destination outlet, and marks the
    /// originating request fulfilled, all in one transaction. On
    /// `InsufficientStock` nothing moves and the shipment stays `in_transit`.
    #[instrument(skip(self))]
    pub async fn receive(&self, barang_keluar_id: i64) -> Result<Shipment, ServiceError> {
        let existing = self.get(barang_keluar_id).await?;

        let mut keys = Vec::with_capacity(existing.details.len() * 2);
        for detail in &existing.details {
            keys.push((GUDANG_LOCATION_ID, detail.bahan_id));
            keys.push((existing.header.outlet_id, detail.bahan_id));
        }
        let _guards = self.ledger.lock_keys(&keys).await;

        let debit_warehouse = self.reservation_policy == ReservationPolicy::DebitOnReceive;
        let shipment = self
            .db_pool
            .transaction::<_, Shipment, ServiceError>(move |txn| {
                Box::pin(async move {
                    let header = Self::load_header(txn, barang_keluar_id).await?;
                    let status = header.parsed_status()?;
                    if status != BarangKeluarStatus::InTransit {
                        return Err(ServiceError::InvalidStatus(format!(
                            "barang keluar {} cannot be received from '{}'",
                            barang_keluar_id, status
                        )));
                    }

                    let details = barang_keluar_detail::Entity::find()
                        .filter(
                            barang_keluar_detail::Column::BarangKeluarId.eq(barang_keluar_id),
                        )
                        .all(txn)
                        .await?;

                    let destination = StockLocation::Outlet(header.outlet_id);
                    for detail in &details {
                        if debit_warehouse {
                            StockLedgerService::apply_delta(
                                txn,
                                StockLocation::Gudang,
                                detail.bahan_id,
                                -detail.jumlah,
                                reasons::BARANG_KELUAR_RECEIVE,
                                Some(&MovementRef::barang_keluar(header.id)),
                                None,
                            )
                            .await?;
                        }
                        StockLedgerService::apply_delta(
                            txn,
                            destination,
                            detail.bahan_id,
                            detail.jumlah,
                            reasons::BARANG_KELUAR_RECEIVE,
                            Some(&MovementRef::barang_keluar(header.id)),
                            None,
                        )
                        .await?;
                    }

                    TransferRequestService::mark_fulfilled(txn, header.permintaan_id).await?;

                    let permintaan_id = header.permintaan_id;
                    let mut active: barang_keluar::ActiveModel = header.into();
                    active.status = Set(BarangKeluarStatus::Received.as_str().to_string());
                    active.updated_at = Set(Utc::now().into());
                    let header = active.update(txn).await?;

                    info!(
                        barang_keluar_id,
                        permintaan_id, "outgoing goods received, stock moved"
                    );
                    Ok(Shipment { header, details })
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        self.event_sender
            .send(Event::BarangKeluarReceived {
                barang_keluar_id: shipment.header.id,
                permintaan_id: shipment.header.permintaan_id,
            })
            .await
            .map_err(ServiceError::EventError)?;
        self.event_sender
            .send(Event::TransferRequestFulfilled(shipment.header.permintaan_id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(shipment)
    }

    /// `pending -> cancelled`. The originating request stays `disetujui`, so
    /// a replacement shipment can be created for it. Under `ReserveOnCreate`
    /// the reservation is refunded to the warehouse.
    #[instrument(skip(self))]
    pub async fn cancel(&self, barang_keluar_id: i64) -> Result<barang_keluar::Model, ServiceError> {
        let existing = self.get(barang_keluar_id).await?;

        let refund = self.reservation_policy == ReservationPolicy::ReserveOnCreate;
        let _guards = if refund {
            let keys: Vec<(i64, i64)> = existing
                .details
                .iter()
                .map(|d| (GUDANG_LOCATION_ID, d.bahan_id))
                .collect();
            Some(self.ledger.lock_keys(&keys).await)
        } else {
            None
        };

        let header = self
            .db_pool
            .transaction::<_, barang_keluar::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    let header = Self::load_header(txn, barang_keluar_id).await?;
                    let status = header.parsed_status()?;
                    if status != BarangKeluarStatus::Pending {
                        return Err(ServiceError::InvalidStatus(format!(
                            "barang keluar {} cannot be cancelled from '{}'",
                            barang_keluar_id, status
                        )));
                    }

                    if refund {
                        let details = barang_keluar_detail::Entity::find()
                            .filter(
                                barang_keluar_detail::Column::BarangKeluarId.eq(barang_keluar_id),
                            )
                            .all(txn)
                            .await?;
                        for detail in &details {
                            StockLedgerService::apply_delta(
                                txn,
                                StockLocation::Gudang,
                                detail.bahan_id,
                                detail.jumlah,
                                reasons::BARANG_KELUAR_CANCEL,
                                Some(&MovementRef::barang_keluar(header.id)),
                                None,
                            )
                            .await?;
                        }
                    }

                    let mut active: barang_keluar::ActiveModel = header.into();
                    active.status = Set(BarangKeluarStatus::Cancelled.as_str().to_string());
                    active.updated_at = Set(Utc::now().into());
                    Ok(active.update(txn).await?)
                })
            })
            .await
            .map_err(ServiceError::from_transaction)?;

        info!(barang_keluar_id, "outgoing goods cancelled");
        self.event_sender
            .send(Event::BarangKeluarCancelled(barang_keluar_id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(header)
    }

    pub async fn get(&self, barang_keluar_id: i64) -> Result<Shipment, ServiceError> {
        let header = barang_keluar::Entity::find_by_id(barang_keluar_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("barang keluar {} not found", barang_keluar_id))
            })?;
        let details = barang_keluar_detail::Entity::find()
            .filter(barang_keluar_detail::Column::BarangKeluarId.eq(barang_keluar_id))
            .all(self.db_pool.as_ref())
            .await?;
        Ok(Shipment { header, details })
    }

    /// Shipments with `start <= tanggal_keluar < end`, newest first. The
    /// caller supplies its own local day boundaries.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<barang_keluar::Model>, ServiceError> {
        let shipments = barang_keluar::Entity::find()
            .filter(barang_keluar::Column::TanggalKeluar.gte(start))
            .filter(barang_keluar::Column::TanggalKeluar.lt(end))
            .order_by_desc(barang_keluar::Column::TanggalKeluar)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(shipments)
    }

    async fn load_header(
        txn: &DatabaseTransaction,
        barang_keluar_id: i64,
    ) -> Result<barang_keluar::Model, ServiceError> {
        barang_keluar::Entity::find_by_id(barang_keluar_id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("barang keluar {} not found", barang_keluar_id))
            })
    }
}
