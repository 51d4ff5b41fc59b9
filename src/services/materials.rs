use crate::{
    db::DbPool,
    entities::{bahan, stock_record},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBahan {
    #[validate(length(min = 1, max = 100))]
    pub nama: String,
    #[validate(length(min = 1, max = 20))]
    pub satuan: String,
    pub isi_per_satuan: Option<Decimal>,
    pub berat_per_isi: Option<Decimal>,
    pub stok_minimum_gudang: Decimal,
    pub stok_minimum_outlet: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateBahan {
    #[validate(length(min = 1, max = 100))]
    pub nama: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub satuan: Option<String>,
    pub isi_per_satuan: Option<Decimal>,
    pub berat_per_isi: Option<Decimal>,
    pub stok_minimum_gudang: Option<Decimal>,
    pub stok_minimum_outlet: Option<Decimal>,
}

/// Materials catalog: the warehouse role's CRUD over raw materials.
#[derive(Clone)]
pub struct MaterialService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl MaterialService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, command), fields(nama = %command.nama))]
    pub async fn create(&self, command: CreateBahan) -> Result<bahan::Model, ServiceError> {
        command.validate()?;
        ensure_non_negative("isi_per_satuan", command.isi_per_satuan)?;
        ensure_non_negative("berat_per_isi", command.berat_per_isi)?;
        ensure_non_negative("stok_minimum_gudang", Some(command.stok_minimum_gudang))?;
        ensure_non_negative("stok_minimum_outlet", Some(command.stok_minimum_outlet))?;

        let now = Utc::now().into();
        let model = bahan::ActiveModel {
            nama: Set(command.nama),
            satuan: Set(command.satuan),
            isi_per_satuan: Set(command.isi_per_satuan),
            berat_per_isi: Set(command.berat_per_isi),
            stok_minimum_gudang: Set(command.stok_minimum_gudang),
            stok_minimum_outlet: Set(command.stok_minimum_outlet),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.db_pool.as_ref())
        .await?;

        info!(bahan_id = model.id, nama = %model.nama, "material created");
        self.event_sender
            .send(Event::BahanCreated(model.id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(model)
    }

    #[instrument(skip(self, command))]
    pub async fn update(
        &self,
        bahan_id: i64,
        command: UpdateBahan,
    ) -> Result<bahan::Model, ServiceError> {
        command.validate()?;
        ensure_non_negative("isi_per_satuan", command.isi_per_satuan)?;
        ensure_non_negative("berat_per_isi", command.berat_per_isi)?;
        ensure_non_negative("stok_minimum_gudang", command.stok_minimum_gudang)?;
        ensure_non_negative("stok_minimum_outlet", command.stok_minimum_outlet)?;

        let model = self.get(bahan_id).await?;
        let mut active: bahan::ActiveModel = model.into();

        if let Some(nama) = command.nama {
            active.nama = Set(nama);
        }
        if let Some(satuan) = command.satuan {
            active.satuan = Set(satuan);
        }
        if command.isi_per_satuan.is_some() {
            active.isi_per_satuan = Set(command.isi_per_satuan);
        }
        if command.berat_per_isi.is_some() {
            active.berat_per_isi = Set(command.berat_per_isi);
        }
        if let Some(minimum) = command.stok_minimum_gudang {
            active.stok_minimum_gudang = Set(minimum);
        }
        if let Some(minimum) = command.stok_minimum_outlet {
            active.stok_minimum_outlet = Set(minimum);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(self.db_pool.as_ref()).await?;
        self.event_sender
            .send(Event::BahanUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(updated)
    }

    /// Deleting is refused while any location still holds stock of the
    /// material, so ledger history can never point at a missing row.
    #[instrument(skip(self))]
    pub async fn delete(&self, bahan_id: i64) -> Result<(), ServiceError> {
        let model = self.get(bahan_id).await?;

        let held = stock_record::Entity::find()
            .filter(stock_record::Column::BahanId.eq(bahan_id))
            .filter(stock_record::Column::Quantity.ne(Decimal::ZERO))
            .one(self.db_pool.as_ref())
            .await?;
        if let Some(record) = held {
            return Err(ServiceError::InvalidStatus(format!(
                "bahan {} still has stock at location {}",
                bahan_id, record.location_id
            )));
        }

        model.delete(self.db_pool.as_ref()).await?;
        info!(bahan_id, "material deleted");
        self.event_sender
            .send(Event::BahanDeleted(bahan_id))
            .await
            .map_err(ServiceError::EventError)?;
        Ok(())
    }

    pub async fn get(&self, bahan_id: i64) -> Result<bahan::Model, ServiceError> {
        bahan::Entity::find_by_id(bahan_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("bahan {} not found", bahan_id)))
    }

    pub async fn list(&self) -> Result<Vec<bahan::Model>, ServiceError> {
        let materials = bahan::Entity::find()
            .order_by_asc(bahan::Column::Nama)
            .all(self.db_pool.as_ref())
            .await?;
        Ok(materials)
    }
}

fn ensure_non_negative(field: &str, value: Option<Decimal>) -> Result<(), ServiceError> {
    match value {
        Some(v) if v < Decimal::ZERO => Err(ServiceError::ValidationError(format!(
            "{} must be non-negative, got {}",
            field, v
        ))),
        _ => Ok(()),
    }
}
