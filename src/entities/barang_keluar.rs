use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Warehouse shipment fulfilling one approved transfer request.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "barang_keluar")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub permintaan_id: i64,
    pub outlet_id: i64,
    pub tanggal_keluar: DateTimeWithTimeZone,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

/// Shipment lifecycle: `pending -> in_transit -> received`;
/// `pending -> cancelled`. `received` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BarangKeluarStatus {
    Pending,
    InTransit,
    Received,
    Cancelled,
}

impl BarangKeluarStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarangKeluarStatus::Pending => "pending",
            BarangKeluarStatus::InTransit => "in_transit",
            BarangKeluarStatus::Received => "received",
            BarangKeluarStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BarangKeluarStatus::Received | BarangKeluarStatus::Cancelled
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::permintaan_stok::Entity",
        from = "Column::PermintaanId",
        to = "super::permintaan_stok::Column::Id"
    )]
    PermintaanStok,
    #[sea_orm(has_many = "super::barang_keluar_detail::Entity")]
    Detail,
}

impl Related<super::permintaan_stok::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PermintaanStok.def()
    }
}

impl Related<super::barang_keluar_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Detail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn parsed_status(&self) -> Result<BarangKeluarStatus, crate::errors::ServiceError> {
        self.status.parse::<BarangKeluarStatus>().map_err(|_| {
            crate::errors::ServiceError::InternalError(format!(
                "barang keluar {} has unknown status '{}'",
                self.id, self.status
            ))
        })
    }
}
