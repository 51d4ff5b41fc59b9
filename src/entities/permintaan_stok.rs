use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Outlet-to-warehouse stock transfer request.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "permintaan_stok")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub outlet_id: i64,
    pub bahan_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub jumlah: Decimal,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

/// Request lifecycle: `diajukan -> {disetujui, ditolak}`;
/// `disetujui -> fulfilled` only via a received shipment.
/// `ditolak` and `fulfilled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PermintaanStatus {
    Diajukan,
    Disetujui,
    Ditolak,
    Fulfilled,
}

impl PermintaanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermintaanStatus::Diajukan => "diajukan",
            PermintaanStatus::Disetujui => "disetujui",
            PermintaanStatus::Ditolak => "ditolak",
            PermintaanStatus::Fulfilled => "fulfilled",
        }
    }

    /// Open demand the warehouse still has to act on.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            PermintaanStatus::Diajukan | PermintaanStatus::Disetujui
        )
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bahan::Entity",
        from = "Column::BahanId",
        to = "super::bahan::Column::Id"
    )]
    Bahan,
    #[sea_orm(has_many = "super::barang_keluar::Entity")]
    BarangKeluar,
}

impl Related<super::bahan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bahan.def()
    }
}

impl Related<super::barang_keluar::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BarangKeluar.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn parsed_status(&self) -> Result<PermintaanStatus, crate::errors::ServiceError> {
        self.status.parse::<PermintaanStatus>().map_err(|_| {
            crate::errors::ServiceError::InternalError(format!(
                "permintaan {} has unknown status '{}'",
                self.id, self.status
            ))
        })
    }
}
