use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One material line on an outgoing shipment, copied from the transfer
/// request the shipment fulfills.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "barang_keluar_detail")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub barang_keluar_id: i64,
    pub bahan_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub jumlah: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::barang_keluar::Entity",
        from = "Column::BarangKeluarId",
        to = "super::barang_keluar::Column::Id"
    )]
    BarangKeluar,
    #[sea_orm(
        belongs_to = "super::bahan::Entity",
        from = "Column::BahanId",
        to = "super::bahan::Column::Id"
    )]
    Bahan,
}

impl Related<super::barang_keluar::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BarangKeluar.def()
    }
}

impl Related<super::bahan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bahan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
