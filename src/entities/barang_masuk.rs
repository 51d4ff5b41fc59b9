use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Supplier receipt into the warehouse. Append-only: recording is atomic and
/// final, there is no update or delete.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "barang_masuk")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub bahan_id: i64,
    pub supplier: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub jumlah: Decimal,
    /// Caller-supplied receipt timestamp; date-range queries take explicit
    /// bounds, the engine never assumes a timezone.
    pub tanggal: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bahan::Entity",
        from = "Column::BahanId",
        to = "super::bahan::Column::Id"
    )]
    Bahan,
}

impl Related<super::bahan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bahan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
