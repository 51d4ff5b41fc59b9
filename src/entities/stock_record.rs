use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Authoritative quantity per `(location_id, bahan_id)` key, in base units.
///
/// Exactly one row per key (unique index); a missing row reads as zero.
/// `quantity` is never negative after a committed operation.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub location_id: i64,
    pub bahan_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub quantity: Decimal,
    pub updated_at: DateTimeWithTimeZone,
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
