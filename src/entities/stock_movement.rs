use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only journal of every committed ledger mutation.
///
/// The optional `idempotency_key` (unique when present) is what makes
/// retried `adjust`/`record` calls safe: a replayed key returns the recorded
/// outcome instead of re-applying the delta.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub location_id: i64,
    pub bahan_id: i64,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub delta: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub previous_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub new_quantity: Decimal,
    pub reason: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    #[sea_orm(unique)]
    pub idempotency_key: Option<Uuid>,
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
