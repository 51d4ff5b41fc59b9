use crate::{
    db::DbPool,
    entities::{bahan, stock_record, StockLocation},
    errors::ServiceError,
    services::stock_status::{classify_for, StockStatus},
    services::unit_display,
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the per-location stock dashboard: the material, its current
/// quantity, the derived status for that location's threshold tier, and the
/// human display string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockOverviewItem {
    pub bahan: bahan::Model,
    pub quantity: Decimal,
    pub status: StockStatus,
    pub display: String,
}

/// Joins the materials catalog with the location's stock records. Materials
/// without a record show as zero. Snapshot semantics: the result may be
/// stale with respect to in-flight writes.
pub async fn stock_overview(
    db: &DbPool,
    location: StockLocation,
) -> Result<Vec<StockOverviewItem>, ServiceError> {
    location.ensure_valid()?;

    let materials = bahan::Entity::find()
        .order_by_asc(bahan::Column::Nama)
        .all(db)
        .await?;
    let records = stock_record::Entity::find()
        .filter(stock_record::Column::LocationId.eq(location.location_id()))
        .all(db)
        .await?;

    let quantities: HashMap<i64, Decimal> = records
        .into_iter()
        .map(|r| (r.bahan_id, r.quantity))
        .collect();

    let items = materials
        .into_iter()
        .map(|material| {
            let quantity = quantities
                .get(&material.id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            StockOverviewItem {
                status: classify_for(&material, location, quantity),
                display: unit_display::to_display(quantity, &material),
                quantity,
                bahan: material,
            }
        })
        .collect();
    Ok(items)
}

/// Number of materials currently `Kritis` at a location, as shown on the
/// owner dashboard.
pub async fn critical_count(db: &DbPool, location: StockLocation) -> Result<u64, ServiceError> {
    let items = stock_overview(db, location).await?;
    Ok(items
        .iter()
        .filter(|item| item.status == StockStatus::Kritis)
        .count() as u64)
}
