use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ServiceError;

pub mod bahan;
pub mod barang_keluar;
pub mod barang_keluar_detail;
pub mod barang_masuk;
pub mod permintaan_stok;
pub mod stock_movement;
pub mod stock_record;

/// Reserved `location_id` for the central warehouse.
pub const GUDANG_LOCATION_ID: i64 = 0;

/// A stock-holding location: the central warehouse or one retail outlet.
///
/// Encoded as a single `i64` column in the ledger tables; outlet ids are
/// caller-supplied opaque integers and must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "outlet_id", rename_all = "snake_case")]
pub enum StockLocation {
    Gudang,
    Outlet(i64),
}

impl StockLocation {
    pub fn location_id(&self) -> i64 {
        match self {
            StockLocation::Gudang => GUDANG_LOCATION_ID,
            StockLocation::Outlet(id) => *id,
        }
    }

    pub fn from_location_id(location_id: i64) -> Self {
        if location_id == GUDANG_LOCATION_ID {
            StockLocation::Gudang
        } else {
            StockLocation::Outlet(location_id)
        }
    }

    pub fn is_gudang(&self) -> bool {
        matches!(self, StockLocation::Gudang)
    }

    /// Rejects outlet ids that collide with the warehouse encoding or are
    /// otherwise malformed.
    pub fn ensure_valid(&self) -> Result<(), ServiceError> {
        match self {
            StockLocation::Gudang => Ok(()),
            StockLocation::Outlet(id) if *id > 0 => Ok(()),
            StockLocation::Outlet(id) => Err(ServiceError::ValidationError(format!(
                "outlet id must be positive, got {}",
                id
            ))),
        }
    }
}

impl fmt::Display for StockLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockLocation::Gudang => write!(f, "gudang"),
            StockLocation::Outlet(id) => write!(f, "outlet {}", id),
        }
    }
}
