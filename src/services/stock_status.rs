use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::entities::{bahan, StockLocation};

/// Qualitative stock level derived from a quantity and a reorder threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum StockStatus {
    Aman,
    Menipis,
    Kritis,
}

/// Classifies a quantity against a minimum threshold.
///
/// Boundaries are inclusive toward the stricter status: a quantity exactly at
/// 30% of the minimum is `Kritis`, exactly at the minimum is `Menipis`. A
/// zero minimum disables the threshold, so any positive quantity is `Aman`.
pub fn classify(quantity: Decimal, minimum: Decimal) -> StockStatus {
    if quantity <= Decimal::ZERO {
        return StockStatus::Kritis;
    }
    if quantity <= minimum * dec!(0.3) {
        return StockStatus::Kritis;
    }
    if quantity <= minimum {
        return StockStatus::Menipis;
    }
    StockStatus::Aman
}

/// Classifies using the threshold tier of the given location (warehouse
/// minimum for `Gudang`, outlet minimum otherwise).
pub fn classify_for(material: &bahan::Model, location: StockLocation, quantity: Decimal) -> StockStatus {
    classify(quantity, material.minimum_for(location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    // "Gula Pasir" scenario: minimum 100
    #[case(dec!(100), dec!(100), StockStatus::Menipis)]
    #[case(dec!(30), dec!(100), StockStatus::Kritis)]
    #[case(dec!(101), dec!(100), StockStatus::Aman)]
    // boundary just above the critical band
    #[case(dec!(30.0001), dec!(100), StockStatus::Menipis)]
    // zero and negative quantities are always critical
    #[case(dec!(0), dec!(100), StockStatus::Kritis)]
    #[case(dec!(0), dec!(0), StockStatus::Kritis)]
    #[case(dec!(-5), dec!(100), StockStatus::Kritis)]
    // zero minimum disables the threshold
    #[case(dec!(0.0001), dec!(0), StockStatus::Aman)]
    #[case(dec!(500), dec!(0), StockStatus::Aman)]
    fn classifies_quantities(
        #[case] quantity: Decimal,
        #[case] minimum: Decimal,
        #[case] expected: StockStatus,
    ) {
        assert_eq!(classify(quantity, minimum), expected);
    }

    #[test]
    fn location_picks_threshold_tier() {
        let material = test_bahan(dec!(1000), dec!(100));

        // 150 is above the outlet minimum but far below the warehouse one
        assert_eq!(
            classify_for(&material, StockLocation::Gudang, dec!(150)),
            StockStatus::Kritis
        );
        assert_eq!(
            classify_for(&material, StockLocation::Outlet(1), dec!(150)),
            StockStatus::Aman
        );
    }

    fn test_bahan(min_gudang: Decimal, min_outlet: Decimal) -> bahan::Model {
        bahan::Model {
            id: 1,
            nama: "Gula Pasir".to_string(),
            satuan: "kg".to_string(),
            isi_per_satuan: None,
            berat_per_isi: None,
            stok_minimum_gudang: min_gudang,
            stok_minimum_outlet: min_outlet,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }
}
