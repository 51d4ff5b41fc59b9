use rust_decimal::{Decimal, RoundingStrategy};

use crate::entities::bahan;

/// Formats a base-unit (gram) quantity in the material's packaging unit,
/// e.g. `3250` for a 1000 g/kg material becomes `"3 kg + sisa 250 gr"`.
///
/// Pure display transform; never touches the ledger. Materials whose unit is
/// already `gr` (case-insensitive) pass through unchanged, and materials with
/// missing packaging data fall back to a plain gram display rather than
/// mislabeling grams as packages.
pub fn to_display(quantity_base: Decimal, material: &bahan::Model) -> String {
    let satuan = material.satuan.trim();
    if satuan.eq_ignore_ascii_case("gr") {
        return format!("{} gr", format_quantity(quantity_base));
    }

    let per_unit_weight = material.per_unit_weight();
    if per_unit_weight <= Decimal::ZERO {
        return format!("{} gr", format_quantity(quantity_base));
    }

    let (pack_count, remainder) = split_packs(quantity_base, per_unit_weight);

    if pack_count > Decimal::ZERO && remainder > Decimal::ZERO {
        format!(
            "{} {} + sisa {} gr",
            format_quantity(pack_count),
            satuan,
            format_quantity(round_grams(remainder))
        )
    } else if pack_count > Decimal::ZERO {
        format!("{} {}", format_quantity(pack_count), satuan)
    } else {
        format!("{} gr", format_quantity(round_grams(remainder)))
    }
}

/// Splits a base quantity into `(pack_count, remainder)` for a per-package
/// weight, with `pack_count * per_unit_weight + remainder == quantity_base`
/// holding exactly.
pub fn split_packs(quantity_base: Decimal, per_unit_weight: Decimal) -> (Decimal, Decimal) {
    let pack_count = (quantity_base / per_unit_weight).floor();
    (pack_count, quantity_base - pack_count * per_unit_weight)
}

// Round half away from zero, matching how the display always rounded grams.
fn round_grams(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn kg_bahan(isi_per_satuan: Option<Decimal>, berat_per_isi: Option<Decimal>) -> bahan::Model {
        bahan::Model {
            id: 1,
            nama: "Gula Pasir".to_string(),
            satuan: "kg".to_string(),
            isi_per_satuan,
            berat_per_isi,
            stok_minimum_gudang: dec!(0),
            stok_minimum_outlet: dec!(0),
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn packs_with_remainder() {
        let material = kg_bahan(Some(dec!(1)), Some(dec!(1000)));
        assert_eq!(to_display(dec!(3250), &material), "3 kg + sisa 250 gr");
    }

    #[test]
    fn exact_packs_omit_remainder() {
        let material = kg_bahan(Some(dec!(1)), Some(dec!(1000)));
        assert_eq!(to_display(dec!(3000), &material), "3 kg");
    }

    #[test]
    fn below_one_pack_shows_grams() {
        let material = kg_bahan(Some(dec!(1)), Some(dec!(1000)));
        assert_eq!(to_display(dec!(700), &material), "700 gr");
    }

    #[test]
    fn gram_unit_passes_through() {
        let mut material = kg_bahan(None, None);
        material.satuan = "gr".to_string();
        assert_eq!(to_display(dec!(450), &material), "450 gr");

        material.satuan = "GR".to_string();
        assert_eq!(to_display(dec!(450), &material), "450 gr");
    }

    #[test]
    fn missing_packaging_data_falls_back_to_grams() {
        let material = kg_bahan(None, None);
        assert_eq!(to_display(dec!(1234), &material), "1234 gr");
    }

    #[test]
    fn absent_isi_per_satuan_defaults_to_one() {
        // 12-pack carton, 250 g per content unit
        let carton = bahan::Model {
            satuan: "karton".to_string(),
            isi_per_satuan: Some(dec!(12)),
            berat_per_isi: Some(dec!(250)),
            ..kg_bahan(None, None)
        };
        assert_eq!(to_display(dec!(6100), &carton), "2 karton + sisa 100 gr");

        let single = kg_bahan(None, Some(dec!(1000)));
        assert_eq!(to_display(dec!(2500), &single), "2 kg + sisa 500 gr");
    }

    #[test]
    fn remainder_rounds_half_away_from_zero() {
        let material = kg_bahan(Some(dec!(1)), Some(dec!(1000)));
        assert_eq!(to_display(dec!(1200.5), &material), "1 kg + sisa 201 gr");
    }

    #[test]
    fn zero_quantity_shows_zero_grams() {
        let material = kg_bahan(Some(dec!(1)), Some(dec!(1000)));
        assert_eq!(to_display(dec!(0), &material), "0 gr");
    }
}
