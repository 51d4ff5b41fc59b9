use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::StockLocation;

/// Raw material tracked by the stock ledger.
///
/// Quantities everywhere in the engine are in the base unit (grams for
/// weight-tracked materials); `satuan` / `isi_per_satuan` / `berat_per_isi`
/// only describe how a base quantity is presented to people.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bahan")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub nama: String,
    /// Display/packaging unit, e.g. "kg", "karton", "pcs", "gr".
    pub satuan: String,
    /// Content units per package; semantically defaults to 1 when absent.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub isi_per_satuan: Option<Decimal>,
    /// Base-unit (gram) weight per package-content unit.
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub berat_per_isi: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub stok_minimum_gudang: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub stok_minimum_outlet: Decimal,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_record::Entity")]
    StockRecord,
    #[sea_orm(has_many = "super::permintaan_stok::Entity")]
    PermintaanStok,
    #[sea_orm(has_many = "super::barang_masuk::Entity")]
    BarangMasuk,
}

impl Related<super::stock_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockRecord.def()
    }
}

impl Related<super::permintaan_stok::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PermintaanStok.def()
    }
}

impl Related<super::barang_masuk::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BarangMasuk.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Reorder threshold for the given location tier.
    pub fn minimum_for(&self, location: StockLocation) -> Decimal {
        match location {
            StockLocation::Gudang => self.stok_minimum_gudang,
            StockLocation::Outlet(_) => self.stok_minimum_outlet,
        }
    }

    /// Base-unit weight of one full package: `berat_per_isi * isi_per_satuan`,
    /// with an absent or zero `isi_per_satuan` treated as 1. Zero when the
    /// packaging data is missing.
    pub fn per_unit_weight(&self) -> Decimal {
        let berat = self.berat_per_isi.unwrap_or(Decimal::ZERO);
        let isi = match self.isi_per_satuan {
            Some(isi) if isi > Decimal::ZERO => isi,
            _ => Decimal::ONE,
        };
        berat * isi
    }
}
