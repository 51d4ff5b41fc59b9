use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_bahan_table::Migration),
            Box::new(m20240101_000002_create_stock_tables::Migration),
            Box::new(m20240101_000003_create_permintaan_stok_table::Migration),
            Box::new(m20240101_000004_create_barang_keluar_tables::Migration),
            Box::new(m20240101_000005_create_barang_masuk_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_bahan_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_bahan_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Bahan::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Bahan::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Bahan::Nama).string().not_null())
                        .col(ColumnDef::new(Bahan::Satuan).string().not_null())
                        .col(ColumnDef::new(Bahan::IsiPerSatuan).decimal_len(16, 4).null())
                        .col(ColumnDef::new(Bahan::BeratPerIsi).decimal_len(16, 4).null())
                        .col(
                            ColumnDef::new(Bahan::StokMinimumGudang)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Bahan::StokMinimumOutlet)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Bahan::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Bahan::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_bahan_nama")
                        .table(Bahan::Table)
                        .col(Bahan::Nama)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Bahan::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Bahan {
        Table,
        Id,
        Nama,
        Satuan,
        IsiPerSatuan,
        BeratPerIsi,
        StokMinimumGudang,
        StokMinimumOutlet,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_stock_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_stock_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockRecords::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StockRecords::LocationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRecords::BahanId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRecords::Quantity)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(StockRecords::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One record per (location, material) key
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_records_location_bahan")
                        .table(StockRecords::Table)
                        .col(StockRecords::LocationId)
                        .col(StockRecords::BahanId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .not_null()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::LocationId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::BahanId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::Delta)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::PreviousQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::NewQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Reason).string().not_null())
                        .col(ColumnDef::new(StockMovements::ReferenceType).string().null())
                        .col(
                            ColumnDef::new(StockMovements::ReferenceId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(StockMovements::IdempotencyKey).uuid().null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_location_bahan")
                        .table(StockMovements::Table)
                        .col(StockMovements::LocationId)
                        .col(StockMovements::BahanId)
                        .to_owned(),
                )
                .await?;

            // NULL keys are exempt from uniqueness
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_idempotency_key")
                        .table(StockMovements::Table)
                        .col(StockMovements::IdempotencyKey)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum StockRecords {
        Table,
        Id,
        LocationId,
        BahanId,
        Quantity,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum StockMovements {
        Table,
        Id,
        LocationId,
        BahanId,
        Delta,
        PreviousQuantity,
        NewQuantity,
        Reason,
        ReferenceType,
        ReferenceId,
        IdempotencyKey,
        CreatedAt,
    }
}

mod m20240101_000003_create_permintaan_stok_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_permintaan_stok_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PermintaanStok::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PermintaanStok::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(PermintaanStok::OutletId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PermintaanStok::BahanId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PermintaanStok::Jumlah)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(PermintaanStok::Status).string().not_null())
                        .col(
                            ColumnDef::new(PermintaanStok::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PermintaanStok::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_permintaan_stok_status")
                        .table(PermintaanStok::Table)
                        .col(PermintaanStok::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_permintaan_stok_outlet_id")
                        .table(PermintaanStok::Table)
                        .col(PermintaanStok::OutletId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PermintaanStok::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum PermintaanStok {
        Table,
        Id,
        OutletId,
        BahanId,
        Jumlah,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_barang_keluar_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_barang_keluar_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BarangKeluar::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BarangKeluar::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(BarangKeluar::PermintaanId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BarangKeluar::OutletId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BarangKeluar::TanggalKeluar)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BarangKeluar::Status).string().not_null())
                        .col(
                            ColumnDef::new(BarangKeluar::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BarangKeluar::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_barang_keluar_permintaan_id")
                        .table(BarangKeluar::Table)
                        .col(BarangKeluar::PermintaanId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_barang_keluar_status")
                        .table(BarangKeluar::Table)
                        .col(BarangKeluar::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(BarangKeluarDetail::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BarangKeluarDetail::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(BarangKeluarDetail::BarangKeluarId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BarangKeluarDetail::BahanId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BarangKeluarDetail::Jumlah)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_barang_keluar_detail_header")
                        .table(BarangKeluarDetail::Table)
                        .col(BarangKeluarDetail::BarangKeluarId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BarangKeluarDetail::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(BarangKeluar::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum BarangKeluar {
        Table,
        Id,
        PermintaanId,
        OutletId,
        TanggalKeluar,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub enum BarangKeluarDetail {
        Table,
        Id,
        BarangKeluarId,
        BahanId,
        Jumlah,
    }
}

mod m20240101_000005_create_barang_masuk_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_barang_masuk_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BarangMasuk::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BarangMasuk::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(BarangMasuk::BahanId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BarangMasuk::Supplier).string().not_null())
                        .col(
                            ColumnDef::new(BarangMasuk::Jumlah)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BarangMasuk::Tanggal)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BarangMasuk::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_barang_masuk_tanggal")
                        .table(BarangMasuk::Table)
                        .col(BarangMasuk::Tanggal)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BarangMasuk::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum BarangMasuk {
        Table,
        Id,
        BahanId,
        Supplier,
        Jumlah,
        Tanggal,
        CreatedAt,
    }
}
