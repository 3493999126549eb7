use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_customers_table::Migration),
            Box::new(m20240301_000002_create_videos_table::Migration),
            Box::new(m20240301_000003_create_rentals_table::Migration),
        ]
    }
}

mod m20240301_000001_create_customers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_customers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::PostalCode).string().not_null())
                        .col(ColumnDef::new(Customers::Phone).string().not_null())
                        .col(
                            ColumnDef::new(Customers::RegisteredAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Customers::VideosCheckedOutCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        Name,
        PostalCode,
        Phone,
        RegisteredAt,
        VideosCheckedOutCount,
    }
}

mod m20240301_000002_create_videos_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_videos_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Videos::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Videos::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Videos::Title).string().not_null())
                        .col(ColumnDef::new(Videos::ReleaseDate).date().not_null())
                        .col(
                            ColumnDef::new(Videos::TotalInventory)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Videos::AvailableInventory)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Videos::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Videos {
        Table,
        Id,
        Title,
        ReleaseDate,
        TotalInventory,
        AvailableInventory,
    }
}

mod m20240301_000003_create_rentals_table {

    use super::m20240301_000001_create_customers_table::Customers;
    use super::m20240301_000002_create_videos_table::Videos;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_rentals_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Rentals are released by the ledger before either parent row is
            // deleted, so the foreign keys restrict rather than cascade.
            manager
                .create_table(
                    Table::create()
                        .table(Rentals::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Rentals::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Rentals::CustomerId).integer().not_null())
                        .col(ColumnDef::new(Rentals::VideoId).integer().not_null())
                        .col(ColumnDef::new(Rentals::DueDate).date().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_rentals_customer_id")
                                .from(Rentals::Table, Rentals::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_rentals_video_id")
                                .from(Rentals::Table, Rentals::VideoId)
                                .to(Videos::Table, Videos::Id)
                                .on_delete(ForeignKeyAction::Restrict)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_rentals_customer_id")
                        .table(Rentals::Table)
                        .col(Rentals::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_rentals_video_id")
                        .table(Rentals::Table)
                        .col(Rentals::VideoId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Rentals::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Rentals {
        Table,
        Id,
        CustomerId,
        VideoId,
        DueDate,
    }
}
