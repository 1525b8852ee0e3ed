use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.create_addresses_table(manager).await?;
        self.create_channels_table(manager).await?;
        self.create_ranked_results_table(manager).await?;
        self.create_indexes(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RankedResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Channels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Addresses::Table).to_owned())
            .await?;
        Ok(())
    }
}

impl Migration {
    async fn create_addresses_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Addresses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Addresses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Addresses::Value).string().not_null())
                    .col(
                        ColumnDef::new(Addresses::DiscoveredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_channels_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Channels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Channels::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Channels::Name).string().not_null())
                    .col(ColumnDef::new(Channels::StreamUrl).string().not_null())
                    .col(
                        ColumnDef::new(Channels::DiscoveredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_ranked_results_table(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RankedResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RankedResults::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RankedResults::Name).string().not_null())
                    .col(ColumnDef::new(RankedResults::StreamUrl).string().not_null())
                    .col(ColumnDef::new(RankedResults::SpeedKbps).double().not_null())
                    .col(
                        ColumnDef::new(RankedResults::ResolutionPx)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(RankedResults::TestedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn create_indexes(&self, manager: &SchemaManager<'_>) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_addresses_value")
                    .table(Addresses::Table)
                    .col(Addresses::Value)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // One row per (name, stream_url) pair
        manager
            .create_index(
                Index::create()
                    .name("idx_channels_name_stream_url")
                    .table(Channels::Table)
                    .col(Channels::Name)
                    .col(Channels::StreamUrl)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ranked_results_name")
                    .table(RankedResults::Table)
                    .col(RankedResults::Name)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Addresses {
    Table,
    Id,
    Value,
    DiscoveredAt,
}

#[derive(DeriveIden)]
enum Channels {
    Table,
    Id,
    Name,
    StreamUrl,
    DiscoveredAt,
}

#[derive(DeriveIden)]
enum RankedResults {
    Table,
    Id,
    Name,
    StreamUrl,
    SpeedKbps,
    ResolutionPx,
    TestedAt,
}
