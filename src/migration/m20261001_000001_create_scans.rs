//! Migration: Create scans table.
//!
//! A scan owns its sessions as an embedded JSON array; `version` guards
//! concurrent read-modify-write of the aggregate.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Scans::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Scans::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Scans::Sessions).json_binary().not_null())
                    .col(
                        ColumnDef::new(Scans::Version)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(Scans::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Scans::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Scans::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Scans {
    Table,
    Id,
    Sessions,
    Version,
    CreatedAt,
    UpdatedAt,
}
