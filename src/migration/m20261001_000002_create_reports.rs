//! Migration: Create reports table.
//!
//! One report per scan session, enforced by a unique index on
//! `scan_session_id`. Reports go away with their scan.

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_scans::Scans;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Reports::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Reports::ScanId).uuid().not_null())
                    .col(ColumnDef::new(Reports::ScanSessionId).uuid().not_null())
                    .col(ColumnDef::new(Reports::ReportType).string_len(20).not_null())
                    .col(ColumnDef::new(Reports::Payload).json_binary().not_null())
                    .col(
                        ColumnDef::new(Reports::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reports::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reports_scan_id")
                            .from(Reports::Table, Reports::ScanId)
                            .to(Scans::Table, Scans::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // The single-report-per-session rule lives here, not in process
        manager
            .create_index(
                Index::create()
                    .name("idx_reports_scan_session_id")
                    .table(Reports::Table)
                    .col(Reports::ScanSessionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reports_scan_id")
                    .table(Reports::Table)
                    .col(Reports::ScanId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reports::Table).if_exists().to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Reports {
    Table,
    Id,
    ScanId,
    ScanSessionId,
    ReportType,
    Payload,
    CreatedAt,
    UpdatedAt,
}
