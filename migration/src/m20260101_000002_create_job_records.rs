use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CrawlRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CrawlRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CrawlRecords::OwnerId).string())
                    .col(ColumnDef::new(CrawlRecords::RootUrl).string().not_null())
                    .col(ColumnDef::new(CrawlRecords::Status).string().not_null())
                    .col(
                        ColumnDef::new(CrawlRecords::Pages)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(CrawlRecords::Snapshot).json().not_null())
                    .col(
                        ColumnDef::new(CrawlRecords::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CrawlRecords::CompletedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crawl_records_owner")
                    .table(CrawlRecords::Table)
                    .col(CrawlRecords::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AuditRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditRecords::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditRecords::OwnerId).string())
                    .col(ColumnDef::new(AuditRecords::Url).string().not_null())
                    .col(ColumnDef::new(AuditRecords::Status).string().not_null())
                    .col(ColumnDef::new(AuditRecords::OverallScore).integer())
                    .col(ColumnDef::new(AuditRecords::Snapshot).json().not_null())
                    .col(
                        ColumnDef::new(AuditRecords::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuditRecords::CompletedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_records_owner")
                    .table(AuditRecords::Table)
                    .col(AuditRecords::OwnerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CrawlRecords::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CrawlRecords {
    Table,
    Id,
    OwnerId,
    RootUrl,
    Status,
    Pages,
    Snapshot,
    StartedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
enum AuditRecords {
    Table,
    Id,
    OwnerId,
    Url,
    Status,
    OverallScore,
    Snapshot,
    StartedAt,
    CompletedAt,
}
