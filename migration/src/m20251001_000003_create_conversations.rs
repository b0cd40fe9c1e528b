use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum BirthDetails {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Conversations {
    Table,
    Id,
    UserId,
    BirthDetailId,
    Role,
    Content,
    ChartContextUsed,
    SearchUsed,
    Sources,
    IsLimitMessage,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Conversations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Conversations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Conversations::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Conversations::BirthDetailId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Conversations::Role).string_len(16).not_null())
                    .col(ColumnDef::new(Conversations::Content).text().not_null())
                    .col(
                        ColumnDef::new(Conversations::ChartContextUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Conversations::SearchUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Conversations::Sources).json().null())
                    .col(
                        ColumnDef::new(Conversations::IsLimitMessage)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Conversations::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("CURRENT_TIMESTAMP"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_conversations_birth_detail")
                            .from(Conversations::Table, Conversations::BirthDetailId)
                            .to(BirthDetails::Table, BirthDetails::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_conversations_user_birth_created")
                    .table(Conversations::Table)
                    .col(Conversations::UserId)
                    .col(Conversations::BirthDetailId)
                    .col(Conversations::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Conversations::Table).to_owned())
            .await?;
        Ok(())
    }
}
