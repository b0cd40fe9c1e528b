use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum PaymentReceipts {
    Table,
    Id,
    UserId,
    ReceiptImageUrl,
    Analysis,
    ValidationStatus,
    ReferenceNumber,
    CreatedAt,
}

#[derive(DeriveIden)]
enum UserNotifications {
    Table,
    Id,
    UserId,
    NotificationType,
    Title,
    Message,
    IsRead,
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
                    .table(PaymentReceipts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentReceipts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentReceipts::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(PaymentReceipts::ReceiptImageUrl)
                            .string_len(1024)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentReceipts::Analysis).json().not_null())
                    .col(
                        ColumnDef::new(PaymentReceipts::ValidationStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentReceipts::ReferenceNumber)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentReceipts::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("CURRENT_TIMESTAMP"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_receipts_user")
                            .from(PaymentReceipts::Table, PaymentReceipts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_payment_receipts_reference")
                    .table(PaymentReceipts::Table)
                    .col(PaymentReceipts::ReferenceNumber)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserNotifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserNotifications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserNotifications::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(UserNotifications::NotificationType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserNotifications::Title).string_len(255).not_null())
                    .col(ColumnDef::new(UserNotifications::Message).text().not_null())
                    .col(
                        ColumnDef::new(UserNotifications::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(UserNotifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("CURRENT_TIMESTAMP"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_notifications_user")
                            .from(UserNotifications::Table, UserNotifications::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_user_notifications_user")
                    .table(UserNotifications::Table)
                    .col(UserNotifications::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(UserNotifications::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(PaymentReceipts::Table).to_owned())
            .await?;
        Ok(())
    }
}
