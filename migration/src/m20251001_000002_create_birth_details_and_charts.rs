use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum BirthDetails {
    Table,
    Id,
    UserId,
    Name,
    BirthDate,
    BirthTime,
    BirthCity,
    BirthCountry,
    Latitude,
    Longitude,
    Timezone,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum VedicCharts {
    Table,
    Id,
    UserId,
    BirthDetailId,
    D1RasiChart,
    D9NavamsaChart,
    D10DasamsaChart,
    PlanetaryPositions,
    Nakshatras,
    VimshottariDasha,
    Houses,
    AyanamsaValue,
    AyanamsaType,
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
                    .table(BirthDetails::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BirthDetails::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BirthDetails::UserId).big_integer().not_null())
                    .col(ColumnDef::new(BirthDetails::Name).string_len(255).not_null())
                    .col(ColumnDef::new(BirthDetails::BirthDate).date().not_null())
                    .col(ColumnDef::new(BirthDetails::BirthTime).time().not_null())
                    .col(ColumnDef::new(BirthDetails::BirthCity).string_len(255).not_null())
                    .col(
                        ColumnDef::new(BirthDetails::BirthCountry)
                            .string_len(255)
                            .not_null()
                            .default("Unknown"),
                    )
                    .col(ColumnDef::new(BirthDetails::Latitude).double().not_null())
                    .col(ColumnDef::new(BirthDetails::Longitude).double().not_null())
                    .col(ColumnDef::new(BirthDetails::Timezone).string_len(64).not_null())
                    .col(
                        ColumnDef::new(BirthDetails::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(BirthDetails::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("CURRENT_TIMESTAMP"))
                            .null(),
                    )
                    .col(
                        ColumnDef::new(BirthDetails::UpdatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("CURRENT_TIMESTAMP"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_birth_details_user")
                            .from(BirthDetails::Table, BirthDetails::UserId)
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
                    .name("idx_birth_details_user_active")
                    .table(BirthDetails::Table)
                    .col(BirthDetails::UserId)
                    .col(BirthDetails::IsActive)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(VedicCharts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VedicCharts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(VedicCharts::UserId).big_integer().not_null())
                    .col(ColumnDef::new(VedicCharts::BirthDetailId).big_integer().not_null())
                    .col(ColumnDef::new(VedicCharts::D1RasiChart).json().not_null())
                    .col(ColumnDef::new(VedicCharts::D9NavamsaChart).json().not_null())
                    .col(ColumnDef::new(VedicCharts::D10DasamsaChart).json().not_null())
                    .col(ColumnDef::new(VedicCharts::PlanetaryPositions).json().not_null())
                    .col(ColumnDef::new(VedicCharts::Nakshatras).json().not_null())
                    .col(ColumnDef::new(VedicCharts::VimshottariDasha).json().not_null())
                    .col(ColumnDef::new(VedicCharts::Houses).json().not_null())
                    .col(ColumnDef::new(VedicCharts::AyanamsaValue).double().not_null())
                    .col(ColumnDef::new(VedicCharts::AyanamsaType).string_len(32).not_null())
                    .col(
                        ColumnDef::new(VedicCharts::CreatedAt)
                            .timestamp_with_time_zone()
                            .default(Expr::cust("CURRENT_TIMESTAMP"))
                            .null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vedic_charts_birth_detail")
                            .from(VedicCharts::Table, VedicCharts::BirthDetailId)
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
                    .name("idx_vedic_charts_birth_detail")
                    .table(VedicCharts::Table)
                    .col(VedicCharts::BirthDetailId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(VedicCharts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(BirthDetails::Table).to_owned())
            .await?;
        Ok(())
    }
}
