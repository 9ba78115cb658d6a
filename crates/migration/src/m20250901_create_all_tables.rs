use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create restaurants table
        manager
            .create_table(
                Table::create()
                    .table(Restaurants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Restaurants::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Restaurants::Name).string().not_null())
                    .col(
                        ColumnDef::new(Restaurants::Slug)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Restaurants::OwnerId).string().not_null())
                    .col(
                        ColumnDef::new(Restaurants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Create tables table; a table never changes restaurant
        manager
            .create_table(
                Table::create()
                    .table(Tables::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tables::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tables::RestaurantId).uuid().not_null())
                    .col(ColumnDef::new(Tables::Label).string().not_null())
                    .col(
                        ColumnDef::new(Tables::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tables-restaurant_id")
                            .from(Tables::Table, Tables::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create requests table
        manager
            .create_table(
                Table::create()
                    .table(Requests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Requests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Requests::TableId).uuid().not_null())
                    .col(ColumnDef::new(Requests::RequestType).text().not_null())
                    .col(
                        ColumnDef::new(Requests::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Requests::PhotoUrl).string())
                    .col(
                        ColumnDef::new(Requests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Requests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-requests-table_id")
                            .from(Requests::Table, Requests::TableId)
                            .to(Tables::Table, Tables::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create profiles table, keyed by the identity provider's subject
        manager
            .create_table(
                Table::create()
                    .table(Profiles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Profiles::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Profiles::RestaurantId).uuid())
                    .col(
                        ColumnDef::new(Profiles::Role)
                            .text()
                            .not_null()
                            .default("staff"),
                    )
                    .col(
                        ColumnDef::new(Profiles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-profiles-restaurant_id")
                            .from(Profiles::Table, Profiles::RestaurantId)
                            .to(Restaurants::Table, Restaurants::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Profiles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Requests::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Tables::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Restaurants::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
pub(crate) enum Restaurants {
    Table,
    Id,
    Name,
    Slug,
    OwnerId,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum Tables {
    Table,
    Id,
    RestaurantId,
    Label,
    CreatedAt,
}

#[derive(Iden)]
pub(crate) enum Requests {
    Table,
    Id,
    TableId,
    RequestType,
    Status,
    PhotoUrl,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub(crate) enum Profiles {
    Table,
    Id,
    RestaurantId,
    Role,
    CreatedAt,
}
