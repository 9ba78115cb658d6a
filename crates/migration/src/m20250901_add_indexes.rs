use crate::m20250901_create_all_tables::{Profiles, Requests, Tables};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Labels are unique within a restaurant so customer links resolve
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tables_restaurant_id_label")
                    .table(Tables::Table)
                    .col(Tables::RestaurantId)
                    .col(Tables::Label)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Cooldown lookups: newest request of a type at a table
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_requests_table_id_type_created_at")
                    .table(Requests::Table)
                    .col(Requests::TableId)
                    .col(Requests::RequestType)
                    .col(Requests::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Dashboard listing and bulk clears filter on status
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_requests_status")
                    .table(Requests::Table)
                    .col(Requests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_profiles_restaurant_id")
                    .table(Profiles::Table)
                    .col(Profiles::RestaurantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop indexes in reverse order
        for name in [
            "idx_profiles_restaurant_id",
            "idx_requests_status",
            "idx_requests_table_id_type_created_at",
            "idx_tables_restaurant_id_label",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}
