//! In-memory SQLite fixtures shared by the service tests

use crate::{
    entities::{restaurants, tables},
    services::{restaurant::RestaurantService, table::TableService},
};
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};

pub(crate) async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub(crate) async fn seed_restaurant(
    db: &DatabaseConnection,
    name: &str,
    labels: &[&str],
) -> (restaurants::Model, Vec<tables::Model>) {
    let restaurant = RestaurantService::create(db, name, "owner", Utc::now())
        .await
        .unwrap();

    let mut created = Vec::new();
    for label in labels {
        created.push(
            TableService::create(db, restaurant.id, label, Utc::now())
                .await
                .unwrap(),
        );
    }

    (restaurant, created)
}
