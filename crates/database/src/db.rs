use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// Creates a database connection pool
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url);
    options
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging_level(log::LevelFilter::Debug);

    Database::connect(options).await
}
