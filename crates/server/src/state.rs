use crate::{config::Config, realtime::RealtimeHub, storage::PhotoStore};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub db: DatabaseConnection,
    pub hub: RealtimeHub,
    pub photos: PhotoStore,
    pub config: Config,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> SharedState {
        let photos = PhotoStore::new(
            config.photo_dir.clone(),
            config.max_photo_bytes,
            &config.public_base_url,
        );

        Arc::new(Self {
            db,
            hub: RealtimeHub::new(),
            photos,
            config,
        })
    }
}
