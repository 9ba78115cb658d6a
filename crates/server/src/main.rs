mod app;
mod auth;
mod config;
mod doc;
mod dtos;
mod error;
mod realtime;
mod routes;
mod state;
mod storage;
mod utils;

#[cfg(test)]
mod tests;

use crate::{config::Config, state::AppState, utils::shutdown::shutdown_signal};
use axum::middleware;
use log::{error, info};
use std::process::ExitCode;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_oauth2_resource_server::server::OAuth2ResourceServer;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let db = match database::db::create_connection(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to the database: {e}");
            return ExitCode::FAILURE;
        }
    };

    let oauth2_resource_server = match <OAuth2ResourceServer>::builder()
        .issuer_url(&config.oidc_issuer_url)
        .build()
        .await
    {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to build OAuth2ResourceServer: {e:?}");
            return ExitCode::FAILURE;
        }
    };

    let bind_addr = config.bind_addr;
    let state = AppState::new(db, config);

    let protected = app::protected_routes().layer(
        ServiceBuilder::new()
            .layer(oauth2_resource_server.into_layer())
            .layer(middleware::from_fn(auth::resolve_staff_user)),
    );

    let app = app::public_routes(&state)
        .merge(protected)
        .layer(CompressionLayer::new())
        .with_state(state);

    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {bind_addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("Running axum on http://{bind_addr}");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
