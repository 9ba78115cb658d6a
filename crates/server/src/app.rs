use crate::{
    doc::ApiDoc,
    routes::{admin, auth, customer, health, reports, root, staff},
    state::SharedState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Headroom for the other multipart fields next to the photo
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Routes reachable without a token: ops, docs, customer pages and photos
pub fn public_routes(state: &SharedState) -> Router<SharedState> {
    let body_limit = state.photos.max_bytes() + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(root::root))
        .route("/health", get(health::health))
        .route("/tables/{restaurant_slug}/{table_label}", get(customer::get_table))
        .route(
            "/tables/{restaurant_slug}/{table_label}/requests",
            post(customer::create_request).layer(DefaultBodyLimit::max(body_limit)),
        )
        .nest_service("/photos", ServeDir::new(state.photos.dir()))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Routes that need a [`crate::auth::StaffUser`] extension on every request
pub fn protected_routes() -> Router<SharedState> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/onboard", post(auth::onboard))
        .route("/staff/tables", get(staff::list_tables))
        .route("/staff/tables/{id}/complete", post(staff::complete_table))
        .route("/staff/requests", get(staff::list_requests))
        .route("/staff/requests/completed", delete(staff::clear_completed))
        .route(
            "/staff/requests/{id}",
            get(staff::get_request).patch(staff::update_request),
        )
        .route("/staff/heatmap", get(staff::heatmap))
        .route("/staff/stream", get(staff::stream))
        .route("/staff/reports", get(reports::get_reports))
        .route("/admin/tables", get(admin::list_tables).post(admin::create_table))
        .route("/admin/tables/{id}", delete(admin::delete_table))
        .route("/admin/staff", post(admin::add_staff))
        .route("/admin/qr-links", get(admin::qr_links))
}
