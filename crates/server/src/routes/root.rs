use axum::http::StatusCode;

/// Returns "OK" so load balancers can probe the root path
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running", content_type = "text/plain", body = String)
    ),
    tag = "Health"
)]
pub async fn root() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
