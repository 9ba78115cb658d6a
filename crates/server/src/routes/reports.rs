use crate::{
    auth::{self, StaffUser},
    dtos::admin::ReportResponse,
    error::AppResult,
    state::SharedState,
};
use axum::{Extension, Json, extract::State};
use database::services::report::ReportService;

/// Request counts per type and per hour of the day
#[utoipa::path(
    get,
    path = "/staff/reports",
    responses(
        (status = 200, description = "Report for the caller's restaurant", body = ReportResponse),
        (status = 403, description = "Caller is not a restaurant member"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Staff"
)]
pub async fn get_reports(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
) -> AppResult<Json<ReportResponse>> {
    let member = auth::member(&state, &user).await?;
    let restaurant_id = member.restaurant.id;

    let by_type = ReportService::type_counts(&state.db, restaurant_id).await?;
    let by_hour = ReportService::hourly_counts(&state.db, restaurant_id).await?;

    Ok(Json(ReportResponse {
        total: by_type.iter().map(|t| t.count).sum(),
        by_type,
        by_hour,
    }))
}
