use crate::{
    auth::{self, StaffUser},
    dtos::request::{
        BulkResult, RequestListResponse, RequestQueryParams, RequestResponse, UpdateStatusRequest,
    },
    error::{AppError, AppResult},
    realtime::FeedItem,
    state::SharedState,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::Utc;
use database::services::{
    request::{RequestService, StatusUpdate},
    table::TableService,
};
use futures::{Stream, StreamExt};
use models::{
    change::RequestChange,
    heatmap::{HeatmapCell, floor_heatmap},
    status::{RequestStatus, StatusFilter},
    table::{TableSummary, sort_tables},
};
use uuid::Uuid;

async fn floor_tables(state: &SharedState, restaurant_id: Uuid) -> AppResult<Vec<TableSummary>> {
    let mut tables: Vec<TableSummary> = TableService::list(&state.db, restaurant_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    sort_tables(&mut tables);
    Ok(tables)
}

/// List the caller's restaurant tables in floor order
#[utoipa::path(
    get,
    path = "/staff/tables",
    responses(
        (status = 200, description = "Tables in floor order", body = Vec<TableSummary>),
        (status = 403, description = "Caller is not a restaurant member"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Staff"
)]
pub async fn list_tables(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
) -> AppResult<Json<Vec<TableSummary>>> {
    let member = auth::member(&state, &user).await?;
    Ok(Json(floor_tables(&state, member.restaurant.id).await?))
}

/// List requests, newest first
#[utoipa::path(
    get,
    path = "/staff/requests",
    params(RequestQueryParams),
    responses(
        (status = 200, description = "Requests of the caller's restaurant", body = RequestListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 403, description = "Caller is not a restaurant member"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Staff"
)]
pub async fn list_requests(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
    Query(params): Query<RequestQueryParams>,
) -> AppResult<Json<RequestListResponse>> {
    let member = auth::member(&state, &user).await?;
    let restaurant_id = member.restaurant.id;

    let views = RequestService::list_views(&state.db, restaurant_id, params.status).await?;
    let completed_count =
        RequestService::count_with_status(&state.db, restaurant_id, RequestStatus::Completed)
            .await?;

    let now = Utc::now();
    Ok(Json(RequestListResponse {
        requests: views
            .into_iter()
            .map(|view| RequestResponse::new(view, now))
            .collect(),
        completed_count: completed_count as usize,
    }))
}

/// Get a single request with its table and restaurant names
#[utoipa::path(
    get,
    path = "/staff/requests/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    responses(
        (status = 200, description = "Request found", body = RequestResponse),
        (status = 403, description = "Caller is not a restaurant member"),
        (status = 404, description = "Request not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Staff"
)]
pub async fn get_request(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RequestResponse>> {
    let member = auth::member(&state, &user).await?;

    let view = RequestService::find_view(&state.db, id)
        .await?
        .filter(|view| view.restaurant_id == member.restaurant.id)
        .ok_or_else(|| AppError::not_found("Request"))?;

    Ok(Json(RequestResponse::new(view, Utc::now())))
}

/// Move a request forward (`pending` → `in_progress` → `completed`)
#[utoipa::path(
    patch,
    path = "/staff/requests/{id}",
    params(("id" = Uuid, Path, description = "Request ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = RequestResponse),
        (status = 403, description = "Caller is not a restaurant member"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request has already moved past that status"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Staff"
)]
pub async fn update_request(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStatusRequest>,
) -> AppResult<Json<RequestResponse>> {
    let member = auth::member(&state, &user).await?;
    let restaurant_id = member.restaurant.id;

    // Scope check before writing
    RequestService::find_view(&state.db, id)
        .await?
        .filter(|view| view.restaurant_id == restaurant_id)
        .ok_or_else(|| AppError::not_found("Request"))?;

    let now = Utc::now();
    let request = match RequestService::update_status(&state.db, id, body.status, now).await? {
        StatusUpdate::Updated(request) => request,
        StatusUpdate::NotFound => return Err(AppError::not_found("Request")),
        StatusUpdate::Rejected { current } => {
            return Err(AppError::Conflict(format!(
                "Request is already {}",
                current.label().to_lowercase()
            )));
        }
    };

    state
        .hub
        .publish(restaurant_id, RequestChange::update(request.id, request.table_id));

    let view = RequestService::find_view(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Request"))?;
    Ok(Json(RequestResponse::new(view, now)))
}

/// Complete every active request of a table
#[utoipa::path(
    post,
    path = "/staff/tables/{id}/complete",
    params(("id" = Uuid, Path, description = "Table ID")),
    responses(
        (status = 200, description = "Number of requests completed", body = BulkResult),
        (status = 403, description = "Caller is not a restaurant member"),
        (status = 404, description = "Table not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Staff"
)]
pub async fn complete_table(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
    Path(table_id): Path<Uuid>,
) -> AppResult<Json<BulkResult>> {
    let member = auth::member(&state, &user).await?;
    let restaurant_id = member.restaurant.id;

    TableService::find_by_id(&state.db, table_id)
        .await?
        .filter(|table| table.restaurant_id == restaurant_id)
        .ok_or_else(|| AppError::not_found("Table"))?;

    let changed = RequestService::complete_table(&state.db, table_id, Utc::now()).await?;
    state.hub.publish_all(
        restaurant_id,
        changed
            .iter()
            .map(|id| RequestChange::update(*id, table_id)),
    );

    Ok(Json(BulkResult {
        count: changed.len(),
    }))
}

/// Delete all completed requests of the caller's restaurant
#[utoipa::path(
    delete,
    path = "/staff/requests/completed",
    responses(
        (status = 200, description = "Number of requests removed", body = BulkResult),
        (status = 403, description = "Caller is not a restaurant member"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Staff"
)]
pub async fn clear_completed(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
) -> AppResult<Json<BulkResult>> {
    let member = auth::member(&state, &user).await?;
    let restaurant_id = member.restaurant.id;

    let removed = RequestService::clear_completed(&state.db, restaurant_id).await?;
    state.hub.publish_all(
        restaurant_id,
        removed
            .iter()
            .map(|(id, table_id)| RequestChange::delete(*id, *table_id)),
    );

    Ok(Json(BulkResult {
        count: removed.len(),
    }))
}

/// Floor heatmap: each table coloured by its most urgent active request
#[utoipa::path(
    get,
    path = "/staff/heatmap",
    responses(
        (status = 200, description = "One cell per table in floor order", body = Vec<HeatmapCell>),
        (status = 403, description = "Caller is not a restaurant member"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Staff"
)]
pub async fn heatmap(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
) -> AppResult<Json<Vec<HeatmapCell>>> {
    let member = auth::member(&state, &user).await?;
    let restaurant_id = member.restaurant.id;

    let tables = floor_tables(&state, restaurant_id).await?;
    let requests = RequestService::list_views(&state.db, restaurant_id, StatusFilter::All).await?;

    Ok(Json(floor_heatmap(&tables, &requests)))
}

/// Server-sent change events for the caller's restaurant.
///
/// Each `change` event carries `{"kind", "id", "table_id"}`. A `resync`
/// event means notifications were dropped and the baseline must be
/// refetched.
#[utoipa::path(
    get,
    path = "/staff/stream",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = RequestChange),
        (status = 403, description = "Caller is not a restaurant member"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Staff"
)]
pub async fn stream(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let member = auth::member(&state, &user).await?;
    log::info!(
        "{} subscribed to changes of restaurant {}",
        user.subject,
        member.restaurant.id
    );

    let events = state
        .hub
        .subscribe(member.restaurant.id)
        .into_stream()
        .map(|item| match item {
            FeedItem::Change(change) => Event::default().event("change").json_data(change),
            FeedItem::Lagged(missed) => Ok(Event::default()
                .event("resync")
                .data(missed.to_string())),
        });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
