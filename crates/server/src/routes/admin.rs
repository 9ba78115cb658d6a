use crate::{
    auth::{self, StaffUser},
    dtos::admin::{
        AddStaffRequest, CreateTableRequest, QrLinkResponse, StaffMemberResponse, TableResponse,
    },
    error::{AppError, AppResult},
    state::SharedState,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use database::services::{profile::ProfileService, table::TableService};
use models::{
    change::RequestChange,
    role::StaffRole,
    table::{compare_labels, normalize_label},
};
use uuid::Uuid;

/// List the restaurant's tables ordered by label
#[utoipa::path(
    get,
    path = "/admin/tables",
    responses(
        (status = 200, description = "Tables ordered by label", body = Vec<TableResponse>),
        (status = 403, description = "Access denied - managers only"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn list_tables(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
) -> AppResult<Json<Vec<TableResponse>>> {
    let member = auth::manager(&state, &user).await?;

    let tables = TableService::list(&state.db, member.restaurant.id).await?;
    Ok(Json(tables.into_iter().map(Into::into).collect()))
}

/// Add a table
#[utoipa::path(
    post,
    path = "/admin/tables",
    request_body = CreateTableRequest,
    responses(
        (status = 201, description = "Table created", body = TableResponse),
        (status = 400, description = "Invalid label"),
        (status = 403, description = "Access denied - managers only"),
        (status = 409, description = "Label already in use"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn create_table(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
    Json(body): Json<CreateTableRequest>,
) -> AppResult<(StatusCode, Json<TableResponse>)> {
    let member = auth::manager(&state, &user).await?;
    let restaurant_id = member.restaurant.id;

    let label = normalize_label(&body.label).map_err(|e| AppError::BadRequest(e.to_string()))?;

    if TableService::find_by_label(&state.db, restaurant_id, &label)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "Table \"{label}\" already exists"
        )));
    }

    let table = TableService::create(&state.db, restaurant_id, &label, Utc::now()).await?;
    log::info!("Added table {} to restaurant {restaurant_id}", table.label);

    Ok((StatusCode::CREATED, Json(table.into())))
}

/// Delete a table and all of its requests
#[utoipa::path(
    delete,
    path = "/admin/tables/{id}",
    params(("id" = Uuid, Path, description = "Table ID")),
    responses(
        (status = 204, description = "Table deleted"),
        (status = 403, description = "Access denied - managers only"),
        (status = 404, description = "Table not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn delete_table(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
    Path(table_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let member = auth::manager(&state, &user).await?;
    let restaurant_id = member.restaurant.id;

    TableService::find_by_id(&state.db, table_id)
        .await?
        .filter(|table| table.restaurant_id == restaurant_id)
        .ok_or_else(|| AppError::not_found("Table"))?;

    let removed = TableService::delete(&state.db, table_id)
        .await?
        .ok_or_else(|| AppError::not_found("Table"))?;

    state.hub.publish_all(
        restaurant_id,
        removed
            .into_iter()
            .map(|id| RequestChange::delete(id, table_id)),
    );

    Ok(StatusCode::NO_CONTENT)
}

/// Attach an existing account to the restaurant as staff
#[utoipa::path(
    post,
    path = "/admin/staff",
    request_body = AddStaffRequest,
    responses(
        (status = 200, description = "Account attached", body = StaffMemberResponse),
        (status = 403, description = "Access denied - managers only"),
        (status = 404, description = "No account with that subject"),
        (status = 409, description = "Account belongs to another restaurant"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn add_staff(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
    Json(body): Json<AddStaffRequest>,
) -> AppResult<Json<StaffMemberResponse>> {
    let member = auth::manager(&state, &user).await?;
    let restaurant_id = member.restaurant.id;
    let subject = body.subject.trim();

    let profile = ProfileService::find(&state.db, subject)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;

    if let Some(current) = profile.restaurant_id
        && current != restaurant_id
    {
        return Err(AppError::Conflict(
            "That account already belongs to another restaurant".to_string(),
        ));
    }

    // Re-attaching a member keeps their role
    let role = match profile.restaurant_id {
        Some(_) => profile.role,
        None => StaffRole::Staff,
    };

    let profile = ProfileService::attach(&state.db, subject, restaurant_id, role)
        .await?
        .ok_or_else(|| AppError::not_found("Account"))?;

    Ok(Json(StaffMemberResponse {
        subject: profile.id,
        role: profile.role,
    }))
}

/// Customer links to encode in each table's QR code
#[utoipa::path(
    get,
    path = "/admin/qr-links",
    responses(
        (status = 200, description = "One link per table in floor order", body = Vec<QrLinkResponse>),
        (status = 403, description = "Access denied - managers only"),
        (status = 500, description = "Internal server error")
    ),
    security(("jwt" = [])),
    tag = "Admin"
)]
pub async fn qr_links(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
) -> AppResult<Json<Vec<QrLinkResponse>>> {
    let member = auth::manager(&state, &user).await?;
    let slug = &member.restaurant.slug;
    let base_url = &state.config.public_base_url;

    let mut tables = TableService::list(&state.db, member.restaurant.id).await?;
    tables.sort_by(|a, b| compare_labels(&a.label, &b.label));

    Ok(Json(
        tables
            .into_iter()
            .map(|table| QrLinkResponse {
                url: format!("{base_url}/tables/{slug}/{}", table.label),
                table_id: table.id,
                label: table.label,
            })
            .collect(),
    ))
}
