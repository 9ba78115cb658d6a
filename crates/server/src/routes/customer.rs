use crate::{
    dtos::{
        customer::{NewRequestForm, RequestOption, TablePageResponse},
        request::RequestResponse,
    },
    error::{AppError, AppResult},
    state::SharedState,
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use database::{
    entities::{restaurants, tables},
    services::{
        request::RequestService, restaurant::RestaurantService, table::TableService,
    },
};
use models::{change::RequestChange, cooldown::CooldownTracker, request_type::RequestType};

/// Resolves the restaurant and table behind a customer link
async fn resolve_table(
    state: &SharedState,
    slug: &str,
    label: &str,
) -> AppResult<(restaurants::Model, tables::Model)> {
    let restaurant = RestaurantService::find_by_slug(&state.db, slug)
        .await?
        .ok_or_else(|| AppError::not_found("Restaurant"))?;

    let table = TableService::find_by_label(&state.db, restaurant.id, label)
        .await?
        .ok_or_else(|| AppError::not_found("Table"))?;

    Ok((restaurant, table))
}

async fn cooldowns(state: &SharedState, table: &tables::Model) -> AppResult<CooldownTracker> {
    let latest = RequestService::latest_by_type(&state.db, table.id).await?;
    Ok(CooldownTracker::from_latest(latest))
}

/// Get the request options of a table with their cooldown status
#[utoipa::path(
    get,
    path = "/tables/{restaurant_slug}/{table_label}",
    params(
        ("restaurant_slug" = String, Path, description = "Restaurant slug"),
        ("table_label" = String, Path, description = "Table label")
    ),
    responses(
        (status = 200, description = "Table found", body = TablePageResponse),
        (status = 404, description = "Restaurant or table not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Customers"
)]
pub async fn get_table(
    State(state): State<SharedState>,
    Path((slug, label)): Path<(String, String)>,
) -> AppResult<Json<TablePageResponse>> {
    let (restaurant, table) = resolve_table(&state, &slug, &label).await?;
    let tracker = cooldowns(&state, &table).await?;

    let options = tracker
        .snapshot(Utc::now())
        .into_iter()
        .map(|(request_type, status)| RequestOption::new(request_type, status))
        .collect();

    Ok(Json(TablePageResponse {
        restaurant_id: restaurant.id,
        restaurant_name: restaurant.name,
        table_id: table.id,
        table_label: table.label,
        options,
    }))
}

/// Submit a service request from a table
#[utoipa::path(
    post,
    path = "/tables/{restaurant_slug}/{table_label}/requests",
    params(
        ("restaurant_slug" = String, Path, description = "Restaurant slug"),
        ("table_label" = String, Path, description = "Table label")
    ),
    request_body(content = NewRequestForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Request created", body = RequestResponse),
        (status = 400, description = "Unknown request type, missing or invalid photo"),
        (status = 404, description = "Restaurant or table not found"),
        (status = 429, description = "Request type is cooling down"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Customers"
)]
pub async fn create_request(
    State(state): State<SharedState>,
    Path((slug, label)): Path<(String, String)>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<RequestResponse>)> {
    let (restaurant, table) = resolve_table(&state, &slug, &label).await?;

    let mut request_type = None;
    let mut photo = None;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "type" => {
                let tag = field.text().await?;
                let parsed = tag
                    .trim()
                    .parse::<RequestType>()
                    .map_err(|_| AppError::BadRequest(format!("Unknown request type: {tag}")))?;
                request_type = Some(parsed);
            }
            "photo" => {
                let file_name = field.file_name().map(str::to_string);
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    photo = Some((file_name, bytes));
                }
            }
            _ => {}
        }
    }

    let request_type =
        request_type.ok_or_else(|| AppError::BadRequest("Missing request type".to_string()))?;

    // Same rule the customer page applies locally
    let now = Utc::now();
    cooldowns(&state, &table).await?.check(request_type, now)?;

    let photo_url = match (request_type.requires_photo(), photo) {
        (true, None) => {
            return Err(AppError::BadRequest(format!(
                "A photo is required for \"{}\"",
                request_type.label()
            )));
        }
        (true, Some((file_name, bytes))) => Some(
            state
                .photos
                .save(table.id, file_name.as_deref(), &bytes)
                .await?,
        ),
        (false, _) => None,
    };

    let request =
        match RequestService::create(&state.db, table.id, request_type, photo_url.clone(), now)
            .await
        {
            Ok(request) => request,
            Err(e) => {
                if let Some(url) = &photo_url {
                    state.photos.discard(url).await;
                }
                return Err(e.into());
            }
        };
    state
        .hub
        .publish(restaurant.id, RequestChange::insert(request.id, table.id));

    let view = RequestService::find_view(&state.db, request.id)
        .await?
        .ok_or_else(|| AppError::not_found("Request"))?;

    Ok((StatusCode::CREATED, Json(RequestResponse::new(view, now))))
}
