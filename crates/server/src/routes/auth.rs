use crate::{
    auth::StaffUser,
    dtos::auth::{OnboardRequest, ProfileResponse},
    error::{AppError, AppResult},
    state::SharedState,
};
use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use database::services::{profile::ProfileService, restaurant::RestaurantService};
use models::{role::StaffRole, slug::generate_slug};

/// Returns the caller's profile, creating it on first sight
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Profile of the authenticated caller", body = ProfileResponse),
        (status = 401, description = "Unauthorized - invalid or missing JWT"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "Authentication"
)]
pub async fn me(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
) -> AppResult<Json<ProfileResponse>> {
    let profile = ProfileService::ensure(&state.db, &user.subject, Utc::now()).await?;

    let restaurant = match profile.restaurant_id {
        Some(id) => RestaurantService::find_by_id(&state.db, id).await?,
        None => None,
    };

    Ok(Json(ProfileResponse::new(profile, restaurant)))
}

/// Creates a restaurant and makes the caller its manager
#[utoipa::path(
    post,
    path = "/auth/onboard",
    request_body = OnboardRequest,
    responses(
        (status = 201, description = "Restaurant created", body = ProfileResponse),
        (status = 400, description = "Restaurant name is empty"),
        (status = 401, description = "Unauthorized - invalid or missing JWT"),
        (status = 409, description = "Caller already belongs to a restaurant, or the name is taken"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "Authentication"
)]
pub async fn onboard(
    State(state): State<SharedState>,
    Extension(user): Extension<StaffUser>,
    Json(body): Json<OnboardRequest>,
) -> AppResult<(StatusCode, Json<ProfileResponse>)> {
    let now = Utc::now();
    let profile = ProfileService::ensure(&state.db, &user.subject, now).await?;

    if profile.restaurant_id.is_some() {
        return Err(AppError::Conflict(
            "You already belong to a restaurant".to_string(),
        ));
    }

    let slug = generate_slug(&body.restaurant_name);
    if slug.is_empty() {
        return Err(AppError::BadRequest(
            "Restaurant name must contain letters or digits".to_string(),
        ));
    }
    if RestaurantService::find_by_slug(&state.db, &slug)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "A restaurant with the link \"{slug}\" already exists"
        )));
    }

    let restaurant =
        RestaurantService::create(&state.db, &body.restaurant_name, &user.subject, now).await?;
    let profile =
        ProfileService::attach(&state.db, &user.subject, restaurant.id, StaffRole::Manager)
            .await?
            .ok_or_else(|| AppError::not_found("Profile"))?;

    Ok((
        StatusCode::CREATED,
        Json(ProfileResponse::new(profile, Some(restaurant))),
    ))
}
