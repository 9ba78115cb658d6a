use crate::{
    error::{AppError, AppResult},
    state::AppState,
};
use axum::{Extension, extract::Request, middleware::Next, response::Response};
use chrono::Utc;
use database::{
    entities::{profiles, restaurants},
    services::{profile::ProfileService, restaurant::RestaurantService},
};
use tower_oauth2_resource_server::claims::DefaultClaims;

/// The authenticated caller, identified by the token's subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffUser {
    pub subject: String,
}

impl StaffUser {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}

/// Turns validated JWT claims into a [`StaffUser`] extension
pub async fn resolve_staff_user(
    claims: Option<Extension<DefaultClaims>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let subject = claims
        .and_then(|Extension(claims)| claims.sub)
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(StaffUser::new(subject));
    Ok(next.run(request).await)
}

/// A caller that belongs to a restaurant
#[derive(Debug, Clone)]
pub struct Member {
    pub profile: profiles::Model,
    pub restaurant: restaurants::Model,
}

impl Member {
    pub fn require_manager(&self) -> AppResult<()> {
        if self.profile.role.is_manager() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Access Denied: This page is for managers only.".to_string(),
            ))
        }
    }
}

/// Loads the caller's profile and restaurant, failing with 403 when the
/// caller has not joined a restaurant yet
pub async fn member(state: &AppState, user: &StaffUser) -> AppResult<Member> {
    let profile = ProfileService::ensure(&state.db, &user.subject, Utc::now()).await?;

    let Some(restaurant_id) = profile.restaurant_id else {
        return Err(AppError::Forbidden(
            "You are not a member of any restaurant".to_string(),
        ));
    };

    let restaurant = RestaurantService::find_by_id(&state.db, restaurant_id)
        .await?
        .ok_or_else(|| AppError::not_found("Restaurant"))?;

    Ok(Member {
        profile,
        restaurant,
    })
}

/// Like [`member`], but only for managers
pub async fn manager(state: &AppState, user: &StaffUser) -> AppResult<Member> {
    let member = member(state, user).await?;
    member.require_manager()?;
    Ok(member)
}
