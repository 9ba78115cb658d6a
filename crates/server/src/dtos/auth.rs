use database::entities::{profiles, restaurants};
use models::role::StaffRole;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RestaurantResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<restaurants::Model> for RestaurantResponse {
    fn from(restaurant: restaurants::Model) -> Self {
        Self {
            id: restaurant.id,
            name: restaurant.name,
            slug: restaurant.slug,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub subject: String,
    pub role: StaffRole,
    pub restaurant: Option<RestaurantResponse>,
}

impl ProfileResponse {
    pub fn new(profile: profiles::Model, restaurant: Option<restaurants::Model>) -> Self {
        Self {
            subject: profile.id,
            role: profile.role,
            restaurant: restaurant.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OnboardRequest {
    pub restaurant_name: String,
}
