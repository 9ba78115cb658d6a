use crate::entities::restaurants;
use chrono::{DateTime, Utc};
use models::slug::generate_slug;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    QueryFilter,
};
use uuid::Uuid;

pub struct RestaurantService;

impl RestaurantService {
    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<restaurants::Model>, DbErr> {
        restaurants::Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_slug<C: ConnectionTrait>(
        db: &C,
        slug: &str,
    ) -> Result<Option<restaurants::Model>, DbErr> {
        restaurants::Entity::find()
            .filter(restaurants::Column::Slug.eq(slug))
            .one(db)
            .await
    }

    /// Creates a restaurant whose slug is derived from its name.
    ///
    /// Callers check [`RestaurantService::find_by_slug`] first; a taken slug
    /// surfaces here as a unique constraint violation.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        name: &str,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<restaurants::Model, DbErr> {
        let restaurant = restaurants::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            slug: Set(generate_slug(name)),
            owner_id: Set(owner_id.to_string()),
            created_at: Set(now),
        }
        .insert(db)
        .await?;

        log::info!(
            "Created restaurant {} with slug {}",
            restaurant.id,
            restaurant.slug
        );
        Ok(restaurant)
    }
}
