use crate::entities::profiles;
use chrono::{DateTime, Utc};
use models::role::StaffRole;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder,
};
use uuid::Uuid;

pub struct ProfileService;

impl ProfileService {
    pub async fn find<C: ConnectionTrait>(
        db: &C,
        subject: &str,
    ) -> Result<Option<profiles::Model>, DbErr> {
        profiles::Entity::find_by_id(subject.to_string()).one(db).await
    }

    /// Returns the caller's profile, creating an unattached staff profile
    /// the first time a subject is seen
    pub async fn ensure<C: ConnectionTrait>(
        db: &C,
        subject: &str,
        now: DateTime<Utc>,
    ) -> Result<profiles::Model, DbErr> {
        if let Some(profile) = Self::find(db, subject).await? {
            return Ok(profile);
        }

        log::info!("Creating profile for {subject}");
        profiles::ActiveModel {
            id: Set(subject.to_string()),
            restaurant_id: Set(None),
            role: Set(StaffRole::Staff),
            created_at: Set(now),
        }
        .insert(db)
        .await
    }

    /// Associates a profile with a restaurant under the given role.
    /// Returns `None` when the subject has no profile yet.
    pub async fn attach<C: ConnectionTrait>(
        db: &C,
        subject: &str,
        restaurant_id: Uuid,
        role: StaffRole,
    ) -> Result<Option<profiles::Model>, DbErr> {
        let Some(profile) = Self::find(db, subject).await? else {
            return Ok(None);
        };

        let mut profile = profile.into_active_model();
        profile.restaurant_id = Set(Some(restaurant_id));
        profile.role = Set(role);
        let profile = profile.update(db).await?;

        log::info!("Attached {subject} to restaurant {restaurant_id} as {role}");
        Ok(Some(profile))
    }

    pub async fn list_for_restaurant<C: ConnectionTrait>(
        db: &C,
        restaurant_id: Uuid,
    ) -> Result<Vec<profiles::Model>, DbErr> {
        profiles::Entity::find()
            .filter(profiles::Column::RestaurantId.eq(restaurant_id))
            .order_by_asc(profiles::Column::CreatedAt)
            .all(db)
            .await
    }
}
