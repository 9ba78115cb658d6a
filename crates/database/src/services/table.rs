use crate::entities::{requests, tables};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

pub struct TableService;

impl TableService {
    /// Lists a restaurant's tables ordered by label
    pub async fn list<C: ConnectionTrait>(
        db: &C,
        restaurant_id: Uuid,
    ) -> Result<Vec<tables::Model>, DbErr> {
        tables::Entity::find()
            .filter(tables::Column::RestaurantId.eq(restaurant_id))
            .order_by_asc(tables::Column::Label)
            .all(db)
            .await
    }

    pub async fn ids_for_restaurant<C: ConnectionTrait>(
        db: &C,
        restaurant_id: Uuid,
    ) -> Result<Vec<Uuid>, DbErr> {
        tables::Entity::find()
            .select_only()
            .column(tables::Column::Id)
            .filter(tables::Column::RestaurantId.eq(restaurant_id))
            .into_tuple()
            .all(db)
            .await
    }

    pub async fn find_by_id<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<tables::Model>, DbErr> {
        tables::Entity::find_by_id(id).one(db).await
    }

    pub async fn find_by_label<C: ConnectionTrait>(
        db: &C,
        restaurant_id: Uuid,
        label: &str,
    ) -> Result<Option<tables::Model>, DbErr> {
        tables::Entity::find()
            .filter(tables::Column::RestaurantId.eq(restaurant_id))
            .filter(tables::Column::Label.eq(label))
            .one(db)
            .await
    }

    /// Adds a table; the label must already be normalized
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        restaurant_id: Uuid,
        label: &str,
        now: DateTime<Utc>,
    ) -> Result<tables::Model, DbErr> {
        tables::ActiveModel {
            id: Set(Uuid::new_v4()),
            restaurant_id: Set(restaurant_id),
            label: Set(label.to_string()),
            created_at: Set(now),
        }
        .insert(db)
        .await
    }

    /// Deletes a table together with its requests.
    ///
    /// # Returns
    /// The ids of the removed requests, or `None` when the table does not
    /// exist
    pub async fn delete(db: &DatabaseConnection, id: Uuid) -> Result<Option<Vec<Uuid>>, DbErr> {
        let txn = db.begin().await?;

        if Self::find_by_id(&txn, id).await?.is_none() {
            return Ok(None);
        }

        let request_ids: Vec<Uuid> = requests::Entity::find()
            .select_only()
            .column(requests::Column::Id)
            .filter(requests::Column::TableId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        requests::Entity::delete_many()
            .filter(requests::Column::TableId.eq(id))
            .exec(&txn)
            .await?;
        tables::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        log::info!(
            "Deleted table {id} and {} of its requests",
            request_ids.len()
        );
        Ok(Some(request_ids))
    }
}
