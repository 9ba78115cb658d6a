use crate::{
    entities::{requests, restaurants, tables},
    services::table::TableService,
};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use models::{
    request::RequestView,
    request_type::RequestType,
    status::{RequestStatus, StatusFilter},
};
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};
use std::collections::HashMap;
use uuid::Uuid;

/// Result of a conditional status change
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Updated(requests::Model),
    NotFound,
    /// The request has already moved past the requested status
    Rejected { current: RequestStatus },
}

pub struct RequestService;

impl RequestService {
    /// Creation time of the newest request of every type at a table.
    /// Types never requested at the table are left out.
    pub async fn latest_by_type<C: ConnectionTrait>(
        db: &C,
        table_id: Uuid,
    ) -> Result<Vec<(RequestType, DateTime<Utc>)>, DbErr> {
        let lookups = RequestType::all().into_iter().map(|request_type| async move {
            let newest: Option<DateTime<Utc>> = requests::Entity::find()
                .select_only()
                .column(requests::Column::CreatedAt)
                .filter(requests::Column::TableId.eq(table_id))
                .filter(requests::Column::RequestType.eq(request_type))
                .order_by_desc(requests::Column::CreatedAt)
                .into_tuple()
                .one(db)
                .await?;

            Ok::<_, DbErr>(newest.map(|created_at| (request_type, created_at)))
        });

        Ok(try_join_all(lookups).await?.into_iter().flatten().collect())
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        table_id: Uuid,
        request_type: RequestType,
        photo_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<requests::Model, DbErr> {
        let request = requests::ActiveModel {
            id: Set(Uuid::new_v4()),
            table_id: Set(table_id),
            request_type: Set(request_type),
            status: Set(RequestStatus::Pending),
            photo_url: Set(photo_url),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(db)
        .await?;

        log::info!(
            "New {} request {} at table {}",
            request.request_type,
            request.id,
            request.table_id
        );
        Ok(request)
    }

    /// Loads one request with its table and restaurant names
    pub async fn find_view<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
    ) -> Result<Option<RequestView>, DbErr> {
        let Some((request, Some(table))) = requests::Entity::find_by_id(id)
            .find_also_related(tables::Entity)
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        let Some(restaurant) = restaurants::Entity::find_by_id(table.restaurant_id)
            .one(db)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(to_view(request, &table, &restaurant)))
    }

    /// Lists a restaurant's requests, newest first
    pub async fn list_views<C: ConnectionTrait>(
        db: &C,
        restaurant_id: Uuid,
        filter: StatusFilter,
    ) -> Result<Vec<RequestView>, DbErr> {
        let Some(restaurant) = restaurants::Entity::find_by_id(restaurant_id)
            .one(db)
            .await?
        else {
            return Ok(Vec::new());
        };

        let tables: HashMap<Uuid, tables::Model> = TableService::list(db, restaurant_id)
            .await?
            .into_iter()
            .map(|table| (table.id, table))
            .collect();

        let mut query = requests::Entity::find()
            .filter(requests::Column::TableId.is_in(tables.keys().copied()));
        if let Some(status) = filter.status() {
            query = query.filter(requests::Column::Status.eq(status));
        }

        let requests = query
            .order_by_desc(requests::Column::CreatedAt)
            .all(db)
            .await?;

        Ok(requests
            .into_iter()
            .filter_map(|request| {
                let table = tables.get(&request.table_id)?;
                Some(to_view(request, table, &restaurant))
            })
            .collect())
    }

    /// Number of a restaurant's requests in the given status
    pub async fn count_with_status<C: ConnectionTrait>(
        db: &C,
        restaurant_id: Uuid,
        status: RequestStatus,
    ) -> Result<u64, DbErr> {
        let table_ids = TableService::ids_for_restaurant(db, restaurant_id).await?;

        requests::Entity::find()
            .filter(requests::Column::TableId.is_in(table_ids))
            .filter(requests::Column::Status.eq(status))
            .count(db)
            .await
    }

    /// Moves a request to `next` if its current status allows it.
    ///
    /// The write is conditional on the stored status being a predecessor of
    /// `next`, so concurrent staff actions can never move a request
    /// backwards. Between forward writers the last write wins.
    pub async fn update_status<C: ConnectionTrait>(
        db: &C,
        id: Uuid,
        next: RequestStatus,
        now: DateTime<Utc>,
    ) -> Result<StatusUpdate, DbErr> {
        let result = requests::Entity::update_many()
            .col_expr(requests::Column::Status, Expr::value(next.to_value()))
            .col_expr(requests::Column::UpdatedAt, Expr::value(now))
            .filter(requests::Column::Id.eq(id))
            .filter(requests::Column::Status.is_in(RequestStatus::predecessors_of(next)))
            .exec(db)
            .await?;

        let Some(request) = requests::Entity::find_by_id(id).one(db).await? else {
            return Ok(StatusUpdate::NotFound);
        };

        if result.rows_affected == 0 {
            return Ok(StatusUpdate::Rejected {
                current: request.status,
            });
        }

        log::info!("Request {id} is now {next}");
        Ok(StatusUpdate::Updated(request))
    }

    /// Completes every active request of a table
    ///
    /// # Returns
    /// The ids of the requests that changed
    pub async fn complete_table<C: ConnectionTrait>(
        db: &C,
        table_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Uuid>, DbErr> {
        let ids: Vec<Uuid> = requests::Entity::find()
            .select_only()
            .column(requests::Column::Id)
            .filter(requests::Column::TableId.eq(table_id))
            .filter(requests::Column::Status.ne(RequestStatus::Completed))
            .into_tuple()
            .all(db)
            .await?;

        if ids.is_empty() {
            return Ok(ids);
        }

        requests::Entity::update_many()
            .col_expr(
                requests::Column::Status,
                Expr::value(RequestStatus::Completed.to_value()),
            )
            .col_expr(requests::Column::UpdatedAt, Expr::value(now))
            .filter(requests::Column::Id.is_in(ids.clone()))
            .exec(db)
            .await?;

        log::info!("Completed {} requests at table {table_id}", ids.len());
        Ok(ids)
    }

    /// Deletes the completed requests of one restaurant's tables
    ///
    /// # Returns
    /// `(request id, table id)` of every deleted request
    pub async fn clear_completed<C: ConnectionTrait>(
        db: &C,
        restaurant_id: Uuid,
    ) -> Result<Vec<(Uuid, Uuid)>, DbErr> {
        let table_ids = TableService::ids_for_restaurant(db, restaurant_id).await?;
        if table_ids.is_empty() {
            return Ok(Vec::new());
        }

        let removed: Vec<(Uuid, Uuid)> = requests::Entity::find()
            .select_only()
            .column(requests::Column::Id)
            .column(requests::Column::TableId)
            .filter(requests::Column::TableId.is_in(table_ids))
            .filter(requests::Column::Status.eq(RequestStatus::Completed))
            .into_tuple()
            .all(db)
            .await?;

        if removed.is_empty() {
            return Ok(removed);
        }

        requests::Entity::delete_many()
            .filter(requests::Column::Id.is_in(removed.iter().map(|(id, _)| *id)))
            .exec(db)
            .await?;

        log::info!(
            "Cleared {} completed requests of restaurant {restaurant_id}",
            removed.len()
        );
        Ok(removed)
    }
}

fn to_view(
    request: requests::Model,
    table: &tables::Model,
    restaurant: &restaurants::Model,
) -> RequestView {
    RequestView {
        id: request.id,
        request_type: request.request_type,
        status: request.status,
        photo_url: request.photo_url,
        created_at: request.created_at,
        table_id: table.id,
        table_label: table.label.clone(),
        restaurant_id: restaurant.id,
        restaurant_name: restaurant.name.clone(),
    }
}
