use crate::{entities::requests, services::table::TableService};
use models::{
    report::{HourlyCount, TypeCount, hourly_report, type_report},
    request_type::RequestType,
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, QueryFilter, QuerySelect,
    sea_query::{Expr, SimpleExpr},
};
use uuid::Uuid;

pub struct ReportService;

/// Hour of the day (UTC) of `requests.created_at`, as an integer
fn created_hour(backend: DbBackend) -> SimpleExpr {
    match backend {
        DbBackend::Sqlite => Expr::cust(r#"CAST(strftime('%H', "created_at") AS INTEGER)"#),
        DbBackend::MySql => {
            Expr::cust("HOUR(CONVERT_TZ(`created_at`, @@session.time_zone, '+00:00'))")
        }
        DbBackend::Postgres => {
            Expr::cust(r#"CAST(EXTRACT(HOUR FROM "created_at" AT TIME ZONE 'UTC') AS INTEGER)"#)
        }
    }
}

impl ReportService {
    /// Requests per type across all of a restaurant's tables
    pub async fn type_counts<C: ConnectionTrait>(
        db: &C,
        restaurant_id: Uuid,
    ) -> Result<Vec<TypeCount>, DbErr> {
        let table_ids = TableService::ids_for_restaurant(db, restaurant_id).await?;

        let totals: Vec<(RequestType, i64)> = requests::Entity::find()
            .select_only()
            .column(requests::Column::RequestType)
            .column_as(Expr::col(requests::Column::Id).count(), "count")
            .filter(requests::Column::TableId.is_in(table_ids))
            .group_by(requests::Column::RequestType)
            .into_tuple()
            .all(db)
            .await?;

        Ok(type_report(
            totals
                .into_iter()
                .map(|(request_type, count)| (request_type, count.max(0) as u64)),
        ))
    }

    /// Requests per hour of the day (UTC) across a restaurant's tables
    pub async fn hourly_counts<C: ConnectionTrait>(
        db: &C,
        restaurant_id: Uuid,
    ) -> Result<Vec<HourlyCount>, DbErr> {
        let table_ids = TableService::ids_for_restaurant(db, restaurant_id).await?;
        let hour = created_hour(db.get_database_backend());

        let totals: Vec<(i32, i64)> = requests::Entity::find()
            .select_only()
            .column_as(hour.clone(), "hour")
            .column_as(Expr::col(requests::Column::Id).count(), "count")
            .filter(requests::Column::TableId.is_in(table_ids))
            .group_by(hour)
            .into_tuple()
            .all(db)
            .await?;

        Ok(hourly_report(totals.into_iter().filter_map(|(hour, count)| {
            Some((u32::try_from(hour).ok()?, count.max(0) as u64))
        })))
    }
}
