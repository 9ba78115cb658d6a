use chrono::{DateTime, Utc};
use database::entities::tables;
use models::{
    report::{HourlyCount, TypeCount},
    role::StaffRole,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TableResponse {
    pub id: Uuid,
    pub label: String,
    pub created_at: DateTime<Utc>,
}

impl From<tables::Model> for TableResponse {
    fn from(table: tables::Model) -> Self {
        Self {
            id: table.id,
            label: table.label,
            created_at: table.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateTableRequest {
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AddStaffRequest {
    /// Subject of an account that has signed in at least once
    pub subject: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StaffMemberResponse {
    pub subject: String,
    pub role: StaffRole,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QrLinkResponse {
    pub table_id: Uuid,
    pub label: String,
    /// Customer page URL to encode in the table's QR code
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReportResponse {
    pub total: u64,
    pub by_type: Vec<TypeCount>,
    pub by_hour: Vec<HourlyCount>,
}
