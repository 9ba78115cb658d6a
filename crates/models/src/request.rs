use crate::{request_type::RequestType, status::RequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request together with the table and restaurant it belongs to, as shown
/// on the staff dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RequestView {
    pub id: Uuid,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub table_id: Uuid,
    pub table_label: String,
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
}

impl RequestView {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}
