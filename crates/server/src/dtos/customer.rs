use chrono::{DateTime, Utc};
use models::{
    cooldown::{CooldownStatus, format_remaining},
    request_type::{Priority, RequestType},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TablePageResponse {
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
    pub table_id: Uuid,
    pub table_label: String,
    pub options: Vec<RequestOption>,
}

/// One button on the customer page
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestOption {
    pub request_type: RequestType,
    pub label: String,
    pub description: String,
    pub icon: String,
    pub priority: Priority,
    pub requires_photo: bool,
    pub cooldown_seconds: i64,
    pub blocked_until: Option<DateTime<Utc>>,
    pub remaining_seconds: i64,
    /// Countdown text while blocked, e.g. `9m 59s`
    pub remaining: Option<String>,
}

impl RequestOption {
    pub fn new(request_type: RequestType, status: CooldownStatus) -> Self {
        Self {
            request_type,
            label: request_type.label().to_string(),
            description: request_type.description().to_string(),
            icon: request_type.icon().to_string(),
            priority: request_type.priority(),
            requires_photo: request_type.requires_photo(),
            cooldown_seconds: request_type.cooldown().num_seconds(),
            blocked_until: status.blocked_until,
            remaining_seconds: status.remaining.num_seconds(),
            remaining: status
                .is_blocked()
                .then(|| format_remaining(status.remaining)),
        }
    }
}

/// Multipart form of a new request, documented for the OpenAPI schema
#[derive(Debug, Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct NewRequestForm {
    /// Request type tag, e.g. `table_clean`
    #[serde(rename = "type")]
    pub request_type: RequestType,
    /// Required for `toilet_clean`
    #[schema(format = Binary)]
    pub photo: Option<String>,
}
