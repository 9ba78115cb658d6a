use chrono::{DateTime, Utc};
use models::{
    request::RequestView,
    status::{RequestStatus, StatusFilter},
    time::time_ago,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RequestResponse {
    #[serde(flatten)]
    pub request: RequestView,
    /// Human readable request type, e.g. `Clean Table`
    pub label: String,
    pub icon: String,
    /// e.g. `5m ago`
    pub age: String,
}

impl RequestResponse {
    pub fn new(request: RequestView, now: DateTime<Utc>) -> Self {
        Self {
            label: request.request_type.label().to_string(),
            icon: request.request_type.icon().to_string(),
            age: time_ago(request.created_at, now),
            request,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RequestListResponse {
    pub requests: Vec<RequestResponse>,
    /// Completed requests across the whole restaurant, regardless of filter
    pub completed_count: usize,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RequestQueryParams {
    #[serde(default)]
    #[param(inline)]
    pub status: StatusFilter,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: RequestStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BulkResult {
    /// Number of requests affected
    pub count: usize,
}
