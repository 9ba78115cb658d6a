use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Lifecycle of a request. Variants are declared in the only order a
/// request may move through them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[cfg_attr(
    feature = "database",
    derive(sea_orm::DeriveActiveEnum),
    sea_orm(rs_type = "String", db_type = "Text")
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestStatus {
    #[cfg_attr(feature = "database", sea_orm(string_value = "pending"))]
    Pending,
    #[cfg_attr(feature = "database", sea_orm(string_value = "in_progress"))]
    InProgress,
    #[cfg_attr(feature = "database", sea_orm(string_value = "completed"))]
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    /// Pending and in-progress requests still need attention
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Completed)
    }

    /// Whether a request in this status may be moved to `next`.
    ///
    /// Staying in the same status is allowed so that two staff members
    /// completing the same request both succeed.
    pub fn can_advance_to(&self, next: RequestStatus) -> bool {
        next >= *self
    }

    /// Every status from which a request may be moved to `next`
    pub fn predecessors_of(next: RequestStatus) -> Vec<RequestStatus> {
        RequestStatus::iter()
            .filter(|status| status.can_advance_to(next))
            .collect()
    }
}

/// Dashboard filter over request statuses
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    InProgress,
    Completed,
}

impl StatusFilter {
    pub fn matches(&self, status: RequestStatus) -> bool {
        match self {
            Self::All => true,
            Self::Pending => status == RequestStatus::Pending,
            Self::InProgress => status == RequestStatus::InProgress,
            Self::Completed => status == RequestStatus::Completed,
        }
    }

    /// The single status this filter selects, if any
    pub fn status(&self) -> Option<RequestStatus> {
        match self {
            Self::All => None,
            Self::Pending => Some(RequestStatus::Pending),
            Self::InProgress => Some(RequestStatus::InProgress),
            Self::Completed => Some(RequestStatus::Completed),
        }
    }
}
