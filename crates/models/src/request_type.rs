use chrono::Duration;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumProperty, EnumString, IntoEnumIterator};

/// A service request a customer can make from their table
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
    EnumProperty,
)]
#[cfg_attr(
    feature = "database",
    derive(sea_orm::DeriveActiveEnum),
    sea_orm(rs_type = "String", db_type = "Text")
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RequestType {
    #[strum(props(
        label = "Clean Table",
        description = "Need table cleaned & sanitized",
        icon = "🧽"
    ))]
    #[cfg_attr(feature = "database", sea_orm(string_value = "table_clean"))]
    TableClean,
    #[strum(props(
        label = "Toilet Issue",
        description = "Report restroom problem",
        icon = "🚽"
    ))]
    #[cfg_attr(feature = "database", sea_orm(string_value = "toilet_clean"))]
    ToiletClean,
    #[strum(props(
        label = "Ready to Order",
        description = "Ready to place our order",
        icon = "🍽️"
    ))]
    #[cfg_attr(feature = "database", sea_orm(string_value = "ready_to_order"))]
    ReadyToOrder,
    #[strum(props(
        label = "Order More",
        description = "Want to add more items",
        icon = "➕"
    ))]
    #[cfg_attr(feature = "database", sea_orm(string_value = "additional_order"))]
    AdditionalOrder,
    #[strum(props(
        label = "New Cutlery",
        description = "Need fresh utensils",
        icon = "🍴"
    ))]
    #[cfg_attr(feature = "database", sea_orm(string_value = "replace_cutlery"))]
    ReplaceCutlery,
    #[strum(props(
        label = "Sauces & Condiments",
        description = "Need sauce or seasonings",
        icon = "🥫"
    ))]
    #[cfg_attr(feature = "database", sea_orm(string_value = "request_sauces"))]
    RequestSauces,
}

impl RequestType {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    pub fn label(&self) -> &'static str {
        self.get_str("label").unwrap_or_default()
    }

    pub fn description(&self) -> &'static str {
        self.get_str("description").unwrap_or_default()
    }

    pub fn icon(&self) -> &'static str {
        self.get_str("icon").unwrap_or_default()
    }

    /// Minimum time a table waits before it can send this request again
    pub fn cooldown(&self) -> Duration {
        let minutes = match self {
            Self::ToiletClean => 15,
            Self::ReadyToOrder | Self::TableClean => 10,
            Self::AdditionalOrder | Self::ReplaceCutlery => 5,
            Self::RequestSauces => 3,
        };

        Duration::minutes(minutes)
    }

    /// How urgently staff should react to this request
    pub fn priority(&self) -> Priority {
        match self {
            Self::ToiletClean | Self::ReadyToOrder => Priority::High,
            Self::TableClean | Self::AdditionalOrder => Priority::Medium,
            Self::ReplaceCutlery | Self::RequestSauces => Priority::Low,
        }
    }

    /// Restroom reports must come with a photo of the problem
    pub fn requires_photo(&self) -> bool {
        matches!(self, Self::ToiletClean)
    }

    pub fn all() -> Vec<RequestType> {
        RequestType::iter().collect()
    }
}

/// Urgency of a request, ordered from least to most urgent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }
}
