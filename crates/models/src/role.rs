use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// What a staff profile is allowed to do within its restaurant
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(
    feature = "database",
    derive(sea_orm::DeriveActiveEnum),
    sea_orm(rs_type = "String", db_type = "Text")
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StaffRole {
    /// Administers tables, staff and QR codes
    #[cfg_attr(feature = "database", sea_orm(string_value = "manager"))]
    Manager,
    /// Works the floor dashboard
    #[default]
    #[cfg_attr(feature = "database", sea_orm(string_value = "staff"))]
    Staff,
}

impl StaffRole {
    pub fn is_manager(&self) -> bool {
        matches!(self, Self::Manager)
    }
}
