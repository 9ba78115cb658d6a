use crate::request_type::RequestType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How often a request type was used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TypeCount {
    pub request_type: RequestType,
    pub label: String,
    pub count: u64,
}

/// How many requests came in during one hour of the day (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HourlyCount {
    pub hour: u32,
    /// e.g. `14:00`
    pub label: String,
    pub count: u64,
}

/// Builds the per-type report from `(type, count)` totals, busiest first.
/// Repeated types are summed; zero counts are left out.
pub fn type_report<I>(totals: I) -> Vec<TypeCount>
where
    I: IntoIterator<Item = (RequestType, u64)>,
{
    let mut counts: BTreeMap<RequestType, u64> = BTreeMap::new();
    for (request_type, count) in totals {
        *counts.entry(request_type).or_default() += count;
    }

    let mut result: Vec<TypeCount> = counts
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(request_type, count)| TypeCount {
            request_type,
            label: request_type.label().to_string(),
            count,
        })
        .collect();

    // Stable sort keeps declaration order between equal counts
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

/// Builds the hour-of-day report from `(hour, count)` totals, earliest hour
/// first. Hours outside `0..24` and zero counts are left out.
pub fn hourly_report<I>(totals: I) -> Vec<HourlyCount>
where
    I: IntoIterator<Item = (u32, u64)>,
{
    let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
    for (hour, count) in totals.into_iter().filter(|(hour, _)| *hour < 24) {
        *counts.entry(hour).or_default() += count;
    }

    counts
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(hour, count)| HourlyCount {
            hour,
            label: format!("{hour}:00"),
            count,
        })
        .collect()
}
