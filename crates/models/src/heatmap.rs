use crate::{
    request::RequestView,
    request_type::{Priority, RequestType},
    table::{TableSummary, sort_tables},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// One table on the floor heatmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HeatmapCell {
    pub table_id: Uuid,
    pub label: String,
    /// Priority of the most urgent active request, `None` renders neutral
    pub priority: Option<Priority>,
    /// Type of the request that set the priority
    pub request_type: Option<RequestType>,
    /// Number of pending or in-progress requests at the table
    pub active_count: usize,
}

impl HeatmapCell {
    pub fn is_empty(&self) -> bool {
        self.priority.is_none()
    }
}

/// Picks, per table, the highest-priority active request. Ties keep the
/// first request seen.
pub fn highest_priority<'a, I>(requests: I) -> HashMap<Uuid, &'a RequestView>
where
    I: IntoIterator<Item = &'a RequestView>,
{
    let mut top: HashMap<Uuid, &RequestView> = HashMap::new();

    for request in requests.into_iter().filter(|r| r.is_active()) {
        let priority = request.request_type.priority();
        top.entry(request.table_id)
            .and_modify(|current| {
                if priority > current.request_type.priority() {
                    *current = request;
                }
            })
            .or_insert(request);
    }

    top
}

/// Builds the floor heatmap: one cell per table in floor order, coloured by
/// its most urgent active request
pub fn floor_heatmap(tables: &[TableSummary], requests: &[RequestView]) -> Vec<HeatmapCell> {
    let top = highest_priority(requests);

    let mut active_counts: HashMap<Uuid, usize> = HashMap::new();
    for request in requests.iter().filter(|r| r.is_active()) {
        *active_counts.entry(request.table_id).or_default() += 1;
    }

    let mut tables = tables.to_vec();
    sort_tables(&mut tables);

    tables
        .into_iter()
        .map(|table| {
            let request = top.get(&table.id);
            HeatmapCell {
                priority: request.map(|r| r.request_type.priority()),
                request_type: request.map(|r| r.request_type),
                active_count: active_counts.get(&table.id).copied().unwrap_or_default(),
                table_id: table.id,
                label: table.label,
            }
        })
        .collect()
}
