//! Local view of a restaurant's requests, kept in sync with the change feed.
//!
//! The board is owned by a single task. Change notifications are applied
//! with [`RequestBoard::apply`]; inserts and updates only carry an identity,
//! so the caller fetches the fresh record and hands it back through
//! [`RequestBoard::upsert`].

use crate::{
    change::{ChangeKind, RequestChange},
    heatmap::{HeatmapCell, floor_heatmap},
    request::RequestView,
    status::{RequestStatus, StatusFilter},
    table::{TableSummary, sort_tables},
};
use std::collections::HashSet;
use uuid::Uuid;

/// What the owner of the board has to do after a change was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStep {
    /// The change concerns a table outside this restaurant
    Ignored,
    /// Fetch this request and pass it to [`RequestBoard::upsert`]
    Fetch(Uuid),
    /// The request was removed; `false` when it was not on the board
    Removed(bool),
}

#[derive(Debug, Clone, Default)]
pub struct RequestBoard {
    tables: Vec<TableSummary>,
    table_ids: HashSet<Uuid>,
    /// Newest first
    requests: Vec<RequestView>,
}

impl RequestBoard {
    pub fn new(tables: Vec<TableSummary>, baseline: Vec<RequestView>) -> Self {
        let mut board = Self::default();
        board.set_tables(tables);
        for request in baseline {
            board.upsert(request);
        }
        board
    }

    pub fn tables(&self) -> &[TableSummary] {
        &self.tables
    }

    /// Replaces the table set, dropping requests of tables that are gone
    pub fn set_tables(&mut self, mut tables: Vec<TableSummary>) {
        sort_tables(&mut tables);
        self.table_ids = tables.iter().map(|t| t.id).collect();
        self.tables = tables;

        let table_ids = &self.table_ids;
        self.requests.retain(|r| table_ids.contains(&r.table_id));
    }

    pub fn owns_table(&self, table_id: Uuid) -> bool {
        self.table_ids.contains(&table_id)
    }

    /// Applies one change notification
    pub fn apply(&mut self, change: &RequestChange) -> MergeStep {
        if !self.owns_table(change.table_id) {
            return MergeStep::Ignored;
        }

        match change.kind {
            ChangeKind::Insert | ChangeKind::Update => MergeStep::Fetch(change.id),
            ChangeKind::Delete => MergeStep::Removed(self.remove(change.id)),
        }
    }

    /// Inserts or replaces a request by identity. Returns `false` when the
    /// request belongs to a foreign table and was left out.
    pub fn upsert(&mut self, request: RequestView) -> bool {
        if !self.owns_table(request.table_id) {
            return false;
        }

        if let Some(existing) = self.requests.iter_mut().find(|r| r.id == request.id) {
            *existing = request;
        } else {
            let position = self
                .requests
                .iter()
                .position(|r| r.created_at < request.created_at)
                .unwrap_or(self.requests.len());
            self.requests.insert(position, request);
        }

        true
    }

    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.requests.len();
        self.requests.retain(|r| r.id != id);
        before != self.requests.len()
    }

    pub fn get(&self, id: Uuid) -> Option<&RequestView> {
        self.requests.iter().find(|r| r.id == id)
    }

    /// Optimistically moves a request to `status`. Backward moves are
    /// refused.
    pub fn set_status(&mut self, id: Uuid, status: RequestStatus) -> bool {
        match self.requests.iter_mut().find(|r| r.id == id) {
            Some(request) if request.status.can_advance_to(status) => {
                request.status = status;
                true
            }
            _ => false,
        }
    }

    /// Optimistically completes every active request of a table. Returns
    /// how many requests changed.
    pub fn complete_table(&mut self, table_id: Uuid) -> usize {
        let mut changed = 0;
        for request in self
            .requests
            .iter_mut()
            .filter(|r| r.table_id == table_id && r.is_active())
        {
            request.status = RequestStatus::Completed;
            changed += 1;
        }
        changed
    }

    /// Optimistically drops all completed requests. Returns how many went.
    pub fn drop_completed(&mut self) -> usize {
        let before = self.requests.len();
        self.requests.retain(|r| r.is_active());
        before - self.requests.len()
    }

    pub fn requests(&self) -> &[RequestView] {
        &self.requests
    }

    pub fn filtered(&self, filter: StatusFilter) -> Vec<&RequestView> {
        self.requests
            .iter()
            .filter(|r| filter.matches(r.status))
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.requests.iter().filter(|r| !r.is_active()).count()
    }

    pub fn active_for_table(&self, table_id: Uuid) -> Vec<&RequestView> {
        self.requests
            .iter()
            .filter(|r| r.table_id == table_id && r.is_active())
            .collect()
    }

    pub fn heatmap(&self) -> Vec<HeatmapCell> {
        floor_heatmap(&self.tables, &self.requests)
    }
}
