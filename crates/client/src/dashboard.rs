//! Staff dashboard: a single task owns the board and reacts to events.
//!
//! Input from the keyboard, the change stream, the clock and finished
//! network calls all arrive as [`DashboardEvent`]s. Handling an event only
//! mutates local state and returns the [`Command`]s to run; commands are
//! executed on their own tasks and report back with another event.

use crate::{
    api::{ServiceClient, StreamMessage},
    error::ClientError,
};
use chrono::{DateTime, Utc};
use models::{
    board::{MergeStep, RequestBoard},
    change::{ChangeKind, RequestChange},
    heatmap::HeatmapCell,
    request::RequestView,
    request_type::Priority,
    status::{RequestStatus, StatusFilter},
    table::TableSummary,
    time::time_ago,
};
use std::fmt::Write;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Something a staff member asked for. Request numbers refer to the list
/// as last rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffAction {
    Start(usize),
    Complete(usize),
    CompleteTable(String),
    ClearCompleted,
    Filter(StatusFilter),
    Reload,
    Quit,
}

impl StaffAction {
    /// Parses one line of keyboard input
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default();
        let argument = words.next();

        let number = |argument: Option<&str>| {
            argument
                .and_then(|a| a.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("Expected a request number after \"{verb}\""))
        };

        match verb {
            "s" | "start" => number(argument).map(Self::Start),
            "c" | "complete" => number(argument).map(Self::Complete),
            "t" | "table" => argument
                .map(|label| Self::CompleteTable(label.to_string()))
                .ok_or_else(|| "Expected a table label".to_string()),
            "x" | "clear" => Ok(Self::ClearCompleted),
            "f" | "filter" => argument
                .unwrap_or("all")
                .parse::<StatusFilter>()
                .map(Self::Filter)
                .map_err(|_| "Filter must be all, pending, in_progress or completed".to_string()),
            "r" | "reload" => Ok(Self::Reload),
            "q" | "quit" => Ok(Self::Quit),
            "" => Err("Type a command, e.g. \"s 1\"".to_string()),
            other => Err(format!("Unknown command \"{other}\"")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    Tick(DateTime<Utc>),
    Stream(StreamMessage),
    StreamClosed(String),
    Baseline {
        tables: Vec<TableSummary>,
        requests: Vec<RequestView>,
    },
    Fetched(RequestView),
    /// A single request could not be fetched; `gone` when it no longer
    /// exists
    FetchFailed { id: Uuid, gone: bool },
    Action(StaffAction),
    Notice(String),
    CommandFailed(String),
    ReloadFailed(String),
}

/// Network work the dashboard wants done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Reload,
    Fetch(Uuid),
    UpdateStatus { id: Uuid, status: RequestStatus },
    CompleteTable(Uuid),
    ClearCompleted,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    board: RequestBoard,
    filter: StatusFilter,
    now: DateTime<Utc>,
    notice: Option<String>,
    loaded: bool,
    reloads_in_flight: usize,
    /// Changes seen while waiting for a baseline, replayed once it lands
    deferred: Vec<RequestChange>,
    quit: bool,
}

impl Dashboard {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            board: RequestBoard::default(),
            filter: StatusFilter::All,
            now,
            notice: None,
            loaded: false,
            reloads_in_flight: 0,
            deferred: Vec::new(),
            quit: false,
        }
    }

    pub fn board(&self) -> &RequestBoard {
        &self.board
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Requests currently listed, in display order
    pub fn visible(&self) -> Vec<&RequestView> {
        self.board.filtered(self.filter)
    }

    pub fn heatmap(&self) -> Vec<HeatmapCell> {
        self.board.heatmap()
    }

    /// Asks for a fresh baseline
    pub fn reload(&mut self) -> Vec<Command> {
        self.reloads_in_flight += 1;
        vec![Command::Reload]
    }

    /// Whether the board may still be replaced by a baseline that predates
    /// the changes arriving now
    fn awaiting_baseline(&self) -> bool {
        !self.loaded || self.reloads_in_flight > 0
    }

    /// Merges one change. Inserts and updates for tables the board does not
    /// know mean the table set is stale, since the feed only carries this
    /// restaurant's changes.
    fn merge(&mut self, change: RequestChange, may_reload: bool) -> Vec<Command> {
        match self.board.apply(&change) {
            MergeStep::Fetch(id) => vec![Command::Fetch(id)],
            MergeStep::Removed(_) => Vec::new(),
            MergeStep::Ignored if may_reload && change.kind != ChangeKind::Delete => {
                self.deferred.push(change);
                self.reload()
            }
            MergeStep::Ignored => Vec::new(),
        }
    }

    fn apply_baseline(
        &mut self,
        tables: Vec<TableSummary>,
        requests: Vec<RequestView>,
    ) -> Vec<Command> {
        self.board = RequestBoard::new(tables, requests);
        self.loaded = true;
        self.reloads_in_flight = self.reloads_in_flight.saturating_sub(1);

        // A change replayed against a fresh table set never asks for another
        // reload, so a table that is really gone cannot cause a loop
        let mut commands = Vec::new();
        for change in std::mem::take(&mut self.deferred) {
            for command in self.merge(change, false) {
                if !commands.contains(&command) {
                    commands.push(command);
                }
            }
        }
        commands
    }

    pub fn handle(&mut self, event: DashboardEvent) -> Vec<Command> {
        match event {
            DashboardEvent::Tick(now) => {
                self.now = now;
                Vec::new()
            }
            DashboardEvent::Stream(StreamMessage::Change(change)) => {
                if self.awaiting_baseline() {
                    self.deferred.push(change);
                    return Vec::new();
                }
                self.merge(change, true)
            }
            DashboardEvent::Stream(StreamMessage::Resync) => self.reload(),
            DashboardEvent::StreamClosed(reason) => {
                self.notice = Some(format!("Live updates interrupted: {reason}"));
                Vec::new()
            }
            DashboardEvent::Baseline { tables, requests } => self.apply_baseline(tables, requests),
            DashboardEvent::Fetched(request) => {
                if self.awaiting_baseline() {
                    // The pending baseline may be older than this record
                    self.deferred
                        .push(RequestChange::update(request.id, request.table_id));
                }
                self.board.upsert(request);
                Vec::new()
            }
            DashboardEvent::FetchFailed { id, gone } => {
                if gone {
                    if self.awaiting_baseline() {
                        if let Some(request) = self.board.get(id) {
                            self.deferred
                                .push(RequestChange::delete(id, request.table_id));
                        }
                    }
                    self.board.remove(id);
                }
                Vec::new()
            }
            DashboardEvent::Action(action) => self.act(action),
            DashboardEvent::Notice(message) => {
                self.notice = Some(message);
                Vec::new()
            }
            DashboardEvent::CommandFailed(message) => {
                // Optimistic changes may be wrong now
                self.notice = Some(message);
                self.reload()
            }
            DashboardEvent::ReloadFailed(message) => {
                // Not retried here; the next stream reconnect resyncs
                self.reloads_in_flight = self.reloads_in_flight.saturating_sub(1);
                self.notice = Some(message);
                Vec::new()
            }
        }
    }

    fn act(&mut self, action: StaffAction) -> Vec<Command> {
        self.notice = None;

        match action {
            StaffAction::Start(number) => self.advance(number, RequestStatus::InProgress),
            StaffAction::Complete(number) => self.advance(number, RequestStatus::Completed),
            StaffAction::CompleteTable(label) => {
                let table_id = self
                    .board
                    .tables()
                    .iter()
                    .find(|t| t.label == label)
                    .map(|t| t.id);

                match table_id {
                    Some(table_id) => {
                        self.board.complete_table(table_id);
                        vec![Command::CompleteTable(table_id)]
                    }
                    None => {
                        self.notice = Some(format!("No table labelled \"{label}\""));
                        Vec::new()
                    }
                }
            }
            StaffAction::ClearCompleted => {
                self.board.drop_completed();
                vec![Command::ClearCompleted]
            }
            StaffAction::Filter(filter) => {
                self.filter = filter;
                Vec::new()
            }
            StaffAction::Reload => self.reload(),
            StaffAction::Quit => {
                self.quit = true;
                Vec::new()
            }
        }
    }

    fn advance(&mut self, number: usize, status: RequestStatus) -> Vec<Command> {
        let id = number
            .checked_sub(1)
            .and_then(|index| self.visible().get(index).map(|r| r.id));
        let Some(id) = id else {
            self.notice = Some(format!("No request #{number}"));
            return Vec::new();
        };

        if self.board.set_status(id, status) {
            vec![Command::UpdateStatus { id, status }]
        } else {
            self.notice = Some(format!(
                "Request #{number} cannot move back to {}",
                status.label()
            ));
            Vec::new()
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        if !self.loaded {
            out.push_str("Loading...\n");
            return out;
        }

        out.push_str("Floor\n ");
        for cell in self.heatmap() {
            let marker = match cell.priority {
                Some(Priority::High) => "!!!",
                Some(Priority::Medium) => "!!",
                Some(Priority::Low) => "!",
                None => "-",
            };
            let _ = write!(out, " [{} {marker}]", cell.label);
        }
        out.push('\n');

        let visible = self.visible();
        let _ = writeln!(
            out,
            "\nRequests ({}), {} completed",
            self.filter,
            self.board.completed_count()
        );
        if visible.is_empty() {
            out.push_str("  No requests\n");
        }
        for (index, request) in visible.iter().enumerate() {
            let photo = if request.photo_url.is_some() {
                " [photo]"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "  {:>2}. Table {:<4} {} {:<20} {:<12} {}{photo}",
                index + 1,
                request.table_label,
                request.request_type.icon(),
                request.request_type.label(),
                request.status.label(),
                time_ago(request.created_at, self.now)
            );
        }

        if let Some(notice) = &self.notice {
            let _ = writeln!(out, "\n{notice}");
        }
        out
    }
}

/// Runs one command against the service and reports the outcome as an
/// event for the dashboard task
pub async fn execute(client: &ServiceClient, command: Command) -> DashboardEvent {
    match command {
        Command::Reload => {
            let result = futures::try_join!(client.tables(), client.requests(StatusFilter::All));
            match result {
                Ok((tables, list)) => DashboardEvent::Baseline {
                    tables,
                    requests: list.requests,
                },
                Err(e) => DashboardEvent::ReloadFailed(format!("Failed to load requests: {e}")),
            }
        }
        Command::Fetch(id) => match client.request(id).await {
            Ok(request) => DashboardEvent::Fetched(request),
            Err(e) => {
                let gone = e.status() == Some(404);
                if !gone {
                    log::warn!("Failed to fetch request {id}: {e}");
                }
                DashboardEvent::FetchFailed { id, gone }
            }
        },
        Command::UpdateStatus { id, status } => match client.update_status(id, status).await {
            Ok(request) => DashboardEvent::Fetched(request),
            Err(e) => DashboardEvent::CommandFailed(failure("update request", &e)),
        },
        Command::CompleteTable(table_id) => match client.complete_table(table_id).await {
            Ok(count) => DashboardEvent::Notice(format!("Completed {count} request(s)")),
            Err(e) => DashboardEvent::CommandFailed(failure("complete table", &e)),
        },
        Command::ClearCompleted => match client.clear_completed().await {
            Ok(count) => DashboardEvent::Notice(format!("Cleared {count} completed request(s)")),
            Err(e) => DashboardEvent::CommandFailed(failure("clear completed requests", &e)),
        },
    }
}

fn failure(what: &str, error: &ClientError) -> String {
    format!("Failed to {what}: {error}")
}

/// Spawns every command on its own task; results come back through `events`
pub fn dispatch(
    client: &ServiceClient,
    commands: Vec<Command>,
    events: &UnboundedSender<DashboardEvent>,
) {
    for command in commands {
        let client = client.clone();
        let events = events.clone();
        tokio::spawn(async move {
            let event = execute(&client, command).await;
            // The receiver is gone only when the dashboard is shutting down
            let _ = events.send(event);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use models::request_type::RequestType;

    struct Floor {
        tables: Vec<TableSummary>,
        now: DateTime<Utc>,
    }

    impl Floor {
        fn new(labels: &[&str]) -> Self {
            Self {
                tables: labels
                    .iter()
                    .map(|label| TableSummary::new(Uuid::new_v4(), *label))
                    .collect(),
                now: Utc::now(),
            }
        }

        fn request(&self, table: usize, request_type: RequestType, age_minutes: i64) -> RequestView {
            let table = &self.tables[table];
            RequestView {
                id: Uuid::new_v4(),
                request_type,
                status: RequestStatus::Pending,
                photo_url: None,
                created_at: self.now - Duration::minutes(age_minutes),
                table_id: table.id,
                table_label: table.label.clone(),
                restaurant_id: Uuid::nil(),
                restaurant_name: "Chez Rust".to_string(),
            }
        }

        fn dashboard(&self, requests: Vec<RequestView>) -> Dashboard {
            let mut dashboard = Dashboard::new(self.now);
            dashboard.handle(DashboardEvent::Baseline {
                tables: self.tables.clone(),
                requests,
            });
            dashboard
        }
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(StaffAction::parse("s 2"), Ok(StaffAction::Start(2)));
        assert_eq!(StaffAction::parse("complete 1"), Ok(StaffAction::Complete(1)));
        assert_eq!(
            StaffAction::parse("t A4"),
            Ok(StaffAction::CompleteTable("A4".to_string()))
        );
        assert_eq!(
            StaffAction::parse("f in_progress"),
            Ok(StaffAction::Filter(StatusFilter::InProgress))
        );
        assert_eq!(StaffAction::parse("f"), Ok(StaffAction::Filter(StatusFilter::All)));
        assert_eq!(StaffAction::parse(" x "), Ok(StaffAction::ClearCompleted));
        assert!(StaffAction::parse("s 0").is_err());
        assert!(StaffAction::parse("s").is_err());
        assert!(StaffAction::parse("f done").is_err());
        assert!(StaffAction::parse("dance").is_err());
    }

    #[test]
    fn test_remote_completion_recolours_heatmap() {
        let floor = Floor::new(&["1", "2"]);
        let toilet = floor.request(0, RequestType::ToiletClean, 2);
        let mut dashboard = floor.dashboard(vec![toilet.clone()]);

        assert_eq!(dashboard.heatmap()[0].priority, Some(Priority::High));
        assert_eq!(dashboard.board().completed_count(), 0);

        // Another staff member completes it
        let commands = dashboard.handle(DashboardEvent::Stream(StreamMessage::Change(
            RequestChange::update(toilet.id, toilet.table_id),
        )));
        assert_eq!(commands, vec![Command::Fetch(toilet.id)]);

        let completed = RequestView {
            status: RequestStatus::Completed,
            ..toilet
        };
        assert!(dashboard.handle(DashboardEvent::Fetched(completed)).is_empty());

        let heatmap = dashboard.heatmap();
        assert!(heatmap[0].is_empty());
        assert_eq!(dashboard.board().completed_count(), 1);
        assert!(dashboard.render().contains("1 completed"));
    }

    #[test]
    fn test_request_for_new_table_reloads_then_fetches() {
        let floor = Floor::new(&["1"]);
        let mut dashboard = floor.dashboard(Vec::new());

        // A manager added table 2 after the baseline was taken
        let added = TableSummary::new(Uuid::new_v4(), "2");
        let id = Uuid::new_v4();
        let commands = dashboard.handle(DashboardEvent::Stream(StreamMessage::Change(
            RequestChange::insert(id, added.id),
        )));
        assert_eq!(commands, vec![Command::Reload]);

        let mut tables = floor.tables.clone();
        tables.push(added);
        let commands = dashboard.handle(DashboardEvent::Baseline {
            tables,
            requests: Vec::new(),
        });
        assert_eq!(commands, vec![Command::Fetch(id)]);
    }

    #[test]
    fn test_unknown_table_after_reload_does_not_loop() {
        let floor = Floor::new(&["1"]);
        let mut dashboard = floor.dashboard(Vec::new());

        let gone = Uuid::new_v4();
        let commands = dashboard.handle(DashboardEvent::Stream(StreamMessage::Change(
            RequestChange::update(Uuid::new_v4(), gone),
        )));
        assert_eq!(commands, vec![Command::Reload]);

        let commands = dashboard.handle(DashboardEvent::Baseline {
            tables: floor.tables.clone(),
            requests: Vec::new(),
        });
        assert!(commands.is_empty());

        // Deletes for unknown tables have nothing to remove
        let commands = dashboard.handle(DashboardEvent::Stream(StreamMessage::Change(
            RequestChange::delete(Uuid::new_v4(), gone),
        )));
        assert!(commands.is_empty());
    }

    #[test]
    fn test_change_before_first_baseline_is_replayed() {
        let floor = Floor::new(&["1"]);
        let request = floor.request(0, RequestType::ReadyToOrder, 0);
        let mut dashboard = Dashboard::new(floor.now);
        assert_eq!(dashboard.reload(), vec![Command::Reload]);

        let change = RequestChange::insert(request.id, request.table_id);
        assert!(
            dashboard
                .handle(DashboardEvent::Stream(StreamMessage::Change(change)))
                .is_empty()
        );

        // The baseline was read before the insert committed
        let commands = dashboard.handle(DashboardEvent::Baseline {
            tables: floor.tables.clone(),
            requests: Vec::new(),
        });
        assert_eq!(commands, vec![Command::Fetch(request.id)]);

        dashboard.handle(DashboardEvent::Fetched(request.clone()));
        assert_eq!(dashboard.board().get(request.id), Some(&request));
    }

    #[test]
    fn test_fetch_during_reload_survives_stale_baseline() {
        let floor = Floor::new(&["1"]);
        let pending = floor.request(0, RequestType::TableClean, 2);
        let mut dashboard = floor.dashboard(vec![pending.clone()]);

        dashboard.handle(DashboardEvent::Action(StaffAction::Reload));
        let completed = RequestView {
            status: RequestStatus::Completed,
            ..pending.clone()
        };
        dashboard.handle(DashboardEvent::Fetched(completed.clone()));

        let commands = dashboard.handle(DashboardEvent::Baseline {
            tables: floor.tables.clone(),
            requests: vec![pending.clone()],
        });
        assert_eq!(commands, vec![Command::Fetch(pending.id)]);

        dashboard.handle(DashboardEvent::Fetched(completed));
        assert_eq!(dashboard.board().completed_count(), 1);

        // Settled: later changes merge directly
        assert_eq!(
            dashboard.handle(DashboardEvent::Stream(StreamMessage::Change(
                RequestChange::update(pending.id, pending.table_id)
            ))),
            vec![Command::Fetch(pending.id)]
        );
    }

    #[test]
    fn test_failed_reload_is_not_retried_in_a_loop() {
        let floor = Floor::new(&["1"]);
        let request = floor.request(0, RequestType::TableClean, 1);
        let mut dashboard = floor.dashboard(vec![request.clone()]);

        assert_eq!(
            dashboard.handle(DashboardEvent::Stream(StreamMessage::Resync)),
            vec![Command::Reload]
        );
        let commands =
            dashboard.handle(DashboardEvent::ReloadFailed("Failed to load requests".into()));
        assert!(commands.is_empty());
        assert_eq!(dashboard.notice(), Some("Failed to load requests"));

        assert_eq!(
            dashboard.handle(DashboardEvent::Stream(StreamMessage::Change(
                RequestChange::update(request.id, request.table_id)
            ))),
            vec![Command::Fetch(request.id)]
        );
    }

    #[test]
    fn test_delete_and_vanished_requests_leave_the_board() {
        let floor = Floor::new(&["1"]);
        let first = floor.request(0, RequestType::TableClean, 3);
        let second = floor.request(0, RequestType::RequestSauces, 1);
        let mut dashboard = floor.dashboard(vec![first.clone(), second.clone()]);

        dashboard.handle(DashboardEvent::Stream(StreamMessage::Change(
            RequestChange::delete(first.id, first.table_id),
        )));
        dashboard.handle(DashboardEvent::FetchFailed {
            id: second.id,
            gone: true,
        });
        assert!(dashboard.board().requests().is_empty());
    }

    #[test]
    fn test_actions_update_optimistically() {
        let floor = Floor::new(&["1", "2"]);
        let older = floor.request(0, RequestType::ReadyToOrder, 10);
        let newer = floor.request(1, RequestType::ReplaceCutlery, 1);
        let mut dashboard = floor.dashboard(vec![older.clone(), newer.clone()]);

        // Newest first, so #2 is the older request
        let commands = dashboard.handle(DashboardEvent::Action(StaffAction::Start(2)));
        assert_eq!(
            commands,
            vec![Command::UpdateStatus {
                id: older.id,
                status: RequestStatus::InProgress
            }]
        );
        assert_eq!(
            dashboard.board().get(older.id).map(|r| r.status),
            Some(RequestStatus::InProgress)
        );

        let commands = dashboard.handle(DashboardEvent::Action(StaffAction::CompleteTable(
            "2".to_string(),
        )));
        assert_eq!(commands, vec![Command::CompleteTable(newer.table_id)]);
        assert_eq!(dashboard.board().completed_count(), 1);

        let commands = dashboard.handle(DashboardEvent::Action(StaffAction::ClearCompleted));
        assert_eq!(commands, vec![Command::ClearCompleted]);
        assert_eq!(dashboard.board().requests().len(), 1);

        assert!(dashboard
            .handle(DashboardEvent::Action(StaffAction::Complete(9)))
            .is_empty());
        assert_eq!(dashboard.notice(), Some("No request #9"));
    }

    #[test]
    fn test_backward_move_is_refused_locally() {
        let floor = Floor::new(&["1"]);
        let mut done = floor.request(0, RequestType::TableClean, 1);
        done.status = RequestStatus::Completed;
        let mut dashboard = floor.dashboard(vec![done]);

        assert!(dashboard
            .handle(DashboardEvent::Action(StaffAction::Start(1)))
            .is_empty());
        assert!(dashboard.notice().is_some());
    }

    #[test]
    fn test_failures_and_resync_trigger_reload() {
        let floor = Floor::new(&["1"]);
        let mut dashboard = floor.dashboard(Vec::new());

        assert_eq!(
            dashboard.handle(DashboardEvent::Stream(StreamMessage::Resync)),
            vec![Command::Reload]
        );
        assert_eq!(
            dashboard.handle(DashboardEvent::CommandFailed("Request is already completed".into())),
            vec![Command::Reload]
        );
        assert_eq!(dashboard.notice(), Some("Request is already completed"));
    }

    #[test]
    fn test_render_lists_requests_with_age() {
        let floor = Floor::new(&["1", "2"]);
        let mut request = floor.request(1, RequestType::ToiletClean, 5);
        request.photo_url = Some("http://localhost/photos/a.jpg".to_string());
        let mut dashboard = floor.dashboard(vec![request]);

        let text = dashboard.render();
        assert!(text.contains("[1 -] [2 !!!]"));
        assert!(text.contains("Toilet Issue"));
        assert!(text.contains("5m ago [photo]"));

        dashboard.handle(DashboardEvent::Action(StaffAction::Filter(
            StatusFilter::Completed,
        )));
        assert!(dashboard.render().contains("No requests"));

        assert!(Dashboard::new(floor.now).render().starts_with("Loading"));
    }
}
