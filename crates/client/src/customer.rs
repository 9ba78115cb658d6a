//! Customer side of a table: the six request buttons and their cooldowns

use crate::{
    api::{Photo, ServiceClient, TablePage},
    error::{ClientError, ClientResult},
};
use chrono::{DateTime, Utc};
use models::{
    cooldown::{CooldownTracker, format_remaining},
    request::RequestView,
    request_type::RequestType,
};
use std::fmt::Write;

pub struct CustomerSession {
    slug: String,
    page: TablePage,
    tracker: CooldownTracker,
}

impl CustomerSession {
    pub fn new(slug: impl Into<String>, page: TablePage) -> Self {
        // The page reports expiries; the tracker works from submission times
        let tracker = CooldownTracker::from_latest(page.options.iter().filter_map(|option| {
            option
                .blocked_until
                .map(|until| (option.request_type, until - option.request_type.cooldown()))
        }));

        Self {
            slug: slug.into(),
            page,
            tracker,
        }
    }

    pub async fn load(client: &ServiceClient, slug: &str, label: &str) -> ClientResult<Self> {
        let page = client.table_page(slug, label).await?;
        Ok(Self::new(slug, page))
    }

    pub fn page(&self) -> &TablePage {
        &self.page
    }

    pub fn tracker(&self) -> &CooldownTracker {
        &self.tracker
    }

    /// Called once per second; returns whether a cooldown ended
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        self.tracker.refresh(now)
    }

    /// Whether the tick has to keep running
    pub fn needs_tick(&self) -> bool {
        self.tracker.is_active()
    }

    /// Validates a submission locally, without a network round-trip
    pub fn prepare(
        &self,
        request_type: RequestType,
        photo: Option<&Photo>,
        now: DateTime<Utc>,
    ) -> ClientResult<()> {
        self.tracker.check(request_type, now)?;

        if request_type.requires_photo() && photo.is_none() {
            return Err(ClientError::Validation(format!(
                "Please attach a photo for \"{}\"",
                request_type.label()
            )));
        }
        Ok(())
    }

    pub async fn submit(
        &mut self,
        client: &ServiceClient,
        request_type: RequestType,
        photo: Option<Photo>,
        now: DateTime<Utc>,
    ) -> ClientResult<RequestView> {
        self.prepare(request_type, photo.as_ref(), now)?;

        let photo = photo.filter(|_| request_type.requires_photo());
        let result = client
            .submit_request(&self.slug, &self.page.table_label, request_type, photo)
            .await;
        let created = match result {
            Ok(created) => created,
            Err(ClientError::Throttled {
                message,
                blocked_until,
            }) => {
                // Another device at this table got there first
                self.tracker
                    .record(request_type, blocked_until - request_type.cooldown());
                return Err(ClientError::Throttled {
                    message,
                    blocked_until,
                });
            }
            Err(e) => return Err(e),
        };

        self.tracker.record(request_type, created.created_at);
        log::info!("Sent {request_type} request {}", created.id);
        Ok(created)
    }

    pub fn render(&self, now: DateTime<Utc>) -> String {
        let mut out = format!(
            "{} · Table {}\n",
            self.page.restaurant_name, self.page.table_label
        );

        for (index, (request_type, status)) in self.tracker.snapshot(now).into_iter().enumerate() {
            let state = if status.is_blocked() {
                format!("wait {}", format_remaining(status.remaining))
            } else {
                "ready".to_string()
            };
            let photo = if request_type.requires_photo() {
                " (photo)"
            } else {
                ""
            };

            let _ = writeln!(
                out,
                "  {}. {} {:<20} {}{photo}",
                index + 1,
                request_type.icon(),
                request_type.label(),
                state
            );
        }
        out
    }
}
