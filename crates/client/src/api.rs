//! HTTP client for the table-service API

use crate::{
    config::ClientConfig,
    error::{ClientError, ClientResult},
    sse::{SseDecoder, SseEvent},
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt, stream};
use models::{
    change::RequestChange,
    request::RequestView,
    request_type::RequestType,
    status::{RequestStatus, StatusFilter},
    table::TableSummary,
};
use reqwest::{
    Client, RequestBuilder, Response, StatusCode,
    multipart::{Form, Part},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

/// A customer's view of one table
#[derive(Debug, Clone, Deserialize)]
pub struct TablePage {
    pub restaurant_id: Uuid,
    pub restaurant_name: String,
    pub table_id: Uuid,
    pub table_label: String,
    pub options: Vec<RequestOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestOption {
    pub request_type: RequestType,
    pub blocked_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestList {
    pub requests: Vec<RequestView>,
    pub completed_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct BulkResult {
    count: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    error: String,
    /// Present on 429 answers
    #[serde(default)]
    blocked_until: Option<DateTime<Utc>>,
}

/// A photo attached to a request
#[derive(Debug, Clone)]
pub struct Photo {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// What the change stream delivers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    Change(RequestChange),
    /// Notifications were dropped; refetch everything
    Resync,
}

#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ServiceClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turns error statuses into [`ClientError::Api`] (or
    /// [`ClientError::Throttled`]) with the server's message
    async fn check(response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(api_error(status, text))
    }

    async fn json<T: DeserializeOwned>(request: RequestBuilder) -> ClientResult<T> {
        let response = Self::check(request.send().await?).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    pub async fn table_page(&self, slug: &str, label: &str) -> ClientResult<TablePage> {
        Self::json(self.client.get(self.url(&format!("tables/{slug}/{label}")))).await
    }

    pub async fn submit_request(
        &self,
        slug: &str,
        label: &str,
        request_type: RequestType,
        photo: Option<Photo>,
    ) -> ClientResult<RequestView> {
        let mut form = Form::new().text("type", request_type.as_str().to_string());
        if let Some(photo) = photo {
            form = form.part("photo", Part::bytes(photo.bytes).file_name(photo.file_name));
        }

        let request = self
            .client
            .post(self.url(&format!("tables/{slug}/{label}/requests")))
            .multipart(form);
        Self::json(request).await
    }

    pub async fn tables(&self) -> ClientResult<Vec<TableSummary>> {
        Self::json(self.authorized(self.client.get(self.url("staff/tables")))).await
    }

    pub async fn requests(&self, filter: StatusFilter) -> ClientResult<RequestList> {
        let request = self
            .client
            .get(self.url("staff/requests"))
            .query(&[("status", filter.to_string())]);
        Self::json(self.authorized(request)).await
    }

    pub async fn request(&self, id: Uuid) -> ClientResult<RequestView> {
        Self::json(self.authorized(self.client.get(self.url(&format!("staff/requests/{id}"))))).await
    }

    pub async fn update_status(&self, id: Uuid, status: RequestStatus) -> ClientResult<RequestView> {
        let request = self
            .client
            .patch(self.url(&format!("staff/requests/{id}")))
            .json(&json!({ "status": status }));
        Self::json(self.authorized(request)).await
    }

    pub async fn complete_table(&self, table_id: Uuid) -> ClientResult<usize> {
        let request = self
            .client
            .post(self.url(&format!("staff/tables/{table_id}/complete")));
        let result: BulkResult = Self::json(self.authorized(request)).await?;
        Ok(result.count)
    }

    pub async fn clear_completed(&self) -> ClientResult<usize> {
        let request = self.client.delete(self.url("staff/requests/completed"));
        let result: BulkResult = Self::json(self.authorized(request)).await?;
        Ok(result.count)
    }

    /// Opens the change stream of the caller's restaurant
    pub async fn changes(&self) -> ClientResult<impl Stream<Item = ClientResult<StreamMessage>>> {
        let request = self
            .client
            .get(self.url("staff/stream"))
            .header(reqwest::header::ACCEPT, "text/event-stream");
        let response = Self::check(self.authorized(request).send().await?).await?;

        let messages = response
            .bytes_stream()
            .scan(SseDecoder::new(), |decoder, chunk| {
                let events: Vec<ClientResult<SseEvent>> = match chunk {
                    Ok(bytes) => decoder.push(&bytes).into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(ClientError::from(e))],
                };
                futures::future::ready(Some(stream::iter(events)))
            })
            .flatten()
            .filter_map(|event| futures::future::ready(parse_message(event).transpose()));

        Ok(messages)
    }
}

/// Builds the error for a non-success answer from its body
fn api_error(status: StatusCode, text: String) -> ClientError {
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody {
            error,
            blocked_until: Some(blocked_until),
        }) if status == StatusCode::TOO_MANY_REQUESTS => ClientError::Throttled {
            message: error,
            blocked_until,
        },
        Ok(body) => ClientError::Api {
            status: status.as_u16(),
            message: body.error,
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            message: if text.is_empty() {
                status.to_string()
            } else {
                text
            },
        },
    }
}

fn parse_message(event: ClientResult<SseEvent>) -> ClientResult<Option<StreamMessage>> {
    let event = event?;
    match event.event.as_str() {
        "change" => serde_json::from_str(&event.data)
            .map(|change| Some(StreamMessage::Change(change)))
            .map_err(|e| ClientError::InvalidResponse(e.to_string())),
        "resync" => Ok(Some(StreamMessage::Resync)),
        other => {
            log::debug!("Ignoring {other} event");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, data: &str) -> ClientResult<SseEvent> {
        Ok(SseEvent {
            event: name.to_string(),
            data: data.to_string(),
        })
    }

    #[test]
    fn test_parse_message() {
        let id = Uuid::new_v4();
        let table_id = Uuid::new_v4();
        let data = serde_json::to_string(&RequestChange::update(id, table_id)).unwrap();

        assert_eq!(
            parse_message(event("change", &data)).unwrap(),
            Some(StreamMessage::Change(RequestChange::update(id, table_id)))
        );
        assert_eq!(
            parse_message(event("resync", "12")).unwrap(),
            Some(StreamMessage::Resync)
        );
        assert_eq!(parse_message(event("message", "hello")).unwrap(), None);
        assert!(parse_message(event("change", "not json")).is_err());
    }

    #[test]
    fn test_error_bodies() {
        let until = "2025-03-14T19:15:00Z";
        let err = api_error(
            StatusCode::TOO_MANY_REQUESTS,
            format!(r#"{{"error":"Please wait","blocked_until":"{until}","retry_after_seconds":60}}"#),
        );
        match err {
            ClientError::Throttled {
                message,
                blocked_until,
            } => {
                assert_eq!(message, "Please wait");
                assert_eq!(blocked_until, until.parse::<DateTime<Utc>>().unwrap());
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = api_error(StatusCode::CONFLICT, r#"{"error":"Request is already completed"}"#.into());
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "Request is already completed");

        let err = api_error(StatusCode::BAD_GATEWAY, String::new());
        assert_eq!(err.to_string(), "502 Bad Gateway");
    }

    #[test]
    fn test_url_joins_paths() {
        let client = ServiceClient::new(&ClientConfig::new("http://tables.test/")).unwrap();
        assert_eq!(
            client.url("/staff/requests"),
            "http://tables.test/staff/requests"
        );
        assert_eq!(client.url("tables/a/1"), "http://tables.test/tables/a/1");
    }
}
