//! Route tests against an in-memory SQLite database.
//!
//! Token validation is left out: protected routes get the caller injected
//! as a [`StaffUser`] extension, or run behind the claims middleware when
//! no caller is given.

use crate::{
    app,
    auth::{self, StaffUser},
    config::Config,
    realtime::FeedItem,
    state::{AppState, SharedState},
};
use axum::{
    Extension, Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    middleware,
};
use migration::{Migrator, MigratorTrait};
use models::change::{ChangeKind, RequestChange};
use sea_orm::{ConnectionTrait, Database};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

const BOUNDARY: &str = "table-bud-test-boundary";

struct TestApp {
    state: SharedState,
}

async fn setup() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        oidc_issuer_url: "http://localhost/issuer".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        public_base_url: "http://tables.test".to_string(),
        photo_dir: std::env::temp_dir().join(format!("table-bud-{}", Uuid::new_v4())),
        max_photo_bytes: 1024,
    };

    TestApp {
        state: AppState::new(db, config),
    }
}

enum Payload {
    Empty,
    Json(Value),
    Multipart(Vec<u8>),
}

impl TestApp {
    fn router(&self, caller: Option<&str>) -> Router {
        let protected = match caller {
            Some(subject) => app::protected_routes().layer(Extension(StaffUser::new(subject))),
            None => app::protected_routes().layer(middleware::from_fn(auth::resolve_staff_user)),
        };

        app::public_routes(&self.state)
            .merge(protected)
            .with_state(self.state.clone())
    }

    async fn send(
        &self,
        caller: Option<&str>,
        method: Method,
        uri: &str,
        payload: Payload,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match payload {
            Payload::Empty => builder.body(Body::empty()),
            Payload::Json(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string())),
            Payload::Multipart(bytes) => builder
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(bytes)),
        }
        .unwrap();

        let response = self.router(caller).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        (status, body)
    }

    async fn get(&self, caller: Option<&str>, uri: &str) -> (StatusCode, Value) {
        self.send(caller, Method::GET, uri, Payload::Empty).await
    }

    async fn onboard(&self, manager: &str, name: &str) -> Uuid {
        let (status, body) = self
            .send(
                Some(manager),
                Method::POST,
                "/auth/onboard",
                Payload::Json(json!({ "restaurant_name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["restaurant"]["id"].as_str().unwrap().parse().unwrap()
    }

    async fn add_table(&self, manager: &str, label: &str) -> Uuid {
        let (status, body) = self
            .send(
                Some(manager),
                Method::POST,
                "/admin/tables",
                Payload::Json(json!({ "label": label })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().parse().unwrap()
    }

    async fn submit(
        &self,
        slug: &str,
        label: &str,
        request_type: &str,
        photo: Option<(&str, &[u8])>,
    ) -> (StatusCode, Value) {
        let mut fields = vec![("type", None, request_type.as_bytes())];
        if let Some((file_name, bytes)) = photo {
            fields.push(("photo", Some(file_name), bytes));
        }

        self.send(
            None,
            Method::POST,
            &format!("/tables/{slug}/{label}/requests"),
            Payload::Multipart(multipart(&fields)),
        )
        .await
    }
}

fn multipart(fields: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file_name) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
            }
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

#[tokio::test]
async fn test_ops_routes() {
    let app = setup().await;

    assert_eq!(
        app.get(None, "/").await,
        (StatusCode::OK, Value::String("OK".to_string()))
    );
    assert_eq!(
        app.get(None, "/health").await,
        (StatusCode::OK, Value::String("OK".to_string()))
    );

    let (status, doc) = app.get(None, "/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/staff/requests/{id}"].is_object());
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = setup().await;

    let (status, body) = app.get(None, "/staff/requests").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing identity");
}

#[tokio::test]
async fn test_onboarding() {
    let app = setup().await;

    let (status, me) = app.get(Some("owner"), "/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "staff");
    assert!(me["restaurant"].is_null());

    let (status, _) = app.get(Some("owner"), "/staff/tables").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    app.onboard("owner", "  Chez Rust ").await;

    let (_, me) = app.get(Some("owner"), "/auth/me").await;
    assert_eq!(me["role"], "manager");
    assert_eq!(me["restaurant"]["slug"], "chez-rust");
    assert_eq!(me["restaurant"]["name"], "Chez Rust");

    let (status, _) = app
        .send(
            Some("owner"),
            Method::POST,
            "/auth/onboard",
            Payload::Json(json!({ "restaurant_name": "Second Place" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            Some("someone-else"),
            Method::POST,
            "/auth/onboard",
            Payload::Json(json!({ "restaurant_name": "chez rust" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .send(
            Some("someone-else"),
            Method::POST,
            "/auth/onboard",
            Payload::Json(json!({ "restaurant_name": "!!!" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_table_administration() {
    let app = setup().await;
    app.onboard("owner", "Chez Rust").await;

    let ten = app.add_table("owner", "10").await;
    app.add_table("owner", " 2 ").await;

    let (status, body) = app
        .send(
            Some("owner"),
            Method::POST,
            "/admin/tables",
            Payload::Json(json!({ "label": "2" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, _) = app
        .send(
            Some("owner"),
            Method::POST,
            "/admin/tables",
            Payload::Json(json!({ "label": "table 4" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, links) = app.get(Some("owner"), "/admin/qr-links").await;
    let urls: Vec<_> = links
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["url"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        urls,
        vec![
            "http://tables.test/tables/chez-rust/2",
            "http://tables.test/tables/chez-rust/10"
        ]
    );

    // A scanned code lands on the customer page
    for url in &urls {
        let path = url.trim_start_matches("http://tables.test");
        let (status, page) = app.get(None, path).await;
        assert_eq!(status, StatusCode::OK, "{path}: {page}");
    }

    let (status, _) = app
        .send(
            Some("owner"),
            Method::DELETE,
            &format!("/admin/tables/{ten}"),
            Payload::Empty,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, tables) = app.get(Some("owner"), "/admin/tables").await;
    assert_eq!(tables.as_array().unwrap().len(), 1);
    assert_eq!(tables[0]["label"], "2");

    let (status, _) = app
        .send(
            Some("owner"),
            Method::DELETE,
            &format!("/admin/tables/{ten}"),
            Payload::Empty,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_staff_membership_and_manager_only_routes() {
    let app = setup().await;
    app.onboard("owner", "Chez Rust").await;
    app.add_table("owner", "1").await;

    // The waiter has to have signed in once
    let (status, _) = app
        .send(
            Some("owner"),
            Method::POST,
            "/admin/staff",
            Payload::Json(json!({ "subject": "waiter" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.get(Some("waiter"), "/auth/me").await;
    let (status, member) = app
        .send(
            Some("owner"),
            Method::POST,
            "/admin/staff",
            Payload::Json(json!({ "subject": "waiter" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(member["role"], "staff");

    let (status, tables) = app.get(Some("waiter"), "/staff/tables").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tables[0]["label"], "1");

    let (status, body) = app.get(Some("waiter"), "/admin/tables").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access Denied: This page is for managers only.");

    // Another restaurant cannot poach the waiter
    app.onboard("rival", "Rival Diner").await;
    let (status, _) = app
        .send(
            Some("rival"),
            Method::POST,
            "/admin/staff",
            Payload::Json(json!({ "subject": "waiter" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_customer_page_and_cooldown() {
    let app = setup().await;
    app.onboard("owner", "Chez Rust").await;
    app.add_table("owner", "1").await;

    let (status, page) = app.get(None, "/tables/chez-rust/1").await;
    assert_eq!(status, StatusCode::OK);
    let options = page["options"].as_array().unwrap();
    assert_eq!(options.len(), 6);
    assert!(options.iter().all(|o| o["blocked_until"].is_null()));

    let (status, created) = app.submit("chez-rust", "1", "table_clean", None).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["request_type"], "table_clean");
    assert_eq!(created["status"], "pending");
    assert_eq!(created["table_label"], "1");
    assert_eq!(created["age"], "Just now");

    let (status, body) = app.submit("chez-rust", "1", "table_clean", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Please wait 9m 5")
    );

    let (_, page) = app.get(None, "/tables/chez-rust/1").await;
    let table_clean = page["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|o| o["request_type"] == "table_clean")
        .unwrap()
        .clone();
    assert!(table_clean["blocked_until"].is_string());
    assert!(table_clean["remaining_seconds"].as_i64().unwrap() > 590);

    // Other types are unaffected
    let (status, _) = app.submit("chez-rust", "1", "request_sauces", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = app.get(Some("owner"), "/staff/requests").await;
    assert_eq!(list["requests"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_customer_request_validation() {
    let app = setup().await;
    app.onboard("owner", "Chez Rust").await;
    app.add_table("owner", "1").await;

    let (status, _) = app.get(None, "/tables/chez-rust/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(None, "/tables/nowhere/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.submit("chez-rust", "1", "free_dessert", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.submit("chez-rust", "1", "toilet_clean", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "A photo is required for \"Toilet Issue\"");

    let (status, _) = app
        .submit("chez-rust", "1", "toilet_clean", Some(("notes.pdf", &b"%PDF"[..])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let too_big = vec![0u8; 2048];
    let (status, _) = app
        .submit("chez-rust", "1", "toilet_clean", Some(("big.jpg", too_big.as_slice())))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = app
        .submit("chez-rust", "1", "toilet_clean", Some(("mess.jpg", &b"jpeg bytes"[..])))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let photo_url = created["photo_url"].as_str().unwrap();
    assert!(photo_url.starts_with("http://tables.test/photos/"));

    let path = photo_url.trim_start_matches("http://tables.test");
    let (status, photo) = app.get(None, path).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(photo, Value::String("jpeg bytes".to_string()));
}

#[tokio::test]
async fn test_failed_insert_leaves_no_photo_behind() {
    let app = setup().await;
    app.onboard("owner", "Chez Rust").await;
    app.add_table("owner", "1").await;

    app.state
        .db
        .execute_unprepared(
            "CREATE TRIGGER reject_requests BEFORE INSERT ON requests \
             BEGIN SELECT RAISE(ABORT, 'rejected'); END",
        )
        .await
        .unwrap();

    let (status, body) = app
        .submit("chez-rust", "1", "toilet_clean", Some(("mess.jpg", &b"jpeg bytes"[..])))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{body}");

    let dir = app.state.photos.dir();
    let stored = std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0);
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_staff_workflow_publishes_changes() {
    let app = setup().await;
    let restaurant_id = app.onboard("owner", "Chez Rust").await;
    let table_id = app.add_table("owner", "1").await;
    app.add_table("owner", "2").await;
    let mut feed = app.state.hub.subscribe(restaurant_id);

    let (_, created) = app.submit("chez-rust", "1", "ready_to_order", None).await;
    let id: Uuid = created["id"].as_str().unwrap().parse().unwrap();
    assert_eq!(
        feed.next().await,
        Some(FeedItem::Change(RequestChange::insert(id, table_id)))
    );

    let (_, cells) = app.get(Some("owner"), "/staff/heatmap").await;
    assert_eq!(cells[0]["label"], "1");
    assert_eq!(cells[0]["priority"], "high");
    assert!(cells[1]["priority"].is_null());

    let uri = format!("/staff/requests/{id}");
    let (status, updated) = app
        .send(
            Some("owner"),
            Method::PATCH,
            &uri,
            Payload::Json(json!({ "status": "in_progress" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "in_progress");
    assert_eq!(
        feed.next().await,
        Some(FeedItem::Change(RequestChange::update(id, table_id)))
    );

    let (status, body) = app
        .send(
            Some("owner"),
            Method::PATCH,
            &uri,
            Payload::Json(json!({ "status": "pending" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Request is already in progress");

    let (status, result) = app
        .send(
            Some("owner"),
            Method::POST,
            &format!("/staff/tables/{table_id}/complete"),
            Payload::Empty,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["count"], 1);
    assert!(matches!(
        feed.next().await,
        Some(FeedItem::Change(RequestChange { kind: ChangeKind::Update, .. }))
    ));

    let (_, cells) = app.get(Some("owner"), "/staff/heatmap").await;
    assert!(cells[0]["priority"].is_null());

    let (_, list) = app
        .get(Some("owner"), "/staff/requests?status=completed")
        .await;
    assert_eq!(list["requests"].as_array().unwrap().len(), 1);
    assert_eq!(list["completed_count"], 1);

    let (_, list) = app.get(Some("owner"), "/staff/requests?status=pending").await;
    assert!(list["requests"].as_array().unwrap().is_empty());

    let (status, result) = app
        .send(
            Some("owner"),
            Method::DELETE,
            "/staff/requests/completed",
            Payload::Empty,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["count"], 1);
    assert_eq!(
        feed.next().await,
        Some(FeedItem::Change(RequestChange::delete(id, table_id)))
    );

    let (status, _) = app.get(Some("owner"), &uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_restaurants_are_isolated() {
    let app = setup().await;
    let ours = app.onboard("owner", "Chez Rust").await;
    let theirs = app.onboard("rival", "Rival Diner").await;
    let rival_table = app.add_table("rival", "1").await;
    app.add_table("owner", "1").await;

    let mut our_feed = app.state.hub.subscribe(ours);
    let mut their_feed = app.state.hub.subscribe(theirs);

    let (_, created) = app.submit("rival-diner", "1", "table_clean", None).await;
    let id = created["id"].as_str().unwrap();
    assert!(matches!(their_feed.next().await, Some(FeedItem::Change(_))));

    let (status, _) = app
        .get(Some("owner"), &format!("/staff/requests/{id}"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Some("owner"),
            Method::POST,
            &format!("/staff/tables/{rival_table}/complete"),
            Payload::Empty,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.send(
        Some("rival"),
        Method::PATCH,
        &format!("/staff/requests/{id}"),
        Payload::Json(json!({ "status": "completed" })),
    )
    .await;

    let (_, result) = app
        .send(
            Some("owner"),
            Method::DELETE,
            "/staff/requests/completed",
            Payload::Empty,
        )
        .await;
    assert_eq!(result["count"], 0);

    let (_, list) = app.get(Some("rival"), "/staff/requests").await;
    assert_eq!(list["completed_count"], 1);

    // Nothing of the rival's activity reached our dashboard
    app.state.hub.publish(ours, RequestChange::insert(Uuid::nil(), Uuid::nil()));
    assert_eq!(
        our_feed.next().await,
        Some(FeedItem::Change(RequestChange::insert(Uuid::nil(), Uuid::nil())))
    );
}

#[tokio::test]
async fn test_reports() {
    let app = setup().await;
    app.onboard("owner", "Chez Rust").await;
    app.add_table("owner", "1").await;
    app.add_table("owner", "2").await;

    app.submit("chez-rust", "1", "table_clean", None).await;
    app.submit("chez-rust", "2", "table_clean", None).await;
    app.submit("chez-rust", "2", "replace_cutlery", None).await;

    let (status, report) = app.get(Some("owner"), "/staff/reports").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["total"], 3);
    assert_eq!(report["by_type"][0]["request_type"], "table_clean");
    assert_eq!(report["by_type"][0]["count"], 2);
    assert_eq!(report["by_type"][0]["label"], "Clean Table");
    assert_eq!(report["by_hour"].as_array().unwrap().len(), 1);
}
