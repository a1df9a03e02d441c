//! REST surface tests: routing, identity middleware, and error mapping
//! over an in-memory database.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tower::ServiceExt;

use huddle_config::MessagingConfig;
use huddle_database::{run_migrations, ChannelRepository, User, UserRepository};
use huddle_gateway::{create_router, GatewayState};

struct TestApp {
    router: Router,
    pool: SqlitePool,
}

async fn test_app() -> TestApp {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();
    let router = create_router(GatewayState::new(pool.clone(), MessagingConfig::default()));
    TestApp { router, pool }
}

async fn create_user(pool: &SqlitePool, name: &str) -> User {
    UserRepository::new(pool.clone()).create(name).await.unwrap()
}

async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    caller: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header("x-user-id", caller);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_needs_no_identity() {
    let app = test_app().await;
    let (status, body) = send(&app.router, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn api_requests_without_identity_are_unauthorized() {
    let app = test_app().await;
    let (status, _) = send(&app.router, "GET", "/api/conversations", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, "GET", "/api/conversations", Some("ghost"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn dm_round_trip_over_rest() {
    let app = test_app().await;
    let alice = create_user(&app.pool, "Alice").await;
    let bob = create_user(&app.pool, "Bob").await;

    // Alice starts the conversation; doing it again returns the same room.
    let (status, conversation) = send(
        &app.router,
        "POST",
        "/api/conversations",
        Some(&alice.public_id),
        Some(json!({ "peer_id": bob.public_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let conversation_id = conversation["id"].as_str().unwrap().to_string();
    assert_eq!(conversation["peer_display_name"], "Bob");

    let (_, again) = send(
        &app.router,
        "POST",
        "/api/conversations",
        Some(&bob.public_id),
        Some(json!({ "peer_id": alice.public_id })),
    )
    .await;
    assert_eq!(again["id"], conversation_id.as_str());

    // Alice sends; Bob sees one unread message in his inbox.
    let (status, message) = send(
        &app.router,
        "POST",
        &format!("/api/conversations/{conversation_id}/messages"),
        Some(&alice.public_id),
        Some(json!({ "content": "hello bob" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["content"], "hello bob");
    assert_eq!(message["sender_display_name"], "Alice");

    let (status, inbox) = send(
        &app.router,
        "GET",
        "/api/conversations",
        Some(&bob.public_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(inbox[0]["unread_count"], 1);
    assert_eq!(inbox[0]["last_message_content"], "hello bob");

    // Bob marks read; the count drops to zero and stays there.
    let (status, read) = send(
        &app.router,
        "POST",
        &format!("/api/conversations/{conversation_id}/read"),
        Some(&bob.public_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["marked"], 1);

    let (_, inbox) = send(
        &app.router,
        "GET",
        "/api/conversations",
        Some(&bob.public_id),
        None,
    )
    .await;
    assert_eq!(inbox[0]["unread_count"], 0);
}

#[tokio::test]
async fn self_conversation_is_a_bad_request() {
    let app = test_app().await;
    let alice = create_user(&app.pool, "Alice").await;

    let (status, _) = send(
        &app.router,
        "POST",
        "/api/conversations",
        Some(&alice.public_id),
        Some(json!({ "peer_id": alice.public_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn outsiders_get_forbidden_not_found_in_order() {
    let app = test_app().await;
    let alice = create_user(&app.pool, "Alice").await;
    let bob = create_user(&app.pool, "Bob").await;
    let mallory = create_user(&app.pool, "Mallory").await;

    let (_, conversation) = send(
        &app.router,
        "POST",
        "/api/conversations",
        Some(&alice.public_id),
        Some(json!({ "peer_id": bob.public_id })),
    )
    .await;
    let conversation_id = conversation["id"].as_str().unwrap();

    let (status, _) = send(
        &app.router,
        "GET",
        &format!("/api/conversations/{conversation_id}/messages"),
        Some(&mallory.public_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        "GET",
        "/api/conversations/nonexistent/messages",
        Some(&alice.public_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn message_edit_and_delete_lifecycle() {
    let app = test_app().await;
    let alice = create_user(&app.pool, "Alice").await;
    let bob = create_user(&app.pool, "Bob").await;

    let (_, conversation) = send(
        &app.router,
        "POST",
        "/api/conversations",
        Some(&alice.public_id),
        Some(json!({ "peer_id": bob.public_id })),
    )
    .await;
    let conversation_id = conversation["id"].as_str().unwrap().to_string();

    let (_, message) = send(
        &app.router,
        "POST",
        &format!("/api/conversations/{conversation_id}/messages"),
        Some(&alice.public_id),
        Some(json!({ "content": "draft" })),
    )
    .await;
    let message_id = message["id"].as_str().unwrap().to_string();

    // Bob cannot edit Alice's message.
    let (status, _) = send(
        &app.router,
        "PUT",
        &format!("/api/conversations/{conversation_id}/messages/{message_id}"),
        Some(&bob.public_id),
        Some(json!({ "content": "hijack" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, edited) = send(
        &app.router,
        "PUT",
        &format!("/api/conversations/{conversation_id}/messages/{message_id}"),
        Some(&alice.public_id),
        Some(json!({ "content": "final" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["content"], "final");
    assert_eq!(edited["edited"], true);

    let (status, deleted) = send(
        &app.router,
        "DELETE",
        &format!("/api/conversations/{conversation_id}/messages/{message_id}"),
        Some(&alice.public_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], message_id.as_str());

    // Terminal: the ID is gone for good.
    let (status, _) = send(
        &app.router,
        "PUT",
        &format!("/api/conversations/{conversation_id}/messages/{message_id}"),
        Some(&alice.public_id),
        Some(json!({ "content": "undo" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, history) = send(
        &app.router,
        "GET",
        &format!("/api/conversations/{conversation_id}/messages"),
        Some(&alice.public_id),
        None,
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn channel_administration_over_rest() {
    let app = test_app().await;
    let alice = create_user(&app.pool, "Alice").await;

    let general = ChannelRepository::new(app.pool.clone())
        .provision_workspace_defaults("ws1", alice.id)
        .await
        .unwrap();

    let (status, channel) = send(
        &app.router,
        "POST",
        "/api/workspaces/ws1/channels",
        Some(&alice.public_id),
        Some(json!({ "name": "builds" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(channel["name"], "builds");
    let channel_id = channel["id"].as_str().unwrap().to_string();

    // Duplicate name, case-insensitively, is rejected.
    let (status, _) = send(
        &app.router,
        "POST",
        "/api/workspaces/ws1/channels",
        Some(&alice.public_id),
        Some(json!({ "name": "Builds" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Post into the channel and read it back.
    let (status, message) = send(
        &app.router,
        "POST",
        &format!("/api/channels/{channel_id}/messages"),
        Some(&alice.public_id),
        Some(json!({ "content": "green" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["channel_id"], channel_id.as_str());

    let (_, listed) = send(
        &app.router,
        "GET",
        &format!("/api/channels/{channel_id}/messages"),
        Some(&alice.public_id),
        None,
    )
    .await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // general is protected; the side channel is not.
    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/api/channels/{}", general.public_id),
        Some(&alice.public_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, renamed) = send(
        &app.router,
        "PUT",
        &format!("/api/channels/{channel_id}"),
        Some(&alice.public_id),
        Some(json!({ "name": "releases" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "releases");

    let (status, _) = send(
        &app.router,
        "DELETE",
        &format!("/api/channels/{channel_id}"),
        Some(&alice.public_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
