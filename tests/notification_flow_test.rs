//! Webhook-driven call flow integration tests
//!
//! Each test drives the full HTTP surface: place a call through the API,
//! then feed the notification webhook the progress reports a platform
//! would send and watch the commands the engine issues in response.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt; // For `oneshot` and `ready`

async fn place_call(app: &TestApp) -> String {
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/calls/user",
            json!({"text": "Backup job failed", "userId": "u-42", "tenant": "acme"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    body["data"]["callId"].as_str().unwrap().to_string()
}

async fn deliver(app: &TestApp, envelope: serde_json::Value) {
    let response = app
        .router
        .clone()
        .oneshot(post_json("/api/notifications", envelope))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_live_answer_flow_without_menu() {
    let app = test_app(false, false);
    let call_id = place_call(&app).await;
    let greeting = app.assets.stored()[0].clone();

    deliver(&app, lifecycle_delivery(&call_id, "ringing", false)).await;
    deliver(&app, lifecycle_delivery(&call_id, "connected", true)).await;

    // Short ring means a live pickup; the greeting plays straight away
    wait_until(|| app.platform.command_count("play") == 1).await;
    let commands = app.platform.commands();
    assert_eq!(
        commands[2],
        format!("play {} http://svc.test/media/{}.wav", call_id, greeting)
    );

    // No menu configured: greeting completion ends the call
    deliver(&app, playback_delivery(&call_id, "completed")).await;
    wait_for_gone(&app.router, &call_id).await;

    assert_eq!(app.platform.command_count("end"), 1);
    assert_eq!(app.assets.deleted(), vec![greeting]);

    // A duplicate completion report finds a tombstone and changes nothing
    deliver(&app, playback_delivery(&call_id, "completed")).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(app.platform.command_count("end"), 1);
}

#[tokio::test]
async fn test_confirm_tone_ends_the_call() {
    let app = test_app(false, true);
    let call_id = place_call(&app).await;

    deliver(&app, lifecycle_delivery(&call_id, "ringing", false)).await;
    deliver(&app, lifecycle_delivery(&call_id, "connected", true)).await;
    wait_until(|| app.platform.command_count("play") == 1).await;

    // Greeting finished; the tone menu arms instead of hanging up
    deliver(&app, playback_delivery(&call_id, "completed")).await;
    wait_for_state(&app.router, &call_id, "AwaitingTone").await;

    deliver(&app, tone_delivery(&call_id, "1")).await;
    wait_for_gone(&app.router, &call_id).await;

    assert_eq!(app.platform.command_count("end"), 1);
    // Cleanup removes the per-call greeting, never the shared menu clip
    assert!(!app.assets.deleted().contains(&"tone-menu".to_string()));
}

#[tokio::test]
async fn test_repeat_tone_replays_greeting_then_menu() {
    let app = test_app(false, true);
    let call_id = place_call(&app).await;
    let greeting = app.assets.stored()[0].clone();

    deliver(&app, lifecycle_delivery(&call_id, "ringing", false)).await;
    deliver(&app, lifecycle_delivery(&call_id, "connected", true)).await;
    wait_until(|| app.platform.command_count("play") == 1).await;

    deliver(&app, playback_delivery(&call_id, "completed")).await;
    wait_for_state(&app.router, &call_id, "AwaitingTone").await;

    deliver(&app, tone_delivery(&call_id, "2")).await;
    wait_until(|| app.platform.command_count("play") == 3).await;

    let commands = app.platform.commands();
    let plays: Vec<&String> = commands.iter().filter(|c| c.starts_with("play")).collect();
    assert!(plays[1].contains(&format!("{}.wav", greeting)));
    assert!(plays[2].contains("tone-menu.wav"));

    // The call is still live and waiting on a selection
    wait_for_state(&app.router, &call_id, "AwaitingTone").await;
    assert_eq!(app.platform.command_count("end"), 0);
}

#[tokio::test]
async fn test_connect_without_media_opens_menu_by_subscription() {
    let app = test_app(false, true);
    let call_id = place_call(&app).await;

    deliver(&app, lifecycle_delivery(&call_id, "ringing", false)).await;
    deliver(&app, lifecycle_delivery(&call_id, "connected", false)).await;

    wait_until(|| {
        app.platform.command_count("subscribe") == 1 && app.platform.command_count("play") == 1
    })
    .await;

    let commands = app.platform.commands();
    let play = commands.iter().find(|c| c.starts_with("play")).unwrap();
    assert!(play.contains("tone-menu.wav"));

    wait_for_state(&app.router, &call_id, "AwaitingTone").await;
}

#[tokio::test]
async fn test_remote_ended_prunes_without_hangup() {
    let app = test_app(false, false);
    let call_id = place_call(&app).await;
    let greeting = app.assets.stored()[0].clone();

    deliver(&app, lifecycle_delivery(&call_id, "ringing", false)).await;
    deliver(&app, lifecycle_delivery(&call_id, "ended", false)).await;

    wait_for_gone(&app.router, &call_id).await;

    // The platform already tore the call down; no hang-up command goes out
    assert_eq!(app.platform.command_count("end"), 0);
    assert_eq!(app.assets.deleted(), vec![greeting]);
}

#[tokio::test]
async fn test_webhook_is_open_and_tolerates_unknown_calls() {
    // Key required on management routes, never on the webhook
    let app = test_app(true, false);

    deliver(&app, lifecycle_delivery("never-placed", "connected", true)).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(app.platform.commands().is_empty());
}

#[tokio::test]
async fn test_malformed_delivery_is_a_client_error() {
    let app = test_app(false, false);

    let request = Request::builder()
        .method("POST")
        .uri("/api/notifications")
        .header("content-type", "application/json")
        .body(Body::from("{\"value\": [{\"resourceData\": {\"kind\": \"call\"}}]}"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    // `kind: call` without state fails deserialization
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let garbage = Request::builder()
        .method("POST")
        .uri("/api/notifications")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let response = app.router.clone().oneshot(garbage).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
