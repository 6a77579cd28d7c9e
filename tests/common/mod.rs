//! Shared test doubles and builders for integration tests

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::Router;
use klaxon::application::engine::{CallLifecycleEngine, EngineTimings};
use klaxon::domain::call::entity::CalleeInfo;
use klaxon::domain::call::platform::CallPlatform;
use klaxon::domain::call::registry::CallRegistry;
use klaxon::domain::call::value_object::CallTarget;
use klaxon::domain::media::store::AssetStore;
use klaxon::domain::shared::value_objects::{AssetId, CallId, TenantId};
use klaxon::interface::api::{build_router, AppState};
use klaxon::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory platform that records every command it receives
#[derive(Default)]
pub struct FakePlatform {
    commands: Mutex<Vec<String>>,
    next_call: AtomicUsize,
}

impl FakePlatform {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    pub fn command_count(&self, prefix: &str) -> usize {
        self.commands()
            .iter()
            .filter(|line| line.starts_with(prefix))
            .count()
    }

    fn record(&self, line: String) {
        self.commands.lock().unwrap().push(line);
    }
}

#[async_trait]
impl CallPlatform for FakePlatform {
    async fn lookup_callee(&self, target: &CallTarget, _tenant: &TenantId) -> Result<CalleeInfo> {
        self.record(format!("lookup {}", target));
        let name = match target {
            CallTarget::User { .. } => "Dana Reyes".to_string(),
            CallTarget::Phone { number } => number.clone(),
        };
        Ok(CalleeInfo::new(name))
    }

    async fn place_call(
        &self,
        target: &CallTarget,
        _tenant: &TenantId,
        _prompt_url: &str,
    ) -> Result<CallId> {
        let n = self.next_call.fetch_add(1, Ordering::SeqCst);
        self.record(format!("place {}", target));
        Ok(CallId::new(format!("call-{}", n)))
    }

    async fn play_prompt(
        &self,
        call_id: &CallId,
        media_url: &str,
        _client_context: &str,
    ) -> Result<()> {
        self.record(format!("play {} {}", call_id, media_url));
        Ok(())
    }

    async fn subscribe_tone(&self, call_id: &CallId, _client_context: &str) -> Result<()> {
        self.record(format!("subscribe {}", call_id));
        Ok(())
    }

    async fn end_call(&self, call_id: &CallId) -> Result<()> {
        self.record(format!("end {}", call_id));
        Ok(())
    }
}

/// Asset store that tracks synthesized and deleted clips in memory
#[derive(Default)]
pub struct FakeAssets {
    stored: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
}

impl FakeAssets {
    pub fn stored(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetStore for FakeAssets {
    async fn synthesize(&self, _text: &str) -> Result<AssetId> {
        let asset = AssetId::generate();
        self.stored.lock().unwrap().push(asset.to_string());
        Ok(asset)
    }

    async fn synthesize_as(&self, asset: &AssetId, _text: &str) -> Result<()> {
        self.stored.lock().unwrap().push(asset.to_string());
        Ok(())
    }

    async fn delete(&self, asset: &AssetId) -> Result<()> {
        self.deleted.lock().unwrap().push(asset.to_string());
        Ok(())
    }

    fn media_url(&self, asset: &AssetId) -> String {
        format!("http://svc.test/media/{}.wav", asset)
    }
}

pub struct TestApp {
    pub router: Router,
    pub platform: Arc<FakePlatform>,
    pub assets: Arc<FakeAssets>,
}

/// Build the full router over fakes.
///
/// Delay-style timings are shrunk so flows that sleep in production finish
/// within the test budget; threshold-style timings keep their defaults.
pub fn test_app(require_key: bool, menu: bool) -> TestApp {
    let platform = Arc::new(FakePlatform::default());
    let assets = Arc::new(FakeAssets::default());
    let registry = Arc::new(CallRegistry::new(Duration::from_secs(30)));

    let timings = EngineTimings {
        voicemail_tuning_delay: Duration::from_millis(20),
        tone_menu_settle: Duration::from_millis(10),
        ..EngineTimings::default()
    };

    let engine = CallLifecycleEngine::new(
        registry,
        platform.clone(),
        assets.clone(),
        timings,
        menu.then(|| AssetId::named("tone-menu")),
    );

    let state = AppState {
        engine,
        assets: assets.clone(),
        require_key,
        api_key: "sekrit".to_string(),
    };
    let prometheus_handle = PrometheusBuilder::new().build_recorder().handle();

    TestApp {
        router: build_router(state, prometheus_handle, "media"),
        platform,
        assets,
    }
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// Envelope with a single call lifecycle notification
pub fn lifecycle_delivery(call_id: &str, state: &str, media_active: bool) -> Value {
    serde_json::json!({
        "value": [{
            "resourceData": {
                "kind": "call",
                "id": call_id,
                "state": state,
                "mediaActive": media_active,
            }
        }]
    })
}

/// Envelope with a single tone notification
pub fn tone_delivery(call_id: &str, tone: &str) -> Value {
    serde_json::json!({
        "value": [{
            "resourceData": {
                "kind": "call",
                "id": call_id,
                "state": "connected",
                "mediaActive": true,
                "tone": tone,
            }
        }]
    })
}

/// Envelope with a single playback progress notification
pub fn playback_delivery(call_id: &str, status: &str) -> Value {
    serde_json::json!({
        "value": [{
            "resourceData": {
                "kind": "playPromptOperation",
                "clientContext": call_id,
                "status": status,
            }
        }]
    })
}

/// Poll until `condition` holds; webhook processing runs on background tasks
pub async fn wait_until(condition: impl Fn() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within 2s");
}

/// Poll until the call disappears from the registry
pub async fn wait_for_gone(router: &Router, call_id: &str) {
    use tower::ServiceExt;

    let uri = format!("/api/calls/{}", call_id);
    for _ in 0..400 {
        let response = router.clone().oneshot(get(&uri)).await.unwrap();
        if response.status() == axum::http::StatusCode::NOT_FOUND {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("call {} still listed after 2s", call_id);
}

/// Poll until the call's summary reports `state`
pub async fn wait_for_state(router: &Router, call_id: &str, state: &str) {
    use tower::ServiceExt;

    let uri = format!("/api/calls/{}", call_id);
    for _ in 0..400 {
        let response = router.clone().oneshot(get(&uri)).await.unwrap();
        if response.status() == axum::http::StatusCode::OK {
            let body = read_json(response).await;
            if body["data"]["state"] == state {
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("call {} never reached state {}", call_id, state);
}
