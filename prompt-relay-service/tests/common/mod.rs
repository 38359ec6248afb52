#![allow(dead_code)]

use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use http_body_util::BodyExt;
use prompt_relay_service::config::{CorsConfig, GoogleConfig, ModelConfig, RelayConfig};
use prompt_relay_service::services::providers::mock::{MockImageProvider, MockTextProvider};
use prompt_relay_service::startup::{build_router, AppState, Application};
use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEXT_MODEL: &str = "gemini-2.0-flash";
pub const IMAGE_MODEL: &str = "imagen-3.0-generate-001";

/// Config pointing at `api_base`, listening on a random port.
pub fn test_config(api_base: &str) -> RelayConfig {
    RelayConfig {
        common: CoreConfig { port: 0 },
        google: GoogleConfig {
            api_key: Secret::new(TEST_API_KEY.to_string()),
            api_base: api_base.to_string(),
            timeout: Duration::from_secs(5),
        },
        models: ModelConfig {
            text_model: TEXT_MODEL.to_string(),
            image_model: IMAGE_MODEL.to_string(),
            aspect_ratio: "1:1".to_string(),
        },
        cors: CorsConfig {
            allowed_origins: vec!["*".to_string()],
        },
    }
}

/// Router backed by the given mocks.
pub fn router_with(text: Arc<MockTextProvider>, image: Arc<MockImageProvider>) -> Router {
    let state = AppState::with_providers(test_config("http://unused.invalid"), text, image);
    build_router(state)
}

/// Send a request through the router and decode the JSON body.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = router.oneshot(request).await.expect("router call failed");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("failed to read body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, body)
}

pub fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate-image")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// A running relay bound to a random port.
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(config: RelayConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client
                .get(format!("{}/health", address))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp { address, client }
    }

    pub async fn generate(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/generate-image", self.address))
            .json(&body)
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .expect("Failed to send request")
    }
}

/// A call the fake upstream received.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub call: String,
    pub api_key: Option<String>,
    pub body: Value,
}

/// Scripted replies for the fake Google API.
pub struct FakeGoogleState {
    pub text_reply: (StatusCode, Value),
    pub image_reply: (StatusCode, Value),
    pub calls: Mutex<Vec<RecordedCall>>,
}

/// In-process stand-in for the Generative Language API.
pub struct FakeGoogle {
    pub api_base: String,
    pub state: Arc<FakeGoogleState>,
}

impl FakeGoogle {
    pub async fn spawn(text_reply: (StatusCode, Value), image_reply: (StatusCode, Value)) -> Self {
        let state = Arc::new(FakeGoogleState {
            text_reply,
            image_reply,
            calls: Mutex::new(Vec::new()),
        });

        let router = Router::new()
            .route("/v1beta/models/:call", post(fake_model_call))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake upstream");
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        FakeGoogle {
            api_base: format!("http://127.0.0.1:{}/v1beta", port),
            state,
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }
}

async fn fake_model_call(
    State(state): State<Arc<FakeGoogleState>>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.calls.lock().unwrap().push(RecordedCall {
        call: call.clone(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let (status, reply) = if call.ends_with(":generateContent") {
        state.text_reply.clone()
    } else if call.ends_with(":predict") {
        state.image_reply.clone()
    } else {
        (StatusCode::NOT_FOUND, json!({"error": {"message": "unknown method"}}))
    };

    (status, Json(reply))
}

/// Gemini reply carrying `text` in the first candidate.
pub fn gemini_text(text: &str) -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 60, "candidatesTokenCount": 20}
        }),
    )
}

/// Imagen reply carrying one base64-encoded image.
pub fn imagen_image(b64: &str) -> (StatusCode, Value) {
    (
        StatusCode::OK,
        json!({"predictions": [{"bytesBase64Encoded": b64, "mimeType": "image/png"}]}),
    )
}
