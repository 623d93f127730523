//! Run Handler - 任务执行入口
//!
//! 每个请求恰好对应一次 JobHandler::handle 调用。响应永远是
//! HTTP 200 + 结构化信封，任务级错误在信封内表达

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::jobs::{JobEvent, JobResponse};
use crate::infrastructure::http::state::AppState;

pub async fn run_job(
    State(state): State<Arc<AppState>>,
    Json(event): Json<JobEvent>,
) -> Json<JobResponse> {
    Json(state.job_handler.handle(event).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::jobs::{InferenceExecutor, JobHandler, ResultEncoder};
    use crate::application::model::ModelLoader;
    use crate::application::ports::{DevicePreference, LoadOptions, Precision};
    use crate::domain::inference::{GenerationDefaults, GenerationMode};
    use crate::infrastructure::adapters::{FakeModelClient, FakeModelClientConfig};
    use crate::infrastructure::http::routes::create_routes;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::util::ServiceExt;

    fn test_state(mode: GenerationMode) -> Arc<AppState> {
        let backend = Arc::new(FakeModelClient::new(FakeModelClientConfig::default()));
        let loader = ModelLoader::new(
            backend.clone(),
            LoadOptions {
                model_id: "Qwen/Qwen-Image".to_string(),
                cache_dir: "/tmp/weights".to_string(),
                device: DevicePreference::Auto,
                precision: Precision::Auto,
            },
        )
        .arc();
        let handler = Arc::new(JobHandler::new(
            loader.clone(),
            InferenceExecutor::new(backend.clone(), mode),
            ResultEncoder::new("Qwen/Qwen-Image", mode),
            GenerationDefaults::default(),
        ));
        Arc::new(AppState::new(handler, loader, backend))
    }

    fn app(mode: GenerationMode) -> axum::Router {
        create_routes().with_state(test_state(mode))
    }

    async fn post_run(app: axum::Router, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/run")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_run_returns_success_envelope() {
        let (status, json) = post_run(
            app(GenerationMode::Text),
            r#"{"input": {"prompt": "hello"}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert!(json["output"]["generated_text"].is_string());
    }

    #[tokio::test]
    async fn test_run_returns_error_envelope_with_http_200() {
        let (status, json) = post_run(app(GenerationMode::Text), r#"{"input": {}}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "prompt parameter is required");
    }
}
