//! Web 服务器模块
//!
//! 提供 `POST /defend` 以及健康检查和 Agent 信息接口

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use tokio::sync::Semaphore;
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn, Instrument};

use crate::config::AppConfig;
use crate::core::DefenseResponder;
use crate::domain::DefenseRequest;

/// 对外公布的接口列表
pub const ENDPOINTS: [&str; 3] = ["POST /defend", "GET /health", "GET /agent"];

// ==================== 状态 ====================

#[derive(Clone)]
pub struct AppState {
    pub responder: DefenseResponder,
    /// 并发上限，None 表示不限制
    pub limiter: Option<Arc<Semaphore>>,
}

impl AppState {
    pub fn new(responder: DefenseResponder) -> Self {
        Self {
            responder,
            limiter: None,
        }
    }

    pub fn with_concurrency_limit(mut self, limit: Option<usize>) -> Self {
        self.limiter = limit.map(|n| Arc::new(Semaphore::new(n)));
        self
    }
}

// ==================== API 响应类型 ====================

#[derive(Serialize)]
pub struct AgentInfoResponse {
    pub name: String,
    pub address: String,
    pub endpoints: Vec<String>,
}

// ==================== 处理器 ====================

/// 生成并发布防御推文
async fn defend(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DefenseRequest>, JsonRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4();

    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(%request_id, "rejected defend request: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", rejection.body_text()),
            )
                .into_response();
        }
    };

    let _permit = match &state.limiter {
        Some(limiter) => match limiter.clone().acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(e) => {
                error!(%request_id, "concurrency limiter closed: {}", e);
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service is shutting down".to_string(),
                )
                    .into_response();
            }
        },
        None => None,
    };

    let span = tracing::info_span!("defend", %request_id);
    let result = state.responder.handle(&request).instrument(span).await;

    info!(
        %request_id,
        success = result.success,
        twitter_posted = result.twitter_posted,
        tweet_length = result.tweet_length,
        "defend request completed"
    );

    Json(result).into_response()
}

/// 健康检查
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "agent_address": state.responder.identity().address,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Agent 信息
async fn agent_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let identity = state.responder.identity();
    Json(AgentInfoResponse {
        name: identity.name.clone(),
        address: identity.address.clone(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
    })
}

/// 处理器 panic 时返回纯文本 500，进程继续运行
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("request handler panicked: {}", detail);

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Internal error: {}", detail),
    )
        .into_response()
}

// ==================== 路由 ====================

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/defend", post(defend))
        .route("/health", get(health_check))
        .route("/agent", get(agent_info))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(cors),
        )
        .with_state(state)
}

// ==================== 服务器启动 ====================

pub async fn start_web_server(config: &AppConfig, responder: DefenseResponder) -> anyhow::Result<()> {
    let state = Arc::new(
        AppState::new(responder).with_concurrency_limit(config.max_concurrent_requests),
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Web server started on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Web server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TextGenerator, TweetPoster};
    use crate::domain::{AgentIdentity, DefenseResult};
    use crate::errors::Result;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct FixedGenerator;

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _system_prompt: &str, _prompt: &str) -> Result<String> {
            Ok("We love our community!".to_string())
        }
    }

    struct OkPoster;

    #[async_trait]
    impl TweetPoster for OkPoster {
        async fn post(&self, _text: &str) -> Result<String> {
            Ok("posted".to_string())
        }
    }

    struct PanickingPoster;

    #[async_trait]
    impl TweetPoster for PanickingPoster {
        async fn post(&self, _text: &str) -> Result<String> {
            panic!("poster exploded");
        }
    }

    /// 每次调用先计数，再等待放行
    struct BlockingGenerator {
        started: Arc<std::sync::atomic::AtomicUsize>,
        release: Arc<tokio::sync::Notify>,
    }

    #[async_trait]
    impl TextGenerator for BlockingGenerator {
        async fn generate(&self, _system_prompt: &str, _prompt: &str) -> Result<String> {
            self.started.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            self.release.notified().await;
            Ok("Still here for you!".to_string())
        }
    }

    fn router_with(poster: Arc<dyn TweetPoster>) -> Router {
        let responder = DefenseResponder::new(
            Arc::new(FixedGenerator),
            poster,
            AgentIdentity::from_seed("xbot", "router test"),
        );
        create_router(Arc::new(AppState::new(responder).with_concurrency_limit(Some(2))))
    }

    fn defend_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/defend")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_defend_ok() {
        let app = router_with(Arc::new(OkPoster));

        let response = app
            .oneshot(defend_request(r#"{"negative_social_sentiment": ["Bad product"]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let result: DefenseResult = serde_json::from_slice(&bytes).unwrap();
        assert!(result.success);
        assert!(result.twitter_posted);
        assert_eq!(result.twitter_response.as_deref(), Some("posted"));
    }

    #[tokio::test]
    async fn test_defend_malformed_body_is_plain_text_400() {
        let app = router_with(Arc::new(OkPoster));

        let response = app.oneshot(defend_request("{not json")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_handler_panic_becomes_500() {
        let app = router_with(Arc::new(PanickingPoster));

        let response = app.oneshot(defend_request("{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("poster exploded"));
    }

    #[tokio::test]
    async fn test_agent_info() {
        let app = router_with(Arc::new(OkPoster));

        let response = app
            .oneshot(Request::builder().uri("/agent").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["name"], "xbot");
        assert!(json["address"].as_str().unwrap().starts_with("agent1q"));
        assert_eq!(json["endpoints"][0], "POST /defend");
    }

    #[tokio::test]
    async fn test_concurrency_limit_queues_excess_requests() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::time::Duration;

        let started = Arc::new(AtomicUsize::new(0));
        let release = Arc::new(tokio::sync::Notify::new());
        let responder = DefenseResponder::new(
            Arc::new(BlockingGenerator {
                started: started.clone(),
                release: release.clone(),
            }),
            Arc::new(OkPoster),
            AgentIdentity::from_seed("xbot", "limit test"),
        );
        let app = create_router(Arc::new(AppState::new(responder).with_concurrency_limit(Some(1))));

        let wait_for = |count: usize| {
            let started = started.clone();
            async move {
                while started.load(Ordering::SeqCst) < count {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        };

        let first = tokio::spawn(app.clone().oneshot(defend_request("{}")));
        tokio::time::timeout(Duration::from_secs(2), wait_for(1)).await.unwrap();

        let second = tokio::spawn(app.oneshot(defend_request("{}")));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(started.load(Ordering::SeqCst), 1);

        // 第一个完成后第二个才进入生成
        release.notify_one();
        tokio::time::timeout(Duration::from_secs(2), wait_for(2)).await.unwrap();
        release.notify_one();

        for handle in [first, second] {
            let response = handle.await.unwrap().unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let result: DefenseResult = serde_json::from_slice(&bytes).unwrap();
            assert!(result.success);
        }
    }
}
