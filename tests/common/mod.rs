//! 测试通用工具
//!
//! 本地启动 axum 服务，模拟 LLM 接口和推文发布服务

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};

use xbot::AppConfig;

static INIT: Once = Once::new();

/// 初始化测试环境
pub fn setup() {
    INIT.call_once(xbot::logger::try_init);
}

/// 在随机端口上启动服务，返回地址
pub async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // 等待服务器启动
    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

// ==================== 模拟 LLM ====================

/// 模拟 LLM 的行为
#[derive(Clone)]
pub enum LlmBehavior {
    Reply(String),
    /// 返回 400 错误
    Reject,
    /// 返回 500 错误
    Fail,
}

#[derive(Clone)]
pub struct MockLlm {
    behavior: LlmBehavior,
    pub requests: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl MockLlm {
    pub fn replying(content: impl Into<String>) -> Self {
        Self {
            behavior: LlmBehavior::Reply(content.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            behavior: LlmBehavior::Reject,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: LlmBehavior::Fail,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// 启动服务，返回可作为 base URL 的地址
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(self.clone());
        let addr = spawn(app).await;
        format!("http://{}/v1", addr)
    }

    /// 最近一次请求中 user 消息的内容
    pub fn last_user_prompt(&self) -> Option<String> {
        let requests = self.requests.lock().unwrap();
        let last = requests.last()?;
        last["messages"]
            .as_array()?
            .iter()
            .find(|m| m["role"] == "user")
            .and_then(|m| m["content"].as_str())
            .map(str::to_string)
    }
}

async fn chat_completions(
    State(mock): State<MockLlm>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    mock.requests.lock().unwrap().push(body);

    match mock.behavior {
        LlmBehavior::Reply(content) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "created": 1_700_000_000u32,
                "model": "asi1-mini",
                "choices": [{
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop",
                    "logprobs": null
                }]
            })),
        ),
        LlmBehavior::Reject => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": {
                    "message": "model overloaded",
                    "type": "invalid_request_error",
                    "param": null,
                    "code": null
                }
            })),
        ),
        LlmBehavior::Fail => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": {
                    "message": "upstream exploded",
                    "type": "server_error",
                    "param": null,
                    "code": null
                }
            })),
        ),
    }
}

// ==================== 模拟推文服务 ====================

#[derive(Clone)]
pub struct MockTwitter {
    status: StatusCode,
    pub tweets: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl MockTwitter {
    pub fn accepting() -> Self {
        Self::with_status(StatusCode::OK)
    }

    pub fn failing() -> Self {
        Self::with_status(StatusCode::SERVICE_UNAVAILABLE)
    }

    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            tweets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 启动服务，返回完整的发布 URL
    pub async fn start(&self) -> String {
        let app = Router::new()
            .route("/tweet", post(post_tweet))
            .with_state(self.clone());
        let addr = spawn(app).await;
        format!("http://{}/tweet", addr)
    }

    pub fn posted_texts(&self) -> Vec<String> {
        self.tweets
            .lock()
            .unwrap()
            .iter()
            .filter_map(|t| t["text"].as_str().map(str::to_string))
            .collect()
    }
}

async fn post_tweet(
    State(mock): State<MockTwitter>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    mock.tweets.lock().unwrap().push(body);

    if mock.status.is_success() {
        (mock.status, r#"{"success":true,"tweet_id":"1234567890"}"#.to_string())
    } else {
        (mock.status, "posting service unavailable".to_string())
    }
}

// ==================== 配置 ====================

/// 指向模拟服务的配置
pub fn test_config(llm_base_url: &str, twitter_url: &str) -> AppConfig {
    let llm_base_url = llm_base_url.to_string();
    let twitter_url = twitter_url.to_string();
    AppConfig::from_lookup(move |key| match key {
        "ASI_ONE_API_KEY" => Some("test-asi-key".to_string()),
        "AGENTVERSE_API_KEY" => Some("test-agentverse-key".to_string()),
        "LLM_BASE_URL" => Some(llm_base_url.clone()),
        "TWITTER_API_URL" => Some(twitter_url.clone()),
        "REQUEST_TIMEOUT_SECS" => Some("5".to_string()),
        "BIND_ADDR" => Some("127.0.0.1:0".to_string()),
        _ => None,
    })
    .unwrap()
}
