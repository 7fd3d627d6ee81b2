//! XBot 品牌防御 Agent
//!
//! 接收一批负面舆情，调用 LLM 生成简短的正面回应推文，并尽力发布到推文服务：
//! - 提示词构建与输出清洗（150 字符上限）
//! - 生成 / 发布两步流水线，发布失败不影响生成结果
//! - HTTP 接口 `POST /defend`
//!
//! # 架构分层
//!
//! - `domain`: 请求、结果与 Agent 身份
//! - `core`: 防御流水线
//! - `infrastructure`: LLM、推文服务、Web、日志
//! - `bootstrap`: 启动装配

pub mod bootstrap;
pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod infrastructure;

pub use bootstrap::Launcher;
pub use config::AppConfig;
pub use crate::core::{DefenseResponder, ResponderPolicy, TextGenerator, TweetPoster};
pub use domain::{AgentIdentity, DefenseOutcome, DefenseRequest, DefenseResult, MAX_TWEET_CHARS};
pub use errors::{Result, XBotError};
pub use infrastructure::llm::OpenAIClient;
pub use infrastructure::logger;
pub use infrastructure::twitter::TwitterClient;
pub use infrastructure::web::{create_router, start_web_server, AppState};

/// 版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
