//! 配置管理
//!
//! 启动时从环境变量（以及 `.env` 文件）读取一次，之后只读共享。

use std::time::Duration;

use crate::errors::{Result, XBotError};

/// 默认的推文发布服务地址
pub const DEFAULT_TWITTER_API_URL: &str =
    "https://twitterapi-739298578243.us-central1.run.app/tweet";

/// ASI:One 的 OpenAI 兼容接口
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.asi1.ai/v1";

pub const DEFAULT_LLM_MODEL: &str = "asi1-mini";

/// 必需的环境变量
const REQUIRED_VARS: [&str; 2] = ["ASI_ONE_API_KEY", "AGENTVERSE_API_KEY"];

/// 应用配置
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// 文本生成服务的 API Key
    pub asi_one_api_key: String,
    /// Agent 注册服务的 API Key
    pub agentverse_api_key: String,
    pub twitter_api_url: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub agent_name: String,
    /// 用于推导 Agent 地址的种子
    pub agent_seed: String,
    pub bind_addr: String,
    /// 单次外部调用的超时（秒）
    pub request_timeout_secs: u64,
    /// 生成失败后的额外重试次数
    pub generation_retries: u32,
    /// 发布失败后的额外重试次数
    pub posting_retries: u32,
    /// 并发请求上限，None 表示不限制
    pub max_concurrent_requests: Option<usize>,
}

impl AppConfig {
    /// 从进程环境读取配置
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取配置
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let missing: Vec<&str> = REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(XBotError::ConfigError(format!(
                "missing required environment variables: {} (set them in the environment or a .env file)",
                missing.join(", ")
            )));
        }

        let config = Self {
            asi_one_api_key: get("ASI_ONE_API_KEY").unwrap_or_default(),
            agentverse_api_key: get("AGENTVERSE_API_KEY").unwrap_or_default(),
            twitter_api_url: get("TWITTER_API_URL")
                .unwrap_or_else(|| DEFAULT_TWITTER_API_URL.to_string()),
            llm_base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            agent_name: get("AGENT_NAME").unwrap_or_else(|| "xbot".to_string()),
            agent_seed: get("AGENT_SEED").unwrap_or_else(|| "xbot brand defender seed".to_string()),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            request_timeout_secs: parse_or(get("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS", 30)?,
            generation_retries: parse_or(get("GENERATION_RETRIES"), "GENERATION_RETRIES", 0)?,
            posting_retries: parse_or(get("POSTING_RETRIES"), "POSTING_RETRIES", 0)?,
            max_concurrent_requests: get("MAX_CONCURRENT_REQUESTS")
                .map(|v| parse_value::<usize>(&v, "MAX_CONCURRENT_REQUESTS"))
                .transpose()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.asi_one_api_key.is_empty() {
            return Err(XBotError::ConfigError("ASI_ONE_API_KEY is required".to_string()));
        }
        if self.agentverse_api_key.is_empty() {
            return Err(XBotError::ConfigError("AGENTVERSE_API_KEY is required".to_string()));
        }

        for (name, value) in [
            ("TWITTER_API_URL", &self.twitter_api_url),
            ("LLM_BASE_URL", &self.llm_base_url),
        ] {
            let parsed = url::Url::parse(value)
                .map_err(|e| XBotError::ConfigError(format!("{} is not a valid URL: {}", name, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(XBotError::ConfigError(format!(
                    "{} must use http or https, got {}",
                    name,
                    parsed.scheme()
                )));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err(XBotError::ConfigError(
                "REQUEST_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_requests == Some(0) {
            return Err(XBotError::ConfigError(
                "MAX_CONCURRENT_REQUESTS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| XBotError::ConfigError(format!("{} has an invalid value: {}", key, value)))
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(v) => parse_value(&v, key),
        None => Ok(default),
    }
}
