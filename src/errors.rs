//! 标准化错误处理
//!
//! 定义项目专用的错误类型

use std::time::Duration;

use thiserror::Error;

/// 项目主要错误类型
#[derive(Error, Debug)]
pub enum XBotError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 文本生成失败（LLM 调用失败或返回空内容）
    #[error("Generation failure: {0}")]
    GenerationFailure(String),

    /// 推文发布失败
    #[error("Posting failure: {0}")]
    PostingFailure(String),

    /// 外部调用超时
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// 网络请求错误
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<url::ParseError> for XBotError {
    fn from(err: url::ParseError) -> Self {
        XBotError::ConfigError(err.to_string())
    }
}

/// 项目结果类型别名
pub type Result<T> = std::result::Result<T, XBotError>;
