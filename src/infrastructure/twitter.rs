//! 推文发布客户端
//!
//! 把最终推文 POST 到外部发布服务，返回其原始响应

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::core::TweetPoster;
use crate::errors::{Result, XBotError};

#[derive(Serialize)]
struct TweetPayload<'a> {
    text: &'a str,
}

/// 推文发布服务客户端
#[derive(Clone)]
pub struct TwitterClient {
    http: Client,
    endpoint: String,
}

impl TwitterClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| XBotError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// 发布推文
    pub async fn post_tweet(&self, text: &str) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&TweetPayload { text })
            .send()
            .await
            .map_err(|e| XBotError::PostingFailure(format!("request to posting service failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(XBotError::PostingFailure(format!("HTTP {}: {}", status, body)));
        }

        let body = response.text().await.map_err(|e| {
            XBotError::PostingFailure(format!("failed to read posting response: {}", e))
        })?;

        debug!(%status, "posting service accepted tweet");
        Ok(body)
    }
}

#[async_trait]
impl TweetPoster for TwitterClient {
    async fn post(&self, text: &str) -> Result<String> {
        self.post_tweet(text).await
    }
}
