//! 防御响应器
//!
//! 两步流水线：先生成推文（主操作），再尽力发布（次要操作）。
//! 生成失败以结果形式返回，不向调用方抛错；发布失败只记录，不影响 `success`。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::core::prompt::{build_prompt, sanitize_tweet, SYSTEM_PROMPT};
use crate::domain::{
    AgentIdentity, DefenseOutcome, DefenseRequest, DefenseResult, GenerationOutcome,
    PostingOutcome,
};
use crate::errors::{Result, XBotError};

/// 文本生成服务
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String>;
}

/// 推文发布服务
#[async_trait]
pub trait TweetPoster: Send + Sync {
    /// 发布推文，返回服务端原始响应
    async fn post(&self, text: &str) -> Result<String>;
}

/// 外部调用策略
#[derive(Debug, Clone, Copy)]
pub struct ResponderPolicy {
    /// 单次外部调用的超时
    pub call_timeout: Duration,
    /// 生成失败后的额外尝试次数
    pub generation_retries: u32,
    /// 发布失败后的额外尝试次数
    pub posting_retries: u32,
}

impl Default for ResponderPolicy {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            generation_retries: 0,
            posting_retries: 0,
        }
    }
}

/// 防御响应器
///
/// 无跨请求状态，可在多个请求间共享。
#[derive(Clone)]
pub struct DefenseResponder {
    generator: Arc<dyn TextGenerator>,
    poster: Arc<dyn TweetPoster>,
    identity: AgentIdentity,
    policy: ResponderPolicy,
}

impl DefenseResponder {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        poster: Arc<dyn TweetPoster>,
        identity: AgentIdentity,
    ) -> Self {
        Self {
            generator,
            poster,
            identity,
            policy: ResponderPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ResponderPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    pub fn policy(&self) -> &ResponderPolicy {
        &self.policy
    }

    /// 处理一次防御请求
    pub async fn handle(&self, request: &DefenseRequest) -> DefenseResult {
        let outcome = self.run(request).await;
        outcome.into_result(
            self.identity.address.clone(),
            chrono::Utc::now().to_rfc3339(),
        )
    }

    /// 执行生成与发布两步流水线
    pub async fn run(&self, request: &DefenseRequest) -> DefenseOutcome {
        info!(
            items = request.total_items(),
            social = request.negative_social_sentiment.len(),
            reviews = request.negative_reviews.len(),
            reddit = request.negative_reddit_threads.len(),
            "generating defense tweet"
        );

        let prompt = build_prompt(request);
        let tweet = match self.generate(&prompt).await {
            Ok(tweet) => tweet,
            Err(e) => {
                warn!("generation failed: {}", e);
                return DefenseOutcome::generation_failed(e.to_string());
            }
        };
        info!(length = tweet.chars().count(), "defense tweet generated");

        let posting = match self.post(&tweet).await {
            Ok(response) => {
                info!("defense tweet posted");
                PostingOutcome::Posted { response }
            }
            Err(e) => {
                warn!("posting failed, returning tweet anyway: {}", e);
                PostingOutcome::Failed {
                    detail: e.to_string(),
                }
            }
        };

        DefenseOutcome {
            generation: GenerationOutcome::Generated(tweet),
            posting,
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut last_err = None;
        for attempt in 0..=self.policy.generation_retries {
            if attempt > 0 {
                info!(attempt, "retrying generation");
            }
            let result = self
                .with_timeout(self.generator.generate(SYSTEM_PROMPT, prompt))
                .await
                .and_then(|raw| {
                    sanitize_tweet(&raw).ok_or_else(|| {
                        XBotError::GenerationFailure("model returned empty text".to_string())
                    })
                });
            match result {
                Ok(tweet) => return Ok(tweet),
                Err(e) => last_err = Some(e),
            }
        }
        Err(as_generation_failure(last_err))
    }

    async fn post(&self, tweet: &str) -> Result<String> {
        let mut last_err = None;
        for attempt in 0..=self.policy.posting_retries {
            if attempt > 0 {
                info!(attempt, "retrying tweet posting");
            }
            match self.with_timeout(self.poster.post(tweet)).await {
                Ok(response) => return Ok(response),
                Err(e) => last_err = Some(e),
            }
        }
        Err(match last_err {
            Some(e @ XBotError::PostingFailure(_)) => e,
            Some(e) => XBotError::PostingFailure(e.to_string()),
            None => XBotError::PostingFailure("no attempt made".to_string()),
        })
    }

    async fn with_timeout<F>(&self, fut: F) -> Result<String>
    where
        F: std::future::Future<Output = Result<String>>,
    {
        match tokio::time::timeout(self.policy.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(XBotError::Timeout(self.policy.call_timeout)),
        }
    }
}

fn as_generation_failure(err: Option<XBotError>) -> XBotError {
    match err {
        Some(e @ XBotError::GenerationFailure(_)) => e,
        Some(e) => XBotError::GenerationFailure(e.to_string()),
        None => XBotError::GenerationFailure("no attempt made".to_string()),
    }
}
