//! LLM 客户端
//!
//! 使用 async-openai 访问 OpenAI 兼容接口（默认 ASI:One）

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::debug;

use crate::core::TextGenerator;
use crate::errors::{Result, XBotError};

/// OpenAI 兼容客户端
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIClient {
    /// 创建新的客户端
    pub fn new_with_base_url(
        api_key: String,
        model: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();

        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| XBotError::ConfigError(format!("failed to build HTTP client: {}", e)))?;

        // 重试由 ResponderPolicy 负责，关闭客户端自带的退避重试
        let no_retry = backoff::ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();

        let client = Client::with_config(config)
            .with_http_client(http)
            .with_backoff(no_retry);

        Ok(Self { client, model })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 调用聊天 API
    pub async fn chat(&self, messages: Vec<Message>) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = messages
            .into_iter()
            .map(|msg| match msg.role.as_str() {
                "system" => ChatCompletionRequestSystemMessageArgs::default()
                    .content(msg.content)
                    .build()
                    .map(ChatCompletionRequestMessage::System),
                _ => ChatCompletionRequestUserMessageArgs::default()
                    .content(msg.content)
                    .build()
                    .map(ChatCompletionRequestMessage::User),
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| XBotError::GenerationFailure(format!("failed to build messages: {}", e)))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .build()
            .map_err(|e| XBotError::GenerationFailure(format!("failed to build request: {}", e)))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| XBotError::GenerationFailure(format!("LLM API call failed: {}", e)))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| XBotError::GenerationFailure("LLM returned no content".to_string()))?;

        debug!(model = %self.model, chars = content.chars().count(), "completion received");
        Ok(content)
    }
}

#[async_trait]
impl TextGenerator for OpenAIClient {
    async fn generate(&self, system_prompt: &str, prompt: &str) -> Result<String> {
        self.chat(vec![Message::system(system_prompt), Message::user(prompt)])
            .await
    }
}

/// 消息结构
#[derive(Clone, Debug)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}
