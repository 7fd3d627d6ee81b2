//! # XBot Bootstrap Module
//!
//! Wires configuration, identity and external clients into a running web service

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::AppConfig;
use crate::core::{DefenseResponder, ResponderPolicy};
use crate::domain::{AgentIdentity, MAX_TWEET_CHARS};
use crate::infrastructure::llm::OpenAIClient;
use crate::infrastructure::twitter::TwitterClient;
use crate::infrastructure::web::{start_web_server, ENDPOINTS};

/// Launcher - builds every collaborator once and serves until shutdown
pub struct Launcher {
    config: AppConfig,
}

impl Launcher {
    /// Create a launcher from environment configuration
    pub fn from_env() -> Result<Self> {
        let config = AppConfig::from_env().context("failed to load configuration")?;
        Ok(Self { config })
    }

    /// Create a launcher with custom configuration
    pub fn with_config(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build the responder from configuration
    pub fn build_responder(&self) -> Result<DefenseResponder> {
        let cfg = &self.config;

        let generator = OpenAIClient::new_with_base_url(
            cfg.asi_one_api_key.clone(),
            cfg.llm_model.clone(),
            cfg.llm_base_url.clone(),
            cfg.request_timeout(),
        )?;
        let poster = TwitterClient::new(cfg.twitter_api_url.clone(), cfg.request_timeout())?;
        let identity = AgentIdentity::from_seed(cfg.agent_name.clone(), &cfg.agent_seed);

        Ok(
            DefenseResponder::new(Arc::new(generator), Arc::new(poster), identity).with_policy(
                ResponderPolicy {
                    call_timeout: cfg.request_timeout(),
                    generation_retries: cfg.generation_retries,
                    posting_retries: cfg.posting_retries,
                },
            ),
        )
    }

    /// Build and serve
    pub async fn launch(&self) -> Result<()> {
        info!("🚀 Launching XBot agent...");

        let responder = self.build_responder()?;
        self.log_checklist(responder.identity());

        start_web_server(&self.config, responder).await
    }

    fn log_checklist(&self, identity: &AgentIdentity) {
        let cfg = &self.config;
        info!("🤖 Agent {} at {}", identity.name, identity.address);
        info!("🌐 REST API: http://{}", cfg.bind_addr);
        for endpoint in ENDPOINTS {
            info!("📡 {}", endpoint);
        }
        info!("🧠 LLM: {} via {}", cfg.llm_model, cfg.llm_base_url);
        info!("🐦 Posting service: {}", cfg.twitter_api_url);
        info!("📏 Tweets are limited to {} characters", MAX_TWEET_CHARS);
        info!(
            timeout_secs = cfg.request_timeout_secs,
            generation_retries = cfg.generation_retries,
            posting_retries = cfg.posting_retries,
            max_concurrent_requests = ?cfg.max_concurrent_requests,
            "external call policy"
        );
    }
}
