//! Defense Domain Entities
//!
//! Request, result and pipeline outcome types for a single defense cycle

use serde::{Deserialize, Serialize};

/// Hard cap on the generated tweet, in characters
pub const MAX_TWEET_CHARS: usize = 150;

/// Incoming batch of negative sentiment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseRequest {
    #[serde(default, alias = "negativeSocialSentiment")]
    pub negative_social_sentiment: Vec<String>,
    #[serde(default, alias = "negativeReviews")]
    pub negative_reviews: Vec<String>,
    #[serde(default, alias = "negativeRedditThreads")]
    pub negative_reddit_threads: Vec<String>,
}

impl DefenseRequest {
    /// No negative input at all
    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }

    pub fn total_items(&self) -> usize {
        self.negative_social_sentiment.len()
            + self.negative_reviews.len()
            + self.negative_reddit_threads.len()
    }
}

/// Response returned by `POST /defend`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefenseResult {
    pub success: bool,
    pub generated_tweet: String,
    pub tweet_length: usize,
    pub twitter_posted: bool,
    pub twitter_response: Option<String>,
    /// RFC 3339 timestamp
    pub timestamp: String,
    pub agent_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of the primary step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Generated(String),
    Failed(String),
}

/// Outcome of the secondary, best-effort step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostingOutcome {
    Posted { response: String },
    Failed { detail: String },
    /// Nothing was generated, so nothing was posted
    Skipped,
}

impl PostingOutcome {
    pub fn is_posted(&self) -> bool {
        matches!(self, PostingOutcome::Posted { .. })
    }
}

/// Both steps of one defense cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefenseOutcome {
    pub generation: GenerationOutcome,
    pub posting: PostingOutcome,
}

impl DefenseOutcome {
    pub fn generation_failed(detail: impl Into<String>) -> Self {
        Self {
            generation: GenerationOutcome::Failed(detail.into()),
            posting: PostingOutcome::Skipped,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.generation, GenerationOutcome::Generated(_))
    }

    /// Flatten into the wire result
    pub fn into_result(self, agent_address: impl Into<String>, timestamp: impl Into<String>) -> DefenseResult {
        let twitter_posted = self.posting.is_posted();
        let twitter_response = match self.posting {
            PostingOutcome::Posted { response } => Some(response),
            PostingOutcome::Failed { detail } => Some(detail),
            PostingOutcome::Skipped => None,
        };

        let (success, generated_tweet, error) = match self.generation {
            GenerationOutcome::Generated(text) => (true, text, None),
            GenerationOutcome::Failed(detail) => (false, String::new(), Some(detail)),
        };

        DefenseResult {
            success,
            tweet_length: generated_tweet.chars().count(),
            generated_tweet,
            // a failed generation never reports a post
            twitter_posted: success && twitter_posted,
            twitter_response,
            timestamp: timestamp.into(),
            agent_address: agent_address.into(),
            error,
        }
    }
}
