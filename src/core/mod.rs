//! 核心层：防御流水线
//!
//! 包含提示词构建、输出清洗以及生成/发布两步流水线

pub mod prompt;
pub mod responder;

pub use responder::{DefenseResponder, ResponderPolicy, TextGenerator, TweetPoster};
