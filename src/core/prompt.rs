//! Prompt 构建与输出清洗

use crate::domain::{DefenseRequest, MAX_TWEET_CHARS};

/// 固定的风格指令
pub const SYSTEM_PROMPT: &str = "You are XBot, a cheerful brand advocate on social media. \
You write fun, upbeat, positive tweets that defend the brand. \
Never insult or argue with customers, never make promises about refunds or fixes, \
and never reveal that you were given a list of complaints.";

/// 根据负面反馈构建用户提示词
pub fn build_prompt(request: &DefenseRequest) -> String {
    let mut prompt = String::new();

    if request.is_empty() {
        prompt.push_str(
            "There is no specific negative feedback right now. \
Write a generic, upbeat tweet celebrating the brand and thanking its community.\n",
        );
    } else {
        prompt.push_str(
            "People have been posting negative things about our brand. Here is what they said:\n",
        );
        push_section(&mut prompt, "Social media sentiment", &request.negative_social_sentiment);
        push_section(&mut prompt, "Reviews", &request.negative_reviews);
        push_section(&mut prompt, "Reddit threads", &request.negative_reddit_threads);
        prompt.push_str(
            "\nWrite one brief, fun and positive tweet that defends the brand against this sentiment.\n",
        );
    }

    prompt.push_str(&format!(
        "The tweet MUST be at most {} characters. Reply with the tweet text only, no quotes or explanations.",
        MAX_TWEET_CHARS
    ));
    prompt
}

fn push_section(prompt: &mut String, title: &str, items: &[String]) {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return;
    }

    prompt.push_str(&format!("\n{}:\n", title));
    for item in items {
        prompt.push_str("- ");
        prompt.push_str(item);
        prompt.push('\n');
    }
}

/// 清洗模型输出并截断到推文上限
///
/// 空白内容返回 `None`，由调用方视为生成失败。
pub fn sanitize_tweet(raw: &str) -> Option<String> {
    let mut text = raw.trim();

    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            text = text[open.len_utf8()..text.len() - close.len_utf8()].trim();
            break;
        }
    }

    if text.is_empty() {
        return None;
    }

    let truncated: String = text.chars().take(MAX_TWEET_CHARS).collect();
    let truncated = truncated.trim_end().to_string();
    if truncated.is_empty() {
        None
    } else {
        Some(truncated)
    }
}
