use crate::config::PerplexityConfig;
use crate::error::{AppError, AppResult};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f32,
    search_mode: &'static str,
    web_search_options: WebSearchOptions,
}

#[derive(Debug, Serialize)]
struct WebSearchOptions {
    search_context_size: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    citations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub citations: Option<Vec<String>>,
}

/// Search-augmented chat completions.
#[derive(Clone)]
pub struct PerplexityClient {
    http: Client,
    cfg: PerplexityConfig,
}

impl PerplexityClient {
    pub fn new(cfg: PerplexityConfig) -> Self {
        Self {
            http: Client::new(),
            cfg,
        }
    }

    pub async fn complete(&self, messages: &[ChatTurn]) -> AppResult<Completion> {
        let url = format!("{}/chat/completions", self.cfg.base_url.trim_end_matches('/'));
        let body = CompletionRequest {
            model: &self.cfg.model,
            messages,
            max_tokens: self.cfg.max_tokens,
            temperature: self.cfg.temperature,
            search_mode: "web",
            web_search_options: WebSearchOptions {
                search_context_size: "low",
            },
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            log::error!("Perplexity API error {}: {}", status.as_u16(), text);
            return Err(AppError::ExternalApiError(format!(
                "Perplexity API error: {}",
                status.as_u16()
            )));
        }

        let parsed: CompletionResponse = resp.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::ExternalApiError("Perplexity returned no choices".into()))?;

        let content = strip_reasoning(&choice.message.content);
        if content.is_empty() {
            log::warn!("Perplexity reply had no text outside the reasoning block");
            return Err(AppError::ExternalApiError(
                "Perplexity returned an empty reply".into(),
            ));
        }

        Ok(Completion {
            content,
            citations: parsed.citations,
        })
    }
}

/// Removes `<think>...</think>` blocks emitted by reasoning models. A reply
/// cut off inside a block keeps only the text before the opening tag, and
/// a stray closing tag drops everything up to it.
pub fn strip_reasoning(text: &str) -> String {
    static THINK: OnceLock<Regex> = OnceLock::new();
    let re = THINK.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("think regex is valid"));
    let closed = re.replace_all(text, "");
    let mut rest: &str = &closed;
    if let Some(end) = rest.rfind("</think>") {
        rest = &rest[end + "</think>".len()..];
    }
    if let Some(start) = rest.find("<think>") {
        rest = &rest[..start];
    }
    rest.trim().to_string()
}
