//! Receipt verification through the Anthropic Messages API.

use crate::config::AnthropicConfig;
use crate::error::{AppError, AppResult};
use crate::models::ReceiptAnalysis;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// What the receipt must show to be accepted.
#[derive(Debug, Clone)]
pub struct ReceiptExpectation {
    pub amount_pesos: i64,
    pub recipient_name: Option<String>,
}

#[derive(Clone)]
pub struct AnthropicClient {
    http: Client,
    cfg: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(cfg: AnthropicConfig) -> Self {
        Self {
            http: Client::new(),
            cfg,
        }
    }

    /// Sends the image to the vision model and parses its verdict.
    ///
    /// Output the model does not format as JSON counts as a rejection
    /// rather than an error, so the receipt row is still written.
    pub async fn analyze_receipt(
        &self,
        image: &[u8],
        media_type: &str,
        expect: &ReceiptExpectation,
    ) -> AppResult<ReceiptAnalysis> {
        let url = format!("{}/v1/messages", self.cfg.base_url.trim_end_matches('/'));
        let body = json!({
            "model": self.cfg.model,
            "max_tokens": self.cfg.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": media_type,
                            "data": STANDARD.encode(image),
                        }
                    },
                    {"type": "text", "text": receipt_prompt(expect)}
                ]
            }]
        });

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.cfg.api_key)
            .header("anthropic-version", &self.cfg.api_version)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            log::error!("Anthropic API error {}: {}", status.as_u16(), text);
            return Err(AppError::ExternalApiError(format!(
                "Receipt analysis failed: HTTP {}",
                status.as_u16()
            )));
        }

        let parsed: MessageResponse = resp.json().await?;
        let text = parsed
            .content
            .into_iter()
            .find(|b| b.kind == "text")
            .and_then(|b| b.text)
            .unwrap_or_else(|| "{}".to_string());

        Ok(parse_analysis(&text))
    }
}

fn receipt_prompt(expect: &ReceiptExpectation) -> String {
    let recipient = match &expect.recipient_name {
        Some(name) => format!("- Recipient name (must be {name})"),
        None => "- Recipient name".to_string(),
    };
    format!(
        "Analyze this GCash receipt. Extract and validate:\n\
         - Amount (must be \u{20b1}{amount})\n\
         - Reference number (format: GCxxxxxx)\n\
         - Date (must be within 7 days)\n\
         {recipient}\n\n\
         Return ONLY JSON:\n\
         {{\n  \"valid\": boolean,\n  \"amount\": \"string\",\n  \"reference\": \"string\",\n  \
         \"date\": \"string\",\n  \"recipient\": \"string\",\n  \"reason\": \"string if invalid\"\n}}",
        amount = expect.amount_pesos,
    )
}

/// Parses the model reply, tolerating markdown code fences.
pub fn parse_analysis(text: &str) -> ReceiptAnalysis {
    let cleaned = text.replace("```json", "").replace("```", "");
    match serde_json::from_str::<ReceiptAnalysis>(cleaned.trim()) {
        Ok(a) => a,
        Err(e) => {
            log::warn!("Unparseable receipt analysis: {e}");
            ReceiptAnalysis::rejected("Could not read the receipt")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> AnthropicClient {
        AnthropicClient::new(AnthropicConfig {
            api_key: "sk-ant-test".into(),
            base_url: base_url.to_string(),
            ..Default::default()
        })
    }

    fn expectation() -> ReceiptExpectation {
        ReceiptExpectation {
            amount_pesos: 299,
            recipient_name: None,
        }
    }

    #[test]
    fn parse_analysis_strips_fences() {
        let a = parse_analysis(
            "```json\n{\"valid\": true, \"amount\": \"299\", \"reference\": \"GC123456\", \"date\": \"2025-10-01\", \"recipient\": \"Clarity\"}\n```",
        );
        assert!(a.valid);
        assert_eq!(a.reference.as_deref(), Some("GC123456"));
    }

    #[test]
    fn parse_analysis_accepts_numeric_amount() {
        let a = parse_analysis(
            r#"{"valid": true, "amount": 299, "reference": "GC123456", "date": "2025-10-01", "recipient": "Clarity"}"#,
        );
        assert!(a.valid);
        assert_eq!(a.amount.as_deref(), Some("299"));
        assert_eq!(a.reason, None);
    }

    #[test]
    fn parse_analysis_rejects_garbage() {
        let a = parse_analysis("I cannot read this image.");
        assert!(!a.valid);
        assert!(a.reason.is_some());
    }

    #[test]
    fn prompt_carries_configured_amount() {
        let p = receipt_prompt(&ReceiptExpectation {
            amount_pesos: 349,
            recipient_name: Some("Clarity PH".into()),
        });
        assert!(p.contains("\u{20b1}349"));
        assert!(p.contains("must be Clarity PH"));
    }

    #[tokio::test]
    async fn analyze_receipt_sends_base64_image_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-sonnet-4-20250514",
                "max_tokens": 1024
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "msg_1",
                "type": "message",
                "role": "assistant",
                "content": [{"type": "text", "text": "{\"valid\": false, \"reason\": \"Amount is 199\"}"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let a = client(&server.uri())
            .analyze_receipt(b"\x89PNG", "image/png", &expectation())
            .await
            .unwrap();
        assert!(!a.valid);
        assert_eq!(a.reason.as_deref(), Some("Amount is 199"));
    }

    #[tokio::test]
    async fn analyze_receipt_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let err = client(&server.uri())
            .analyze_receipt(b"img", "image/jpeg", &expectation())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalApiError(_)));
    }
}
