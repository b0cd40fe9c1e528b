use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// Vision output is loosely typed: `"amount": 299` and `"amount": "299"` are both seen.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Fields the vision model extracts from a GCash receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReceiptAnalysis {
    #[serde(default)]
    pub valid: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReceiptAnalysis {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadReceiptResponse {
    pub valid: bool,
    pub message: String,
}

// OpenAPI shape of the multipart body
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ReceiptUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub receipt: Vec<u8>,
    #[schema(example = "GC12345678")]
    pub reference_number: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutUrlResponse {
    pub checkout_url: String,
}
