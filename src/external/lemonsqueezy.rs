use crate::config::LemonSqueezyConfig;
use crate::error::{AppError, AppResult};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub meta: WebhookMeta,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMeta {
    pub event_name: String,
    #[serde(default)]
    pub custom_data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub id: String,
    #[serde(default)]
    pub attributes: Value,
}

impl WebhookPayload {
    /// Our user id, passed through checkout as custom data.
    pub fn user_id(&self) -> Option<i64> {
        let from_meta = self.meta.custom_data.as_ref().and_then(|c| c.get("user_id"));
        let from_attrs = self.data.attributes.get("custom_data").and_then(|c| c.get("user_id"));
        from_meta.or(from_attrs).and_then(|v| match v {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    SubscriptionCreated {
        user_id: i64,
        subscription_id: String,
    },
    SubscriptionUpdated {
        subscription_id: String,
    },
    SubscriptionCancelled {
        subscription_id: String,
    },
    Ignored(String),
}

#[derive(Clone)]
pub struct LemonSqueezyService {
    cfg: LemonSqueezyConfig,
}

impl LemonSqueezyService {
    pub fn new(cfg: LemonSqueezyConfig) -> Self {
        Self { cfg }
    }

    pub fn amount_cents(&self) -> i64 {
        self.cfg.amount_cents
    }

    pub fn currency(&self) -> &str {
        &self.cfg.currency
    }

    /// Checks `X-Signature`: hex HMAC-SHA256 of the raw body.
    pub fn verify_signature(&self, body: &[u8], signature: &str) -> AppResult<()> {
        if self.cfg.webhook_secret.is_empty() {
            return Err(AppError::ConfigError("LemonSqueezy webhook secret not set".into()));
        }
        let provided = hex::decode(signature.trim())
            .map_err(|_| AppError::AuthError("Invalid signature".into()))?;
        let mut mac = HmacSha256::new_from_slice(self.cfg.webhook_secret.as_bytes())
            .map_err(|e| AppError::InternalError(e.to_string()))?;
        mac.update(body);
        mac.verify_slice(&provided)
            .map_err(|_| AppError::AuthError("Invalid signature".into()))
    }

    pub fn parse_event(&self, body: &[u8]) -> AppResult<WebhookEvent> {
        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| AppError::ValidationError(format!("Invalid webhook payload: {e}")))?;

        let event = match payload.meta.event_name.as_str() {
            "subscription_created" => {
                let user_id = payload.user_id().ok_or_else(|| {
                    AppError::ValidationError("Webhook is missing custom user_id".into())
                })?;
                WebhookEvent::SubscriptionCreated {
                    user_id,
                    subscription_id: payload.data.id,
                }
            }
            "subscription_updated" => WebhookEvent::SubscriptionUpdated {
                subscription_id: payload.data.id,
            },
            "subscription_cancelled" => WebhookEvent::SubscriptionCancelled {
                subscription_id: payload.data.id,
            },
            other => WebhookEvent::Ignored(other.to_string()),
        };
        Ok(event)
    }

    pub fn checkout_url(&self, user_id: i64) -> AppResult<String> {
        if self.cfg.checkout_url.is_empty() {
            return Err(AppError::ConfigError("LemonSqueezy checkout URL not set".into()));
        }
        let sep = if self.cfg.checkout_url.contains('?') { '&' } else { '?' };
        Ok(format!(
            "{}{}checkout%5Bcustom%5D%5Buser_id%5D={}",
            self.cfg.checkout_url, sep, user_id
        ))
    }
}

#[cfg(test)]
pub(crate) fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}
