use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub perplexity: PerplexityConfig,
    #[serde(default)]
    pub prokerala: ProkeralaConfig,
    #[serde(default)]
    pub anthropic: AnthropicConfig,
    #[serde(default)]
    pub locationiq: LocationIqConfig,
    #[serde(default)]
    pub lemonsqueezy: LemonSqueezyConfig,
    #[serde(default)]
    pub gcash: GcashConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cron: CronConfig,
    #[serde(default)]
    pub subscription: SubscriptionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerplexityConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for PerplexityConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.perplexity.ai".to_string(),
            model: "sonar-reasoning-pro".to_string(),
            max_tokens: 800,
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProkeralaConfig {
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
    /// Prokerala ayanamsa code, 1 = Lahiri.
    pub ayanamsa: i32,
}

impl Default for ProkeralaConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            base_url: "https://api.prokerala.com".to_string(),
            ayanamsa: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub api_version: String,
    pub max_tokens: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.anthropic.com".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_version: "2023-06-01".to_string(),
            max_tokens: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationIqConfig {
    pub api_key: String,
    pub base_url: String,
}

impl Default for LocationIqConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.locationiq.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LemonSqueezyConfig {
    pub webhook_secret: String,
    pub checkout_url: String,
    pub amount_cents: i64,
    pub currency: String,
}

impl Default for LemonSqueezyConfig {
    fn default() -> Self {
        Self {
            webhook_secret: String::new(),
            checkout_url: String::new(),
            amount_cents: 799,
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GcashConfig {
    /// Whole pesos the receipt must show.
    pub amount_pesos: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    pub max_receipt_bytes: usize,
}

impl Default for GcashConfig {
    fn default() -> Self {
        Self {
            amount_pesos: 299,
            recipient_name: None,
            max_receipt_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub receipts_dir: String,
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            receipts_dir: "./uploads/payment-receipts".to_string(),
            public_base_url: "http://localhost:8080/payment-receipts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CronConfig {
    pub secret: String,
    /// 0 disables the in-process expiry sweep.
    pub expire_interval_secs: u64,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expire_interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    pub trial_messages: i32,
    pub premium_period_days: i64,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            trial_messages: 20,
            premium_period_days: 30,
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn override_string(target: &mut String, name: &str) {
    if let Ok(v) = env::var(name) {
        *target = v;
    }
}

fn override_parse<T: std::str::FromStr>(target: &mut T, name: &str) {
    if let Ok(v) = env::var(name)
        && let Ok(parsed) = v.parse()
    {
        *target = parsed;
    }
}

impl Config {
    pub fn from_toml() -> AppResult<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // No file means env vars and defaults only
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::from_toml_str(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let database_url = get_env("DATABASE_URL").ok_or_else(|| {
                    AppError::ConfigError(
                        "DATABASE_URL is not set and config.toml was not found".to_string(),
                    )
                })?;
                Self::from_env_defaults(database_url)
            }
            Err(e) => {
                return Err(AppError::ConfigError(format!(
                    "Cannot read config file {config_path}: {e}"
                )));
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> AppResult<Self> {
        toml::from_str(config_str)
            .map_err(|e| AppError::ConfigError(format!("Failed to parse config file: {e}")))
    }

    fn from_env_defaults(database_url: String) -> Self {
        Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 8080u16),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
            },
            jwt: JwtConfig {
                secret: get_env("JWT_SECRET")
                    .unwrap_or_else(|| "change-me-in-production".to_string()),
                access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                refresh_token_expires_in: get_env_parse("JWT_REFRESH_EXPIRES_IN", 2_592_000i64),
            },
            perplexity: PerplexityConfig::default(),
            prokerala: ProkeralaConfig::default(),
            anthropic: AnthropicConfig::default(),
            locationiq: LocationIqConfig::default(),
            lemonsqueezy: LemonSqueezyConfig::default(),
            gcash: GcashConfig::default(),
            storage: StorageConfig::default(),
            cron: CronConfig::default(),
            subscription: SubscriptionConfig::default(),
        }
    }

    // Env vars win even when a file exists
    fn apply_env_overrides(&mut self) {
        override_string(&mut self.server.host, "SERVER_HOST");
        override_parse(&mut self.server.port, "SERVER_PORT");
        override_string(&mut self.database.url, "DATABASE_URL");
        override_parse(&mut self.database.max_connections, "DB_MAX_CONNECTIONS");
        override_string(&mut self.jwt.secret, "JWT_SECRET");
        override_parse(&mut self.jwt.access_token_expires_in, "JWT_ACCESS_EXPIRES_IN");
        override_parse(&mut self.jwt.refresh_token_expires_in, "JWT_REFRESH_EXPIRES_IN");

        override_string(&mut self.perplexity.api_key, "PERPLEXITY_API_KEY");
        override_string(&mut self.perplexity.base_url, "PERPLEXITY_BASE_URL");
        override_string(&mut self.perplexity.model, "PERPLEXITY_MODEL");

        override_string(&mut self.prokerala.client_id, "PROKERALA_CLIENT_ID");
        override_string(&mut self.prokerala.client_secret, "PROKERALA_CLIENT_SECRET");
        override_string(&mut self.prokerala.base_url, "PROKERALA_BASE_URL");

        override_string(&mut self.anthropic.api_key, "ANTHROPIC_API_KEY");
        override_string(&mut self.anthropic.base_url, "ANTHROPIC_BASE_URL");
        override_string(&mut self.anthropic.model, "ANTHROPIC_MODEL");

        override_string(&mut self.locationiq.api_key, "LOCATIONIQ_API_KEY");
        override_string(&mut self.locationiq.base_url, "LOCATIONIQ_BASE_URL");

        override_string(&mut self.lemonsqueezy.webhook_secret, "LEMONSQUEEZY_WEBHOOK_SECRET");
        override_string(&mut self.lemonsqueezy.checkout_url, "LEMONSQUEEZY_CHECKOUT_URL");
        override_parse(&mut self.lemonsqueezy.amount_cents, "LEMONSQUEEZY_AMOUNT_CENTS");

        override_parse(&mut self.gcash.amount_pesos, "GCASH_AMOUNT_PESOS");
        if let Ok(v) = env::var("GCASH_RECIPIENT_NAME") {
            self.gcash.recipient_name = Some(v);
        }

        override_string(&mut self.storage.receipts_dir, "RECEIPTS_DIR");
        override_string(&mut self.storage.public_base_url, "RECEIPTS_PUBLIC_BASE_URL");

        override_string(&mut self.cron.secret, "CRON_SECRET");
        override_parse(&mut self.cron.expire_interval_secs, "CRON_EXPIRE_INTERVAL_SECS");

        override_parse(&mut self.subscription.trial_messages, "TRIAL_MESSAGES");
        override_parse(&mut self.subscription.premium_period_days, "PREMIUM_PERIOD_DAYS");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_fills_provider_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "postgres://localhost/clarity"
            max_connections = 5

            [jwt]
            secret = "s3cret"
            access_token_expires_in = 60
            refresh_token_expires_in = 120

            [gcash]
            recipient_name = "Clarity PH"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.perplexity.model, "sonar-reasoning-pro");
        assert_eq!(config.perplexity.max_tokens, 800);
        assert_eq!(config.prokerala.ayanamsa, 1);
        assert_eq!(config.gcash.amount_pesos, 299);
        assert_eq!(config.gcash.recipient_name.as_deref(), Some("Clarity PH"));
        assert_eq!(config.subscription.trial_messages, 20);
        assert_eq!(config.subscription.premium_period_days, 30);
    }

    #[test]
    fn missing_required_section_is_config_error() {
        let err = Config::from_toml_str("[server]\nhost = \"x\"\nport = 1\n").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
