//! Astrology API client.
//!
//! Authenticates with OAuth2 client credentials and keeps the bearer token
//! in memory until it is close to expiring.

use crate::config::ProkeralaConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

// refresh this long before the provider's expiry
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Raw responses for one chart calculation.
#[derive(Debug, Clone)]
pub struct ChartResponses {
    pub birth_details: Value,
    pub navamsa: Value,
    pub dasamsa: Value,
    pub dashas: Value,
}

#[derive(Clone)]
pub struct ProkeralaClient {
    http: Client,
    cfg: ProkeralaConfig,
    token: Arc<RwLock<Option<CachedToken>>>,
}

impl ProkeralaClient {
    pub fn new(cfg: ProkeralaConfig) -> Self {
        Self {
            http: Client::new(),
            cfg,
            token: Arc::new(RwLock::new(None)),
        }
    }

    pub fn ayanamsa(&self) -> i32 {
        self.cfg.ayanamsa
    }

    async fn access_token(&self) -> AppResult<String> {
        {
            let cached = self.token.read().await;
            if let Some(tok) = cached.as_ref()
                && Instant::now() < tok.refresh_at
            {
                return Ok(tok.value.clone());
            }
        }

        let mut guard = self.token.write().await;
        // another request may have refreshed while we waited
        if let Some(tok) = guard.as_ref()
            && Instant::now() < tok.refresh_at
        {
            return Ok(tok.value.clone());
        }

        let url = format!("{}/token", self.base());
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.cfg.client_id.as_str()),
            ("client_secret", self.cfg.client_secret.as_str()),
        ];
        let resp = self.http.post(&url).form(&params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::ExternalApiError(format!(
                "Prokerala token request failed: HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }

        let body: TokenResponse = resp.json().await?;
        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *guard = Some(CachedToken {
            value: body.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(body.access_token)
    }

    fn base(&self) -> &str {
        self.cfg.base_url.trim_end_matches('/')
    }

    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> AppResult<Value> {
        let token = self.access_token().await?;
        let url = format!("{}/{}", self.base(), endpoint);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(params)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::ExternalApiError(format!(
                "Prokerala {} failed: HTTP {}: {}",
                endpoint,
                status.as_u16(),
                text
            )));
        }
        Ok(resp.json().await?)
    }

    /// Runs the four lookups a chart needs. `datetime` is ISO-8601 with offset.
    pub async fn fetch_chart(
        &self,
        latitude: f64,
        longitude: f64,
        datetime: &str,
    ) -> AppResult<ChartResponses> {
        let base_params = vec![
            ("ayanamsa", self.cfg.ayanamsa.to_string()),
            ("coordinates", format!("{},{}", latitude, longitude)),
            ("datetime", datetime.to_string()),
            ("la", "en".to_string()),
        ];

        let birth_details = self.get("v2/astrology/birth-details", &base_params).await?;

        let mut navamsa_params = base_params.clone();
        navamsa_params.push(("chart_type", "navamsa".to_string()));
        let navamsa = self
            .get("v2/astrology/divisional-planet-position", &navamsa_params)
            .await?;

        let mut dasamsa_params = base_params.clone();
        dasamsa_params.push(("chart_type", "dasamsa".to_string()));
        let dasamsa = self
            .get("v2/astrology/divisional-planet-position", &dasamsa_params)
            .await?;

        let mut dasha_params = base_params;
        dasha_params.push(("year_length", "1".to_string()));
        let dashas = self.get("v2/astrology/dasha-periods", &dasha_params).await?;

        Ok(ChartResponses {
            birth_details,
            navamsa,
            dasamsa,
            dashas,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> ProkeralaClient {
        ProkeralaClient::new(ProkeralaConfig {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            base_url: base_url.to_string(),
            ayanamsa: 1,
        })
    }

    async fn mount_token(server: &MockServer, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-1",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn fetch_chart_reuses_cached_token() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;

        Mock::given(method("GET"))
            .and(path("/v2/astrology/birth-details"))
            .and(query_param("coordinates", "14.5995,120.9842"))
            .and(query_param("ayanamsa", "1"))
            .and(query_param("la", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"nakshatra": {"name": "Rohini"}}})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/astrology/divisional-planet-position"))
            .and(query_param("chart_type", "navamsa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chart": "d9"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/astrology/divisional-planet-position"))
            .and(query_param("chart_type", "dasamsa"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"chart": "d10"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/astrology/dasha-periods"))
            .and(query_param("year_length", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"dasha_periods": []})))
            .mount(&server)
            .await;

        let c = client(&server.uri());
        let out = c
            .fetch_chart(14.5995, 120.9842, "1994-08-21T06:45:00+08:00")
            .await
            .unwrap();
        assert_eq!(out.navamsa, json!({"chart": "d9"}));
        assert_eq!(out.dasamsa, json!({"chart": "d10"}));
        assert_eq!(out.birth_details["data"]["nakshatra"]["name"], "Rohini");

        // second run must not hit /token again
        c.fetch_chart(14.5995, 120.9842, "1994-08-21T06:45:00+08:00")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn endpoint_failure_is_external_error() {
        let server = MockServer::start().await;
        mount_token(&server, 1).await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client(&server.uri())
            .fetch_chart(0.0, 0.0, "2000-01-01T00:00:00+00:00")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ExternalApiError(_)));
    }
}
