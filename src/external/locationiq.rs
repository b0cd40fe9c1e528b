use crate::config::LocationIqConfig;
use crate::error::{AppError, AppResult};
use crate::models::City;
use crate::utils::timezone_at;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Address,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    suburb: Option<String>,
    neighbourhood: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
    name: Option<String>,
}

/// City lookup. Timezones are resolved offline from each hit's coordinates.
#[derive(Clone)]
pub struct LocationIqClient {
    http: Client,
    cfg: LocationIqConfig,
}

impl LocationIqClient {
    pub fn new(cfg: LocationIqConfig) -> Self {
        Self {
            http: Client::new(),
            cfg,
        }
    }

    fn base(&self) -> &str {
        self.cfg.base_url.trim_end_matches('/')
    }

    pub async fn search_cities(&self, query: &str) -> AppResult<Vec<City>> {
        let url = format!("{}/v1/search", self.base());
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("key", self.cfg.api_key.as_str()),
                ("q", query),
                ("format", "json"),
                ("limit", "10"),
                ("addressdetails", "1"),
                ("dedupe", "1"),
            ])
            .send()
            .await?;

        let status = resp.status();
        // no matches come back as 404
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Geocoding failed: HTTP {}",
                status.as_u16()
            )));
        }

        let hits: Vec<SearchHit> = resp.json().await?;
        Ok(hits.into_iter().filter_map(to_city).collect())
    }
}

fn to_city(hit: SearchHit) -> Option<City> {
    let latitude: f64 = hit.lat.parse().ok()?;
    let longitude: f64 = hit.lon.parse().ok()?;
    let timezone = timezone_at(latitude, longitude);
    let a = hit.address;
    let name = a
        .suburb
        .or(a.neighbourhood)
        .or(a.city)
        .or(a.town)
        .or(a.village)
        .or(a.county)
        .or(a.name)
        .or(hit.name)
        .unwrap_or_else(|| hit.display_name.clone());

    Some(City {
        name,
        country: a.country,
        state: a.state,
        latitude,
        longitude,
        timezone,
        display_name: hit.display_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(base_url: &str) -> LocationIqClient {
        LocationIqClient::new(LocationIqConfig {
            api_key: "pk.test".into(),
            base_url: base_url.to_string(),
        })
    }

    #[tokio::test]
    async fn search_maps_hits_with_offline_timezones() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("q", "Quezon"))
            .and(query_param("limit", "10"))
            .and(query_param("dedupe", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "lat": "14.6760",
                    "lon": "121.0437",
                    "display_name": "Quezon City, Metro Manila, Philippines",
                    "address": {"city": "Quezon City", "state": "Metro Manila", "country": "Philippines"}
                },
                {
                    "lat": "13.9",
                    "lon": "122.5",
                    "display_name": "Quezon, Philippines",
                    "address": {"suburb": "Poblacion", "town": "Quezon", "country": "Philippines"}
                }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/timezone"))
            .respond_with(ResponseTemplate::new(429))
            .expect(0)
            .mount(&server)
            .await;

        let cities = client(&server.uri()).search_cities("Quezon").await.unwrap();
        assert_eq!(cities.len(), 2);
        assert_eq!(cities[0].name, "Quezon City");
        assert_eq!(cities[0].timezone, "Asia/Manila");
        assert_eq!(cities[0].state.as_deref(), Some("Metro Manila"));
        // suburb wins over town
        assert_eq!(cities[1].name, "Poblacion");
        assert_eq!(cities[1].timezone, "Asia/Manila");
    }

    #[tokio::test]
    async fn search_not_found_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Unable to geocode"})))
            .mount(&server)
            .await;
        let cities = client(&server.uri()).search_cities("zzzz").await.unwrap();
        assert!(cities.is_empty());
    }
}
