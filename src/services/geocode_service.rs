use crate::error::AppResult;
use crate::external::LocationIqClient;
use crate::models::City;

const MIN_QUERY_CHARS: usize = 2;

#[derive(Clone)]
pub struct GeocodeService {
    client: LocationIqClient,
}

impl GeocodeService {
    pub fn new(client: LocationIqClient) -> Self {
        Self { client }
    }

    pub async fn search(&self, query: Option<&str>) -> AppResult<Vec<City>> {
        let q = query.unwrap_or("").trim();
        if q.chars().count() < MIN_QUERY_CHARS {
            return Ok(Vec::new());
        }
        self.client.search_cities(q).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationIqConfig;
    use wiremock::matchers::any;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn short_queries_skip_the_api() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let svc = GeocodeService::new(LocationIqClient::new(LocationIqConfig {
            api_key: "k".into(),
            base_url: server.uri(),
        }));
        assert!(svc.search(Some("a")).await.unwrap().is_empty());
        assert!(svc.search(Some("  ")).await.unwrap().is_empty());
        assert!(svc.search(None).await.unwrap().is_empty());
    }
}
