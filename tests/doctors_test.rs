//! Integration tests for the Nominatim provider search client
//!
//! Tests geocoding and bounded provider search using wiremock.

use serde_json::json;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use womens_health_assessment::config::{GeoConfig, RequestConfig};
use womens_health_assessment::doctors::{viewbox, Coordinates, NominatimClient};
use womens_health_assessment::error::GeoError;

/// Create a test client pointing to mock server
fn create_test_client(base_url: &str) -> NominatimClient {
    let config = GeoConfig {
        base_url: base_url.to_string(),
        user_agent: "womens-health-test/1.0".to_string(),
    };
    let request_config = RequestConfig {
        timeout_ms: 5000,
        max_retries: 0,
        retry_delay_ms: 10,
    };
    NominatimClient::new(&config, &request_config).expect("Failed to create client")
}

#[cfg(test)]
mod geocode_tests {
    use super::*;

    #[tokio::test]
    async fn test_geocode_first_hit() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("format", "json"))
            .and(query_param("q", "Pune"))
            .and(header("User-Agent", "womens-health-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"place_id": 1, "lat": "18.5213738", "lon": "73.8545071", "display_name": "Pune, Maharashtra, India"},
                {"place_id": 2, "lat": "0.0", "lon": "0.0", "display_name": "Elsewhere"}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let center = client.geocode("Pune").await.unwrap();

        assert_eq!(center, Coordinates::new(18.5213738, 73.8545071));
    }

    #[tokio::test]
    async fn test_geocode_no_results() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let result = client.geocode("Atlantis").await;

        match result {
            Err(GeoError::NotFound { query }) => assert_eq!(query, "Atlantis"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_geocode_blank_query_skips_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let result = client.geocode("   ").await;

        assert!(matches!(result, Err(GeoError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_geocode_rate_limited() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let result = client.geocode("Pune").await;

        assert!(matches!(result, Err(GeoError::Api { status: 429, .. })));
    }
}

#[cfg(test)]
mod search_tests {
    use super::*;

    #[tokio::test]
    async fn test_search_nearby_filters_and_sorts() {
        let mock_server = MockServer::start().await;
        let center = Coordinates::new(18.5204, 73.8567);

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "hospital clinic"))
            .and(query_param("limit", "30"))
            .and(query_param("bounded", "1"))
            .and(query_param("viewbox", viewbox(center, 20.0)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "place_id": 300,
                    "lat": "18.60",
                    "lon": "73.90",
                    "display_name": "Aditya Birla Memorial Hospital, Chinchwad, Pune"
                },
                {
                    "place_id": 100,
                    "lat": "18.5300",
                    "lon": "73.8600",
                    "display_name": "Ruby Hall Clinic, Sassoon Road, Pune"
                },
                {
                    "place_id": 999,
                    "lat": "18.9000",
                    "lon": "73.8567",
                    "display_name": "Far Away Hospital, Somewhere"
                }
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let providers = client.search_nearby(center, 20.0).await.unwrap();

        let names: Vec<&str> = providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Ruby Hall Clinic", "Aditya Birla Memorial Hospital"]
        );
        assert_eq!(providers[0].id, "100");
        assert_eq!(providers[0].address, "Ruby Hall Clinic, Sassoon Road, Pune");
        assert!(providers[0].distance_km < providers[1].distance_km);
        assert!(providers.iter().all(|p| p.distance_km <= 20.0));
        assert!(providers[0].travel_minutes() >= 1);
    }

    #[tokio::test]
    async fn test_search_nearby_skips_malformed_hits() {
        let mock_server = MockServer::start().await;
        let center = Coordinates::new(18.5204, 73.8567);

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"place_id": 1, "lat": "not-a-number", "lon": "73.86", "display_name": "Broken Clinic, Pune"},
                {"lat": "18.53", "lon": "73.86", "display_name": "No Id Hospital, Pune"},
                {"place_id": 3, "lat": "18.5300", "lon": "73.8600", "display_name": "Ruby Hall Clinic, Pune"},
                {"place_id": 4, "display_name": "Nowhere Clinic"}
            ])))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let providers = client.search_nearby(center, 20.0).await.unwrap();

        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id, "3");
        assert_eq!(providers[0].name, "Ruby Hall Clinic");
    }

    #[tokio::test]
    async fn test_search_nearby_invalid_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "bad viewbox"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_test_client(&mock_server.uri());
        let result = client
            .search_nearby(Coordinates::new(18.5204, 73.8567), 20.0)
            .await;

        assert!(matches!(result, Err(GeoError::InvalidResponse { .. })));
    }
}
