use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{haversine_km, viewbox, within_radius, Coordinates, Provider};
use crate::config::{GeoConfig, RequestConfig};
use crate::error::{GeoError, GeoResult};

/// Free-text query used to find healthcare facilities.
const PROVIDER_QUERY: &str = "hospital clinic";

/// Maximum results requested from a single search.
const SEARCH_LIMIT: u32 = 30;

/// One search hit as returned by Nominatim (`format=json`).
///
/// Every field is optional so one incomplete hit does not fail the whole
/// response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Place {
    place_id: Option<serde_json::Value>,
    lat: Option<String>,
    lon: Option<String>,
    display_name: Option<String>,
}

impl Place {
    fn coordinates(&self) -> GeoResult<Coordinates> {
        let parse = |field: &str, v: Option<&str>| {
            let v = v.ok_or_else(|| GeoError::InvalidResponse {
                message: format!("Missing '{}'", field),
            })?;
            v.trim().parse::<f64>().map_err(|e| GeoError::InvalidResponse {
                message: format!("Invalid coordinate '{}': {}", v, e),
            })
        };
        Ok(Coordinates::new(
            parse("lat", self.lat.as_deref())?,
            parse("lon", self.lon.as_deref())?,
        ))
    }

    /// Provider for this hit, or the reason it cannot be used.
    fn to_provider(&self, center: Coordinates) -> GeoResult<Provider> {
        let location = self.coordinates()?;
        let id = match &self.place_id {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                return Err(GeoError::InvalidResponse {
                    message: "Missing 'place_id'".to_string(),
                })
            }
        };
        let display_name = self
            .display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| GeoError::InvalidResponse {
                message: format!("Missing 'display_name' for place {}", id),
            })?;

        Ok(Provider {
            name: display_name
                .split(',')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
            address: display_name.to_string(),
            id,
            location,
            distance_km: haversine_km(center, location),
        })
    }
}

/// Client for an OpenStreetMap Nominatim search endpoint
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

impl NominatimClient {
    /// Create a new Nominatim client
    pub fn new(config: &GeoConfig, request_config: &RequestConfig) -> GeoResult<Self> {
        // Nominatim's usage policy requires an identifying User-Agent
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(GeoError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn search(&self, params: &[(&str, String)]) -> GeoResult<Vec<Place>> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(params)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(GeoError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GeoError::InvalidResponse {
                message: format!("Failed to parse search response: {}", e),
            })
    }

    /// Resolve a place name to coordinates (first match)
    pub async fn geocode(&self, query: &str) -> GeoResult<Coordinates> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeoError::NotFound {
                query: query.to_string(),
            });
        }

        let places = self
            .search(&[("format", "json".to_string()), ("q", query.to_string())])
            .await?;

        let place = places.first().ok_or_else(|| GeoError::NotFound {
            query: query.to_string(),
        })?;

        let coordinates = place.coordinates()?;
        debug!(query = %query, lat = coordinates.lat, lon = coordinates.lon, "Geocoded place");
        Ok(coordinates)
    }

    /// Hospitals and clinics within `radius_km` of `center`, nearest first
    pub async fn search_nearby(
        &self,
        center: Coordinates,
        radius_km: f64,
    ) -> GeoResult<Vec<Provider>> {
        let places = self
            .search(&[
                ("format", "json".to_string()),
                ("q", PROVIDER_QUERY.to_string()),
                ("limit", SEARCH_LIMIT.to_string()),
                ("viewbox", viewbox(center, radius_km)),
                ("bounded", "1".to_string()),
            ])
            .await?;

        let mut providers = Vec::with_capacity(places.len());
        for place in &places {
            match place.to_provider(center) {
                Ok(provider) => providers.push(provider),
                Err(e) => warn!(error = %e, "Skipping unusable search result"),
            }
        }

        let providers = within_radius(providers, radius_km);
        info!(
            lat = center.lat,
            lon = center.lon,
            radius_km,
            found = providers.len(),
            "Provider search completed"
        );
        Ok(providers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let config = GeoConfig {
            base_url: "https://nominatim.example.org/".to_string(),
            user_agent: "test-agent".to_string(),
        };
        let client = NominatimClient::new(&config, &RequestConfig::default()).unwrap();
        assert_eq!(client.base_url(), "https://nominatim.example.org");
    }

    #[test]
    fn test_place_coordinates() {
        let place = ruby_hall();
        assert_eq!(place.coordinates().unwrap(), Coordinates::new(18.52, 73.85));

        let bad = Place {
            lat: Some("north".to_string()),
            ..place
        };
        assert!(matches!(
            bad.coordinates(),
            Err(GeoError::InvalidResponse { .. })
        ));
    }

    fn ruby_hall() -> Place {
        Place {
            place_id: Some(serde_json::json!(123)),
            lat: Some("18.52".to_string()),
            lon: Some("73.85".to_string()),
            display_name: Some("Ruby Hall Clinic, Pune".to_string()),
        }
    }

    #[test]
    fn test_to_provider() {
        let provider = ruby_hall().to_provider(Coordinates::new(18.52, 73.85)).unwrap();
        assert_eq!(provider.id, "123");
        assert_eq!(provider.name, "Ruby Hall Clinic");
        assert_eq!(provider.address, "Ruby Hall Clinic, Pune");
        assert_eq!(provider.distance_km, 0.0);
    }

    #[test]
    fn test_to_provider_rejects_incomplete_hits() {
        let center = Coordinates::new(18.52, 73.85);
        let no_id = Place {
            place_id: None,
            ..ruby_hall()
        };
        let no_lon = Place {
            lon: None,
            ..ruby_hall()
        };
        let no_name = Place {
            display_name: None,
            ..ruby_hall()
        };

        for place in [no_id, no_lon, no_name] {
            assert!(matches!(
                place.to_provider(center),
                Err(GeoError::InvalidResponse { .. })
            ));
        }
    }

    #[test]
    fn test_place_missing_fields_deserializes() {
        let places: Vec<Place> =
            serde_json::from_str(r#"[{"lat": "1.0"}, {"place_id": "abc", "lon": "2.0"}]"#).unwrap();
        assert_eq!(places.len(), 2);
        assert!(places[0].place_id.is_none());
        assert_eq!(places[1].place_id, Some(serde_json::json!("abc")));
    }
}
