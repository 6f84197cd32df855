//! Location search: Open-Meteo geocoding plus zip/postal lookup via
//! Zippopotam (third-party, free, no API key).

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::client::{handle_response, MeteoClient};
use crate::error::MeteoError;

/// One location candidate from a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingResult {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    /// State or province
    pub admin1: Option<String>,
    pub timezone: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NameSearchResponse {
    #[serde(default)]
    results: Vec<NameSearchEntry>,
}

#[derive(Debug, Deserialize)]
struct NameSearchEntry {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    admin1: Option<String>,
    timezone: Option<String>,
}

// Zippopotam fields use spaces, and coordinates come back as strings.
#[derive(Debug, Deserialize)]
struct PostalResponse {
    country: Option<String>,
    #[serde(default)]
    places: Vec<PostalPlace>,
}

#[derive(Debug, Deserialize)]
struct PostalPlace {
    #[serde(rename = "place name")]
    place_name: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    state: Option<String>,
}

/// Loose check for whether a query looks like a zip/postal code.
///
/// Intentionally permissive: a false positive only costs an extra
/// postal lookup, because the name search runs alongside it either way.
/// Recognizes US ZIP / ZIP+4, Canadian postal codes, and (very loosely)
/// UK postcodes; German and French 5-digit codes match as US.
pub fn looks_like_postal_code(query: &str) -> bool {
    let clean = compact(query);
    if clean.is_empty() {
        return false;
    }
    // US zip (5 digits or 5+4)
    if clean.chars().all(|c| c.is_ascii_digit()) && (clean.len() == 5 || clean.len() == 9) {
        return true;
    }
    // Canadian postal code (letter-digit pattern)
    if clean.len() == 6 && clean.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return true;
    }
    // UK postcode: 5+ chars starting with a letter, mixing letters and digits
    clean.len() >= 5
        && clean.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && clean.chars().any(|c| c.is_ascii_digit())
}

/// Best-effort ISO country code for a postal-format query. Ambiguous
/// 5-digit formats default to US, the largest user base.
pub fn postal_country(query: &str) -> &'static str {
    let clean = compact(query);
    if clean.chars().all(|c| c.is_ascii_digit()) && (clean.len() == 5 || clean.len() == 9) {
        return "us";
    }
    if clean.len() == 6
        && clean.chars().enumerate().all(|(i, c)| {
            if i % 2 == 0 {
                c.is_ascii_alphabetic()
            } else {
                c.is_ascii_digit()
            }
        })
    {
        return "ca";
    }
    if clean.chars().any(|c| c.is_ascii_alphabetic()) && clean.chars().any(|c| c.is_ascii_digit()) {
        return "gb";
    }
    "us"
}

fn compact(query: &str) -> String {
    query
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect()
}

impl MeteoClient {
    /// Search locations by free-form name or zip/postal code.
    ///
    /// A postal-looking query tries the postal lookup first, then the
    /// name search runs regardless (a zip-shaped string can also be a
    /// place name, and the postal service can miss). Duplicate
    /// coordinates within ~0.01 degrees collapse to the first hit.
    /// Lookup failures are logged and degrade to fewer results.
    #[instrument(skip(self))]
    pub async fn search_locations(&self, query: &str, limit: usize) -> Vec<GeocodingResult> {
        let mut results = Vec::new();

        if looks_like_postal_code(query) {
            let code = compact(query);
            match self.lookup_postal(&code, postal_country(query)).await {
                Ok(Some(result)) => results.push(result),
                Ok(None) => {}
                Err(e) => tracing::warn!("Postal lookup failed for {}: {}", query, e),
            }
        }

        match self.search_by_name(query, limit).await {
            Ok(by_name) => results.extend(by_name),
            Err(e) => tracing::warn!("Name search failed for {}: {}", query, e),
        }

        dedup_by_coordinates(&mut results);
        results.truncate(limit);
        results
    }

    async fn search_by_name(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<GeocodingResult>, MeteoError> {
        let response = self
            .client
            .get(format!("{}/search", self.geocoding_base))
            .query(&[
                ("name", query.to_string()),
                ("count", limit.to_string()),
                ("language", "en".to_string()),
                ("format", "json".to_string()),
            ])
            .send()
            .await?;

        let body: NameSearchResponse = handle_response(response).await?;
        Ok(body
            .results
            .into_iter()
            .map(|entry| GeocodingResult {
                name: entry.name,
                latitude: entry.latitude,
                longitude: entry.longitude,
                country: entry.country,
                admin1: entry.admin1,
                timezone: entry.timezone,
                postal_code: None,
            })
            .collect())
    }

    async fn lookup_postal(
        &self,
        code: &str,
        country: &str,
    ) -> Result<Option<GeocodingResult>, MeteoError> {
        let response = self
            .client
            .get(format!("{}/{}/{}", self.postal_base, country, code))
            .send()
            .await?;

        // Unknown postal codes 404: a miss, not a failure.
        if response.status().as_u16() == 404 {
            return Ok(None);
        }

        let body: PostalResponse = handle_response(response).await?;
        let Some(place) = body.places.into_iter().next() else {
            return Ok(None);
        };
        let (Some(latitude), Some(longitude)) =
            (parse_coord(place.latitude), parse_coord(place.longitude))
        else {
            return Ok(None);
        };

        Ok(Some(GeocodingResult {
            name: place.place_name.unwrap_or_else(|| code.to_string()),
            latitude,
            longitude,
            country: body.country,
            admin1: place.state,
            timezone: None,
            postal_code: Some(code.to_string()),
        }))
    }
}

fn parse_coord(value: Option<String>) -> Option<f64> {
    value.and_then(|v| v.parse().ok())
}

/// Drop later results within ~0.01 degrees of an earlier one.
fn dedup_by_coordinates(results: &mut Vec<GeocodingResult>) {
    let mut seen = std::collections::HashSet::new();
    results.retain(|r| {
        seen.insert((
            (r.latitude * 100.0).round() as i64,
            (r.longitude * 100.0).round() as i64,
        ))
    });
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_postal_detection() {
        assert!(looks_like_postal_code("10001"));
        assert!(looks_like_postal_code("90210-1234"));
        assert!(looks_like_postal_code("M5V 3A8"));
        assert!(looks_like_postal_code("SW1A 1AA"));

        assert!(!looks_like_postal_code("Paris"));
        assert!(!looks_like_postal_code("New York"));
        assert!(!looks_like_postal_code("10"));
        assert!(!looks_like_postal_code(""));
        assert!(!looks_like_postal_code("123456"));
    }

    #[test]
    fn test_postal_country_guess() {
        assert_eq!(postal_country("90210"), "us");
        assert_eq!(postal_country("90210-1234"), "us");
        assert_eq!(postal_country("M5V 3A8"), "ca");
        assert_eq!(postal_country("SW1A 1AA"), "gb");
    }

    fn name_results() -> serde_json::Value {
        serde_json::json!({
            "results": [
                {
                    "name": "Beverly Hills",
                    "latitude": 34.0736,
                    "longitude": -118.4004,
                    "country": "United States",
                    "admin1": "California",
                    "timezone": "America/Los_Angeles"
                },
                {
                    "name": "Beverly Hills",
                    "latitude": 34.09,
                    "longitude": -118.4065,
                    "country": "United States"
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_search_by_name_only() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "Beverly Hills"))
            .respond_with(ResponseTemplate::new(200).set_body_json(name_results()))
            .mount(&mock_server)
            .await;

        let client = MeteoClient::with_base_url(&mock_server.uri(), vec![]);
        let results = client.search_locations("Beverly Hills", 5).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Beverly Hills");
        assert_eq!(results[0].admin1.as_deref(), Some("California"));
        assert!(results[0].postal_code.is_none());
    }

    #[tokio::test]
    async fn test_postal_search_combines_and_dedups() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/us/90210"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "country": "United States",
                "places": [{
                    "place name": "Beverly Hills",
                    "latitude": "34.0901",
                    "longitude": "-118.4065",
                    "state": "California"
                }]
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(name_results()))
            .mount(&mock_server)
            .await;

        let client = MeteoClient::with_base_url(&mock_server.uri(), vec![]);
        let results = client.search_locations("90210", 5).await;

        // Postal hit first, then name results; the second name result
        // shares the postal hit's rounded coordinates and is dropped.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].postal_code.as_deref(), Some("90210"));
        assert_eq!(results[1].latitude, 34.0736);
    }

    #[tokio::test]
    async fn test_unknown_postal_code_falls_back_to_name() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/us/00000"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": []
            })))
            .mount(&mock_server)
            .await;

        let client = MeteoClient::with_base_url(&mock_server.uri(), vec![]);
        let results = client.search_locations("00000", 5).await;

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_limit_is_applied() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(name_results()))
            .mount(&mock_server)
            .await;

        let client = MeteoClient::with_base_url(&mock_server.uri(), vec![]);
        let results = client.search_locations("Beverly Hills", 1).await;

        assert_eq!(results.len(), 1);
    }
}
