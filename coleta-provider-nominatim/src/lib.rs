//! Geocode provider backed by the OpenStreetMap Nominatim API, plus an HTTP zone source.

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::debug;

use coleta_core::{
    model::GeographicPoint,
    ports::{GeocodePort, PortError, ProviderPlace, StreetQuery, ZoneSource},
};

/// Single place from /search or /reverse
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    // integer on the public instance, string on some mirrors
    place_id: JsonValue,

    #[serde(default)]
    display_name: String,

    lat: String,
    lon: String,

    #[serde(default)]
    address: BTreeMap<String, JsonValue>,
}

impl From<NominatimPlace> for ProviderPlace {
    fn from(place: NominatimPlace) -> Self {
        let provider_id = match place.place_id {
            JsonValue::String(id) => id,
            other => other.to_string(),
        };

        // drop non-string entries such as nested ISO codes
        let address = place
            .address
            .into_iter()
            .filter_map(|(key, value)| match value {
                JsonValue::String(text) => Some((key, text)),
                _ => None,
            })
            .collect();

        Self {
            provider_id,
            display_name: place.display_name,
            lat: place.lat,
            lon: place.lon,
            address,
        }
    }
}

/// Street search and reverse geocoding through Nominatim.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    /// Create a geocoder bound to the given HTTP client and instance URL.
    ///
    /// The client should carry a descriptive `User-Agent`; the public instance rejects anonymous clients.
    #[must_use]
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl GeocodePort for NominatimGeocoder {
    async fn search(&self, query: &StreetQuery) -> Result<Vec<ProviderPlace>, PortError> {
        if query.limit == 0 || query.is_empty() {
            return Ok(Vec::new());
        }

        let limit = query.limit.to_string();
        let viewbox = format_viewbox(query.viewbox);

        let req = self.client.get(format!("{}/search", self.base_url)).query(&[
            ("format", "json"),
            ("street", query.street.trim()),
            ("city", query.city.as_str()),
            ("state", query.state.as_str()),
            ("country", query.country.as_str()),
            ("limit", limit.as_str()),
            ("addressdetails", "1"),
            ("bounded", "1"),
            ("viewbox", viewbox.as_str()),
        ]);

        let body = fetch_json::<JsonValue>(req).await?;
        let places = parse_search(body)?;
        debug!(street = %query.street, found = places.len(), "nominatim search");
        Ok(places)
    }

    async fn reverse(&self, point: GeographicPoint) -> Result<Option<ProviderPlace>, PortError> {
        let lat = point.latitude().to_string();
        let lon = point.longitude().to_string();

        let req = self.client.get(format!("{}/reverse", self.base_url)).query(&[
            ("format", "json"),
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("addressdetails", "1"),
        ]);

        parse_reverse(fetch_json::<JsonValue>(req).await?)
    }
}

/// Zone source downloading the `GeoJSON` document over HTTP.
pub struct HttpZoneSource {
    client: Client,
    url: String,
}

impl HttpZoneSource {
    /// Create a source for the given URL.
    #[must_use]
    pub fn new(client: Client, url: &str) -> Self {
        Self {
            client,
            url: url.to_owned(),
        }
    }
}

#[async_trait]
impl ZoneSource for HttpZoneSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<String, PortError> {
        Ok(self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?)
    }
}

fn format_viewbox(viewbox: [f64; 4]) -> String {
    viewbox
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_search(body: JsonValue) -> Result<Vec<ProviderPlace>, PortError> {
    let places: Vec<NominatimPlace> = serde_json::from_value(body)?;
    Ok(places.into_iter().map(ProviderPlace::from).collect())
}

// Nominatim answers an unknown location with `{"error": "Unable to geocode"}`
fn parse_reverse(body: JsonValue) -> Result<Option<ProviderPlace>, PortError> {
    if body.get("error").is_some() {
        return Ok(None);
    }
    let place: NominatimPlace = serde_json::from_value(body)?;
    Ok(Some(place.into()))
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, PortError> {
    req.send()
        .await
        .map_err(PortError::from)?
        .error_for_status()
        .map_err(PortError::from)?
        .json()
        .await
        .map_err(PortError::from)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_search_results_with_address_details() {
        let body = json!([{
            "place_id": 123_456,
            "display_name": "Rua XV de Novembro, Centro, Curitiba, Paraná, Brasil",
            "lat": "-25.4296",
            "lon": "-49.2713",
            "address": {
                "road": "Rua XV de Novembro",
                "suburb": "Centro",
                "city": "Curitiba",
                "ISO3166-2-lvl4": "BR-PR",
                "extra": { "nested": true }
            }
        }]);

        let places = parse_search(body).unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(places[0].provider_id, "123456");
        assert_eq!(places[0].lat, "-25.4296");
        assert_eq!(places[0].address.get("suburb").map(String::as_str), Some("Centro"));
        assert!(!places[0].address.contains_key("extra"));
    }

    #[test]
    fn empty_search_yields_no_places() {
        assert!(parse_search(json!([])).unwrap().is_empty());
    }

    #[test]
    fn malformed_search_is_a_parse_error() {
        let err = parse_search(json!({ "unexpected": "object" })).unwrap_err();
        assert!(matches!(err, PortError::Parse(_)));
    }

    #[test]
    fn reverse_error_body_means_no_place() {
        let body = json!({ "error": "Unable to geocode" });
        assert!(parse_reverse(body).unwrap().is_none());
    }

    #[test]
    fn reverse_keeps_string_place_ids() {
        let body = json!({
            "place_id": "way/42",
            "display_name": "Praça Tiradentes, Curitiba",
            "lat": "-25.4278",
            "lon": "-49.2707"
        });
        let place = parse_reverse(body).unwrap().unwrap();
        assert_eq!(place.provider_id, "way/42");
        assert!(place.address.is_empty());
    }

    #[test]
    fn viewbox_is_comma_joined() {
        assert_eq!(format_viewbox([-49.45, -25.25, -49.1, -25.65]), "-49.45,-25.25,-49.1,-25.65");
    }
}
