//! Address suggestions built from geocode provider results.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::GeocoderConfig;
use crate::model::{AddressCandidate, GeographicPoint};
use crate::normalize::{NormalizedAddress, normalize};
use crate::ports::{GeocodePort, ProviderPlace, StreetQuery};

const ROAD_FIELD: &str = "road";
const HOUSE_NUMBER_FIELD: &str = "house_number";
const NEIGHBORHOOD_FIELDS: [&str; 3] = ["suburb", "neighbourhood", "quarter"];
const MUNICIPALITY_FIELDS: [&str; 3] = ["city", "town", "municipality"];

/// Turns normalized addresses into filtered, labelled suggestions.
pub struct GeocodeMatcher {
    port: Arc<dyn GeocodePort>,
    config: GeocoderConfig,
}

impl GeocodeMatcher {
    /// Create a matcher over the given provider.
    #[must_use]
    pub fn new(port: Arc<dyn GeocodePort>, config: GeocoderConfig) -> Self {
        Self { port, config }
    }

    /// Suggest addresses for raw user input.
    ///
    /// Inputs shorter than the configured minimum produce no suggestions.
    pub async fn suggest(&self, raw: &str) -> Vec<AddressCandidate> {
        if raw.trim().chars().count() < self.config.min_query_chars {
            return Vec::new();
        }
        self.search(&normalize(raw)).await
    }

    /// Query the provider once per candidate term and refine the combined results.
    ///
    /// Provider failures degrade to an empty list.
    pub async fn search(&self, address: &NormalizedAddress) -> Vec<AddressCandidate> {
        let mut accumulated = Vec::new();

        for term in address.search_terms() {
            let query = self.street_query(term);
            match self.port.search(&query).await {
                Ok(places) => {
                    debug!(term = %query.street, found = places.len(), "provider search");
                    accumulated.extend(places);
                }
                Err(err) => {
                    warn!(error = %err, "geocode provider search failed");
                    return Vec::new();
                }
            }

            if accumulated.len() >= self.config.max_suggestions {
                break;
            }
        }

        self.refine(accumulated, address.house_number.as_deref())
    }

    /// Inject the house number, deduplicate, filter by municipality, truncate and label.
    #[must_use]
    pub fn refine(&self, places: Vec<ProviderPlace>, house_number: Option<&str>) -> Vec<AddressCandidate> {
        let mut seen = HashSet::new();

        places
            .into_iter()
            .map(|place| inject_house_number(place, house_number))
            .filter(|place| seen.insert(place.provider_id.clone()))
            .filter(|place| self.in_municipality(place))
            .filter_map(|place| self.to_candidate(place))
            .take(self.config.max_suggestions)
            .collect()
    }

    /// Describe a point, preferring the provider's reverse lookup.
    ///
    /// Falls back to the formatted coordinates when the provider fails or knows nothing.
    pub async fn reverse_label(&self, point: GeographicPoint) -> String {
        match self.port.reverse(point).await {
            Ok(Some(place)) if !place.display_name.trim().is_empty() => place.display_name,
            Ok(_) => point.label(),
            Err(err) => {
                warn!(error = %err, "reverse geocoding failed");
                point.label()
            }
        }
    }

    fn street_query(&self, street: String) -> StreetQuery {
        StreetQuery {
            street,
            city: self.config.municipality.clone(),
            state: self.config.state.clone(),
            country: self.config.country.clone(),
            viewbox: self.config.viewbox,
            limit: self.config.provider_limit,
        }
    }

    fn in_municipality(&self, place: &ProviderPlace) -> bool {
        if place.address.is_empty() {
            return false;
        }
        let municipality = self.config.municipality.as_str();
        MUNICIPALITY_FIELDS
            .iter()
            .any(|field| place.address.get(*field).is_some_and(|value| value == municipality))
            || place.display_name.contains(municipality)
    }

    fn to_candidate(&self, place: ProviderPlace) -> Option<AddressCandidate> {
        let point = place
            .lat
            .trim()
            .parse::<f64>()
            .ok()
            .zip(place.lon.trim().parse::<f64>().ok())
            .and_then(|(lat, lon)| GeographicPoint::new(lat, lon));

        let Some(point) = point else {
            debug!(id = %place.provider_id, "dropping place with unusable coordinates");
            return None;
        };

        Some(AddressCandidate {
            display_label: format_label(&place.address, &self.config.municipality),
            provider_id: place.provider_id,
            point,
            raw_address_fields: place.address,
        })
    }
}

/// Format `street[, number] - neighborhood - city`, skipping absent parts.
#[must_use]
pub fn format_label(address: &BTreeMap<String, String>, municipality: &str) -> String {
    let mut parts = Vec::with_capacity(3);

    let non_empty = |key: &str| address.get(key).filter(|value| !value.trim().is_empty());

    if let Some(road) = non_empty(ROAD_FIELD) {
        parts.push(match non_empty(HOUSE_NUMBER_FIELD) {
            Some(number) => format!("{road}, {number}"),
            None => road.clone(),
        });
    }

    if let Some(neighborhood) = NEIGHBORHOOD_FIELDS.iter().find_map(|field| non_empty(*field)) {
        parts.push(neighborhood.clone());
    }

    parts.push(municipality.to_owned());
    parts.join(" - ")
}

fn inject_house_number(mut place: ProviderPlace, house_number: Option<&str>) -> ProviderPlace {
    if let Some(number) = house_number {
        let missing = place
            .address
            .get(HOUSE_NUMBER_FIELD)
            .is_none_or(|value| value.trim().is_empty());
        if missing {
            place
                .address
                .insert(HOUSE_NUMBER_FIELD.to_owned(), number.to_owned());
        }
    }
    place
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::ports::PortError;

    struct FakeProvider {
        pages: Mutex<Vec<Result<Vec<ProviderPlace>, PortError>>>,
        queries: Mutex<Vec<String>>,
        reverse: Option<ProviderPlace>,
    }

    impl FakeProvider {
        fn new(pages: Vec<Result<Vec<ProviderPlace>, PortError>>) -> Self {
            Self {
                pages: Mutex::new(pages),
                queries: Mutex::new(Vec::new()),
                reverse: None,
            }
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GeocodePort for FakeProvider {
        async fn search(&self, query: &StreetQuery) -> Result<Vec<ProviderPlace>, PortError> {
            self.queries.lock().unwrap().push(query.street.clone());
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                Ok(Vec::new())
            } else {
                pages.remove(0)
            }
        }

        async fn reverse(&self, _point: GeographicPoint) -> Result<Option<ProviderPlace>, PortError> {
            Ok(self.reverse.clone())
        }
    }

    fn place(id: &str, fields: &[(&str, &str)]) -> ProviderPlace {
        ProviderPlace {
            provider_id: id.to_owned(),
            display_name: format!("place {id}"),
            lat: "-25.4284".to_owned(),
            lon: "-49.2733".to_owned(),
            address: fields
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                .collect(),
        }
    }

    fn curitiba(id: &str) -> ProviderPlace {
        place(id, &[("road", "Rua Carlos de Carvalho"), ("suburb", "Centro"), ("city", "Curitiba")])
    }

    fn matcher(provider: &Arc<FakeProvider>) -> GeocodeMatcher {
        GeocodeMatcher::new(Arc::clone(provider) as Arc<dyn GeocodePort>, GeocoderConfig::default())
    }

    #[tokio::test]
    async fn queries_each_term_with_house_number_prefix() {
        let provider = Arc::new(FakeProvider::new(vec![Ok(vec![curitiba("1")]), Ok(vec![curitiba("2")])]));
        let results = matcher(&provider).suggest("Rua Carlos de Carvalho, 1555").await;

        assert_eq!(
            provider.queries(),
            vec!["1555 Rua Carlos de Carvalho", "1555 Carlos de Carvalho"]
        );
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].display_label, "Rua Carlos de Carvalho, 1555 - Centro - Curitiba");
    }

    #[tokio::test]
    async fn stops_querying_once_enough_results_accumulate() {
        let first_page: Vec<ProviderPlace> = (1..=5).map(|id| curitiba(&id.to_string())).collect();
        let provider = Arc::new(FakeProvider::new(vec![Ok(first_page)]));
        let results = matcher(&provider).suggest("Rua Carlos de Carvalho").await;

        assert_eq!(provider.queries().len(), 1);
        assert_eq!(results.len(), 5);
    }

    #[tokio::test]
    async fn short_queries_do_not_reach_the_provider() {
        let provider = Arc::new(FakeProvider::new(Vec::new()));
        assert!(matcher(&provider).suggest(" ab ").await.is_empty());
        assert!(provider.queries().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_yields_no_suggestions() {
        let provider = Arc::new(FakeProvider::new(vec![
            Ok(vec![curitiba("1")]),
            Err(PortError::Internal("boom".to_owned())),
        ]));
        assert!(matcher(&provider).suggest("Rua Carlos de Carvalho").await.is_empty());
    }

    #[test]
    fn deduplicates_by_provider_id_keeping_first() {
        let provider = Arc::new(FakeProvider::new(Vec::new()));
        let mut duplicate = curitiba("7");
        duplicate.address.insert("road".to_owned(), "Outra Rua".to_owned());

        let results = matcher(&provider).refine(vec![curitiba("7"), curitiba("8"), duplicate], None);
        let ids: Vec<_> = results.iter().map(|candidate| candidate.provider_id.as_str()).collect();
        assert_eq!(ids, vec!["7", "8"]);
        assert!(results[0].display_label.starts_with("Rua Carlos de Carvalho"));
    }

    #[test]
    fn filters_other_municipalities() {
        let provider = Arc::new(FakeProvider::new(Vec::new()));
        let mut by_display = place("3", &[("road", "Rua A"), ("city", "Região Metropolitana")]);
        by_display.display_name = "Rua A, Curitiba, Paraná".to_owned();
        let mut without_address = place("4", &[]);
        without_address.display_name = "Curitiba, Paraná".to_owned();
        let places = vec![
            place("1", &[("road", "Rua A"), ("city", "São José dos Pinhais")]),
            place("2", &[("road", "Rua A"), ("town", "Curitiba")]),
            by_display,
            without_address,
        ];

        let ids: Vec<_> = matcher(&provider)
            .refine(places, None)
            .into_iter()
            .map(|candidate| candidate.provider_id)
            .collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn keeps_provider_house_number_when_present() {
        let provider = Arc::new(FakeProvider::new(Vec::new()));
        let with_number = place("1", &[("road", "Rua A"), ("house_number", "10"), ("city", "Curitiba")]);
        let results = matcher(&provider).refine(vec![with_number], Some("99"));
        assert_eq!(results[0].display_label, "Rua A, 10 - Curitiba");
        assert_eq!(results[0].raw_address_fields.get("house_number").map(String::as_str), Some("10"));
    }

    #[test]
    fn drops_places_with_bad_coordinates() {
        let provider = Arc::new(FakeProvider::new(Vec::new()));
        let mut broken = curitiba("1");
        broken.lat = "north".to_owned();
        assert!(matcher(&provider).refine(vec![broken], None).is_empty());
    }

    #[test]
    fn label_omits_missing_parts() {
        let address: BTreeMap<String, String> = [("quarter", "Batel")]
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value.to_owned()))
            .collect();
        assert_eq!(format_label(&address, "Curitiba"), "Batel - Curitiba");
        assert_eq!(format_label(&BTreeMap::new(), "Curitiba"), "Curitiba");
    }

    #[tokio::test]
    async fn reverse_label_falls_back_to_coordinates() {
        let provider = Arc::new(FakeProvider::new(Vec::new()));
        let point = GeographicPoint::new(-25.4284, -49.2733).unwrap();
        assert_eq!(matcher(&provider).reverse_label(point).await, "-25.42840, -49.27330");

        let mut named = FakeProvider::new(Vec::new());
        named.reverse = Some(place("9", &[]));
        let provider = Arc::new(named);
        assert_eq!(matcher(&provider).reverse_label(point).await, "place 9");
    }
}
