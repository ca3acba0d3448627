//! High-level service facade combining address search and zone lookup.

use std::sync::Arc;

use tracing::info;

use crate::aggregate::{AggregatedSchedule, aggregate};
use crate::config::ScheduleConfig;
use crate::containment::find_containing;
use crate::matcher::GeocodeMatcher;
use crate::model::{AddressCandidate, GeographicPoint, LookupResponse};
use crate::store::{DatasetState, ZoneStore};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Failures surfaced to callers of a lookup.
///
/// A point outside every zone is not an error; it yields an empty [`LookupResponse`].
pub enum LookupError {
    /// The zone dataset could not be loaded.
    #[error("Zone dataset unavailable: {0}")]
    DatasetUnavailable(String),
}

/// Public entry point for address suggestions and schedule lookups.
pub struct ColetaService {
    store: Arc<ZoneStore>,
    matcher: GeocodeMatcher,
    schedule: ScheduleConfig,
}

impl ColetaService {
    /// Create a new service over a zone store and an address matcher.
    #[must_use]
    pub fn new(store: Arc<ZoneStore>, matcher: GeocodeMatcher, schedule: ScheduleConfig) -> Self {
        Self {
            store,
            matcher,
            schedule,
        }
    }

    /// Build the dataset ahead of the first lookup.
    pub async fn warm_up(&self) -> &DatasetState {
        self.store.state().await
    }

    /// Address suggestions for raw user input.
    pub async fn suggest(&self, raw: &str) -> Vec<AddressCandidate> {
        self.matcher.suggest(raw).await
    }

    /// Schedules at a chosen suggestion.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::DatasetUnavailable`] if the zone dataset failed to load.
    pub async fn lookup_candidate(&self, candidate: &AddressCandidate) -> Result<LookupResponse, LookupError> {
        self.lookup_at(candidate.point, candidate.display_label.clone())
            .await
    }

    /// Schedules at a raw point such as a device location, labelled by reverse geocoding.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::DatasetUnavailable`] if the zone dataset failed to load.
    pub async fn lookup_point(&self, point: GeographicPoint) -> Result<LookupResponse, LookupError> {
        self.store.dataset().await?;
        let label = self.matcher.reverse_label(point).await;
        self.lookup_at(point, label).await
    }

    /// Schedules at a point with a caller-supplied address label.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::DatasetUnavailable`] if the zone dataset failed to load.
    pub async fn lookup_at(
        &self,
        point: GeographicPoint,
        resolved_address: String,
    ) -> Result<LookupResponse, LookupError> {
        let dataset = self.store.dataset().await?;
        let results = find_containing(point, &dataset);
        info!(%point, zones = results.len(), "zone lookup");
        Ok(LookupResponse::new(point, resolved_address, results))
    }

    /// Group a response's schedules into collection categories.
    #[must_use]
    pub fn aggregate(&self, response: &LookupResponse) -> AggregatedSchedule {
        aggregate(&response.results, &self.schedule.selective_marker)
    }
}
