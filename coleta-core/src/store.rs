//! Shared, build-once access to the zone dataset.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::dataset::{DatasetError, ZoneDataset};
use crate::ports::ZoneSource;
use crate::reproject::UtmProjection;
use crate::service::LookupError;

#[derive(Debug, Clone)]
/// Outcome of the one-time dataset build.
pub enum DatasetState {
    /// Dataset built and ready for queries.
    Ready(Arc<ZoneDataset>),
    /// Dataset could not be built; holds the reason.
    Unavailable(String),
}

/// Builds the dataset on first use and serves it read-only afterwards.
pub struct ZoneStore {
    source: Option<Arc<dyn ZoneSource>>,
    projection: UtmProjection,
    state: OnceCell<DatasetState>,
}

impl ZoneStore {
    /// Create a store that will load and reproject `source` on first use.
    #[must_use]
    pub fn new(source: Arc<dyn ZoneSource>, projection: UtmProjection) -> Self {
        Self {
            source: Some(source),
            projection,
            state: OnceCell::new(),
        }
    }

    /// Create a store around an already built dataset.
    #[must_use]
    pub fn preloaded(dataset: ZoneDataset) -> Self {
        Self {
            source: None,
            projection: UtmProjection::default(),
            state: OnceCell::new_with(Some(DatasetState::Ready(Arc::new(dataset)))),
        }
    }

    /// Dataset state, building it if this is the first call.
    pub async fn state(&self) -> &DatasetState {
        self.state.get_or_init(|| self.build()).await
    }

    /// The ready dataset.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::DatasetUnavailable`] when the build failed.
    pub async fn dataset(&self) -> Result<Arc<ZoneDataset>, LookupError> {
        match self.state().await {
            DatasetState::Ready(dataset) => Ok(Arc::clone(dataset)),
            DatasetState::Unavailable(reason) => Err(LookupError::DatasetUnavailable(reason.clone())),
        }
    }

    async fn build(&self) -> DatasetState {
        let Some(source) = &self.source else {
            return DatasetState::Unavailable("no zone source configured".to_owned());
        };

        info!(source = %source.describe(), "loading zone dataset");
        match self.load(source.as_ref()).await {
            Ok(dataset) => DatasetState::Ready(Arc::new(dataset)),
            Err(err) => {
                error!(source = %source.describe(), error = %err, "zone dataset unavailable");
                DatasetState::Unavailable(err.to_string())
            }
        }
    }

    async fn load(&self, source: &dyn ZoneSource) -> Result<ZoneDataset, DatasetError> {
        let text = source.fetch().await?;
        ZoneDataset::from_geojson(&text, &self.projection)
    }
}
