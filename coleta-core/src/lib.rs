//! Core types and service wiring for the coleta waste collection lookup.

/// Classification of matched zones into collection categories.
pub mod aggregate;
/// Runtime configuration loaded from TOML.
pub mod config;
/// Point-in-zone tests over the reprojected dataset.
pub mod containment;
/// Zone features and dataset construction from `GeoJSON`.
pub mod dataset;
/// Address search filtering, deduplication and labelling.
pub mod matcher;
/// Domain models shared by all crates.
pub mod model;
/// Street text normalization for geocoder queries.
pub mod normalize;
/// Traits describing the provider interfaces.
pub mod ports;
/// UTM to geographic coordinate conversion.
pub mod reproject;
/// Query sequencing and input debouncing.
pub mod sequence;
/// High-level service facade used by clients.
pub mod service;
/// Memoized, shared access to the zone dataset.
pub mod store;

pub use aggregate::*;
pub use config::*;
pub use containment::*;
pub use dataset::*;
pub use matcher::*;
pub use model::*;
pub use normalize::*;
pub use ports::*;
pub use reproject::*;
pub use sequence::*;
pub use service::*;
pub use store::*;
