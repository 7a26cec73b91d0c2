//! HazardCast core engine.
//!
//! Estimates comparative wildfire and earthquake risk for fixed sites and
//! routes over a short forecast horizon, from satellite fire detections,
//! a seismic catalog and daily weather.
//!
//! # Architecture
//!
//! This crate holds the computational core and nothing else:
//!
//! - Geo math and GeoJSON normalization (`geo`)
//! - Tagged half-open time windows (`window`) - the leakage guard
//! - Immutable event stores with bulk spatial queries (`event`)
//! - Future-window label generation (`label`)
//! - Past-window feature extraction (`features`)
//! - Probability composition and weather adjustment (`risk`)
//! - Route assignment and accumulation (`route`)
//!
//! Everything here is synchronous and works on in-memory data; file and
//! network I/O (CSV ingestion, weather fetching) belongs to callers. The
//! weather collaborator enters through the [`weather::WeatherProvider`]
//! trait.
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use hazardcast_core::config::HazardConfig;
//! use hazardcast_core::event::{FireEventStore, Site};
//! use hazardcast_core::label::fire_label;
//!
//! let config = HazardConfig::default();
//! let site = Site::new("Los Angeles", 34.0522, -118.2437);
//! let target = Utc.with_ymd_and_hms(2025, 6, 15, 0, 0, 0).unwrap();
//!
//! let store = FireEventStore::new(Vec::new());
//! let (label, metadata) = fire_label(&site, target, &store, &config.fire);
//! assert_eq!(label, 0);
//! assert_eq!(metadata.event_count, 0);
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod features;
pub mod geo;
pub mod label;
pub mod risk;
pub mod route;
pub mod weather;
pub mod window;

// Re-exports for convenience
pub use config::HazardConfig;
pub use error::{CoreError, CoreResult};
pub use event::{FireEventStore, QuakeEventStore, Site, SiteRegistry};
pub use features::{FeatureVector, HazardMode, WeatherMode};
pub use label::LabelMetadata;
pub use risk::SiteRisk;
pub use route::{Hazard, RiskLevel, Route, RoutePoint};
pub use window::{TemporalWindow, WindowKind};
