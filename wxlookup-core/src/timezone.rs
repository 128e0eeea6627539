//! Mapping coordinates to an IANA timezone identifier.

use std::fmt::Debug;

use thiserror::Error;
use tracing::warn;
use tzf_rs::DefaultFinder;

use crate::{model::Coordinates, time_format::parse_timezone};

/// Identifier returned whenever a coordinate pair cannot be resolved.
pub const FALLBACK_TIMEZONE: &str = "UTC";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TimezoneError {
    #[error("coordinates must contain 'lat' and 'lon' keys")]
    MissingCoordinates,

    #[error("coordinates ({lat}, {lon}) do not correspond to a valid timezone")]
    NoMatch { lat: f64, lon: f64 },

    #[error("timezone '{0}' is not in the IANA database")]
    UnknownZone(String),
}

/// Point-in-polygon lookup from a position to a zone name.
pub trait TimezoneLookup: Send + Sync + Debug {
    fn timezone_at(&self, lat: f64, lng: f64) -> Option<String>;
}

/// Lookup backed by the polygon dataset embedded in `tzf-rs`.
pub struct PolygonLookup {
    finder: DefaultFinder,
}

impl PolygonLookup {
    pub fn new() -> Self {
        Self { finder: DefaultFinder::new() }
    }
}

impl Default for PolygonLookup {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for PolygonLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolygonLookup").finish_non_exhaustive()
    }
}

impl TimezoneLookup for PolygonLookup {
    fn timezone_at(&self, lat: f64, lng: f64) -> Option<String> {
        let name = self.finder.get_tz_name(lng, lat);
        (!name.is_empty()).then(|| name.to_owned())
    }
}

#[derive(Debug)]
pub struct TimezoneResolver {
    lookup: Box<dyn TimezoneLookup>,
}

impl TimezoneResolver {
    pub fn new(lookup: Box<dyn TimezoneLookup>) -> Self {
        Self { lookup }
    }

    /// Resolver using the embedded polygon dataset.
    pub fn polygon() -> Self {
        Self::new(Box::new(PolygonLookup::new()))
    }

    /// Resolve a zone name, reporting why resolution failed.
    pub fn try_resolve(&self, lat: Option<f64>, lon: Option<f64>) -> Result<String, TimezoneError> {
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return Err(TimezoneError::MissingCoordinates);
        };

        let coords = Coordinates::checked(lat, lon).ok_or(TimezoneError::NoMatch { lat, lon })?;

        let name = self
            .lookup
            .timezone_at(coords.latitude, coords.longitude)
            .ok_or(TimezoneError::NoMatch { lat, lon })?;

        parse_timezone(&name).map_err(|_| TimezoneError::UnknownZone(name.clone()))?;

        Ok(name)
    }

    /// Resolve a zone name, falling back to UTC on any failure.
    pub fn resolve(&self, lat: Option<f64>, lon: Option<f64>) -> String {
        self.try_resolve(lat, lon).unwrap_or_else(|err| {
            warn!("Error getting timezone: {err}, reverting to {FALLBACK_TIMEZONE}.");
            FALLBACK_TIMEZONE.to_owned()
        })
    }
}

impl Default for TimezoneResolver {
    fn default() -> Self {
        Self::polygon()
    }
}
