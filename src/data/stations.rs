use serde::Deserialize;

use super::aggregate::StationAggregate;

// ---------------------------------------------------------------------------
// Station locations
// ---------------------------------------------------------------------------

/// Geolocation metadata for one monitoring station, keyed by the same
/// identifier used in the observation table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationLocation {
    pub name: String,
    /// WGS84 latitude.
    pub lat: f64,
    /// WGS84 longitude.
    pub lon: f64,
}

impl StationLocation {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
        }
    }
}

/// The two Beijing sites with known coordinates in the bundled dataset.
pub fn default_locations() -> Vec<StationLocation> {
    vec![
        StationLocation::new("Aotizhongxin", 39.982, 116.417),
        StationLocation::new("Changping", 40.218, 116.231),
    ]
}

/// Ordered station → coordinate lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRegistry {
    locations: Vec<StationLocation>,
}

impl Default for StationRegistry {
    fn default() -> Self {
        Self::new(default_locations())
    }
}

impl StationRegistry {
    pub fn new(locations: Vec<StationLocation>) -> Self {
        Self { locations }
    }

    pub fn find(&self, name: &str) -> Option<&StationLocation> {
        self.locations.iter().find(|l| l.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StationLocation> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Map markers
// ---------------------------------------------------------------------------

/// A circle marker for one station on the map view.
#[derive(Debug, Clone, PartialEq)]
pub struct StationMarker {
    pub location: StationLocation,
    /// The aggregated value the marker represents.
    pub value: f64,
    pub radius: f64,
}

/// One marker per registry station that has a value in `aggregate`, in
/// registry order. Stations missing from the aggregate are skipped; no
/// fallback value is drawn for them.
///
/// Radius is `value / scale` (the source dashboard used a scale of 10).
pub fn station_markers(
    registry: &StationRegistry,
    aggregate: &StationAggregate,
    scale: f64,
) -> Vec<StationMarker> {
    registry
        .iter()
        .filter_map(|loc| {
            let value = aggregate.get(&loc.name)?;
            Some(StationMarker {
                location: loc.clone(),
                value,
                radius: value / scale,
            })
        })
        .collect()
}
