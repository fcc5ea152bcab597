use geo_types::{Coord, LineString, Rect};
use serde::{Deserialize, Serialize};

use crate::entities::coordinates::{bounds, Coordinates};

const METERS_PER_MILE: f64 = 1609.34;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Driving,
    Walking,
    Cycling,
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Driving
    }
}

impl Profile {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Walking => "walking",
            Self::Cycling => "cycling",
        }
    }
}

/// One end of a navigation request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavPoint {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl NavPoint {
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            name: name.into(),
            longitude: coordinates.lng,
            latitude: coordinates.lat,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavigationRequest {
    pub start: NavPoint,
    pub end: NavPoint,
    pub profile: Profile,
}

/// Directions provider result: path geometry, seconds, meters.
#[derive(Clone, Debug, PartialEq)]
pub struct Itinerary {
    pub geometry: LineString<f64>,
    pub duration: f64,
    pub distance: f64,
}

impl Itinerary {
    pub fn formatted_duration(&self) -> String {
        format_duration(self.duration)
    }

    pub fn formatted_distance(&self) -> String {
        format_distance(self.distance)
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        bounds(self.geometry.coords().copied())
    }

    pub fn summary(&self) -> NavigationSummary {
        NavigationSummary {
            time: self.formatted_duration(),
            distance: self.formatted_distance(),
            duration: self.duration,
        }
    }
}

/// What the navigation info box shows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavigationSummary {
    pub time: String,
    pub distance: String,
    pub duration: f64,
}

pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0) as u64;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

pub fn format_distance(meters: f64) -> String {
    format!(
        "{:.2} km ({:.2} mi)",
        meters / 1000.0,
        meters / METERS_PER_MILE
    )
}

impl From<&NavPoint> for Coord<f64> {
    fn from(p: &NavPoint) -> Self {
        p.coordinates().into()
    }
}

#[test]
fn short_walk_formats_minutes_and_both_units() {
    let itinerary = Itinerary {
        geometry: LineString::from(vec![(79.53, 17.98), (79.54, 17.99)]),
        duration: 600.0,
        distance: 800.0,
    };

    assert_eq!(itinerary.formatted_duration(), "10m");
    assert_eq!(itinerary.formatted_distance(), "0.80 km (0.50 mi)");
}

#[test]
fn long_drive_formats_hours() {
    assert_eq!(format_duration(3600.0 + 25.0 * 60.0 + 59.0), "1h 25m");
    assert_eq!(format_duration(59.0), "0m");
    assert_eq!(format_distance(16093.4), "16.09 km (10.00 mi)");
}
