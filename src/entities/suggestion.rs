use serde::{Deserialize, Serialize};

use crate::entities::{Coordinates, NavPoint, Place};

/// One row of the location search dropdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub name: String,
    pub lng: f64,
    pub lat: f64,
    pub context: String,
    pub is_local: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Suggestion {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }

    pub fn to_nav_point(&self) -> NavPoint {
        NavPoint::new(self.name.clone(), self.coordinates())
    }
}

impl From<&Place> for Suggestion {
    fn from(place: &Place) -> Self {
        Self {
            name: place.name.clone(),
            lng: place.longitude,
            lat: place.latitude,
            context: place.category.label().into(),
            is_local: true,
            description: Some(place.description.clone()).filter(|d| !d.is_empty()),
        }
    }
}
