use std::collections::HashSet;

use chrono::{DateTime, Utc};
use geo_types::{Coord, LineString, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::coordinates::{bounds, is_valid_latitude, is_valid_longitude, Coordinates};
use crate::entities::validate::{finish, is_blank, is_valid_hex_color, Validate};
use crate::error::{Error, FieldError};

pub const DEFAULT_COLOR: &str = "#3b82f6";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub order: i64,
}

impl Waypoint {
    pub fn new(latitude: f64, longitude: f64, order: i64) -> Self {
        Self {
            latitude,
            longitude,
            name: None,
            order,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// (0, 0) marks a waypoint whose position was never filled in.
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewWaypoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

impl From<Waypoint> for NewWaypoint {
    fn from(w: Waypoint) -> Self {
        Self {
            latitude: Some(w.latitude),
            longitude: Some(w.longitude),
            name: w.name,
            order: Some(w.order),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub waypoints: Vec<Waypoint>,
    pub color: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRoute {
    pub name: Option<String>,
    pub description: Option<String>,
    pub waypoints: Option<Vec<NewWaypoint>>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<Vec<NewWaypoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

fn to_waypoints(waypoints: Vec<NewWaypoint>) -> Vec<Waypoint> {
    waypoints
        .into_iter()
        .enumerate()
        .map(|(index, w)| Waypoint {
            latitude: w.latitude.unwrap_or(f64::NAN),
            longitude: w.longitude.unwrap_or(f64::NAN),
            name: w.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            order: w.order.unwrap_or(index as i64),
        })
        .collect()
}

impl Route {
    pub fn new(params: NewRoute) -> Result<Self, Error> {
        let now = Utc::now();

        let route = Self {
            id: Uuid::new_v4(),
            name: params.name.unwrap_or_default().trim().to_string(),
            description: params.description.unwrap_or_default().trim().to_string(),
            waypoints: to_waypoints(params.waypoints.unwrap_or_default()),
            color: params.color.unwrap_or_else(|| DEFAULT_COLOR.into()),
            is_active: params.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        finish(route, vec![])
    }

    /// Returns the updated copy; `self` is left untouched on error.
    pub fn apply(&self, update: RouteUpdate) -> Result<Self, Error> {
        let mut route = self.clone();

        if let Some(name) = update.name {
            route.name = name.trim().to_string();
        }
        if let Some(description) = update.description {
            route.description = description.trim().to_string();
        }
        if let Some(waypoints) = update.waypoints {
            route.waypoints = to_waypoints(waypoints);
        }
        if let Some(color) = update.color {
            route.color = color;
        }
        if let Some(is_active) = update.is_active {
            route.is_active = is_active;
        }
        route.updated_at = Utc::now();

        finish(route, vec![])
    }

    /// Waypoints in path order, independent of storage order.
    pub fn ordered_waypoints(&self) -> Vec<&Waypoint> {
        let mut waypoints: Vec<&Waypoint> = self.waypoints.iter().collect();
        waypoints.sort_by_key(|w| w.order);
        waypoints
    }

    pub fn path(&self) -> LineString<f64> {
        self.ordered_waypoints()
            .into_iter()
            .map(|w| Coord::from(w.coordinates()))
            .collect()
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        bounds(self.waypoints.iter().map(|w| Coord::from(w.coordinates())))
    }
}

impl Validate for Route {
    fn field_errors(&self) -> Vec<FieldError> {
        let mut fields = vec![];

        if is_blank(&self.name) {
            fields.push(FieldError::new("name", "Route name is required"));
        }
        if self.waypoints.len() < 2 {
            fields.push(FieldError::new(
                "waypoints",
                "At least 2 waypoints are required",
            ));
        }
        if !is_valid_hex_color(&self.color) {
            fields.push(FieldError::new("color", "Color must be a hex value like #3b82f6"));
        }

        let mut orders = HashSet::new();
        for (index, w) in self.waypoints.iter().enumerate() {
            let field = format!("waypoints[{}]", index);
            if !is_valid_latitude(w.latitude) || !is_valid_longitude(w.longitude) {
                fields.push(FieldError::new(field, "Valid latitude and longitude are required"));
            } else if w.is_unset() {
                fields.push(FieldError::new(field, "Waypoint coordinates cannot be (0, 0)"));
            } else if !orders.insert(w.order) {
                fields.push(FieldError::new(field, "Waypoint order values must be unique"));
            }
        }

        fields
    }
}

#[cfg(test)]
pub fn sample_route(name: &str, points: &[(f64, f64)]) -> Route {
    Route::new(NewRoute {
        name: Some(name.into()),
        waypoints: Some(
            points
                .iter()
                .map(|&(latitude, longitude)| NewWaypoint {
                    latitude: Some(latitude),
                    longitude: Some(longitude),
                    ..Default::default()
                })
                .collect(),
        ),
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn library_walk_path_follows_order() {
    let route = Route::new(NewRoute {
        name: Some("Library Walk".into()),
        waypoints: Some(vec![
            NewWaypoint {
                latitude: Some(17.98),
                longitude: Some(79.53),
                order: Some(1),
                ..Default::default()
            },
            NewWaypoint {
                latitude: Some(17.99),
                longitude: Some(79.54),
                order: Some(0),
                ..Default::default()
            },
        ]),
        ..Default::default()
    })
    .unwrap();

    let path: Vec<(f64, f64)> = route.path().points().map(|p| p.x_y()).collect();
    assert_eq!(path, vec![(79.54, 17.99), (79.53, 17.98)]);
    assert_eq!(route.color, DEFAULT_COLOR);
}

#[test]
fn missing_order_defaults_to_index() {
    let route = sample_route("Loop", &[(17.98, 79.53), (17.99, 79.54), (17.985, 79.535)]);
    let orders: Vec<i64> = route.waypoints.iter().map(|w| w.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[test]
fn single_waypoint_route_is_rejected() {
    let err = Route::new(NewRoute {
        name: Some("Stub".into()),
        waypoints: Some(vec![NewWaypoint {
            latitude: Some(17.98),
            longitude: Some(79.53),
            ..Default::default()
        }]),
        ..Default::default()
    })
    .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.fields[0].field, "waypoints");
}

#[test]
fn unset_waypoint_and_blank_name_are_rejected() {
    let err = Route::new(NewRoute {
        name: Some("".into()),
        waypoints: Some(vec![
            NewWaypoint {
                latitude: Some(0.0),
                longitude: Some(0.0),
                ..Default::default()
            },
            NewWaypoint {
                latitude: Some(17.99),
                longitude: Some(79.54),
                ..Default::default()
            },
        ]),
        ..Default::default()
    })
    .unwrap_err();

    let fields: Vec<(&str, &str)> = err
        .fields
        .iter()
        .map(|f| (f.field.as_str(), f.message.as_str()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("name", "Route name is required"),
            ("waypoints[0]", "Waypoint coordinates cannot be (0, 0)"),
        ]
    );
}

#[test]
fn update_keeps_untouched_waypoints() {
    let route = sample_route("Hostel Run", &[(17.98, 79.53), (17.99, 79.54)]);

    let updated = route
        .apply(RouteUpdate {
            color: Some("#ff0000".into()),
            ..Default::default()
        })
        .unwrap();

    assert_eq!(updated.waypoints, route.waypoints);
    assert_eq!(updated.color, "#ff0000");
    assert!(route.apply(RouteUpdate {
        waypoints: Some(vec![]),
        ..Default::default()
    })
    .is_err());
}
