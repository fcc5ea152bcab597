use uuid::Uuid;

use crate::api::{PlaceAPI, RouteAPI};
use crate::entities::route::DEFAULT_COLOR;
use crate::entities::{
    Category, ContactInfo, Coordinates, NewPlace, NewRoute, OpeningHours, Place, PlaceUpdate,
    Route, RouteUpdate, Waypoint,
};
use crate::error::Error;

/// Route form state, including the click-to-append drawing mode.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteDraft {
    editing: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub color: String,
    waypoints: Vec<Waypoint>,
    drawing: bool,
}

impl Default for RouteDraft {
    fn default() -> Self {
        Self {
            editing: None,
            name: String::new(),
            description: String::new(),
            color: DEFAULT_COLOR.into(),
            waypoints: vec![],
            drawing: false,
        }
    }
}

impl RouteDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored orders may be sparse or 1-based; the draft numbers from 0 so
    /// appended points always land last.
    pub fn edit(route: &Route) -> Self {
        let mut draft = Self {
            editing: Some(route.id),
            name: route.name.clone(),
            description: route.description.clone(),
            color: route.color.clone(),
            waypoints: route.ordered_waypoints().into_iter().cloned().collect(),
            drawing: false,
        };
        draft.renumber();
        draft
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn set_drawing(&mut self, drawing: bool) {
        self.drawing = drawing;
    }

    /// Appends a waypoint while drawing; returns its index.
    pub fn on_map_click(&mut self, at: Coordinates) -> Option<usize> {
        if !self.drawing {
            return None;
        }

        let index = self.waypoints.len();
        self.waypoints.push(Waypoint::new(at.lat, at.lng, index as i64));

        Some(index)
    }

    /// Adds an unset (0, 0) waypoint for manual entry.
    pub fn add_blank(&mut self) -> usize {
        let index = self.waypoints.len();
        self.waypoints.push(Waypoint::new(0.0, 0.0, index as i64));
        index
    }

    pub fn set_waypoint(&mut self, index: usize, at: Coordinates, name: Option<String>) {
        if let Some(waypoint) = self.waypoints.get_mut(index) {
            waypoint.latitude = at.lat;
            waypoint.longitude = at.lng;
            waypoint.name = name.filter(|n| !n.trim().is_empty());
        }
    }

    pub fn remove(&mut self, index: usize) {
        if index < self.waypoints.len() {
            self.waypoints.remove(index);
            self.renumber();
        }
    }

    pub fn move_up(&mut self, index: usize) {
        if index > 0 && index < self.waypoints.len() {
            self.waypoints.swap(index, index - 1);
            self.renumber();
        }
    }

    pub fn move_down(&mut self, index: usize) {
        if index + 1 < self.waypoints.len() {
            self.waypoints.swap(index, index + 1);
            self.renumber();
        }
    }

    fn renumber(&mut self) {
        for (order, waypoint) in self.waypoints.iter_mut().enumerate() {
            waypoint.order = order as i64;
        }
    }

    fn to_new_route(&self) -> NewRoute {
        NewRoute {
            name: Some(self.name.clone()),
            description: Some(self.description.clone()),
            waypoints: Some(self.waypoints.iter().cloned().map(Into::into).collect()),
            color: Some(self.color.clone()),
            is_active: Some(true),
        }
    }

    /// Same rules the store enforces.
    pub fn validate(&self) -> Result<(), Error> {
        Route::new(self.to_new_route()).map(|_| ())
    }

    /// Creates or updates the route, then leaves drawing mode.
    pub async fn submit<A>(&mut self, api: &A) -> Result<Route, Error>
    where
        A: RouteAPI + ?Sized,
    {
        self.validate()?;

        let params = self.to_new_route();
        let route = match self.editing {
            Some(id) => {
                api.update_route(
                    id,
                    RouteUpdate {
                        name: params.name,
                        description: params.description,
                        waypoints: params.waypoints,
                        color: params.color,
                        is_active: None,
                    },
                )
                .await?
            }
            None => api.create_route(params).await?,
        };

        self.editing = Some(route.id);
        self.drawing = false;

        Ok(route)
    }
}

/// Place form state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlaceDraft {
    editing: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub location: Option<Coordinates>,
    pub opening_hours: OpeningHours,
    pub contact_info: ContactInfo,
    pub is_active: bool,
}

impl PlaceDraft {
    pub fn new() -> Self {
        Self {
            is_active: true,
            ..Self::default()
        }
    }

    pub fn edit(place: &Place) -> Self {
        Self {
            editing: Some(place.id),
            name: place.name.clone(),
            description: place.description.clone(),
            category: place.category,
            location: Some(place.coordinates()),
            opening_hours: place.opening_hours.clone(),
            contact_info: place.contact_info.clone(),
            is_active: place.is_active,
        }
    }

    fn to_new_place(&self) -> NewPlace {
        NewPlace {
            name: Some(self.name.clone()),
            description: Some(self.description.clone()),
            category: Some(self.category.name().into()),
            latitude: self.location.map(|c| c.lat),
            longitude: self.location.map(|c| c.lng),
            opening_hours: Some(self.opening_hours.clone()),
            contact_info: Some(self.contact_info.clone()),
            is_active: Some(self.is_active),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        Place::new(self.to_new_place()).map(|_| ())
    }

    pub async fn submit<A>(&mut self, api: &A) -> Result<Place, Error>
    where
        A: PlaceAPI + ?Sized,
    {
        self.validate()?;

        let params = self.to_new_place();
        let place = match self.editing {
            Some(id) => {
                api.update_place(
                    id,
                    PlaceUpdate {
                        name: params.name,
                        description: params.description,
                        category: params.category,
                        latitude: params.latitude,
                        longitude: params.longitude,
                        opening_hours: params.opening_hours,
                        contact_info: params.contact_info,
                        is_active: params.is_active,
                    },
                )
                .await?
            }
            None => api.create_place(params).await?,
        };

        self.editing = Some(place.id);

        Ok(place)
    }
}

#[test]
fn drawing_appends_in_click_order() {
    let mut draft = RouteDraft::new();

    assert_eq!(draft.on_map_click(Coordinates::new(17.98, 79.53)), None);

    draft.set_drawing(true);
    draft.on_map_click(Coordinates::new(17.98, 79.53));
    draft.on_map_click(Coordinates::new(17.985, 79.535));
    draft.on_map_click(Coordinates::new(17.99, 79.54));

    let orders: Vec<(i64, f64)> = draft.waypoints().iter().map(|w| (w.order, w.latitude)).collect();
    assert_eq!(orders, vec![(0, 17.98), (1, 17.985), (2, 17.99)]);
}

#[test]
fn reordering_renumbers_waypoints() {
    let mut draft = RouteDraft::new();
    draft.set_drawing(true);
    for lat in [17.98, 17.985, 17.99] {
        draft.on_map_click(Coordinates::new(lat, 79.53));
    }

    draft.move_up(2);
    draft.move_up(0);
    draft.remove(0);
    draft.move_down(1);

    let orders: Vec<(i64, f64)> = draft.waypoints().iter().map(|w| (w.order, w.latitude)).collect();
    assert_eq!(orders, vec![(0, 17.99), (1, 17.985)]);
}

#[test]
fn drawing_on_an_edited_route_appends_last() {
    use crate::entities::{NewRoute, NewWaypoint};

    let stored = |orders: [i64; 2]| {
        Route::new(NewRoute {
            name: Some("Library Walk".into()),
            waypoints: Some(
                [(17.98, 79.53), (17.99, 79.54)]
                    .iter()
                    .zip(orders)
                    .map(|(&(latitude, longitude), order)| NewWaypoint {
                        latitude: Some(latitude),
                        longitude: Some(longitude),
                        order: Some(order),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        })
        .unwrap()
    };

    for orders in [[1, 2], [10, 20]] {
        let mut draft = RouteDraft::edit(&stored(orders));
        draft.set_drawing(true);
        assert_eq!(draft.on_map_click(Coordinates::new(17.995, 79.545)), Some(2));

        let orders: Vec<i64> = draft.waypoints().iter().map(|w| w.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert!(draft.validate().is_ok());

        let route = Route::new(draft.to_new_route()).unwrap();
        let last = route.path().points().last().unwrap().x_y();
        assert_eq!(last, (79.545, 17.995));
    }
}

#[test]
fn blank_waypoint_fails_validation() {
    let mut draft = RouteDraft::new();
    draft.name = "Hostel Run".into();
    draft.set_drawing(true);
    draft.on_map_click(Coordinates::new(17.98, 79.53));
    let blank = draft.add_blank();

    let err = draft.validate().unwrap_err();
    assert_eq!(err.fields[0].field, format!("waypoints[{}]", blank));

    draft.set_waypoint(blank, Coordinates::new(17.99, 79.54), Some("Hostel".into()));
    assert!(draft.validate().is_ok());
}

#[test]
fn route_submit_creates_then_updates() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use crate::db::MemStore;
    use crate::engine::{fakes::TableGeocoder, Engine};

    let engine = Engine::new(Arc::new(MemStore::new()), Arc::new(TableGeocoder::default()));
    let mut draft = RouteDraft::new();
    draft.name = "Library Walk".into();
    draft.set_drawing(true);
    draft.on_map_click(Coordinates::new(17.98, 79.53));
    draft.on_map_click(Coordinates::new(17.99, 79.54));

    let created = block_on(draft.submit(&engine)).unwrap();
    assert!(!draft.is_drawing());

    draft.color = "#ff5722".into();
    let updated = block_on(draft.submit(&engine)).unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.color, "#ff5722");
    assert_eq!(block_on(engine.list_routes()).unwrap().len(), 1);
}

#[test]
fn place_draft_needs_a_location() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use crate::db::MemStore;
    use crate::engine::{fakes::TableGeocoder, Engine};

    let engine = Engine::new(Arc::new(MemStore::new()), Arc::new(TableGeocoder::default()));
    let mut draft = PlaceDraft::new();
    draft.name = "Post Office".into();

    let err = block_on(draft.submit(&engine)).unwrap_err();
    assert!(err.is_validation());

    draft.location = Some(Coordinates::new(17.9829, 79.5321));
    let place = block_on(draft.submit(&engine)).unwrap();
    assert_eq!(place.category, Category::Other);

    let edit = PlaceDraft::edit(&place);
    assert_eq!(edit.location, Some(place.coordinates()));
}
