use geo_types::{Coord, LineString, Rect};
use uuid::Uuid;

use crate::client::editor::RouteDraft;
use crate::client::pick::{LocationPicker, PickedLocation};
use crate::config::Config;
use crate::entities::coordinates::bounds;
use crate::entities::{Category, Coordinates, NavigationRequest, NavigationSummary, Place, Route};
use crate::error::Error;
use crate::external::DirectionsProvider;

pub const ALL_ROUTES_PADDING: u32 = 50;
pub const SELECTED_ROUTE_PADDING: u32 = 100;
pub const NAVIGATION_PADDING: u32 = 100;

pub const NAV_ROUTE_ID: &str = "nav-route";
pub const NAV_START_COLOR: &str = "#4CAF50";
pub const NAV_END_COLOR: &str = "#f44336";
pub const NAV_LINE_COLOR: &str = "#667eea";
pub const NAV_FAILURE: &str = "Failed to calculate route. Please try again.";

pub const DEFAULT_PIN: &str = "📍";

pub fn category_icon(category: Category) -> &'static str {
    match category {
        Category::Eateries => "🍽️",
        Category::Recreation => "⚽",
        Category::Educational => "📚",
        Category::Administration => "🏛️",
        Category::StaffQuarters => "🏠",
        Category::Hostel => "🏘️",
        Category::Library => "📖",
        Category::Other => DEFAULT_PIN,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MarkerStyle {
    Icon(&'static str),
    Dot { color: String, highlighted: bool },
    Pin { color: &'static str },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
    pub id: String,
    pub at: Coordinates,
    pub style: MarkerStyle,
    pub popup: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LineStyle {
    pub color: String,
    pub width: f64,
    pub opacity: f64,
}

/// Drawing primitives of the map render SDK.
pub trait MapSurface {
    fn add_marker(&mut self, marker: Marker);
    fn remove_marker(&mut self, id: &str);
    /// Replaces any line already drawn under `id`.
    fn draw_line(&mut self, id: &str, path: &LineString<f64>, style: LineStyle);
    fn remove_line(&mut self, id: &str);
    fn fit_bounds(&mut self, bounds: Rect<f64>, padding: u32);
    fn alert(&mut self, message: &str);
    /// Blocking error panel shown in place of the map.
    fn show_error(&mut self, message: &str);
}

impl<S: MapSurface + ?Sized> MapSurface for &mut S {
    fn add_marker(&mut self, marker: Marker) {
        (**self).add_marker(marker)
    }

    fn remove_marker(&mut self, id: &str) {
        (**self).remove_marker(id)
    }

    fn draw_line(&mut self, id: &str, path: &LineString<f64>, style: LineStyle) {
        (**self).draw_line(id, path, style)
    }

    fn remove_line(&mut self, id: &str) {
        (**self).remove_line(id)
    }

    fn fit_bounds(&mut self, bounds: Rect<f64>, padding: u32) {
        (**self).fit_bounds(bounds, padding)
    }

    fn alert(&mut self, message: &str) {
        (**self).alert(message)
    }

    fn show_error(&mut self, message: &str) {
        (**self).show_error(message)
    }
}

/// Result of a click on the bare map.
#[derive(Clone, Debug, PartialEq)]
pub enum MapClick {
    Picked(PickedLocation),
    /// Index of the waypoint appended to the draft.
    Waypoint(usize),
    Ignored,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlaceClick {
    Picked(PickedLocation),
    Details(Place),
    Unknown,
}

pub fn route_line_id(id: Uuid) -> String {
    format!("route-{}", id)
}

fn popup_excerpt(place: &Place) -> String {
    if place.description.is_empty() {
        return place.name.clone();
    }

    let excerpt: String = place.description.chars().take(50).collect();
    format!("{}\n{}...", place.name, excerpt)
}

/// Keeps a map surface in step with the place list, the route list and its
/// selection, and the active navigation result.
pub struct AnnotationLayer<S: MapSurface> {
    surface: S,
    places: Vec<Place>,
    place_markers: Vec<String>,
    route_markers: Vec<String>,
    route_lines: Vec<String>,
    nav_markers: Vec<String>,
    nav_drawn: bool,
    nav_summary: Option<NavigationSummary>,
}

impl<S: MapSurface> AnnotationLayer<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            places: vec![],
            place_markers: vec![],
            route_markers: vec![],
            route_lines: vec![],
            nav_markers: vec![],
            nav_drawn: false,
            nav_summary: None,
        }
    }

    /// The map cannot start without a Mapbox token; the error panel takes
    /// its place and the config error is returned.
    pub fn init(mut surface: S, config: &Config) -> Result<Self, Error> {
        if let Err(err) = config.require_mapbox_token() {
            tracing::error!(error = %err, "map failed to initialize");
            surface.show_error(&err.message);
            return Err(err);
        }

        Ok(Self::new(surface))
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn navigation_summary(&self) -> Option<&NavigationSummary> {
        self.nav_summary.as_ref()
    }

    pub fn show_places(&mut self, places: &[Place]) {
        for id in self.place_markers.drain(..) {
            self.surface.remove_marker(&id);
        }

        self.places = places.iter().filter(|p| p.is_active).cloned().collect();

        for place in &self.places {
            let id = format!("place-{}", place.id);
            self.surface.add_marker(Marker {
                id: id.clone(),
                at: place.coordinates(),
                style: MarkerStyle::Icon(category_icon(place.category)),
                popup: popup_excerpt(place),
            });
            self.place_markers.push(id);
        }
    }

    /// Rebuilds every route marker and line. With no selection all lines are
    /// drawn and the view spans every route; with one, only its line is drawn
    /// and the view fits to it.
    pub fn show_routes(&mut self, routes: &[Route], selected: Option<Uuid>) {
        for id in self.route_markers.drain(..) {
            self.surface.remove_marker(&id);
        }
        for id in self.route_lines.drain(..) {
            self.surface.remove_line(&id);
        }

        let routes: Vec<&Route> = routes.iter().filter(|r| r.is_active).collect();

        for route in &routes {
            let is_selected = selected == Some(route.id);

            for (index, waypoint) in route.waypoints.iter().enumerate() {
                let id = format!("route-{}-{}", route.id, index);
                let label = waypoint
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("Point {}", index + 1));

                self.surface.add_marker(Marker {
                    id: id.clone(),
                    at: waypoint.coordinates(),
                    style: MarkerStyle::Dot {
                        color: route.color.clone(),
                        highlighted: is_selected,
                    },
                    popup: format!("{}\nRoute: {}", label, route.name),
                });
                self.route_markers.push(id);
            }

            if route.waypoints.len() >= 2 && (selected.is_none() || is_selected) {
                let id = route_line_id(route.id);
                let (width, opacity) = if is_selected { (6.0, 1.0) } else { (4.0, 0.7) };

                self.surface.draw_line(
                    &id,
                    &route.path(),
                    LineStyle {
                        color: route.color.clone(),
                        width,
                        opacity,
                    },
                );
                self.route_lines.push(id);
            }
        }

        let fit = match selected {
            None => {
                let points = routes
                    .iter()
                    .flat_map(|r| r.waypoints.iter().map(|w| Coord::from(w.coordinates())));
                bounds(points).map(|b| (b, ALL_ROUTES_PADDING))
            }
            Some(id) => routes
                .iter()
                .find(|r| r.id == id)
                .and_then(|r| r.bounds())
                .map(|b| (b, SELECTED_ROUTE_PADDING)),
        };

        if let Some((bounds, padding)) = fit {
            self.surface.fit_bounds(bounds, padding);
        }
    }

    pub fn clear_navigation(&mut self) {
        for id in self.nav_markers.drain(..) {
            self.surface.remove_marker(&id);
        }
        if self.nav_drawn {
            self.surface.remove_line(NAV_ROUTE_ID);
            self.nav_drawn = false;
        }
        self.nav_summary = None;
    }

    /// Replaces any previous navigation result. On failure the user is
    /// alerted and no path is left on the map.
    pub async fn show_navigation<D>(
        &mut self,
        request: &NavigationRequest,
        directions: &D,
    ) -> Result<NavigationSummary, Error>
    where
        D: DirectionsProvider + ?Sized,
    {
        self.clear_navigation();

        for (id, point, color, title) in [
            ("nav-start", &request.start, NAV_START_COLOR, "Start"),
            ("nav-end", &request.end, NAV_END_COLOR, "End"),
        ] {
            self.surface.add_marker(Marker {
                id: id.into(),
                at: point.coordinates(),
                style: MarkerStyle::Pin { color },
                popup: format!("{}\n{}", title, point.name),
            });
            self.nav_markers.push(id.into());
        }

        let itinerary = match directions
            .directions(
                request.start.coordinates(),
                request.end.coordinates(),
                request.profile,
            )
            .await
        {
            Ok(itinerary) => itinerary,
            Err(err) => {
                tracing::warn!(error = %err, "directions failed");
                self.surface.alert(NAV_FAILURE);
                return Err(err);
            }
        };

        self.surface.draw_line(
            NAV_ROUTE_ID,
            &itinerary.geometry,
            LineStyle {
                color: NAV_LINE_COLOR.into(),
                width: 6.0,
                opacity: 0.8,
            },
        );
        self.nav_drawn = true;

        if let Some(bounds) = itinerary.bounds() {
            self.surface.fit_bounds(bounds, NAVIGATION_PADDING);
        }

        let summary = itinerary.summary();
        self.nav_summary = Some(summary.clone());

        Ok(summary)
    }

    /// A pending pick takes priority over the route drawing mode.
    pub fn on_map_click(
        &mut self,
        picker: &mut LocationPicker,
        draft: Option<&mut RouteDraft>,
        at: Coordinates,
    ) -> MapClick {
        if let Some(picked) = picker.resolve(at, None) {
            return MapClick::Picked(picked);
        }

        match draft.and_then(|d| d.on_map_click(at)) {
            Some(index) => MapClick::Waypoint(index),
            None => MapClick::Ignored,
        }
    }

    /// A pending pick takes priority over opening the place details.
    pub fn on_place_click(&mut self, picker: &mut LocationPicker, id: Uuid) -> PlaceClick {
        let place = match self.places.iter().find(|p| p.id == id) {
            Some(place) => place,
            None => return PlaceClick::Unknown,
        };

        match picker.resolve(place.coordinates(), Some(&place.name)) {
            Some(picked) => PlaceClick::Picked(picked),
            None => PlaceClick::Details(place.clone()),
        }
    }
}

#[cfg(test)]
#[derive(Debug, PartialEq)]
enum Call {
    AddMarker(String),
    RemoveMarker(String),
    DrawLine(String, Vec<(f64, f64)>, LineStyle),
    RemoveLine(String),
    Fit(Rect<f64>, u32),
    Alert(String),
    ErrorPanel(String),
}

#[cfg(test)]
#[derive(Default)]
struct Recorder {
    calls: Vec<Call>,
}

#[cfg(test)]
impl Recorder {
    fn lines(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::DrawLine(..)))
            .collect()
    }

    fn last_fit(&self) -> Option<(Rect<f64>, u32)> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Fit(rect, padding) => Some((*rect, *padding)),
            _ => None,
        })
    }
}

#[cfg(test)]
impl MapSurface for Recorder {
    fn add_marker(&mut self, marker: Marker) {
        self.calls.push(Call::AddMarker(marker.id));
    }

    fn remove_marker(&mut self, id: &str) {
        self.calls.push(Call::RemoveMarker(id.into()));
    }

    fn draw_line(&mut self, id: &str, path: &LineString<f64>, style: LineStyle) {
        let points = path.points().map(|p| p.x_y()).collect();
        self.calls.push(Call::DrawLine(id.into(), points, style));
    }

    fn remove_line(&mut self, id: &str) {
        self.calls.push(Call::RemoveLine(id.into()));
    }

    fn fit_bounds(&mut self, bounds: Rect<f64>, padding: u32) {
        self.calls.push(Call::Fit(bounds, padding));
    }

    fn alert(&mut self, message: &str) {
        self.calls.push(Call::Alert(message.into()));
    }

    fn show_error(&mut self, message: &str) {
        self.calls.push(Call::ErrorPanel(message.into()));
    }
}

#[test]
fn selection_narrows_lines_and_bounds() {
    use crate::entities::route::sample_route;
    use geo_types::coord;

    let walk = sample_route("Library Walk", &[(17.98, 79.53), (17.99, 79.54)]);
    let run = sample_route("Hostel Run", &[(17.97, 79.52), (17.975, 79.525)]);
    let routes = vec![walk.clone(), run.clone()];

    let mut layer = AnnotationLayer::new(Recorder::default());

    layer.show_routes(&routes, None);
    assert_eq!(layer.surface().lines().len(), 2);
    let (rect, padding) = layer.surface().last_fit().unwrap();
    assert_eq!(padding, ALL_ROUTES_PADDING);
    assert_eq!(rect.min(), coord! { x: 79.52, y: 17.97 });
    assert_eq!(rect.max(), coord! { x: 79.54, y: 17.99 });

    layer.show_routes(&routes, Some(walk.id));
    let (rect, padding) = layer.surface().last_fit().unwrap();
    assert_eq!(padding, SELECTED_ROUTE_PADDING);
    assert_eq!(rect, walk.bounds().unwrap());

    let calls = &layer.surface().calls;
    assert!(calls.contains(&Call::RemoveLine(route_line_id(run.id))));
    assert_eq!(
        calls.iter().rev().find(|c| matches!(c, Call::DrawLine(..))),
        Some(&Call::DrawLine(
            route_line_id(walk.id),
            vec![(79.53, 17.98), (79.54, 17.99)],
            LineStyle {
                color: walk.color.clone(),
                width: 6.0,
                opacity: 1.0,
            },
        ))
    );

    layer.show_routes(&routes, None);
    let redrawn: Vec<&Call> = layer.surface().lines().into_iter().rev().take(2).collect();
    assert!(redrawn.iter().any(|c| matches!(c, Call::DrawLine(id, ..) if *id == route_line_id(walk.id))));
    assert!(redrawn.iter().any(|c| matches!(c, Call::DrawLine(id, ..) if *id == route_line_id(run.id))));
    let (rect, padding) = layer.surface().last_fit().unwrap();
    assert_eq!(padding, ALL_ROUTES_PADDING);
    assert_eq!(rect.min(), coord! { x: 79.52, y: 17.97 });
    assert_eq!(rect.max(), coord! { x: 79.54, y: 17.99 });
}

#[test]
fn missing_token_shows_the_error_panel() {
    let mut recorder = Recorder::default();
    let config = Config::from_lookup(|_| None).unwrap();

    let err = match AnnotationLayer::init(&mut recorder, &config) {
        Ok(_) => panic!("map initialized without a token"),
        Err(err) => err,
    };
    assert!(err.is_config());
    assert_eq!(
        recorder.calls,
        vec![Call::ErrorPanel("MAPBOX_ACCESS_TOKEN is not set".into())]
    );

    let config = Config::from_lookup(|key| {
        (key == "MAPBOX_ACCESS_TOKEN").then(|| "pk.campus".to_string())
    })
    .unwrap();
    let layer = AnnotationLayer::init(Recorder::default(), &config).unwrap();
    assert!(layer.surface().calls.is_empty());
}

#[test]
fn line_follows_waypoint_order() {
    use crate::entities::{NewRoute, NewWaypoint};

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

    let mut layer = AnnotationLayer::new(Recorder::default());
    layer.show_routes(&[route], None);

    match layer.surface().lines()[0] {
        Call::DrawLine(_, points, style) => {
            assert_eq!(points, &vec![(79.54, 17.99), (79.53, 17.98)]);
            assert_eq!((style.width, style.opacity), (4.0, 0.7));
        }
        other => panic!("unexpected call {:?}", other),
    }
}

#[test]
fn pick_takes_priority_over_place_details() {
    use crate::client::pick::PickRole;
    use crate::entities::place::sample_place;

    let library = sample_place("NIT Warangal Library", Category::Library);
    let mut layer = AnnotationLayer::new(Recorder::default());
    layer.show_places(&[library.clone()]);

    let mut picker = LocationPicker::new();
    assert_eq!(
        layer.on_place_click(&mut picker, library.id),
        PlaceClick::Details(library.clone())
    );

    picker.start(PickRole::Start);
    match layer.on_place_click(&mut picker, library.id) {
        PlaceClick::Picked(picked) => {
            assert_eq!(picked.role, PickRole::Start);
            assert_eq!(picked.point.name, "NIT Warangal Library");
        }
        other => panic!("unexpected click {:?}", other),
    }

    let mut draft = RouteDraft::new();
    draft.set_drawing(true);
    picker.start(PickRole::End);
    let at = Coordinates::new(17.99, 79.54);

    assert!(matches!(
        layer.on_map_click(&mut picker, Some(&mut draft), at),
        MapClick::Picked(_)
    ));
    assert_eq!(layer.on_map_click(&mut picker, Some(&mut draft), at), MapClick::Waypoint(0));
    assert_eq!(layer.on_map_click(&mut picker, None, at), MapClick::Ignored);
}

#[cfg(test)]
struct FixedDirections(Result<crate::entities::Itinerary, Error>);

#[cfg(test)]
#[async_trait::async_trait]
impl DirectionsProvider for FixedDirections {
    async fn directions(
        &self,
        _start: Coordinates,
        _end: Coordinates,
        _profile: crate::entities::Profile,
    ) -> Result<crate::entities::Itinerary, Error> {
        self.0.clone()
    }
}

#[cfg(test)]
fn walking_request() -> NavigationRequest {
    use crate::entities::{NavPoint, Profile};

    NavigationRequest {
        start: NavPoint::new("Start Location", Coordinates::new(17.98, 79.53)),
        end: NavPoint::new("End Location", Coordinates::new(17.99, 79.54)),
        profile: Profile::Walking,
    }
}

#[test]
fn navigation_result_is_drawn_and_summarised() {
    use crate::entities::Itinerary;
    use tokio_test::block_on;

    let directions = FixedDirections(Ok(Itinerary {
        geometry: LineString::from(vec![(79.53, 17.98), (79.54, 17.99)]),
        duration: 600.0,
        distance: 800.0,
    }));
    let mut layer = AnnotationLayer::new(Recorder::default());

    let summary = block_on(layer.show_navigation(&walking_request(), &directions)).unwrap();
    assert_eq!(summary.time, "10m");
    assert_eq!(summary.distance, "0.80 km (0.50 mi)");
    assert_eq!(layer.navigation_summary(), Some(&summary));
    assert_eq!(layer.surface().last_fit().unwrap().1, NAVIGATION_PADDING);

    // A second request clears the first path before drawing again.
    block_on(layer.show_navigation(&walking_request(), &directions)).unwrap();
    assert!(layer
        .surface()
        .calls
        .contains(&Call::RemoveLine(NAV_ROUTE_ID.into())));
}

#[test]
fn failed_navigation_leaves_no_path() {
    use crate::entities::Itinerary;
    use crate::error::upstream_error;
    use tokio_test::block_on;

    let mut layer = AnnotationLayer::new(Recorder::default());
    let ok = FixedDirections(Ok(Itinerary {
        geometry: LineString::from(vec![(79.53, 17.98), (79.54, 17.99)]),
        duration: 60.0,
        distance: 100.0,
    }));
    block_on(layer.show_navigation(&walking_request(), &ok)).unwrap();

    let failing = FixedDirections(Err(upstream_error("NoRoute")));
    assert!(block_on(layer.show_navigation(&walking_request(), &failing)).is_err());

    let calls = &layer.surface().calls;
    assert_eq!(calls.last(), Some(&Call::Alert(NAV_FAILURE.into())));
    assert!(calls.contains(&Call::RemoveLine(NAV_ROUTE_ID.into())));
    assert_eq!(layer.navigation_summary(), None);
}
