use geo_types::{coord, Coord, Rect};
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in meters.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let d_lat = lat2 - lat1;
        let d_lng = (other.lng - self.lng).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

impl From<Coordinates> for Coord<f64> {
    fn from(c: Coordinates) -> Self {
        coord! { x: c.lng, y: c.lat }
    }
}

impl From<Coord<f64>> for Coordinates {
    fn from(c: Coord<f64>) -> Self {
        Self { lat: c.y, lng: c.x }
    }
}

impl From<Coordinates> for String {
    fn from(c: Coordinates) -> Self {
        format!("{},{}", c.lng, c.lat)
    }
}

pub fn is_valid_latitude(lat: f64) -> bool {
    lat.is_finite() && (-90.0..=90.0).contains(&lat)
}

pub fn is_valid_longitude(lng: f64) -> bool {
    lng.is_finite() && (-180.0..=180.0).contains(&lng)
}

/// Smallest rectangle covering every point, `None` for no points.
pub fn bounds<I>(points: I) -> Option<Rect<f64>>
where
    I: IntoIterator<Item = Coord<f64>>,
{
    let mut points = points.into_iter();
    let first = points.next()?;

    let (min, max) = points.fold((first, first), |(min, max), p| {
        (
            coord! { x: min.x.min(p.x), y: min.y.min(p.y) },
            coord! { x: max.x.max(p.x), y: max.y.max(p.y) },
        )
    });

    Some(Rect::new(min, max))
}

#[test]
fn bounds_span_all_points() {
    let rect = bounds(vec![
        coord! { x: 79.53, y: 17.98 },
        coord! { x: 79.54, y: 17.99 },
        coord! { x: 79.52, y: 17.985 },
    ])
    .unwrap();

    assert_eq!(rect.min(), coord! { x: 79.52, y: 17.98 });
    assert_eq!(rect.max(), coord! { x: 79.54, y: 17.99 });
    assert!(bounds(Vec::<Coord<f64>>::new()).is_none());
}

#[test]
fn distance_between_campus_points() {
    let gate = Coordinates::new(17.9833, 79.5300);
    let library = Coordinates::new(17.9843, 79.5300);

    let meters = gate.distance_to(&library);
    assert!((meters - 111.2).abs() < 1.0);
}
