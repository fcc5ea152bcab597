pub mod coordinates;
pub mod import;
pub mod navigation;
pub mod place;
pub mod route;
pub mod suggestion;
pub mod validate;
pub mod weather;

pub use coordinates::Coordinates;
pub use import::{ImportCandidate, ImportResults, ImportSummary};
pub use navigation::{Itinerary, NavPoint, NavigationRequest, NavigationSummary, Profile};
pub use place::{Category, ContactInfo, DayHours, NewPlace, OpeningHours, Place, PlaceUpdate};
pub use route::{NewRoute, NewWaypoint, Route, RouteUpdate, Waypoint};
pub use suggestion::Suggestion;
pub use validate::Validate;
pub use weather::Weather;
