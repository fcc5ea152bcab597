//! Headless client: map annotation, location search, navigation and the
//! editors, driven through the gateway and rendered onto a [`map::MapSurface`].

pub mod editor;
pub mod gateway;
pub mod map;
pub mod navigation;
pub mod pick;
pub mod search;

pub use editor::{PlaceDraft, RouteDraft};
pub use gateway::GatewayClient;
pub use map::{AnnotationLayer, MapClick, MapSurface, PlaceClick};
pub use navigation::NavigationPanel;
pub use pick::{LocationPicker, PickRole, PickedLocation};
pub use search::LocationSearch;
