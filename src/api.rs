use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::entities::{
    Category, Coordinates, ImportCandidate, ImportSummary, NewPlace, NewRoute, Place, PlaceUpdate,
    Route, RouteUpdate, Weather,
};
use crate::error::Error;

#[async_trait]
pub trait PlaceAPI {
    /// Active places, sorted by name.
    async fn list_places(&self, category: Option<Category>) -> Result<Vec<Place>, Error>;
    async fn find_place(&self, id: Uuid) -> Result<Place, Error>;
    async fn create_place(&self, params: NewPlace) -> Result<Place, Error>;
    async fn update_place(&self, id: Uuid, params: PlaceUpdate) -> Result<Place, Error>;
    async fn delete_place(&self, id: Uuid) -> Result<Place, Error>;
}

#[async_trait]
pub trait RouteAPI {
    /// All routes, newest first.
    async fn list_routes(&self) -> Result<Vec<Route>, Error>;
    async fn find_route(&self, id: Uuid) -> Result<Route, Error>;
    async fn create_route(&self, params: NewRoute) -> Result<Route, Error>;
    async fn update_route(&self, id: Uuid, params: RouteUpdate) -> Result<Route, Error>;
    async fn delete_route(&self, id: Uuid) -> Result<Route, Error>;
}

#[async_trait]
pub trait ImportAPI {
    async fn populate_college_places(&self) -> Result<ImportSummary, Error>;
    async fn import_from_osm(&self, places: Vec<ImportCandidate>) -> Result<ImportSummary, Error>;
    async fn bulk_import(&self, places: Vec<NewPlace>) -> Result<ImportSummary, Error>;
    async fn fetch_from_mapbox(&self) -> Result<ImportSummary, Error>;
}

#[async_trait]
pub trait WeatherAPI {
    async fn current_weather(&self, at: Coordinates) -> Result<Weather, Error>;
}

pub trait API: PlaceAPI + RouteAPI + ImportAPI + WeatherAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
