pub mod mapbox;
pub mod nominatim;
pub mod openweather;
pub mod throttle;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};

use crate::entities::{Coordinates, Itinerary, Profile, Suggestion, Weather};
use crate::error::{upstream_error, Error};

pub use mapbox::Mapbox;
pub use nominatim::Nominatim;
pub use openweather::OpenWeather;

#[derive(Clone, Debug, PartialEq)]
pub struct GeocodeHit {
    pub coordinates: Coordinates,
    pub display_name: String,
}

/// A named point of interest found by reverse geocoding.
#[derive(Clone, Debug, PartialEq)]
pub struct Poi {
    pub name: String,
    pub coordinates: Coordinates,
}

/// Place name to coordinates; `None` when the provider has no match.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, name: &str, city: &str) -> Result<Option<GeocodeHit>, Error>;
}

#[async_trait]
pub trait SuggestionProvider: Send + Sync {
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, Error>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn points_of_interest(&self, at: Coordinates) -> Result<Vec<Poi>, Error>;
}

#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn directions(
        &self,
        start: Coordinates,
        end: Coordinates,
        profile: Profile,
    ) -> Result<Itinerary, Error>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, at: Coordinates) -> Result<Weather, Error>;
}

fn check_status(provider: &str, res: &Response) -> Result<(), Error> {
    let status_code = res.status();

    if status_code == StatusCode::OK {
        return Ok(());
    }

    Err(upstream_error(format!("{} API error: {}", provider, status_code.as_u16())))
}
