use axum::extract::{Extension, Json, Query};
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::entities::{Coordinates, Weather};
use crate::error::{invalid_input_error, Error};

/// Kept as strings so that a missing or garbled value gets our own message.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct WeatherParams {
    lat: Option<String>,
    lng: Option<String>,
}

impl WeatherParams {
    fn coordinates(&self) -> Result<Coordinates, Error> {
        let parse = |v: &Option<String>| v.as_deref().and_then(|v| v.trim().parse::<f64>().ok());

        match (parse(&self.lat), parse(&self.lng)) {
            (Some(lat), Some(lng)) => Ok(Coordinates::new(lat, lng)),
            _ => Err(invalid_input_error("Latitude and longitude are required")),
        }
    }
}

pub async fn current(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<Weather>, Error> {
    let weather = api.current_weather(params.coordinates()?).await?;

    Ok(weather.into())
}

#[test]
fn coordinates_are_required() {
    use tokio_test::block_on;

    let err = block_on(current(
        Extension(super::test_api()),
        Query(WeatherParams {
            lat: Some("17.98".into()),
            lng: None,
        }),
    ))
    .unwrap_err();
    assert_eq!(err.message, "Latitude and longitude are required");

    // Valid coordinates get as far as the missing API key.
    let err = block_on(current(
        Extension(super::test_api()),
        Query(WeatherParams {
            lat: Some("17.98".into()),
            lng: Some("79.53".into()),
        }),
    ))
    .unwrap_err();
    assert!(err.is_config());
}
