use super::Engine;

use async_trait::async_trait;

use crate::{
    api::WeatherAPI,
    entities::{Coordinates, Weather},
    error::{config_error, Error},
};

#[async_trait]
impl WeatherAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn current_weather(&self, at: Coordinates) -> Result<Weather, Error> {
        let provider = self
            .weather
            .as_ref()
            .ok_or_else(|| config_error("Weather API key not configured"))?;

        provider.current(at).await
    }
}

#[test]
fn weather_needs_a_configured_provider() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use super::fakes::{FixedWeather, TableGeocoder};
    use crate::db::MemStore;

    let at = Coordinates::new(17.9833, 79.53);
    let engine = Engine::new(Arc::new(MemStore::new()), Arc::new(TableGeocoder::default()));

    let err = block_on(engine.current_weather(at)).unwrap_err();
    assert!(err.is_config());
    assert_eq!(err.message, "Weather API key not configured");

    let sunny = Weather {
        temp: 31.0,
        feels_like: 33.5,
        description: "clear sky".into(),
        icon: "01d".into(),
        humidity: 40.0,
        wind_speed: 3.2,
        location: "Kazipet".into(),
    };
    let engine = engine.with_weather(Arc::new(FixedWeather(Ok(sunny.clone()))));

    assert_eq!(block_on(engine.current_weather(at)).unwrap(), sunny);
}
