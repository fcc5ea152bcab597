mod import_api;
mod place_api;
mod route_api;
mod weather_api;

use std::sync::Arc;

use crate::{
    api::API,
    config::Config,
    db::Store,
    external::{Geocoder, Mapbox, Nominatim, OpenWeather, ReverseGeocoder, WeatherProvider},
};

pub struct Engine {
    store: Arc<dyn Store>,
    geocoder: Arc<dyn Geocoder>,
    reverse_geocoder: Option<Arc<dyn ReverseGeocoder>>,
    weather: Option<Arc<dyn WeatherProvider>>,
}

impl Engine {
    pub fn new(store: Arc<dyn Store>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            store,
            geocoder,
            reverse_geocoder: None,
            weather: None,
        }
    }

    pub fn with_reverse_geocoder(mut self, reverse_geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.reverse_geocoder = Some(reverse_geocoder);
        self
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherProvider>) -> Self {
        self.weather = Some(weather);
        self
    }

    /// Providers without credentials are left out; the operations that need
    /// them report a configuration error when called.
    #[tracing::instrument(name = "Engine::from_config", skip_all)]
    pub fn from_config(store: Arc<dyn Store>, config: &Config) -> Self {
        let mut engine = Self::new(store, Arc::new(Nominatim::from_config(config)));

        match Mapbox::from_config(config) {
            Ok(mapbox) => engine = engine.with_reverse_geocoder(Arc::new(mapbox)),
            Err(err) => tracing::warn!(error = %err, "Mapbox seeding disabled"),
        }

        match OpenWeather::from_config(config) {
            Ok(weather) => engine = engine.with_weather(Arc::new(weather)),
            Err(err) => tracing::warn!(error = %err, "weather proxy disabled"),
        }

        engine
    }
}

impl API for Engine {}

#[cfg(test)]
pub mod fakes {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::entities::{Coordinates, Weather};
    use crate::error::{upstream_error, Error};
    use crate::external::{GeocodeHit, Geocoder, Poi, ReverseGeocoder, WeatherProvider};

    /// Answers from a fixed table and records every query it saw.
    #[derive(Default)]
    pub struct TableGeocoder {
        pub hits: HashMap<String, Coordinates>,
        pub failing: Vec<String>,
        pub queries: Mutex<Vec<String>>,
    }

    impl TableGeocoder {
        pub fn with_hit(mut self, name: &str, at: Coordinates) -> Self {
            self.hits.insert(name.into(), at);
            self
        }

        pub fn with_failure(mut self, name: &str) -> Self {
            self.failing.push(name.into());
            self
        }
    }

    #[async_trait]
    impl Geocoder for TableGeocoder {
        async fn geocode(&self, name: &str, city: &str) -> Result<Option<GeocodeHit>, Error> {
            self.queries
                .lock()
                .unwrap()
                .push(format!("{}, {}", name, city));

            if self.failing.iter().any(|f| f == name) {
                return Err(upstream_error("Nominatim API error: 503"));
            }

            Ok(self.hits.get(name).map(|&coordinates| GeocodeHit {
                coordinates,
                display_name: format!("{}, {}", name, city),
            }))
        }
    }

    /// Returns the same POIs wherever it is asked.
    pub struct FixedPois(pub Vec<Poi>);

    #[async_trait]
    impl ReverseGeocoder for FixedPois {
        async fn points_of_interest(&self, _at: Coordinates) -> Result<Vec<Poi>, Error> {
            Ok(self.0.clone())
        }
    }

    pub struct FixedWeather(pub Result<Weather, Error>);

    #[async_trait]
    impl WeatherProvider for FixedWeather {
        async fn current(&self, _at: Coordinates) -> Result<Weather, Error> {
            self.0.clone()
        }
    }
}
