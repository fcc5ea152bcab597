use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::WeatherProvider;
use crate::{
    config::Config,
    entities::{Coordinates, Weather},
    error::{config_error, upstream_error, Error},
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct CurrentConditions {
    // An integer on success, a string on most failures.
    cod: serde_json::Value,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    main: Option<MainReadings>,
    #[serde(default)]
    weather: Vec<Condition>,
    #[serde(default)]
    wind: Option<Wind>,
    #[serde(default)]
    name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct MainReadings {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Condition {
    description: String,
    icon: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Wind {
    speed: f64,
}

fn into_weather(data: CurrentConditions) -> Result<Weather, Error> {
    let ok = match &data.cod {
        serde_json::Value::Number(n) => n.as_u64() == Some(200),
        serde_json::Value::String(s) => s == "200",
        _ => false,
    };
    if !ok {
        return Err(upstream_error(
            data.message
                .unwrap_or_else(|| format!("OpenWeather API error: {}", data.cod)),
        ));
    }

    let main = data
        .main
        .ok_or_else(|| upstream_error("OpenWeather response has no readings"))?;
    let condition = data
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| upstream_error("OpenWeather response has no conditions"))?;

    Ok(Weather {
        temp: main.temp,
        feels_like: main.feels_like,
        description: condition.description,
        icon: condition.icon,
        humidity: main.humidity,
        wind_speed: data.wind.map_or(0.0, |w| w.speed),
        location: data.name,
    })
}

pub struct OpenWeather {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

impl OpenWeather {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let api_key = config
            .openweather_api_key
            .as_deref()
            .ok_or_else(|| config_error("Weather API key not configured"))?;

        Ok(Self::new(config.openweather_api_base.clone(), api_key))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeather {
    #[tracing::instrument(skip(self))]
    async fn current(&self, at: Coordinates) -> Result<Weather, Error> {
        let url = format!("{}/data/2.5/weather", self.api_base.trim_end_matches('/'));

        let res = self
            .client
            .get(url)
            .query(&[
                ("lat", at.lat.to_string()),
                ("lon", at.lng.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        // Failures carry `cod` and `message` in the body.
        let data: CurrentConditions = res.json().await?;

        into_weather(data)
    }
}

#[test]
fn readings_map_onto_weather() {
    let data: CurrentConditions = serde_json::from_value(serde_json::json!({
        "cod": 200,
        "name": "Kazipet",
        "main": { "temp": 31.4, "feels_like": 34.0, "humidity": 48, "pressure": 1008 },
        "weather": [{ "id": 802, "main": "Clouds", "description": "scattered clouds", "icon": "03d" }],
        "wind": { "speed": 4.1, "deg": 250 }
    }))
    .unwrap();

    let weather = into_weather(data).unwrap();
    assert_eq!(weather.location, "Kazipet");
    assert_eq!(weather.description, "scattered clouds");
    assert_eq!(weather.icon, "03d");
    assert_eq!(weather.humidity, 48.0);
    assert_eq!(weather.wind_speed, 4.1);
}

#[test]
fn provider_failure_keeps_its_message() {
    let data: CurrentConditions = serde_json::from_value(serde_json::json!({
        "cod": "401",
        "message": "Invalid API key."
    }))
    .unwrap();

    let err = into_weather(data).unwrap_err();
    assert!(err.is_upstream());
    assert_eq!(err.message, "Invalid API key.");
}
