use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check_status, throttle::Throttle, GeocodeHit, Geocoder};
use crate::{
    config::Config,
    entities::Coordinates,
    error::{upstream_error, Error},
};

const USER_AGENT: &str = "Campus Navigation System";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    display_name: String,
}

fn into_hit(results: Vec<SearchResult>) -> Result<Option<GeocodeHit>, Error> {
    let result = match results.into_iter().next() {
        Some(result) => result,
        None => return Ok(None),
    };

    let lat: f64 = result
        .lat
        .parse()
        .map_err(|_| upstream_error(format!("Nominatim returned a bad latitude: {}", result.lat)))?;
    let lng: f64 = result
        .lon
        .parse()
        .map_err(|_| upstream_error(format!("Nominatim returned a bad longitude: {}", result.lon)))?;

    Ok(Some(GeocodeHit {
        coordinates: Coordinates::new(lat, lng),
        display_name: result.display_name,
    }))
}

/// OpenStreetMap search client. The public instance allows one request per
/// second, so every lookup goes through the throttle.
pub struct Nominatim {
    client: reqwest::Client,
    api_base: String,
    throttle: Throttle,
}

impl Nominatim {
    pub fn new(api_base: impl Into<String>, delay: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            throttle: Throttle::new(delay),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.nominatim_api_base.clone(), config.geocode_delay)
    }
}

#[async_trait]
impl Geocoder for Nominatim {
    #[tracing::instrument(skip(self))]
    async fn geocode(&self, name: &str, city: &str) -> Result<Option<GeocodeHit>, Error> {
        let q = format!("{}, {}", name, city);
        let url = format!("{}/search", self.api_base.trim_end_matches('/'));

        let _turn = self.throttle.wait().await;

        let res = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(&[
                ("q", q.as_str()),
                ("format", "json"),
                ("limit", "1"),
                ("addressdetails", "1"),
            ])
            .send()
            .await?;

        check_status("Nominatim", &res)?;

        let results: Vec<SearchResult> = res.json().await?;

        into_hit(results)
    }
}

#[test]
fn first_result_becomes_hit() {
    let results: Vec<SearchResult> = serde_json::from_value(serde_json::json!([
        {
            "place_id": 1,
            "lat": "17.9843",
            "lon": "79.5311",
            "display_name": "Central Library, NIT Warangal, Hanamkonda, Telangana, India",
            "address": { "state": "Telangana" }
        },
        { "lat": "0", "lon": "0", "display_name": "elsewhere" }
    ]))
    .unwrap();

    let hit = into_hit(results).unwrap().unwrap();
    assert_eq!(hit.coordinates, Coordinates::new(17.9843, 79.5311));
    assert!(hit.display_name.starts_with("Central Library"));
}

#[test]
fn empty_result_is_a_miss() {
    assert_eq!(into_hit(vec![]).unwrap(), None);

    let garbled = vec![SearchResult {
        lat: "north".into(),
        lon: "79.53".into(),
        display_name: "x".into(),
    }];
    assert!(into_hit(garbled).unwrap_err().is_upstream());
}
