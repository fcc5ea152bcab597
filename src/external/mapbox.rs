use async_trait::async_trait;
use geo_types::{Coord, LineString};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{check_status, DirectionsProvider, Poi, ReverseGeocoder, SuggestionProvider};
use crate::{
    config::Config,
    entities::{Coordinates, Itinerary, Profile, Suggestion},
    error::{config_error, upstream_error, Error},
};

/// Campus centre, used to bias forward geocoding.
pub const PROXIMITY: &str = "79.5300,17.9833";
/// West, south, east, north.
pub const SEARCH_BBOX: &str = "79.40,17.90,79.65,18.05";
const SEARCH_LIMIT: &str = "5";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Feature {
    pub place_name: String,
    #[serde(default)]
    pub text: String,
    pub center: [f64; 2],
    #[serde(default)]
    pub context: Vec<ContextEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContextEntry {
    pub text: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DirectionsResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct DirectionsRoute {
    geometry: LineGeometry,
    duration: f64,
    distance: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LineGeometry {
    coordinates: Vec<[f64; 2]>,
}

impl Feature {
    fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.center[1], self.center[0])
    }
}

impl From<Feature> for Suggestion {
    fn from(feature: Feature) -> Self {
        let context = if feature.context.is_empty() {
            "External Location".to_string()
        } else {
            feature
                .context
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };

        Suggestion {
            lng: feature.center[0],
            lat: feature.center[1],
            name: feature.place_name,
            context,
            is_local: false,
            description: None,
        }
    }
}

impl From<Feature> for Poi {
    fn from(feature: Feature) -> Self {
        let coordinates = feature.coordinates();
        let name = if feature.text.is_empty() {
            feature.place_name
        } else {
            feature.text
        };

        Poi { name, coordinates }
    }
}

fn into_itinerary(data: DirectionsResponse) -> Result<Itinerary, Error> {
    if data.code != "Ok" {
        return Err(upstream_error(data.message.unwrap_or(data.code)));
    }

    let route = data
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| upstream_error("no route found"))?;

    Ok(Itinerary {
        geometry: route
            .geometry
            .coordinates
            .into_iter()
            .map(|[x, y]| Coord { x, y })
            .collect::<LineString<f64>>(),
        duration: route.duration,
        distance: route.distance,
    })
}

/// Geocoding and directions client for the Mapbox web APIs.
#[derive(Clone)]
pub struct Mapbox {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl Mapbox {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    /// Fails when no access token is configured.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let token = config.require_mapbox_token()?;
        Ok(Self::new(config.mapbox_api_base.clone(), token))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, Error> {
        let invalid_base = || config_error(format!("MAPBOX_API_BASE is not a URL: {}", self.api_base));

        let mut url = Url::parse(&self.api_base).map_err(|_| invalid_base())?;
        url.path_segments_mut()
            .map_err(|_| invalid_base())?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    async fn features(&self, url: Url, query: &[(&str, &str)]) -> Result<Vec<Feature>, Error> {
        let res = self
            .client
            .get(url)
            .query(&[("access_token", self.token.as_str())])
            .query(query)
            .send()
            .await?;

        check_status("Mapbox", &res)?;

        let data: FeatureCollection = res.json().await?;

        Ok(data.features)
    }
}

#[async_trait]
impl SuggestionProvider for Mapbox {
    #[tracing::instrument(skip(self))]
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, Error> {
        let file = format!("{}.json", query);
        let url = self.endpoint(&["geocoding", "v5", "mapbox.places", file.as_str()])?;

        let features = self
            .features(
                url,
                &[
                    ("proximity", PROXIMITY),
                    ("bbox", SEARCH_BBOX),
                    ("limit", SEARCH_LIMIT),
                ],
            )
            .await?;

        Ok(features.into_iter().map(Suggestion::from).collect())
    }
}

#[async_trait]
impl ReverseGeocoder for Mapbox {
    #[tracing::instrument(skip(self))]
    async fn points_of_interest(&self, at: Coordinates) -> Result<Vec<Poi>, Error> {
        let file = format!("{},{}.json", at.lng, at.lat);
        let url = self.endpoint(&["geocoding", "v5", "mapbox.places", file.as_str()])?;

        let features = self
            .features(url, &[("types", "poi"), ("limit", SEARCH_LIMIT)])
            .await?;

        Ok(features.into_iter().map(Poi::from).collect())
    }
}

#[async_trait]
impl DirectionsProvider for Mapbox {
    #[tracing::instrument(skip(self))]
    async fn directions(
        &self,
        start: Coordinates,
        end: Coordinates,
        profile: Profile,
    ) -> Result<Itinerary, Error> {
        let waypoints = format!("{},{};{},{}", start.lng, start.lat, end.lng, end.lat);
        let url = self.endpoint(&["directions", "v5", "mapbox", profile.name(), waypoints.as_str()])?;

        let res = self
            .client
            .get(url)
            .query(&[
                ("access_token", self.token.as_str()),
                ("geometries", "geojson"),
                ("steps", "true"),
                ("overview", "full"),
            ])
            .send()
            .await?;

        // Mapbox reports routing failures in the body, often with a 4xx.
        let data: DirectionsResponse = res.json().await?;

        into_itinerary(data)
    }
}

#[test]
fn endpoint_encodes_query_segment() {
    let mapbox = Mapbox::new("https://api.mapbox.com", "token");

    let url = mapbox
        .endpoint(&["geocoding", "v5", "mapbox.places", "Main Gate.json"])
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.mapbox.com/geocoding/v5/mapbox.places/Main%20Gate.json"
    );

    let url = mapbox
        .endpoint(&["directions", "v5", "mapbox", "walking", "79.53,17.98;79.54,17.99"])
        .unwrap();
    assert_eq!(
        url.as_str(),
        "https://api.mapbox.com/directions/v5/mapbox/walking/79.53,17.98;79.54,17.99"
    );
}

#[test]
fn directions_body_becomes_itinerary() {
    let data: DirectionsResponse = serde_json::from_value(serde_json::json!({
        "code": "Ok",
        "routes": [{
            "geometry": { "type": "LineString", "coordinates": [[79.53, 17.98], [79.535, 17.985], [79.54, 17.99]] },
            "duration": 600.0,
            "distance": 800.0,
            "legs": []
        }]
    }))
    .unwrap();

    let itinerary = into_itinerary(data).unwrap();
    assert_eq!(itinerary.geometry.0.len(), 3);
    assert_eq!(itinerary.formatted_duration(), "10m");
    assert_eq!(itinerary.formatted_distance(), "0.80 km (0.50 mi)");
}

#[test]
fn failed_directions_surface_provider_message() {
    let data: DirectionsResponse = serde_json::from_value(serde_json::json!({
        "code": "NoRoute",
        "message": "No route found between the given points",
        "routes": []
    }))
    .unwrap();

    let err = into_itinerary(data).unwrap_err();
    assert!(err.is_upstream());
    assert_eq!(err.message, "No route found between the given points");
}

#[test]
fn feature_context_joins_into_suggestion() {
    let feature: Feature = serde_json::from_value(serde_json::json!({
        "place_name": "Hanamkonda Bus Station, Hanamkonda, Telangana",
        "text": "Hanamkonda Bus Station",
        "center": [79.56, 18.01],
        "context": [{ "text": "Hanamkonda" }, { "text": "Telangana" }]
    }))
    .unwrap();

    let suggestion = Suggestion::from(feature.clone());
    assert_eq!(suggestion.context, "Hanamkonda, Telangana");
    assert_eq!((suggestion.lng, suggestion.lat), (79.56, 18.01));
    assert!(!suggestion.is_local);

    let poi = Poi::from(feature);
    assert_eq!(poi.name, "Hanamkonda Bus Station");
}
