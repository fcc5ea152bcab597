use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ImportAPI, PlaceAPI, RouteAPI, WeatherAPI, API};
use crate::entities::{
    Category, Coordinates, ImportCandidate, ImportSummary, NewPlace, NewRoute, Place, PlaceUpdate,
    Route, RouteUpdate, Weather,
};
use crate::error::{Error, FieldError, INVALID_INPUT, NOT_FOUND, UPSTREAM, VALIDATION};

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    code: Option<i32>,
    error: Option<String>,
    #[serde(default)]
    errors: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
struct DeletedPlace {
    place: Place,
}

#[derive(Debug, Deserialize)]
struct DeletedRoute {
    route: Route,
}

#[derive(Debug, Serialize)]
struct Batch<T> {
    places: Vec<T>,
}

/// Rebuilds the gateway's error from a failed response.
fn decode_error(status: StatusCode, body: &str) -> Error {
    let body: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let code = body.code.unwrap_or(match status {
        StatusCode::NOT_FOUND => NOT_FOUND,
        StatusCode::BAD_REQUEST if !body.errors.is_empty() => VALIDATION,
        StatusCode::BAD_REQUEST => INVALID_INPUT,
        _ => UPSTREAM,
    });

    Error {
        code,
        message: body
            .error
            .unwrap_or_else(|| format!("gateway returned {}", status.as_u16())),
        fields: body.errors,
    }
}

/// REST gateway client; the editors and panels run against this.
#[derive(Clone)]
pub struct GatewayClient {
    client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// `base_url` includes the `/api` prefix, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let res = request.send().await?;
        let status = res.status();

        if status.is_success() {
            return Ok(res.json().await?);
        }

        let body = res.text().await?;
        Err(decode_error(status, &body))
    }
}

#[async_trait]
impl PlaceAPI for GatewayClient {
    #[tracing::instrument(skip(self))]
    async fn list_places(&self, category: Option<Category>) -> Result<Vec<Place>, Error> {
        let mut request = self.client.get(self.url("/places"));
        if let Some(category) = category {
            request = request.query(&[("category", category.name())]);
        }

        self.send(request).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_place(&self, id: Uuid) -> Result<Place, Error> {
        self.send(self.client.get(self.url(&format!("/places/{}", id))))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn create_place(&self, params: NewPlace) -> Result<Place, Error> {
        self.send(self.client.post(self.url("/places")).json(&params))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn update_place(&self, id: Uuid, params: PlaceUpdate) -> Result<Place, Error> {
        self.send(
            self.client
                .put(self.url(&format!("/places/{}", id)))
                .json(&params),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_place(&self, id: Uuid) -> Result<Place, Error> {
        let deleted: DeletedPlace = self
            .send(self.client.delete(self.url(&format!("/places/{}", id))))
            .await?;

        Ok(deleted.place)
    }
}

#[async_trait]
impl RouteAPI for GatewayClient {
    #[tracing::instrument(skip(self))]
    async fn list_routes(&self) -> Result<Vec<Route>, Error> {
        self.send(self.client.get(self.url("/routes"))).await
    }

    #[tracing::instrument(skip(self))]
    async fn find_route(&self, id: Uuid) -> Result<Route, Error> {
        self.send(self.client.get(self.url(&format!("/routes/{}", id))))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn create_route(&self, params: NewRoute) -> Result<Route, Error> {
        self.send(self.client.post(self.url("/routes")).json(&params))
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn update_route(&self, id: Uuid, params: RouteUpdate) -> Result<Route, Error> {
        self.send(
            self.client
                .put(self.url(&format!("/routes/{}", id)))
                .json(&params),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_route(&self, id: Uuid) -> Result<Route, Error> {
        let deleted: DeletedRoute = self
            .send(self.client.delete(self.url(&format!("/routes/{}", id))))
            .await?;

        Ok(deleted.route)
    }
}

#[async_trait]
impl ImportAPI for GatewayClient {
    #[tracing::instrument(skip(self))]
    async fn populate_college_places(&self) -> Result<ImportSummary, Error> {
        self.send(self.client.post(self.url("/places/populate-college-places")))
            .await
    }

    #[tracing::instrument(skip_all)]
    async fn import_from_osm(&self, places: Vec<ImportCandidate>) -> Result<ImportSummary, Error> {
        self.send(
            self.client
                .post(self.url("/places/import-from-osm"))
                .json(&Batch { places }),
        )
        .await
    }

    #[tracing::instrument(skip_all)]
    async fn bulk_import(&self, places: Vec<NewPlace>) -> Result<ImportSummary, Error> {
        self.send(
            self.client
                .post(self.url("/places/bulk-import"))
                .json(&Batch { places }),
        )
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_from_mapbox(&self) -> Result<ImportSummary, Error> {
        self.send(self.client.post(self.url("/places/fetch-from-mapbox")))
            .await
    }
}

#[async_trait]
impl WeatherAPI for GatewayClient {
    #[tracing::instrument(skip(self))]
    async fn current_weather(&self, at: Coordinates) -> Result<Weather, Error> {
        self.send(
            self.client
                .get(self.url("/weather"))
                .query(&[("lat", at.lat), ("lng", at.lng)]),
        )
        .await
    }
}

impl API for GatewayClient {}

#[test]
fn field_errors_survive_the_wire() {
    let body = serde_json::json!({
        "code": VALIDATION,
        "error": "validation failed",
        "errors": [{ "field": "name", "message": "Route name is required" }]
    })
    .to_string();

    let err = decode_error(StatusCode::BAD_REQUEST, &body);
    assert!(err.is_validation());
    assert_eq!(err.fields, vec![FieldError::new("name", "Route name is required")]);
}

#[test]
fn bare_failures_fall_back_to_status() {
    let err = decode_error(StatusCode::NOT_FOUND, "");
    assert!(err.is_not_found());

    let err = decode_error(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
    assert!(err.is_upstream());
    assert_eq!(err.message, "gateway returned 502");

    let client = GatewayClient::new("http://localhost:5000/api/");
    assert_eq!(client.url("/places"), "http://localhost:5000/api/places");
}
