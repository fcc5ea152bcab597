use axum::extract::{Extension, Json, Path};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::{NewRoute, Route, RouteUpdate};
use crate::error::Error;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Deleted {
    message: String,
    route: Route,
}

pub async fn list(Extension(api): Extension<DynAPI>) -> Result<Json<Vec<Route>>, Error> {
    let routes = api.list_routes().await?;

    Ok(routes.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<Route>, Error> {
    let route = api.find_route(id).await?;

    Ok(route.into())
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<NewRoute>,
) -> Result<(StatusCode, Json<Route>), Error> {
    let route = api.create_route(params).await?;

    Ok((StatusCode::CREATED, route.into()))
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(params): Json<RouteUpdate>,
) -> Result<Json<Route>, Error> {
    let route = api.update_route(id, params).await?;

    Ok(route.into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, Error> {
    let route = api.delete_route(id).await?;

    Ok(Deleted {
        message: "Route deleted successfully".into(),
        route,
    }
    .into())
}

#[test]
fn library_walk_round_trip() {
    use tokio_test::block_on;

    let api = super::test_api();
    let params: NewRoute = serde_json::from_value(serde_json::json!({
        "name": "Library Walk",
        "waypoints": [
            { "latitude": 17.98, "longitude": 79.53, "order": 1 },
            { "latitude": 17.99, "longitude": 79.54, "order": 0 }
        ]
    }))
    .unwrap();

    let (status, Json(route)) = block_on(create(Extension(api.clone()), Json(params))).unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(route.color, "#3b82f6");

    let Json(found) = block_on(find(Extension(api.clone()), Path(route.id))).unwrap();
    let first = found.ordered_waypoints()[0].coordinates();
    assert_eq!((first.lng, first.lat), (79.54, 17.99));

    let Json(deleted) = block_on(delete(Extension(api.clone()), Path(route.id))).unwrap();
    assert_eq!(deleted.message, "Route deleted successfully");

    let err = block_on(find(Extension(api), Path(route.id))).unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}
