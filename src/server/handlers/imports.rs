use axum::extract::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::DynAPI;
use crate::entities::{ImportCandidate, ImportSummary, NewPlace};
use crate::error::{invalid_input_error, Error};

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportParams<T> {
    places: Option<Vec<T>>,
}

impl<T> ImportParams<T> {
    fn into_places(self) -> Result<Vec<T>, Error> {
        self.places
            .ok_or_else(|| invalid_input_error("Places array is required"))
    }
}

pub async fn populate_college_places(
    Extension(api): Extension<DynAPI>,
) -> Result<Json<ImportSummary>, Error> {
    let summary = api.populate_college_places().await?;

    Ok(summary.into())
}

pub async fn import_from_osm(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<ImportParams<ImportCandidate>>,
) -> Result<Json<ImportSummary>, Error> {
    let summary = api.import_from_osm(params.into_places()?).await?;

    Ok(summary.into())
}

pub async fn bulk_import(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<ImportParams<NewPlace>>,
) -> Result<Json<ImportSummary>, Error> {
    let summary = api.bulk_import(params.into_places()?).await?;

    Ok(summary.into())
}

pub async fn fetch_from_mapbox(
    Extension(api): Extension<DynAPI>,
) -> Result<Json<ImportSummary>, Error> {
    let summary = api.fetch_from_mapbox().await?;

    Ok(summary.into())
}

#[test]
fn missing_places_array_is_rejected() {
    use tokio_test::block_on;

    let err = block_on(bulk_import(
        Extension(super::test_api()),
        Json(ImportParams { places: None }),
    ))
    .unwrap_err();

    assert_eq!(err.message, "Places array is required");
    assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
}
