use axum::extract::{Extension, Json, Path, Query};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::entities::{Category, NewPlace, Place, PlaceUpdate};
use crate::error::Error;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListParams {
    category: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Deleted {
    message: String,
    place: Place,
}

fn parse_category(raw: Option<&str>) -> Result<Option<Category>, Error> {
    match raw.map(str::trim).filter(|c| !c.is_empty()) {
        Some(raw) => Ok(Some(raw.parse()?)),
        None => Ok(None),
    }
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Place>>, Error> {
    let category = parse_category(params.category.as_deref())?;
    let places = api.list_places(category).await?;

    Ok(places.into())
}

pub async fn list_by_category(
    Extension(api): Extension<DynAPI>,
    Path(category): Path<String>,
) -> Result<Json<Vec<Place>>, Error> {
    let category = parse_category(Some(&category))?;
    let places = api.list_places(category).await?;

    Ok(places.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<Place>, Error> {
    let place = api.find_place(id).await?;

    Ok(place.into())
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Json(params): Json<NewPlace>,
) -> Result<(StatusCode, Json<Place>), Error> {
    let place = api.create_place(params).await?;

    Ok((StatusCode::CREATED, place.into()))
}

pub async fn update(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
    Json(params): Json<PlaceUpdate>,
) -> Result<Json<Place>, Error> {
    let place = api.update_place(id, params).await?;

    Ok(place.into())
}

pub async fn delete(
    Extension(api): Extension<DynAPI>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, Error> {
    let place = api.delete_place(id).await?;

    Ok(Deleted {
        message: "Place deleted successfully".into(),
        place,
    }
    .into())
}

#[test]
fn create_then_filter_by_category() {
    use tokio_test::block_on;

    let api = super::test_api();

    let (status, Json(place)) = block_on(create(
        Extension(api.clone()),
        Json(NewPlace {
            name: Some("NIT Warangal Canteen".into()),
            category: Some("eateries".into()),
            latitude: Some(17.9838),
            longitude: Some(79.5309),
            ..Default::default()
        }),
    ))
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let Json(eateries) =
        block_on(list_by_category(Extension(api.clone()), Path("eateries".into()))).unwrap();
    assert_eq!(eateries, vec![place.clone()]);

    let Json(hostels) = block_on(list(
        Extension(api.clone()),
        Query(ListParams {
            category: Some("hostel".into()),
        }),
    ))
    .unwrap();
    assert!(hostels.is_empty());

    let Json(deleted) = block_on(delete(Extension(api), Path(place.id))).unwrap();
    assert_eq!(deleted.message, "Place deleted successfully");
    assert_eq!(deleted.place, place);
}

#[test]
fn unknown_category_filter_is_rejected() {
    use tokio_test::block_on;

    let err = block_on(list_by_category(
        Extension(super::test_api()),
        Path("cafeteria".into()),
    ))
    .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(err.fields[0].field, "category");
}
