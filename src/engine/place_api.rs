use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::PlaceAPI,
    entities::{Category, NewPlace, Place, PlaceUpdate},
    error::{not_found_error, Error},
};

#[async_trait]
impl PlaceAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_places(&self, category: Option<Category>) -> Result<Vec<Place>, Error> {
        let mut places = self.store.list_places(category).await?;
        places.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(places)
    }

    #[tracing::instrument(skip(self))]
    async fn find_place(&self, id: Uuid) -> Result<Place, Error> {
        self.store
            .find_place(id)
            .await?
            .ok_or_else(|| not_found_error("Place"))
    }

    #[tracing::instrument(skip(self))]
    async fn create_place(&self, params: NewPlace) -> Result<Place, Error> {
        let place = Place::new(params)?;
        self.store.insert_place(&place).await?;

        tracing::info!(id = %place.id, name = %place.name, "place created");

        Ok(place)
    }

    #[tracing::instrument(skip(self))]
    async fn update_place(&self, id: Uuid, params: PlaceUpdate) -> Result<Place, Error> {
        let place = self.find_place(id).await?.apply(params)?;

        if !self.store.update_place(&place).await? {
            return Err(not_found_error("Place"));
        }

        Ok(place)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_place(&self, id: Uuid) -> Result<Place, Error> {
        self.store
            .delete_place(id)
            .await?
            .ok_or_else(|| not_found_error("Place"))
    }
}

#[cfg(test)]
fn test_engine() -> Engine {
    use std::sync::Arc;

    use super::fakes::TableGeocoder;
    use crate::db::MemStore;

    Engine::new(Arc::new(MemStore::new()), Arc::new(TableGeocoder::default()))
}

#[test]
fn places_are_listed_by_name() {
    use tokio_test::block_on;

    let engine = test_engine();
    for (name, category) in [
        ("Stadium", "recreation"),
        ("Canteen", "eateries"),
        ("Food Court", "eateries"),
    ] {
        block_on(engine.create_place(NewPlace {
            name: Some(name.into()),
            category: Some(category.into()),
            latitude: Some(17.98),
            longitude: Some(79.53),
            ..Default::default()
        }))
        .unwrap();
    }

    let names: Vec<String> = block_on(engine.list_places(None))
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["Canteen", "Food Court", "Stadium"]);

    let eateries = block_on(engine.list_places(Some(Category::Eateries))).unwrap();
    assert_eq!(eateries.len(), 2);
}

#[test]
fn soft_removed_place_is_still_addressable() {
    use tokio_test::block_on;

    let engine = test_engine();
    let place = block_on(engine.create_place(NewPlace {
        name: Some("Old Workshop".into()),
        latitude: Some(17.98),
        longitude: Some(79.53),
        ..Default::default()
    }))
    .unwrap();

    let hidden = block_on(engine.update_place(
        place.id,
        PlaceUpdate {
            is_active: Some(false),
            ..Default::default()
        },
    ))
    .unwrap();

    assert!(!hidden.is_active);
    assert!(block_on(engine.list_places(None)).unwrap().is_empty());
    assert_eq!(block_on(engine.find_place(place.id)).unwrap(), hidden);
}

#[test]
fn unknown_place_is_not_found() {
    use tokio_test::block_on;

    let engine = test_engine();
    let id = Uuid::new_v4();

    assert!(block_on(engine.find_place(id)).unwrap_err().is_not_found());
    assert!(block_on(engine.update_place(id, PlaceUpdate::default()))
        .unwrap_err()
        .is_not_found());
    assert!(block_on(engine.delete_place(id)).unwrap_err().is_not_found());
}

#[test]
fn invalid_update_leaves_stored_place_alone() {
    use tokio_test::block_on;

    let engine = test_engine();
    let place = block_on(engine.create_place(NewPlace {
        name: Some("Main Gate".into()),
        latitude: Some(17.98),
        longitude: Some(79.53),
        ..Default::default()
    }))
    .unwrap();

    let err = block_on(engine.update_place(
        place.id,
        PlaceUpdate {
            latitude: Some(123.0),
            ..Default::default()
        },
    ))
    .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(block_on(engine.find_place(place.id)).unwrap().latitude, 17.98);
}
