use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{in_category, Store};
use crate::entities::{Category, Place, Route};
use crate::error::Error;

/// Process-local store for development runs without `DATABASE_URL`.
#[derive(Default)]
pub struct MemStore {
    places: RwLock<HashMap<Uuid, Place>>,
    routes: RwLock<HashMap<Uuid, Route>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn insert_place(&self, place: &Place) -> Result<(), Error> {
        self.places.write().await.insert(place.id, place.clone());
        Ok(())
    }

    async fn find_place(&self, id: Uuid) -> Result<Option<Place>, Error> {
        Ok(self.places.read().await.get(&id).cloned())
    }

    async fn find_place_by_name(&self, name: &str) -> Result<Option<Place>, Error> {
        let places = self.places.read().await;
        Ok(places.values().find(|p| p.name == name).cloned())
    }

    async fn list_places(&self, category: Option<Category>) -> Result<Vec<Place>, Error> {
        let places = self.places.read().await;
        Ok(places
            .values()
            .filter(|p| p.is_active)
            .filter(|p| in_category(p, category))
            .cloned()
            .collect())
    }

    async fn update_place(&self, place: &Place) -> Result<bool, Error> {
        let mut places = self.places.write().await;
        match places.get_mut(&place.id) {
            Some(existing) => {
                *existing = place.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_place(&self, id: Uuid) -> Result<Option<Place>, Error> {
        Ok(self.places.write().await.remove(&id))
    }

    async fn insert_route(&self, route: &Route) -> Result<(), Error> {
        self.routes.write().await.insert(route.id, route.clone());
        Ok(())
    }

    async fn find_route(&self, id: Uuid) -> Result<Option<Route>, Error> {
        Ok(self.routes.read().await.get(&id).cloned())
    }

    async fn list_routes(&self) -> Result<Vec<Route>, Error> {
        Ok(self.routes.read().await.values().cloned().collect())
    }

    async fn update_route(&self, route: &Route) -> Result<bool, Error> {
        let mut routes = self.routes.write().await;
        match routes.get_mut(&route.id) {
            Some(existing) => {
                *existing = route.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_route(&self, id: Uuid) -> Result<Option<Route>, Error> {
        Ok(self.routes.write().await.remove(&id))
    }
}

#[test]
fn inactive_places_are_not_listed() {
    use crate::entities::place::sample_place;
    use tokio_test::block_on;

    let store = MemStore::new();
    let mut hidden = sample_place("Old Canteen", Category::Eateries);
    hidden.is_active = false;

    block_on(store.insert_place(&sample_place("Canteen", Category::Eateries))).unwrap();
    block_on(store.insert_place(&sample_place("Library", Category::Library))).unwrap();
    block_on(store.insert_place(&hidden)).unwrap();

    let eateries = block_on(store.list_places(Some(Category::Eateries))).unwrap();
    assert_eq!(eateries.len(), 1);
    assert_eq!(eateries[0].name, "Canteen");
    assert_eq!(block_on(store.list_places(None)).unwrap().len(), 2);
    assert!(block_on(store.find_place_by_name("Old Canteen")).unwrap().is_some());
}
