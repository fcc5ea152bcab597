use super::Engine;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::RouteAPI,
    entities::{NewRoute, Route, RouteUpdate},
    error::{not_found_error, Error},
};

#[async_trait]
impl RouteAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_routes(&self) -> Result<Vec<Route>, Error> {
        let mut routes = self.store.list_routes().await?;
        routes.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(routes)
    }

    #[tracing::instrument(skip(self))]
    async fn find_route(&self, id: Uuid) -> Result<Route, Error> {
        self.store
            .find_route(id)
            .await?
            .ok_or_else(|| not_found_error("Route"))
    }

    #[tracing::instrument(skip(self))]
    async fn create_route(&self, params: NewRoute) -> Result<Route, Error> {
        let route = Route::new(params)?;
        self.store.insert_route(&route).await?;

        tracing::info!(id = %route.id, waypoints = route.waypoints.len(), "route created");

        Ok(route)
    }

    #[tracing::instrument(skip(self))]
    async fn update_route(&self, id: Uuid, params: RouteUpdate) -> Result<Route, Error> {
        let route = self.find_route(id).await?.apply(params)?;

        if !self.store.update_route(&route).await? {
            return Err(not_found_error("Route"));
        }

        Ok(route)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_route(&self, id: Uuid) -> Result<Route, Error> {
        self.store
            .delete_route(id)
            .await?
            .ok_or_else(|| not_found_error("Route"))
    }
}

#[test]
fn routes_are_listed_newest_first() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use super::fakes::TableGeocoder;
    use crate::db::{MemStore, Store};
    use crate::entities::route::sample_route;

    let store = Arc::new(MemStore::new());
    let mut older = sample_route("Morning Loop", &[(17.98, 79.53), (17.99, 79.54)]);
    older.created_at = older.created_at - chrono::Duration::hours(1);
    let newer = sample_route("Hostel Run", &[(17.98, 79.53), (17.985, 79.535)]);
    block_on(store.insert_route(&older)).unwrap();
    block_on(store.insert_route(&newer)).unwrap();

    let engine = Engine::new(store, Arc::new(TableGeocoder::default()));

    let names: Vec<String> = block_on(engine.list_routes())
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["Hostel Run", "Morning Loop"]);
}

#[test]
fn route_with_one_waypoint_never_reaches_the_store() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use super::fakes::TableGeocoder;
    use crate::db::MemStore;
    use crate::entities::NewWaypoint;

    let engine = Engine::new(Arc::new(MemStore::new()), Arc::new(TableGeocoder::default()));

    let err = block_on(engine.create_route(NewRoute {
        name: Some("Stub".into()),
        waypoints: Some(vec![NewWaypoint {
            latitude: Some(17.98),
            longitude: Some(79.53),
            ..Default::default()
        }]),
        ..Default::default()
    }))
    .unwrap_err();

    assert!(err.is_validation());
    assert!(block_on(engine.list_routes()).unwrap().is_empty());
}

#[test]
fn update_and_delete_route() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use super::fakes::TableGeocoder;
    use crate::db::MemStore;
    use crate::entities::NewWaypoint;

    let engine = Engine::new(Arc::new(MemStore::new()), Arc::new(TableGeocoder::default()));
    let point = |latitude, longitude| NewWaypoint {
        latitude: Some(latitude),
        longitude: Some(longitude),
        ..Default::default()
    };

    let route = block_on(engine.create_route(NewRoute {
        name: Some("Library Walk".into()),
        waypoints: Some(vec![point(17.98, 79.53), point(17.99, 79.54)]),
        ..Default::default()
    }))
    .unwrap();

    let updated = block_on(engine.update_route(
        route.id,
        RouteUpdate {
            name: Some("Library Walk (long)".into()),
            waypoints: Some(vec![point(17.98, 79.53), point(17.985, 79.535), point(17.99, 79.54)]),
            ..Default::default()
        },
    ))
    .unwrap();
    assert_eq!(updated.waypoints.len(), 3);
    assert_eq!(updated.created_at, route.created_at);

    let deleted = block_on(engine.delete_route(route.id)).unwrap();
    assert_eq!(deleted.name, "Library Walk (long)");
    assert!(block_on(engine.find_route(route.id)).unwrap_err().is_not_found());
}
