pub mod health;
pub mod imports;
pub mod places;
pub mod routes;
pub mod weather;

#[cfg(test)]
pub fn test_api() -> crate::api::DynAPI {
    use std::sync::Arc;

    use crate::db::MemStore;
    use crate::engine::{fakes::TableGeocoder, Engine};

    Arc::new(Engine::new(
        Arc::new(MemStore::new()),
        Arc::new(TableGeocoder::default()),
    ))
}
