pub mod memory;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, types::Json, Executor, Pool, Postgres, Row};
use uuid::Uuid;

use crate::entities::{Category, Place, Route};
use crate::error::Error;

pub use memory::MemStore;

/// Category filter over decoded documents, shared by every store.
pub(crate) fn in_category(place: &Place, category: Option<Category>) -> bool {
    category.map_or(true, |c| place.category == c)
}

/// Document persistence for places and routes.
///
/// Lookups return `None` for unknown ids; deciding what that means is left
/// to the caller.
#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_place(&self, place: &Place) -> Result<(), Error>;
    async fn find_place(&self, id: Uuid) -> Result<Option<Place>, Error>;
    async fn find_place_by_name(&self, name: &str) -> Result<Option<Place>, Error>;
    /// Active places only, unsorted.
    async fn list_places(&self, category: Option<Category>) -> Result<Vec<Place>, Error>;
    async fn update_place(&self, place: &Place) -> Result<bool, Error>;
    async fn delete_place(&self, id: Uuid) -> Result<Option<Place>, Error>;

    async fn insert_route(&self, route: &Route) -> Result<(), Error>;
    async fn find_route(&self, id: Uuid) -> Result<Option<Route>, Error>;
    async fn list_routes(&self) -> Result<Vec<Route>, Error>;
    async fn update_route(&self, route: &Route) -> Result<bool, Error>;
    async fn delete_route(&self, id: Uuid) -> Result<Option<Route>, Error>;
}

pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    #[tracing::instrument(name = "PgStore::new", skip(db_uri))]
    pub async fn new(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_uri)
            .await?;

        // TODO: move this to migrations
        pool.execute("CREATE TABLE IF NOT EXISTS places (id UUID PRIMARY KEY, data JSONB NOT NULL)")
            .await?;
        pool.execute("CREATE INDEX IF NOT EXISTS places_name ON places ((data->>'name'))")
            .await?;
        pool.execute("CREATE TABLE IF NOT EXISTS routes (id UUID PRIMARY KEY, data JSONB NOT NULL)")
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for PgStore {
    #[tracing::instrument(skip_all, fields(id = %place.id))]
    async fn insert_place(&self, place: &Place) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;
        conn.execute(
            sqlx::query("INSERT INTO places (id, data) VALUES ($1, $2)")
                .bind(&place.id)
                .bind(Json(place)),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_place(&self, id: Uuid) -> Result<Option<Place>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM places WHERE id = $1").bind(&id))
            .await?;

        match maybe_result {
            Some(row) => {
                let Json(place) = row.try_get("data")?;
                Ok(Some(place))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn find_place_by_name(&self, name: &str) -> Result<Option<Place>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(
                sqlx::query("SELECT data FROM places WHERE data->>'name' = $1 LIMIT 1").bind(name),
            )
            .await?;

        match maybe_result {
            Some(row) => {
                let Json(place) = row.try_get("data")?;
                Ok(Some(place))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list_places(&self, category: Option<Category>) -> Result<Vec<Place>, Error> {
        let mut conn = self.pool.acquire().await?;

        // Filtered after decoding so unrecognised stored categories count as `other`.
        let rows = conn
            .fetch_all(sqlx::query(
                "SELECT data FROM places WHERE (data->>'isActive')::boolean",
            ))
            .await?;

        let mut places = Vec::with_capacity(rows.len());
        for row in rows {
            let Json(place): Json<Place> = row.try_get("data")?;
            if in_category(&place, category) {
                places.push(place);
            }
        }

        Ok(places)
    }

    #[tracing::instrument(skip_all, fields(id = %place.id))]
    async fn update_place(&self, place: &Place) -> Result<bool, Error> {
        let mut conn = self.pool.acquire().await?;
        let result = conn
            .execute(
                sqlx::query("UPDATE places SET data = $2 WHERE id = $1")
                    .bind(&place.id)
                    .bind(Json(place)),
            )
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_place(&self, id: Uuid) -> Result<Option<Place>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("DELETE FROM places WHERE id = $1 RETURNING data").bind(&id))
            .await?;

        match maybe_result {
            Some(row) => {
                let Json(place) = row.try_get("data")?;
                Ok(Some(place))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip_all, fields(id = %route.id))]
    async fn insert_route(&self, route: &Route) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;
        conn.execute(
            sqlx::query("INSERT INTO routes (id, data) VALUES ($1, $2)")
                .bind(&route.id)
                .bind(Json(route)),
        )
        .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_route(&self, id: Uuid) -> Result<Option<Route>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("SELECT data FROM routes WHERE id = $1").bind(&id))
            .await?;

        match maybe_result {
            Some(row) => {
                let Json(route) = row.try_get("data")?;
                Ok(Some(route))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list_routes(&self) -> Result<Vec<Route>, Error> {
        let mut conn = self.pool.acquire().await?;
        let rows = conn.fetch_all(sqlx::query("SELECT data FROM routes")).await?;

        rows.iter()
            .map(|row| -> Result<Route, Error> {
                let Json(route) = row.try_get("data")?;
                Ok(route)
            })
            .collect()
    }

    #[tracing::instrument(skip_all, fields(id = %route.id))]
    async fn update_route(&self, route: &Route) -> Result<bool, Error> {
        let mut conn = self.pool.acquire().await?;
        let result = conn
            .execute(
                sqlx::query("UPDATE routes SET data = $2 WHERE id = $1")
                    .bind(&route.id)
                    .bind(Json(route)),
            )
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_route(&self, id: Uuid) -> Result<Option<Route>, Error> {
        let mut conn = self.pool.acquire().await?;

        let maybe_result = conn
            .fetch_optional(sqlx::query("DELETE FROM routes WHERE id = $1 RETURNING data").bind(&id))
            .await?;

        match maybe_result {
            Some(row) => {
                let Json(route) = row.try_get("data")?;
                Ok(Some(route))
            }
            None => Ok(None),
        }
    }
}

#[test]
fn unknown_stored_category_is_listed_as_other() {
    use crate::entities::place::sample_place;

    let mut json = serde_json::to_value(sample_place("Chai Point", Category::Eateries)).unwrap();
    json["category"] = "cafeteria".into();
    let place: Place = serde_json::from_value(json).unwrap();

    assert!(in_category(&place, Some(Category::Other)));
    assert!(!in_category(&place, Some(Category::Eateries)));
    assert!(in_category(&place, None));
}
