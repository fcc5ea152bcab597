mod handlers;

use std::net::SocketAddr;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::api::DynAPI;
use crate::error::{unexpected_error, Error};
use crate::server::handlers::{health, imports, places, routes, weather};

pub fn router(api: DynAPI) -> Router {
    Router::new()
        .route("/api/health", get(health::check))
        .route("/api/places", get(places::list).post(places::create))
        .route("/api/places/category/:category", get(places::list_by_category))
        .route(
            "/api/places/populate-college-places",
            post(imports::populate_college_places),
        )
        .route("/api/places/import-from-osm", post(imports::import_from_osm))
        .route("/api/places/bulk-import", post(imports::bulk_import))
        .route("/api/places/fetch-from-mapbox", post(imports::fetch_from_mapbox))
        .route(
            "/api/places/:id",
            get(places::find).put(places::update).delete(places::delete),
        )
        .route("/api/routes", get(routes::list).post(routes::create))
        .route(
            "/api/routes/:id",
            get(routes::find).put(routes::update).delete(routes::delete),
        )
        .route("/api/weather", get(weather::current))
        .layer(Extension(api))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

pub async fn serve(api: DynAPI, addr: SocketAddr) -> Result<(), Error> {
    let app = router(api);

    tracing::info!("listening on {}", addr);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await
        .map_err(unexpected_error)
}
