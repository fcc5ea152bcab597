use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::{stream, StreamExt};

use super::Engine;
use crate::{
    api::ImportAPI,
    entities::{
        Category, Coordinates, ImportCandidate, ImportResults, ImportSummary, NewPlace, Place,
    },
    error::{config_error, Error},
    external::{GeocodeHit, Poi},
};

const CAMPUS_CITY: &str = "NIT Warangal, Warangal, Telangana, India";
const DEFAULT_CITY: &str = "Warangal, Telangana, India";
const CAMPUS_CENTRE: Coordinates = Coordinates {
    lat: 17.9833,
    lng: 79.5300,
};

const ALREADY_EXISTS: &str = "Already exists";
const APPROXIMATE: &str = "Used approximate coordinates";

/// POIs further than this from the campus centre are not seeded.
const SEED_RADIUS_METERS: f64 = 2000.0;
const GRID_STEPS: usize = 5;
const GRID_SOUTH_WEST: Coordinates = Coordinates {
    lat: 17.9750,
    lng: 79.5200,
};
const GRID_NORTH_EAST: Coordinates = Coordinates {
    lat: 17.9920,
    lng: 79.5400,
};
const GRID_CONCURRENCY: usize = 4;

pub const COLLEGE_PLACES: [(&str, Category, &str); 26] = [
    ("NIT Warangal Main Building", Category::Educational, "Main administrative and academic building"),
    ("NIT Warangal CSE Department", Category::Educational, "Computer Science and Engineering Department"),
    ("NIT Warangal ECE Department", Category::Educational, "Electronics and Communication Engineering Department"),
    ("NIT Warangal Mechanical Department", Category::Educational, "Mechanical Engineering Department"),
    ("NIT Warangal Civil Department", Category::Educational, "Civil Engineering Department"),
    ("NIT Warangal Electrical Department", Category::Educational, "Electrical Engineering Department"),
    ("NIT Warangal Chemical Department", Category::Educational, "Chemical Engineering Department"),
    ("NIT Warangal Library", Category::Library, "Central library with books and study spaces"),
    ("NIT Warangal Registrar Office", Category::Administration, "Registrar and administrative services"),
    ("NIT Warangal Dean Office", Category::Administration, "Dean of Academic Affairs office"),
    ("NIT Warangal Stadium", Category::Recreation, "Main sports stadium"),
    ("NIT Warangal Gymnasium", Category::Recreation, "Gym and fitness center"),
    ("NIT Warangal Swimming Pool", Category::Recreation, "Swimming pool facility"),
    ("NIT Warangal Badminton Court", Category::Recreation, "Badminton courts"),
    ("NIT Warangal Basketball Court", Category::Recreation, "Basketball courts"),
    ("NIT Warangal Cricket Ground", Category::Recreation, "Cricket playing ground"),
    ("NIT Warangal Mess", Category::Eateries, "Main mess/cafeteria"),
    ("NIT Warangal Canteen", Category::Eateries, "College canteen"),
    ("NIT Warangal Food Court", Category::Eateries, "Food court with various vendors"),
    ("NIT Warangal Hostel Block A", Category::Hostel, "Boys hostel block A"),
    ("NIT Warangal Hostel Block B", Category::Hostel, "Boys hostel block B"),
    ("NIT Warangal Girls Hostel", Category::Hostel, "Girls hostel"),
    ("NIT Warangal Staff Quarters", Category::StaffQuarters, "Staff residential quarters"),
    ("NIT Warangal Gate", Category::Other, "Main entrance gate"),
    ("NIT Warangal Parking", Category::Other, "Main parking area"),
    ("NIT Warangal Medical Center", Category::Other, "Health center and medical facility"),
];

/// Reported name for items that arrive without one.
const UNNAMED: &str = "Unknown";

/// Field messages if there are any, else the error message.
fn describe(err: &Error) -> String {
    if err.fields.is_empty() {
        return err.message.clone();
    }

    err.fields
        .iter()
        .map(|f| f.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn grid() -> Vec<Coordinates> {
    let step = |from: f64, to: f64, i: usize| from + (to - from) * i as f64 / (GRID_STEPS - 1) as f64;

    (0..GRID_STEPS)
        .flat_map(|row| {
            (0..GRID_STEPS).map(move |col| Coordinates {
                lat: step(GRID_SOUTH_WEST.lat, GRID_NORTH_EAST.lat, row),
                lng: step(GRID_SOUTH_WEST.lng, GRID_NORTH_EAST.lng, col),
            })
        })
        .collect()
}

/// Near-campus POIs keyed by name, first sighting wins.
fn nearby_by_name(pois: impl IntoIterator<Item = Poi>) -> BTreeMap<String, Poi> {
    let mut seen = BTreeMap::new();

    for poi in pois {
        let name = poi.name.trim().to_string();
        if name.is_empty() || poi.coordinates.distance_to(&CAMPUS_CENTRE) > SEED_RADIUS_METERS {
            continue;
        }
        seen.entry(name).or_insert(poi);
    }

    seen
}

impl Engine {
    /// Provider failures count as a miss; bulk jobs never abort on one item.
    async fn lookup(&self, name: &str, city: &str) -> Option<GeocodeHit> {
        match self.geocoder.geocode(name, city).await {
            Ok(hit) => hit,
            Err(err) => {
                tracing::warn!(name, error = %err, "geocoding failed");
                None
            }
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, Error> {
        Ok(self.store.find_place_by_name(name).await?.is_some())
    }

    async fn save(&self, results: &mut ImportResults, params: NewPlace, note: Option<&str>) {
        let name = params
            .name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| UNNAMED.into());

        let place = match Place::new(params) {
            Ok(place) => place,
            Err(err) => return results.failed(&name, &describe(&err)),
        };

        match self.store.insert_place(&place).await {
            Ok(()) => results.created(&place.name, place.coordinates(), note),
            Err(err) => results.failed(&place.name, &describe(&err)),
        }
    }
}

#[async_trait]
impl ImportAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn populate_college_places(&self) -> Result<ImportSummary, Error> {
        let mut results = ImportResults::default();

        for (name, category, description) in COLLEGE_PLACES {
            match self.exists(name).await {
                Ok(true) => {
                    results.skipped(name, ALREADY_EXISTS);
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    results.failed(name, &describe(&err));
                    continue;
                }
            }

            let (coordinates, note) = match self.lookup(name, CAMPUS_CITY).await {
                Some(hit) => (hit.coordinates, None),
                None => (CAMPUS_CENTRE, Some(APPROXIMATE)),
            };

            let params = NewPlace {
                name: Some(name.into()),
                description: Some(description.into()),
                category: Some(category.name().into()),
                latitude: Some(coordinates.lat),
                longitude: Some(coordinates.lng),
                ..Default::default()
            };
            self.save(&mut results, params, note).await;
        }

        Ok(results.summarize("College places populated"))
    }

    #[tracing::instrument(skip_all, fields(count = places.len()))]
    async fn import_from_osm(&self, places: Vec<ImportCandidate>) -> Result<ImportSummary, Error> {
        let mut results = ImportResults::default();

        for candidate in places {
            let name = candidate.name.as_deref().map(str::trim).unwrap_or_default();
            if name.is_empty() {
                results.failed(UNNAMED, "Name is required");
                continue;
            }

            match self.exists(name).await {
                Ok(true) => {
                    results.skipped(name, ALREADY_EXISTS);
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    results.failed(name, &describe(&err));
                    continue;
                }
            }

            let city = candidate.city.as_deref().unwrap_or(DEFAULT_CITY);
            let hit = match self.lookup(name, city).await {
                Some(hit) => hit,
                None => {
                    results.failed(name, "Could not find coordinates");
                    continue;
                }
            };

            let params = NewPlace {
                name: Some(name.into()),
                description: candidate
                    .description
                    .filter(|d| !d.trim().is_empty())
                    .or(Some(hit.display_name)),
                category: candidate.category,
                latitude: Some(hit.coordinates.lat),
                longitude: Some(hit.coordinates.lng),
                ..Default::default()
            };
            self.save(&mut results, params, None).await;
        }

        Ok(results.summarize("Import completed"))
    }

    #[tracing::instrument(skip_all, fields(count = places.len()))]
    async fn bulk_import(&self, places: Vec<NewPlace>) -> Result<ImportSummary, Error> {
        let mut results = ImportResults::default();

        for params in places {
            let name = match params.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
                Some(name) => name.to_string(),
                // Nothing to dedupe against; validation reports the missing name.
                None => {
                    self.save(&mut results, params, None).await;
                    continue;
                }
            };

            match self.exists(&name).await {
                Ok(true) => {
                    results.skipped(&name, ALREADY_EXISTS);
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    results.failed(&name, &describe(&err));
                    continue;
                }
            }

            self.save(&mut results, params, None).await;
        }

        Ok(results.summarize("Bulk import completed"))
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_from_mapbox(&self) -> Result<ImportSummary, Error> {
        let reverse_geocoder = self
            .reverse_geocoder
            .as_ref()
            .ok_or_else(|| config_error("MAPBOX_ACCESS_TOKEN is not set"))?;

        let scans: Vec<Vec<Poi>> = stream::iter(grid())
            .map(|at| async move {
                match reverse_geocoder.points_of_interest(at).await {
                    Ok(pois) => pois,
                    Err(err) => {
                        tracing::warn!(lat = at.lat, lng = at.lng, error = %err, "grid scan failed");
                        vec![]
                    }
                }
            })
            .buffer_unordered(GRID_CONCURRENCY)
            .collect()
            .await;

        let found = nearby_by_name(scans.into_iter().flatten());
        tracing::info!(count = found.len(), "points of interest near campus");

        let mut results = ImportResults::default();

        for (name, poi) in found {
            match self.exists(&name).await {
                Ok(true) => {
                    results.skipped(&name, ALREADY_EXISTS);
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    results.failed(&name, &describe(&err));
                    continue;
                }
            }

            let params = NewPlace {
                category: Some(Category::guess(&name).name().into()),
                latitude: Some(poi.coordinates.lat),
                longitude: Some(poi.coordinates.lng),
                name: Some(name),
                ..Default::default()
            };
            self.save(&mut results, params, None).await;
        }

        Ok(results.summarize("Mapbox places fetched"))
    }
}

#[test]
fn populate_skips_existing_and_falls_back_on_misses() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use super::fakes::TableGeocoder;
    use crate::api::PlaceAPI;
    use crate::db::{MemStore, Store};
    use crate::entities::place::sample_place;

    let store = Arc::new(MemStore::new());
    block_on(store.insert_place(&sample_place("NIT Warangal Library", Category::Library))).unwrap();

    let geocoder = Arc::new(
        TableGeocoder::default()
            .with_hit("NIT Warangal Stadium", Coordinates::new(17.9851, 79.5322))
            .with_failure("NIT Warangal Mess"),
    );
    let engine = Engine::new(store, geocoder.clone());

    let summary = block_on(engine.populate_college_places()).unwrap();

    assert_eq!(summary.message, "College places populated: 25 created, 0 failed, 1 skipped");
    assert_eq!(summary.results.skipped[0].name, "NIT Warangal Library");
    assert_eq!(summary.results.skipped[0].reason, "Already exists");

    let stadium = summary
        .results
        .created
        .iter()
        .find(|c| c.name == "NIT Warangal Stadium")
        .unwrap();
    assert_eq!(stadium.coordinates, Coordinates::new(17.9851, 79.5322));
    assert_eq!(stadium.note, None);

    let mess = summary
        .results
        .created
        .iter()
        .find(|c| c.name == "NIT Warangal Mess")
        .unwrap();
    assert_eq!(mess.coordinates, CAMPUS_CENTRE);
    assert_eq!(mess.note.as_deref(), Some("Used approximate coordinates"));

    let queries = geocoder.queries.lock().unwrap();
    assert_eq!(queries.len(), 25);
    assert!(queries.contains(&format!("NIT Warangal Gate, {}", CAMPUS_CITY)));
    drop(queries);

    let libraries = block_on(engine.list_places(Some(Category::Library))).unwrap();
    assert_eq!(libraries.len(), 1);

    let again = block_on(engine.populate_college_places()).unwrap();
    assert_eq!(again.message, "College places populated: 0 created, 0 failed, 26 skipped");
}

#[test]
fn osm_import_classifies_every_candidate() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use super::fakes::TableGeocoder;
    use crate::api::PlaceAPI;
    use crate::db::MemStore;

    let geocoder = TableGeocoder::default()
        .with_hit("Kazipet Junction", Coordinates::new(17.9746, 79.5118))
        .with_hit("Bhadrakali Temple", Coordinates::new(17.9949, 79.5824));
    let engine = Engine::new(Arc::new(MemStore::new()), Arc::new(geocoder));

    let candidate = |name: Option<&str>, category: Option<&str>| ImportCandidate {
        name: name.map(Into::into),
        category: category.map(Into::into),
        ..Default::default()
    };

    let summary = block_on(engine.import_from_osm(vec![
        candidate(Some("Kazipet Junction"), None),
        candidate(None, None),
        candidate(Some("Nowhere Hall"), None),
        candidate(Some("Bhadrakali Temple"), Some("shrine")),
        candidate(Some("Kazipet Junction"), None),
    ]))
    .unwrap();

    assert_eq!(summary.message, "Import completed: 1 created, 3 failed, 1 skipped");
    let errors: Vec<(&str, &str)> = summary
        .results
        .failed
        .iter()
        .map(|f| (f.name.as_str(), f.error.as_str()))
        .collect();
    assert_eq!(
        errors,
        vec![
            ("Unknown", "Name is required"),
            ("Nowhere Hall", "Could not find coordinates"),
            ("Bhadrakali Temple", "Valid category is required"),
        ]
    );

    let places = block_on(engine.list_places(None)).unwrap();
    assert_eq!(places[0].description, "Kazipet Junction, Warangal, Telangana, India");
    assert_eq!(places[0].category, Category::Other);
}

#[test]
fn bulk_import_validates_each_item() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use super::fakes::TableGeocoder;
    use crate::db::MemStore;

    let engine = Engine::new(Arc::new(MemStore::new()), Arc::new(TableGeocoder::default()));
    let item = |name: &str, latitude: f64| NewPlace {
        name: Some(name.into()),
        latitude: Some(latitude),
        longitude: Some(79.53),
        ..Default::default()
    };

    let summary = block_on(engine.bulk_import(vec![
        item("Post Office", 17.98),
        item("Sunken Garden", 95.0),
        item("Post Office", 17.99),
    ]))
    .unwrap();

    assert_eq!(summary.message, "Bulk import completed: 1 created, 1 failed, 1 skipped");
    assert_eq!(summary.results.failed[0].error, "Valid latitude is required");
}

#[test]
fn bulk_import_fails_nameless_items_even_beside_an_unknown_place() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use super::fakes::TableGeocoder;
    use crate::db::{MemStore, Store};
    use crate::entities::place::sample_place;

    let store = Arc::new(MemStore::new());
    block_on(store.insert_place(&sample_place("Unknown", Category::Other))).unwrap();
    let engine = Engine::new(store, Arc::new(TableGeocoder::default()));

    let summary = block_on(engine.bulk_import(vec![NewPlace {
        name: Some("   ".into()),
        latitude: Some(17.98),
        longitude: Some(79.53),
        ..Default::default()
    }]))
    .unwrap();

    assert!(summary.results.skipped.is_empty());
    assert_eq!(summary.results.failed.len(), 1);
    assert_eq!(summary.results.failed[0].name, "Unknown");
    assert_eq!(summary.results.failed[0].error, "Place name is required");
}

#[test]
fn mapbox_seeding_keeps_nearby_unique_names() {
    use std::sync::Arc;
    use tokio_test::block_on;

    use super::fakes::{FixedPois, TableGeocoder};
    use crate::db::MemStore;

    let poi = |name: &str, lat, lng| Poi {
        name: name.into(),
        coordinates: Coordinates::new(lat, lng),
    };
    let engine = Engine::new(Arc::new(MemStore::new()), Arc::new(TableGeocoder::default()));

    let err = block_on(engine.fetch_from_mapbox()).unwrap_err();
    assert!(err.is_config());

    let engine = engine.with_reverse_geocoder(Arc::new(FixedPois(vec![
        poi("Sri Sai Canteen", 17.9840, 79.5310),
        poi("Central Library", 17.9843, 79.5305),
        poi("Warangal Fort", 17.9575, 79.6140),
    ])));

    let summary = block_on(engine.fetch_from_mapbox()).unwrap();
    assert_eq!(summary.message, "Mapbox places fetched: 2 created, 0 failed, 0 skipped");

    let names: Vec<&str> = summary.results.created.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Central Library", "Sri Sai Canteen"]);
}

#[test]
fn grid_spans_the_campus_box() {
    let points = grid();

    assert_eq!(points.len(), GRID_STEPS * GRID_STEPS);
    assert_eq!(points[0], GRID_SOUTH_WEST);
    assert!((points[points.len() - 1].lat - GRID_NORTH_EAST.lat).abs() < 1e-9);
    assert!((points[points.len() - 1].lng - GRID_NORTH_EAST.lng).abs() < 1e-9);
}
