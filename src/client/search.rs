use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::api::PlaceAPI;
use crate::entities::{Place, Suggestion};
use crate::error::Error;
use crate::external::SuggestionProvider;

pub const DEBOUNCE: Duration = Duration::from_millis(300);
pub const MIN_QUERY_CHARS: usize = 2;

pub fn local_matches(places: &[Place], query: &str) -> Vec<Suggestion> {
    places
        .iter()
        .filter(|p| p.matches(query))
        .map(Suggestion::from)
        .collect()
}

/// Local places always come before provider results.
pub fn merge_suggestions(local: Vec<Suggestion>, external: Vec<Suggestion>) -> Vec<Suggestion> {
    let mut merged = local;
    merged.extend(external);
    merged
}

/// Autocomplete over the cached place list plus an optional geocoder.
pub struct LocationSearch {
    places: RwLock<Vec<Place>>,
    provider: Option<Arc<dyn SuggestionProvider>>,
    generation: AtomicU64,
    debounce: Duration,
}

impl LocationSearch {
    pub fn new(provider: Option<Arc<dyn SuggestionProvider>>) -> Self {
        Self {
            places: RwLock::new(vec![]),
            provider,
            generation: AtomicU64::new(0),
            debounce: DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub async fn set_places(&self, places: Vec<Place>) {
        *self.places.write().await = places;
    }

    /// Reloads the place cache, returning how many places it now holds.
    pub async fn refresh_places<A>(&self, api: &A) -> Result<usize, Error>
    where
        A: PlaceAPI + ?Sized,
    {
        let places = api.list_places(None).await?;
        let count = places.len();
        self.set_places(places).await;

        Ok(count)
    }

    /// Refreshes the cache on a fixed period; failed refreshes keep the old list.
    pub async fn refresh_every<A>(&self, api: &A, period: Duration)
    where
        A: PlaceAPI + ?Sized,
    {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            if let Err(err) = self.refresh_places(api).await {
                tracing::warn!(error = %err, "place cache refresh failed");
            }
        }
    }

    /// Undebounced lookup. A failing provider leaves only the local matches.
    pub async fn search_now(&self, query: &str) -> Vec<Suggestion> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return vec![];
        }

        let local = local_matches(&self.places.read().await, query);

        let external = match &self.provider {
            Some(provider) => match provider.suggest(query).await {
                Ok(found) => found,
                Err(err) => {
                    tracing::warn!(error = %err, "external search failed");
                    vec![]
                }
            },
            None => vec![],
        };

        merge_suggestions(local, external)
    }

    /// Call once per keystroke. Returns `None` when a newer keystroke arrived
    /// before this one's results were ready.
    pub async fn search(&self, query: &str) -> Option<Vec<Suggestion>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let is_current = || self.generation.load(Ordering::SeqCst) == generation;

        tokio::time::sleep(self.debounce).await;
        if !is_current() {
            return None;
        }

        let suggestions = self.search_now(query).await;

        is_current().then(|| suggestions)
    }
}

#[cfg(test)]
struct FixedSuggestions(Result<Vec<Suggestion>, Error>);

#[cfg(test)]
#[async_trait::async_trait]
impl SuggestionProvider for FixedSuggestions {
    async fn suggest(&self, _query: &str) -> Result<Vec<Suggestion>, Error> {
        self.0.clone()
    }
}

#[cfg(test)]
fn external(name: &str) -> Suggestion {
    Suggestion {
        name: name.into(),
        lng: 79.56,
        lat: 18.01,
        context: "Hanamkonda, Telangana".into(),
        is_local: false,
        description: None,
    }
}

#[test]
fn local_places_rank_before_provider_results() {
    use crate::entities::{place::sample_place, Category};
    use tokio_test::block_on;

    let provider = FixedSuggestions(Ok(vec![external("Library Road, Hanamkonda")]));
    let search = LocationSearch::new(Some(Arc::new(provider)));

    let mut library = sample_place("NIT Warangal Library", Category::Library);
    library.description = "Central library with books".into();
    block_on(search.set_places(vec![
        sample_place("NIT Warangal Canteen", Category::Eateries),
        library,
    ]));

    let found = block_on(search.search_now("library"));
    let names: Vec<(&str, bool)> = found.iter().map(|s| (s.name.as_str(), s.is_local)).collect();
    assert_eq!(
        names,
        vec![("NIT Warangal Library", true), ("Library Road, Hanamkonda", false)]
    );
    assert_eq!(found[0].context, "Library");
}

#[test]
fn short_queries_and_provider_failures() {
    use crate::entities::{place::sample_place, Category};
    use crate::error::upstream_error;
    use tokio_test::block_on;

    let provider = FixedSuggestions(Err(upstream_error("Mapbox API error: 401")));
    let search = LocationSearch::new(Some(Arc::new(provider)));
    block_on(search.set_places(vec![sample_place("Main Gate", Category::Other)]));

    assert!(block_on(search.search_now("m")).is_empty());

    let found = block_on(search.search_now("gate"));
    assert_eq!(found.len(), 1);
    assert!(found[0].is_local);
}

#[test]
fn only_latest_keystroke_completes() {
    use tokio_test::block_on;

    let provider = FixedSuggestions(Ok(vec![external("Kazipet")]));
    let search = LocationSearch::new(Some(Arc::new(provider))).with_debounce(Duration::from_millis(20));

    let (first, second) = block_on(async {
        let first = search.search("ka");
        let second = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            search.search("kaz").await
        };
        futures::join!(first, second)
    });

    assert_eq!(first, None);
    assert_eq!(second.unwrap().len(), 1);
}
