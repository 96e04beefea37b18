//! State machine behind the browse/search screen.
//!
//! The controller owns the search text, the primary result list and the
//! autocomplete suggestions. Every fetch runs as its own task and reports back
//! through a channel; [`SearchController::next_event`] applies those reports
//! in arrival order. Each list carries a sequence number so that a slow,
//! superseded response can never overwrite a newer one.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

use crate::{City, Route, UpstreamError, debounce::Debouncer, provider::CitySearchProvider};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Size of the unfiltered browse page.
    pub page_size: u32,
    /// Quiet period before suggestions are fetched.
    pub debounce: Duration,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// What the browse/search screen shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<City>,
    pub suggestions: Vec<City>,
    pub loading: bool,
    pub show_suggestions: bool,
}

impl SearchState {
    /// Suggestions that should currently be drawn under the search box.
    pub fn visible_suggestions(&self) -> &[City] {
        if self.show_suggestions {
            &self.suggestions
        } else {
            &[]
        }
    }
}

#[derive(Debug)]
enum Slot {
    Results,
    Suggestions,
}

#[derive(Debug)]
struct Completion {
    slot: Slot,
    seq: u64,
    outcome: Result<Vec<City>, UpstreamError>,
}

/// Result of applying one completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchUpdate {
    Results,
    Suggestions,
    /// The response belonged to a request that has since been superseded.
    Stale,
}

#[derive(Debug)]
pub struct SearchController {
    provider: Arc<dyn CitySearchProvider>,
    settings: SearchSettings,
    state: SearchState,
    results_seq: u64,
    suggestions_seq: u64,
    debouncer: Debouncer,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl SearchController {
    pub fn new(provider: Arc<dyn CitySearchProvider>, settings: SearchSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider,
            settings,
            state: SearchState::default(),
            results_seq: 0,
            suggestions_seq: 0,
            debouncer: Debouncer::new(settings.debounce),
            tx,
            rx,
        }
    }

    /// Starts the screen with the query carried by the browse route, if any.
    pub fn mount(&mut self, initial_query: Option<&str>) {
        self.state.query = initial_query.unwrap_or_default().to_string();
        self.refresh_results();
        self.refresh_suggestions();
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Route mirroring the current query.
    pub fn location(&self) -> Route {
        Route::browse(&self.state.query)
    }

    /// Records a keystroke. Unchanged text issues nothing.
    pub fn set_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.state.query {
            return;
        }

        self.state.query = text;
        self.refresh_results();
        self.refresh_suggestions();
    }

    /// Search-button press: trims the query and runs the primary search once.
    pub fn submit(&mut self) {
        self.state.query = self.state.query.trim().to_string();
        self.close_suggestions();
        self.refresh_results();
    }

    /// Picks the suggestion at `index` as the new query.
    pub fn select_suggestion(&mut self, index: usize) -> bool {
        let Some(city) = self.state.suggestions.get(index) else {
            return false;
        };

        self.state.query = city.name.clone();
        self.close_suggestions();
        self.refresh_results();
        true
    }

    /// Route to the detail view for the result row at `index`.
    pub fn select_row(&self, index: usize) -> Option<Route> {
        self.state.results.get(index).map(|city| Route::detail(city.name.clone()))
    }

    pub fn focus(&mut self) {
        self.state.show_suggestions = true;
    }

    pub fn blur(&mut self) {
        self.state.show_suggestions = false;
    }

    /// Waits for the next fetch to finish and applies it.
    pub async fn next_event(&mut self) -> SearchUpdate {
        // The controller holds a sender itself, so the channel never closes.
        match self.rx.recv().await {
            Some(completion) => self.apply(completion),
            None => SearchUpdate::Stale,
        }
    }

    /// Applies every fetch that has already finished, without waiting.
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Applies completions until the latest primary fetch has landed.
    pub async fn settle(&mut self) -> &SearchState {
        while self.state.loading {
            self.next_event().await;
        }
        &self.state
    }

    fn close_suggestions(&mut self) {
        self.debouncer.cancel();
        // Invalidate a suggestion fetch that already left the debouncer.
        self.suggestions_seq += 1;
        self.state.show_suggestions = false;
    }

    fn refresh_results(&mut self) {
        self.results_seq += 1;
        self.state.loading = true;

        let seq = self.results_seq;
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        let query = self.state.query.trim().to_string();
        let page_size = self.settings.page_size;

        tokio::spawn(async move {
            let outcome = if query.is_empty() {
                provider.list_cities(page_size, 0).await
            } else {
                provider.find_cities_by_prefix(&query).await
            };
            let _ = tx.send(Completion {
                slot: Slot::Results,
                seq,
                outcome,
            });
        });
    }

    fn refresh_suggestions(&mut self) {
        self.suggestions_seq += 1;

        let query = self.state.query.trim().to_string();
        if query.is_empty() {
            self.debouncer.cancel();
            self.state.suggestions.clear();
            self.state.show_suggestions = false;
            return;
        }

        let seq = self.suggestions_seq;
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();

        self.debouncer.schedule(async move {
            let outcome = provider.find_cities_by_prefix(&query).await;
            let _ = tx.send(Completion {
                slot: Slot::Suggestions,
                seq,
                outcome,
            });
        });
    }

    fn apply(&mut self, completion: Completion) -> SearchUpdate {
        let Completion { slot, seq, outcome } = completion;

        match slot {
            Slot::Results if seq == self.results_seq => {
                self.state.loading = false;
                self.state.results = outcome.unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "city search failed, showing no results");
                    Vec::new()
                });
                SearchUpdate::Results
            }
            Slot::Suggestions if seq == self.suggestions_seq => {
                match outcome {
                    Ok(cities) => {
                        self.state.suggestions = cities;
                        self.state.show_suggestions = true;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "suggestion lookup failed");
                        self.state.suggestions.clear();
                        self.state.show_suggestions = false;
                    }
                }
                SearchUpdate::Suggestions
            }
            _ => {
                tracing::debug!(?slot, seq, "discarding superseded response");
                SearchUpdate::Stale
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        List(u32, u32),
        Prefix(String),
    }

    /// In-memory dataset that records every call and can delay answers.
    #[derive(Debug, Default)]
    struct FakeCities {
        cities: Vec<City>,
        calls: Mutex<Vec<Call>>,
        delays: Vec<(String, Duration)>,
        fail: bool,
    }

    impl FakeCities {
        fn with(names: &[&str]) -> Self {
            Self {
                cities: names.iter().map(|n| city(n)).collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn prefix_calls(&self, prefix: &str) -> usize {
            self.calls()
                .iter()
                .filter(|c| **c == Call::Prefix(prefix.to_string()))
                .count()
        }
    }

    #[async_trait]
    impl CitySearchProvider for FakeCities {
        async fn list_cities(&self, limit: u32, start: u32) -> Result<Vec<City>, UpstreamError> {
            self.calls.lock().unwrap().push(Call::List(limit, start));
            if self.fail {
                return Err(UpstreamError::malformed("fake", "down"));
            }
            Ok(self.cities.iter().skip(start as usize).take(limit as usize).cloned().collect())
        }

        async fn find_cities_by_prefix(&self, prefix: &str) -> Result<Vec<City>, UpstreamError> {
            self.calls.lock().unwrap().push(Call::Prefix(prefix.to_string()));
            if let Some((_, delay)) = self.delays.iter().find(|(p, _)| p == prefix) {
                tokio::time::sleep(*delay).await;
            }
            if self.fail {
                return Err(UpstreamError::malformed("fake", "down"));
            }
            Ok(self.cities.iter().filter(|c| c.name.starts_with(prefix)).cloned().collect())
        }
    }

    fn city(name: &str) -> City {
        City {
            geoname_id: name.to_lowercase(),
            name: name.to_string(),
            ascii_name: None,
            country_name: Some("Testland".into()),
            country_code: Some("TL".into()),
            population: Some(1000),
            coordinates: None,
            timezone: None,
        }
    }

    fn names(cities: &[City]) -> Vec<&str> {
        cities.iter().map(|c| c.name.as_str()).collect()
    }

    fn controller(fake: &Arc<FakeCities>) -> SearchController {
        let provider: Arc<dyn CitySearchProvider> = fake.clone();
        SearchController::new(provider, SearchSettings::default())
    }

    const CITIES: &[&str] = &["Paris", "Parma", "Berlin", "Bern", "Bonn", "Porto"];

    #[tokio::test(start_paused = true)]
    async fn mount_without_query_lists_first_page() {
        let fake = Arc::new(FakeCities::with(CITIES));
        let mut search = controller(&fake);

        search.mount(None);
        assert!(search.state().loading);
        let state = search.settle().await;

        assert_eq!(state.results.len(), CITIES.len());
        assert!(!state.loading);
        assert_eq!(fake.calls(), vec![Call::List(DEFAULT_PAGE_SIZE, 0)]);
        assert_eq!(search.location(), Route::home());
    }

    #[tokio::test(start_paused = true)]
    async fn mount_with_query_searches_and_suggests() {
        let fake = Arc::new(FakeCities::with(CITIES));
        let mut search = controller(&fake);

        search.mount(Some("Par"));
        search.settle().await;
        assert_eq!(names(&search.state().results), vec!["Paris", "Parma"]);

        assert_eq!(search.next_event().await, SearchUpdate::Suggestions);
        assert_eq!(names(search.state().visible_suggestions()), vec!["Paris", "Parma"]);
        assert_eq!(search.location().to_path(), "/home?q=Par");
    }

    #[tokio::test(start_paused = true)]
    async fn submit_issues_one_trimmed_search() {
        let fake = Arc::new(FakeCities::with(CITIES));
        let mut search = controller(&fake);
        search.mount(None);
        search.settle().await;

        search.set_query("  Bern  ");
        search.settle().await;
        let before = fake.prefix_calls("Bern");

        search.submit();
        search.settle().await;

        assert_eq!(search.state().query, "Bern");
        assert_eq!(fake.prefix_calls("Bern"), before + 1);
        assert_eq!(names(&search.state().results), vec!["Bern"]);

        // The suggestion fetch pending from typing is dropped by the submit.
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fake.prefix_calls("Bern"), before + 1);
        assert_eq!(fake.prefix_calls("  Bern  "), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_typing_suggests_only_settled_text() {
        let fake = Arc::new(FakeCities::with(CITIES));
        let mut search = controller(&fake);
        search.mount(None);
        search.settle().await;

        for text in ["B", "Be", "Ber"] {
            search.set_query(text);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        search.set_query("Berl");

        search.settle().await;
        assert_eq!(search.next_event().await, SearchUpdate::Suggestions);

        // One primary search per keystroke, one suggestion fetch overall.
        assert_eq!(fake.prefix_calls("B"), 1);
        assert_eq!(fake.prefix_calls("Be"), 1);
        assert_eq!(fake.prefix_calls("Ber"), 1);
        assert_eq!(fake.prefix_calls("Berl"), 2);
        assert_eq!(names(search.state().visible_suggestions()), vec!["Berlin"]);
    }

    #[tokio::test(start_paused = true)]
    async fn clearing_query_reverts_to_browse_page() {
        let fake = Arc::new(FakeCities::with(CITIES));
        let mut search = controller(&fake);
        search.mount(Some("Bo"));
        search.settle().await;
        search.next_event().await;
        assert!(search.state().show_suggestions);

        search.set_query("   ");
        assert!(search.state().suggestions.is_empty());
        assert!(!search.state().show_suggestions);
        search.settle().await;

        assert_eq!(search.state().results.len(), CITIES.len());
        assert_eq!(fake.calls().last(), Some(&Call::List(DEFAULT_PAGE_SIZE, 0)));
        assert_eq!(search.location(), Route::home());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_superseded_results_are_discarded() {
        let fake = Arc::new(FakeCities {
            delays: vec![("P".to_string(), Duration::from_secs(5))],
            ..FakeCities::with(CITIES)
        });
        let mut search = controller(&fake);

        search.mount(Some("P"));
        search.set_query("Po");

        search.settle().await;
        assert_eq!(names(&search.state().results), vec!["Porto"]);

        // Drain the debounced suggestion and the late answer for "P".
        let mut updates = Vec::new();
        for _ in 0..2 {
            updates.push(search.next_event().await);
        }
        assert!(updates.contains(&SearchUpdate::Stale));
        assert_eq!(names(&search.state().results), vec!["Porto"]);
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_suggestion_searches_for_it() {
        let fake = Arc::new(FakeCities::with(CITIES));
        let mut search = controller(&fake);
        search.mount(Some("Par"));
        search.settle().await;
        search.next_event().await;

        assert!(search.select_suggestion(1));
        assert_eq!(search.state().query, "Parma");
        assert!(!search.state().show_suggestions);
        search.settle().await;

        assert_eq!(names(&search.state().results), vec!["Parma"]);
        assert!(!search.select_suggestion(99));
    }

    #[tokio::test(start_paused = true)]
    async fn selecting_row_navigates_to_detail() {
        let fake = Arc::new(FakeCities::with(CITIES));
        let mut search = controller(&fake);
        search.mount(Some("Bo"));
        search.settle().await;

        assert_eq!(search.select_row(0), Some(Route::detail("Bonn")));
        assert_eq!(search.select_row(5), None);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_fall_back_to_empty_lists() {
        let fake = Arc::new(FakeCities {
            fail: true,
            ..FakeCities::with(CITIES)
        });
        let mut search = controller(&fake);

        search.mount(Some("Par"));
        search.settle().await;
        assert!(search.state().results.is_empty());

        search.focus();
        assert_eq!(search.next_event().await, SearchUpdate::Suggestions);
        assert!(search.state().suggestions.is_empty());
        assert!(!search.state().show_suggestions);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_query_issues_nothing() {
        let fake = Arc::new(FakeCities::with(CITIES));
        let mut search = controller(&fake);
        search.mount(Some("Bonn"));
        search.settle().await;
        let before = fake.calls().len();

        search.set_query("Bonn");
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Only the suggestion fetch scheduled by mount ran.
        assert!(!search.state().loading);
        assert_eq!(fake.calls().len(), before + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_applies_finished_fetches_only() {
        let fake = Arc::new(FakeCities::with(CITIES));
        let mut search = controller(&fake);

        search.mount(Some("Bo"));
        assert_eq!(search.drain(), 0);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(search.drain(), 1);
        assert_eq!(names(&search.state().results), vec!["Bonn"]);
        assert!(search.state().suggestions.is_empty());

        tokio::time::sleep(Duration::from_millis(301)).await;
        assert_eq!(search.drain(), 1);
        assert_eq!(names(search.state().visible_suggestions()), vec!["Bonn"]);
    }

    #[tokio::test(start_paused = true)]
    async fn focus_and_blur_toggle_dropdown() {
        let fake = Arc::new(FakeCities::with(CITIES));
        let mut search = controller(&fake);
        search.mount(Some("Par"));
        search.settle().await;
        search.next_event().await;

        search.blur();
        assert!(search.state().visible_suggestions().is_empty());
        search.focus();
        assert_eq!(search.state().visible_suggestions().len(), 2);
    }
}
