//! Interactive search: a text prompt with debounced suggestions, a result
//! picker, and the detail card for the picked city.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use colored::Colorize;
use inquire::{
    Autocomplete, CustomUserError, InquireError, Select, Text, autocompletion::Replacement,
};
use weather_core::{CitySearchProvider, Config, Route, SearchController, load_detail};

use crate::render;

/// Suggestions settle after the quiet period, and inquire only redraws them on input.
const PROMPT_HELP: &str =
    "tab to complete, enter to search, esc to quit; new suggestions show on the next key";

/// Feeds keystrokes into the search controller and shows whatever suggestions
/// have settled so far.
#[derive(Clone)]
struct CityAutocomplete {
    search: Arc<Mutex<SearchController>>,
}

impl Autocomplete for CityAutocomplete {
    fn get_suggestions(&mut self, input: &str) -> Result<Vec<String>, CustomUserError> {
        let mut search = self.search.lock().map_err(|_| "search state poisoned")?;
        search.set_query(input);
        search.drain();

        Ok(search
            .state()
            .visible_suggestions()
            .iter()
            .map(|city| city.suggestion_label())
            .collect())
    }

    fn get_completion(
        &mut self,
        _input: &str,
        highlighted_suggestion: Option<String>,
    ) -> Result<Replacement, CustomUserError> {
        let Some(label) = highlighted_suggestion else {
            return Ok(None);
        };

        let mut search = self.search.lock().map_err(|_| "search state poisoned")?;
        let index = search
            .state()
            .visible_suggestions()
            .iter()
            .position(|city| city.suggestion_label() == label);

        match index {
            Some(index) if search.select_suggestion(index) => {
                Ok(Some(search.state().query.clone()))
            }
            _ => Ok(None),
        }
    }
}

fn lock(shared: &Mutex<SearchController>) -> anyhow::Result<MutexGuard<'_, SearchController>> {
    shared.lock().map_err(|_| anyhow!("search state poisoned"))
}

/// The controller, once no prompt holds a handle to it any more.
fn exclusive(shared: &mut Arc<Mutex<SearchController>>) -> anyhow::Result<&mut SearchController> {
    Arc::get_mut(shared)
        .ok_or_else(|| anyhow!("search state is still held by a prompt"))?
        .get_mut()
        .map_err(|_| anyhow!("search state poisoned"))
}

/// Esc and Ctrl-C leave the current prompt without an answer.
fn skipped<T>(result: Result<T, InquireError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub async fn run(config: &Config, initial_query: Option<&str>) -> anyhow::Result<()> {
    let weather = config.weather_provider()?;
    let cities: Arc<dyn CitySearchProvider> = Arc::new(config.city_provider());

    let mut search = SearchController::new(Arc::clone(&cities), config.search_settings());
    search.mount(initial_query);
    search.focus();
    let mut shared = Arc::new(Mutex::new(search));

    loop {
        let current = lock(&shared)?.state().query.clone();

        let prompt = Text::new("Search city:")
            .with_initial_value(&current)
            .with_placeholder("Search city...")
            .with_help_message(PROMPT_HELP)
            .with_autocomplete(CityAutocomplete {
                search: Arc::clone(&shared),
            });

        let Some(input) = skipped(tokio::task::block_in_place(|| prompt.prompt()))? else {
            break;
        };

        let search = exclusive(&mut shared)?;
        search.set_query(input);
        search.submit();

        let rows = render::city_rows(&search.settle().await.results);
        println!("{}", search.location().to_string().dimmed());

        if rows.is_empty() {
            println!("No cities found.");
            continue;
        }

        let picker = Select::new("Pick a city:", rows).with_page_size(10);
        let Some(choice) = skipped(tokio::task::block_in_place(|| picker.raw_prompt()))? else {
            continue;
        };

        let Some(route) = search.select_row(choice.index) else {
            continue;
        };

        if let Route::Detail { city } = &route {
            println!("{}", route.to_string().dimmed());
            let detail = load_detail(cities.as_ref(), &weather, city).await;
            println!("{}", render::detail(&detail));
        }
    }

    Ok(())
}
