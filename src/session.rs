//! Interactive console session
//!
//! Prompts for a location and a food category, lists the top-rated matches,
//! and opens the menu of the one the user picks. In enhanced mode the
//! location's results are loaded into the results table and charted first.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use thiserror::Error;

use crate::cache::{CacheError, JsonCache};
use crate::cli::StartupConfig;
use crate::data::{
    ClassRegionLocator, Fetch, GeocodeClient, GeocodeError, MenuClient, MenuError, SearchClient,
    SearchError, SearchLocation, SearchMode, SearchOutcome, SearchQuery,
};
use crate::report::Report;
use crate::table::{ResultTable, TableError};
use crate::ui;

const LOCATION_PROMPT: &str = "Please enter a Zip Code. If you do not know the respective Zip Code, please enter '1' to enter the City & State or 'exit' to quit: ";
const CITY_PROMPT: &str = "Please enter the City: ";
const STATE_PROMPT: &str = "Please enter the State: ";
const CATEGORY_PROMPT: &str = "Please enter the food category (leave blank for any), or 'exit' to quit: ";
const SELECTION_PROMPT: &str = "To view the menu of one of the restaurants listed above, please either enter the corresponding list number, enter 'back' to go to step 1, or enter 'exit': ";
const NO_RESULTS_MESSAGE: &str = "There are no searches with your criteria. Please try again.";
const NO_MENU_MESSAGE: &str = "I'm sorry! Yelp does not have a menu for this restaurant. The Yelp page for this restaurant will open for you instead.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("console I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Displays the enhanced-mode charts for a location
pub type ChartDisplay = fn(&Report, &str) -> io::Result<()>;

/// Whether the session keeps prompting after a round
enum Flow {
    Continue,
    Exit,
}

/// Keeps only ASCII letters, lowercased
pub fn sanitize(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_alphabetic)
        .collect::<String>()
        .to_lowercase()
}

fn is_postal_code(input: &str) -> bool {
    !input.is_empty() && input.chars().all(|c| c.is_ascii_digit())
}

/// One interactive session over `input` and `output`
pub struct Session<R: BufRead, W: Write> {
    mode: SearchMode,
    open_browser: bool,
    show_charts: bool,
    charts: ChartDisplay,
    cache: JsonCache,
    table: Option<ResultTable>,
    geocoder: GeocodeClient,
    search: SearchClient,
    menu: MenuClient,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    /// Creates a session; `table` is only used in enhanced mode
    pub fn new(
        config: &StartupConfig,
        fetcher: Arc<dyn Fetch>,
        cache: JsonCache,
        table: Option<ResultTable>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            mode: config.mode,
            open_browser: config.open_browser,
            show_charts: config.show_charts,
            charts: ui::show_report,
            cache,
            table,
            geocoder: GeocodeClient::new(fetcher.clone(), config.mapquest_api_key.clone()),
            search: SearchClient::new(fetcher.clone(), config.yelp_api_key.clone(), config.mode),
            menu: MenuClient::new(fetcher, Box::new(ClassRegionLocator::new(&config.menu_class))),
            input,
            output,
        }
    }

    /// Replaces the terminal chart display
    pub fn with_chart_display(mut self, charts: ChartDisplay) -> Self {
        self.charts = charts;
        self
    }

    pub fn cache(&self) -> &JsonCache {
        &self.cache
    }

    /// Runs rounds until the user exits or input ends
    pub async fn run(&mut self) -> Result<(), SessionError> {
        self.banner()?;
        while let Flow::Continue = self.round().await? {}
        writeln!(self.output, "Bye!")?;
        Ok(())
    }

    fn banner(&mut self) -> io::Result<()> {
        let rule = "#".repeat(65);
        writeln!(self.output, "{}", rule)?;
        writeln!(self.output, "Welcome! This program finds top-rated restaurants and their menus.")?;
        writeln!(self.output, "{}", rule)?;
        writeln!(
            self.output,
            "To begin, the program will show you the top {} rated restaurants based on your preferences.\n",
            self.mode.display_count()
        )
    }

    /// Prints `message` and reads one line; end of input reads as `exit`
    fn prompt(&mut self, message: &str) -> io::Result<String> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok("exit".to_string());
        }
        Ok(line.trim().to_string())
    }

    async fn round(&mut self) -> Result<Flow, SessionError> {
        let answer = self.prompt(LOCATION_PROMPT)?;
        if answer.eq_ignore_ascii_case("exit") {
            return Ok(Flow::Exit);
        }

        let location = if answer == "1" {
            match self.city_state_location().await? {
                Some(location) => location,
                None => return Ok(Flow::Continue),
            }
        } else if is_postal_code(&answer) {
            SearchLocation::PostalCode(answer)
        } else {
            writeln!(self.output, "Invalid Input!")?;
            return Ok(Flow::Continue);
        };

        if self.mode == SearchMode::Enhanced {
            self.chart_overview(&location).await?;
        }

        let category = sanitize(&self.prompt(CATEGORY_PROMPT)?);
        if category == "exit" {
            return Ok(Flow::Exit);
        }
        writeln!(self.output)?;

        let query = SearchQuery::new(location, Some(category).filter(|c| !c.is_empty()));
        self.results(&query).await
    }

    async fn city_state_location(&mut self) -> Result<Option<SearchLocation>, SessionError> {
        let city = sanitize(&self.prompt(CITY_PROMPT)?);
        let state = sanitize(&self.prompt(STATE_PROMPT)?);
        if city == "exit" || state == "exit" {
            return Ok(None);
        }

        match self.geocoder.coordinates(&mut self.cache, &city, &state).await {
            Ok(coordinates) => Ok(Some(SearchLocation::Coordinates {
                coordinates,
                label: format!("{}, {}", city, state),
            })),
            Err(GeocodeError::Cache(e)) => Err(e.into()),
            Err(e) => {
                writeln!(self.output, "{}. Please try again.", e)?;
                Ok(None)
            }
        }
    }

    /// Loads an uncategorised search into the results table and charts it
    async fn chart_overview(&mut self, location: &SearchLocation) -> Result<(), SessionError> {
        let query = SearchQuery::new(location.clone(), None);
        let results = match self.search.search(&mut self.cache, &query).await {
            Ok(SearchOutcome::Found(results)) => results,
            Ok(SearchOutcome::NoResults) => {
                writeln!(self.output, "{}", NO_RESULTS_MESSAGE)?;
                return Ok(());
            }
            Err(SearchError::Cache(e)) => return Err(e.into()),
            Err(e) => {
                writeln!(self.output, "Search failed: {}", e)?;
                return Ok(());
            }
        };

        let Some(table) = self.table.as_mut() else {
            return Ok(());
        };
        let loaded = table.load(&self.cache, &results.cache_keys, location.label())?;
        let report = Report::from_table(table)?;
        writeln!(
            self.output,
            "Loaded {} restaurants near {} into the results table.",
            loaded,
            location.label()
        )?;

        if self.show_charts && !report.is_empty() {
            if let Err(e) = (self.charts)(&report, location.label()) {
                tracing::warn!(error = %e, "failed to display charts");
                writeln!(self.output, "Could not display charts: {}", e)?;
            }
        }
        Ok(())
    }

    async fn results(&mut self, query: &SearchQuery) -> Result<Flow, SessionError> {
        let results = match self.search.search(&mut self.cache, query).await {
            Ok(SearchOutcome::Found(results)) if !results.is_empty() => results,
            Ok(_) => {
                writeln!(self.output, "{}", NO_RESULTS_MESSAGE)?;
                return Ok(Flow::Continue);
            }
            Err(SearchError::Cache(e)) => return Err(e.into()),
            Err(e) => {
                writeln!(self.output, "Search failed: {}", e)?;
                return Ok(Flow::Continue);
            }
        };

        let shown = results.top(self.mode.display_count());
        let kind = match &query.category {
            Some(category) => format!("{} restaurants", category),
            None => "restaurants".to_string(),
        };
        writeln!(
            self.output,
            "The top {} rated {} in {} are:",
            shown.len(),
            kind,
            query.location.label()
        )?;
        for (i, business) in shown.iter().enumerate() {
            writeln!(
                self.output,
                "{} {} ({:.1} stars, {})",
                i + 1,
                business.name,
                business.rating,
                business.price_tier()
            )?;
        }
        writeln!(self.output)?;

        let urls: Vec<String> = shown.iter().map(|b| b.url.clone()).collect();
        loop {
            let answer = self.prompt(SELECTION_PROMPT)?;
            writeln!(self.output)?;

            match answer.parse::<usize>() {
                Ok(selection) => self.open_menu(&urls, selection).await?,
                Err(_) => match sanitize(&answer).as_str() {
                    "exit" => return Ok(Flow::Exit),
                    "back" => return Ok(Flow::Continue),
                    _ => writeln!(self.output, "[Error] Invalid Input")?,
                },
            }
        }
    }

    async fn open_menu(&mut self, urls: &[String], selection: usize) -> Result<(), SessionError> {
        match self.menu.menu_links(&mut self.cache, urls, selection).await {
            Ok(links) => {
                if links.fell_back() {
                    writeln!(self.output, "{}\n", NO_MENU_MESSAGE)?;
                }
                self.open(links.first())?;
            }
            Err(MenuError::SelectionOutOfRange { len, .. }) => {
                writeln!(self.output, "Please enter a number between 1 and {}.", len)?;
            }
            Err(MenuError::Cache(e)) => return Err(e.into()),
            Err(e) => writeln!(self.output, "Could not load that page: {}", e)?,
        }
        Ok(())
    }

    fn open(&mut self, url: &str) -> io::Result<()> {
        if !self.open_browser {
            return writeln!(self.output, "Menu: {}", url);
        }

        match webbrowser::open(url) {
            Ok(()) => writeln!(self.output, "Opening {}", url),
            Err(e) => {
                tracing::warn!(%url, error = %e, "failed to open browser");
                writeln!(self.output, "Could not open a browser. Menu: {}", url)
            }
        }
    }
}
