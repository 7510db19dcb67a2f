//! Command-line interface parsing for menufinder
//!
//! This module handles parsing of CLI arguments using clap, including API keys
//! taken from the environment and the default cache and database locations.

use std::path::PathBuf;

use clap::Parser;
use directories::ProjectDirs;
use thiserror::Error;

use crate::data::menu::DEFAULT_MENU_CLASS;
use crate::data::SearchMode;

/// Cache file name used when no project directory can be determined
const FALLBACK_CACHE_FILE: &str = "menufinder_cache.json";
/// Database file name used when no project directory can be determined
const FALLBACK_DATABASE_FILE: &str = "menufinder_results.sqlite";

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified mode name is not recognized
    #[error("Invalid mode: '{0}'. Valid modes: basic, enhanced")]
    InvalidMode(String),

    /// The review search API key was not given
    #[error("Missing Yelp API key: pass --yelp-api-key or set YELP_API_KEY")]
    MissingApiKey,
}

/// menufinder - find top-rated restaurants and open their menus
#[derive(Parser, Debug)]
#[command(name = "menufinder")]
#[command(about = "Find top-rated restaurants near you and open their menus")]
#[command(version)]
pub struct Cli {
    /// Search mode: `basic` shows 5 results, `enhanced` fetches two pages,
    /// charts them, and shows 10
    #[arg(long, value_name = "MODE", default_value = "basic")]
    pub mode: String,

    /// Response cache file (defaults to the user cache directory)
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Results database used by the enhanced mode (defaults to the user data directory)
    #[arg(long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Exact class of the page region that holds the menu link
    #[arg(long, value_name = "CLASS", default_value = DEFAULT_MENU_CLASS)]
    pub menu_class: String,

    /// Yelp Fusion API key
    #[arg(long, env = "YELP_API_KEY", hide_env_values = true)]
    pub yelp_api_key: Option<String>,

    /// MapQuest API key, needed to search by city and state
    #[arg(long, env = "MAPQUEST_API_KEY", hide_env_values = true)]
    pub mapquest_api_key: Option<String>,

    /// Print the chosen link instead of opening a browser
    #[arg(long)]
    pub no_browser: bool,

    /// Skip the charts in enhanced mode
    #[arg(long)]
    pub no_charts: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub mode: SearchMode,
    pub cache_path: PathBuf,
    pub database_path: PathBuf,
    pub menu_class: String,
    pub yelp_api_key: String,
    pub mapquest_api_key: Option<String>,
    pub open_browser: bool,
    pub show_charts: bool,
    pub verbose: bool,
}

/// Parses a mode string argument into a SearchMode.
///
/// # Returns
/// * `Ok(SearchMode)` if the string names a mode
/// * `Err(CliError::InvalidMode)` otherwise
pub fn parse_mode_arg(s: &str) -> Result<SearchMode, CliError> {
    SearchMode::from_str(s).ok_or_else(|| CliError::InvalidMode(s.to_string()))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "menufinder")
}

/// Default location of the response cache
pub fn default_cache_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.cache_dir().join("cache.json"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_FILE))
}

/// Default location of the results database
pub fn default_database_path() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("results.sqlite"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_DATABASE_FILE))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with defaults filled in
    /// * `Err(CliError)` if the mode is invalid or the Yelp key is missing
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mode = parse_mode_arg(&cli.mode)?;
        let yelp_api_key = cli
            .yelp_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(CliError::MissingApiKey)?;

        Ok(StartupConfig {
            mode,
            cache_path: cli.cache_file.clone().unwrap_or_else(default_cache_path),
            database_path: cli.database.clone().unwrap_or_else(default_database_path),
            menu_class: cli.menu_class.clone(),
            yelp_api_key,
            mapquest_api_key: cli.mapquest_api_key.clone().filter(|key| !key.trim().is_empty()),
            open_browser: !cli.no_browser,
            show_charts: !cli.no_charts,
            verbose: cli.verbose,
        })
    }
}
