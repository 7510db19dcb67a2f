//! menufinder - find top-rated restaurants and open their menus
//!
//! An interactive console program that searches Yelp by zip code or city,
//! caches every response locally, and opens the chosen restaurant's menu.

use std::io::{self, IsTerminal};
use std::panic;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use menufinder::cache::JsonCache;
use menufinder::cli::{Cli, CliError, StartupConfig};
use menufinder::data::{HttpFetcher, SearchMode};
use menufinder::session::Session;
use menufinder::table::ResultTable;
use menufinder::ui;

/// Restores the terminal before the panic message is printed, in case the
/// charts were on screen
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        ui::restore_terminal();
        original_hook(panic_info);
    }));
}

/// Sends logs to stderr; `RUST_LOG` overrides the level chosen by `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "menufinder=debug" } else { "menufinder=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            let kind = match e {
                CliError::InvalidMode(_) => ErrorKind::InvalidValue,
                CliError::MissingApiKey => ErrorKind::MissingRequiredArgument,
            };
            Cli::command().error(kind, e).exit();
        }
    };
    init_logging(config.verbose);
    if config.show_charts && config.mode == SearchMode::Enhanced {
        setup_panic_hook();
    }

    tracing::debug!(
        mode = config.mode.name(),
        cache = %config.cache_path.display(),
        "starting"
    );

    let cache = JsonCache::load(&config.cache_path);
    let table = match config.mode {
        SearchMode::Enhanced => Some(ResultTable::open(&config.database_path)?),
        SearchMode::Basic => None,
    };

    let stdin = io::stdin();
    let mut session = Session::new(
        &config,
        Arc::new(HttpFetcher::new()),
        cache,
        table,
        stdin.lock(),
        io::stdout(),
    );
    session.run().await?;

    Ok(())
}
