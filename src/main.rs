//! drill - checks SQL exercise files against the Sakila sample database.

mod cli;

use cli::Cli;
use db_drill::config::Config;
use db_drill::db::ConfigConnector;
use db_drill::error::Result;
use db_drill::exercise::Catalog;
use db_drill::fetch::{DirectorySource, ResultFetcher};
use db_drill::logging;
use db_drill::runner::run_all;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // A missing .env is fine; variables may come from the shell.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            std::process::exit(2);
        }
    }
}

/// Runs the selected exercises. Returns whether all of them passed.
async fn run(cli: Cli) -> Result<bool> {
    let catalog = Catalog::sakila();

    if cli.list {
        for exercise in catalog.exercises() {
            println!(
                "{:<22} {} result set(s)",
                exercise.exercise,
                exercise.row_sets().len()
            );
        }
        return Ok(true);
    }

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let selected = catalog.select(cli.exercises.as_slice())?;
    let connection = cli.resolve_connection(&config, |key| std::env::var(key).ok())?;
    info!("Connection: {}", connection.display_string());

    let source = DirectorySource::new(cli.exercise_dir(&config));
    let jobs = cli.jobs(&config);
    info!(
        "Checking {} exercise(s) from {}",
        selected.len(),
        source.dir().display()
    );

    let fetcher = ResultFetcher::new(source, connection.backend);
    let connector = ConfigConnector::new(connection);

    let report = run_all(&connector, &fetcher, &selected, jobs).await;
    println!("{}", report.render(cli.format)?);

    Ok(report.all_passed())
}
