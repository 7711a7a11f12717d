//! movierec - Movie recommendations with OMDb enrichment
//!
//! Finds similar movies in a precomputed similarity catalog and decorates them
//! with posters, ratings and plots from OMDb.

use std::error::Error;
use std::fs;
use std::process::ExitCode;

use clap::Parser;

use movierec::cli::{export_path, CacheAction, Cli, Command, Settings};
use movierec::metadata::omdb::mask_api_key;
use movierec::metadata::ConnectionStatus;
use movierec::recommend::{self, Catalog, Recommendation};
use movierec::report;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before parsing so env-backed flags pick it up
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    movierec::setup_tracing(&cli.log_level, cli.log_format);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let settings = Settings::from_cli(&cli)?;

    match cli.command {
        Command::Recommend {
            title,
            catalog,
            count,
            no_enrich,
            export,
        } => {
            let catalog = Catalog::load(&catalog)?;
            let neighbors = catalog.similar(&title, count)?;

            let recommendations: Vec<Recommendation> = if no_enrich {
                neighbors.into_iter().map(Recommendation::unenriched).collect()
            } else {
                let mut fetcher = settings.fetcher()?;
                let mut cache = settings.open_cache();
                recommend::enrich(&mut fetcher, &mut cache, neighbors).await
            };

            print!("{}", report::render_recommendations(&title, &recommendations));

            if let Some(path) = export_path(&export, &title) {
                fs::write(&path, report::export_summary(&title, &recommendations))?;
                println!("\nSaved recommendations to {}", path.display());
            }
        }

        Command::Details { title, year, json } => {
            let mut fetcher = settings.fetcher()?;
            let mut cache = settings.open_cache();

            match fetcher.resolve(&mut cache, &title, year).await {
                Ok(record) if json => println!("{}", serde_json::to_string_pretty(&record)?),
                Ok(record) => print!("{}", report::render_details(&record)),
                Err(err) => {
                    eprintln!("{}", err.kind().message());
                    return Err(err.into());
                }
            }
        }

        Command::Poster { title, year } => {
            let mut fetcher = settings.fetcher()?;
            let mut cache = settings.open_cache();
            println!("{}", fetcher.resolve_poster(&mut cache, &title, year).await);
        }

        Command::Check => {
            let mut fetcher = settings.fetcher()?;
            match fetcher.check_connection().await {
                ConnectionStatus::Connected {
                    title,
                    year,
                    director,
                } => {
                    println!("OMDb API connection successful");
                    println!("Test movie: {} ({})", title, year);
                    println!("Director: {}", director);
                }
                ConnectionStatus::ApiError {
                    message,
                    key_problem,
                } => {
                    if key_problem {
                        eprintln!("Make sure the API key is activated (see the link in the OMDb signup email)");
                    }
                    return Err(format!("API error: {}", message).into());
                }
                ConnectionStatus::Unreachable(reason) => {
                    return Err(format!("Connection failed: {}", reason).into());
                }
            }
        }

        Command::Cache { action } => {
            let mut cache = settings.open_cache();
            match action {
                CacheAction::Stats => {
                    let stats = cache.stats();
                    match cache.path() {
                        Some(path) => println!("Cache file: {}", path.display()),
                        None => println!("Cache file: (in memory)"),
                    }
                    println!("Entries: {}", stats.entries);
                    println!("Fresh: {}", stats.fresh);
                    println!("Stale: {}", stats.stale);
                    println!("TTL: {} days", cache.ttl().num_days());
                    match &settings.api_key {
                        Some(key) => println!("API key: {}", mask_api_key(key)),
                        None => println!("API key: not configured"),
                    }
                }
                CacheAction::Clear => {
                    cache.clear()?;
                    println!("Cache cleared");
                }
            }
        }
    }

    Ok(())
}
