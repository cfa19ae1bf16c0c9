use std::fs;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use newsflow::api::{self, AppState};
use newsflow::cli::{Cli, Commands};
use newsflow::config::Config;
use newsflow::errors::{NewsflowError, NewsflowResult};
use newsflow::services::{FeedService, ImportExportService};
use newsflow::storage::InMemoryArticleStore;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize storage and the service stack on top of it
    let store = Arc::new(InMemoryArticleStore::new());
    let service = FeedService::new(store);

    match cli.command {
        Commands::Add { url, name } => cmd_add(&service, name.as_deref(), &url)?,
        Commands::Remove { name } => cmd_remove(&service, &name)?,
        Commands::Sources => cmd_sources(&service)?,
        Commands::Validate { url } => cmd_validate(&service, &url)?,
        Commands::Fetch { json } => cmd_fetch(&service, json)?,
        Commands::Import { path } => cmd_import(&service, &path)?,
        Commands::Export { output } => cmd_export(&service, output)?,
        Commands::Serve => cmd_serve(&config, service)?,
    }

    Ok(())
}

// Logs go to stderr so `fetch --json` and `export` stay pipeable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_add(service: &FeedService, name: Option<&str>, url: &str) -> NewsflowResult<()> {
    println!("Validating feed: {}", url);

    match service.add_source(name, url) {
        Some(name) => {
            println!("Source added successfully!");
            println!("  Name: {}", name);
            println!("  URL: {}", url);
            Ok(())
        }
        None => Err(NewsflowError::FeedValidation(url.to_string())),
    }
}

fn cmd_remove(service: &FeedService, name: &str) -> NewsflowResult<()> {
    if service.remove_source(name) {
        println!("Removed: {}", name);
    } else {
        println!("No custom source named '{}'.", name);
    }
    Ok(())
}

fn cmd_sources(service: &FeedService) -> NewsflowResult<()> {
    let custom = service.custom_sources();

    println!("Configured sources:\n");
    for source in service.all_sources() {
        let marker = if custom.contains(&source) {
            " (custom)"
        } else {
            ""
        };
        println!("  {}{}", source.name, marker);
        println!("    URL: {}", source.url);
    }

    Ok(())
}

fn cmd_validate(service: &FeedService, url: &str) -> NewsflowResult<()> {
    println!("Validating feed: {}", url);

    match service.validate_source(url) {
        Some(title) => {
            println!("Valid feed: {}", title);
            Ok(())
        }
        None => Err(NewsflowError::FeedValidation(url.to_string())),
    }
}

fn cmd_fetch(service: &FeedService, json: bool) -> NewsflowResult<()> {
    println!("Fetching feeds...\n");

    let results = service.fetch_all_feeds();
    let mut total = 0;
    for (source, saved) in &results {
        println!("  {}: {} new articles", source.name, saved);
        total += saved;
    }
    println!("\nFetched {} new articles.", total);

    if json {
        let articles = service.recent_articles()?;
        println!("{}", serde_json::to_string_pretty(&articles)?);
    }

    Ok(())
}

fn cmd_import(service: &FeedService, path: &str) -> NewsflowResult<()> {
    let content = fs::read_to_string(path)?;
    let importer = ImportExportService::new(service.clone());

    println!("Importing sources from {}...\n", path);

    let result = importer.import_opml(&content)?;

    if !result.added.is_empty() {
        println!("Added {} sources:", result.added.len());
        for name in &result.added {
            println!("  + {}", name);
        }
        println!();
    }

    if !result.duplicates.is_empty() {
        println!("Skipped {} duplicates:", result.duplicates.len());
        for url in &result.duplicates {
            println!("  - {}", url);
        }
        println!();
    }

    if !result.invalid.is_empty() {
        println!("Failed {} sources:", result.invalid.len());
        for (url, error) in &result.invalid {
            println!("  ! {}: {}", url, error);
        }
        println!();
    }

    println!(
        "Import complete: {} added, {} duplicates, {} failed",
        result.added.len(),
        result.duplicates.len(),
        result.invalid.len()
    );

    Ok(())
}

fn cmd_export(service: &FeedService, output: Option<String>) -> NewsflowResult<()> {
    let exporter = ImportExportService::new(service.clone());
    let opml = exporter.export_opml()?;

    match output {
        Some(path) => {
            fs::write(&path, &opml)?;
            println!("Exported sources to {}", path);
        }
        None => {
            println!("{}", opml);
        }
    }

    Ok(())
}

fn cmd_serve(config: &Config, service: FeedService) -> NewsflowResult<()> {
    let state = AppState::new(service);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(api::serve(config.clone(), state))
}
