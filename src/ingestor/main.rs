mod download;
mod gtfs_handlers;
mod gtfs_ingestion_sequence;
mod gtfs_process;

use bidepass::config::Config;
use bidepass::manifest::Manifest;
use bidepass::postgres_tools::{database_url_or, make_async_pool};
use bidepass::{logging, postgres_tools::TransitPool};
use clap::Parser;
use futures::StreamExt;
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const DOWNLOAD_CONCURRENCY: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "ingestor", about = "Static GTFS feed ingestor")]
struct Args {
    /// Manifest file listing the agencies to ingest
    #[arg(default_value = "manifest.json")]
    manifest: PathBuf,

    /// Comma-separated agency slugs; everything when omitted
    filter: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = Config::load().expect("configuration failed to load");
    logging::init(&config.log);

    let database_url = database_url_or(&config.database.dsn());

    if let Err(e) = run_migrations(&database_url).await {
        error!("migrations: {}", e);
        std::process::exit(1);
    }

    let pool: Arc<TransitPool> = Arc::new(
        make_async_pool(&database_url)
            .await
            .expect("database connection failed"),
    );

    let manifest = match Manifest::load(&args.manifest) {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("read manifest {}: {}", args.manifest.display(), e);
            std::process::exit(1);
        }
    };

    let agencies = manifest.filter_slugs(args.filter.as_deref());
    info!(
        "GTFS ingestor — {} agencies from {}",
        agencies.len(),
        manifest.source
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .gzip(true)
        .deflate(true)
        .build()
        .expect("http client");

    let results = futures::stream::iter(agencies.iter().map(|agency| {
        let pool = Arc::clone(&pool);
        let client = client.clone();
        async move {
            match gtfs_process::ingest_agency(&pool, &client, agency).await {
                Ok(()) => true,
                Err(e) => {
                    error!("[{}]: {}", agency.slug, e);
                    false
                }
            }
        }
    }))
    .buffer_unordered(DOWNLOAD_CONCURRENCY)
    .collect::<Vec<bool>>()
    .await;

    let succeeded = results.iter().filter(|ok| **ok).count();
    info!(
        "ingestion complete: {}/{} agencies succeeded",
        succeeded,
        results.len()
    );

    if succeeded == 0 && !results.is_empty() {
        std::process::exit(1);
    }
}

async fn run_migrations(database_url: &str) -> Result<(), Box<dyn std::error::Error + Sync + Send>> {
    let pg = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pg).await?;
    pg.close().await;

    Ok(())
}
