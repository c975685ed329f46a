mod single_poll;

use bidepass::bus::Publisher;
use bidepass::config::Config;
use bidepass::manifest::Manifest;
use bidepass::postgres_tools::{TransitPool, database_url_or, make_async_pool};
use bidepass::{logging, store};
use clap::Parser;
use log::{error, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(30);
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(name = "realtime", about = "GTFS-RT polling and fan-out")]
struct Args {
    /// Manifest file listing the agencies to poll
    #[arg(default_value = "manifest.json")]
    manifest: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = Config::load().expect("configuration failed to load");
    logging::init(&config.log);

    let database_url = database_url_or(&config.database.dsn());
    let pool: Arc<TransitPool> = Arc::new(
        make_async_pool(&database_url)
            .await
            .expect("database connection failed"),
    );

    let publisher = Arc::new(
        Publisher::connect(&config.nats.url)
            .await
            .expect("message bus connection failed"),
    );

    let manifest = match Manifest::load(&args.manifest) {
        Ok(manifest) => manifest,
        Err(e) => {
            error!("read manifest {}: {}", args.manifest.display(), e);
            std::process::exit(1);
        }
    };

    let rt_agencies = manifest.realtime_agencies();
    info!(
        "realtime poller — {} agencies with GTFS-RT feeds",
        rt_agencies.len()
    );

    // Slugs resolve to internal ids once; agencies the ingestor has not
    // seen yet are skipped.
    let mut agency_ids: HashMap<String, String> = HashMap::new();
    for agency in &rt_agencies {
        match store::agencies::get_by_slug(&pool, &agency.slug).await {
            Ok(Some(row)) => {
                agency_ids.insert(agency.slug.clone(), row.id);
            }
            Ok(None) => {
                warn!("agency {} not found in store (run ingestor first)", agency.slug);
            }
            Err(e) => {
                warn!("agency {} lookup: {}", agency.slug, e);
            }
        }
    }

    let agencies = Arc::new(rt_agencies);
    let agency_ids = Arc::new(agency_ids);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .gzip(true)
        .deflate(true)
        .build()
        .expect("http client");

    info!("polling every {:?}", POLL_INTERVAL);

    let mut interval = tokio::time::interval(POLL_INTERVAL);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // The first tick fires immediately.
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let tick = tokio::spawn(single_poll::poll_all(
                    Arc::clone(&pool),
                    Arc::clone(&publisher),
                    client.clone(),
                    Arc::clone(&agencies),
                    Arc::clone(&agency_ids),
                ));

                tokio::select! {
                    _ = tick => {}
                    _ = &mut shutdown => {
                        info!("interrupt received, draining in-flight polls");
                        tokio::time::sleep(SHUTDOWN_DRAIN).await;
                        return;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("interrupt received, shutting down realtime poller");
                return;
            }
        }
    }
}
