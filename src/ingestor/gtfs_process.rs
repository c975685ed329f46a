use crate::download;
use crate::gtfs_ingestion_sequence::{
    routes_into_postgres::routes_into_postgres, shapes_into_postgres::shapes_into_postgres,
    stop_times_into_postgres::stop_times_into_postgres, stops_into_postgres::stops_into_postgres,
    trips_into_postgres::trips_into_postgres,
};
use bidepass::manifest::AgencyEntry;
use bidepass::models::NewAgency;
use bidepass::postgres_tools::TransitPool;
use bidepass::store;
use log::{info, warn};

/// One agency's full ingestion: archive download, then the tables in
/// dependency order. A failed table is logged and the rest still run.
pub async fn ingest_agency(
    pool: &TransitPool,
    client: &reqwest::Client,
    agency: &AgencyEntry,
) -> Result<(), Box<dyn std::error::Error + Sync + Send>> {
    info!("[{}] downloading GTFS from {}", agency.slug, agency.gtfs_url);

    let mut archive = download::fetch_archive(client, &agency.gtfs_url).await?;

    let agency_uuid = store::agencies::upsert(
        pool,
        &NewAgency {
            slug: agency.slug.clone(),
            name: agency.name.clone(),
            url: Some(agency.gtfs_url.clone()),
            timezone: "Europe/Madrid".to_string(),
        },
    )
    .await?;
    info!("[{}] agency_id={}", agency.slug, agency_uuid);

    // Tables in dependency order: later stages resolve ids written by
    // earlier ones.
    match download::read_table(&mut archive, "stops.txt") {
        Some(csv_text) => {
            if let Err(e) = stops_into_postgres(pool, &csv_text, &agency_uuid, &agency.slug).await {
                warn!("[{}] stops: {}", agency.slug, e);
            }
        }
        None => warn!("[{}] stops.txt missing from archive", agency.slug),
    }

    match download::read_table(&mut archive, "routes.txt") {
        Some(csv_text) => {
            if let Err(e) = routes_into_postgres(pool, &csv_text, &agency_uuid, &agency.slug).await {
                warn!("[{}] routes: {}", agency.slug, e);
            }
        }
        None => warn!("[{}] routes.txt missing from archive", agency.slug),
    }

    match download::read_table(&mut archive, "trips.txt") {
        Some(csv_text) => {
            if let Err(e) = trips_into_postgres(pool, &csv_text, &agency_uuid, &agency.slug).await {
                warn!("[{}] trips: {}", agency.slug, e);
            }
        }
        None => warn!("[{}] trips.txt missing from archive", agency.slug),
    }

    match download::read_table(&mut archive, "stop_times.txt") {
        Some(csv_text) => {
            if let Err(e) =
                stop_times_into_postgres(pool, &csv_text, &agency_uuid, &agency.slug).await
            {
                warn!("[{}] stop_times: {}", agency.slug, e);
            }
        }
        None => warn!("[{}] stop_times.txt missing from archive", agency.slug),
    }

    // shapes.txt is optional
    if let Some(csv_text) = download::read_table(&mut archive, "shapes.txt") {
        if let Err(e) = shapes_into_postgres(pool, &csv_text, &agency_uuid, &agency.slug).await {
            warn!("[{}] shapes: {}", agency.slug, e);
        }
    }

    info!("[{}] done", agency.slug);
    Ok(())
}
