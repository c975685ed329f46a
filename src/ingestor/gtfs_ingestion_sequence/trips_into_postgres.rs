use crate::gtfs_handlers::{get_field, index_columns};
use bidepass::models::NewTrip;
use bidepass::postgres_tools::TransitPool;
use bidepass::store;
use csv::ReaderBuilder;
use log::{info, warn};

const BATCH_SIZE: usize = 500;

/// Streams `trips.txt`, resolving each trip's route through the
/// agency-scoped external-id lookup. Trips whose route is unknown are
/// skipped and counted.
pub async fn trips_into_postgres(
    pool: &TransitPool,
    csv_text: &str,
    agency_uuid: &str,
    slug: &str,
) -> Result<usize, Box<dyn std::error::Error + Sync + Send>> {
    let route_ids = store::routes::id_map(pool, agency_uuid).await?;

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let columns = index_columns(&reader.headers()?.clone());

    let mut batch: Vec<NewTrip> = Vec::with_capacity(BATCH_SIZE);
    let mut total = 0usize;
    let mut unresolved = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(_) => continue,
        };

        let external_id = get_field(&record, &columns, "trip_id");
        if external_id.is_empty() {
            continue;
        }

        let route_uuid = match route_ids.get(get_field(&record, &columns, "route_id")) {
            Some(route_uuid) => route_uuid.clone(),
            None => {
                unresolved += 1;
                continue;
            }
        };

        let headsign = match get_field(&record, &columns, "trip_headsign") {
            "" => None,
            value => Some(value.to_string()),
        };
        let shape_id = match get_field(&record, &columns, "shape_id") {
            "" => None,
            value => Some(value.to_string()),
        };

        batch.push(NewTrip {
            trip_id: external_id.to_string(),
            route_id: route_uuid,
            service_id: get_field(&record, &columns, "service_id").to_string(),
            headsign,
            direction_id: get_field(&record, &columns, "direction_id").parse().unwrap_or(0),
            shape_id,
            wheelchair_accessible: get_field(&record, &columns, "wheelchair_accessible") == "1",
            bikes_allowed: get_field(&record, &columns, "bikes_allowed") == "1",
        });
        total += 1;

        if batch.len() >= BATCH_SIZE {
            store::trips::upsert_batch(pool, &batch).await?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        store::trips::upsert_batch(pool, &batch).await?;
    }

    if unresolved > 0 {
        warn!("[{}]   trips: {} rows referenced unknown routes", slug, unresolved);
    }
    info!("[{}]   trips: {}", slug, total);
    Ok(total)
}
