use crate::gtfs_handlers::{get_field, index_columns, parse_gtfs_time};
use bidepass::models::NewStopTime;
use bidepass::postgres_tools::TransitPool;
use bidepass::store;
use csv::ReaderBuilder;
use diesel_async::RunQueryDsl;
use log::{info, warn};

const BATCH_SIZE: usize = 1000;

/// Streams `stop_times.txt` in batches of 1000, resolving trip and stop
/// by the agency-scoped lookups. Conflicts are skipped so re-runs replay
/// cleanly; a failed batch is logged and the rest continues.
pub async fn stop_times_into_postgres(
    pool: &TransitPool,
    csv_text: &str,
    agency_uuid: &str,
    slug: &str,
) -> Result<usize, Box<dyn std::error::Error + Sync + Send>> {
    let trip_ids = store::trips::id_map(pool, agency_uuid).await?;
    let stop_ids = store::stops::id_map(pool, agency_uuid).await?;

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let columns = index_columns(&reader.headers()?.clone());

    let mut batch: Vec<NewStopTime> = Vec::with_capacity(BATCH_SIZE);
    let mut total = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(_) => continue,
        };

        let trip_uuid = match trip_ids.get(get_field(&record, &columns, "trip_id")) {
            Some(trip_uuid) => trip_uuid.clone(),
            None => continue,
        };
        let stop_uuid = match stop_ids.get(get_field(&record, &columns, "stop_id")) {
            Some(stop_uuid) => stop_uuid.clone(),
            None => continue,
        };

        let arrival = parse_gtfs_time(get_field(&record, &columns, "arrival_time"));
        let departure = parse_gtfs_time(get_field(&record, &columns, "departure_time"));
        let (arrival_time, departure_time) = match (arrival, departure) {
            (Some(arrival_time), Some(departure_time)) => (arrival_time, departure_time),
            (Some(t), None) | (None, Some(t)) => (t, t),
            (None, None) => continue,
        };

        let stop_sequence: i32 = match get_field(&record, &columns, "stop_sequence").parse() {
            Ok(stop_sequence) => stop_sequence,
            Err(_) => continue,
        };

        batch.push(NewStopTime {
            trip_id: trip_uuid,
            stop_id: stop_uuid,
            arrival_time,
            departure_time,
            stop_sequence,
            pickup_type: get_field(&record, &columns, "pickup_type").parse().unwrap_or(0),
            drop_off_type: get_field(&record, &columns, "drop_off_type").parse().unwrap_or(0),
        });
        total += 1;

        if batch.len() >= BATCH_SIZE {
            if let Err(e) = insert_batch(pool, &batch).await {
                warn!("[{}]   stop_times batch error (continuing): {}", slug, e);
            }
            batch.clear();
        }
    }

    if !batch.is_empty() {
        if let Err(e) = insert_batch(pool, &batch).await {
            warn!("[{}]   stop_times final batch error: {}", slug, e);
        }
    }

    info!("[{}]   stop_times: {}", slug, total);
    Ok(total)
}

async fn insert_batch(
    pool: &TransitPool,
    batch: &[NewStopTime],
) -> Result<usize, Box<dyn std::error::Error + Sync + Send>> {
    use bidepass::schema::stop_times::dsl::*;

    let conn = &mut pool.get().await?;

    let written = diesel::insert_into(stop_times)
        .values(batch)
        .on_conflict_do_nothing()
        .execute(conn)
        .await?;

    Ok(written)
}
