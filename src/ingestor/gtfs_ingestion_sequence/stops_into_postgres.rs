use crate::gtfs_handlers::{get_field, index_columns};
use bidepass::models::NewStop;
use bidepass::postgres_tools::TransitPool;
use bidepass::store;
use csv::ReaderBuilder;
use log::info;
use postgis_diesel::types::Point;

const BATCH_SIZE: usize = 500;

/// Streams `stops.txt`, upserting in batches on `(agency, external id)`.
/// Rows at the (0, 0) null island and unreadable rows are skipped.
pub async fn stops_into_postgres(
    pool: &TransitPool,
    csv_text: &str,
    agency_uuid: &str,
    slug: &str,
) -> Result<usize, Box<dyn std::error::Error + Sync + Send>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let columns = index_columns(&reader.headers()?.clone());

    let mut batch: Vec<NewStop> = Vec::with_capacity(BATCH_SIZE);
    let mut total = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(_) => continue,
        };

        let external_id = get_field(&record, &columns, "stop_id");
        if external_id.is_empty() {
            continue;
        }

        let lat: f64 = get_field(&record, &columns, "stop_lat").parse().unwrap_or(0.0);
        let lon: f64 = get_field(&record, &columns, "stop_lon").parse().unwrap_or(0.0);
        if lat == 0.0 && lon == 0.0 {
            continue;
        }

        let platform_code = match get_field(&record, &columns, "platform_code") {
            "" => None,
            value => Some(value.to_string()),
        };

        batch.push(NewStop {
            stop_id: external_id.to_string(),
            agency_id: agency_uuid.to_string(),
            name: get_field(&record, &columns, "stop_name").to_string(),
            location: Point::new(lon, lat, Some(4326)),
            platform_code,
            wheelchair_accessible: get_field(&record, &columns, "wheelchair_boarding") == "1",
            metadata: None,
        });
        total += 1;

        if batch.len() >= BATCH_SIZE {
            store::stops::upsert_batch(pool, &batch).await?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        store::stops::upsert_batch(pool, &batch).await?;
    }

    info!("[{}]   stops: {}", slug, total);
    Ok(total)
}
