use crate::gtfs_handlers::{get_field, index_columns};
use bidepass::models::NewRoute;
use bidepass::postgres_tools::TransitPool;
use bidepass::store;
use csv::ReaderBuilder;
use log::info;

const BATCH_SIZE: usize = 500;

/// Streams `routes.txt` with the GTFS fallbacks: a missing long name
/// falls back to the short name, then to the external id; colors default
/// to black on white.
pub async fn routes_into_postgres(
    pool: &TransitPool,
    csv_text: &str,
    agency_uuid: &str,
    slug: &str,
) -> Result<usize, Box<dyn std::error::Error + Sync + Send>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let columns = index_columns(&reader.headers()?.clone());

    let mut batch: Vec<NewRoute> = Vec::with_capacity(BATCH_SIZE);
    let mut total = 0usize;

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(_) => continue,
        };

        let external_id = get_field(&record, &columns, "route_id");
        if external_id.is_empty() {
            continue;
        }

        let short_name = get_field(&record, &columns, "route_short_name");
        let mut long_name = get_field(&record, &columns, "route_long_name");
        if long_name.is_empty() {
            long_name = short_name;
        }
        if long_name.is_empty() {
            long_name = external_id;
        }

        let mut color = get_field(&record, &columns, "route_color");
        if color.is_empty() {
            color = "000000";
        }
        let mut text_color = get_field(&record, &columns, "route_text_color");
        if text_color.is_empty() {
            text_color = "FFFFFF";
        }

        batch.push(NewRoute {
            route_id: external_id.to_string(),
            agency_id: agency_uuid.to_string(),
            short_name: match short_name {
                "" => None,
                value => Some(value.to_string()),
            },
            long_name: long_name.to_string(),
            route_type: get_field(&record, &columns, "route_type").parse().unwrap_or(0),
            color: color.to_string(),
            text_color: text_color.to_string(),
        });
        total += 1;

        if batch.len() >= BATCH_SIZE {
            store::routes::upsert_batch(pool, &batch).await?;
            batch.clear();
        }
    }

    if !batch.is_empty() {
        store::routes::upsert_batch(pool, &batch).await?;
    }

    info!("[{}]   routes: {}", slug, total);
    Ok(total)
}
