use crate::gtfs_handlers::{get_field, index_columns};
use bidepass::postgres_tools::TransitPool;
use bidepass::store;
use csv::ReaderBuilder;
use log::{info, warn};
use postgis_diesel::types::{LineString, Point};
use std::collections::HashMap;

/// Accumulates `shapes.txt` points per shape, materializes line-strings,
/// and applies each to the routes that reference the shape and still
/// have no geometry.
pub async fn shapes_into_postgres(
    pool: &TransitPool,
    csv_text: &str,
    agency_uuid: &str,
    slug: &str,
) -> Result<usize, Box<dyn std::error::Error + Sync + Send>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(csv_text.as_bytes());
    let columns = index_columns(&reader.headers()?.clone());

    let mut shapes: HashMap<String, Vec<(i32, f64, f64)>> = HashMap::new();

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(_) => continue,
        };

        let shape_id = get_field(&record, &columns, "shape_id");
        if shape_id.is_empty() {
            continue;
        }

        let lat: f64 = match get_field(&record, &columns, "shape_pt_lat").parse() {
            Ok(lat) => lat,
            Err(_) => continue,
        };
        let lon: f64 = match get_field(&record, &columns, "shape_pt_lon").parse() {
            Ok(lon) => lon,
            Err(_) => continue,
        };
        let sequence: i32 = get_field(&record, &columns, "shape_pt_sequence")
            .parse()
            .unwrap_or(0);

        shapes
            .entry(shape_id.to_string())
            .or_default()
            .push((sequence, lat, lon));
    }

    let unique = shapes.len();
    let mut applied = 0usize;

    for (shape_id, mut points) in shapes {
        if points.len() < 2 {
            continue;
        }

        points.sort_by_key(|&(sequence, _, _)| sequence);

        let line = LineString {
            points: points
                .iter()
                .map(|&(_, lat, lon)| Point::new(lon, lat, Some(4326)))
                .collect(),
            srid: Some(4326),
        };

        match store::routes::set_shape_if_null(pool, agency_uuid, &shape_id, line).await {
            Ok(updated) if updated > 0 => applied += 1,
            Ok(_) => {}
            Err(e) => {
                warn!("[{}]   shape {} error: {}", slug, shape_id, e);
            }
        }
    }

    info!("[{}]   shapes: {} unique, {} applied to routes", slug, unique, applied);
    Ok(applied)
}
