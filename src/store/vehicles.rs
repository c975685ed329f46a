use crate::error::Error;
use crate::models::VehiclePositionRow;
use crate::postgres_tools::TransitPool;
use chrono::{DateTime, Utc};
use diesel::sql_types::{Double, Integer, Jsonb, Nullable, Text, Timestamptz};
use diesel_async::RunQueryDsl;
use serde_json::Value;

/// One transformed GTFS-RT vehicle reading, before trip/route resolution.
#[derive(Debug, Clone)]
pub struct VehicleReading {
    pub time: DateTime<Utc>,
    pub vehicle_id: String,
    pub trip_external_id: Option<String>,
    pub route_external_id: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub bearing: f64,
    pub speed: f64,
    pub congestion_level: i32,
    pub occupancy_status: i32,
    pub metadata: Option<Value>,
}

/// Appends one reading to the hypertable, resolving the feed's trip and
/// route ids through the agency-scoped subqueries. Unresolvable ids
/// become NULL rather than failing the insert.
pub async fn insert_position(
    pool: &TransitPool,
    agency_uuid: &str,
    reading: &VehicleReading,
) -> Result<(), Error> {
    let conn = &mut pool.get().await?;

    diesel::sql_query(
        "INSERT INTO vehicle_positions \
             (time, vehicle_id, trip_id, route_id, location, bearing, speed, congestion_level, occupancy_status, metadata) \
         VALUES ($1, $2, \
             (SELECT t.id FROM trips t JOIN routes r ON t.route_id = r.id \
              WHERE t.trip_id = $3 AND r.agency_id = $4 LIMIT 1), \
             (SELECT id FROM routes WHERE route_id = $5 AND agency_id = $4 LIMIT 1), \
             ST_SetSRID(ST_MakePoint($6, $7), 4326), \
             $8, $9, $10, $11, $12)",
    )
    .bind::<Timestamptz, _>(reading.time)
    .bind::<Text, _>(&reading.vehicle_id)
    .bind::<Nullable<Text>, _>(&reading.trip_external_id)
    .bind::<Text, _>(agency_uuid)
    .bind::<Nullable<Text>, _>(&reading.route_external_id)
    .bind::<Double, _>(reading.lon)
    .bind::<Double, _>(reading.lat)
    .bind::<Double, _>(reading.bearing)
    .bind::<Double, _>(reading.speed)
    .bind::<Integer, _>(reading.congestion_level)
    .bind::<Integer, _>(reading.occupancy_status)
    .bind::<Nullable<Jsonb>, _>(&reading.metadata)
    .execute(conn)
    .await?;

    Ok(())
}

/// Latest reading per vehicle on a route.
pub async fn latest_by_route(
    pool: &TransitPool,
    route_uuid: &str,
) -> Result<Vec<VehiclePositionRow>, Error> {
    let conn = &mut pool.get().await?;

    let found = diesel::sql_query(
        "SELECT DISTINCT ON (vehicle_id) vehicle_positions.* \
         FROM vehicle_positions \
         WHERE route_id = $1 \
         ORDER BY vehicle_id, time DESC",
    )
    .bind::<Text, _>(route_uuid)
    .load::<VehiclePositionRow>(conn)
    .await?;

    Ok(found)
}
