use crate::error::Error;
use crate::models::{NewTrip, StopTime, Trip};
use crate::postgres_tools::TransitPool;
use crate::store::clamp_limit;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use std::collections::HashMap;

/// A computed next departure at a stop.
#[derive(QueryableByName, Debug, Clone)]
pub struct DepartureRow {
    #[diesel(sql_type = Text)]
    pub trip_uuid: String,
    #[diesel(sql_type = Text)]
    pub trip_code: String,
    #[diesel(sql_type = diesel::sql_types::Nullable<Text>)]
    pub headsign: Option<String>,
    #[diesel(sql_type = Text)]
    pub route_uuid: String,
    #[diesel(sql_type = diesel::sql_types::Nullable<Text>)]
    pub route_short_name: Option<String>,
    #[diesel(sql_type = Text)]
    pub route_long_name: String,
    #[diesel(sql_type = diesel::sql_types::Integer)]
    pub departure_secs: i32,
    #[diesel(sql_type = diesel::sql_types::Nullable<Text>)]
    pub platform_code: Option<String>,
}

pub async fn upsert_batch(pool: &TransitPool, batch: &[NewTrip]) -> Result<usize, Error> {
    use crate::schema::trips::dsl::*;

    if batch.is_empty() {
        return Ok(0);
    }

    let conn = &mut pool.get().await?;

    let written = diesel::insert_into(trips)
        .values(batch)
        .on_conflict((route_id, trip_id))
        .do_update()
        .set((
            service_id.eq(excluded(service_id)),
            headsign.eq(excluded(headsign)),
            direction_id.eq(excluded(direction_id)),
            shape_id.eq(excluded(shape_id)),
        ))
        .execute(conn)
        .await?;

    Ok(written)
}

pub async fn get_by_id(pool: &TransitPool, trip_uuid: &str) -> Result<Option<Trip>, Error> {
    use crate::schema::trips::dsl::*;

    let conn = &mut pool.get().await?;

    let found = trips
        .filter(id.eq(trip_uuid))
        .select(Trip::as_select())
        .first(conn)
        .await
        .optional()?;

    Ok(found)
}

/// External trip id → internal id across one agency's routes.
pub async fn id_map(pool: &TransitPool, agency: &str) -> Result<HashMap<String, String>, Error> {
    use crate::schema::routes;
    use crate::schema::trips;

    let conn = &mut pool.get().await?;

    let pairs: Vec<(String, String)> = trips::table
        .inner_join(routes::table)
        .filter(routes::agency_id.eq(agency))
        .select((trips::trip_id, trips::id))
        .load(conn)
        .await?;

    Ok(pairs.into_iter().collect())
}

pub async fn get_stop_times(pool: &TransitPool, trip_uuid: &str) -> Result<Vec<StopTime>, Error> {
    use crate::schema::stop_times::dsl::*;

    let conn = &mut pool.get().await?;

    let found = stop_times
        .filter(trip_id.eq(trip_uuid))
        .order(stop_sequence.asc())
        .select(StopTime::as_select())
        .load(conn)
        .await?;

    Ok(found)
}

/// Next departures from a stop after the given service-day offset.
pub async fn next_departures_at_stop(
    pool: &TransitPool,
    stop_uuid: &str,
    after_secs: i32,
    limit: i64,
) -> Result<Vec<DepartureRow>, Error> {
    let limit = clamp_limit(limit, 10, 10);
    let conn = &mut pool.get().await?;

    let found = diesel::sql_query(
        "SELECT t.id AS trip_uuid, t.trip_id AS trip_code, t.headsign, \
                r.id AS route_uuid, r.short_name AS route_short_name, r.long_name AS route_long_name, \
                st.departure_time AS departure_secs, s.platform_code \
         FROM stop_times st \
         JOIN trips t ON t.id = st.trip_id \
         JOIN routes r ON r.id = t.route_id \
         JOIN stops s ON s.id = st.stop_id \
         WHERE st.stop_id = $1 AND st.departure_time >= $2 \
         ORDER BY st.departure_time \
         LIMIT $3",
    )
    .bind::<Text, _>(stop_uuid)
    .bind::<diesel::sql_types::Integer, _>(after_secs)
    .bind::<BigInt, _>(limit)
    .load::<DepartureRow>(conn)
    .await?;

    Ok(found)
}
