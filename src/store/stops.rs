use crate::error::Error;
use crate::models::{NewStop, Stop};
use crate::postgres_tools::TransitPool;
use crate::store::clamp_limit;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Float, Text};
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use std::collections::HashMap;

pub const MAX_RADIUS_METERS: f64 = 10_000.0;

#[derive(QueryableByName, Debug, Clone)]
pub struct NearbyStop {
    #[diesel(embed)]
    pub stop: Stop,
    #[diesel(sql_type = Double)]
    pub distance_meters: f64,
}

#[derive(QueryableByName, Debug, Clone)]
pub struct SearchedStop {
    #[diesel(embed)]
    pub stop: Stop,
    #[diesel(sql_type = Float)]
    pub similarity: f32,
}

/// Upserts on `(agency, external id)`, overwriting the mutable fields so
/// re-ingesting a changed feed converges on the latest data.
pub async fn upsert_batch(pool: &TransitPool, batch: &[NewStop]) -> Result<usize, Error> {
    use crate::schema::stops::dsl::*;

    if batch.is_empty() {
        return Ok(0);
    }

    let conn = &mut pool.get().await?;

    let written = diesel::insert_into(stops)
        .values(batch)
        .on_conflict((agency_id, stop_id))
        .do_update()
        .set((
            name.eq(excluded(name)),
            location.eq(excluded(location)),
            platform_code.eq(excluded(platform_code)),
            wheelchair_accessible.eq(excluded(wheelchair_accessible)),
            metadata.eq(excluded(metadata)),
        ))
        .execute(conn)
        .await?;

    Ok(written)
}

pub async fn get_by_id(pool: &TransitPool, stop_uuid: &str) -> Result<Option<Stop>, Error> {
    use crate::schema::stops::dsl::*;

    let conn = &mut pool.get().await?;

    let found = stops
        .filter(id.eq(stop_uuid))
        .select(Stop::as_select())
        .first(conn)
        .await
        .optional()?;

    Ok(found)
}

pub async fn get_by_ids(pool: &TransitPool, stop_uuids: &[String]) -> Result<Vec<Stop>, Error> {
    use crate::schema::stops::dsl::*;

    if stop_uuids.is_empty() {
        return Ok(vec![]);
    }

    let conn = &mut pool.get().await?;

    let found = stops
        .filter(id.eq_any(stop_uuids))
        .order(name.asc())
        .select(Stop::as_select())
        .load(conn)
        .await?;

    Ok(found)
}

/// External id → internal id for one agency. The ingestor resolves
/// stop-time references through this map.
pub async fn id_map(pool: &TransitPool, agency: &str) -> Result<HashMap<String, String>, Error> {
    use crate::schema::stops::dsl::*;

    let conn = &mut pool.get().await?;

    let pairs: Vec<(String, String)> = stops
        .filter(agency_id.eq(agency))
        .select((stop_id, id))
        .load(conn)
        .await?;

    Ok(pairs.into_iter().collect())
}

/// Radius search in meters, nearest first. A zero radius matches nothing;
/// a negative or oversized radius is a caller error.
pub async fn find_nearby(
    pool: &TransitPool,
    lat: f64,
    lon: f64,
    radius_meters: f64,
    limit: i64,
) -> Result<Vec<NearbyStop>, Error> {
    if radius_meters < 0.0 {
        return Err(Error::InvalidInput("radius must be non-negative".to_string()));
    }
    if radius_meters > MAX_RADIUS_METERS {
        return Err(Error::InvalidInput(format!(
            "radius {} exceeds {} m",
            radius_meters, MAX_RADIUS_METERS
        )));
    }
    if radius_meters == 0.0 {
        return Ok(vec![]);
    }

    let limit = clamp_limit(limit, 50, 50);
    let conn = &mut pool.get().await?;

    let found = diesel::sql_query(
        "SELECT stops.*, \
                ST_Distance(location::geography, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) AS distance_meters \
         FROM stops \
         WHERE ST_DWithin(location::geography, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography, $3) \
         ORDER BY distance_meters \
         LIMIT $4",
    )
    .bind::<Double, _>(lon)
    .bind::<Double, _>(lat)
    .bind::<Double, _>(radius_meters)
    .bind::<BigInt, _>(limit)
    .load::<NearbyStop>(conn)
    .await?;

    Ok(found)
}

/// Fuzzy + full-text search over stop names, best match first.
pub async fn search(
    pool: &TransitPool,
    query: &str,
    limit: i64,
) -> Result<Vec<SearchedStop>, Error> {
    if query.trim().is_empty() {
        return Err(Error::InvalidInput("search query must not be empty".to_string()));
    }

    let limit = clamp_limit(limit, 20, 20);
    let conn = &mut pool.get().await?;

    let found = diesel::sql_query(
        "SELECT stops.*, similarity(name, $1) AS similarity \
         FROM stops \
         WHERE to_tsvector('spanish', name) @@ plainto_tsquery('spanish', $1) \
            OR name % $1 \
         ORDER BY similarity DESC \
         LIMIT $2",
    )
    .bind::<Text, _>(query)
    .bind::<BigInt, _>(limit)
    .load::<SearchedStop>(conn)
    .await?;

    Ok(found)
}
