use crate::error::Error;
use crate::models::{NewRoute, Route};
use crate::postgres_tools::TransitPool;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use postgis_diesel::types::{LineString, Point};
use std::collections::HashMap;

pub async fn upsert_batch(pool: &TransitPool, batch: &[NewRoute]) -> Result<usize, Error> {
    use crate::schema::routes::dsl::*;

    if batch.is_empty() {
        return Ok(0);
    }

    let conn = &mut pool.get().await?;

    let written = diesel::insert_into(routes)
        .values(batch)
        .on_conflict((agency_id, route_id))
        .do_update()
        .set((
            short_name.eq(excluded(short_name)),
            long_name.eq(excluded(long_name)),
            route_type.eq(excluded(route_type)),
            color.eq(excluded(color)),
            text_color.eq(excluded(text_color)),
        ))
        .execute(conn)
        .await?;

    Ok(written)
}

pub async fn get_by_id(pool: &TransitPool, route_uuid: &str) -> Result<Option<Route>, Error> {
    use crate::schema::routes::dsl::*;

    let conn = &mut pool.get().await?;

    let found = routes
        .filter(id.eq(route_uuid))
        .select(Route::as_select())
        .first(conn)
        .await
        .optional()?;

    Ok(found)
}

pub async fn list_by_agency(pool: &TransitPool, agency: &str) -> Result<Vec<Route>, Error> {
    use crate::schema::routes::dsl::*;

    let conn = &mut pool.get().await?;

    let found = routes
        .filter(agency_id.eq(agency))
        .order(route_id.asc())
        .select(Route::as_select())
        .load(conn)
        .await?;

    Ok(found)
}

/// External id → internal id for one agency.
pub async fn id_map(pool: &TransitPool, agency: &str) -> Result<HashMap<String, String>, Error> {
    use crate::schema::routes::dsl::*;

    let conn = &mut pool.get().await?;

    let pairs: Vec<(String, String)> = routes
        .filter(agency_id.eq(agency))
        .select((route_id, id))
        .load(conn)
        .await?;

    Ok(pairs.into_iter().collect())
}

/// Applies a shape polyline to every route whose trips reference the
/// shape and whose geometry is still unset. Returns the routes touched.
pub async fn set_shape_if_null(
    pool: &TransitPool,
    agency: &str,
    gtfs_shape_id: &str,
    line: LineString<Point>,
) -> Result<usize, Error> {
    use crate::schema::routes;
    use crate::schema::trips;

    let conn = &mut pool.get().await?;

    let referencing_routes = trips::table
        .filter(trips::shape_id.eq(gtfs_shape_id))
        .select(trips::route_id);

    let updated = diesel::update(
        routes::table
            .filter(routes::id.eq_any(referencing_routes))
            .filter(routes::agency_id.eq(agency))
            .filter(routes::shape.is_null()),
    )
    .set(routes::shape.eq(Some(line)))
    .execute(conn)
    .await?;

    Ok(updated)
}
