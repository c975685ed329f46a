use crate::error::Error;
use crate::models::{Agency, NewAgency};
use crate::postgres_tools::TransitPool;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

/// Upserts by slug and returns the internal id.
pub async fn upsert(pool: &TransitPool, new_agency: &NewAgency) -> Result<String, Error> {
    use crate::schema::agencies::dsl::*;

    let conn = &mut pool.get().await?;

    let agency_id = diesel::insert_into(agencies)
        .values(new_agency)
        .on_conflict(slug)
        .do_update()
        .set((name.eq(excluded(name)), url.eq(excluded(url))))
        .returning(id)
        .get_result::<String>(conn)
        .await?;

    Ok(agency_id)
}

pub async fn get_by_slug(pool: &TransitPool, agency_slug: &str) -> Result<Option<Agency>, Error> {
    use crate::schema::agencies::dsl::*;

    let conn = &mut pool.get().await?;

    let agency = agencies
        .filter(slug.eq(agency_slug))
        .select(Agency::as_select())
        .first(conn)
        .await
        .optional()?;

    Ok(agency)
}

pub async fn list(pool: &TransitPool) -> Result<Vec<Agency>, Error> {
    use crate::schema::agencies::dsl::*;

    let conn = &mut pool.get().await?;

    let all = agencies
        .order(slug.asc())
        .select(Agency::as_select())
        .load(conn)
        .await?;

    Ok(all)
}
