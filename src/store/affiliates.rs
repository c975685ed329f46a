use crate::error::Error;
use crate::models::Affiliate;
use crate::postgres_tools::TransitPool;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double};
use diesel_async::RunQueryDsl;

#[derive(QueryableByName, Debug, Clone)]
pub struct NearbyAffiliate {
    #[diesel(embed)]
    pub affiliate: Affiliate,
    #[diesel(sql_type = Double)]
    pub distance_meters: f64,
}

/// Active affiliates ordered by geodesic distance from the given point.
pub async fn find_nearby(
    pool: &TransitPool,
    lat: f64,
    lon: f64,
    limit: i64,
) -> Result<Vec<NearbyAffiliate>, Error> {
    let conn = &mut pool.get().await?;

    let found = diesel::sql_query(
        "SELECT affiliates.*, \
                ST_Distance(location::geography, ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography) AS distance_meters \
         FROM affiliates \
         WHERE active \
         ORDER BY distance_meters \
         LIMIT $3",
    )
    .bind::<Double, _>(lon)
    .bind::<Double, _>(lat)
    .bind::<BigInt, _>(limit)
    .load::<NearbyAffiliate>(conn)
    .await?;

    Ok(found)
}

pub async fn get_by_id(pool: &TransitPool, affiliate_id: &str) -> Result<Option<Affiliate>, Error> {
    use crate::schema::affiliates::dsl::*;

    let conn = &mut pool.get().await?;

    let found = affiliates
        .filter(id.eq(affiliate_id))
        .select(Affiliate::as_select())
        .first(conn)
        .await
        .optional()?;

    Ok(found)
}
