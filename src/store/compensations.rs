use crate::error::Error;
use crate::models::{Compensation, NewCompensation};
use crate::postgres_tools::TransitPool;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

pub async fn create(pool: &TransitPool, comp: &NewCompensation) -> Result<Compensation, Error> {
    use crate::schema::compensations::dsl::*;

    let conn = &mut pool.get().await?;

    let created = diesel::insert_into(compensations)
        .values(comp)
        .returning(Compensation::as_returning())
        .get_result(conn)
        .await?;

    Ok(created)
}

pub async fn get_by_code(pool: &TransitPool, coupon: &str) -> Result<Option<Compensation>, Error> {
    use crate::schema::compensations::dsl::*;

    let conn = &mut pool.get().await?;

    let found = compensations
        .filter(code.eq(coupon))
        .select(Compensation::as_select())
        .first(conn)
        .await
        .optional()?;

    Ok(found)
}

/// At most one coupon exists per delay event; workflow replays look it up
/// here instead of issuing twice.
pub async fn get_by_delay_event(
    pool: &TransitPool,
    delay_event: &str,
) -> Result<Option<Compensation>, Error> {
    use crate::schema::compensations::dsl::*;

    let conn = &mut pool.get().await?;

    let found = compensations
        .filter(delay_event_id.eq(delay_event))
        .select(Compensation::as_select())
        .first(conn)
        .await
        .optional()?;

    Ok(found)
}

/// Marks a coupon redeemed, once.
pub async fn redeem(pool: &TransitPool, coupon: &str) -> Result<(), Error> {
    use crate::schema::compensations::dsl::*;

    let conn = &mut pool.get().await?;

    let updated = diesel::update(
        compensations
            .filter(code.eq(coupon))
            .filter(redeemed_at.is_null()),
    )
    .set(redeemed_at.eq(Some(chrono::Utc::now())))
    .execute(conn)
    .await?;

    if updated == 0 {
        return Err(Error::NotFound("compensation", coupon.to_string()));
    }

    Ok(())
}

/// Saga rollback path: removes the coupon by code.
pub async fn delete(pool: &TransitPool, coupon: &str) -> Result<(), Error> {
    use crate::schema::compensations::dsl::*;

    let conn = &mut pool.get().await?;

    diesel::delete(compensations.filter(code.eq(coupon)))
        .execute(conn)
        .await?;

    Ok(())
}
