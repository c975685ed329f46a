use crate::error::Error;
use crate::models::{DelayEvent, NewDelayEvent};
use crate::postgres_tools::TransitPool;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

/// Appends a delay event and returns its id.
pub async fn insert(pool: &TransitPool, event: &NewDelayEvent) -> Result<String, Error> {
    use crate::schema::delay_events::dsl::*;

    let conn = &mut pool.get().await?;

    let event_id = diesel::insert_into(delay_events)
        .values(event)
        .returning(id)
        .get_result::<String>(conn)
        .await?;

    Ok(event_id)
}

pub async fn get_by_id(pool: &TransitPool, event_id: &str) -> Result<Option<DelayEvent>, Error> {
    use crate::schema::delay_events::dsl::*;

    let conn = &mut pool.get().await?;

    let found = delay_events
        .filter(id.eq(event_id))
        .select(DelayEvent::as_select())
        .first(conn)
        .await
        .optional()?;

    Ok(found)
}

/// Flips `is_compensated` once; repeat calls are harmless.
pub async fn mark_compensated(pool: &TransitPool, event_id: &str) -> Result<(), Error> {
    use crate::schema::delay_events::dsl::*;

    let conn = &mut pool.get().await?;

    diesel::update(delay_events.filter(id.eq(event_id)))
        .set((
            is_compensated.eq(true),
            compensation_sent_at.eq(Some(chrono::Utc::now())),
        ))
        .execute(conn)
        .await?;

    Ok(())
}
