use bidepass::bus::Publisher;
use bidepass::gtfs_rt_handlers::transform::{
    alert_message, detect_delays, detoured_trip_ids, position_message, vehicle_reading,
};
use bidepass::gtfs_rt_handlers::{FeedMessage, parse_protobuf_message};
use bidepass::manifest::AgencyEntry;
use bidepass::postgres_tools::TransitPool;
use bidepass::store;
use chrono::Utc;
use diesel::result::DatabaseErrorKind;
use futures::StreamExt;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;

const POLL_CONCURRENCY: usize = 8;

/// One tick: every agency with realtime feeds is polled, at most eight
/// concurrently. Feeds within one agency run sequentially.
pub async fn poll_all(
    pool: Arc<TransitPool>,
    publisher: Arc<Publisher>,
    client: reqwest::Client,
    agencies: Arc<Vec<AgencyEntry>>,
    agency_ids: Arc<HashMap<String, String>>,
) {
    futures::stream::iter(agencies.iter().cloned().map(|agency| {
        let pool = Arc::clone(&pool);
        let publisher = Arc::clone(&publisher);
        let client = client.clone();
        let agency_ids = Arc::clone(&agency_ids);
        async move {
            let agency_uuid = match agency_ids.get(&agency.slug) {
                Some(agency_uuid) => agency_uuid.clone(),
                None => return,
            };
            let rt = match &agency.gtfs_rt {
                Some(rt) => rt.clone(),
                None => return,
            };

            if let Some(url) = rt.vehicle_positions.as_deref() {
                if let Err(e) =
                    poll_vehicle_positions(&pool, &publisher, &client, &agency, &agency_uuid, url)
                        .await
                {
                    warn!("[{}] vehicle_positions: {}", agency.slug, e);
                }
            }

            if let Some(url) = rt.trip_updates.as_deref() {
                if let Err(e) = poll_trip_updates(&publisher, &client, &agency, url).await {
                    warn!("[{}] trip_updates: {}", agency.slug, e);
                }
            }

            if let Some(url) = rt.alerts.as_deref() {
                if let Err(e) = poll_alerts(&publisher, &client, &agency, url).await {
                    warn!("[{}] alerts: {}", agency.slug, e);
                }
            }
        }
    }))
    .buffer_unordered(POLL_CONCURRENCY)
    .collect::<Vec<()>>()
    .await;
}

async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
) -> Result<FeedMessage, Box<dyn std::error::Error + Sync + Send>> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(format!("HTTP {} for {}", response.status(), url).into());
    }
    let bytes = response.bytes().await?;
    parse_protobuf_message(&bytes)
}

/// Null-FK rejections are expected while the schedule lags the feed.
fn is_null_violation(e: &bidepass::error::Error) -> bool {
    matches!(
        e,
        bidepass::error::Error::Db(diesel::result::Error::DatabaseError(
            DatabaseErrorKind::NotNullViolation,
            _,
        ))
    )
}

async fn poll_vehicle_positions(
    pool: &TransitPool,
    publisher: &Publisher,
    client: &reqwest::Client,
    agency: &AgencyEntry,
    agency_uuid: &str,
    url: &str,
) -> Result<(), Box<dyn std::error::Error + Sync + Send>> {
    let feed = fetch_feed(client, url).await?;
    let now = Utc::now();

    let mut inserted = 0usize;
    for entity in &feed.entity {
        let reading = match vehicle_reading(entity, &agency.slug, now) {
            Some(reading) => reading,
            None => continue,
        };

        if let Err(e) = store::vehicles::insert_position(pool, agency_uuid, &reading).await {
            if !is_null_violation(&e) {
                warn!("[{}] insert vp {}: {}", agency.slug, reading.vehicle_id, e);
            }
            continue;
        }
        inserted += 1;

        if let Err(e) = publisher
            .publish_vehicle_position(&agency.slug, &position_message(&reading))
            .await
        {
            warn!("[{}] publish vp {}: {}", agency.slug, reading.vehicle_id, e);
        }
    }

    if inserted > 0 {
        info!("[{}] {} vehicle positions", agency.slug, inserted);
    }
    Ok(())
}

async fn poll_trip_updates(
    publisher: &Publisher,
    client: &reqwest::Client,
    agency: &AgencyEntry,
    url: &str,
) -> Result<(), Box<dyn std::error::Error + Sync + Send>> {
    let feed = fetch_feed(client, url).await?;

    let mut delays = 0usize;
    for entity in &feed.entity {
        let update = match &entity.trip_update {
            Some(update) => update,
            None => continue,
        };

        for detected in detect_delays(update, &agency.slug) {
            delays += 1;
            if let Err(e) = publisher.publish_delay_detected(&detected).await {
                warn!("[{}] publish delay: {}", agency.slug, e);
            }
        }
    }

    if delays > 0 {
        info!("[{}] {} significant delays detected", agency.slug, delays);
    }
    Ok(())
}

async fn poll_alerts(
    publisher: &Publisher,
    client: &reqwest::Client,
    agency: &AgencyEntry,
    url: &str,
) -> Result<(), Box<dyn std::error::Error + Sync + Send>> {
    let feed = fetch_feed(client, url).await?;

    for entity in &feed.entity {
        let alert = match &entity.alert {
            Some(alert) => alert,
            None => continue,
        };

        if let Some(message) = alert_message(alert, &agency.slug) {
            if let Err(e) = publisher.publish_alert(&agency.slug, &message).await {
                warn!("[{}] publish alert: {}", agency.slug, e);
            }
        }

        for trip_id in detoured_trip_ids(alert) {
            if let Err(e) = publisher.publish_detour(&trip_id).await {
                warn!("[{}] publish detour {}: {}", agency.slug, trip_id, e);
            }
        }
    }

    Ok(())
}
