//! Journey planner: direct and one-transfer path search over the
//! schedule. Times are service-day offsets in seconds; offsets past
//! 86400 roll into the next day when wall-clocks are rebuilt.

use crate::error::Error;
use crate::postgres_tools::TransitPool;
use crate::store::clamp_limit;
use chrono::{Duration, NaiveDateTime, Timelike};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Double, Integer, Nullable, SmallInt, Text};
use diesel_async::RunQueryDsl;
use log::warn;
use serde::Serialize;

pub const MIN_TRANSFER_SECS: i32 = 2 * 60;
pub const MAX_TRANSFER_SECS: i32 = 30 * 60;

pub const DEFAULT_LIMIT: i64 = 5;
pub const MAX_LIMIT: i64 = 20;

#[derive(Debug, Clone)]
pub struct JourneyQuery {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub depart_after: NaiveDateTime,
    pub max_transfers: i32,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopSummary {
    pub id: String,
    pub stop_id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub id: String,
    pub route_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    pub long_name: String,
    pub route_type: i32,
    pub color: String,
    pub text_color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripSummary {
    pub id: String,
    pub trip_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headsign: Option<String>,
    pub route_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LegDeparture {
    pub trip: TripSummary,
    pub scheduled_time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyLeg {
    pub route: RouteSummary,
    pub from_stop: StopSummary,
    pub to_stop: StopSummary,
    pub departure: LegDeparture,
    pub arrival_time: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct Journey {
    pub legs: Vec<JourneyLeg>,
    #[serde(rename = "duration")]
    pub duration_seconds: i64,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
    pub transfers: i32,
}

#[derive(QueryableByName, Debug, Clone)]
pub struct DirectRow {
    #[diesel(sql_type = Integer)]
    pub dep_secs: i32,
    #[diesel(sql_type = Integer)]
    pub arr_secs: i32,
    #[diesel(sql_type = Text)]
    pub trip_uuid: String,
    #[diesel(sql_type = Text)]
    pub trip_code: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub headsign: Option<String>,
    #[diesel(sql_type = SmallInt)]
    pub direction_id: i16,
    #[diesel(sql_type = Text)]
    pub route_uuid: String,
    #[diesel(sql_type = Text)]
    pub route_code: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub short_name: Option<String>,
    #[diesel(sql_type = Text)]
    pub long_name: String,
    #[diesel(sql_type = Integer)]
    pub route_type: i32,
    #[diesel(sql_type = Text)]
    pub color: String,
    #[diesel(sql_type = Text)]
    pub text_color: String,
    #[diesel(sql_type = Text)]
    pub from_uuid: String,
    #[diesel(sql_type = Text)]
    pub from_code: String,
    #[diesel(sql_type = Text)]
    pub from_name: String,
    #[diesel(sql_type = Double)]
    pub from_lat: f64,
    #[diesel(sql_type = Double)]
    pub from_lon: f64,
    #[diesel(sql_type = Text)]
    pub to_uuid: String,
    #[diesel(sql_type = Text)]
    pub to_code: String,
    #[diesel(sql_type = Text)]
    pub to_name: String,
    #[diesel(sql_type = Double)]
    pub to_lat: f64,
    #[diesel(sql_type = Double)]
    pub to_lon: f64,
}

#[derive(QueryableByName, Debug, Clone)]
pub struct TransferRow {
    #[diesel(sql_type = Integer)]
    pub dep1: i32,
    #[diesel(sql_type = Integer)]
    pub arr1: i32,
    #[diesel(sql_type = Integer)]
    pub dep2: i32,
    #[diesel(sql_type = Integer)]
    pub arr2: i32,
    #[diesel(sql_type = Text)]
    pub trip1_uuid: String,
    #[diesel(sql_type = Text)]
    pub trip1_code: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub trip1_headsign: Option<String>,
    #[diesel(sql_type = Text)]
    pub route1_uuid: String,
    #[diesel(sql_type = Text)]
    pub route1_code: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub route1_short_name: Option<String>,
    #[diesel(sql_type = Text)]
    pub route1_long_name: String,
    #[diesel(sql_type = Integer)]
    pub route1_type: i32,
    #[diesel(sql_type = Text)]
    pub route1_color: String,
    #[diesel(sql_type = Text)]
    pub route1_text_color: String,
    #[diesel(sql_type = Text)]
    pub trip2_uuid: String,
    #[diesel(sql_type = Text)]
    pub trip2_code: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub trip2_headsign: Option<String>,
    #[diesel(sql_type = Text)]
    pub route2_uuid: String,
    #[diesel(sql_type = Text)]
    pub route2_code: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub route2_short_name: Option<String>,
    #[diesel(sql_type = Text)]
    pub route2_long_name: String,
    #[diesel(sql_type = Integer)]
    pub route2_type: i32,
    #[diesel(sql_type = Text)]
    pub route2_color: String,
    #[diesel(sql_type = Text)]
    pub route2_text_color: String,
    #[diesel(sql_type = Text)]
    pub from_uuid: String,
    #[diesel(sql_type = Text)]
    pub from_code: String,
    #[diesel(sql_type = Text)]
    pub from_name: String,
    #[diesel(sql_type = Double)]
    pub from_lat: f64,
    #[diesel(sql_type = Double)]
    pub from_lon: f64,
    #[diesel(sql_type = Text)]
    pub xfer_uuid: String,
    #[diesel(sql_type = Text)]
    pub xfer_code: String,
    #[diesel(sql_type = Text)]
    pub xfer_name: String,
    #[diesel(sql_type = Double)]
    pub xfer_lat: f64,
    #[diesel(sql_type = Double)]
    pub xfer_lon: f64,
    #[diesel(sql_type = Text)]
    pub dest_uuid: String,
    #[diesel(sql_type = Text)]
    pub dest_code: String,
    #[diesel(sql_type = Text)]
    pub dest_name: String,
    #[diesel(sql_type = Double)]
    pub dest_lat: f64,
    #[diesel(sql_type = Double)]
    pub dest_lon: f64,
}

/// Seconds into the service day for a wall-clock departure.
pub fn seconds_of_day(at: NaiveDateTime) -> i32 {
    (at.hour() * 3600 + at.minute() * 60 + at.second()) as i32
}

/// Rebuilds a wall-clock from a service-day offset. Offsets beyond 24 h
/// land on the following day.
pub fn service_day_time(midnight: NaiveDateTime, offset_secs: i32) -> NaiveDateTime {
    midnight + Duration::seconds(offset_secs as i64)
}

pub fn direct_journey(row: &DirectRow, midnight: NaiveDateTime) -> Journey {
    let departure_time = service_day_time(midnight, row.dep_secs);
    let arrival_time = service_day_time(midnight, row.arr_secs);

    let route = RouteSummary {
        id: row.route_uuid.clone(),
        route_id: row.route_code.clone(),
        short_name: row.short_name.clone(),
        long_name: row.long_name.clone(),
        route_type: row.route_type,
        color: row.color.clone(),
        text_color: row.text_color.clone(),
    };

    Journey {
        legs: vec![JourneyLeg {
            route: route.clone(),
            from_stop: StopSummary {
                id: row.from_uuid.clone(),
                stop_id: row.from_code.clone(),
                name: row.from_name.clone(),
                lat: row.from_lat,
                lon: row.from_lon,
            },
            to_stop: StopSummary {
                id: row.to_uuid.clone(),
                stop_id: row.to_code.clone(),
                name: row.to_name.clone(),
                lat: row.to_lat,
                lon: row.to_lon,
            },
            departure: LegDeparture {
                trip: TripSummary {
                    id: row.trip_uuid.clone(),
                    trip_id: row.trip_code.clone(),
                    headsign: row.headsign.clone(),
                    route_id: row.route_uuid.clone(),
                },
                scheduled_time: departure_time,
            },
            arrival_time,
        }],
        duration_seconds: (row.arr_secs - row.dep_secs) as i64,
        departure_time,
        arrival_time,
        transfers: 0,
    }
}

pub fn transfer_journey(row: &TransferRow, midnight: NaiveDateTime) -> Journey {
    let departure_time = service_day_time(midnight, row.dep1);
    let arrival_time = service_day_time(midnight, row.arr2);

    let from_stop = StopSummary {
        id: row.from_uuid.clone(),
        stop_id: row.from_code.clone(),
        name: row.from_name.clone(),
        lat: row.from_lat,
        lon: row.from_lon,
    };
    let xfer_stop = StopSummary {
        id: row.xfer_uuid.clone(),
        stop_id: row.xfer_code.clone(),
        name: row.xfer_name.clone(),
        lat: row.xfer_lat,
        lon: row.xfer_lon,
    };
    let dest_stop = StopSummary {
        id: row.dest_uuid.clone(),
        stop_id: row.dest_code.clone(),
        name: row.dest_name.clone(),
        lat: row.dest_lat,
        lon: row.dest_lon,
    };

    Journey {
        legs: vec![
            JourneyLeg {
                route: RouteSummary {
                    id: row.route1_uuid.clone(),
                    route_id: row.route1_code.clone(),
                    short_name: row.route1_short_name.clone(),
                    long_name: row.route1_long_name.clone(),
                    route_type: row.route1_type,
                    color: row.route1_color.clone(),
                    text_color: row.route1_text_color.clone(),
                },
                from_stop: from_stop.clone(),
                to_stop: xfer_stop.clone(),
                departure: LegDeparture {
                    trip: TripSummary {
                        id: row.trip1_uuid.clone(),
                        trip_id: row.trip1_code.clone(),
                        headsign: row.trip1_headsign.clone(),
                        route_id: row.route1_uuid.clone(),
                    },
                    scheduled_time: departure_time,
                },
                arrival_time: service_day_time(midnight, row.arr1),
            },
            JourneyLeg {
                route: RouteSummary {
                    id: row.route2_uuid.clone(),
                    route_id: row.route2_code.clone(),
                    short_name: row.route2_short_name.clone(),
                    long_name: row.route2_long_name.clone(),
                    route_type: row.route2_type,
                    color: row.route2_color.clone(),
                    text_color: row.route2_text_color.clone(),
                },
                from_stop: xfer_stop,
                to_stop: dest_stop,
                departure: LegDeparture {
                    trip: TripSummary {
                        id: row.trip2_uuid.clone(),
                        trip_id: row.trip2_code.clone(),
                        headsign: row.trip2_headsign.clone(),
                        route_id: row.route2_uuid.clone(),
                    },
                    scheduled_time: service_day_time(midnight, row.dep2),
                },
                arrival_time,
            },
        ],
        duration_seconds: (row.arr2 - row.dep1) as i64,
        departure_time,
        arrival_time,
        transfers: 1,
    }
}

/// Plans journeys between two stops. Direct trips come first; the
/// one-transfer phase only fills whatever the limit leaves open, and its
/// failure degrades to direct results.
pub async fn plan_journeys(pool: &TransitPool, query: &JourneyQuery) -> Result<Vec<Journey>, Error> {
    if query.from_stop_id.is_empty() || query.to_stop_id.is_empty() {
        return Err(Error::InvalidInput(
            "from and to stop ids are required".to_string(),
        ));
    }
    if query.from_stop_id == query.to_stop_id {
        return Err(Error::InvalidInput(
            "from and to stops must be different".to_string(),
        ));
    }

    let max_transfers = if (0..=2).contains(&query.max_transfers) {
        query.max_transfers
    } else {
        1
    };
    let limit = clamp_limit(query.limit, DEFAULT_LIMIT, MAX_LIMIT);

    let tod = seconds_of_day(query.depart_after);
    let midnight = query.depart_after.date().and_hms_opt(0, 0, 0).unwrap();

    let direct_rows = fetch_direct(pool, &query.from_stop_id, &query.to_stop_id, tod, limit).await?;
    let mut journeys: Vec<Journey> = direct_rows
        .iter()
        .map(|row| direct_journey(row, midnight))
        .collect();

    if max_transfers >= 1 && (journeys.len() as i64) < limit {
        let remaining = limit - journeys.len() as i64;
        match fetch_transfers(pool, &query.from_stop_id, &query.to_stop_id, tod, remaining).await {
            Ok(rows) => {
                journeys.extend(rows.iter().map(|row| transfer_journey(row, midnight)));
            }
            Err(e) => {
                warn!("transfer search failed, returning direct journeys only: {}", e);
            }
        }
    }

    Ok(journeys)
}

async fn fetch_direct(
    pool: &TransitPool,
    from_stop: &str,
    to_stop: &str,
    tod: i32,
    limit: i64,
) -> Result<Vec<DirectRow>, Error> {
    let conn = &mut pool.get().await?;

    let rows = diesel::sql_query(
        "SELECT st_from.departure_time AS dep_secs, \
                st_to.arrival_time AS arr_secs, \
                t.id AS trip_uuid, t.trip_id AS trip_code, t.headsign, t.direction_id, \
                r.id AS route_uuid, r.route_id AS route_code, r.short_name, r.long_name, \
                r.route_type, r.color, r.text_color, \
                fs.id AS from_uuid, fs.stop_id AS from_code, fs.name AS from_name, \
                ST_Y(fs.location) AS from_lat, ST_X(fs.location) AS from_lon, \
                ts.id AS to_uuid, ts.stop_id AS to_code, ts.name AS to_name, \
                ST_Y(ts.location) AS to_lat, ST_X(ts.location) AS to_lon \
         FROM stop_times st_from \
         JOIN stop_times st_to ON st_from.trip_id = st_to.trip_id \
         JOIN trips t ON t.id = st_from.trip_id \
         JOIN routes r ON r.id = t.route_id \
         JOIN stops fs ON fs.id = st_from.stop_id \
         JOIN stops ts ON ts.id = st_to.stop_id \
         WHERE st_from.stop_id = $1 \
           AND st_to.stop_id = $2 \
           AND st_from.stop_sequence < st_to.stop_sequence \
           AND st_from.departure_time >= $3 \
         ORDER BY st_from.departure_time \
         LIMIT $4",
    )
    .bind::<Text, _>(from_stop)
    .bind::<Text, _>(to_stop)
    .bind::<Integer, _>(tod)
    .bind::<BigInt, _>(limit)
    .load::<DirectRow>(conn)
    .await?;

    Ok(rows)
}

async fn fetch_transfers(
    pool: &TransitPool,
    from_stop: &str,
    to_stop: &str,
    tod: i32,
    limit: i64,
) -> Result<Vec<TransferRow>, Error> {
    let conn = &mut pool.get().await?;

    let rows = diesel::sql_query(
        "WITH leg1 AS ( \
             SELECT st1_from.stop_id AS from_stop, st1_to.stop_id AS transfer_stop, \
                    st1_from.departure_time AS dep1, st1_to.arrival_time AS arr1, \
                    st1_from.trip_id AS trip1_id \
             FROM stop_times st1_from \
             JOIN stop_times st1_to ON st1_from.trip_id = st1_to.trip_id \
                 AND st1_from.stop_sequence < st1_to.stop_sequence \
             WHERE st1_from.stop_id = $1 \
               AND st1_from.departure_time >= $3 \
         ), \
         leg2 AS ( \
             SELECT st2_from.stop_id AS transfer_stop, st2_to.stop_id AS to_stop, \
                    st2_from.departure_time AS dep2, st2_to.arrival_time AS arr2, \
                    st2_from.trip_id AS trip2_id \
             FROM stop_times st2_from \
             JOIN stop_times st2_to ON st2_from.trip_id = st2_to.trip_id \
                 AND st2_from.stop_sequence < st2_to.stop_sequence \
             WHERE st2_to.stop_id = $2 \
         ) \
         SELECT l1.dep1 AS dep1, l1.arr1 AS arr1, l2.dep2 AS dep2, l2.arr2 AS arr2, \
                t1.id AS trip1_uuid, t1.trip_id AS trip1_code, t1.headsign AS trip1_headsign, \
                r1.id AS route1_uuid, r1.route_id AS route1_code, r1.short_name AS route1_short_name, \
                r1.long_name AS route1_long_name, r1.route_type AS route1_type, \
                r1.color AS route1_color, r1.text_color AS route1_text_color, \
                t2.id AS trip2_uuid, t2.trip_id AS trip2_code, t2.headsign AS trip2_headsign, \
                r2.id AS route2_uuid, r2.route_id AS route2_code, r2.short_name AS route2_short_name, \
                r2.long_name AS route2_long_name, r2.route_type AS route2_type, \
                r2.color AS route2_color, r2.text_color AS route2_text_color, \
                fs.id AS from_uuid, fs.stop_id AS from_code, fs.name AS from_name, \
                ST_Y(fs.location) AS from_lat, ST_X(fs.location) AS from_lon, \
                xs.id AS xfer_uuid, xs.stop_id AS xfer_code, xs.name AS xfer_name, \
                ST_Y(xs.location) AS xfer_lat, ST_X(xs.location) AS xfer_lon, \
                ds.id AS dest_uuid, ds.stop_id AS dest_code, ds.name AS dest_name, \
                ST_Y(ds.location) AS dest_lat, ST_X(ds.location) AS dest_lon \
         FROM leg1 l1 \
         JOIN leg2 l2 ON l1.transfer_stop = l2.transfer_stop \
             AND l2.dep2 >= l1.arr1 + $5 \
             AND l2.dep2 <= l1.arr1 + $6 \
         JOIN trips t1 ON t1.id = l1.trip1_id \
         JOIN routes r1 ON r1.id = t1.route_id \
         JOIN trips t2 ON t2.id = l2.trip2_id \
         JOIN routes r2 ON r2.id = t2.route_id \
         JOIN stops fs ON fs.id = l1.from_stop \
         JOIN stops xs ON xs.id = l1.transfer_stop \
         JOIN stops ds ON ds.id = l2.to_stop \
         WHERE r1.id != r2.id \
         ORDER BY (l2.arr2 - l1.dep1), l1.dep1 \
         LIMIT $4",
    )
    .bind::<Text, _>(from_stop)
    .bind::<Text, _>(to_stop)
    .bind::<Integer, _>(tod)
    .bind::<BigInt, _>(limit)
    .bind::<Integer, _>(MIN_TRANSFER_SECS)
    .bind::<Integer, _>(MAX_TRANSFER_SECS)
    .load::<TransferRow>(conn)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn midnight() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn direct_row(dep: i32, arr: i32) -> DirectRow {
        DirectRow {
            dep_secs: dep,
            arr_secs: arr,
            trip_uuid: "t-uuid".to_string(),
            trip_code: "T1".to_string(),
            headsign: Some("Plentzia".to_string()),
            direction_id: 0,
            route_uuid: "r-uuid".to_string(),
            route_code: "R1".to_string(),
            short_name: Some("L1".to_string()),
            long_name: "Line 1".to_string(),
            route_type: 1,
            color: "000000".to_string(),
            text_color: "FFFFFF".to_string(),
            from_uuid: "s1-uuid".to_string(),
            from_code: "S1".to_string(),
            from_name: "Abando".to_string(),
            from_lat: 43.263,
            from_lon: -2.935,
            to_uuid: "s2-uuid".to_string(),
            to_code: "S2".to_string(),
            to_name: "San Mames".to_string(),
            to_lat: 43.270,
            to_lon: -2.940,
        }
    }

    fn transfer_row(dep1: i32, arr1: i32, dep2: i32, arr2: i32) -> TransferRow {
        TransferRow {
            dep1,
            arr1,
            dep2,
            arr2,
            trip1_uuid: "t1-uuid".to_string(),
            trip1_code: "T_A".to_string(),
            trip1_headsign: None,
            route1_uuid: "ra-uuid".to_string(),
            route1_code: "Ra".to_string(),
            route1_short_name: None,
            route1_long_name: "Route A".to_string(),
            route1_type: 3,
            route1_color: "000000".to_string(),
            route1_text_color: "FFFFFF".to_string(),
            trip2_uuid: "t2-uuid".to_string(),
            trip2_code: "T_B".to_string(),
            trip2_headsign: None,
            route2_uuid: "rb-uuid".to_string(),
            route2_code: "Rb".to_string(),
            route2_short_name: None,
            route2_long_name: "Route B".to_string(),
            route2_type: 3,
            route2_color: "000000".to_string(),
            route2_text_color: "FFFFFF".to_string(),
            from_uuid: "s1-uuid".to_string(),
            from_code: "S1".to_string(),
            from_name: "Abando".to_string(),
            from_lat: 43.263,
            from_lon: -2.935,
            xfer_uuid: "x-uuid".to_string(),
            xfer_code: "X".to_string(),
            xfer_name: "Moyua".to_string(),
            xfer_lat: 43.266,
            xfer_lon: -2.938,
            dest_uuid: "s2-uuid".to_string(),
            dest_code: "S2".to_string(),
            dest_name: "San Mames".to_string(),
            dest_lat: 43.270,
            dest_lon: -2.940,
        }
    }

    #[test]
    fn test_seconds_of_day() {
        let at = NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(7, 30, 15)
            .unwrap();
        assert_eq!(seconds_of_day(at), 7 * 3600 + 30 * 60 + 15);
    }

    #[test]
    fn test_direct_journey_assembly() {
        // 08:00 -> 08:05
        let journey = direct_journey(&direct_row(8 * 3600, 8 * 3600 + 300), midnight());

        assert_eq!(journey.transfers, 0);
        assert_eq!(journey.legs.len(), 1);
        assert_eq!(journey.duration_seconds, 300);
        assert_eq!(
            journey.departure_time,
            midnight().date().and_hms_opt(8, 0, 0).unwrap()
        );
        assert_eq!(
            journey.arrival_time,
            midnight().date().and_hms_opt(8, 5, 0).unwrap()
        );
        assert!(journey.arrival_time > journey.departure_time);
        assert_eq!(journey.legs[0].departure.scheduled_time, journey.departure_time);
    }

    #[test]
    fn test_overnight_offset_rolls_to_next_day() {
        // departure at 24:30 lands at 00:30 the next day
        let journey = direct_journey(&direct_row(24 * 3600 + 1800, 24 * 3600 + 2100), midnight());

        let next_day = midnight().date().succ_opt().unwrap();
        assert_eq!(
            journey.departure_time,
            next_day.and_hms_opt(0, 30, 0).unwrap()
        );
        assert_eq!(
            journey.arrival_time,
            next_day.and_hms_opt(0, 35, 0).unwrap()
        );
    }

    #[test]
    fn test_transfer_journey_assembly() {
        // S1 08:00 -> X 08:10, X 08:15 -> S2 08:25
        let journey = transfer_journey(
            &transfer_row(8 * 3600, 8 * 3600 + 600, 8 * 3600 + 900, 8 * 3600 + 1500),
            midnight(),
        );

        assert_eq!(journey.transfers, 1);
        assert_eq!(journey.legs.len(), 2);
        assert_eq!(journey.duration_seconds, 1500);

        // legs are time-monotonic and the wait sits inside the window
        let leg1 = &journey.legs[0];
        let leg2 = &journey.legs[1];
        assert!(leg1.arrival_time <= leg2.departure.scheduled_time);
        let wait = leg2.departure.scheduled_time - leg1.arrival_time;
        assert!(wait.num_seconds() >= MIN_TRANSFER_SECS as i64);
        assert!(wait.num_seconds() <= MAX_TRANSFER_SECS as i64);

        // the two legs ride different routes
        assert_ne!(leg1.route.id, leg2.route.id);
        assert_eq!(leg1.to_stop.id, leg2.from_stop.id);
    }
}
