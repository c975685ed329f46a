use chrono::{DateTime, Utc};
use diesel::prelude::*;
use postgis_diesel::types::{LineString, Point};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Queryable, Selectable, Clone, Debug, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::agencies)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Agency {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub url: Option<String>,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::agencies)]
pub struct NewAgency {
    pub slug: String,
    pub name: String,
    pub url: Option<String>,
    pub timezone: String,
}

#[derive(Queryable, Selectable, QueryableByName, Clone, Debug)]
#[diesel(table_name = crate::schema::stops)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Stop {
    pub id: String,
    pub stop_id: String,
    pub agency_id: String,
    pub name: String,
    pub location: Point,
    pub platform_code: Option<String>,
    pub wheelchair_accessible: bool,
    pub metadata: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::stops)]
pub struct NewStop {
    pub stop_id: String,
    pub agency_id: String,
    pub name: String,
    pub location: Point,
    pub platform_code: Option<String>,
    pub wheelchair_accessible: bool,
    pub metadata: Option<Value>,
}

#[derive(Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = crate::schema::routes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Route {
    pub id: String,
    pub route_id: String,
    pub agency_id: String,
    pub short_name: Option<String>,
    pub long_name: String,
    pub route_type: i32,
    pub color: String,
    pub text_color: String,
    pub shape: Option<LineString<Point>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::routes)]
pub struct NewRoute {
    pub route_id: String,
    pub agency_id: String,
    pub short_name: Option<String>,
    pub long_name: String,
    pub route_type: i32,
    pub color: String,
    pub text_color: String,
}

#[derive(Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = crate::schema::trips)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Trip {
    pub id: String,
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: Option<String>,
    pub direction_id: i16,
    pub shape_id: Option<String>,
    pub wheelchair_accessible: bool,
    pub bikes_allowed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::trips)]
pub struct NewTrip {
    pub trip_id: String,
    pub route_id: String,
    pub service_id: String,
    pub headsign: Option<String>,
    pub direction_id: i16,
    pub shape_id: Option<String>,
    pub wheelchair_accessible: bool,
    pub bikes_allowed: bool,
}

/// Arrival and departure are seconds since the start of the service day;
/// values past 86400 belong to overnight service.
#[derive(Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = crate::schema::stop_times)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StopTime {
    pub id: String,
    pub trip_id: String,
    pub stop_id: String,
    pub arrival_time: i32,
    pub departure_time: i32,
    pub stop_sequence: i32,
    pub pickup_type: i16,
    pub drop_off_type: i16,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::stop_times)]
pub struct NewStopTime {
    pub trip_id: String,
    pub stop_id: String,
    pub arrival_time: i32,
    pub departure_time: i32,
    pub stop_sequence: i32,
    pub pickup_type: i16,
    pub drop_off_type: i16,
}

#[derive(Queryable, Selectable, Insertable, QueryableByName, Clone, Debug)]
#[diesel(table_name = crate::schema::vehicle_positions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VehiclePositionRow {
    pub time: DateTime<Utc>,
    pub vehicle_id: String,
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub location: Point,
    pub bearing: f64,
    pub speed: f64,
    pub congestion_level: i32,
    pub occupancy_status: i32,
    pub metadata: Option<Value>,
}

#[derive(Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = crate::schema::delay_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DelayEvent {
    pub id: String,
    pub time: DateTime<Utc>,
    pub trip_id: Option<String>,
    pub stop_id: Option<String>,
    pub scheduled_arrival: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub delay_seconds: i32,
    pub is_compensated: bool,
    pub compensation_sent_at: Option<DateTime<Utc>>,
    pub metadata: Option<Value>,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::delay_events)]
pub struct NewDelayEvent {
    pub time: DateTime<Utc>,
    pub trip_id: Option<String>,
    pub stop_id: Option<String>,
    pub scheduled_arrival: Option<DateTime<Utc>>,
    pub actual_arrival: Option<DateTime<Utc>>,
    pub delay_seconds: i32,
    pub metadata: Option<Value>,
}

#[derive(Queryable, Selectable, QueryableByName, Clone, Debug)]
#[diesel(table_name = crate::schema::affiliates)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Affiliate {
    pub id: String,
    pub name: String,
    pub category: String,
    pub location: Point,
    pub address: Option<String>,
    pub offer_text: String,
    pub offer_value: f64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Clone, Debug)]
#[diesel(table_name = crate::schema::compensations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Compensation {
    pub id: String,
    pub user_id: String,
    pub delay_event_id: String,
    pub affiliate_id: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub redeemed_at: Option<DateTime<Utc>>,
    pub metadata: Option<Value>,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name = crate::schema::compensations)]
pub struct NewCompensation {
    pub user_id: String,
    pub delay_event_id: String,
    pub affiliate_id: String,
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub metadata: Option<Value>,
}
