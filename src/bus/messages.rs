use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// JSON copy of a stored vehicle position, fanned out per vehicle on
/// `transit.vehicle.<agency-slug>.<vehicle-id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehiclePositionMessage {
    pub time: DateTime<Utc>,
    pub vehicle_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    pub location: GeoPoint,
    pub bearing: f64,
    pub speed: f64,
    pub congestion_level: i32,
    pub occupancy_status: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// A significant delay spotted in a trip-update feed, published to
/// `transit.delays.detected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayDetected {
    pub agency: String,
    pub trip_id: String,
    pub stop_id: String,
    pub delay_sec: i32,
    pub route_id: String,
}

/// Service alert fan-out on `transit.alerts.<agency-slug>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertMessage {
    pub agency: String,
    pub header: String,
    pub description: String,
    pub cause: String,
    pub effect: String,
    pub route_ids: Vec<String>,
    pub stop_ids: Vec<String>,
}

/// Compensation workflow invocation, carried on `transit.delay.>` and
/// consumed by the durable `delay-processor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationRequest {
    pub delay_event_id: String,
    pub user_id: String,
    pub stop_id: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
    pub delay_minutes: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_detected_roundtrip() {
        let msg = DelayDetected {
            agency: "bilbobus".to_string(),
            trip_id: "T1".to_string(),
            stop_id: "S2".to_string(),
            delay_sec: 240,
            route_id: "R1".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: DelayDetected = serde_json::from_str(&json).unwrap();
        assert_eq!(back.delay_sec, 240);
        assert_eq!(back.trip_id, "T1");
    }

    #[test]
    fn test_vehicle_position_omits_unresolved_ids() {
        let msg = VehiclePositionMessage {
            time: Utc::now(),
            vehicle_id: "bus-42".to_string(),
            trip_id: None,
            route_id: None,
            location: GeoPoint { lat: 43.26, lon: -2.93 },
            bearing: 0.0,
            speed: 0.0,
            congestion_level: 0,
            occupancy_status: 0,
            metadata: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("trip_id"));
        assert!(!json.contains("route_id"));
    }

    #[test]
    fn test_compensation_request_roundtrip() {
        let req = CompensationRequest {
            delay_event_id: "D1".to_string(),
            user_id: "U1".to_string(),
            stop_id: "S2".to_string(),
            stop_lat: 43.27,
            stop_lon: -2.94,
            delay_minutes: 4,
        };
        let back: CompensationRequest =
            serde_json::from_slice(&serde_json::to_vec(&req).unwrap()).unwrap();
        assert_eq!(back.delay_event_id, "D1");
        assert_eq!(back.user_id, "U1");
    }
}
