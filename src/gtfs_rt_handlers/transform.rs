//! Pure transforms from GTFS-RT feed entities to the internal schema.

use crate::bus::messages::{AlertMessage, DelayDetected};
use crate::store::vehicles::VehicleReading;
use chrono::{DateTime, TimeZone, Utc};
use gtfs_realtime::alert::{Cause, Effect};
use gtfs_realtime::{Alert, FeedEntity, TranslatedString, TripUpdate, VehicleDescriptor, trip_update};

/// Delays above this many seconds are significant and published.
pub const SIGNIFICANT_DELAY_SECS: i32 = 180;

/// Vehicle identity: descriptor id, then label, then the entity id.
pub fn choose_vehicle_id(vehicle: Option<&VehicleDescriptor>, entity_id: &str) -> String {
    if let Some(descriptor) = vehicle {
        if let Some(id) = descriptor.id.as_deref() {
            if !id.is_empty() {
                return id.to_string();
            }
        }
        if let Some(label) = descriptor.label.as_deref() {
            if !label.is_empty() {
                return label.to_string();
            }
        }
    }
    entity_id.to_string()
}

/// Per-stop delay: arrival delay, else departure delay, else the
/// trip-level delay (zero when absent).
pub fn stop_delay_seconds(update: &trip_update::StopTimeUpdate, trip_delay: Option<i32>) -> i32 {
    if let Some(arrival) = &update.arrival {
        if let Some(delay) = arrival.delay {
            return delay;
        }
    }
    if let Some(departure) = &update.departure {
        if let Some(delay) = departure.delay {
            return delay;
        }
    }
    trip_delay.unwrap_or(0)
}

/// Builds a storable reading from a vehicle entity. Entities without a
/// position are skipped; a missing timestamp falls back to `now`.
pub fn vehicle_reading(
    entity: &FeedEntity,
    agency_slug: &str,
    now: DateTime<Utc>,
) -> Option<VehicleReading> {
    let vp = entity.vehicle.as_ref()?;
    let position = vp.position.as_ref()?;

    let time = vp
        .timestamp
        .and_then(|ts| Utc.timestamp_opt(ts as i64, 0).single())
        .unwrap_or(now);

    let trip = vp.trip.as_ref();

    Some(VehicleReading {
        time,
        vehicle_id: choose_vehicle_id(vp.vehicle.as_ref(), &entity.id),
        trip_external_id: trip.and_then(|t| t.trip_id.clone()).filter(|s| !s.is_empty()),
        route_external_id: trip.and_then(|t| t.route_id.clone()).filter(|s| !s.is_empty()),
        lat: position.latitude as f64,
        lon: position.longitude as f64,
        bearing: position.bearing.unwrap_or(0.0) as f64,
        speed: position.speed.unwrap_or(0.0) as f64,
        congestion_level: vp.congestion_level.unwrap_or(0),
        occupancy_status: vp.occupancy_status.unwrap_or(0),
        metadata: Some(serde_json::json!({ "agency": agency_slug })),
    })
}

/// The per-vehicle JSON copy published alongside the stored reading. It
/// carries the feed's external trip/route ids, not the resolved ones.
pub fn position_message(reading: &VehicleReading) -> crate::bus::messages::VehiclePositionMessage {
    crate::bus::messages::VehiclePositionMessage {
        time: reading.time,
        vehicle_id: reading.vehicle_id.clone(),
        trip_id: reading.trip_external_id.clone(),
        route_id: reading.route_external_id.clone(),
        location: crate::bus::messages::GeoPoint {
            lat: reading.lat,
            lon: reading.lon,
        },
        bearing: reading.bearing,
        speed: reading.speed,
        congestion_level: reading.congestion_level,
        occupancy_status: reading.occupancy_status,
        metadata: reading.metadata.clone(),
    }
}

/// Significant per-stop delays in one trip update.
pub fn detect_delays(update: &TripUpdate, agency_slug: &str) -> Vec<DelayDetected> {
    let trip_id = update.trip.trip_id.clone().unwrap_or_default();
    let route_id = update.trip.route_id.clone().unwrap_or_default();

    update
        .stop_time_update
        .iter()
        .filter_map(|stu| {
            let delay = stop_delay_seconds(stu, update.delay);
            if delay > SIGNIFICANT_DELAY_SECS {
                Some(DelayDetected {
                    agency: agency_slug.to_string(),
                    trip_id: trip_id.clone(),
                    stop_id: stu.stop_id.clone().unwrap_or_default(),
                    delay_sec: delay,
                    route_id: route_id.clone(),
                })
            } else {
                None
            }
        })
        .collect()
}

pub fn first_translation(text: Option<&TranslatedString>) -> String {
    text.and_then(|ts| ts.translation.first())
        .map(|t| t.text.clone())
        .unwrap_or_default()
}

/// Builds a publishable alert. Alerts with neither header nor description
/// carry nothing and are dropped.
pub fn alert_message(alert: &Alert, agency_slug: &str) -> Option<AlertMessage> {
    let header = first_translation(alert.header_text.as_ref());
    let description = first_translation(alert.description_text.as_ref());

    if header.is_empty() && description.is_empty() {
        return None;
    }

    let mut route_ids = Vec::new();
    let mut stop_ids = Vec::new();
    for informed in &alert.informed_entity {
        if let Some(route_id) = informed.route_id.as_deref() {
            if !route_id.is_empty() {
                route_ids.push(route_id.to_string());
            }
        }
        if let Some(stop_id) = informed.stop_id.as_deref() {
            if !stop_id.is_empty() {
                stop_ids.push(stop_id.to_string());
            }
        }
    }

    let cause = alert
        .cause
        .and_then(|c| Cause::try_from(c).ok())
        .unwrap_or(Cause::UnknownCause);
    let effect = alert
        .effect
        .and_then(|e| Effect::try_from(e).ok())
        .unwrap_or(Effect::UnknownEffect);

    Some(AlertMessage {
        agency: agency_slug.to_string(),
        header,
        description,
        cause: cause.as_str_name().to_string(),
        effect: effect.as_str_name().to_string(),
        route_ids,
        stop_ids,
    })
}

/// Trip ids detoured by this alert, for the detour fan-out subject.
pub fn detoured_trip_ids(alert: &Alert) -> Vec<String> {
    if alert.effect != Some(Effect::Detour as i32) {
        return vec![];
    }

    alert
        .informed_entity
        .iter()
        .filter_map(|informed| informed.trip.as_ref())
        .filter_map(|trip| trip.trip_id.clone())
        .filter(|id| !id.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs_realtime::*;

    fn stu(
        arrival_delay: Option<i32>,
        departure_delay: Option<i32>,
        stop_id: &str,
    ) -> trip_update::StopTimeUpdate {
        trip_update::StopTimeUpdate {
            arrival: arrival_delay.map(|delay| trip_update::StopTimeEvent {
                delay: Some(delay),
                ..Default::default()
            }),
            departure: departure_delay.map(|delay| trip_update::StopTimeEvent {
                delay: Some(delay),
                ..Default::default()
            }),
            stop_id: Some(stop_id.to_string()),
            ..Default::default()
        }
    }

    fn trip_update_with(updates: Vec<trip_update::StopTimeUpdate>, delay: Option<i32>) -> TripUpdate {
        TripUpdate {
            trip: TripDescriptor {
                trip_id: Some("T1".to_string()),
                route_id: Some("R1".to_string()),
                ..Default::default()
            },
            stop_time_update: updates,
            delay,
            ..Default::default()
        }
    }

    #[test]
    fn test_vehicle_id_prefers_descriptor_id() {
        let descriptor = VehicleDescriptor {
            id: Some("bus-7".to_string()),
            label: Some("Line 7".to_string()),
            ..Default::default()
        };
        assert_eq!(choose_vehicle_id(Some(&descriptor), "entity-1"), "bus-7");
    }

    #[test]
    fn test_vehicle_id_falls_back_to_label_then_entity() {
        let descriptor = VehicleDescriptor {
            id: Some(String::new()),
            label: Some("Line 7".to_string()),
            ..Default::default()
        };
        assert_eq!(choose_vehicle_id(Some(&descriptor), "entity-1"), "Line 7");
        assert_eq!(choose_vehicle_id(None, "entity-1"), "entity-1");
    }

    #[test]
    fn test_stop_delay_prefers_arrival() {
        assert_eq!(stop_delay_seconds(&stu(Some(240), Some(50), "S"), Some(10)), 240);
    }

    #[test]
    fn test_stop_delay_falls_back_to_departure_then_trip() {
        assert_eq!(stop_delay_seconds(&stu(None, Some(50), "S"), Some(10)), 50);
        assert_eq!(stop_delay_seconds(&stu(None, None, "S"), Some(10)), 10);
        assert_eq!(stop_delay_seconds(&stu(None, None, "S"), None), 0);
    }

    #[test]
    fn test_detect_delays_threshold() {
        let update = trip_update_with(
            vec![
                stu(Some(240), None, "S2"),
                stu(Some(180), None, "S3"),
                stu(Some(181), None, "S4"),
            ],
            None,
        );

        let detected = detect_delays(&update, "bilbobus");
        // exactly 180 is not significant
        assert_eq!(detected.len(), 2);
        assert_eq!(detected[0].stop_id, "S2");
        assert_eq!(detected[0].delay_sec, 240);
        assert_eq!(detected[1].stop_id, "S4");
        assert!(detected.iter().all(|d| d.delay_sec > SIGNIFICANT_DELAY_SECS));
    }

    #[test]
    fn test_detect_delays_uses_trip_level_fallback() {
        let update = trip_update_with(vec![stu(None, None, "S2")], Some(300));
        let detected = detect_delays(&update, "bilbobus");
        assert_eq!(detected.len(), 1);
        assert_eq!(detected[0].delay_sec, 300);
        assert_eq!(detected[0].trip_id, "T1");
        assert_eq!(detected[0].route_id, "R1");
    }

    #[test]
    fn test_vehicle_reading_skips_positionless() {
        let entity = FeedEntity {
            id: "e1".to_string(),
            vehicle: Some(VehiclePosition::default()),
            ..Default::default()
        };
        assert!(vehicle_reading(&entity, "bilbobus", Utc::now()).is_none());
    }

    #[test]
    fn test_vehicle_reading_timestamp_fallback() {
        let now = Utc::now();
        let entity = FeedEntity {
            id: "e1".to_string(),
            vehicle: Some(VehiclePosition {
                position: Some(Position {
                    latitude: 43.26,
                    longitude: -2.93,
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let reading = vehicle_reading(&entity, "bilbobus", now).unwrap();
        assert_eq!(reading.time, now);
        assert_eq!(reading.vehicle_id, "e1");
        assert!(reading.trip_external_id.is_none());
        assert_eq!(reading.bearing, 0.0);
    }

    #[test]
    fn test_vehicle_reading_roundtrips_fields() {
        let entity = FeedEntity {
            id: "e1".to_string(),
            vehicle: Some(VehiclePosition {
                trip: Some(TripDescriptor {
                    trip_id: Some("T1".to_string()),
                    route_id: Some("R1".to_string()),
                    ..Default::default()
                }),
                position: Some(Position {
                    latitude: 43.263,
                    longitude: -2.935,
                    bearing: Some(182.5),
                    speed: Some(6.1),
                    ..Default::default()
                }),
                timestamp: Some(1_700_000_000),
                vehicle: Some(VehicleDescriptor {
                    id: Some("bus-42".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };

        let reading = vehicle_reading(&entity, "bilbobus", Utc::now()).unwrap();
        assert_eq!(reading.vehicle_id, "bus-42");
        assert_eq!(reading.time.timestamp(), 1_700_000_000);
        assert!((reading.lat - 43.263).abs() < 1e-4);
        assert!((reading.lon - -2.935).abs() < 1e-4);
        assert!((reading.bearing - 182.5).abs() < 1e-4);
        assert!((reading.speed - 6.1).abs() < 1e-4);
        assert_eq!(reading.trip_external_id.as_deref(), Some("T1"));
        assert_eq!(reading.route_external_id.as_deref(), Some("R1"));
    }

    fn translated(text: &str) -> TranslatedString {
        TranslatedString {
            translation: vec![translated_string::Translation {
                text: text.to_string(),
                language: Some("es".to_string()),
            }],
        }
    }

    #[test]
    fn test_alert_message_first_translation() {
        let alert = Alert {
            informed_entity: vec![
                EntitySelector {
                    route_id: Some("R1".to_string()),
                    ..Default::default()
                },
                EntitySelector {
                    stop_id: Some("S1".to_string()),
                    ..Default::default()
                },
            ],
            cause: Some(alert::Cause::Strike as i32),
            effect: Some(alert::Effect::NoService as i32),
            header_text: Some(translated("Huelga")),
            description_text: Some(translated("Servicio suspendido")),
            ..Default::default()
        };

        let msg = alert_message(&alert, "bilbobus").unwrap();
        assert_eq!(msg.header, "Huelga");
        assert_eq!(msg.description, "Servicio suspendido");
        assert_eq!(msg.cause, "STRIKE");
        assert_eq!(msg.effect, "NO_SERVICE");
        assert_eq!(msg.route_ids, vec!["R1"]);
        assert_eq!(msg.stop_ids, vec!["S1"]);
    }

    #[test]
    fn test_alert_message_drops_empty() {
        let alert = Alert::default();
        assert!(alert_message(&alert, "bilbobus").is_none());
    }

    #[test]
    fn test_detoured_trip_ids() {
        let alert = Alert {
            effect: Some(alert::Effect::Detour as i32),
            informed_entity: vec![EntitySelector {
                trip: Some(TripDescriptor {
                    trip_id: Some("T9".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(detoured_trip_ids(&alert), vec!["T9"]);

        let non_detour = Alert {
            effect: Some(alert::Effect::ReducedService as i32),
            ..Default::default()
        };
        assert!(detoured_trip_ids(&non_detour).is_empty());
    }
}
