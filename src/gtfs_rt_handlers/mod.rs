pub mod transform;

pub use gtfs_realtime::FeedMessage;

pub fn parse_protobuf_message(
    bytes: &[u8],
) -> Result<FeedMessage, Box<dyn std::error::Error + Sync + Send>> {
    match prost::Message::decode(bytes) {
        Ok(x) => Ok(x),
        Err(x) => Err(Box::new(x)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtfs_realtime::*;
    use prost::Message;

    fn header() -> FeedHeader {
        FeedHeader {
            gtfs_realtime_version: "2.0".to_string(),
            timestamp: Some(1_700_000_000),
            ..Default::default()
        }
    }

    #[test]
    fn test_roundtrip_vehicle_entity() {
        let feed = FeedMessage {
            header: header(),
            entity: vec![FeedEntity {
                id: "veh-1".to_string(),
                vehicle: Some(VehiclePosition {
                    trip: Some(TripDescriptor {
                        trip_id: Some("T1".to_string()),
                        route_id: Some("R1".to_string()),
                        ..Default::default()
                    }),
                    position: Some(Position {
                        latitude: 43.263,
                        longitude: -2.935,
                        bearing: Some(90.0),
                        speed: Some(7.5),
                        ..Default::default()
                    }),
                    timestamp: Some(1_700_000_123),
                    vehicle: Some(VehicleDescriptor {
                        id: Some("bus-42".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }],
        };

        let bytes = feed.encode_to_vec();
        let decoded = parse_protobuf_message(&bytes).unwrap();

        assert_eq!(decoded.entity.len(), 1);
        let vp = decoded.entity[0].vehicle.as_ref().unwrap();
        let pos = vp.position.as_ref().unwrap();
        assert_eq!(pos.latitude, 43.263);
        assert_eq!(pos.longitude, -2.935);
        assert_eq!(vp.timestamp, Some(1_700_000_123));
        assert_eq!(
            vp.vehicle.as_ref().unwrap().id.as_deref(),
            Some("bus-42")
        );
    }

    #[test]
    fn test_roundtrip_trip_update_delays() {
        let feed = FeedMessage {
            header: header(),
            entity: vec![FeedEntity {
                id: "tu-1".to_string(),
                trip_update: Some(TripUpdate {
                    trip: TripDescriptor {
                        trip_id: Some("T1".to_string()),
                        route_id: Some("R1".to_string()),
                        ..Default::default()
                    },
                    stop_time_update: vec![trip_update::StopTimeUpdate {
                        stop_sequence: Some(2),
                        stop_id: Some("S2".to_string()),
                        arrival: Some(trip_update::StopTimeEvent {
                            delay: Some(240),
                            ..Default::default()
                        }),
                        ..Default::default()
                    }],
                    delay: Some(60),
                    ..Default::default()
                }),
                ..Default::default()
            }],
        };

        let decoded = parse_protobuf_message(&feed.encode_to_vec()).unwrap();
        let tu = decoded.entity[0].trip_update.as_ref().unwrap();
        assert_eq!(tu.delay, Some(60));
        assert_eq!(
            tu.stop_time_update[0].arrival.as_ref().unwrap().delay,
            Some(240)
        );
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(parse_protobuf_message(&[0xff, 0xff, 0xff, 0x01]).is_err());
    }
}
