pub mod messages;

use crate::error::Error;
use async_nats::jetstream;
use async_nats::jetstream::consumer::AckPolicy;
use async_nats::jetstream::consumer::pull::Config as PullConfig;
use async_nats::jetstream::stream::{Config as StreamConfig, RetentionPolicy, StorageType};
use futures::StreamExt;
use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

pub const VEHICLE_STREAM: &str = "VEHICLE_POSITIONS";
pub const ALERT_STREAM: &str = "TRANSIT_ALERTS";
pub const DELAY_STREAM: &str = "TRANSIT_DELAYS";

pub const VEHICLE_SUBJECTS: &str = "transit.vehicle.>";
pub const ALERT_SUBJECTS: &str = "transit.alerts.>";
pub const DELAY_SUBJECTS: &str = "transit.delay.>";

/// Detected delays go out on a plain subject, not a durable stream.
pub const DELAYS_DETECTED_SUBJECT: &str = "transit.delays.detected";
pub const DETOUR_SUBJECT: &str = "transit.alerts.detour";

const MAX_DELIVER: i64 = 3;

/// Publisher over the three durable streams. The underlying client
/// reconnects on its own with unlimited retries.
pub struct Publisher {
    client: async_nats::Client,
    jetstream: jetstream::Context,
}

impl Publisher {
    pub async fn connect(url: &str) -> Result<Publisher, Error> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| Error::Bus(e.to_string()))?;
        let jetstream = jetstream::new(client.clone());

        ensure_streams(&jetstream).await?;

        Ok(Publisher { client, jetstream })
    }

    /// Durable publish of a vehicle position copy, keyed per vehicle so
    /// per-subject ordering holds.
    pub async fn publish_vehicle_position(
        &self,
        agency_slug: &str,
        msg: &messages::VehiclePositionMessage,
    ) -> Result<(), Error> {
        let subject = format!("transit.vehicle.{}.{}", agency_slug, msg.vehicle_id);
        self.publish_json(subject, msg).await
    }

    /// Fire-and-forget detection notice. Consumers must tolerate
    /// duplicates; the vehicle-positions table is the system of record.
    pub async fn publish_delay_detected(
        &self,
        msg: &messages::DelayDetected,
    ) -> Result<(), Error> {
        let payload = serde_json::to_vec(msg).map_err(|e| Error::Bus(e.to_string()))?;
        self.client
            .publish(DELAYS_DETECTED_SUBJECT, payload.into())
            .await
            .map_err(|e| Error::Bus(e.to_string()))
    }

    /// Enqueues a compensation workflow invocation on the delay work queue.
    pub async fn publish_compensation_request(
        &self,
        msg: &messages::CompensationRequest,
    ) -> Result<(), Error> {
        let subject = format!("transit.delay.{}", msg.delay_event_id);
        self.publish_json(subject, msg).await
    }

    pub async fn publish_alert(
        &self,
        agency_slug: &str,
        msg: &messages::AlertMessage,
    ) -> Result<(), Error> {
        let subject = format!("transit.alerts.{}", agency_slug);
        self.publish_json(subject, msg).await
    }

    /// Detour notices carry just the trip id, on a fixed alert subject.
    pub async fn publish_detour(&self, trip_id: &str) -> Result<(), Error> {
        // fire-and-forget: the server ack is not awaited
        let _ack = self
            .jetstream
            .publish(DETOUR_SUBJECT.to_string(), trip_id.as_bytes().to_vec().into())
            .await
            .map_err(|e| Error::Bus(e.to_string()))?;
        Ok(())
    }

    async fn publish_json<T: Serialize>(&self, subject: String, msg: &T) -> Result<(), Error> {
        let payload = serde_json::to_vec(msg).map_err(|e| Error::Bus(e.to_string()))?;
        let _ack = self
            .jetstream
            .publish(subject, payload.into())
            .await
            .map_err(|e| Error::Bus(e.to_string()))?;
        Ok(())
    }
}

/// Subscriber side: named durable consumers with manual acknowledgment
/// and a 3-delivery cap. After the cap the message is dropped.
pub struct Subscriber {
    jetstream: jetstream::Context,
}

impl Subscriber {
    pub async fn connect(url: &str) -> Result<Subscriber, Error> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| Error::Bus(e.to_string()))?;
        let jetstream = jetstream::new(client);

        ensure_streams(&jetstream).await?;

        Ok(Subscriber { jetstream })
    }

    pub async fn run_vehicle_positions<F, Fut>(&self, handler: F) -> Result<(), Error>
    where
        F: Fn(messages::VehiclePositionMessage) -> Fut,
        Fut: Future<Output = Result<(), Error>>,
    {
        self.run_consumer(VEHICLE_STREAM, "vehicle-processor", VEHICLE_SUBJECTS, handler)
            .await
    }

    pub async fn run_delay_requests<F, Fut>(&self, handler: F) -> Result<(), Error>
    where
        F: Fn(messages::CompensationRequest) -> Fut,
        Fut: Future<Output = Result<(), Error>>,
    {
        self.run_consumer(DELAY_STREAM, "delay-processor", DELAY_SUBJECTS, handler)
            .await
    }

    pub async fn run_detour_alerts<F, Fut>(&self, handler: F) -> Result<(), Error>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<(), Error>>,
    {
        let stream = self
            .jetstream
            .get_stream(ALERT_STREAM)
            .await
            .map_err(|e| Error::Bus(e.to_string()))?;

        let consumer = stream
            .get_or_create_consumer(
                "detour-processor",
                PullConfig {
                    durable_name: Some("detour-processor".to_string()),
                    ack_policy: AckPolicy::Explicit,
                    max_deliver: MAX_DELIVER,
                    filter_subject: DETOUR_SUBJECT.to_string(),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| Error::Bus(e.to_string()))?;

        let mut deliveries = consumer
            .messages()
            .await
            .map_err(|e| Error::Bus(e.to_string()))?;

        while let Some(delivery) = deliveries.next().await {
            let message = match delivery {
                Ok(message) => message,
                Err(e) => {
                    warn!("detour-processor delivery error: {}", e);
                    continue;
                }
            };

            let trip_id = String::from_utf8_lossy(&message.payload).to_string();
            match handler(trip_id).await {
                Ok(()) => {
                    let _ = message.ack().await;
                }
                Err(e) => {
                    warn!("detour handler failed, requesting redelivery: {}", e);
                    let _ = message
                        .ack_with(jetstream::AckKind::Nak(None))
                        .await;
                }
            }
        }

        Ok(())
    }

    /// Generic durable-consumer loop: ack on success, nak on decode or
    /// handler failure so the bus redelivers up to the cap.
    async fn run_consumer<T, F, Fut>(
        &self,
        stream_name: &str,
        consumer_name: &str,
        filter_subject: &str,
        handler: F,
    ) -> Result<(), Error>
    where
        T: DeserializeOwned,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<(), Error>>,
    {
        let stream = self
            .jetstream
            .get_stream(stream_name)
            .await
            .map_err(|e| Error::Bus(e.to_string()))?;

        let consumer = stream
            .get_or_create_consumer(
                consumer_name,
                PullConfig {
                    durable_name: Some(consumer_name.to_string()),
                    ack_policy: AckPolicy::Explicit,
                    max_deliver: MAX_DELIVER,
                    filter_subject: filter_subject.to_string(),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| Error::Bus(e.to_string()))?;

        info!("consumer {} attached to {}", consumer_name, stream_name);

        let mut deliveries = consumer
            .messages()
            .await
            .map_err(|e| Error::Bus(e.to_string()))?;

        while let Some(delivery) = deliveries.next().await {
            let message = match delivery {
                Ok(message) => message,
                Err(e) => {
                    warn!("{} delivery error: {}", consumer_name, e);
                    continue;
                }
            };

            let decoded: Result<T, _> = serde_json::from_slice(&message.payload);
            match decoded {
                Ok(value) => match handler(value).await {
                    Ok(()) => {
                        let _ = message.ack().await;
                    }
                    Err(e) => {
                        warn!("{} handler failed, requesting redelivery: {}", consumer_name, e);
                        let _ = message
                            .ack_with(jetstream::AckKind::Nak(None))
                            .await;
                    }
                },
                Err(e) => {
                    warn!("{} decode failed, requesting redelivery: {}", consumer_name, e);
                    let _ = message
                        .ack_with(jetstream::AckKind::Nak(None))
                        .await;
                }
            }
        }

        Ok(())
    }
}

async fn ensure_streams(jetstream: &jetstream::Context) -> Result<(), Error> {
    let streams = [
        StreamConfig {
            name: VEHICLE_STREAM.to_string(),
            subjects: vec![VEHICLE_SUBJECTS.to_string()],
            retention: RetentionPolicy::WorkQueue,
            max_age: Duration::from_secs(60 * 60),
            storage: StorageType::File,
            ..Default::default()
        },
        StreamConfig {
            name: ALERT_STREAM.to_string(),
            subjects: vec![ALERT_SUBJECTS.to_string()],
            retention: RetentionPolicy::Interest,
            max_age: Duration::from_secs(24 * 60 * 60),
            storage: StorageType::File,
            ..Default::default()
        },
        StreamConfig {
            name: DELAY_STREAM.to_string(),
            subjects: vec![DELAY_SUBJECTS.to_string()],
            retention: RetentionPolicy::WorkQueue,
            max_age: Duration::from_secs(24 * 60 * 60),
            storage: StorageType::File,
            ..Default::default()
        },
    ];

    for config in streams {
        jetstream
            .get_or_create_stream(config)
            .await
            .map_err(|e| Error::Bus(e.to_string()))?;
    }

    Ok(())
}
