//! Saga orchestrating delay compensation: find an affiliate, issue a
//! coupon, notify the user, and delete the coupon when notification
//! cannot be delivered.

use crate::compensation::{
    AffiliateStore, CompensationService, CompensationStore, PushNotifier, PUSH_TITLE,
};
use crate::error::Error;
use crate::workflow::{RetryPolicy, execute_activity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompensationInput {
    pub delay_event_id: String,
    pub user_id: String,
    pub stop_id: String,
    pub stop_lat: f64,
    pub stop_lon: f64,
    pub delay_minutes: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Start,
    AffiliateFound,
    CouponIssued,
    Notified,
    NotifyFailed,
    CouponDeleted,
    CouponDeleteFailed,
}

#[derive(Debug)]
pub struct WorkflowOutcome {
    pub state: WorkflowState,
    pub code: String,
}

/// The workflow's activities. Every method must tolerate re-execution:
/// the engine retries each step up to its attempt cap.
#[async_trait]
pub trait CompensationActivities: Send + Sync {
    async fn find_nearest_affiliate(&self, lat: f64, lon: f64) -> Result<String, Error>;
    async fn get_affiliate_name(&self, affiliate_id: &str) -> Result<String, Error>;
    async fn generate_coupon_code(
        &self,
        user_id: &str,
        affiliate_id: &str,
        delay_event_id: &str,
    ) -> Result<String, Error>;
    async fn send_push_notification(
        &self,
        user_id: &str,
        affiliate_name: &str,
        code: &str,
    ) -> Result<(), Error>;
    async fn delete_coupon(&self, code: &str) -> Result<(), Error>;
    async fn schedule_expiry(&self, code: &str, expires_at: DateTime<Utc>) -> Result<(), Error>;
}

pub struct CompensationWorkflow {
    activities: Arc<dyn CompensationActivities>,
    policy: RetryPolicy,
}

impl CompensationWorkflow {
    pub fn new(activities: Arc<dyn CompensationActivities>) -> CompensationWorkflow {
        CompensationWorkflow {
            activities,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(
        activities: Arc<dyn CompensationActivities>,
        policy: RetryPolicy,
    ) -> CompensationWorkflow {
        CompensationWorkflow { activities, policy }
    }

    pub async fn run(&self, input: &CompensationInput) -> Result<WorkflowOutcome, Error> {
        info!(
            "compensation workflow for delay event {} ({} min late)",
            input.delay_event_id, input.delay_minutes
        );

        let affiliate_id = execute_activity(&self.policy, "FindNearestAffiliate", || {
            self.activities
                .find_nearest_affiliate(input.stop_lat, input.stop_lon)
        })
        .await?;

        // Name lookup failure is tolerated, the name is cosmetic.
        let affiliate_name = match execute_activity(&self.policy, "GetAffiliateName", || {
            self.activities.get_affiliate_name(&affiliate_id)
        })
        .await
        {
            Ok(name) => name,
            Err(e) => {
                warn!("affiliate name lookup failed, continuing: {}", e);
                String::new()
            }
        };

        let code = execute_activity(&self.policy, "GenerateCouponCode", || {
            self.activities
                .generate_coupon_code(&input.user_id, &affiliate_id, &input.delay_event_id)
        })
        .await?;

        let push_result = execute_activity(&self.policy, "SendPushNotification", || {
            self.activities
                .send_push_notification(&input.user_id, &affiliate_name, &code)
        })
        .await;

        match push_result {
            Ok(()) => {
                let expires_at = Utc::now() + chrono::Duration::hours(crate::compensation::COUPON_TTL_HOURS);
                if let Err(e) = self.activities.schedule_expiry(&code, expires_at).await {
                    warn!("expiry scheduling for {} failed: {}", code, e);
                }
                info!("compensation {} delivered", code);
                Ok(WorkflowOutcome {
                    state: WorkflowState::Notified,
                    code,
                })
            }
            Err(push_err) => {
                warn!(
                    "push for {} failed, rolling coupon back: {}",
                    code, push_err
                );

                match execute_activity(&self.policy, "DeleteCoupon", || {
                    self.activities.delete_coupon(&code)
                })
                .await
                {
                    Ok(()) => {
                        // The delay event may remain flagged compensated;
                        // surfaced for operator review.
                        warn!("coupon {} deleted after failed notification", code);
                        Err(Error::RollbackRequired {
                            source: Box::new(push_err),
                        })
                    }
                    Err(delete_err) => Err(Error::RollbackFailed {
                        source: Box::new(push_err),
                        rollback_error: delete_err.to_string(),
                    }),
                }
            }
        }
    }
}

/// Production activities: affiliate lookups and coupon issuance go through
/// the compensation service; notification goes through the push provider.
/// The service is composed with a log-only notifier so the workflow's
/// notification step is the single real push per coupon.
pub struct WorkflowActivities {
    pub service: CompensationService,
    pub affiliates: Arc<dyn AffiliateStore>,
    pub compensations: Arc<dyn CompensationStore>,
    pub notifier: Arc<dyn PushNotifier>,
}

#[async_trait]
impl CompensationActivities for WorkflowActivities {
    async fn find_nearest_affiliate(&self, lat: f64, lon: f64) -> Result<String, Error> {
        let nearby = self.affiliates.find_nearby(lat, lon, 5).await?;
        match nearby.first() {
            Some(affiliate) => Ok(affiliate.id.clone()),
            None => Err(Error::NoAffiliates),
        }
    }

    async fn get_affiliate_name(&self, affiliate_id: &str) -> Result<String, Error> {
        Ok(self.affiliates.get(affiliate_id).await?.name)
    }

    async fn generate_coupon_code(
        &self,
        user_id: &str,
        affiliate_id: &str,
        delay_event_id: &str,
    ) -> Result<String, Error> {
        // Replays return the already-issued code for this delay event.
        let comp = self
            .service
            .issue_for_affiliate(user_id, delay_event_id, affiliate_id)
            .await?;
        Ok(comp.code)
    }

    async fn send_push_notification(
        &self,
        user_id: &str,
        affiliate_name: &str,
        code: &str,
    ) -> Result<(), Error> {
        let body = format!(
            "Show code {} at {}. Valid for 72 hours.",
            code, affiliate_name
        );
        self.notifier.send_push(user_id, PUSH_TITLE, &body).await
    }

    async fn delete_coupon(&self, code: &str) -> Result<(), Error> {
        self.compensations.delete(code).await?;
        info!("coupon {} deleted (saga compensation)", code);
        Ok(())
    }

    async fn schedule_expiry(&self, code: &str, expires_at: DateTime<Utc>) -> Result<(), Error> {
        // The TTL lives on the row; this is the fallback cleanup hook.
        info!("coupon {} expires at {}", code, expires_at.to_rfc3339());
        Ok(())
    }
}
