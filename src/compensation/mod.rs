pub mod postgres;

use crate::error::Error;
use crate::models::{Affiliate, Compensation, NewCompensation};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::{info, warn};
use rand::RngCore;
use std::sync::Arc;

pub const COUPON_TTL_HOURS: i64 = 72;
pub const PUSH_TITLE: &str = "Free coffee — sorry for the delay!";

/// Storage and notification capabilities the compensation logic depends
/// on. Concrete drivers are chosen at composition time.
#[async_trait]
pub trait AffiliateStore: Send + Sync {
    /// Active affiliates nearest to the point, closest first.
    async fn find_nearby(&self, lat: f64, lon: f64, limit: i64) -> Result<Vec<Affiliate>, Error>;
    async fn get(&self, affiliate_id: &str) -> Result<Affiliate, Error>;
}

#[async_trait]
pub trait CompensationStore: Send + Sync {
    async fn create(&self, comp: &NewCompensation) -> Result<Compensation, Error>;
    async fn get_by_code(&self, code: &str) -> Result<Option<Compensation>, Error>;
    async fn get_by_delay_event(&self, delay_event_id: &str)
        -> Result<Option<Compensation>, Error>;
    async fn redeem(&self, code: &str) -> Result<(), Error>;
    async fn delete(&self, code: &str) -> Result<(), Error>;
}

#[async_trait]
pub trait DelayEventStore: Send + Sync {
    async fn mark_compensated(&self, delay_event_id: &str) -> Result<(), Error>;
}

#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send_push(&self, user_id: &str, title: &str, body: &str) -> Result<(), Error>;
}

/// Fallback notifier: logs instead of delivering. Used when no push
/// credentials are configured.
pub struct LogPushNotifier;

#[async_trait]
impl PushNotifier for LogPushNotifier {
    async fn send_push(&self, user_id: &str, title: &str, body: &str) -> Result<(), Error> {
        info!("push (no notifier) -> user={} title={:?} body={:?}", user_id, title, body);
        Ok(())
    }
}

/// Coupon codes are `BP-` plus 12 lowercase hex chars from 6 CSPRNG bytes.
pub fn generate_code() -> String {
    let mut bytes = [0u8; 6];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("BP-{}", hex)
}

pub struct CompensationService {
    affiliates: Arc<dyn AffiliateStore>,
    compensations: Arc<dyn CompensationStore>,
    delays: Arc<dyn DelayEventStore>,
    notifier: Arc<dyn PushNotifier>,
}

impl CompensationService {
    pub fn new(
        affiliates: Arc<dyn AffiliateStore>,
        compensations: Arc<dyn CompensationStore>,
        delays: Arc<dyn DelayEventStore>,
        notifier: Arc<dyn PushNotifier>,
    ) -> CompensationService {
        CompensationService {
            affiliates,
            compensations,
            delays,
            notifier,
        }
    }

    /// Issues a coupon for a delay event: nearest active affiliate, fresh
    /// code, 72 h TTL. Marking the delay event and sending the push are
    /// best-effort; the created coupon survives their failure. Re-issuing
    /// for a delay event that already has a coupon returns the existing
    /// one unchanged.
    pub async fn issue_compensation(
        &self,
        user_id: &str,
        delay_event_id: &str,
        stop_lat: f64,
        stop_lon: f64,
    ) -> Result<Compensation, Error> {
        if let Some(existing) = self
            .compensations
            .get_by_delay_event(delay_event_id)
            .await?
        {
            info!(
                "delay event {} already compensated with {}",
                delay_event_id, existing.code
            );
            return Ok(existing);
        }

        let nearby = self.affiliates.find_nearby(stop_lat, stop_lon, 5).await?;
        let affiliate = match nearby.first() {
            Some(affiliate) => affiliate.clone(),
            None => return Err(Error::NoAffiliates),
        };

        self.issue_with(user_id, delay_event_id, affiliate).await
    }

    /// Same as [`issue_compensation`](Self::issue_compensation) but for a
    /// caller that already resolved the affiliate (the workflow's step 1).
    pub async fn issue_for_affiliate(
        &self,
        user_id: &str,
        delay_event_id: &str,
        affiliate_id: &str,
    ) -> Result<Compensation, Error> {
        if let Some(existing) = self
            .compensations
            .get_by_delay_event(delay_event_id)
            .await?
        {
            info!(
                "delay event {} already compensated with {}",
                delay_event_id, existing.code
            );
            return Ok(existing);
        }

        let affiliate = self.affiliates.get(affiliate_id).await?;
        self.issue_with(user_id, delay_event_id, affiliate).await
    }

    async fn issue_with(
        &self,
        user_id: &str,
        delay_event_id: &str,
        affiliate: Affiliate,
    ) -> Result<Compensation, Error> {
        let now = Utc::now();
        let comp = self
            .compensations
            .create(&NewCompensation {
                user_id: user_id.to_string(),
                delay_event_id: delay_event_id.to_string(),
                affiliate_id: affiliate.id.clone(),
                code: generate_code(),
                issued_at: now,
                expires_at: now + Duration::hours(COUPON_TTL_HOURS),
                metadata: None,
            })
            .await?;

        if let Err(e) = self.delays.mark_compensated(delay_event_id).await {
            warn!("mark delay event {} compensated: {}", delay_event_id, e);
        }

        let body = format!(
            "Show code {} at {}. Valid for 72 hours.",
            comp.code, affiliate.name
        );
        if let Err(e) = self.notifier.send_push(user_id, PUSH_TITLE, &body).await {
            warn!("push for coupon {}: {}", comp.code, e);
        }

        Ok(comp)
    }

    pub async fn redeem(&self, code: &str) -> Result<(), Error> {
        self.compensations.redeem(code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postgis_diesel::types::Point;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    pub fn test_affiliate(id: &str, name: &str) -> Affiliate {
        Affiliate {
            id: id.to_string(),
            name: name.to_string(),
            category: "cafe".to_string(),
            location: Point::new(-2.935, 43.263, Some(4326)),
            address: None,
            offer_text: "free coffee".to_string(),
            offer_value: 2.5,
            active: true,
            created_at: Utc::now(),
        }
    }

    pub struct FakeAffiliates {
        pub affiliates: Vec<Affiliate>,
    }

    #[async_trait]
    impl AffiliateStore for FakeAffiliates {
        async fn find_nearby(
            &self,
            _lat: f64,
            _lon: f64,
            limit: i64,
        ) -> Result<Vec<Affiliate>, Error> {
            Ok(self.affiliates.iter().take(limit as usize).cloned().collect())
        }

        async fn get(&self, affiliate_id: &str) -> Result<Affiliate, Error> {
            self.affiliates
                .iter()
                .find(|a| a.id == affiliate_id)
                .cloned()
                .ok_or_else(|| Error::NotFound("affiliate", affiliate_id.to_string()))
        }
    }

    #[derive(Default)]
    pub struct FakeCompensations {
        pub rows: Mutex<Vec<Compensation>>,
    }

    #[async_trait]
    impl CompensationStore for FakeCompensations {
        async fn create(&self, comp: &NewCompensation) -> Result<Compensation, Error> {
            let mut rows = self.rows.lock().unwrap();
            if rows.iter().any(|r| r.delay_event_id == comp.delay_event_id) {
                return Err(Error::InvalidInput("duplicate delay_event_id".to_string()));
            }
            let created = Compensation {
                id: format!("comp-{}", rows.len() + 1),
                user_id: comp.user_id.clone(),
                delay_event_id: comp.delay_event_id.clone(),
                affiliate_id: comp.affiliate_id.clone(),
                code: comp.code.clone(),
                issued_at: comp.issued_at,
                expires_at: comp.expires_at,
                redeemed_at: None,
                metadata: comp.metadata.clone(),
            };
            rows.push(created.clone());
            Ok(created)
        }

        async fn get_by_code(&self, code: &str) -> Result<Option<Compensation>, Error> {
            Ok(self.rows.lock().unwrap().iter().find(|r| r.code == code).cloned())
        }

        async fn get_by_delay_event(
            &self,
            delay_event_id: &str,
        ) -> Result<Option<Compensation>, Error> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.delay_event_id == delay_event_id)
                .cloned())
        }

        async fn redeem(&self, code: &str) -> Result<(), Error> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|r| r.code == code && r.redeemed_at.is_none()) {
                Some(row) => {
                    row.redeemed_at = Some(Utc::now());
                    Ok(())
                }
                None => Err(Error::NotFound("compensation", code.to_string())),
            }
        }

        async fn delete(&self, code: &str) -> Result<(), Error> {
            self.rows.lock().unwrap().retain(|r| r.code != code);
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeDelays {
        pub marked: Mutex<Vec<String>>,
        pub fail: bool,
    }

    #[async_trait]
    impl DelayEventStore for FakeDelays {
        async fn mark_compensated(&self, delay_event_id: &str) -> Result<(), Error> {
            if self.fail {
                return Err(Error::Transient("store down".to_string()));
            }
            self.marked.lock().unwrap().push(delay_event_id.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeNotifier {
        pub sent: AtomicU32,
        pub fail: bool,
    }

    #[async_trait]
    impl PushNotifier for FakeNotifier {
        async fn send_push(&self, _user_id: &str, _title: &str, _body: &str) -> Result<(), Error> {
            if self.fail {
                return Err(Error::Notify("provider 500".to_string()));
            }
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn service(
        affiliates: Vec<Affiliate>,
        notifier: Arc<FakeNotifier>,
        delays: Arc<FakeDelays>,
        comps: Arc<FakeCompensations>,
    ) -> CompensationService {
        CompensationService::new(
            Arc::new(FakeAffiliates { affiliates }),
            comps,
            delays,
            notifier,
        )
    }

    #[test]
    fn test_code_format() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 15);
            assert!(code.starts_with("BP-"));
            assert!(code[3..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_codes_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..100 {
            assert!(seen.insert(generate_code()));
        }
    }

    #[tokio::test]
    async fn test_issue_creates_coupon_and_notifies() {
        let notifier = Arc::new(FakeNotifier::default());
        let delays = Arc::new(FakeDelays::default());
        let comps = Arc::new(FakeCompensations::default());
        let svc = service(
            vec![test_affiliate("A1", "Cafe Iruna")],
            notifier.clone(),
            delays.clone(),
            comps.clone(),
        );

        let comp = svc.issue_compensation("U1", "D1", 43.27, -2.94).await.unwrap();

        assert!(comp.code.starts_with("BP-"));
        assert_eq!(comp.affiliate_id, "A1");
        let ttl = comp.expires_at - comp.issued_at;
        assert_eq!(ttl.num_hours(), COUPON_TTL_HOURS);
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
        assert_eq!(delays.marked.lock().unwrap().as_slice(), ["D1"]);
    }

    #[tokio::test]
    async fn test_issue_fails_without_affiliates() {
        let svc = service(
            vec![],
            Arc::new(FakeNotifier::default()),
            Arc::new(FakeDelays::default()),
            Arc::new(FakeCompensations::default()),
        );

        let err = svc.issue_compensation("U1", "D1", 43.27, -2.94).await.unwrap_err();
        assert!(matches!(err, Error::NoAffiliates));
    }

    #[tokio::test]
    async fn test_issue_survives_mark_and_push_failure() {
        let notifier = Arc::new(FakeNotifier { sent: AtomicU32::new(0), fail: true });
        let delays = Arc::new(FakeDelays { marked: Mutex::new(vec![]), fail: true });
        let comps = Arc::new(FakeCompensations::default());
        let svc = service(
            vec![test_affiliate("A1", "Cafe Iruna")],
            notifier,
            delays,
            comps.clone(),
        );

        // Both side effects fail; the coupon must still exist.
        let comp = svc.issue_compensation("U1", "D1", 43.27, -2.94).await.unwrap();
        assert!(comps.get_by_code(&comp.code).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_issue_is_idempotent_per_delay_event() {
        let notifier = Arc::new(FakeNotifier::default());
        let comps = Arc::new(FakeCompensations::default());
        let svc = service(
            vec![test_affiliate("A1", "Cafe Iruna")],
            notifier.clone(),
            Arc::new(FakeDelays::default()),
            comps.clone(),
        );

        let first = svc.issue_compensation("U1", "D1", 43.27, -2.94).await.unwrap();
        let second = svc.issue_compensation("U1", "D1", 43.27, -2.94).await.unwrap();

        assert_eq!(first.code, second.code);
        assert_eq!(comps.rows.lock().unwrap().len(), 1);
        // the replay does not notify again
        assert_eq!(notifier.sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_issue_for_affiliate_skips_lookup() {
        let comps = Arc::new(FakeCompensations::default());
        let svc = service(
            vec![test_affiliate("A1", "Cafe Iruna"), test_affiliate("A2", "Bar Haizea")],
            Arc::new(FakeNotifier::default()),
            Arc::new(FakeDelays::default()),
            comps.clone(),
        );

        let comp = svc.issue_for_affiliate("U1", "D1", "A2").await.unwrap();
        assert_eq!(comp.affiliate_id, "A2");

        let again = svc.issue_for_affiliate("U1", "D1", "A1").await.unwrap();
        assert_eq!(again.code, comp.code);
        assert_eq!(comps.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_redeem_once() {
        let comps = Arc::new(FakeCompensations::default());
        let svc = service(
            vec![test_affiliate("A1", "Cafe Iruna")],
            Arc::new(FakeNotifier::default()),
            Arc::new(FakeDelays::default()),
            comps.clone(),
        );

        let comp = svc.issue_compensation("U1", "D1", 43.27, -2.94).await.unwrap();
        svc.redeem(&comp.code).await.unwrap();
        assert!(svc.redeem(&comp.code).await.is_err());
    }
}
