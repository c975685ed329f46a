//! Diesel-backed implementations of the compensation capabilities.

use crate::compensation::{AffiliateStore, CompensationStore, DelayEventStore};
use crate::error::Error;
use crate::models::{Affiliate, Compensation, NewCompensation};
use crate::postgres_tools::TransitPool;
use crate::store;
use async_trait::async_trait;
use std::sync::Arc;

pub struct PostgresAffiliateStore {
    pub pool: Arc<TransitPool>,
}

#[async_trait]
impl AffiliateStore for PostgresAffiliateStore {
    async fn find_nearby(&self, lat: f64, lon: f64, limit: i64) -> Result<Vec<Affiliate>, Error> {
        let nearby = store::affiliates::find_nearby(&self.pool, lat, lon, limit).await?;
        Ok(nearby.into_iter().map(|n| n.affiliate).collect())
    }

    async fn get(&self, affiliate_id: &str) -> Result<Affiliate, Error> {
        store::affiliates::get_by_id(&self.pool, affiliate_id)
            .await?
            .ok_or_else(|| Error::NotFound("affiliate", affiliate_id.to_string()))
    }
}

pub struct PostgresCompensationStore {
    pub pool: Arc<TransitPool>,
}

#[async_trait]
impl CompensationStore for PostgresCompensationStore {
    async fn create(&self, comp: &NewCompensation) -> Result<Compensation, Error> {
        store::compensations::create(&self.pool, comp).await
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Compensation>, Error> {
        store::compensations::get_by_code(&self.pool, code).await
    }

    async fn get_by_delay_event(
        &self,
        delay_event_id: &str,
    ) -> Result<Option<Compensation>, Error> {
        store::compensations::get_by_delay_event(&self.pool, delay_event_id).await
    }

    async fn redeem(&self, code: &str) -> Result<(), Error> {
        store::compensations::redeem(&self.pool, code).await
    }

    async fn delete(&self, code: &str) -> Result<(), Error> {
        store::compensations::delete(&self.pool, code).await
    }
}

pub struct PostgresDelayEventStore {
    pub pool: Arc<TransitPool>,
}

#[async_trait]
impl DelayEventStore for PostgresDelayEventStore {
    async fn mark_compensated(&self, delay_event_id: &str) -> Result<(), Error> {
        store::delays::mark_compensated(&self.pool, delay_event_id).await
    }
}
