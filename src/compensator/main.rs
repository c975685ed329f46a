use bidepass::bus::Subscriber;
use bidepass::bus::messages::CompensationRequest;
use bidepass::compensation::postgres::{
    PostgresAffiliateStore, PostgresCompensationStore, PostgresDelayEventStore,
};
use bidepass::compensation::{
    AffiliateStore, CompensationService, CompensationStore, LogPushNotifier, PushNotifier,
};
use bidepass::config::Config;
use bidepass::error::Error;
use bidepass::logging;
use bidepass::postgres_tools::{TransitPool, database_url_or, make_async_pool};
use bidepass::workflow::compensation::{
    CompensationInput, CompensationWorkflow, WorkflowActivities,
};
use log::{error, info, warn};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::load().expect("configuration failed to load");
    logging::init(&config.log);

    let database_url = database_url_or(&config.database.dsn());
    let pool: Arc<TransitPool> = Arc::new(
        make_async_pool(&database_url)
            .await
            .expect("database connection failed"),
    );

    let affiliates: Arc<dyn AffiliateStore> = Arc::new(PostgresAffiliateStore {
        pool: Arc::clone(&pool),
    });
    let compensations: Arc<dyn CompensationStore> = Arc::new(PostgresCompensationStore {
        pool: Arc::clone(&pool),
    });
    let delays = Arc::new(PostgresDelayEventStore {
        pool: Arc::clone(&pool),
    });

    // The workflow's notification step performs the single real push, so
    // the service is wired with the log-only notifier.
    if config.push.credentials.is_empty() {
        warn!("no push credentials configured; notifications are logged only");
    }
    let notifier: Arc<dyn PushNotifier> = Arc::new(LogPushNotifier);

    let service = CompensationService::new(
        Arc::clone(&affiliates),
        Arc::clone(&compensations),
        delays,
        Arc::new(LogPushNotifier),
    );

    let workflow = Arc::new(CompensationWorkflow::new(Arc::new(WorkflowActivities {
        service,
        affiliates,
        compensations,
        notifier,
    })));

    let subscriber = Subscriber::connect(&config.nats.url)
        .await
        .expect("message bus connection failed");

    info!("compensator worker started");

    let consume = subscriber.run_delay_requests(move |request: CompensationRequest| {
        let workflow = Arc::clone(&workflow);
        async move {
            let input = CompensationInput {
                delay_event_id: request.delay_event_id,
                user_id: request.user_id,
                stop_id: request.stop_id,
                stop_lat: request.stop_lat,
                stop_lon: request.stop_lon,
                delay_minutes: request.delay_minutes,
            };

            match workflow.run(&input).await {
                Ok(outcome) => {
                    info!(
                        "workflow finished for {} with coupon {}",
                        input.delay_event_id, outcome.code
                    );
                    Ok(())
                }
                Err(e @ Error::RollbackFailed { .. }) => {
                    error!("workflow rollback failed for {}: {}", input.delay_event_id, e);
                    Err(e)
                }
                Err(e) => {
                    warn!("workflow failed for {}: {}", input.delay_event_id, e);
                    Err(e)
                }
            }
        }
    });

    tokio::select! {
        result = consume => {
            if let Err(e) = result {
                error!("delay consumer stopped: {}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, shutting down compensator");
        }
    }
}
