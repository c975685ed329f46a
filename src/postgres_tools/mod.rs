use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::ManagerConfig;
use diesel_async::pooled_connection::RecyclingMethod;
use diesel_async::pooled_connection::bb8::Pool;
use std::env;

/// Shared connection pool over the transit store. Wrap in Arc to clone
/// across tasks; readers and writers share the same pool.
pub type TransitPool =
    bb8::Pool<AsyncDieselConnectionManager<diesel_async::AsyncPgConnection>>;

/// A pooled connection. Must stay on a single task while held.
pub type TransitConn<'a> = &'a mut bb8::PooledConnection<
    'a,
    diesel_async::pooled_connection::AsyncDieselConnectionManager<diesel_async::AsyncPgConnection>,
>;

pub async fn make_async_pool(
    database_url: &str,
) -> Result<TransitPool, Box<dyn std::error::Error + Sync + Send>> {
    let mut manager_conf = ManagerConfig::default();
    manager_conf.recycling_method = RecyclingMethod::Fast;

    let config: AsyncDieselConnectionManager<diesel_async::AsyncPgConnection> =
        AsyncDieselConnectionManager::<diesel_async::AsyncPgConnection>::new_with_config(
            database_url,
            manager_conf,
        );

    let pool = Pool::builder().max_size(50).build(config).await?;

    Ok(pool)
}

/// `DATABASE_URL` wins over the DSN assembled from configuration.
pub fn database_url_or(dsn: &str) -> String {
    env::var("DATABASE_URL").unwrap_or_else(|_| dsn.to_string())
}
