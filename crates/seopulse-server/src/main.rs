mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use seopulse_audit::{AuditEngine, AuditEvent, EngineConfig, RateLimiter};
use seopulse_content::ContentClient;

use crate::{
    api::{build_app, AppState},
    middleware::{ApiRateLimit, AuthState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = seopulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = seopulse_db::PoolConfig::from_app_config(&config);
    let pool = seopulse_db::connect_pool(&config.database_url, pool_config).await?;
    seopulse_db::run_migrations(&pool).await?;

    let content_client = Arc::new(ContentClient::new(
        config.content_request_timeout_secs,
        &config.content_user_agent,
        config.content_max_retries,
        config.content_retry_backoff_base_secs,
    )?);
    let limiter = Arc::new(RateLimiter::new());
    let engine = AuditEngine::new(
        pool.clone(),
        content_client,
        Arc::clone(&limiter),
        EngineConfig::from_app_config(&config),
    )?;

    spawn_completion_listener(&engine);

    let _scheduler = scheduler::build_scheduler(pool.clone(), engine.clone()).await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        seopulse_core::Environment::Development
    ))?;
    let rate_limit = ApiRateLimit::new(limiter, config.api_rate_limit_per_minute);
    let app = build_app(AppState { pool, engine }, auth, rate_limit);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Reacts to audit completions: drops the store's content cache entries so
/// the next read (dashboard or follow-up audit) sees fresh data.
fn spawn_completion_listener(engine: &AuditEngine) {
    let cache = engine.cache();
    let mut events = engine.events().subscribe();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(AuditEvent::Completed {
                    store_id,
                    store_domain,
                }) => {
                    cache.invalidate_store(&store_domain).await;
                    tracing::info!(
                        store_id,
                        store = %store_domain,
                        "audit completed; content cache invalidated"
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "completion listener lagged; events dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
