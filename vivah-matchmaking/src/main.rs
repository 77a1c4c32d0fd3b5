use std::sync::Arc;

use vivah_shared::clients::db::create_pool;
use vivah_shared::clients::rabbitmq::RabbitMQClient;
use vivah_shared::clients::redis::RedisClient;
use vivah_shared::middleware::{init_metrics, init_tracing};

use vivah_matchmaking::config::{AppConfig, PairLockBackend};
use vivah_matchmaking::events::notifier::{NotificationDispatcher, RabbitNotifier};
use vivah_matchmaking::matching::locks::{LocalPairLocks, PairLocker, RedisPairLocks};
use vivah_matchmaking::matching::MatchService;
use vivah_matchmaking::repository::postgres::PgStore;
use vivah_matchmaking::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("vivah-matchmaking");

    let config = AppConfig::load()?;
    let port = config.port;
    let metrics = init_metrics("vivah-matchmaking")?;

    // Database pool
    let db = create_pool(&config.database_url, config.database_pool_size)?;
    let store = Arc::new(PgStore::new(db.clone()));

    // Pair locks: in-process for a single instance, Redis across instances
    let mut redis = None;
    let locks: Arc<dyn PairLocker> = match config.pair_lock_backend {
        PairLockBackend::Local => Arc::new(LocalPairLocks::new(config.pair_lock_wait())),
        PairLockBackend::Redis => {
            let client = RedisClient::connect(&config.redis_url).await?;
            redis = Some(client.clone());
            Arc::new(RedisPairLocks::new(
                client,
                config.pair_lock_ttl(),
                config.pair_lock_wait(),
            ))
        }
    };

    let mut service = MatchService::from_store(store, locks)
        .with_weights(config.scoring_weights())
        .with_recommendation_timeout(config.recommendation_timeout());

    // Like notifications go out through RabbitMQ from a detached worker
    let mut rabbitmq = None;
    if config.notifications_enabled {
        let client = RabbitMQClient::connect(&config.rabbitmq_url).await?;
        let (dispatcher, _worker) = NotificationDispatcher::spawn(
            Arc::new(RabbitNotifier::new(client.clone())),
            config.notification_queue_capacity,
        );
        service = service.with_notifications(dispatcher);
        rabbitmq = Some(client);
    } else {
        tracing::info!("like notifications disabled");
    }

    let state = Arc::new(AppState {
        service,
        db: Some(db),
        rabbitmq,
        redis,
        metrics: Some(metrics),
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(
        addr = %addr,
        pair_locks = ?config.pair_lock_backend,
        "vivah-matchmaking starting"
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
