use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use vivah_shared::clients::db::DbPool;
use vivah_shared::clients::rabbitmq::RabbitMQClient;
use vivah_shared::clients::redis::RedisClient;
use vivah_shared::middleware::metrics_middleware;

pub mod config;
pub mod events;
pub mod matching;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;

use matching::MatchService;

pub struct AppState {
    pub service: MatchService,
    /// Probed by `/health` when present.
    pub db: Option<DbPool>,
    pub rabbitmq: Option<RabbitMQClient>,
    pub redis: Option<RedisClient>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(service: MatchService) -> Self {
        Self {
            service,
            db: None,
            rabbitmq: None,
            redis: None,
            metrics: None,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/recommendations", get(routes::matches::get_recommendations))
        .route(
            "/actions",
            axum::routing::post(routes::matches::record_action).put(routes::matches::update_action),
        )
        .route("/history", get(routes::matches::get_history))
        .route("/mutual", get(routes::matches::get_mutual))
        .layer(axum::middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
