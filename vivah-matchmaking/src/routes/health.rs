use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;

use vivah_shared::types::api::{HealthCheck, HealthResponse};

use crate::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let mut checks = Vec::new();

    if let Some(pool) = state.db.clone() {
        let probe = tokio::task::spawn_blocking(move || -> Result<(), String> {
            let mut conn = pool.get().map_err(|e| e.to_string())?;
            diesel::sql_query("SELECT 1")
                .execute(&mut conn)
                .map_err(|e| e.to_string())?;
            Ok(())
        })
        .await;

        checks.push(match probe {
            Ok(Ok(())) => HealthCheck::healthy("postgres"),
            Ok(Err(e)) => HealthCheck::unhealthy("postgres", e),
            Err(e) => HealthCheck::unhealthy("postgres", e.to_string()),
        });
    }

    if let Some(rabbitmq) = &state.rabbitmq {
        checks.push(if rabbitmq.is_connected() {
            HealthCheck::healthy("rabbitmq")
        } else {
            HealthCheck::unhealthy("rabbitmq", "channel closed")
        });
    }

    if let Some(redis) = &state.redis {
        checks.push(match redis.ping().await {
            Ok(()) => HealthCheck::healthy("redis"),
            Err(e) => HealthCheck::unhealthy("redis", e.to_string()),
        });
    }

    let resp = HealthResponse::healthy("vivah-matchmaking", env!("CARGO_PKG_VERSION")).with_checks(checks);
    (resp.http_status(), Json(resp))
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> String {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
