//! Health check endpoint

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serenity::prelude::TypeMapKey;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub bot_username: Option<String>,
    pub guild_count: usize,
    pub uptime_secs: u64,
}

/// Shared application state for health checks
#[derive(Clone)]
pub struct AppState {
    start_time: SystemTime,
    inner: Arc<RwLock<Connection>>,
}

#[derive(Default)]
struct Connection {
    bot_username: Option<String>,
    guild_count: usize,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            start_time: SystemTime::now(),
            inner: Arc::new(RwLock::new(Connection::default())),
        }
    }

    pub async fn set_connected(&self, username: String, guild_count: usize) {
        let mut guard = self.inner.write().await;
        guard.bot_username = Some(username);
        guard.guild_count = guild_count;
    }

    pub async fn bot_username(&self) -> Option<String> {
        self.inner.read().await.bot_username.clone()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeMapKey for AppState {
    type Value = AppState;
}

async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let uptime = state.start_time.elapsed().unwrap_or_default().as_secs();
    let (bot_username, guild_count) = {
        let guard = state.inner.read().await;
        (guard.bot_username.clone(), guard.guild_count)
    };

    (
        StatusCode::OK,
        Json(HealthStatus {
            status: "ok".to_string(),
            bot_username,
            guild_count,
            uptime_secs: uptime,
        }),
    )
}

async fn live_handler() -> StatusCode {
    StatusCode::OK
}

/// Create the health check router
pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/live", get(live_handler))
        .with_state(state)
}

/// Start the health check server
pub async fn start_health_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_health_router(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Health check server listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_starts_disconnected() {
        let state = AppState::new();
        assert!(state.bot_username().await.is_none());
    }

    #[tokio::test]
    async fn test_set_connected() {
        let state = AppState::new();
        state.set_connected("rolecall".to_string(), 3).await;
        assert_eq!(state.bot_username().await, Some("rolecall".to_string()));
        assert_eq!(state.inner.read().await.guild_count, 3);
    }

    #[test]
    fn test_health_status_serde() {
        let status = HealthStatus {
            status: "ok".to_string(),
            bot_username: Some("rolecall".to_string()),
            guild_count: 2,
            uptime_secs: 100,
        };
        let json = serde_json::to_string(&status).unwrap();
        let back: HealthStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back.status, "ok");
        assert_eq!(back.guild_count, 2);
        assert_eq!(back.uptime_secs, 100);
        assert_eq!(back.bot_username, Some("rolecall".to_string()));
    }
}
