use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use serde::Serialize;

use crate::model::Timestamp;

use super::{ApiResponse, App};

pub fn routes() -> Router<App> {
    Router::new().route("/healthcheck", get(healthcheck))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub database: Status,
    pub timestamp: Timestamp,
}

async fn healthcheck(State(app): State<App>) -> ApiResponse<Health> {
    let healthy = app.database.is_healthy().await;
    let health = Health {
        database: if healthy { Status::Up } else { Status::Down },
        timestamp: chrono::Utc::now(),
    };

    if healthy {
        ApiResponse::ok(health, "service is healthy")
    } else {
        ApiResponse::new(StatusCode::SERVICE_UNAVAILABLE, health, "database is unreachable")
    }
}
