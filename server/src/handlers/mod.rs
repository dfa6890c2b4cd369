use axum::response::Response;
use serde::Serialize;

use crate::utils::response::success;

pub mod content;
pub mod events;
pub mod opportunities;
pub mod personalize;
pub mod register;
pub mod search;
pub mod webhooks;

#[derive(Serialize)]
struct HealthPayload {
    status: &'static str,
    service: &'static str,
}

pub async fn health_check() -> Response {
    let payload = HealthPayload {
        status: "ok",
        service: "impactconnect-api",
    };

    success(payload, "Health check successful")
}
