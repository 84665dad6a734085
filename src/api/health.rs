use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::api::AppState;

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when the store does not answer
    pub status: String,
    pub service: String,
    pub version: String,
    /// `connected` or `unreachable`
    pub database: String,
    pub timestamp: i64,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service and store are up", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse)
    )
)]
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let reachable = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            log::error!("❌ Health check: store unreachable: {}", e);
            false
        }
    };

    let body = HealthResponse {
        status: if reachable { "healthy" } else { "degraded" }.to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if reachable { "connected" } else { "unreachable" }.to_string(),
        timestamp: chrono::Utc::now().timestamp(),
    };

    if reachable {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::test_app;
    use crate::store::memory::MemoryStore;
    use actix_web::{http::StatusCode, test};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_health_reports_store() {
        let app = test::init_service(test_app(Arc::new(MemoryStore::new()))).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "enroller");
        assert_eq!(body["database"], "connected");
    }
}
