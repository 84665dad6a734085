pub mod health;
pub mod meetings;
pub mod participants;
pub mod swagger;

use std::sync::Arc;

use actix_web::web;

use crate::store::EnrollerStore;
use crate::utils::error::AppError;

/// Shared handler state
pub struct AppState {
    pub store: Arc<dyn EnrollerStore>,
    pub bcrypt_cost: u32,
}

/// Registers every route. Used by `main` and by the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("❌ Rejected request body: {}", err);
        AppError::BadRequest(err.to_string()).into()
    }))
    .route("/health", web::get().to(health::health_check))
    .service(
        web::scope("/meetings")
            .route("", web::get().to(meetings::find_meetings))
            .route("", web::post().to(meetings::add_meeting))
            .route("/{id}", web::get().to(meetings::get_meeting))
            .route("/{id}", web::put().to(meetings::update_meeting))
            .route("/{id}", web::delete().to(meetings::delete_meeting))
            .route("/{id}/participants", web::get().to(meetings::get_participants))
            .route("/{id}/participants", web::post().to(meetings::add_participant))
            .route(
                "/{id}/participants/{login}",
                web::delete().to(meetings::remove_participant),
            ),
    )
    .service(
        web::scope("/participants")
            .route("", web::get().to(participants::get_participants))
            .route("", web::post().to(participants::register_participant))
            .route("/{login}", web::get().to(participants::get_participant))
            .route("/{login}", web::put().to(participants::update_participant))
            .route("/{login}", web::delete().to(participants::delete_participant)),
    );
}


#[cfg(test)]
mod tests {
    use super::test_support::test_app;
    use crate::store::memory::MemoryStore;
    use actix_web::{http::StatusCode, test};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_malformed_json_is_400() {
        let app = test::init_service(test_app(Arc::new(MemoryStore::new()))).await;
        let req = test::TestRequest::post()
            .uri("/meetings")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }
}
