use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    api::AppState,
    models::{Participant, UpdateParticipantRequest},
    services::participant_service,
    store::EnrollerStore,
    utils::{error::AppError, password::hash_password},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSearchParams {
    /// Only `login` sorts
    #[serde(default)]
    pub sort_by: String,
    /// `ASC` or `DESC`
    #[serde(default)]
    pub sort_order: String,
    /// Substring of the login
    #[serde(default)]
    pub key: String,
}

async fn load_participant(store: &dyn EnrollerStore, login: &str) -> Result<Participant, AppError> {
    participant_service::find_by_login(store, login)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Participant {} not found", login)))
}

#[utoipa::path(
    get,
    path = "/participants",
    tag = "Participants",
    params(ParticipantSearchParams),
    responses(
        (status = 200, description = "Matching participants", body = Vec<Participant>)
    )
)]
pub async fn get_participants(
    state: web::Data<AppState>,
    params: web::Query<ParticipantSearchParams>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "📋 GET /participants - sortBy: {:?}, sortOrder: {:?}, key: {:?}",
        params.sort_by,
        params.sort_order,
        params.key
    );

    let participants = participant_service::get_all(
        state.store.as_ref(),
        &params.sort_by,
        &params.sort_order,
        &params.key,
    )
    .await?;

    log::info!("✅ Found {} participants", participants.len());
    Ok(HttpResponse::Ok().json(participants))
}

#[utoipa::path(
    get,
    path = "/participants/{login}",
    tag = "Participants",
    params(("login" = String, Path, description = "Participant login")),
    responses(
        (status = 200, description = "Participant found", body = Participant),
        (status = 404, description = "Participant not found")
    )
)]
pub async fn get_participant(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let login = path.into_inner();
    log::info!("🔍 GET /participants/{}", login);

    let participant = load_participant(state.store.as_ref(), &login).await?;
    Ok(HttpResponse::Ok().json(participant))
}

#[utoipa::path(
    post,
    path = "/participants",
    tag = "Participants",
    request_body = Participant,
    responses(
        (status = 201, description = "Participant created", body = Participant),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Login already taken")
    )
)]
pub async fn register_participant(
    state: web::Data<AppState>,
    body: web::Json<Participant>,
) -> Result<HttpResponse, AppError> {
    let participant = body.into_inner();
    log::info!("📝 POST /participants - login: {}", participant.login);
    participant.validate()?;

    let store = state.store.as_ref();

    if participant_service::find_by_login(store, &participant.login)
        .await?
        .is_some()
    {
        log::warn!("⚠️ Participant {} already exists", participant.login);
        return Err(AppError::Conflict(format!(
            "Unable to create. A participant with login {} already exist.",
            participant.login
        )));
    }

    let created = participant_service::add(store, participant, state.bcrypt_cost).await?;
    log::info!("✅ Participant created: {}", created.login);
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/participants/{login}",
    tag = "Participants",
    params(("login" = String, Path, description = "Participant login")),
    request_body = UpdateParticipantRequest,
    responses(
        (status = 200, description = "Participant updated", body = Participant),
        (status = 404, description = "Participant not found")
    )
)]
pub async fn update_participant(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateParticipantRequest>,
) -> Result<HttpResponse, AppError> {
    let login = path.into_inner();
    log::info!("🔧 PUT /participants/{}", login);
    let store = state.store.as_ref();

    let mut participant = load_participant(store, &login).await?;
    body.apply_profile(&mut participant);
    if let Some(password) = &body.password {
        participant.password = hash_password(password, state.bcrypt_cost).await?;
    }
    participant_service::update(store, &participant).await?;

    log::info!("✅ Participant updated: {}", login);
    Ok(HttpResponse::Ok().json(participant))
}

#[utoipa::path(
    delete,
    path = "/participants/{login}",
    tag = "Participants",
    params(("login" = String, Path, description = "Participant login")),
    responses(
        (status = 200, description = "Participant deleted"),
        (status = 404, description = "Participant not found")
    )
)]
pub async fn delete_participant(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let login = path.into_inner();
    log::info!("🗑️ DELETE /participants/{}", login);
    let store = state.store.as_ref();

    let participant = load_participant(store, &login).await?;
    participant_service::delete(store, &participant).await?;

    log::info!("✅ Participant deleted: {}", login);
    Ok(HttpResponse::Ok().finish())
}
