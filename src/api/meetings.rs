use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    api::AppState,
    models::{EnrollRequest, Meeting, NewMeeting, Participant, UpdateMeetingRequest},
    services::{meeting_service, participant_service},
    store::EnrollerStore,
    utils::error::AppError,
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSearchParams {
    /// Substring of the title
    #[serde(default)]
    pub title: String,
    /// Substring of the description
    #[serde(default)]
    pub description: String,
    /// Login of an enrolled participant
    #[serde(default)]
    pub participant: String,
    /// `title`, `titleDesc`, `date` or `dateDesc`
    #[serde(default)]
    pub sort_mode: String,
}

async fn load_meeting(store: &dyn EnrollerStore, id: i64) -> Result<Meeting, AppError> {
    meeting_service::find_by_id(store, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Meeting {} not found", id)))
}

#[utoipa::path(
    get,
    path = "/meetings",
    tag = "Meetings",
    params(MeetingSearchParams),
    responses(
        (status = 200, description = "Matching meetings", body = Vec<Meeting>)
    )
)]
pub async fn find_meetings(
    state: web::Data<AppState>,
    params: web::Query<MeetingSearchParams>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "📋 GET /meetings - title: {:?}, description: {:?}, participant: {:?}, sortMode: {:?}",
        params.title,
        params.description,
        params.participant,
        params.sort_mode
    );
    let store = state.store.as_ref();

    let participant = if params.participant.is_empty() {
        None
    } else {
        let found = participant_service::find_by_login(store, &params.participant).await?;
        if found.is_none() {
            log::info!("ℹ️  Unknown participant {}, filter ignored", params.participant);
        }
        found
    };

    let meetings = meeting_service::find_meetings(
        store,
        &params.title,
        &params.description,
        participant.as_ref(),
        &params.sort_mode,
    )
    .await?;

    log::info!("✅ Found {} meetings", meetings.len());
    Ok(HttpResponse::Ok().json(meetings))
}

#[utoipa::path(
    get,
    path = "/meetings/{id}",
    tag = "Meetings",
    params(("id" = i64, Path, description = "Meeting id")),
    responses(
        (status = 200, description = "Meeting found", body = Meeting),
        (status = 404, description = "Meeting not found")
    )
)]
pub async fn get_meeting(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🔍 GET /meetings/{}", id);

    let meeting = load_meeting(state.store.as_ref(), id).await?;
    Ok(HttpResponse::Ok().json(meeting))
}

#[utoipa::path(
    post,
    path = "/meetings",
    tag = "Meetings",
    request_body = NewMeeting,
    responses(
        (status = 201, description = "Meeting created", body = Meeting),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "A meeting with the same title and date already exists")
    )
)]
pub async fn add_meeting(
    state: web::Data<AppState>,
    body: web::Json<NewMeeting>,
) -> Result<HttpResponse, AppError> {
    let meeting = body.into_inner();
    log::info!("📝 POST /meetings - title: {}, date: {}", meeting.title, meeting.date);
    meeting.validate()?;

    let store = state.store.as_ref();

    if let Some(owner) = &meeting.owner {
        if participant_service::find_by_login(store, owner).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "Unable to create. Owner {} is not a participant.",
                owner
            )));
        }
    }

    if meeting_service::already_exist(store, &meeting).await? {
        log::warn!("⚠️ Meeting {} on {} already exists", meeting.title, meeting.date);
        return Err(AppError::Conflict(format!(
            "Unable to create. A meeting with title {} and date {} already exist.",
            meeting.title, meeting.date
        )));
    }

    let created = meeting_service::add(store, meeting).await?;
    log::info!("✅ Meeting created: {}", created.id);
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/meetings/{id}",
    tag = "Meetings",
    params(("id" = i64, Path, description = "Meeting id")),
    request_body = UpdateMeetingRequest,
    responses(
        (status = 200, description = "Meeting updated", body = Meeting),
        (status = 404, description = "Meeting not found")
    )
)]
pub async fn update_meeting(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<UpdateMeetingRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🔧 PUT /meetings/{}", id);
    let store = state.store.as_ref();

    let mut meeting = load_meeting(store, id).await?;
    body.apply_to(&mut meeting);
    meeting_service::update(store, &meeting).await?;

    log::info!("✅ Meeting updated: {}", id);
    Ok(HttpResponse::Ok().json(meeting))
}

#[utoipa::path(
    delete,
    path = "/meetings/{id}",
    tag = "Meetings",
    params(("id" = i64, Path, description = "Meeting id")),
    responses(
        (status = 200, description = "Meeting deleted"),
        (status = 404, description = "Meeting not found")
    )
)]
pub async fn delete_meeting(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🗑️ DELETE /meetings/{}", id);
    let store = state.store.as_ref();

    let meeting = load_meeting(store, id).await?;
    meeting_service::delete(store, &meeting).await?;

    log::info!("✅ Meeting deleted: {}", id);
    Ok(HttpResponse::Ok().finish())
}

#[utoipa::path(
    get,
    path = "/meetings/{id}/participants",
    tag = "Meetings",
    params(("id" = i64, Path, description = "Meeting id")),
    responses(
        (status = 200, description = "Enrolled participants", body = Vec<Participant>),
        (status = 404, description = "Meeting not found")
    )
)]
pub async fn get_participants(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("👥 GET /meetings/{}/participants", id);

    let meeting = load_meeting(state.store.as_ref(), id).await?;
    Ok(HttpResponse::Ok().json(meeting.participants))
}

#[utoipa::path(
    post,
    path = "/meetings/{id}/participants",
    tag = "Meetings",
    params(("id" = i64, Path, description = "Meeting id")),
    request_body = EnrollRequest,
    responses(
        (status = 200, description = "Participant enrolled", body = Vec<Participant>),
        (status = 400, description = "Login missing from the request body"),
        (status = 404, description = "Meeting or participant not found")
    )
)]
pub async fn add_participant(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<EnrollRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("➕ POST /meetings/{}/participants - login: {:?}", id, body.login);
    let store = state.store.as_ref();

    let mut meeting = load_meeting(store, id).await?;

    let login = body.login.as_deref().ok_or_else(|| {
        AppError::BadRequest(
            "Unable to add participant to the meeting. Lack of participant login in the request body."
                .to_string(),
        )
    })?;

    let participant = participant_service::find_by_login(store, login)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Participant {} not found", login)))?;

    if meeting.add_participant(participant) {
        meeting_service::update(store, &meeting).await?;
        log::info!("✅ {} enrolled in meeting {}", login, id);
    } else {
        log::info!("ℹ️  {} already enrolled in meeting {}", login, id);
    }

    Ok(HttpResponse::Ok().json(meeting.participants))
}

#[utoipa::path(
    delete,
    path = "/meetings/{id}/participants/{login}",
    tag = "Meetings",
    params(
        ("id" = i64, Path, description = "Meeting id"),
        ("login" = String, Path, description = "Participant login")
    ),
    responses(
        (status = 200, description = "Remaining participants", body = Vec<Participant>),
        (status = 404, description = "Meeting not found")
    )
)]
pub async fn remove_participant(
    state: web::Data<AppState>,
    path: web::Path<(i64, String)>,
) -> Result<HttpResponse, AppError> {
    let (id, login) = path.into_inner();
    log::info!("➖ DELETE /meetings/{}/participants/{}", id, login);
    let store = state.store.as_ref();

    let mut meeting = load_meeting(store, id).await?;

    if meeting.remove_participant(&login) {
        meeting_service::update(store, &meeting).await?;
        log::info!("✅ {} removed from meeting {}", login, id);
    } else {
        log::info!("ℹ️  {} was not enrolled in meeting {}", login, id);
    }

    Ok(HttpResponse::Ok().json(meeting.participants))
}
