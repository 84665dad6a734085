use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Enroller API",
        version = "1.0.0",
        description = "Meetings, participants and enrolment between them.\n\n**Features:**\n- Meeting search by title, description and participant, with sorting\n- Participant search by login, with sorting\n- Enrolment management per meeting\n- Health monitoring"
    ),
    paths(
        // Health
        crate::api::health::health_check,

        // Meetings
        crate::api::meetings::find_meetings,
        crate::api::meetings::get_meeting,
        crate::api::meetings::add_meeting,
        crate::api::meetings::update_meeting,
        crate::api::meetings::delete_meeting,
        crate::api::meetings::get_participants,
        crate::api::meetings::add_participant,
        crate::api::meetings::remove_participant,

        // Participants
        crate::api::participants::get_participants,
        crate::api::participants::get_participant,
        crate::api::participants::register_participant,
        crate::api::participants::update_participant,
        crate::api::participants::delete_participant,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::models::Meeting,
            crate::models::NewMeeting,
            crate::models::UpdateMeetingRequest,
            crate::models::EnrollRequest,
            crate::models::Participant,
            crate::models::UpdateParticipantRequest,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint for monitoring service status."),
        (name = "Meetings", description = "Meeting CRUD, search and enrolment of participants."),
        (name = "Participants", description = "Participant accounts. Passwords are stored as bcrypt hashes and never returned."),
    )
)]
pub struct ApiDoc;
