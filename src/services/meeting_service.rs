use crate::{
    models::{Meeting, NewMeeting, Participant},
    store::{EnrollerStore, MeetingQuery, MeetingSort, MeetingSortField, SortDirection},
    utils::error::AppError,
};

/// Maps the `sortMode` query parameter to an ordering. Unknown modes give
/// `None`, i.e. unspecified order.
pub fn parse_sort_mode(sort_mode: &str) -> Option<MeetingSort> {
    let (field, direction) = match sort_mode {
        "title" => (MeetingSortField::Title, SortDirection::Asc),
        "titleDesc" => (MeetingSortField::Title, SortDirection::Desc),
        "date" => (MeetingSortField::Date, SortDirection::Asc),
        "dateDesc" => (MeetingSortField::Date, SortDirection::Desc),
        _ => return None,
    };
    Some(MeetingSort { field, direction })
}

pub fn meeting_query(
    title: &str,
    description: &str,
    participant: Option<&Participant>,
    sort_mode: &str,
) -> MeetingQuery {
    MeetingQuery {
        title_contains: (!title.is_empty()).then(|| title.to_string()),
        description_contains: (!description.is_empty()).then(|| description.to_string()),
        participant: participant.map(|p| p.login.clone()),
        sort: parse_sort_mode(sort_mode),
    }
}

/// Read-only listing. No match is an empty list, not an error.
pub async fn find_meetings(
    store: &dyn EnrollerStore,
    title: &str,
    description: &str,
    participant: Option<&Participant>,
    sort_mode: &str,
) -> Result<Vec<Meeting>, AppError> {
    store
        .list_meetings(&meeting_query(title, description, participant, sort_mode))
        .await
}

/// True iff a meeting with the same title and the same date exists.
///
/// Only a pre-create guard: concurrent creates can both pass it, and
/// updates are not checked against it.
pub async fn already_exist(store: &dyn EnrollerStore, meeting: &NewMeeting) -> Result<bool, AppError> {
    store.meeting_exists(&meeting.title, meeting.date).await
}

/// Persists a new meeting. Callers run `already_exist` first.
pub async fn add(store: &dyn EnrollerStore, meeting: NewMeeting) -> Result<Meeting, AppError> {
    store.insert_meeting(meeting).await
}

pub async fn find_by_id(store: &dyn EnrollerStore, id: i64) -> Result<Option<Meeting>, AppError> {
    store.find_meeting(id).await
}

/// Writes the meeting exactly as given, participant set included.
pub async fn update(store: &dyn EnrollerStore, meeting: &Meeting) -> Result<(), AppError> {
    if !store.replace_meeting(meeting).await? {
        return Err(AppError::NotFound(format!("Meeting {} not found", meeting.id)));
    }
    Ok(())
}

/// Removes the meeting and its enrolments. Participant accounts stay.
pub async fn delete(store: &dyn EnrollerStore, meeting: &Meeting) -> Result<(), AppError> {
    if !store.delete_meeting(meeting.id).await? {
        return Err(AppError::NotFound(format!("Meeting {} not found", meeting.id)));
    }
    Ok(())
}
