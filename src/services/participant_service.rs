use crate::{
    models::Participant,
    store::{EnrollerStore, ParticipantQuery, SortDirection},
    utils::{error::AppError, password::hash_password},
};

/// Builds the participant listing query from raw request parameters.
///
/// - `key`: literal substring of the login, empty means no filter
/// - `sort_by`: only `"login"` sorts, anything else leaves the order unspecified
/// - `sort_order`: `"DESC"` reverses, anything else sorts ascending
pub fn participant_query(sort_by: &str, sort_order: &str, key: &str) -> ParticipantQuery {
    let sort = if sort_by == "login" {
        match sort_order {
            "DESC" => Some(SortDirection::Desc),
            _ => Some(SortDirection::Asc),
        }
    } else {
        None
    };

    ParticipantQuery {
        login_contains: (!key.is_empty()).then(|| key.to_string()),
        sort,
    }
}

pub async fn get_all(
    store: &dyn EnrollerStore,
    sort_by: &str,
    sort_order: &str,
    key: &str,
) -> Result<Vec<Participant>, AppError> {
    store
        .list_participants(&participant_query(sort_by, sort_order, key))
        .await
}

pub async fn find_by_login(
    store: &dyn EnrollerStore,
    login: &str,
) -> Result<Option<Participant>, AppError> {
    store.find_participant(login).await
}

/// Hashes the plaintext password and persists the participant. The returned
/// participant carries the hash.
pub async fn add(
    store: &dyn EnrollerStore,
    mut participant: Participant,
    cost: u32,
) -> Result<Participant, AppError> {
    participant.password = hash_password(&participant.password, cost).await?;
    store.insert_participant(&participant).await?;
    Ok(participant)
}

pub async fn update(store: &dyn EnrollerStore, participant: &Participant) -> Result<(), AppError> {
    if !store.replace_participant(participant).await? {
        return Err(AppError::NotFound(format!(
            "Participant {} not found",
            participant.login
        )));
    }
    Ok(())
}

pub async fn delete(store: &dyn EnrollerStore, participant: &Participant) -> Result<(), AppError> {
    if !store.delete_participant(&participant.login).await? {
        return Err(AppError::NotFound(format!(
            "Participant {} not found",
            participant.login
        )));
    }
    Ok(())
}
