use std::cmp::Ordering;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::{
    EnrollerStore, MeetingQuery, MeetingSortField, ParticipantQuery, SortDirection,
};
use crate::models::{Meeting, NewMeeting, Participant};
use crate::utils::error::AppError;

/// Meeting row as stored: enrolments are logins, resolved on read.
#[derive(Debug, Clone)]
struct StoredMeeting {
    id: i64,
    title: String,
    description: String,
    date: NaiveDate,
    owner: Option<String>,
    participants: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    participants: BTreeMap<String, Participant>,
    meetings: BTreeMap<i64, StoredMeeting>,
    last_meeting_id: i64,
}

impl State {
    fn resolve(&self, stored: &StoredMeeting) -> Meeting {
        Meeting {
            id: stored.id,
            title: stored.title.clone(),
            description: stored.description.clone(),
            date: stored.date,
            owner: stored.owner.clone(),
            participants: stored
                .participants
                .iter()
                .filter_map(|login| self.participants.get(login).cloned())
                .collect(),
        }
    }
}

/// In-memory store used by the test suite.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl EnrollerStore for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find_participant(&self, login: &str) -> Result<Option<Participant>, AppError> {
        Ok(self.state.read().await.participants.get(login).cloned())
    }

    async fn list_participants(&self, query: &ParticipantQuery) -> Result<Vec<Participant>, AppError> {
        let state = self.state.read().await;
        let mut found: Vec<Participant> = state
            .participants
            .values()
            .filter(|p| match &query.login_contains {
                Some(key) => p.login.contains(key.as_str()),
                None => true,
            })
            .cloned()
            .collect();

        if let Some(direction) = query.sort {
            found.sort_by(|a, b| directed(a.login.cmp(&b.login), direction));
        }
        Ok(found)
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<(), AppError> {
        let mut state = self.state.write().await;
        if state.participants.contains_key(&participant.login) {
            return Err(AppError::Conflict(format!(
                "Participant with login {} already exists",
                participant.login
            )));
        }
        state
            .participants
            .insert(participant.login.clone(), participant.clone());
        Ok(())
    }

    async fn replace_participant(&self, participant: &Participant) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.participants.get_mut(&participant.login) {
            Some(existing) => {
                *existing = participant.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_participant(&self, login: &str) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        if state.participants.remove(login).is_none() {
            return Ok(false);
        }
        for meeting in state.meetings.values_mut() {
            meeting.participants.retain(|l| l != login);
        }
        Ok(true)
    }

    async fn find_meeting(&self, id: i64) -> Result<Option<Meeting>, AppError> {
        let state = self.state.read().await;
        Ok(state.meetings.get(&id).map(|m| state.resolve(m)))
    }

    async fn list_meetings(&self, query: &MeetingQuery) -> Result<Vec<Meeting>, AppError> {
        let state = self.state.read().await;
        let mut found: Vec<&StoredMeeting> = state
            .meetings
            .values()
            .filter(|m| {
                query
                    .title_contains
                    .as_deref()
                    .map_or(true, |t| m.title.contains(t))
                    && query
                        .description_contains
                        .as_deref()
                        .map_or(true, |d| m.description.contains(d))
                    && query
                        .participant
                        .as_deref()
                        .map_or(true, |login| m.participants.iter().any(|l| l == login))
            })
            .collect();

        if let Some(sort) = query.sort {
            found.sort_by(|a, b| {
                let ordering = match sort.field {
                    MeetingSortField::Title => a.title.cmp(&b.title),
                    MeetingSortField::Date => a.date.cmp(&b.date),
                };
                directed(ordering, sort.direction)
            });
        }
        Ok(found.into_iter().map(|m| state.resolve(m)).collect())
    }

    async fn meeting_exists(&self, title: &str, date: NaiveDate) -> Result<bool, AppError> {
        let state = self.state.read().await;
        Ok(state
            .meetings
            .values()
            .any(|m| m.title == title && m.date == date))
    }

    async fn insert_meeting(&self, meeting: NewMeeting) -> Result<Meeting, AppError> {
        let mut state = self.state.write().await;
        state.last_meeting_id += 1;
        let id = state.last_meeting_id;
        let stored = StoredMeeting {
            id,
            title: meeting.title,
            description: meeting.description,
            date: meeting.date,
            owner: meeting.owner,
            participants: Vec::new(),
        };
        let created = state.resolve(&stored);
        state.meetings.insert(id, stored);
        Ok(created)
    }

    async fn replace_meeting(&self, meeting: &Meeting) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.meetings.get_mut(&meeting.id) {
            Some(stored) => {
                stored.title = meeting.title.clone();
                stored.description = meeting.description.clone();
                stored.date = meeting.date;
                stored.owner = meeting.owner.clone();
                stored.participants = meeting.participant_logins();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_meeting(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.state.write().await.meetings.remove(&id).is_some())
    }
}
