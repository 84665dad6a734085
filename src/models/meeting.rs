use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Participant;
use crate::utils::error::AppError;

/// Reunião. O `id` é atribuído pelo servidor.
///
/// The meeting owns the association with its participants: enrolment only
/// ever mutates this set, and the set never holds the same login twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Meeting {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[schema(value_type = String, example = "2024-01-01")]
    pub date: NaiveDate,
    /// Login of the participant who created the meeting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl Meeting {
    pub fn from_new(id: i64, new: NewMeeting) -> Self {
        Meeting {
            id,
            title: new.title,
            description: new.description,
            date: new.date,
            owner: new.owner,
            participants: Vec::new(),
        }
    }

    pub fn has_participant(&self, login: &str) -> bool {
        self.participants.iter().any(|p| p.login == login)
    }

    /// Returns false when the participant was already enrolled.
    pub fn add_participant(&mut self, participant: Participant) -> bool {
        if self.has_participant(&participant.login) {
            return false;
        }
        self.participants.push(participant);
        true
    }

    /// Returns false when nobody with that login was enrolled.
    pub fn remove_participant(&mut self, login: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p.login != login);
        self.participants.len() != before
    }

    pub fn participant_logins(&self) -> Vec<String> {
        self.participants.iter().map(|p| p.login.clone()).collect()
    }
}

/// Request para criar reunião
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewMeeting {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = String, example = "2024-01-01")]
    pub date: NaiveDate,
    #[serde(default)]
    pub owner: Option<String>,
}

impl NewMeeting {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::BadRequest("Meeting title is required".to_string()));
        }
        Ok(())
    }
}

/// Request para atualizar reunião. `None` (campo ausente ou null) mantém o valor atual.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct UpdateMeetingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "2024-01-01")]
    pub date: Option<NaiveDate>,
}

impl UpdateMeetingRequest {
    /// Participants are deliberately out of reach of this merge.
    pub fn apply_to(&self, meeting: &mut Meeting) {
        if let Some(title) = &self.title {
            meeting.title = title.clone();
        }
        if let Some(description) = &self.description {
            meeting.description = description.clone();
        }
        if let Some(date) = self.date {
            meeting.date = date;
        }
    }
}

/// Corpo de `POST /meetings/{id}/participants`
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct EnrollRequest {
    pub login: Option<String>,
}
