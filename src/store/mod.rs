//! Persistence seam between the services and the database.
//!
//! Services build typed queries here; implementations decide how to run
//! them. Every mutating call is a single unit of work: it either fully
//! applies or leaves the store untouched.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::models::{Meeting, NewMeeting, Participant};
use crate::utils::error::AppError;

#[cfg(test)]
pub mod memory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Filtro da listagem de participantes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantQuery {
    /// Literal substring of the login, never pattern syntax
    pub login_contains: Option<String>,
    /// Ordering by login; `None` leaves the order unspecified
    pub sort: Option<SortDirection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingSortField {
    Title,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingSort {
    pub field: MeetingSortField,
    pub direction: SortDirection,
}

/// Filtro da listagem de reuniões. All present criteria must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingQuery {
    pub title_contains: Option<String>,
    pub description_contains: Option<String>,
    /// Login of a participant that must be enrolled
    pub participant: Option<String>,
    pub sort: Option<MeetingSort>,
}

#[async_trait]
pub trait EnrollerStore: Send + Sync {
    /// Round trip to the backing store, used by the health check.
    async fn ping(&self) -> Result<(), AppError>;

    async fn find_participant(&self, login: &str) -> Result<Option<Participant>, AppError>;

    async fn list_participants(&self, query: &ParticipantQuery) -> Result<Vec<Participant>, AppError>;

    /// Fails with `AppError::Conflict` when the login is taken.
    async fn insert_participant(&self, participant: &Participant) -> Result<(), AppError>;

    /// Returns false when no participant has that login.
    async fn replace_participant(&self, participant: &Participant) -> Result<bool, AppError>;

    /// Removes the participant and its enrolments. Meetings stay.
    async fn delete_participant(&self, login: &str) -> Result<bool, AppError>;

    async fn find_meeting(&self, id: i64) -> Result<Option<Meeting>, AppError>;

    async fn list_meetings(&self, query: &MeetingQuery) -> Result<Vec<Meeting>, AppError>;

    async fn meeting_exists(&self, title: &str, date: NaiveDate) -> Result<bool, AppError>;

    /// Assigns the id and persists an empty participant set.
    async fn insert_meeting(&self, meeting: NewMeeting) -> Result<Meeting, AppError>;

    /// Writes every field, the participant set included. Returns false when
    /// the id is unknown.
    async fn replace_meeting(&self, meeting: &Meeting) -> Result<bool, AppError>;

    /// Removes the meeting and its enrolments, never the participants.
    async fn delete_meeting(&self, id: i64) -> Result<bool, AppError>;
}
