// Implementação do EnrollerStore sobre MongoDB.
//
// participants: { _id: login, password, first_name, last_name, email }
// meetings:     { _id: i64, title, description, date: "YYYY-MM-DD", owner, participants: [login] }
// counters:     { _id: "meetings", seq }

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::ReturnDocument;
use mongodb::Collection;
use serde::{Deserialize, Serialize};

use super::{MongoDB, COUNTERS, MEETINGS, PARTICIPANTS};
use crate::models::{Meeting, NewMeeting, Participant};
use crate::store::{
    EnrollerStore, MeetingQuery, MeetingSortField, ParticipantQuery, SortDirection,
};
use crate::utils::error::AppError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DUPLICATE_KEY: i32 = 11000;

#[derive(Debug, Serialize, Deserialize)]
struct ParticipantDocument {
    #[serde(rename = "_id")]
    login: String,
    password: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
}

impl From<&Participant> for ParticipantDocument {
    fn from(p: &Participant) -> Self {
        ParticipantDocument {
            login: p.login.clone(),
            password: p.password.clone(),
            first_name: p.first_name.clone(),
            last_name: p.last_name.clone(),
            email: p.email.clone(),
        }
    }
}

impl From<ParticipantDocument> for Participant {
    fn from(d: ParticipantDocument) -> Self {
        Participant {
            login: d.login,
            password: d.password,
            first_name: d.first_name,
            last_name: d.last_name,
            email: d.email,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MeetingDocument {
    #[serde(rename = "_id")]
    id: i64,
    title: String,
    #[serde(default)]
    description: String,
    date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner: Option<String>,
    #[serde(default)]
    participants: Vec<String>,
}

impl From<&Meeting> for MeetingDocument {
    fn from(m: &Meeting) -> Self {
        MeetingDocument {
            id: m.id,
            title: m.title.clone(),
            description: m.description.clone(),
            date: format_date(m.date),
            owner: m.owner.clone(),
            participants: m.participant_logins(),
        }
    }
}

impl MeetingDocument {
    fn into_meeting(self, known: &HashMap<String, Participant>) -> Result<Meeting, AppError> {
        let date = NaiveDate::parse_from_str(&self.date, DATE_FORMAT).map_err(|e| {
            AppError::DatabaseError(format!("Meeting {} has invalid date {}: {}", self.id, self.date, e))
        })?;

        Ok(Meeting {
            id: self.id,
            title: self.title,
            description: self.description,
            date,
            owner: self.owner,
            // Dangling logins are dropped rather than surfaced as null entries
            participants: self
                .participants
                .iter()
                .filter_map(|login| known.get(login).cloned())
                .collect(),
        })
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Literal-substring pattern for `$regex`. The server rejects patterns with an
/// embedded NUL, so that one is spelled as a PCRE `\x00` escape.
fn literal_pattern(input: &str) -> String {
    regex::escape(input).replace('\0', "\\x00")
}

fn direction_value(direction: SortDirection) -> i32 {
    match direction {
        SortDirection::Asc => 1,
        SortDirection::Desc => -1,
    }
}

fn participant_filter(query: &ParticipantQuery) -> Document {
    let mut filter = Document::new();
    if let Some(key) = &query.login_contains {
        filter.insert("_id", doc! { "$regex": literal_pattern(key) });
    }
    filter
}

fn participant_sort(query: &ParticipantQuery) -> Option<Document> {
    query.sort.map(|direction| doc! { "_id": direction_value(direction) })
}

fn meeting_filter(query: &MeetingQuery) -> Document {
    let mut filter = Document::new();
    if let Some(title) = &query.title_contains {
        filter.insert("title", doc! { "$regex": literal_pattern(title) });
    }
    if let Some(description) = &query.description_contains {
        filter.insert("description", doc! { "$regex": literal_pattern(description) });
    }
    if let Some(login) = &query.participant {
        filter.insert("participants", login.as_str());
    }
    filter
}

fn meeting_sort(query: &MeetingQuery) -> Option<Document> {
    query.sort.map(|sort| {
        let field = match sort.field {
            MeetingSortField::Title => "title",
            MeetingSortField::Date => "date",
        };
        let mut order = Document::new();
        order.insert(field, direction_value(sort.direction));
        order
    })
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

impl MongoDB {
    fn participants(&self) -> Collection<ParticipantDocument> {
        self.collection(PARTICIPANTS)
    }

    fn meetings(&self) -> Collection<MeetingDocument> {
        self.collection(MEETINGS)
    }

    async fn next_meeting_id(&self) -> Result<i64, AppError> {
        let counter = self
            .collection::<Document>(COUNTERS)
            .find_one_and_update(doc! { "_id": MEETINGS }, doc! { "$inc": { "seq": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| AppError::DatabaseError("Meeting id counter missing".to_string()))?;

        counter
            .get_i64("seq")
            .map_err(|e| AppError::DatabaseError(format!("Invalid meeting id counter: {}", e)))
    }

    /// Loads every participant referenced by the given meetings in one query.
    async fn resolve_participants(
        &self,
        meetings: &[MeetingDocument],
    ) -> Result<HashMap<String, Participant>, AppError> {
        let logins: Vec<String> = meetings
            .iter()
            .flat_map(|m| m.participants.iter().cloned())
            .collect();

        if logins.is_empty() {
            return Ok(HashMap::new());
        }

        let found: Vec<ParticipantDocument> = self
            .participants()
            .find(doc! { "_id": { "$in": logins } })
            .await?
            .try_collect()
            .await?;

        Ok(found
            .into_iter()
            .map(|d| (d.login.clone(), Participant::from(d)))
            .collect())
    }

    async fn resolve_meetings(&self, documents: Vec<MeetingDocument>) -> Result<Vec<Meeting>, AppError> {
        let known = self.resolve_participants(&documents).await?;
        documents
            .into_iter()
            .map(|d| d.into_meeting(&known))
            .collect()
    }
}

#[async_trait]
impl EnrollerStore for MongoDB {
    async fn ping(&self) -> Result<(), AppError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn find_participant(&self, login: &str) -> Result<Option<Participant>, AppError> {
        let found = self.participants().find_one(doc! { "_id": login }).await?;
        Ok(found.map(Participant::from))
    }

    async fn list_participants(&self, query: &ParticipantQuery) -> Result<Vec<Participant>, AppError> {
        let participants = self.participants();
        let mut find = participants.find(participant_filter(query));
        if let Some(sort) = participant_sort(query) {
            find = find.sort(sort);
        }

        let found: Vec<ParticipantDocument> = find.await?.try_collect().await?;
        Ok(found.into_iter().map(Participant::from).collect())
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<(), AppError> {
        match self
            .participants()
            .insert_one(ParticipantDocument::from(participant))
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(AppError::Conflict(format!(
                "Participant with login {} already exists",
                participant.login
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn replace_participant(&self, participant: &Participant) -> Result<bool, AppError> {
        let result = self
            .participants()
            .replace_one(
                doc! { "_id": participant.login.as_str() },
                ParticipantDocument::from(participant),
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_participant(&self, login: &str) -> Result<bool, AppError> {
        if !self.supports_transactions() {
            // Standalone server: no transactions, pull then delete.
            self.meetings()
                .update_many(
                    doc! { "participants": login },
                    doc! { "$pull": { "participants": login } },
                )
                .await?;
            let result = self.participants().delete_one(doc! { "_id": login }).await?;
            return Ok(result.deleted_count > 0);
        }

        // Dropping the session without commit aborts the transaction.
        let mut session = self.client().start_session().await?;
        session.start_transaction().await?;

        self.meetings()
            .update_many(
                doc! { "participants": login },
                doc! { "$pull": { "participants": login } },
            )
            .session(&mut session)
            .await?;

        let result = self
            .participants()
            .delete_one(doc! { "_id": login })
            .session(&mut session)
            .await?;

        session.commit_transaction().await?;
        Ok(result.deleted_count > 0)
    }

    async fn find_meeting(&self, id: i64) -> Result<Option<Meeting>, AppError> {
        match self.meetings().find_one(doc! { "_id": id }).await? {
            Some(document) => {
                let mut meetings = self.resolve_meetings(vec![document]).await?;
                Ok(meetings.pop())
            }
            None => Ok(None),
        }
    }

    async fn list_meetings(&self, query: &MeetingQuery) -> Result<Vec<Meeting>, AppError> {
        let meetings = self.meetings();
        let mut find = meetings.find(meeting_filter(query));
        if let Some(sort) = meeting_sort(query) {
            find = find.sort(sort);
        }

        let documents: Vec<MeetingDocument> = find.await?.try_collect().await?;
        self.resolve_meetings(documents).await
    }

    async fn meeting_exists(&self, title: &str, date: NaiveDate) -> Result<bool, AppError> {
        let found = self
            .meetings()
            .find_one(doc! { "title": title, "date": format_date(date) })
            .await?;
        Ok(found.is_some())
    }

    async fn insert_meeting(&self, meeting: NewMeeting) -> Result<Meeting, AppError> {
        let id = self.next_meeting_id().await?;
        let created = Meeting::from_new(id, meeting);

        self.meetings()
            .insert_one(MeetingDocument::from(&created))
            .await?;
        Ok(created)
    }

    async fn replace_meeting(&self, meeting: &Meeting) -> Result<bool, AppError> {
        let result = self
            .meetings()
            .replace_one(doc! { "_id": meeting.id }, MeetingDocument::from(meeting))
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_meeting(&self, id: i64) -> Result<bool, AppError> {
        let result = self.meetings().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MeetingSort;

    #[test]
    fn test_literal_pattern_escapes_metacharacters() {
        assert_eq!(literal_pattern("ana"), "ana");
        assert_eq!(literal_pattern(".*"), "\\.\\*");
        assert_eq!(literal_pattern("a$|b"), "a\\$\\|b");
        assert_eq!(literal_pattern("(x)[y]{2}"), "\\(x\\)\\[y\\]\\{2\\}");
        assert_eq!(literal_pattern("c:\\"), "c:\\\\");
        assert_eq!(literal_pattern("a#b~"), "a\\#b\\~");
    }

    #[test]
    fn test_literal_pattern_spells_nul_as_escape() {
        let pattern = literal_pattern("a\0b");
        assert_eq!(pattern, "a\\x00b");
        assert!(!pattern.contains('\0'));
    }

    #[test]
    fn test_participant_filter_without_key_matches_all() {
        let query = ParticipantQuery::default();
        assert_eq!(participant_filter(&query), Document::new());
        assert_eq!(participant_sort(&query), None);
    }

    #[test]
    fn test_participant_filter_binds_key_as_literal() {
        let query = ParticipantQuery {
            login_contains: Some("' OR '1'='1".to_string()),
            sort: Some(SortDirection::Desc),
        };
        assert_eq!(
            participant_filter(&query),
            doc! { "_id": { "$regex": "' OR '1'='1" } }
        );
        assert_eq!(participant_sort(&query), Some(doc! { "_id": -1 }));
    }

    #[test]
    fn test_meeting_filter_combines_criteria() {
        let query = MeetingQuery {
            title_contains: Some("Sync".to_string()),
            description_contains: Some("v1.0".to_string()),
            participant: Some("ana".to_string()),
            sort: Some(MeetingSort {
                field: MeetingSortField::Date,
                direction: SortDirection::Asc,
            }),
        };
        assert_eq!(
            meeting_filter(&query),
            doc! {
                "title": { "$regex": "Sync" },
                "description": { "$regex": "v1\\.0" },
                "participants": "ana",
            }
        );
        assert_eq!(meeting_sort(&query), Some(doc! { "date": 1 }));
    }

    #[test]
    fn test_meeting_document_round_trip() {
        let ana = Participant {
            login: "ana".into(),
            password: "hash".into(),
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            email: "ana@example.com".into(),
        };
        let meeting = Meeting {
            id: 7,
            title: "Sync".into(),
            description: String::new(),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            owner: Some("ana".into()),
            participants: vec![ana.clone()],
        };

        let document = MeetingDocument::from(&meeting);
        assert_eq!(document.date, "2024-01-01");
        assert_eq!(document.participants, vec!["ana".to_string()]);

        let known = HashMap::from([("ana".to_string(), ana)]);
        assert_eq!(document.into_meeting(&known).unwrap(), meeting);
    }

    #[test]
    fn test_dangling_login_is_dropped() {
        let document = MeetingDocument {
            id: 1,
            title: "Sync".into(),
            description: String::new(),
            date: "2024-01-01".into(),
            owner: None,
            participants: vec!["ghost".into()],
        };
        let meeting = document.into_meeting(&HashMap::new()).unwrap();
        assert!(meeting.participants.is_empty());
    }

    // Live tests: each one owns a scratch database named after it.

    async fn live_db(name: &str) -> MongoDB {
        dotenv::dotenv().ok();

        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let mut options = mongodb::options::ClientOptions::parse(&uri).await.unwrap();
        options.default_database = Some(format!("enroller_test_{}", name));

        let db = MongoDB::connect(options).await.unwrap();
        db.db.drop().await.unwrap();
        db
    }

    fn participant(login: &str) -> Participant {
        Participant {
            login: login.to_string(),
            password: "hash".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: format!("{}@example.com", login),
        }
    }

    fn new_meeting(title: &str, date: &str) -> NewMeeting {
        NewMeeting {
            title: title.to_string(),
            description: String::new(),
            date: NaiveDate::parse_from_str(date, DATE_FORMAT).unwrap(),
            owner: None,
        }
    }

    fn logins(found: &[Participant]) -> Vec<&str> {
        found.iter().map(|p| p.login.as_str()).collect()
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_live_meeting_ids_come_from_counter() {
        let db = live_db("meeting_ids").await;
        db.ping().await.unwrap();

        let first = db.insert_meeting(new_meeting("Sync", "2024-01-01")).await.unwrap();
        let second = db.insert_meeting(new_meeting("Retro", "2024-01-02")).await.unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let found = db.find_meeting(2).await.unwrap().unwrap();
        assert_eq!(found.title, "Retro");
        assert!(db.find_meeting(3).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_live_duplicate_login_conflicts() {
        let db = live_db("duplicate_login").await;

        db.insert_participant(&participant("ana")).await.unwrap();
        let result = db.insert_participant(&participant("ana")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_live_delete_participant_pulls_enrolment() {
        let db = live_db("delete_participant").await;
        let ana = participant("ana");
        let bob = participant("bob");
        db.insert_participant(&ana).await.unwrap();
        db.insert_participant(&bob).await.unwrap();

        let mut sync = db.insert_meeting(new_meeting("Sync", "2024-01-01")).await.unwrap();
        sync.add_participant(ana);
        sync.add_participant(bob.clone());
        assert!(db.replace_meeting(&sync).await.unwrap());

        assert!(db.delete_participant("ana").await.unwrap());
        assert!(!db.delete_participant("ana").await.unwrap());
        assert!(db.find_participant("ana").await.unwrap().is_none());

        let stored = db
            .collection::<MeetingDocument>(MEETINGS)
            .find_one(doc! { "_id": sync.id })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.participants, vec!["bob".to_string()]);

        let sync = db.find_meeting(sync.id).await.unwrap().unwrap();
        assert_eq!(sync.participants, vec![bob]);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_live_login_filter_is_literal_and_case_sensitive() {
        let db = live_db("login_filter").await;
        for login in ["abc", "ABC", "a.c", "x(y"] {
            db.insert_participant(&participant(login)).await.unwrap();
        }

        let query = |key: &str| ParticipantQuery {
            login_contains: Some(key.to_string()),
            sort: Some(SortDirection::Asc),
        };

        let found = db.list_participants(&query(".")).await.unwrap();
        assert_eq!(logins(&found), vec!["a.c"]);

        let found = db.list_participants(&query("b")).await.unwrap();
        assert_eq!(logins(&found), vec!["abc"]);

        let found = db.list_participants(&query("(")).await.unwrap();
        assert_eq!(logins(&found), vec!["x(y"]);

        let found = db.list_participants(&query("\0")).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_live_meeting_filters_and_date_sort() {
        let db = live_db("meeting_filters").await;
        db.insert_meeting(new_meeting("Sync (v2)", "2024-03-01")).await.unwrap();
        db.insert_meeting(new_meeting("Sync v2", "2023-12-31")).await.unwrap();
        db.insert_meeting(new_meeting("sync", "2024-01-15")).await.unwrap();

        let query = |title: &str, direction: SortDirection| MeetingQuery {
            title_contains: Some(title.to_string()),
            sort: Some(MeetingSort {
                field: MeetingSortField::Date,
                direction,
            }),
            ..MeetingQuery::default()
        };

        let found = db.list_meetings(&query("Sync", SortDirection::Asc)).await.unwrap();
        let titles: Vec<&str> = found.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Sync v2", "Sync (v2)"]);

        let found = db.list_meetings(&query("ync", SortDirection::Desc)).await.unwrap();
        let titles: Vec<&str> = found.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Sync (v2)", "sync", "Sync v2"]);

        let found = db.list_meetings(&query("(v2)", SortDirection::Asc)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Sync (v2)");

        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert!(db.meeting_exists("sync", date).await.unwrap());
        assert!(!db.meeting_exists("Sync", date).await.unwrap());
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_live_dangling_login_is_skipped() {
        let db = live_db("dangling_login").await;
        let ana = participant("ana");
        db.insert_participant(&ana).await.unwrap();
        db.collection::<Document>(MEETINGS)
            .insert_one(doc! {
                "_id": 99_i64,
                "title": "Sync",
                "description": "",
                "date": "2024-01-01",
                "participants": ["ghost", "ana"],
            })
            .await
            .unwrap();

        let sync = db.find_meeting(99).await.unwrap().unwrap();
        assert_eq!(sync.participants, vec![ana]);

        let query = MeetingQuery {
            participant: Some("ghost".to_string()),
            ..MeetingQuery::default()
        };
        let found = db.list_meetings(&query).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].participant_logins(), vec!["ana".to_string()]);
    }
}
