use crate::domain::entities::recurrence::{RecurrenceKind, RecurrencePattern};
use crate::domain::repositories::event_repository::{EventRepository, RepositoryError, Result};
use crate::domain::value_objects::weekday_format::WeekdayFormat;
use crate::domain::{
    Community, CommunityMember, CreatedEvent, Event, EventTheme, MemberRole, NewEventRecord,
    OccurrenceRecord, Participant, ParticipantRole,
};
use crate::infrastructure::database::connection::DatabaseManager;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

const EVENT_COLUMNS: &str = "id, creator_id, title, description, location, theme, starts_at, \
    ends_at, timezone, repeat_kind, repeat_interval, repeat_weekdays, repeat_end_date, \
    parent_event_id, community_id, created_at";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteEventRepository {
    db: DatabaseManager,
}

impl SqliteEventRepository {
    /// Wraps an already initialized database
    pub fn new(db: DatabaseManager) -> Self {
        Self { db }
    }
}

/// Borrowed view of the columns written for one event row
struct EventInsert<'a> {
    creator_id: u64,
    title: &'a str,
    description: Option<&'a str>,
    location: Option<&'a str>,
    theme: EventTheme,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    timezone: &'a str,
    recurrence: Option<&'a RecurrencePattern>,
    parent_event_id: Option<u64>,
    community_id: Option<u64>,
}

/// Scalar columns persisted for a recurrence: kind, interval, weekday ids (JSON) and end date
type RecurrenceColumns = (String, i64, String, Option<String>);

fn recurrence_columns(pattern: &RecurrencePattern) -> Result<RecurrenceColumns> {
    let weekday_ids: Vec<u8> = pattern.weekdays().iter().map(|d| d.to_form_id()).collect();
    let weekdays_json = serde_json::to_string(&weekday_ids)
        .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;

    Ok((
        pattern.kind().as_str().to_string(),
        i64::from(pattern.interval()),
        weekdays_json,
        pattern.end_date().map(|d| d.format(DATE_FORMAT).to_string()),
    ))
}

/// Inserts one event row; returns the new id, or `None` when `ignore_duplicates`
/// is set and the row already existed.
fn insert_event(
    conn: &Connection,
    row: &EventInsert<'_>,
    created_at: DateTime<Utc>,
    ignore_duplicates: bool,
) -> anyhow::Result<Option<u64>> {
    let (kind, interval, weekdays, end_date) = match row.recurrence {
        Some(pattern) => {
            let (kind, interval, weekdays, end_date) = recurrence_columns(pattern)?;
            (Some(kind), Some(interval), Some(weekdays), end_date)
        }
        None => (None, None, None, None),
    };

    let verb = if ignore_duplicates {
        "INSERT OR IGNORE"
    } else {
        "INSERT"
    };
    let inserted = conn.execute(
        &format!(
            "{verb} INTO events (
                creator_id, title, description, location, theme, starts_at, ends_at,
                timezone, repeat_kind, repeat_interval, repeat_weekdays, repeat_end_date,
                parent_event_id, community_id, created_at
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            row.creator_id as i64,
            row.title,
            row.description,
            row.location,
            row.theme.as_str(),
            row.starts_at.timestamp(),
            row.ends_at.map(|dt| dt.timestamp()),
            row.timezone,
            kind,
            interval,
            weekdays,
            end_date,
            row.parent_event_id.map(|v| v as i64),
            row.community_id.map(|v| v as i64),
            created_at.timestamp(),
        ],
    )?;

    Ok((inserted > 0).then(|| conn.last_insert_rowid() as u64))
}

fn insert_participant(
    conn: &Connection,
    event_id: u64,
    user_id: u64,
    role: ParticipantRole,
    joined_at: DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO event_participants (event_id, user_id, role, joined_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![event_id as i64, user_id as i64, role.as_str(), joined_at.timestamp()],
    )?;
    Ok(inserted > 0)
}

fn conversion_error(
    column: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, err.into())
}

fn timestamp(column: usize, ts: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| conversion_error(column, format!("timestamp {} out of range", ts)))
}

// NOTE: column indexes follow EVENT_COLUMNS
fn row_to_event(row: &Row) -> rusqlite::Result<Event> {
    let id: i64 = row.get(0)?;
    let creator_id: i64 = row.get(1)?;
    let title: String = row.get(2)?;
    let description: Option<String> = row.get(3)?;
    let location: Option<String> = row.get(4)?;

    let theme_str: String = row.get(5)?;
    let theme = EventTheme::parse(&theme_str)
        .ok_or_else(|| conversion_error(5, format!("unknown theme '{}'", theme_str)))?;

    let starts_at = timestamp(6, row.get(6)?)?;
    let ends_at = row
        .get::<_, Option<i64>>(7)?
        .map(|ts| timestamp(7, ts))
        .transpose()?;

    let timezone: String = row.get(8)?;
    let tz: Tz = timezone
        .parse()
        .map_err(|_| conversion_error(8, format!("unknown timezone '{}'", timezone)))?;

    // the anchor of a stored pattern is the local start date
    let anchor = starts_at.with_timezone(&tz).date_naive();
    let recurrence = match row.get::<_, Option<String>>(9)? {
        Some(kind_str) => {
            let kind = RecurrenceKind::parse(&kind_str)
                .ok_or_else(|| conversion_error(9, format!("unknown repeat kind '{}'", kind_str)))?;
            let interval: Option<i64> = row.get(10)?;
            let weekdays_json: Option<String> = row.get(11)?;
            let end_date: Option<String> = row.get(12)?;

            let weekday_ids: Vec<u8> = match weekdays_json {
                Some(json) => serde_json::from_str(&json).map_err(|e| conversion_error(11, e))?,
                None => Vec::new(),
            };
            let weekdays = weekday_ids
                .into_iter()
                .map(|id| {
                    Weekday::from_form_id(id)
                        .ok_or_else(|| conversion_error(11, format!("invalid weekday id {}", id)))
                })
                .collect::<rusqlite::Result<Vec<Weekday>>>()?;
            let end_date = end_date
                .map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT))
                .transpose()
                .map_err(|e| conversion_error(12, e))?;

            Some(
                RecurrencePattern::new(anchor, kind)
                    .with_interval(u32::try_from(interval.unwrap_or(1)).unwrap_or(1))
                    .with_weekdays(weekdays)
                    .until(end_date),
            )
        }
        None => None,
    };

    let parent_event_id: Option<i64> = row.get(13)?;
    let community_id: Option<i64> = row.get(14)?;
    let created_at = timestamp(15, row.get(15)?)?;

    Ok(Event {
        id: id as u64,
        creator_id: creator_id as u64,
        title,
        description,
        location,
        theme,
        starts_at,
        ends_at,
        timezone,
        recurrence,
        parent_event_id: parent_event_id.map(|v| v as u64),
        community_id: community_id.map(|v| v as u64),
        created_at,
    })
}

fn query_event(conn: &Connection, event_id: u64) -> rusqlite::Result<Option<Event>> {
    conn.query_row(
        &format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"),
        params![event_id as i64],
        row_to_event,
    )
    .optional()
}

fn query_events(
    conn: &Connection,
    filter: &str,
    params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<Event>> {
    let mut stmt = conn.prepare(&format!("SELECT {EVENT_COLUMNS} FROM events {filter}"))?;
    let events = stmt.query_map(params, row_to_event)?;
    events.collect()
}

/// Maps errors coming out of `execute_blocking` onto repository errors.
/// Unique and primary key violations become `AlreadyExists`.
fn into_repository_error(err: anyhow::Error) -> RepositoryError {
    let err = match err.downcast::<RepositoryError>() {
        Ok(repository_error) => return repository_error,
        Err(other) => other,
    };

    if let Some(rusqlite::Error::SqliteFailure(failure, _)) = err.downcast_ref::<rusqlite::Error>()
    {
        if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        {
            return RepositoryError::AlreadyExists;
        }
    }

    RepositoryError::StorageError(format!("{:#}", err))
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn create_event(&self, record: NewEventRecord) -> Result<CreatedEvent> {
        self.db
            .execute_blocking(move |conn| {
                let tx = conn.transaction()?;
                let now = Utc::now();

                let event_id = insert_event(
                    &tx,
                    &EventInsert {
                        creator_id: record.creator_id,
                        title: &record.title,
                        description: record.description.as_deref(),
                        location: record.location.as_deref(),
                        theme: record.theme,
                        starts_at: record.starts_at,
                        ends_at: record.ends_at,
                        timezone: &record.timezone,
                        recurrence: record.recurrence.as_ref(),
                        parent_event_id: None,
                        community_id: None,
                    },
                    now,
                    false,
                )?
                .ok_or(RepositoryError::AlreadyExists)?;

                insert_participant(&tx, event_id, record.creator_id, ParticipantRole::Host, now)?;

                let community = match record.community {
                    Some(new_community) => {
                        tx.execute(
                            "INSERT INTO communities (name, description, created_by, created_at)
                             VALUES (?1, ?2, ?3, ?4)",
                            params![
                                new_community.name,
                                new_community.description,
                                record.creator_id as i64,
                                now.timestamp()
                            ],
                        )?;
                        let community_id = tx.last_insert_rowid() as u64;

                        tx.execute(
                            "INSERT INTO community_members (community_id, user_id, role)
                             VALUES (?1, ?2, ?3)",
                            params![
                                community_id as i64,
                                record.creator_id as i64,
                                MemberRole::Admin.as_str()
                            ],
                        )?;
                        tx.execute(
                            "UPDATE events SET community_id = ?2 WHERE id = ?1",
                            params![event_id as i64, community_id as i64],
                        )?;

                        Some(Community {
                            id: community_id,
                            name: new_community.name,
                            description: new_community.description,
                            created_by: record.creator_id,
                            created_at: timestamp(0, now.timestamp())?,
                        })
                    }
                    None => None,
                };

                let event = query_event(&tx, event_id)?.ok_or(RepositoryError::NotFound)?;
                tx.commit()?;

                debug!(event_id, community = community.is_some(), "Event row written");
                Ok(CreatedEvent { event, community })
            })
            .await
            .map_err(into_repository_error)
    }

    async fn get_event(&self, event_id: u64) -> Result<Option<Event>> {
        self.db
            .execute_blocking(move |conn| Ok(query_event(conn, event_id)?))
            .await
            .map_err(into_repository_error)
    }

    async fn list_events_from(&self, from: DateTime<Utc>, limit: usize) -> Result<Vec<Event>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.db
            .execute_blocking(move |conn| {
                Ok(query_events(
                    conn,
                    "WHERE starts_at >= ?1 ORDER BY starts_at, id LIMIT ?2",
                    params![from.timestamp(), limit],
                )?)
            })
            .await
            .map_err(into_repository_error)
    }

    async fn list_events(&self) -> Result<Vec<Event>> {
        self.db
            .execute_blocking(|conn| Ok(query_events(conn, "ORDER BY starts_at, id", [])?))
            .await
            .map_err(into_repository_error)
    }

    async fn add_participant(
        &self,
        event_id: u64,
        user_id: u64,
        role: ParticipantRole,
    ) -> Result<bool> {
        self.db
            .execute_blocking(move |conn| {
                let tx = conn.transaction()?;

                let community_id: Option<i64> = tx
                    .query_row(
                        "SELECT community_id FROM events WHERE id = ?1",
                        params![event_id as i64],
                        |row| row.get(0),
                    )
                    .optional()?
                    .ok_or(RepositoryError::NotFound)?;

                let joined = insert_participant(&tx, event_id, user_id, role, Utc::now())?;

                // guests of a community event become members of that community
                if let Some(community_id) = community_id {
                    tx.execute(
                        "INSERT OR IGNORE INTO community_members (community_id, user_id, role)
                         VALUES (?1, ?2, ?3)",
                        params![community_id, user_id as i64, MemberRole::Member.as_str()],
                    )?;
                }

                tx.commit()?;
                Ok(joined)
            })
            .await
            .map_err(into_repository_error)
    }

    async fn remove_participant(&self, event_id: u64, user_id: u64) -> Result<bool> {
        self.db
            .execute_blocking(move |conn| {
                let removed = conn.execute(
                    "DELETE FROM event_participants WHERE event_id = ?1 AND user_id = ?2",
                    params![event_id as i64, user_id as i64],
                )?;
                Ok(removed > 0)
            })
            .await
            .map_err(into_repository_error)
    }

    async fn participants(&self, event_id: u64) -> Result<Vec<Participant>> {
        self.db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT event_id, user_id, role, joined_at FROM event_participants
                     WHERE event_id = ?1 ORDER BY joined_at, user_id",
                )?;
                let rows = stmt.query_map(params![event_id as i64], |row| {
                    let role: String = row.get(2)?;
                    Ok(Participant {
                        event_id: row.get::<_, i64>(0)? as u64,
                        user_id: row.get::<_, i64>(1)? as u64,
                        role: ParticipantRole::parse(&role).ok_or_else(|| {
                            conversion_error(2, format!("unknown participant role '{}'", role))
                        })?,
                        joined_at: timestamp(3, row.get(3)?)?,
                    })
                })?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
            .map_err(into_repository_error)
    }

    async fn community_members(&self, community_id: u64) -> Result<Vec<CommunityMember>> {
        self.db
            .execute_blocking(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT community_id, user_id, role FROM community_members
                     WHERE community_id = ?1 ORDER BY user_id",
                )?;
                let rows = stmt.query_map(params![community_id as i64], |row| {
                    let role: String = row.get(2)?;
                    Ok(CommunityMember {
                        community_id: row.get::<_, i64>(0)? as u64,
                        user_id: row.get::<_, i64>(1)? as u64,
                        role: MemberRole::parse(&role).ok_or_else(|| {
                            conversion_error(2, format!("unknown member role '{}'", role))
                        })?,
                    })
                })?;
                Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
            })
            .await
            .map_err(into_repository_error)
    }

    async fn insert_occurrences(
        &self,
        parent: &Event,
        occurrences: Vec<OccurrenceRecord>,
    ) -> Result<Vec<Event>> {
        let parent = parent.clone();

        self.db
            .execute_blocking(move |conn| {
                let tx = conn.transaction()?;
                let now = Utc::now();
                let mut created = Vec::new();

                for occurrence in &occurrences {
                    let inserted = insert_event(
                        &tx,
                        &EventInsert {
                            creator_id: parent.creator_id,
                            title: &parent.title,
                            description: parent.description.as_deref(),
                            location: parent.location.as_deref(),
                            theme: parent.theme,
                            starts_at: occurrence.starts_at,
                            ends_at: occurrence.ends_at,
                            timezone: &parent.timezone,
                            recurrence: None,
                            parent_event_id: Some(parent.id),
                            community_id: parent.community_id,
                        },
                        now,
                        true,
                    )?;

                    match inserted {
                        Some(child_id) => {
                            insert_participant(
                                &tx,
                                child_id,
                                parent.creator_id,
                                ParticipantRole::Host,
                                now,
                            )?;
                            let child =
                                query_event(&tx, child_id)?.ok_or(RepositoryError::NotFound)?;
                            created.push(child);
                        }
                        None => debug!(
                            parent_event_id = parent.id,
                            starts_at = %occurrence.starts_at,
                            "Occurrence already materialized"
                        ),
                    }
                }

                tx.commit()?;
                Ok(created)
            })
            .await
            .map_err(into_repository_error)
    }

    async fn children_of(&self, parent_event_id: u64) -> Result<Vec<Event>> {
        self.db
            .execute_blocking(move |conn| {
                Ok(query_events(
                    conn,
                    "WHERE parent_event_id = ?1 ORDER BY starts_at, id",
                    params![parent_event_id as i64],
                )?)
            })
            .await
            .map_err(into_repository_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewCommunity;
    use chrono::TimeZone;

    async fn repository() -> SqliteEventRepository {
        let db = DatabaseManager::in_memory().unwrap();
        db.initialize_database().await.unwrap();
        SqliteEventRepository::new(db)
    }

    fn record(title: &str, community: Option<&str>) -> NewEventRecord {
        NewEventRecord {
            creator_id: 7,
            title: title.to_string(),
            description: Some("Bring snacks".to_string()),
            location: Some("Rooftop".to_string()),
            theme: EventTheme::Party,
            starts_at: Utc.with_ymd_and_hms(2024, 1, 1, 18, 0, 0).unwrap(),
            ends_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 21, 0, 0).unwrap()),
            timezone: "UTC".to_string(),
            recurrence: None,
            community: community.map(|name| NewCommunity {
                name: name.to_string(),
                description: None,
            }),
        }
    }

    #[tokio::test]
    async fn create_event_adds_host_and_community() {
        let repo = repository().await;

        let created = repo
            .create_event(record("Board games", Some("Gamers")))
            .await
            .unwrap();

        let community = created.community.expect("community should be created");
        assert_eq!(created.event.community_id, Some(community.id));
        assert_eq!(created.event.theme, EventTheme::Party);

        let participants = repo.participants(created.event.id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].user_id, 7);
        assert_eq!(participants[0].role, ParticipantRole::Host);

        let members = repo.community_members(community.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].role, MemberRole::Admin);
    }

    #[tokio::test]
    async fn failed_community_insert_rolls_back_event() {
        let repo = repository().await;
        repo.create_event(record("First", Some("Runners"))).await.unwrap();

        let err = repo
            .create_event(record("Second", Some("Runners")))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::AlreadyExists));
        let events = repo.list_events().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "First");
    }

    #[tokio::test]
    async fn recurrence_fields_round_trip_through_storage() {
        let repo = repository().await;
        let mut new_event = record("Standup", None);
        new_event.timezone = "America/New_York".to_string();
        // 2024-01-01 02:00 UTC is still Dec 31 in New York
        new_event.starts_at = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
        new_event.ends_at = None;
        let anchor = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        new_event.recurrence = Some(
            RecurrencePattern::new(anchor, RecurrenceKind::Weekly)
                .with_interval(2)
                .with_weekdays([Weekday::Sun, Weekday::Wed])
                .until(NaiveDate::from_ymd_opt(2024, 6, 30)),
        );

        let created = repo.create_event(new_event.clone()).await.unwrap();
        let stored = repo.get_event(created.event.id).await.unwrap().unwrap();

        assert_eq!(stored.recurrence, new_event.recurrence);
        assert_eq!(stored.starts_at, new_event.starts_at);
    }

    #[tokio::test]
    async fn out_of_range_weekday_ids_are_rejected_on_read() {
        let repo = repository().await;
        let mut new_event = record("Yoga", None);
        new_event.recurrence = Some(
            RecurrencePattern::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), RecurrenceKind::Weekly)
                .with_weekdays([Weekday::Mon]),
        );
        let created = repo.create_event(new_event).await.unwrap();
        let event_id = created.event.id;

        repo.db
            .execute_blocking(move |conn| {
                conn.execute(
                    "UPDATE events SET repeat_weekdays = '[9]' WHERE id = ?1",
                    params![event_id as i64],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let err = repo.get_event(event_id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::StorageError(ref msg) if msg.contains("invalid weekday id 9")));
    }

    #[tokio::test]
    async fn joining_twice_is_reported_and_adds_community_member() {
        let repo = repository().await;
        let created = repo
            .create_event(record("Picnic", Some("Parks")))
            .await
            .unwrap();
        let event_id = created.event.id;

        assert!(repo.add_participant(event_id, 9, ParticipantRole::Guest).await.unwrap());
        assert!(!repo.add_participant(event_id, 9, ParticipantRole::Guest).await.unwrap());

        let community_id = created.community.unwrap().id;
        let members = repo.community_members(community_id).await.unwrap();
        assert!(members
            .iter()
            .any(|m| m.user_id == 9 && m.role == MemberRole::Member));

        assert!(repo.remove_participant(event_id, 9).await.unwrap());
        assert!(!repo.remove_participant(event_id, 9).await.unwrap());
    }

    #[tokio::test]
    async fn joining_missing_event_is_not_found() {
        let repo = repository().await;

        let err = repo
            .add_participant(404, 1, ParticipantRole::Guest)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn occurrences_are_inserted_once() {
        let repo = repository().await;
        let parent = repo.create_event(record("Yoga", None)).await.unwrap().event;
        let occurrences: Vec<OccurrenceRecord> = (1..=2)
            .map(|day| OccurrenceRecord {
                starts_at: parent.starts_at + chrono::Duration::days(day),
                ends_at: None,
            })
            .collect();

        let first = repo.insert_occurrences(&parent, occurrences.clone()).await.unwrap();
        let second = repo.insert_occurrences(&parent, occurrences).await.unwrap();

        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        let children = repo.children_of(parent.id).await.unwrap();
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|c| c.parent_event_id == Some(parent.id)));
        assert!(children.iter().all(|c| c.recurrence.is_none()));
    }

    #[tokio::test]
    async fn upcoming_events_are_ordered_and_limited() {
        let repo = repository().await;
        for (title, day) in [("Late", 20), ("Early", 5), ("Past", 1), ("Middle", 10)] {
            let mut new_event = record(title, None);
            new_event.starts_at = Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap();
            new_event.ends_at = None;
            repo.create_event(new_event).await.unwrap();
        }

        let from = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
        let titles: Vec<String> = repo
            .list_events_from(from, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();

        assert_eq!(titles, vec!["Early", "Middle"]);
    }
}
