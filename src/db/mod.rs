pub mod queries;

use crate::error::{Result, TrackerError};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, ffi, params};
use serde::Serialize;
use std::fs;
use std::os::raw::c_int;
use std::path::Path;
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// One of the tracked daily habits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Workout,
    JunkFood,
    Yoga,
}

impl Activity {
    pub const ALL: [Activity; 3] = [Activity::Workout, Activity::JunkFood, Activity::Yoga];

    pub fn key(self) -> &'static str {
        match self {
            Activity::Workout => "workout",
            Activity::JunkFood => "junk_food",
            Activity::Yoga => "yoga",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Activity::Workout => "Workout",
            Activity::JunkFood => "Junk Food",
            Activity::Yoga => "Yoga",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityRecord {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub workout: bool,
    pub junk_food: bool,
    pub yoga: bool,
}

impl ActivityRecord {
    pub fn flag(&self, activity: Activity) -> bool {
        match activity {
            Activity::Workout => self.workout,
            Activity::JunkFood => self.junk_food,
            Activity::Yoga => self.yoga,
        }
    }
}

/// Values submitted for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewActivity {
    pub date: NaiveDate,
    pub workout: bool,
    pub junk_food: bool,
    pub yoga: bool,
}

/// Trims a username submitted by a front end and rejects it when blank.
/// Storage itself accepts any string.
pub fn normalize_username(raw: &str) -> Result<&str> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(TrackerError::InvalidUsername);
    }

    Ok(username)
}

/// Handle to the activity store. The connection closes when this value is dropped.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened activity database");

        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| self.conn.execute(statement, []).map(|_| ()))
            .map_err(TrackerError::from)
    }

    pub fn add_user(&self, username: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO users (username) VALUES (?1)", params![username])
            .map_err(|error| {
                if has_extended_code(&error, ffi::SQLITE_CONSTRAINT_UNIQUE) {
                    TrackerError::DuplicateUser(username.to_string())
                } else {
                    error.into()
                }
            })?;

        Ok(self.conn.last_insert_rowid())
    }

    pub fn resolve_user_id(&self, username: &str) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT id FROM users WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| TrackerError::UserNotFound(username.to_string()))
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut statement = self
            .conn
            .prepare("SELECT id, username FROM users ORDER BY id ASC")?;

        let users = statement
            .query_map([], |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(users)
    }

    pub fn list_usernames(&self) -> Result<Vec<String>> {
        Ok(self
            .list_users()?
            .into_iter()
            .map(|user| user.username)
            .collect())
    }

    pub fn insert_activity(&self, user_id: i64, activity: &NewActivity) -> Result<i64> {
        self.conn
            .execute(
                queries::INSERT_ACTIVITY,
                params![
                    user_id,
                    activity.date.format(DATE_FORMAT).to_string(),
                    flag_text(activity.workout),
                    flag_text(activity.junk_food),
                    flag_text(activity.yoga),
                ],
            )
            .map_err(|error| {
                if has_extended_code(&error, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) {
                    TrackerError::UnknownUserId(user_id)
                } else {
                    error.into()
                }
            })?;

        Ok(self.conn.last_insert_rowid())
    }

    pub fn fetch_activities(&self, user_id: i64) -> Result<Vec<ActivityRecord>> {
        let mut statement = self.conn.prepare(queries::SELECT_ACTIVITIES_FOR_USER)?;

        let rows = statement
            .query_map(params![user_id], activity_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let undated = rows.iter().filter(|row| row.is_none()).count();
        if undated > 0 {
            warn!(user_id, undated, "skipping activity rows without a date");
        }

        Ok(rows.into_iter().flatten().collect())
    }

    pub fn count_activities_on(&self, user_id: i64, date: NaiveDate) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM activities WHERE user_id = ?1 AND substr(date, 1, 10) = ?2",
            params![user_id, date.format(DATE_FORMAT).to_string()],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    pub fn user_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
    }

    pub fn activity_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))?)
    }
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Option<ActivityRecord>> {
    let Some(raw_date) = row.get::<_, Option<String>>(2)? else {
        return Ok(None);
    };

    Ok(Some(ActivityRecord {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: parse_stored_date(2, &raw_date)?,
        workout: parse_flag(row.get(3)?),
        junk_food: parse_flag(row.get(4)?),
        yoga: parse_flag(row.get(5)?),
    }))
}

// Rows written by older versions may carry a time suffix after the date.
fn parse_stored_date(column: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    let prefix = raw.trim().get(..10).unwrap_or(raw);

    NaiveDate::parse_from_str(prefix, DATE_FORMAT)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(error)))
}

fn flag_text(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn parse_flag(raw: Option<String>) -> bool {
    raw.is_some_and(|value| value.trim().eq_ignore_ascii_case("yes"))
}

fn has_extended_code(error: &rusqlite::Error, code: c_int) -> bool {
    matches!(error, rusqlite::Error::SqliteFailure(failure, _) if failure.extended_code == code)
}

#[cfg(test)]
mod tests {
    use super::{Activity, Database, NewActivity, normalize_username};
    use crate::error::TrackerError;
    use chrono::NaiveDate;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
    }

    fn entry(raw: &str, workout: bool, junk_food: bool, yoga: bool) -> NewActivity {
        NewActivity {
            date: date(raw),
            workout,
            junk_food,
            yoga,
        }
    }

    #[test]
    fn init_schema_is_idempotent() {
        let database = Database::open_in_memory().expect("open");
        database.init_schema().expect("second init");
        database.init_schema().expect("third init");

        assert_eq!(database.user_count().expect("count"), 0);
    }

    #[test]
    fn added_user_resolves_to_assigned_id() {
        let database = Database::open_in_memory().expect("open");
        let alice = database.add_user("alice").expect("add alice");
        let bob = database.add_user("bob").expect("add bob");

        assert_ne!(alice, bob);
        assert_eq!(database.resolve_user_id("alice").expect("resolve"), alice);
        assert_eq!(database.resolve_user_id("bob").expect("resolve"), bob);

        let names = database.list_usernames().expect("list");
        assert_eq!(names.iter().filter(|name| *name == "alice").count(), 1);
        assert_eq!(names.iter().filter(|name| *name == "bob").count(), 1);
    }

    #[test]
    fn duplicate_username_is_rejected_without_new_row() {
        let database = Database::open_in_memory().expect("open");
        database.add_user("alice").expect("first add");

        let error = database.add_user("alice").expect_err("duplicate must fail");
        assert!(matches!(error, TrackerError::DuplicateUser(name) if name == "alice"));
        assert_eq!(database.user_count().expect("count"), 1);
    }

    #[test]
    fn unknown_username_is_not_found() {
        let database = Database::open_in_memory().expect("open");

        let error = database.resolve_user_id("bob").expect_err("missing user");
        assert!(matches!(error, TrackerError::UserNotFound(name) if name == "bob"));
    }

    #[test]
    fn empty_username_is_accepted_by_storage() {
        let database = Database::open_in_memory().expect("open");

        let id = database.add_user("").expect("storage does not validate");
        assert_eq!(database.resolve_user_id("").expect("resolve"), id);
    }

    #[test]
    fn inserted_activity_round_trips() {
        let database = Database::open_in_memory().expect("open");
        let user_id = database.add_user("alice").expect("add");
        let submitted = entry("2024-06-10", true, false, true);

        let record_id = database.insert_activity(user_id, &submitted).expect("insert");
        let records = database.fetch_activities(user_id).expect("fetch");

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, record_id);
        assert_eq!(record.user_id, user_id);
        assert_eq!(record.date, submitted.date);
        assert!(record.flag(Activity::Workout));
        assert!(!record.flag(Activity::JunkFood));
        assert!(record.flag(Activity::Yoga));
    }

    #[test]
    fn duplicate_days_are_kept_and_sorted_by_date() {
        let database = Database::open_in_memory().expect("open");
        let user_id = database.add_user("alice").expect("add");

        database
            .insert_activity(user_id, &entry("2024-06-12", false, false, false))
            .expect("insert");
        database
            .insert_activity(user_id, &entry("2024-06-10", true, false, true))
            .expect("insert");
        database
            .insert_activity(user_id, &entry("2024-06-10", false, true, false))
            .expect("insert");

        let dates = database
            .fetch_activities(user_id)
            .expect("fetch")
            .into_iter()
            .map(|record| record.date)
            .collect::<Vec<_>>();

        assert_eq!(
            dates,
            vec![date("2024-06-10"), date("2024-06-10"), date("2024-06-12")]
        );
        assert_eq!(
            database
                .count_activities_on(user_id, date("2024-06-10"))
                .expect("count"),
            2
        );
    }

    #[test]
    fn activities_are_scoped_to_their_user() {
        let database = Database::open_in_memory().expect("open");
        let alice = database.add_user("alice").expect("add");
        let bob = database.add_user("bob").expect("add");

        database
            .insert_activity(alice, &entry("2024-06-10", true, true, true))
            .expect("insert");

        assert_eq!(database.fetch_activities(alice).expect("fetch").len(), 1);
        assert!(database.fetch_activities(bob).expect("fetch").is_empty());
    }

    #[test]
    fn insert_for_missing_user_id_fails() {
        let database = Database::open_in_memory().expect("open");

        let error = database
            .insert_activity(42, &entry("2024-06-10", true, true, true))
            .expect_err("foreign key");
        assert!(matches!(error, TrackerError::UnknownUserId(42)));
        assert_eq!(database.activity_count().expect("count"), 0);
    }

    #[test]
    fn legacy_rows_with_time_suffix_are_readable() {
        let database = Database::open_in_memory().expect("open");
        let user_id = database.add_user("alice").expect("add");

        database
            .conn
            .execute(
                "INSERT INTO activities (user_id, date, workout, junk_food, yoga) VALUES (?1, '2024-06-10 00:00:00', 'Yes', 'No', 'no')",
                [user_id],
            )
            .expect("raw insert");

        let records = database.fetch_activities(user_id).expect("fetch");
        assert_eq!(records[0].date, date("2024-06-10"));
        assert!(records[0].workout);
        assert!(!records[0].junk_food);
        assert!(!records[0].yoga);
    }

    #[test]
    fn rows_without_a_date_are_skipped() {
        let database = Database::open_in_memory().expect("open");
        let user_id = database.add_user("alice").expect("add");

        database
            .insert_activity(user_id, &entry("2024-06-10", true, false, false))
            .expect("insert");
        database
            .conn
            .execute(
                "INSERT INTO activities (user_id, date, workout, junk_food, yoga) VALUES (?1, NULL, 'Yes', 'Yes', 'Yes')",
                [user_id],
            )
            .expect("raw insert");

        let records = database.fetch_activities(user_id).expect("fetch");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date, date("2024-06-10"));
        assert_eq!(database.activity_count().expect("count"), 2);
    }

    #[test]
    fn usernames_are_trimmed_and_blank_rejected() {
        assert_eq!(normalize_username("  alice ").expect("valid"), "alice");
        assert!(matches!(
            normalize_username("   "),
            Err(TrackerError::InvalidUsername)
        ));
        assert!(matches!(normalize_username(""), Err(TrackerError::InvalidUsername)));
    }

    #[test]
    fn file_backed_database_persists_across_opens() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("activities.db");

        {
            let database = Database::open(&path).expect("open");
            let user_id = database.add_user("alice").expect("add");
            database
                .insert_activity(user_id, &entry("2024-06-10", true, false, false))
                .expect("insert");
        }

        let reopened = Database::open(&path).expect("reopen");
        let user_id = reopened.resolve_user_id("alice").expect("resolve");
        assert_eq!(reopened.fetch_activities(user_id).expect("fetch").len(), 1);
    }
}
