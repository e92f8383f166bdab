pub const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
  id       INTEGER PRIMARY KEY,
  username TEXT UNIQUE NOT NULL
);
"#;

pub const CREATE_ACTIVITIES: &str = r#"
CREATE TABLE IF NOT EXISTS activities (
  id        INTEGER PRIMARY KEY,
  user_id   INTEGER,
  date      TEXT,
  workout   TEXT,
  junk_food TEXT,
  yoga      TEXT,
  FOREIGN KEY (user_id) REFERENCES users (id)
);
"#;

pub const INDEX_ACTIVITIES_USER_DATE: &str =
    "CREATE INDEX IF NOT EXISTS idx_activities_user_date ON activities(user_id, date);";

pub const SELECT_ACTIVITIES_FOR_USER: &str = r#"
SELECT id, user_id, date, workout, junk_food, yoga
FROM activities
WHERE user_id = ?1
ORDER BY date ASC, id ASC
"#;

pub const INSERT_ACTIVITY: &str = r#"
INSERT INTO activities (user_id, date, workout, junk_food, yoga)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub fn schema_statements() -> Vec<&'static str> {
    vec![CREATE_USERS, CREATE_ACTIVITIES, INDEX_ACTIVITIES_USER_DATE]
}
