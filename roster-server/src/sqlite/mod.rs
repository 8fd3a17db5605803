//! SQLite implementation of the directory store.
//!
//! States are stored in explicit relational tables rather than JSON blobs
//! for type safety and queryability. Synchronous rusqlite calls run inside
//! `tokio::task::spawn_blocking` so the async runtime is never blocked.
//!
//! # Schema Versioning
//!
//! The database uses SQLite's `user_version` pragma to track schema
//! versions. When the schema changes, increment `SCHEMA_VERSION` and add a
//! migration function in `run_migrations`.


use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use roster_core::model::{PrId, PrRecord, PrStatus, Team, TeamId, User, UserId};
use roster_core::store::{DirectoryStore, StoreError};

/// Current schema version. Increment when making schema changes.
///
/// When adding a new version:
/// 1. Increment this constant
/// 2. Add a migration function `migrate_v{N}_to_v{N+1}`
/// 3. Call it from `run_migrations`
const SCHEMA_VERSION: i32 = 1;

/// SQLite-backed directory store.
///
/// Uses an `Arc<Mutex<Connection>>` because `rusqlite::Connection` is not
/// `Sync`; every trait method clones the Arc into a `spawn_blocking`
/// closure that takes the lock for the duration of one statement.
pub struct SqliteDirectory {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteDirectory {
    /// Open or create the database file at the given path and run any
    /// pending migrations.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| StoreError::storage("open database", e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Create an in-memory database (for testing).
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::storage("open in-memory database", e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "busy_timeout", 5000)
            .map_err(|e| StoreError::storage("configure busy_timeout", e.to_string()))?;
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| StoreError::storage("configure foreign_keys", e.to_string()))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize the schema and run any pending migrations.
    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("mutex poisoned");

        let current_version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .map_err(|e| StoreError::storage("read schema version", e.to_string()))?;

        if current_version > SCHEMA_VERSION {
            return Err(StoreError::storage(
                "init schema",
                format!(
                    "database schema version {} is newer than supported version {}; \
                     please upgrade the application",
                    current_version, SCHEMA_VERSION
                ),
            ));
        }

        if current_version < SCHEMA_VERSION {
            Self::run_migrations(&conn, current_version)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .map_err(|e| StoreError::storage("write schema version", e.to_string()))?;
        }

        Ok(())
    }

    /// Run migrations from `from_version` up to `SCHEMA_VERSION`.
    fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StoreError> {
        if from_version < 1 {
            Self::migrate_v0_to_v1(conn)?;
        }

        // Future migrations go here:
        // if from_version < 2 {
        //     Self::migrate_v1_to_v2(conn)?;
        // }

        Ok(())
    }

    /// Migration v0 -> v1: Create initial schema.
    fn migrate_v0_to_v1(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS teams (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS team_members (
                team_id INTEGER NOT NULL REFERENCES teams(id),
                user_id TEXT NOT NULL REFERENCES users(id),
                PRIMARY KEY (team_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS pull_requests (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                author_id TEXT NOT NULL REFERENCES users(id),
                status TEXT NOT NULL DEFAULT 'OPEN' CHECK (status IN ('OPEN', 'MERGED'))
            );

            CREATE TABLE IF NOT EXISTS pr_reviewers (
                pr_id TEXT NOT NULL REFERENCES pull_requests(id),
                user_id TEXT NOT NULL REFERENCES users(id),
                PRIMARY KEY (pr_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS assignment_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                pr_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                recorded_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_team_members_user ON team_members(user_id);
            CREATE INDEX IF NOT EXISTS idx_pr_reviewers_user ON pr_reviewers(user_id);
            CREATE INDEX IF NOT EXISTS idx_assignment_events_user ON assignment_events(user_id);
            "#,
        )
        .map_err(|e| StoreError::storage("create initial schema (v0 -> v1)", e.to_string()))?;

        Ok(())
    }

    /// Run a blocking closure against the connection on the blocking pool.
    async fn call<T, F>(&self, operation: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().expect("mutex poisoned");
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::storage(operation, e.to_string()))?
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserId(row.get(0)?),
        name: row.get(1)?,
        active: row.get(2)?,
    })
}

fn row_to_pr(row: &rusqlite::Row<'_>) -> Result<(PrId, String, UserId, String), rusqlite::Error> {
    Ok((
        PrId(row.get(0)?),
        row.get(1)?,
        UserId(row.get(2)?),
        row.get(3)?,
    ))
}

fn parse_status(raw: &str) -> Result<PrStatus, StoreError> {
    PrStatus::parse(raw).ok_or(StoreError::Corruption("pull request status"))
}

#[async_trait]
impl DirectoryStore for SqliteDirectory {
    async fn upsert_user(&self, id: &UserId, name: &str) -> Result<(), StoreError> {
        let id = id.0.clone();
        let name = name.to_string();
        self.call("upsert_user", move |conn| {
            conn.execute(
                "INSERT INTO users (id, name) VALUES (?1, ?2)
                 ON CONFLICT (id) DO UPDATE SET name = excluded.name",
                params![id, name],
            )
            .map_err(|e| StoreError::storage("upsert_user", e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let id = id.0.clone();
        self.call("get_user", move |conn| {
            conn.query_row(
                "SELECT id, name, is_active FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )
            .optional()
            .map_err(|e| StoreError::storage("get_user", e.to_string()))
        })
        .await
    }

    async fn set_user_active(&self, id: &UserId, active: bool) -> Result<(), StoreError> {
        let id = id.0.clone();
        self.call("set_user_active", move |conn| {
            conn.execute(
                "UPDATE users SET is_active = ?1 WHERE id = ?2",
                params![active, id],
            )
            .map_err(|e| StoreError::storage("set_user_active", e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn team_exists(&self, name: &str) -> Result<bool, StoreError> {
        let name = name.to_string();
        self.call("team_exists", move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM teams WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .map_err(|e| StoreError::storage("team_exists", e.to_string()))?;
            Ok(count > 0)
        })
        .await
    }

    async fn create_team(&self, name: &str) -> Result<TeamId, StoreError> {
        let name = name.to_string();
        self.call("create_team", move |conn| {
            conn.execute("INSERT INTO teams (name) VALUES (?1)", params![name])
                .map_err(|e| StoreError::storage("create_team", e.to_string()))?;
            Ok(TeamId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn add_member(&self, team: TeamId, user: &UserId) -> Result<(), StoreError> {
        let user = user.0.clone();
        self.call("add_member", move |conn| {
            conn.execute(
                "INSERT INTO team_members (team_id, user_id) VALUES (?1, ?2)
                 ON CONFLICT DO NOTHING",
                params![team.0, user],
            )
            .map_err(|e| StoreError::storage("add_member", e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn get_team(&self, name: &str) -> Result<Option<Team>, StoreError> {
        let name = name.to_string();
        self.call("get_team", move |conn| {
            conn.query_row(
                "SELECT id, name FROM teams WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Team {
                        id: TeamId(row.get(0)?),
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(|e| StoreError::storage("get_team", e.to_string()))
        })
        .await
    }

    async fn team_members(&self, name: &str) -> Result<Vec<User>, StoreError> {
        let name = name.to_string();
        self.call("team_members", move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT u.id, u.name, u.is_active
                     FROM users u
                     JOIN team_members tm ON u.id = tm.user_id
                     JOIN teams t ON t.id = tm.team_id
                     WHERE t.name = ?1
                     ORDER BY tm.rowid",
                )
                .map_err(|e| StoreError::storage("team_members", e.to_string()))?;
            let rows = stmt
                .query_map(params![name], row_to_user)
                .map_err(|e| StoreError::storage("team_members", e.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::storage("team_members row", e.to_string()))
        })
        .await
    }

    async fn active_members_except(
        &self,
        name: &str,
        exclude: &UserId,
    ) -> Result<Vec<User>, StoreError> {
        let name = name.to_string();
        let exclude = exclude.0.clone();
        self.call("active_members_except", move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT u.id, u.name, u.is_active
                     FROM users u
                     JOIN team_members tm ON u.id = tm.user_id
                     JOIN teams t ON t.id = tm.team_id
                     WHERE t.name = ?1 AND u.is_active = 1 AND u.id != ?2",
                )
                .map_err(|e| StoreError::storage("active_members_except", e.to_string()))?;
            let rows = stmt
                .query_map(params![name, exclude], row_to_user)
                .map_err(|e| StoreError::storage("active_members_except", e.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::storage("active_members_except row", e.to_string()))
        })
        .await
    }

    async fn user_team(&self, id: &UserId) -> Result<Option<String>, StoreError> {
        let id = id.0.clone();
        self.call("user_team", move |conn| {
            conn.query_row(
                "SELECT t.name
                 FROM teams t
                 JOIN team_members tm ON t.id = tm.team_id
                 WHERE tm.user_id = ?1
                 LIMIT 1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StoreError::storage("user_team", e.to_string()))
        })
        .await
    }

    async fn deactivate_team_members(&self, team: TeamId) -> Result<(), StoreError> {
        self.call("deactivate_team_members", move |conn| {
            conn.execute(
                "UPDATE users SET is_active = 0
                 WHERE id IN (SELECT user_id FROM team_members WHERE team_id = ?1)",
                params![team.0],
            )
            .map_err(|e| StoreError::storage("deactivate_team_members", e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn pr_exists(&self, id: &PrId) -> Result<bool, StoreError> {
        let id = id.0.clone();
        self.call("pr_exists", move |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM pull_requests WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .map_err(|e| StoreError::storage("pr_exists", e.to_string()))?;
            Ok(count > 0)
        })
        .await
    }

    async fn create_pr(&self, id: &PrId, title: &str, author: &UserId) -> Result<(), StoreError> {
        let id = id.0.clone();
        let title = title.to_string();
        let author = author.0.clone();
        self.call("create_pr", move |conn| {
            conn.execute(
                "INSERT INTO pull_requests (id, title, author_id) VALUES (?1, ?2, ?3)",
                params![id, title, author],
            )
            .map_err(|e| StoreError::storage("create_pr", e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn get_pr(&self, id: &PrId) -> Result<Option<PrRecord>, StoreError> {
        let id = id.0.clone();
        self.call("get_pr", move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, title, author_id, status FROM pull_requests WHERE id = ?1",
                    params![id],
                    row_to_pr,
                )
                .optional()
                .map_err(|e| StoreError::storage("get_pr", e.to_string()))?;

            row.map(|(id, title, author, status)| {
                Ok(PrRecord {
                    id,
                    title,
                    author,
                    status: parse_status(&status)?,
                })
            })
            .transpose()
        })
        .await
    }

    async fn set_pr_status(&self, id: &PrId, status: PrStatus) -> Result<(), StoreError> {
        let id = id.0.clone();
        self.call("set_pr_status", move |conn| {
            conn.execute(
                "UPDATE pull_requests SET status = ?1 WHERE id = ?2",
                params![status.as_str(), id],
            )
            .map_err(|e| StoreError::storage("set_pr_status", e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn add_reviewer(&self, pr: &PrId, user: &UserId) -> Result<(), StoreError> {
        let pr = pr.0.clone();
        let user = user.0.clone();
        self.call("add_reviewer", move |conn| {
            conn.execute(
                "INSERT INTO pr_reviewers (pr_id, user_id) VALUES (?1, ?2)
                 ON CONFLICT DO NOTHING",
                params![pr, user],
            )
            .map_err(|e| StoreError::storage("add_reviewer", e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn remove_reviewer(&self, pr: &PrId, user: &UserId) -> Result<(), StoreError> {
        let pr = pr.0.clone();
        let user = user.0.clone();
        self.call("remove_reviewer", move |conn| {
            conn.execute(
                "DELETE FROM pr_reviewers WHERE pr_id = ?1 AND user_id = ?2",
                params![pr, user],
            )
            .map_err(|e| StoreError::storage("remove_reviewer", e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn pr_reviewers(&self, pr: &PrId) -> Result<Vec<User>, StoreError> {
        let pr = pr.0.clone();
        self.call("pr_reviewers", move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT u.id, u.name, u.is_active
                     FROM pr_reviewers r
                     JOIN users u ON u.id = r.user_id
                     WHERE r.pr_id = ?1
                     ORDER BY r.rowid",
                )
                .map_err(|e| StoreError::storage("pr_reviewers", e.to_string()))?;
            let rows = stmt
                .query_map(params![pr], row_to_user)
                .map_err(|e| StoreError::storage("pr_reviewers", e.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| StoreError::storage("pr_reviewers row", e.to_string()))
        })
        .await
    }

    async fn prs_reviewed_by(&self, user: &UserId) -> Result<Vec<PrRecord>, StoreError> {
        let user = user.0.clone();
        self.call("prs_reviewed_by", move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT p.id, p.title, p.author_id, p.status
                     FROM pull_requests p
                     JOIN pr_reviewers r ON p.id = r.pr_id
                     WHERE r.user_id = ?1
                     ORDER BY p.id",
                )
                .map_err(|e| StoreError::storage("prs_reviewed_by", e.to_string()))?;
            let rows = stmt
                .query_map(params![user], row_to_pr)
                .map_err(|e| StoreError::storage("prs_reviewed_by", e.to_string()))?;

            let mut records = Vec::new();
            for row in rows {
                let (id, title, author, status) = row
                    .map_err(|e| StoreError::storage("prs_reviewed_by row", e.to_string()))?;
                records.push(PrRecord {
                    id,
                    title,
                    author,
                    status: parse_status(&status)?,
                });
            }
            Ok(records)
        })
        .await
    }

    async fn record_assignment(&self, pr: &PrId, user: &UserId) -> Result<(), StoreError> {
        let pr = pr.0.clone();
        let user = user.0.clone();
        let recorded_at = chrono::Utc::now().timestamp();
        self.call("record_assignment", move |conn| {
            conn.execute(
                "INSERT INTO assignment_events (pr_id, user_id, recorded_at) VALUES (?1, ?2, ?3)",
                params![pr, user, recorded_at],
            )
            .map_err(|e| StoreError::storage("record_assignment", e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn assignment_counts(&self) -> Result<HashMap<String, u64>, StoreError> {
        self.call("assignment_counts", move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT user_id, COUNT(*) FROM assignment_events GROUP BY user_id",
                )
                .map_err(|e| StoreError::storage("assignment_counts", e.to_string()))?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })
                .map_err(|e| StoreError::storage("assignment_counts", e.to_string()))?;

            let mut counts = HashMap::new();
            for row in rows {
                let (user_id, count) = row
                    .map_err(|e| StoreError::storage("assignment_counts row", e.to_string()))?;
                counts.insert(user_id, count.max(0) as u64);
            }
            Ok(counts)
        })
        .await
    }
}
