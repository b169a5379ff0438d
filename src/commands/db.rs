use crate::models::log_entry::{LogEntry, StoredTimestamp};
use crate::models::profile::ProfileSnapshot;
use rusqlite::{params, Connection, OptionalExtension, Result};
use std::path::Path;

const DB_SCHEMA_VERSION: i64 = 2;
const DB_FILE_NAME: &str = "rehabtrack.db";

pub type StoreResult<T> = std::result::Result<T, String>;

/// Read/append access to the daily log collection.
pub trait LogStore {
    /// Newest first, at most `limit` entries.
    fn fetch_recent_logs(&self, limit: usize) -> StoreResult<Vec<LogEntry>>;
    /// Newest first.
    fn fetch_all_logs(&self) -> StoreResult<Vec<LogEntry>>;
    fn append_log(&self, entry: &LogEntry) -> StoreResult<()>;
}

/// One profile document per user id; writes replace the whole document.
pub trait ProfileStore {
    fn read_profile(&self, user_id: &str) -> StoreResult<Option<ProfileSnapshot>>;
    fn write_profile(&self, user_id: &str, profile: &ProfileSnapshot) -> StoreResult<()>;
}

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version < 2 {
        apply_migration_2(conn)?;
        version = 2;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("Database schema v{version} is newer than supported v{DB_SCHEMA_VERSION}");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS logs (
            id TEXT PRIMARY KEY,
            pain INTEGER NOT NULL CHECK(pain BETWEEN 0 AND 10),
            activity TEXT NOT NULL DEFAULT '',
            exercises TEXT NOT NULL DEFAULT '',
            timestamp_json TEXT,
            recorded_at_ms INTEGER
        );

        CREATE TABLE IF NOT EXISTS profiles (
            user_id TEXT PRIMARY KEY,
            profile_json TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        ",
    )
}

fn apply_migration_2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_logs_recorded_at ON logs(recorded_at_ms);",
    )
}

pub fn get_db_connection(data_dir: &str) -> StoreResult<Connection> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| format!("Failed to create data directory {data_dir}: {e}"))?;
    let db_path = Path::new(data_dir).join(DB_FILE_NAME);
    let conn = Connection::open(db_path).map_err(|e| e.to_string())?;
    initialize_schema(&conn).map_err(|e| format!("Schema error: {e}"))?;
    Ok(conn)
}

/// Insert a log row keeping the timestamp exactly as it was supplied.
pub fn insert_log_with_conn(
    conn: &Connection,
    id: &str,
    pain: u8,
    activity: &str,
    exercises: &str,
    stored: Option<&StoredTimestamp>,
) -> Result<()> {
    let timestamp_json = stored.and_then(|t| serde_json::to_string(t).ok());
    let recorded_at_ms = stored
        .and_then(StoredTimestamp::normalize)
        .map(|at| at.timestamp_millis());

    conn.execute(
        "INSERT INTO logs (id, pain, activity, exercises, timestamp_json, recorded_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![id, pain as i64, activity, exercises, timestamp_json, recorded_at_ms],
    )?;

    Ok(())
}

fn query_logs(conn: &Connection, limit: Option<usize>) -> Result<Vec<LogEntry>> {
    // SQLite treats a negative LIMIT as unbounded; NULL timestamps sort last in DESC order.
    let limit = limit.map(|l| l as i64).unwrap_or(-1);
    let mut stmt = conn.prepare(
        "SELECT id, pain, activity, exercises, timestamp_json FROM logs ORDER BY recorded_at_ms DESC, rowid DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        let timestamp_json: Option<String> = row.get(4)?;
        let stored = timestamp_json
            .as_deref()
            .and_then(|raw| serde_json::from_str::<StoredTimestamp>(raw).ok());

        Ok(LogEntry::from_stored(
            row.get(0)?,
            row.get::<_, i64>(1)?.clamp(0, 10) as u8,
            row.get(2)?,
            row.get(3)?,
            stored.as_ref(),
        ))
    })?;

    let entries = rows.collect::<Result<Vec<_>>>()?;
    Ok(entries)
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(data_dir: &str) -> StoreResult<Self> {
        get_db_connection(data_dir).map(Self::new)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Open the store on the blocking pool and run `op` against it.
pub async fn with_store<T, F>(data_dir: String, op: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce(&SqliteStore) -> StoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let store = SqliteStore::open(&data_dir).map_err(|e| format!("DB error: {e}"))?;
        op(&store)
    })
    .await
    .map_err(|e| format!("Store task failed: {e}"))?
}

impl LogStore for SqliteStore {
    fn fetch_recent_logs(&self, limit: usize) -> StoreResult<Vec<LogEntry>> {
        query_logs(&self.conn, Some(limit)).map_err(|e| format!("Query error: {e}"))
    }

    fn fetch_all_logs(&self) -> StoreResult<Vec<LogEntry>> {
        query_logs(&self.conn, None).map_err(|e| format!("Query error: {e}"))
    }

    fn append_log(&self, entry: &LogEntry) -> StoreResult<()> {
        let stored = entry.timestamp.map(StoredTimestamp::Instant);
        insert_log_with_conn(
            &self.conn,
            &entry.id,
            entry.pain,
            &entry.activity,
            &entry.exercises,
            stored.as_ref(),
        )
        .map_err(|e| format!("Insert error: {e}"))
    }
}

impl ProfileStore for SqliteStore {
    fn read_profile(&self, user_id: &str) -> StoreResult<Option<ProfileSnapshot>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT profile_json FROM profiles WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| format!("Query error: {e}"))?;

        raw.map(|json| {
            serde_json::from_str::<ProfileSnapshot>(&json)
                .map_err(|e| format!("Corrupt profile for {user_id}: {e}"))
        })
        .transpose()
    }

    fn write_profile(&self, user_id: &str, profile: &ProfileSnapshot) -> StoreResult<()> {
        let json = serde_json::to_string(profile)
            .map_err(|e| format!("Failed to serialize profile: {e}"))?;
        let now = chrono::Utc::now().timestamp();

        self.conn
            .execute(
                "INSERT OR REPLACE INTO profiles (user_id, profile_json, updated_at) VALUES (?1, ?2, ?3)",
                params![user_id, json, now],
            )
            .map_err(|e| format!("Insert error: {e}"))?;

        log::info!("Profile saved for {user_id}");
        Ok(())
    }
}
