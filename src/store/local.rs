use crate::errors::{TrackerError, TrackerResult};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub type DbPool = Arc<Mutex<Connection>>;

/// Open (or create) the local key-value store. This is the durable
/// source of truth; the remote mirror is best-effort backup.
pub fn init_db(data_dir: &Path) -> TrackerResult<DbPool> {
    std::fs::create_dir_all(data_dir)
        .map_err(|e| TrackerError::Storage(format!("create dir: {e}")))?;
    let db_path = data_dir.join("linekeeper.db");
    let conn = Connection::open(&db_path)?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

    let schema = include_str!("../../migrations/001_init.sql");
    conn.execute_batch(schema)?;

    tracing::info!("local store initialized at {}", db_path.display());
    Ok(Arc::new(Mutex::new(conn)))
}

/// Read one collection blob by key. Missing key is an empty collection.
pub fn load_blob(db: &DbPool, key: &str) -> TrackerResult<Option<String>> {
    let conn = db.lock().map_err(|e| TrackerError::Storage(format!("lock poisoned: {e}")))?;
    let mut stmt = conn.prepare("SELECT content FROM records WHERE id = ?1")?;
    let mut rows = stmt.query(rusqlite::params![key])?;
    match rows.next()? {
        Some(row) => Ok(Some(row.get::<_, String>(0)?)),
        None => Ok(None),
    }
}

/// Overwrite one collection blob. Idempotent full-collection write.
pub fn save_blob(db: &DbPool, key: &str, content: &str, updated_at: &str) -> TrackerResult<()> {
    let conn = db.lock().map_err(|e| TrackerError::Storage(format!("lock poisoned: {e}")))?;
    conn.execute(
        "INSERT OR REPLACE INTO records (id, content, updated_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![key, content, updated_at],
    )?;
    Ok(())
}
