pub mod local;
pub mod remote;

use crate::config::AppConfig;
use crate::errors::TrackerResult;
use crate::records::{CashMovement, Wager};
use local::DbPool;
use portable_atomic::{AtomicU64, Ordering};
use remote::RemoteMirror;

pub const WAGERS_KEY: &str = "wagers";
pub const MOVEMENTS_KEY: &str = "movements";

/// Lock-free persistence counters, surfaced at /api/counters.
pub struct SyncCounters {
    pub local_saves: AtomicU64,
    pub mirror_saves: AtomicU64,
    pub mirror_failures: AtomicU64,
}

/// Load/save facade over the two record collections. The local sqlite
/// store is authoritative; the remote mirror is eventually-consistent
/// backup and its failures never fail the operation.
pub struct Store {
    db: DbPool,
    mirror: Option<RemoteMirror>,
    pub counters: SyncCounters,
}

impl Store {
    pub fn open(config: &AppConfig) -> TrackerResult<Self> {
        let db = local::init_db(&config.data_dir)?;
        let mirror = match (&config.sync_url, &config.sync_key) {
            (Some(url), Some(key)) => {
                tracing::info!(url, "remote mirror configured");
                Some(RemoteMirror::new(url, key))
            }
            _ => None,
        };
        Ok(Self {
            db,
            mirror,
            counters: SyncCounters {
                local_saves: AtomicU64::new(0),
                mirror_saves: AtomicU64::new(0),
                mirror_failures: AtomicU64::new(0),
            },
        })
    }

    pub async fn load_wagers(&self) -> TrackerResult<Vec<Wager>> {
        self.load_collection(WAGERS_KEY).await
    }

    pub async fn load_movements(&self) -> TrackerResult<Vec<CashMovement>> {
        self.load_collection(MOVEMENTS_KEY).await
    }

    pub async fn save_wagers(&self, wagers: &[Wager]) -> TrackerResult<()> {
        self.save_collection(WAGERS_KEY, wagers).await
    }

    pub async fn save_movements(&self, movements: &[CashMovement]) -> TrackerResult<()> {
        self.save_collection(MOVEMENTS_KEY, movements).await
    }

    /// Prefer the remote copy when a mirror is configured (it may hold
    /// writes from another device); fall back to local on any miss or
    /// mirror error.
    async fn load_collection<T: serde::de::DeserializeOwned>(&self, key: &str) -> TrackerResult<Vec<T>> {
        if let Some(mirror) = &self.mirror {
            match mirror.fetch(key).await {
                Ok(Some(value)) => return Ok(serde_json::from_value(value)?),
                Ok(None) => {}
                Err(e) => tracing::warn!(key, error = %e, "mirror load failed, using local copy"),
            }
        }

        match local::load_blob(&self.db, key)? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(Vec::new()),
        }
    }

    /// Local write first (authoritative), then a best-effort mirror
    /// push. A mirror failure is logged and counted, nothing more.
    async fn save_collection<T: serde::Serialize>(&self, key: &str, records: &[T]) -> TrackerResult<()> {
        let value = serde_json::to_value(records)?;
        let updated_at = chrono::Utc::now().to_rfc3339();

        local::save_blob(&self.db, key, &value.to_string(), &updated_at)?;
        self.counters.local_saves.fetch_add(1, Ordering::Relaxed);

        if let Some(mirror) = &self.mirror {
            match mirror.push(key, &value, &updated_at).await {
                Ok(()) => {
                    self.counters.mirror_saves.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    self.counters.mirror_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(key, error = %e, "mirror save failed, local write stands");
                }
            }
        }
        Ok(())
    }
}
