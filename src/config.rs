use crate::errors::{TrackerError, TrackerResult};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub server_port: u16,
    /// Optional remote mirror (Supabase project URL + anon key).
    pub sync_url: Option<String>,
    pub sync_key: Option<String>,
    /// Max referee groups surfaced per end of the breakdown.
    pub referee_display_limit: usize,
}

impl AppConfig {
    pub fn from_env() -> TrackerResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| TrackerError::Config(format!("SERVER_PORT: {e}")))?;

        let referee_display_limit = env_var_or("REFEREE_DISPLAY_LIMIT", "5")
            .parse::<usize>()
            .map_err(|e| TrackerError::Config(format!("REFEREE_DISPLAY_LIMIT: {e}")))?;

        let sync_url = std::env::var("SYNC_URL").ok().filter(|s| !s.is_empty());
        let sync_key = std::env::var("SYNC_KEY").ok().filter(|s| !s.is_empty());

        if sync_url.is_some() != sync_key.is_some() {
            return Err(TrackerError::Config(
                "SYNC_URL and SYNC_KEY must be set together".into(),
            ));
        }

        Ok(Self {
            data_dir: PathBuf::from(env_var_or("DATA_DIR", "data")),
            server_port,
            sync_url,
            sync_key,
            referee_display_limit,
        })
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
