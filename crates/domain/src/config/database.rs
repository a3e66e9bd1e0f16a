use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Logical database name reported by the health endpoint and logs.
    #[serde(default = "default_database_id")]
    pub database_id: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    /// Rows fetched per round trip when listing spaces or child documents.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            database_id: default_database_id(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
            page_size: default_page_size(),
        }
    }
}

fn default_db_path() -> String {
    "./spacesweep.db".to_string()
}

fn default_database_id() -> String {
    "(default)".to_string()
}

fn default_max_connections() -> u32 {
    8
}

fn default_busy_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    300
}
