use std::env;
use std::path::PathBuf;

const DATA_DIR_ENV: &str = "ABSENTIA_DATA_DIR";
const DB_FILE_NAME: &str = "absentia.sqlite3";

/// Where the durable backend lives. `db_path: None` keeps the whole store in
/// memory, which is what tests and throwaway sessions use.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    pub db_path: Option<PathBuf>,
}

impl StoreConfig {
    pub fn in_memory() -> Self {
        StoreConfig { db_path: None }
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            db_path: Some(path.into()),
        }
    }

    /// Resolve the default on-disk location: `$ABSENTIA_DATA_DIR` when set,
    /// otherwise the platform data directory, otherwise the temp dir.
    pub fn at_data_dir() -> Self {
        let dir = env::var_os(DATA_DIR_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|d| d.join("absentia")))
            .unwrap_or_else(env::temp_dir);
        StoreConfig {
            db_path: Some(dir.join(DB_FILE_NAME)),
        }
    }
}
