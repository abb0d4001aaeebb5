// ==========================================
// Sigorta CRM - configuration manager
// ==========================================
// Configuration lives in the config_kv table (key/value, global scope).
// Missing keys fall back to compiled defaults; a malformed stored value is
// an error rather than a silent fallback.
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::DateRepairMode;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// Well-known configuration keys.
pub mod config_keys {
    pub const BATCH_SIZE: &str = "import/batch_size";
    pub const DATE_REPAIR_MODE: &str = "import/date_repair_mode";
    pub const FLAG_INTRA_BATCH_DUPLICATES: &str = "import/flag_intra_batch_duplicates";
    pub const CORRECTION_RATIO_THRESHOLD: &str = "correction/ratio_threshold";
    pub const CORRECTION_ABSOLUTE_THRESHOLD: &str = "correction/absolute_threshold";
}

pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Reuse an existing connection; the unified PRAGMAs are re-applied
    /// (idempotent).
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let guard = conn.lock().map_err(|e| format!("lock poisoned: {e}"))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("lock poisoned: {e}"))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// Write a global-scope configuration value (used by tests and the CLI).
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("lock poisoned: {e}"))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_batch_size(&self) -> Result<usize, Box<dyn Error>> {
        match self.get_config_value(config_keys::BATCH_SIZE)? {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("invalid {}: {}", config_keys::BATCH_SIZE, raw).into()),
            None => Ok(100),
        }
    }

    async fn get_date_repair_mode(&self) -> Result<DateRepairMode, Box<dyn Error>> {
        match self.get_config_value(config_keys::DATE_REPAIR_MODE)? {
            Some(raw) => DateRepairMode::parse(&raw)
                .ok_or_else(|| format!("invalid {}: {}", config_keys::DATE_REPAIR_MODE, raw).into()),
            None => Ok(DateRepairMode::Coerce),
        }
    }

    async fn get_flag_intra_batch_duplicates(&self) -> Result<bool, Box<dyn Error>> {
        match self.get_config_value(config_keys::FLAG_INTRA_BATCH_DUPLICATES)? {
            Some(raw) => match raw.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                other => Err(format!(
                    "invalid {}: {}",
                    config_keys::FLAG_INTRA_BATCH_DUPLICATES,
                    other
                )
                .into()),
            },
            None => Ok(true),
        }
    }

    async fn get_correction_ratio_threshold(&self) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(config_keys::CORRECTION_RATIO_THRESHOLD)? {
            Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
                format!("invalid {}: {}", config_keys::CORRECTION_RATIO_THRESHOLD, raw).into()
            }),
            None => Ok(5.0),
        }
    }

    async fn get_correction_absolute_threshold(&self) -> Result<f64, Box<dyn Error>> {
        match self.get_config_value(config_keys::CORRECTION_ABSOLUTE_THRESHOLD)? {
            Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
                format!(
                    "invalid {}: {}",
                    config_keys::CORRECTION_ABSOLUTE_THRESHOLD,
                    raw
                )
                .into()
            }),
            None => Ok(10000.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_keys_missing() {
        let config = manager();
        assert_eq!(config.get_batch_size().await.unwrap(), 100);
        assert_eq!(
            config.get_date_repair_mode().await.unwrap(),
            DateRepairMode::Coerce
        );
        assert!(config.get_flag_intra_batch_duplicates().await.unwrap());
        assert_eq!(config.get_correction_ratio_threshold().await.unwrap(), 5.0);
    }

    #[tokio::test]
    async fn test_set_and_read_back() {
        let config = manager();
        config
            .set_config_value(config_keys::BATCH_SIZE, "250")
            .unwrap();
        assert_eq!(config.get_batch_size().await.unwrap(), 250);

        // upsert overwrites
        config
            .set_config_value(config_keys::BATCH_SIZE, "50")
            .unwrap();
        assert_eq!(config.get_batch_size().await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_malformed_value_is_an_error() {
        let config = manager();
        config
            .set_config_value(config_keys::BATCH_SIZE, "many")
            .unwrap();
        assert!(config.get_batch_size().await.is_err());
    }

    #[tokio::test]
    async fn test_repair_mode_parsing() {
        let config = manager();
        config
            .set_config_value(config_keys::DATE_REPAIR_MODE, "reject")
            .unwrap();
        assert_eq!(
            config.get_date_repair_mode().await.unwrap(),
            DateRepairMode::Reject
        );
    }
}
