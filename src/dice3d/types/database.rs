//! Embedded SurrealDB database for preferences.
//!
//! This module provides persistent storage for:
//! - app settings (name, group, colors, realtime endpoint)
//! - notation history for the roll input

use bevy::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use std::sync::Mutex;

use surrealdb::engine::local::{Db, Mem, SurrealKv};
use surrealdb::Surreal;

/// SurrealDB folder name (embedded database).
const DATABASE_FOLDER: &str = "preferences.surrealdb";
/// App data folder name.
const APP_DATA_FOLDER: &str = "DiceTray";

const NS: &str = "dicetray";
const DB: &str = "dicetray";

/// Most recent notations kept in history.
pub const NOTATION_HISTORY_LIMIT: usize = 30;

/// Resource for the preference database.
#[derive(Resource)]
pub struct PreferenceStore {
    rt: tokio::runtime::Runtime,
    db: Mutex<Surreal<Db>>,
    /// Path to the embedded datastore.
    pub db_path: PathBuf,
}

impl PreferenceStore {
    /// Per-user data directory: `%LOCALAPPDATA%`, `~/Library/Application Support`
    /// or `$XDG_DATA_HOME` (`~/.local/share`), falling back to the working directory.
    fn data_dir() -> Result<PathBuf, String> {
        let home = || std::env::var_os("HOME").map(PathBuf::from);

        let base = if cfg!(target_os = "windows") {
            std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            home().map(|h| h.join("Library").join("Application Support"))
        } else {
            std::env::var_os("XDG_DATA_HOME")
                .map(PathBuf::from)
                .or_else(|| home().map(|h| h.join(".local").join("share")))
        };

        let Some(base) = base else {
            return std::env::current_dir()
                .map_err(|e| format!("No data directory available: {}", e));
        };

        let dir = base.join(APP_DATA_FOLDER);
        std::fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create data directory {:?}: {}", dir, e))?;
        Ok(dir)
    }

    fn make_runtime() -> Result<tokio::runtime::Runtime, String> {
        tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create tokio runtime: {}", e))
    }

    async fn init(db: &Surreal<Db>) -> Result<(), String> {
        db.use_ns(NS)
            .use_db(DB)
            .await
            .map_err(|e| format!("Failed to select namespace/db: {}", e))?;

        let schema = r#"
            DEFINE TABLE setting SCHEMALESS;
            DEFINE TABLE notation_history SCHEMALESS;
        "#;

        db.query(schema)
            .await
            .map_err(|e| format!("Failed to initialize schema: {}", e))?;

        Ok(())
    }

    /// Open or create the store in the per-user data directory.
    pub fn open() -> Result<Self, String> {
        Self::open_at(Self::data_dir()?.join(DATABASE_FOLDER))
    }

    /// Open the store at `path`, creating the datastore directory.
    pub fn open_at(path: PathBuf) -> Result<Self, String> {
        let rt = Self::make_runtime()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create database folder {:?}: {}", parent, e))?;
        }
        std::fs::create_dir_all(&path)
            .map_err(|e| format!("Failed to create SurrealDB datastore dir {:?}: {}", path, e))?;

        let db = rt
            .block_on(async { Surreal::new::<SurrealKv>(path.to_string_lossy().to_string()).await })
            .map_err(|e| format!("Failed to open SurrealDB: {}", e))?;

        rt.block_on(Self::init(&db))?;

        Ok(Self {
            rt,
            db: Mutex::new(db),
            db_path: path,
        })
    }

    /// Volatile store, used by tests.
    pub fn open_in_memory() -> Result<Self, String> {
        let rt = Self::make_runtime()?;
        let db = rt
            .block_on(async { Surreal::new::<Mem>(()).await })
            .map_err(|e| format!("Failed to open SurrealDB (mem): {}", e))?;

        rt.block_on(Self::init(&db))?;

        Ok(Self {
            rt,
            db: Mutex::new(db),
            db_path: PathBuf::new(),
        })
    }

    fn with_db<T>(&self, f: impl FnOnce(&Surreal<Db>) -> Result<T, String>) -> Result<T, String> {
        let db = self.db.lock().map_err(|e| e.to_string())?;
        f(&db)
    }

    /// Load a document by key from the `setting` table.
    pub fn get_setting<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, String> {
        let key = key.to_owned();
        self.with_db(move |db| {
            self.rt.block_on(async {
                #[derive(Deserialize)]
                struct SettingRecord {
                    value: String,
                }

                let record: Option<SettingRecord> = db
                    .select(("setting", key.clone()))
                    .await
                    .map_err(|e| format!("Failed to load setting '{}': {}", key, e))?;

                record
                    .map(|record| {
                        serde_json::from_str(&record.value).map_err(|e| {
                            format!("Failed to decode setting '{}' from JSON string: {}", key, e)
                        })
                    })
                    .transpose()
            })
        })
    }

    /// Upsert a document by key into the `setting` table.
    pub fn set_setting<T: Serialize + 'static>(&self, key: &str, value: T) -> Result<(), String> {
        let key = key.to_owned();
        self.with_db(move |db| {
            self.rt.block_on(async {
                // Settings are stored as a JSON string under `value` so the
                // record shape stays stable whatever the settings look like.
                let json_string = serde_json::to_string(&value).map_err(|e| {
                    format!(
                        "Failed to serialize setting '{}' to JSON string: {}",
                        key, e
                    )
                })?;

                #[derive(Serialize)]
                struct SettingDoc {
                    value: String,
                }

                let _: Option<JsonValue> = db
                    .upsert(("setting", key.clone()))
                    .content(SettingDoc { value: json_string })
                    .await
                    .map_err(|e| format!("Failed to save setting '{}': {}", key, e))?;
                Ok(())
            })
        })
    }

    pub fn load_notation_history(&self) -> Result<Vec<String>, String> {
        #[derive(Serialize, Deserialize, Default)]
        struct Doc {
            notations: Vec<String>,
        }

        let doc: Option<Doc> = self.with_db(|db| {
            self.rt.block_on(async {
                db.select(("notation_history", "default"))
                    .await
                    .map_err(|e| format!("Failed to load notation history: {}", e))
            })
        })?;

        Ok(doc.unwrap_or_default().notations)
    }

    pub fn save_notation_history(&self, notations: &[String]) -> Result<(), String> {
        #[derive(Serialize, Deserialize)]
        struct Doc {
            notations: Vec<String>,
        }

        let start = notations.len().saturating_sub(NOTATION_HISTORY_LIMIT);

        self.with_db(|db| {
            self.rt.block_on(async {
                let _: Option<JsonValue> = db
                    .upsert(("notation_history", "default"))
                    .content(Doc {
                        notations: notations[start..].to_vec(),
                    })
                    .await
                    .map_err(|e| format!("Failed to save notation history: {}", e))?;
                Ok(())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice3d::types::{AppSettings, ColorSetting};
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn test_settings_round_trip_in_memory() {
        let db = PreferenceStore::open_in_memory().unwrap();
        assert!(db.get_setting::<AppSettings>("app_settings").unwrap().is_none());

        let settings = AppSettings {
            name: "quiet-otter".to_string(),
            group: "table-7".to_string(),
            dice_color: ColorSetting::rgb(0.0, 0.5, 1.0),
            ..Default::default()
        };
        db.set_setting("app_settings", settings.clone()).unwrap();

        let loaded: AppSettings = db.get_setting("app_settings").unwrap().unwrap();
        assert_eq!(loaded.name, "quiet-otter");
        assert_eq!(loaded.group, "table-7");
        assert!((loaded.dice_color.g - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_primitive_setting_round_trip() {
        let db = PreferenceStore::open_in_memory().unwrap();
        db.set_setting("share_rolls", false).unwrap();
        assert_eq!(db.get_setting::<bool>("share_rolls").unwrap(), Some(false));
    }

    #[test]
    fn test_notation_history_is_bounded() {
        let db = PreferenceStore::open_in_memory().unwrap();
        assert!(db.load_notation_history().unwrap().is_empty());

        let notations: Vec<String> = (1..=40).map(|n| format!("{}d6", n)).collect();
        db.save_notation_history(&notations).unwrap();

        let loaded = db.load_notation_history().unwrap();
        assert_eq!(loaded.len(), NOTATION_HISTORY_LIMIT);
        assert_eq!(loaded.last().map(String::as_str), Some("40d6"));
    }

    #[test]
    fn test_settings_persist_to_disk_round_trip() {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let path = std::env::temp_dir().join(format!("dicetray-test-{}", ts));

        {
            let db = PreferenceStore::open_at(path.clone()).unwrap();
            let settings = AppSettings {
                group: "persisted".to_string(),
                share_rolls: false,
                ..Default::default()
            };
            db.set_setting("app_settings", settings).unwrap();
        }

        {
            let db = PreferenceStore::open_at(path.clone()).unwrap();
            let loaded: AppSettings = db.get_setting("app_settings").unwrap().unwrap();
            assert_eq!(loaded.group, "persisted");
            assert!(!loaded.share_rolls);
        }

        // Best-effort cleanup.
        let _ = std::fs::remove_dir_all(&path);
    }
}
