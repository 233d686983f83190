use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::config::ClientConfig;
use crate::utils::{Coordinates, TemperatureUnit};

const KEY_COORDINATES: &str = "coordinates";
const KEY_LANGUAGE: &str = "language";
const KEY_TEMPERATURE_UNIT: &str = "temperature_unit";
const KEY_THEME: &str = "theme";

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ja,
}

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ja => "ja",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "en" => Some(Language::En),
            "ja" => Some(Language::Ja),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

/// Everything the dashboard remembers between runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub coordinates: Coordinates,
    pub language: Language,
    pub temperature_unit: TemperatureUnit,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            coordinates: Coordinates::DEFAULT,
            language: Language::default(),
            temperature_unit: TemperatureUnit::default(),
            theme: Theme::default(),
        }
    }
}

/// String key-value store backed by a single SQLite table.
#[derive(Clone)]
pub struct PreferenceStore {
    pool: SqlitePool,
}

impl PreferenceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, PreferenceError> {
        let pool = SqlitePool::connect(database_url).await?;
        let store = Self::new(pool);
        store.init_tables().await?;
        Ok(store)
    }

    /// Open the database named by `DASHBOARD_PREFERENCES_DB`.
    pub async fn from_config(config: &ClientConfig) -> Result<Self, PreferenceError> {
        Self::connect(&config.preferences_db).await
    }

    pub async fn init_tables(&self) -> Result<(), PreferenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM preferences WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        sqlx::query(
            r#"
            INSERT INTO preferences (key, value, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn all(&self) -> Result<HashMap<String, String>, PreferenceError> {
        let rows = sqlx::query("SELECT key, value FROM preferences")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("key"), row.get("value")))
            .collect())
    }

    /// Read every preference once. Unknown values fall back to their
    /// defaults; an unreadable coordinates entry is also deleted.
    pub async fn load(&self) -> Result<Preferences, PreferenceError> {
        let stored = self.all().await?;
        let mut prefs = Preferences::default();

        if let Some(raw) = stored.get(KEY_COORDINATES) {
            match parse_coordinates(raw) {
                Ok(coords) => prefs.coordinates = coords,
                Err(e) => {
                    tracing::warn!("Discarding stored coordinates: {}", e);
                    self.remove(KEY_COORDINATES).await?;
                }
            }
        }
        if let Some(language) = stored.get(KEY_LANGUAGE).and_then(|v| Language::parse(v)) {
            prefs.language = language;
        }
        if let Some(unit) = stored
            .get(KEY_TEMPERATURE_UNIT)
            .and_then(|v| TemperatureUnit::parse(v))
        {
            prefs.temperature_unit = unit;
        }
        if let Some(theme) = stored.get(KEY_THEME).and_then(|v| Theme::parse(v)) {
            prefs.theme = theme;
        }

        Ok(prefs)
    }
}

fn parse_coordinates(raw: &str) -> Result<Coordinates, PreferenceError> {
    let coords: Coordinates =
        serde_json::from_str(raw).map_err(|e| PreferenceError::InvalidData(e.to_string()))?;
    Coordinates::new(coords.latitude, coords.longitude).map_err(PreferenceError::InvalidData)
}

/// Loaded preferences plus the store they persist to. Setters only write
/// when the value actually changes.
pub struct Settings {
    store: PreferenceStore,
    current: Preferences,
}

impl Settings {
    pub async fn load(store: PreferenceStore) -> Result<Self, PreferenceError> {
        let current = store.load().await?;
        Ok(Self { store, current })
    }

    pub fn current(&self) -> &Preferences {
        &self.current
    }

    pub async fn set_coordinates(&mut self, coordinates: Coordinates) -> Result<(), PreferenceError> {
        if self.current.coordinates == coordinates {
            return Ok(());
        }
        let raw = serde_json::to_string(&coordinates)
            .map_err(|e| PreferenceError::InvalidData(e.to_string()))?;
        self.store.set(KEY_COORDINATES, &raw).await?;
        self.current.coordinates = coordinates;
        Ok(())
    }

    pub async fn set_language(&mut self, language: Language) -> Result<(), PreferenceError> {
        if self.current.language == language {
            return Ok(());
        }
        self.store.set(KEY_LANGUAGE, language.as_str()).await?;
        self.current.language = language;
        Ok(())
    }

    pub async fn set_temperature_unit(&mut self, unit: TemperatureUnit) -> Result<(), PreferenceError> {
        if self.current.temperature_unit == unit {
            return Ok(());
        }
        self.store.set(KEY_TEMPERATURE_UNIT, unit.as_str()).await?;
        self.current.temperature_unit = unit;
        Ok(())
    }

    pub async fn set_theme(&mut self, theme: Theme) -> Result<(), PreferenceError> {
        if self.current.theme == theme {
            return Ok(());
        }
        self.store.set(KEY_THEME, theme.as_str()).await?;
        self.current.theme = theme;
        Ok(())
    }
}
