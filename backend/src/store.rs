//! Typed persistence layer over the key/value table.
//!
//! Key names and JSON shapes are the ones the original app kept in
//! localStorage, so an exported browser profile can be imported verbatim.
//! A malformed value under any key falls back to that key's empty default
//! with a warning; startup never aborts on bad data.

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

use crate::db::Db;
use shared::{NotificationSettings, SavedPrices};

const KEY_MARKS: &str = "doodhdaily-marks";
const KEY_NOTES: &str = "doodhdaily-notes";
const KEY_SELECTED_MONTHS: &str = "doodhdaily-selected-months";
const KEY_PRICES: &str = "doodhdaily-prices";
const KEY_THEME: &str = "doodhdaily-theme";
const KEY_NOTIFICATIONS: &str = "doodhdaily-notifications";
const KEY_NEXT_NOTIFICATION: &str = "doodhdaily-next-notification";

/// Cached holiday table for one year/month, with its fetch timestamp
/// (epoch milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidayCacheEntry {
    pub holidays: BTreeMap<String, String>,
    pub timestamp: u64,
}

#[derive(Clone)]
pub struct LocalStore {
    db: Db,
}

impl LocalStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Read a JSON value under `key`, falling back to `T::default()` when
    /// the key is absent or its payload fails to parse.
    async fn load_json<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.db.get_value(key).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!("Discarding malformed data under '{}': {}", key, e);
                    Ok(T::default())
                }
            },
            None => Ok(T::default()),
        }
    }

    async fn save_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.db.put_value(key, &serde_json::to_string(value)?).await
    }

    /// Untyped access for the values passthrough endpoint
    pub async fn raw_value(&self, key: &str) -> Result<Option<String>> {
        self.db.get_value(key).await
    }

    pub async fn set_raw_value(&self, key: &str, value: &str) -> Result<()> {
        self.db.put_value(key, value).await
    }

    pub async fn marked_dates(&self) -> Result<BTreeSet<String>> {
        self.load_json(KEY_MARKS).await
    }

    pub async fn save_marked_dates(&self, marks: &BTreeSet<String>) -> Result<()> {
        self.save_json(KEY_MARKS, marks).await
    }

    /// Notes are persisted as an array of `[date, note]` pairs, the shape
    /// the original app produced by spreading a Map.
    pub async fn day_notes(&self) -> Result<BTreeMap<String, String>> {
        let pairs: Vec<(String, String)> = self.load_json(KEY_NOTES).await?;
        Ok(pairs.into_iter().collect())
    }

    pub async fn save_day_notes(&self, notes: &BTreeMap<String, String>) -> Result<()> {
        let pairs: Vec<(&String, &String)> = notes.iter().collect();
        self.save_json(KEY_NOTES, &pairs).await
    }

    pub async fn selected_months(&self) -> Result<BTreeSet<String>> {
        self.load_json(KEY_SELECTED_MONTHS).await
    }

    pub async fn save_selected_months(&self, months: &BTreeSet<String>) -> Result<()> {
        self.save_json(KEY_SELECTED_MONTHS, months).await
    }

    pub async fn saved_prices(&self) -> Result<Option<SavedPrices>> {
        self.load_json(KEY_PRICES).await
    }

    pub async fn save_prices(&self, prices: &SavedPrices) -> Result<()> {
        self.save_json(KEY_PRICES, prices).await
    }

    /// The theme is stored as a bare string, not JSON
    pub async fn theme(&self) -> Result<String> {
        Ok(self
            .db
            .get_value(KEY_THEME)
            .await?
            .unwrap_or_else(|| "light".to_string()))
    }

    pub async fn save_theme(&self, theme: &str) -> Result<()> {
        self.db.put_value(KEY_THEME, theme).await
    }

    pub async fn notification_settings(&self) -> Result<NotificationSettings> {
        match self.db.get_value(KEY_NOTIFICATIONS).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(settings) => Ok(settings),
                Err(e) => {
                    warn!("Discarding malformed notification settings: {}", e);
                    Ok(NotificationSettings::default())
                }
            },
            None => Ok(NotificationSettings::default()),
        }
    }

    pub async fn save_notification_settings(&self, settings: &NotificationSettings) -> Result<()> {
        self.save_json(KEY_NOTIFICATIONS, settings).await
    }

    /// Informational record of when the next reminder will fire
    pub async fn next_notification(&self) -> Result<Option<String>> {
        self.db.get_value(KEY_NEXT_NOTIFICATION).await
    }

    pub async fn set_next_notification(&self, when: &str) -> Result<()> {
        self.db.put_value(KEY_NEXT_NOTIFICATION, when).await
    }

    pub async fn clear_next_notification(&self) -> Result<()> {
        self.db.delete_value(KEY_NEXT_NOTIFICATION).await?;
        Ok(())
    }

    fn holiday_cache_key(year: i32, month: u32) -> String {
        format!("all-holidays-{}-{:02}", year, month)
    }

    /// Returns `None` on a missing or unparseable cache entry; age-based
    /// expiry is the holiday service's concern.
    pub async fn holiday_cache(&self, year: i32, month: u32) -> Result<Option<HolidayCacheEntry>> {
        let key = Self::holiday_cache_key(year, month);
        match self.db.get_value(&key).await? {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(entry) => Ok(Some(entry)),
                Err(e) => {
                    warn!("Discarding malformed holiday cache '{}': {}", key, e);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    pub async fn save_holiday_cache(
        &self,
        year: i32,
        month: u32,
        entry: &HolidayCacheEntry,
    ) -> Result<()> {
        self.save_json(&Self::holiday_cache_key(year, month), entry)
            .await
    }
}
