//! Read-through holiday cache over the Calendarific provider.
//!
//! A cache entry covers one year/month and stays valid for 60 days.
//! Provider failures degrade to whatever is cached (possibly nothing)
//! plus a warning; the calendar keeps rendering either way.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::clock::Clock;
use crate::store::{HolidayCacheEntry, LocalStore};

/// Cache validity window: 60 days, like the original app's "2 months"
pub const CACHE_VALIDITY_MS: u64 = 60 * 24 * 60 * 60 * 1000;

const DEFAULT_BASE_URL: &str = "https://calendarific.com/api/v2";
const DEFAULT_COUNTRY: &str = "IN";

/// One holiday record as the provider returns it
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderHoliday {
    pub name: String,
    pub date: ProviderDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderDate {
    /// ISO date, possibly with a time suffix (`2025-08-15` or longer)
    pub iso: String,
}

#[async_trait]
pub trait HolidayProvider: Send + Sync {
    /// Fetch the holidays of one year/month
    async fn fetch(&self, year: i32, month: u32) -> Result<Vec<ProviderHoliday>>;
}

#[derive(Debug, Deserialize)]
struct CalendarificEnvelope {
    response: CalendarificBody,
}

#[derive(Debug, Deserialize)]
struct CalendarificBody {
    #[serde(default)]
    holidays: Vec<ProviderHoliday>,
}

/// reqwest-backed Calendarific client; the only network dependency of
/// the application
pub struct CalendarificClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    country: String,
}

impl CalendarificClient {
    pub fn new(api_key: String, country: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            country,
        }
    }

    /// Configure from `DOODH_HOLIDAY_API_KEY` / `DOODH_HOLIDAY_COUNTRY`
    pub fn from_env() -> Self {
        let api_key = std::env::var("DOODH_HOLIDAY_API_KEY").unwrap_or_default();
        let country =
            std::env::var("DOODH_HOLIDAY_COUNTRY").unwrap_or_else(|_| DEFAULT_COUNTRY.to_string());
        Self::new(api_key, country)
    }
}

#[async_trait]
impl HolidayProvider for CalendarificClient {
    async fn fetch(&self, year: i32, month: u32) -> Result<Vec<ProviderHoliday>> {
        let url = format!("{}/holidays", self.base_url);
        let envelope: CalendarificEnvelope = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("country", self.country.as_str()),
            ])
            .query(&[("year", year)])
            .query(&[("month", month)])
            .send()
            .await
            .context("holiday request failed")?
            .error_for_status()
            .context("holiday provider returned an error status")?
            .json()
            .await
            .context("could not parse holiday response")?;

        Ok(envelope.response.holidays)
    }
}

/// Map provider records to `MM-DD -> name`; collisions resolve
/// last-write-wins, so each `MM-DD` carries at most one name.
pub fn map_holidays(records: &[ProviderHoliday]) -> BTreeMap<String, String> {
    let mut mapped = BTreeMap::new();
    for record in records {
        if let Some(key) = record.date.iso.get(5..10) {
            mapped.insert(key.to_string(), record.name.clone());
        }
    }
    mapped
}

/// Result of a holiday lookup. The warning is set when the provider
/// could not be reached and the table is stale or empty.
#[derive(Debug, Clone, Default)]
pub struct HolidayLookup {
    pub table: BTreeMap<String, String>,
    pub warning: Option<String>,
}

#[derive(Clone)]
pub struct HolidayService {
    store: LocalStore,
    provider: Arc<dyn HolidayProvider>,
    clock: Arc<dyn Clock>,
}

impl HolidayService {
    pub fn new(store: LocalStore, provider: Arc<dyn HolidayProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            provider,
            clock,
        }
    }

    /// Read-through lookup for one year/month.
    ///
    /// Cache hits inside the validity window never touch the network; a
    /// miss issues exactly one provider request and writes the mapped
    /// table back with a fresh timestamp.
    pub async fn get_holidays(&self, year: i32, month: u32) -> Result<HolidayLookup> {
        let now = self.clock.now_ms();
        let cached = self.store.holiday_cache(year, month).await?;

        if let Some(entry) = &cached {
            if now.saturating_sub(entry.timestamp) < CACHE_VALIDITY_MS {
                return Ok(HolidayLookup {
                    table: entry.holidays.clone(),
                    warning: None,
                });
            }
        }

        match self.provider.fetch(year, month).await {
            Ok(records) => {
                let table = map_holidays(&records);
                let entry = HolidayCacheEntry {
                    holidays: table.clone(),
                    timestamp: now,
                };
                self.store.save_holiday_cache(year, month, &entry).await?;
                info!("Loaded {} holidays for {}-{:02}", table.len(), year, month);
                Ok(HolidayLookup {
                    table,
                    warning: None,
                })
            }
            Err(e) => {
                warn!("Could not load holidays for {}-{:02}: {:#}", year, month, e);
                Ok(HolidayLookup {
                    // keep serving the expired entry rather than nothing
                    table: cached.map(|c| c.holidays).unwrap_or_default(),
                    warning: Some("Could not load holidays".to_string()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use crate::domain::clock::ManualClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingProvider {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait]
    impl HolidayProvider for CountingProvider {
        async fn fetch(&self, _year: i32, _month: u32) -> Result<Vec<ProviderHoliday>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(vec![
                ProviderHoliday {
                    name: "Independence Day".to_string(),
                    date: ProviderDate {
                        iso: "2025-08-15".to_string(),
                    },
                },
                ProviderHoliday {
                    name: "Janmashtami".to_string(),
                    date: ProviderDate {
                        iso: "2025-08-16T00:00:00+05:30".to_string(),
                    },
                },
            ])
        }
    }

    async fn setup(fail: bool) -> (HolidayService, Arc<CountingProvider>, Arc<ManualClock>) {
        let db = Db::init_test().await.unwrap();
        let store = LocalStore::new(db);
        let provider = Arc::new(CountingProvider::new(fail));
        let clock = Arc::new(ManualClock::new(1_724_500_000_000));
        let service = HolidayService::new(store, provider.clone(), clock.clone());
        (service, provider, clock)
    }

    #[test]
    fn mapping_uses_mm_dd_keys_and_last_write_wins() {
        let records = vec![
            ProviderHoliday {
                name: "First".to_string(),
                date: ProviderDate {
                    iso: "2025-01-26".to_string(),
                },
            },
            ProviderHoliday {
                name: "Second".to_string(),
                date: ProviderDate {
                    iso: "2025-01-26T00:00:00+05:30".to_string(),
                },
            },
            ProviderHoliday {
                name: "Short".to_string(),
                date: ProviderDate {
                    iso: "bad".to_string(),
                },
            },
        ];

        let mapped = map_holidays(&records);
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped.get("01-26").map(String::as_str), Some("Second"));
    }

    #[tokio::test]
    async fn second_call_inside_window_does_not_refetch() {
        let (service, provider, _clock) = setup(false).await;

        let first = service.get_holidays(2025, 8).await.unwrap();
        assert_eq!(
            first.table.get("08-15").map(String::as_str),
            Some("Independence Day")
        );
        assert!(first.warning.is_none());

        let second = service.get_holidays(2025, 8).await.unwrap();
        assert_eq!(second.table, first.table);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_refetch() {
        let (service, provider, clock) = setup(false).await;

        service.get_holidays(2025, 8).await.unwrap();
        // 61 days later the entry is stale
        clock.advance(61 * 24 * 60 * 60 * 1000);
        service.get_holidays(2025, 8).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn entry_just_inside_window_still_counts_as_hit() {
        let (service, provider, clock) = setup(false).await;

        service.get_holidays(2025, 8).await.unwrap();
        clock.advance(CACHE_VALIDITY_MS - 1);
        service.get_holidays(2025, 8).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn network_failure_yields_warning_not_error() {
        let (service, provider, _clock) = setup(true).await;

        let lookup = service.get_holidays(2025, 8).await.unwrap();
        assert!(lookup.table.is_empty());
        assert!(lookup.warning.is_some());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_after_expiry_serves_stale_table() {
        let db = Db::init_test().await.unwrap();
        let store = LocalStore::new(db);
        let clock = Arc::new(ManualClock::new(1_724_500_000_000));

        let good = HolidayService::new(
            store.clone(),
            Arc::new(CountingProvider::new(false)),
            clock.clone(),
        );
        good.get_holidays(2025, 8).await.unwrap();

        clock.advance(61 * 24 * 60 * 60 * 1000);
        let failing =
            HolidayService::new(store, Arc::new(CountingProvider::new(true)), clock.clone());
        let lookup = failing.get_holidays(2025, 8).await.unwrap();

        assert!(lookup.warning.is_some());
        assert_eq!(
            lookup.table.get("08-15").map(String::as_str),
            Some("Independence Day")
        );
    }

    #[tokio::test]
    async fn caches_are_scoped_per_month() {
        let (service, provider, _clock) = setup(false).await;

        service.get_holidays(2025, 8).await.unwrap();
        service.get_holidays(2025, 9).await.unwrap();

        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }
}
