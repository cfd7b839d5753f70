//! Cost calculator: totals over the selected months plus the current
//! purchase streak.

use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::info;

use crate::store::LocalStore;
use shared::{CostSummary, SavedPrices};

#[derive(Debug, Error)]
pub enum CostError {
    /// Both prices absent, or no month selected. The calculation is not
    /// performed and previously displayed totals stay untouched.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Derived `YYYY-MM` month key of an ISO date string
pub fn month_key(date: &str) -> Option<&str> {
    date.get(..7).filter(|k| k.as_bytes().get(4) == Some(&b'-'))
}

/// Unit price rule carried over from the source app: a quantity of
/// exactly 1 uses the 1L price, anything else the 0.5L price, with no
/// further per-unit scaling. Known quirk, kept deliberately.
pub fn unit_price(prices: &SavedPrices) -> f64 {
    if prices.quantity == 1.0 {
        prices.price_1l
    } else {
        prices.price_05l
    }
}

/// Totals for the marked dates whose month key is in the selected set.
/// Pure; the intersection is by derived month key, not date equality.
pub fn summarize(
    marks: &BTreeSet<String>,
    selected_months: &BTreeSet<String>,
    prices: &SavedPrices,
    today: NaiveDate,
) -> Result<CostSummary, CostError> {
    if prices.price_1l == 0.0 && prices.price_05l == 0.0 {
        return Err(CostError::InvalidInput(
            "enter at least one price".to_string(),
        ));
    }
    if selected_months.is_empty() {
        return Err(CostError::InvalidInput(
            "select at least one month".to_string(),
        ));
    }

    let total_days = marks
        .iter()
        .filter(|date| {
            month_key(date).is_some_and(|key| selected_months.contains(key))
        })
        .count() as u32;

    Ok(CostSummary {
        total_days,
        total_quantity: total_days as f64 * prices.quantity,
        total_cost: total_days as f64 * unit_price(prices),
        streak: current_streak(marks, today),
    })
}

/// Consecutive marked days ending today; the first unmarked day walking
/// backward breaks the streak. Independent of month selection.
pub fn current_streak(marks: &BTreeSet<String>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut check = today;
    while marks.contains(&check.format("%Y-%m-%d").to_string()) {
        streak += 1;
        check -= Duration::days(1);
    }
    streak
}

/// Store-backed calculator: loads marks and the month selection, runs the
/// pure summary, and persists valid prices like the original app did.
#[derive(Clone)]
pub struct CostService {
    store: LocalStore,
}

impl CostService {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn calculate(
        &self,
        prices: SavedPrices,
        today: NaiveDate,
    ) -> Result<CostSummary, CostError> {
        let marks = self.store.marked_dates().await?;
        let selected = self.store.selected_months().await?;

        let summary = summarize(&marks, &selected, &prices, today)?;

        // prices are only saved once they have produced a valid calculation
        self.store.save_prices(&prices).await?;

        info!(
            "Calculated costs: {} days, {} L, total {:.2}, streak {}",
            summary.total_days, summary.total_quantity, summary.total_cost, summary.streak
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn marks(dates: &[&str]) -> BTreeSet<String> {
        dates.iter().map(|d| d.to_string()).collect()
    }

    fn months(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key("2025-08-26"), Some("2025-08"));
        assert_eq!(month_key("2025-08"), Some("2025-08"));
        assert_eq!(month_key("garbage"), None);
        assert_eq!(month_key(""), None);
    }

    #[test]
    fn ten_marked_days_at_sixty_rupees() {
        // scenario from the requirements: price1L=60, price05L=35,
        // quantity=1, 10 marked days all in the selected month
        let marked: Vec<String> = (1..=10).map(|d| format!("2025-08-{:02}", d)).collect();
        let marked: BTreeSet<String> = marked.into_iter().collect();
        let prices = SavedPrices {
            price_1l: 60.0,
            price_05l: 35.0,
            quantity: 1.0,
        };

        let summary = summarize(&marked, &months(&["2025-08"]), &prices, date("2025-08-26")).unwrap();
        assert_eq!(summary.total_days, 10);
        assert_eq!(summary.total_quantity, 10.0);
        assert_eq!(summary.total_cost, 600.0);
    }

    #[test]
    fn days_straddling_selection_count_only_selected_months() {
        let marked = marks(&[
            "2025-07-30",
            "2025-07-31",
            "2025-08-01",
            "2025-08-02",
            "2025-09-01",
        ]);
        let prices = SavedPrices {
            price_1l: 60.0,
            price_05l: 35.0,
            quantity: 1.0,
        };

        let summary = summarize(
            &marked,
            &months(&["2025-07", "2025-09"]),
            &prices,
            date("2025-08-26"),
        )
        .unwrap();
        assert_eq!(summary.total_days, 3);
    }

    #[test]
    fn non_unit_quantity_uses_half_liter_price() {
        let marked = marks(&["2025-08-01", "2025-08-02"]);
        let prices = SavedPrices {
            price_1l: 60.0,
            price_05l: 35.0,
            quantity: 2.0,
        };

        let summary = summarize(&marked, &months(&["2025-08"]), &prices, date("2025-08-26")).unwrap();
        // the quirky rule: 2 days * 35, not scaled per liter
        assert_eq!(summary.total_cost, 70.0);
        assert_eq!(summary.total_quantity, 4.0);
    }

    #[test]
    fn rejects_when_both_prices_missing() {
        let prices = SavedPrices {
            price_1l: 0.0,
            price_05l: 0.0,
            quantity: 1.0,
        };
        let result = summarize(
            &marks(&["2025-08-01"]),
            &months(&["2025-08"]),
            &prices,
            date("2025-08-26"),
        );
        assert!(matches!(result, Err(CostError::InvalidInput(_))));
    }

    #[test]
    fn rejects_when_no_month_selected() {
        let prices = SavedPrices {
            price_1l: 60.0,
            price_05l: 35.0,
            quantity: 1.0,
        };
        let result = summarize(
            &marks(&["2025-08-01"]),
            &BTreeSet::new(),
            &prices,
            date("2025-08-26"),
        );
        assert!(matches!(result, Err(CostError::InvalidInput(_))));
    }

    #[test]
    fn streak_stops_at_first_gap() {
        // today, yesterday, and 3 days ago marked; gap 2 days ago
        let marked = marks(&["2025-08-26", "2025-08-25", "2025-08-23"]);
        assert_eq!(current_streak(&marked, date("2025-08-26")), 2);
    }

    #[test]
    fn streak_is_zero_when_today_unmarked() {
        let marked = marks(&["2025-08-25", "2025-08-24"]);
        assert_eq!(current_streak(&marked, date("2025-08-26")), 0);
    }

    #[test]
    fn streak_crosses_month_boundary() {
        let marked = marks(&["2025-09-01", "2025-08-31", "2025-08-30"]);
        assert_eq!(current_streak(&marked, date("2025-09-01")), 3);
    }

    #[tokio::test]
    async fn service_persists_prices_after_valid_calculation() {
        let db = Db::init_test().await.unwrap();
        let store = LocalStore::new(db);
        let service = CostService::new(store.clone());

        let mut marked = BTreeSet::new();
        marked.insert("2025-08-01".to_string());
        store.save_marked_dates(&marked).await.unwrap();
        let mut selected = BTreeSet::new();
        selected.insert("2025-08".to_string());
        store.save_selected_months(&selected).await.unwrap();

        let prices = SavedPrices {
            price_1l: 60.0,
            price_05l: 35.0,
            quantity: 1.0,
        };
        let summary = service.calculate(prices, date("2025-08-26")).await.unwrap();
        assert_eq!(summary.total_days, 1);

        let saved = store.saved_prices().await.unwrap().expect("prices saved");
        assert_eq!(saved.price_1l, 60.0);
    }

    #[tokio::test]
    async fn service_rejection_leaves_prices_unsaved() {
        let db = Db::init_test().await.unwrap();
        let store = LocalStore::new(db);
        let service = CostService::new(store.clone());

        let prices = SavedPrices {
            price_1l: 60.0,
            price_05l: 35.0,
            quantity: 1.0,
        };
        // no month selected
        let result = service.calculate(prices, date("2025-08-26")).await;
        assert!(matches!(result, Err(CostError::InvalidInput(_))));
        assert!(store.saved_prices().await.unwrap().is_none());
    }
}
