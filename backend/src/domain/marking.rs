//! Marks, day notes and the calculator's month selection.
//!
//! Every mutation persists immediately; nothing is batched. Dates are
//! ISO `YYYY-MM-DD` strings and month keys are `YYYY-MM`, the same
//! representations the grid renderer and cost calculator consume.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::info;

use crate::domain::cost::month_key;
use crate::store::LocalStore;
use shared::interaction::DayAction;
use shared::{DayActionResponse, DayDetail};

#[derive(Clone)]
pub struct MarkingService {
    store: LocalStore,
}

impl MarkingService {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    /// Toggle the mark for a date and persist. Returns the new state.
    /// Toggling twice restores the original state.
    pub async fn toggle_mark(&self, date: &str) -> Result<bool> {
        validate_date(date)?;

        let mut marks = self.store.marked_dates().await?;
        let is_marked = if marks.remove(date) {
            false
        } else {
            marks.insert(date.to_string());
            true
        };
        self.store.save_marked_dates(&marks).await?;

        info!(
            "{} milk purchase on {}",
            if is_marked { "Marked" } else { "Unmarked" },
            date
        );
        Ok(is_marked)
    }

    /// Store a note for a date; blank text removes the note instead.
    pub async fn set_note(&self, date: &str, text: &str) -> Result<()> {
        validate_date(date)?;

        let mut notes = self.store.day_notes().await?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            notes.remove(date);
        } else {
            notes.insert(date.to_string(), trimmed.to_string());
        }
        self.store.save_day_notes(&notes).await
    }

    /// Detail view data for one date. Read-only.
    pub async fn day_detail(
        &self,
        date: &str,
        holidays: &BTreeMap<String, String>,
    ) -> Result<DayDetail> {
        validate_date(date)?;

        let marks = self.store.marked_dates().await?;
        let notes = self.store.day_notes().await?;
        Ok(DayDetail {
            date: date.to_string(),
            is_marked: marks.contains(date),
            note: notes.get(date).cloned(),
            // holiday tables are keyed MM-DD
            holiday: date.get(5..10).and_then(|k| holidays.get(k)).cloned(),
        })
    }

    /// Map a resolved gesture onto state operations.
    ///
    /// Single activation opens the detail without mutating anything, a
    /// double activation toggles the mark first and opens the detail on
    /// the note editor, a long press yields the read-only holiday view.
    pub async fn resolve_gesture(
        &self,
        action: DayAction,
        date: &str,
        holidays: &BTreeMap<String, String>,
    ) -> Result<DayActionResponse> {
        match action {
            DayAction::OpenDetail => Ok(DayActionResponse {
                detail: self.day_detail(date, holidays).await?,
                focus_note: false,
                read_only: false,
            }),
            DayAction::QuickMark => {
                self.toggle_mark(date).await?;
                Ok(DayActionResponse {
                    detail: self.day_detail(date, holidays).await?,
                    focus_note: true,
                    read_only: false,
                })
            }
            DayAction::HolidayInfo => Ok(DayActionResponse {
                detail: self.day_detail(date, holidays).await?,
                focus_note: false,
                read_only: true,
            }),
        }
    }

    /// Toggle one month's membership in the cost selection
    pub async fn toggle_month(&self, key: &str) -> Result<bool> {
        validate_month_key(key)?;

        let mut months = self.store.selected_months().await?;
        let selected = if months.remove(key) {
            false
        } else {
            months.insert(key.to_string());
            true
        };
        self.store.save_selected_months(&months).await?;
        Ok(selected)
    }

    pub async fn selected_months(&self) -> Result<Vec<String>> {
        Ok(self.store.selected_months().await?.into_iter().collect())
    }

    /// Select all twelve months of a calendar year
    pub async fn select_all_months(&self, year: i32) -> Result<()> {
        let mut months = self.store.selected_months().await?;
        for m in 1..=12 {
            months.insert(format!("{:04}-{:02}", year, m));
        }
        self.store.save_selected_months(&months).await
    }

    /// Deselect all months of a calendar year; other years are untouched
    pub async fn clear_all_months(&self, year: i32) -> Result<()> {
        let prefix = format!("{:04}-", year);
        let mut months = self.store.selected_months().await?;
        months.retain(|key| !key.starts_with(&prefix));
        self.store.save_selected_months(&months).await
    }
}

fn validate_date(date: &str) -> Result<()> {
    if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        bail!("invalid date '{}': expected YYYY-MM-DD", date);
    }
    Ok(())
}

fn validate_month_key(key: &str) -> Result<()> {
    let valid = key.len() == 7
        && month_key(key).is_some()
        && key[..4].chars().all(|c| c.is_ascii_digit())
        && key[5..].parse::<u32>().map_or(false, |m| (1..=12).contains(&m));
    if !valid {
        bail!("invalid month key '{}': expected YYYY-MM", key);
    }
    Ok(())
}
