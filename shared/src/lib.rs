use chrono::Datelike;
use serde::{Deserialize, Serialize};

pub mod interaction;

/// Generic key/value pair for the values passthrough endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Type of calendar cell for explicit rendering logic
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CellKind {
    /// Trailing day of the previous month filling the leading grid slots
    PrevMonth,
    /// Actual day within the displayed month
    MonthDay,
    /// Leading day of the next month filling the grid up to 42 cells
    NextMonth,
}

/// A single cell of the 6-week calendar grid.
///
/// All flags are derived from the date and the state collections at render
/// time; none of them is stored independently. Cells outside the displayed
/// month carry only their day number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayCell {
    pub day: u32,
    /// ISO `YYYY-MM-DD`, only present for in-month cells
    pub date: Option<String>,
    pub kind: CellKind,
    pub is_today: bool,
    pub is_marked: bool,
    pub is_sunday: bool,
    /// Holiday display name, if the provider knows one for this date
    pub holiday: Option<String>,
    pub has_note: bool,
}

/// A rendered calendar month: always exactly 42 cells (6 full weeks)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    /// Weekday index of day 1 (0 = Sunday, ..., 6 = Saturday)
    pub first_weekday: u32,
    pub cells: Vec<DayCell>,
}

/// Response for the calendar endpoint; the warning is set when holiday
/// data could not be loaded and the grid rendered without it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarResponse {
    pub grid: MonthGrid,
    pub holiday_warning: Option<String>,
}

/// The month/year the calendar is currently focused on.
///
/// Kept in memory only; resets to the current date on restart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarFocusDate {
    pub month: u32,
    pub year: i32,
}

impl Default for CalendarFocusDate {
    fn default() -> Self {
        let now = chrono::Local::now();
        Self {
            month: now.month(),
            year: now.year(),
        }
    }
}

/// Detail view data for a single day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayDetail {
    pub date: String,
    pub is_marked: bool,
    pub note: Option<String>,
    pub holiday: Option<String>,
}

/// Result of resolving a day gesture against the application state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayActionResponse {
    pub detail: DayDetail,
    /// True when the detail view should open focused on the note editor
    /// (double activation marks first, then invites a note)
    pub focus_note: bool,
    /// True for the read-only long-press holiday view
    pub read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetNoteRequest {
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToggleMarkResponse {
    pub date: String,
    pub is_marked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToggleMonthResponse {
    pub month_key: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedMonthsResponse {
    pub months: Vec<String>,
}

/// Milk prices and daily quantity, persisted under `doodhdaily-prices`.
///
/// Field names match the original persisted JSON shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SavedPrices {
    #[serde(rename = "price1L")]
    pub price_1l: f64,
    #[serde(rename = "price05L")]
    pub price_05l: f64,
    pub quantity: f64,
}

/// Totals produced by the cost calculator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostSummary {
    /// Marked dates whose month key is in the selected set
    pub total_days: u32,
    /// Liters: `total_days * quantity`
    pub total_quantity: f64,
    pub total_cost: f64,
    /// Consecutive marked days ending today, independent of month selection
    pub streak: u32,
}

/// Daily reminder settings, persisted under `doodhdaily-notifications`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationSettings {
    pub enabled: bool,
    /// Fixed at "12:00"; kept in the payload for forward compatibility
    pub time: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            time: "12:00".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_prices_round_trips_original_field_names() {
        let json = r#"{"price1L":60.0,"price05L":35.0,"quantity":1.0}"#;
        let prices: SavedPrices = serde_json::from_str(json).unwrap();
        assert_eq!(prices.price_1l, 60.0);
        assert_eq!(prices.price_05l, 35.0);
        assert_eq!(prices.quantity, 1.0);

        let back = serde_json::to_string(&prices).unwrap();
        assert!(back.contains("price1L"));
        assert!(back.contains("price05L"));
    }

    #[test]
    fn notification_settings_default_is_disabled_at_noon() {
        let settings = NotificationSettings::default();
        assert!(!settings.enabled);
        assert_eq!(settings.time, "12:00");
    }

    #[test]
    fn focus_date_default_is_current_month() {
        let focus = CalendarFocusDate::default();
        assert!((1..=12).contains(&focus.month));
        assert!(focus.year >= 2025);
    }
}
