//! Calendar domain logic for the milk tracker.
//!
//! All grid derivation and date math lives here; the REST layer only
//! serializes what this module computes. The grid is a pure function of
//! the displayed year/month, today's date and the three state
//! collections, so rendering twice with unchanged inputs yields an
//! identical cell sequence.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use shared::{CalendarFocusDate, CellKind, DayCell, MonthGrid};

/// Cells in a rendered month grid: 6 full weeks
pub const GRID_CELLS: usize = 42;

/// Calendar service: pure grid rendering plus the in-memory focus date
/// used for month navigation. The focus date is not persisted and resets
/// to the current month on restart.
#[derive(Clone)]
pub struct CalendarService {
    focus_date: Arc<Mutex<CalendarFocusDate>>,
}

impl CalendarService {
    pub fn new() -> Self {
        Self {
            focus_date: Arc::new(Mutex::new(CalendarFocusDate::default())),
        }
    }

    /// Render the 42-cell grid for a month.
    ///
    /// Leading cells carry the trailing day numbers of the previous
    /// month, trailing cells the leading day numbers of the next month;
    /// only in-month cells get dates and derived flags.
    pub fn month_grid(
        &self,
        year: i32,
        month: u32,
        today: NaiveDate,
        marks: &BTreeSet<String>,
        notes: &BTreeMap<String, String>,
        holidays: &BTreeMap<String, String>,
    ) -> MonthGrid {
        let days = days_in_month(year, month);
        let first_weekday = first_day_of_month(year, month);
        let mut cells = Vec::with_capacity(GRID_CELLS);

        let (prev_year, prev_month) = previous_month(year, month);
        let prev_last = days_in_month(prev_year, prev_month);
        for i in 0..first_weekday {
            cells.push(padding_cell(
                prev_last - first_weekday + 1 + i,
                CellKind::PrevMonth,
            ));
        }

        for day in 1..=days {
            let date = format_date(year, month, day);
            let is_sunday = NaiveDate::from_ymd_opt(year, month, day)
                .map(|d| d.weekday() == Weekday::Sun)
                .unwrap_or(false);
            let is_today =
                year == today.year() && month == today.month() && day == today.day();
            cells.push(DayCell {
                day,
                kind: CellKind::MonthDay,
                is_today,
                is_marked: marks.contains(&date),
                is_sunday,
                holiday: holidays.get(&format!("{:02}-{:02}", month, day)).cloned(),
                has_note: notes.contains_key(&date),
                date: Some(date),
            });
        }

        let remaining = GRID_CELLS - cells.len();
        for day in 1..=remaining as u32 {
            cells.push(padding_cell(day, CellKind::NextMonth));
        }

        MonthGrid {
            year,
            month,
            first_weekday,
            cells,
        }
    }

    pub fn get_focus_date(&self) -> CalendarFocusDate {
        match self.focus_date.lock() {
            Ok(focus) => focus.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_focus_date(&self, month: u32, year: i32) -> Result<CalendarFocusDate, String> {
        if !(1..=12).contains(&month) {
            return Err(format!("Invalid month: {}. Must be between 1 and 12", month));
        }

        let new_focus = CalendarFocusDate { month, year };
        match self.focus_date.lock() {
            Ok(mut focus) => *focus = new_focus.clone(),
            Err(poisoned) => *poisoned.into_inner() = new_focus.clone(),
        }
        Ok(new_focus)
    }

    pub fn navigate_previous_month(&self) -> CalendarFocusDate {
        let current = self.get_focus_date();
        let (year, month) = previous_month(current.year, current.month);
        // previous_month always yields a valid month
        self.set_focus_date(month, year).unwrap_or(current)
    }

    pub fn navigate_next_month(&self) -> CalendarFocusDate {
        let current = self.get_focus_date();
        let (year, month) = next_month(current.year, current.month);
        self.set_focus_date(month, year).unwrap_or(current)
    }

    /// Jump the focus back to the current month
    pub fn go_to_today(&self) -> CalendarFocusDate {
        let today = CalendarFocusDate::default();
        self.set_focus_date(today.month, today.year)
            .unwrap_or(today)
    }
}

impl Default for CalendarService {
    fn default() -> Self {
        Self::new()
    }
}

fn padding_cell(day: u32, kind: CellKind) -> DayCell {
    DayCell {
        day,
        date: None,
        kind,
        is_today: false,
        is_marked: false,
        is_sunday: false,
        holiday: None,
        has_note: false,
    }
}

/// Number of days in a month, leap-year aware
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Weekday index of day 1 (0 = Sunday, ..., 6 = Saturday)
pub fn first_day_of_month(year: i32, month: u32) -> u32 {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.weekday().num_days_from_sunday(),
        None => 0,
    }
}

pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// ISO `YYYY-MM-DD`
pub fn format_date(year: i32, month: u32, day: u32) -> String {
    format!("{:04}-{:02}-{:02}", year, month, day)
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Invalid Month",
    }
}
