//! Domain services for the milk tracker.

pub mod calendar;
pub mod clock;
pub mod cost;
pub mod holiday;
pub mod marking;
pub mod reminder;

pub use calendar::CalendarService;
pub use cost::{CostError, CostService};
pub use holiday::{HolidayLookup, HolidayProvider, HolidayService};
pub use marking::MarkingService;
pub use reminder::{Notifier, ReminderScheduler};
