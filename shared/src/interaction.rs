//! Day-cell gesture disambiguation.
//!
//! The original UI distinguished single tap, double tap and long press with
//! ad-hoc closures over click counters and timers. Here the same timing
//! rules are an explicit state machine driven by three events (`press`,
//! `release` and `poll`), each carrying the current time in milliseconds.
//! Because the caller supplies the timestamps, the machine is fully
//! deterministic and the timing windows are testable without real timers.

use serde::{Deserialize, Serialize};

/// Window inside which a second activation counts as a double tap
pub const DOUBLE_TAP_WINDOW_MS: u64 = 300;

/// Hold duration after which a press becomes a long press
pub const LONG_PRESS_MS: u64 = 800;

/// Outcome of a resolved gesture. Outcomes are mutually exclusive per
/// gesture: a long press that fires suppresses the pending tap, and a
/// double tap suppresses the pending single-tap action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayAction {
    /// Single tap: open the day detail view without mutating state
    OpenDetail,
    /// Double tap: toggle the mark, then open the detail focused on notes
    QuickMark,
    /// Long press: read-only holiday information
    HolidayInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TapState {
    Idle,
    /// Pointer is down. `pending_deadline` carries an earlier tap's
    /// single-action deadline so a quick second press can resolve as a
    /// double tap on release.
    Pressed {
        since: u64,
        pending_deadline: Option<u64>,
    },
    /// One tap happened; waiting out the double-tap window
    PendingSingle { deadline: u64 },
}

/// Per-cell tap detector.
///
/// Drive it with `press`/`release` on pointer events and `poll` on a
/// timer tick (or before handling the next event). Events return the
/// resolved action, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapDetector {
    state: TapState,
}

impl TapDetector {
    pub fn new() -> Self {
        Self {
            state: TapState::Idle,
        }
    }

    /// Pointer down.
    pub fn press(&mut self, now_ms: u64) {
        self.state = match self.state {
            TapState::Idle => TapState::Pressed {
                since: now_ms,
                pending_deadline: None,
            },
            TapState::PendingSingle { deadline } => TapState::Pressed {
                since: now_ms,
                // an expired window means this press starts a fresh gesture
                pending_deadline: (now_ms < deadline).then_some(deadline),
            },
            pressed @ TapState::Pressed { .. } => pressed,
        };
    }

    /// Pointer up. Resolves a double tap or long press immediately;
    /// a first tap starts the single-tap window instead.
    pub fn release(&mut self, now_ms: u64) -> Option<DayAction> {
        match self.state {
            TapState::Pressed {
                since,
                pending_deadline,
            } => {
                if now_ms.saturating_sub(since) >= LONG_PRESS_MS {
                    self.state = TapState::Idle;
                    return Some(DayAction::HolidayInfo);
                }
                match pending_deadline {
                    Some(deadline) if now_ms < deadline => {
                        self.state = TapState::Idle;
                        Some(DayAction::QuickMark)
                    }
                    _ => {
                        self.state = TapState::PendingSingle {
                            deadline: now_ms + DOUBLE_TAP_WINDOW_MS,
                        };
                        None
                    }
                }
            }
            _ => None,
        }
    }

    /// Timer tick: fires the long press while held, or the single-tap
    /// action once the double-tap window has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<DayAction> {
        match self.state {
            TapState::Pressed { since, .. } if now_ms.saturating_sub(since) >= LONG_PRESS_MS => {
                // firing the long press drops any pending tap
                self.state = TapState::Idle;
                Some(DayAction::HolidayInfo)
            }
            TapState::PendingSingle { deadline } if now_ms >= deadline => {
                self.state = TapState::Idle;
                Some(DayAction::OpenDetail)
            }
            _ => None,
        }
    }

    /// Pointer left the cell: abandon the gesture entirely.
    pub fn cancel(&mut self) {
        self.state = TapState::Idle;
    }

    pub fn is_idle(&self) -> bool {
        self.state == TapState::Idle
    }
}

impl Default for TapDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_tap_opens_detail_after_window() {
        let mut tap = TapDetector::new();
        tap.press(1000);
        assert_eq!(tap.release(1050), None);
        // still inside the double-tap window
        assert_eq!(tap.poll(1200), None);
        assert_eq!(tap.poll(1350), Some(DayAction::OpenDetail));
        assert!(tap.is_idle());
    }

    #[test]
    fn double_tap_resolves_quick_mark_and_suppresses_single() {
        let mut tap = TapDetector::new();
        tap.press(1000);
        assert_eq!(tap.release(1050), None);
        tap.press(1150);
        assert_eq!(tap.release(1200), Some(DayAction::QuickMark));
        // the suppressed single action must never fire
        assert_eq!(tap.poll(2000), None);
    }

    #[test]
    fn second_tap_outside_window_is_a_new_single() {
        let mut tap = TapDetector::new();
        tap.press(1000);
        assert_eq!(tap.release(1050), None);
        assert_eq!(tap.poll(1350), Some(DayAction::OpenDetail));
        tap.press(1400);
        assert_eq!(tap.release(1450), None);
        assert_eq!(tap.poll(1750), Some(DayAction::OpenDetail));
    }

    #[test]
    fn long_press_fires_while_held() {
        let mut tap = TapDetector::new();
        tap.press(1000);
        assert_eq!(tap.poll(1700), None);
        assert_eq!(tap.poll(1800), Some(DayAction::HolidayInfo));
        // the release after the long press fired is inert
        assert_eq!(tap.release(1900), None);
    }

    #[test]
    fn long_press_on_release_without_poll() {
        let mut tap = TapDetector::new();
        tap.press(1000);
        assert_eq!(tap.release(1900), Some(DayAction::HolidayInfo));
    }

    #[test]
    fn long_press_suppresses_pending_tap() {
        let mut tap = TapDetector::new();
        tap.press(1000);
        assert_eq!(tap.release(1050), None);
        // second press held past the threshold
        tap.press(1100);
        assert_eq!(tap.poll(1900), Some(DayAction::HolidayInfo));
        assert_eq!(tap.poll(2500), None);
    }

    #[test]
    fn cancel_before_threshold_abandons_gesture() {
        let mut tap = TapDetector::new();
        tap.press(1000);
        tap.cancel();
        assert_eq!(tap.release(1900), None);
        assert_eq!(tap.poll(3000), None);
    }

    #[test]
    fn expired_window_press_starts_fresh_gesture() {
        let mut tap = TapDetector::new();
        tap.press(1000);
        assert_eq!(tap.release(1050), None);
        // poll never ran; the window expired while nobody was looking
        tap.press(2000);
        assert_eq!(tap.release(2040), None);
        assert_eq!(tap.poll(2340), Some(DayAction::OpenDetail));
    }

    #[test]
    fn duplicate_press_is_ignored() {
        let mut tap = TapDetector::new();
        tap.press(1000);
        tap.press(1100);
        // held since the first press, so the long press fires at 1800
        assert_eq!(tap.poll(1800), Some(DayAction::HolidayInfo));
    }
}
