//! Daily reminder scheduling.
//!
//! The target is fixed at 12:00 local time. The scheduler is a single
//! cancelable tokio task: sleep until the next noon, show the reminder,
//! re-arm for the following day. The enabled flag is re-checked at every
//! re-arm and a watch-channel stop signal ends the loop immediately, so
//! no timer outlives the user's intent.

use anyhow::Result;
use chrono::{DateTime, Local, NaiveTime};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::store::LocalStore;

pub const REMINDER_HOUR: u32 = 12;

/// Payload handed to the platform notification surface
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub title: String,
    pub body: String,
    pub icon: String,
    /// De-duplication tag: a new reminder replaces the previous one
    pub tag: String,
}

impl Reminder {
    pub fn daily() -> Self {
        Self {
            title: "🥛 Daily Milk Reminder".to_string(),
            body: "Did you buy milk today?".to_string(),
            icon: "/icon-192.png".to_string(),
            tag: "daily-milk-reminder".to_string(),
        }
    }
}

/// Platform notification surface. An error (permission denied,
/// unsupported platform) disables the reminder feature without failing
/// the app.
pub trait Notifier: Send + Sync {
    fn notify(&self, reminder: &Reminder) -> Result<()>;
}

/// Default surface: logs the reminder and records it in the store so a
/// thin client can poll for the latest one.
pub struct TracingNotifier {
    store: LocalStore,
}

impl TracingNotifier {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }
}

impl Notifier for TracingNotifier {
    fn notify(&self, reminder: &Reminder) -> Result<()> {
        info!("Reminder [{}]: {} / {}", reminder.tag, reminder.title, reminder.body);
        let store = self.store.clone();
        let stamp = Local::now().to_rfc3339();
        tokio::spawn(async move {
            if let Err(e) = store.set_next_notification(&stamp).await {
                warn!("Could not record reminder delivery: {:#}", e);
            }
        });
        Ok(())
    }
}

/// Next 12:00 local after `now`: today's noon, or tomorrow's when noon
/// has already passed. `None` only on pathological calendar edges.
pub fn next_trigger(now: DateTime<Local>) -> Option<DateTime<Local>> {
    let noon = NaiveTime::from_hms_opt(REMINDER_HOUR, 0, 0)?;
    let mut date = now.date_naive();
    if now.time() >= noon {
        date = date.succ_opt()?;
    }
    date.and_time(noon).and_local_timezone(Local).earliest()
}

struct SchedulerInner {
    store: LocalStore,
    notifier: Arc<dyn Notifier>,
    stop: Mutex<Option<watch::Sender<bool>>>,
}

/// Cancelable self-rescheduling reminder loop
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<SchedulerInner>,
}

impl ReminderScheduler {
    pub fn new(store: LocalStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                store,
                notifier,
                stop: Mutex::new(None),
            }),
        }
    }

    /// Start (or restart) the reminder loop. Must run inside a tokio
    /// runtime; returns immediately.
    pub fn start(&self) {
        self.signal_stop();

        let (tx, mut rx) = watch::channel(false);
        if let Ok(mut slot) = self.inner.stop.lock() {
            *slot = Some(tx);
        }

        let inner = self.inner.clone();
        tokio::spawn(async move {
            loop {
                let settings = match inner.store.notification_settings().await {
                    Ok(settings) => settings,
                    Err(e) => {
                        warn!("Reminder loop could not read settings: {:#}", e);
                        break;
                    }
                };
                if !settings.enabled {
                    break;
                }

                let now = Local::now();
                let Some(target) = next_trigger(now) else {
                    warn!("Could not compute the next reminder time; stopping");
                    break;
                };
                if let Err(e) = inner
                    .store
                    .set_next_notification(&target.to_rfc3339())
                    .await
                {
                    warn!("Could not record next reminder time: {:#}", e);
                }

                let delay = (target - now)
                    .to_std()
                    .unwrap_or(std::time::Duration::ZERO);
                info!(
                    "Next reminder scheduled for {} (in {} minutes)",
                    target.to_rfc3339(),
                    delay.as_secs() / 60
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {
                        if let Err(e) = inner.notifier.notify(&Reminder::daily()) {
                            warn!("Notification surface unavailable, disabling reminders: {:#}", e);
                            let mut disabled = settings.clone();
                            disabled.enabled = false;
                            if let Err(e) = inner.store.save_notification_settings(&disabled).await {
                                warn!("Could not persist disabled reminder settings: {:#}", e);
                            }
                            break;
                        }
                        // loop re-arms for the following day
                    }
                    _ = rx.changed() => break,
                }
            }
        });
    }

    /// Stop the loop and clear the recorded next trigger.
    pub async fn stop(&self) {
        self.signal_stop();
        if let Err(e) = self.inner.store.clear_next_notification().await {
            warn!("Could not clear next reminder record: {:#}", e);
        }
    }

    fn signal_stop(&self) {
        if let Ok(mut slot) = self.inner.stop.lock() {
            if let Some(tx) = slot.take() {
                let _ = tx.send(true);
            }
        }
    }
}
