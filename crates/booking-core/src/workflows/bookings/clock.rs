use std::sync::Mutex;

use chrono::{Duration, Local, NaiveDateTime, NaiveTime};

/// Source of "now" for every lifecycle decision.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the service's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Settable clock for demos and tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        match self.now.lock() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }

    pub fn advance(&self, by: Duration) {
        let current = self.now();
        self.set(current + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

const DUE_FORMAT: &str = "%m/%d/%Y %H:%M";

/// Failure computing a scheduled due time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DueError {
    #[error("'{value}' is not a valid MM/DD/YYYY HH:MM due time")]
    Unparsable { value: String },
    #[error("Can't create booking in the past")]
    InPast,
}

/// Time rules shared by intake, cancellation, and push scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePolicy {
    pub immediate_offset: Duration,
    pub cancellation_window: Duration,
    pub night_start: NaiveTime,
    pub night_end: NaiveTime,
}

impl Default for TimePolicy {
    fn default() -> Self {
        Self {
            immediate_offset: Duration::minutes(5),
            cancellation_window: Duration::hours(24),
            night_start: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            night_end: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl TimePolicy {
    pub fn compute_due(
        &self,
        immediate: bool,
        due_date: &str,
        due_time: &str,
        now: NaiveDateTime,
    ) -> Result<NaiveDateTime, DueError> {
        if immediate {
            return Ok(now + self.immediate_offset);
        }

        let raw = format!("{} {}", due_date.trim(), due_time.trim());
        let due = NaiveDateTime::parse_from_str(&raw, DUE_FORMAT)
            .map_err(|_| DueError::Unparsable { value: raw.clone() })?;

        if due < now {
            return Err(DueError::InPast);
        }
        Ok(due)
    }

    /// Short-notice jobs stay open until they are due; longer lead times close 48h early.
    pub fn compute_expiry(&self, due: NaiveDateTime, created_at: NaiveDateTime) -> NaiveDateTime {
        let lead_hours = (due - created_at).num_hours().abs();
        let expiry = if lead_hours <= 90 {
            due
        } else {
            due - Duration::hours(48)
        };
        expiry.max(created_at)
    }

    pub fn is_night(&self, now: NaiveDateTime) -> bool {
        let time = now.time();
        if self.night_start > self.night_end {
            time >= self.night_start || time < self.night_end
        } else {
            time >= self.night_start && time < self.night_end
        }
    }

    /// Earliest instant a deferred push may be delivered.
    pub fn next_business_time(&self, now: NaiveDateTime) -> NaiveDateTime {
        if !self.is_night(now) {
            return now;
        }
        let candidate = now.date().and_time(self.night_end);
        if candidate <= now {
            candidate + Duration::days(1)
        } else {
            candidate
        }
    }

    pub fn notice(&self, due: NaiveDateTime, now: NaiveDateTime) -> Duration {
        due - now
    }

    /// Customer withdrawals with at least a full window of notice are `withdrawbefore24`.
    pub fn is_early_withdrawal(&self, due: NaiveDateTime, now: NaiveDateTime) -> bool {
        self.notice(due, now) >= self.cancellation_window
    }

    /// Translators may only back out with strictly more than the window remaining.
    pub fn allows_translator_cancellation(&self, due: NaiveDateTime, now: NaiveDateTime) -> bool {
        self.notice(due, now) > self.cancellation_window
    }
}

/// Human duration used in notifications: `45min`, `1h`, `01h 30min`.
pub fn format_duration(minutes: u32) -> String {
    match minutes {
        0..=59 => format!("{minutes}min"),
        60 => "1h".to_string(),
        _ => format!("{:02}h {:02}min", minutes / 60, minutes % 60),
    }
}

/// Due split into the `date` and `time` strings used by templates.
pub fn due_parts(due: NaiveDateTime) -> (String, String) {
    (
        due.format("%Y-%m-%d").to_string(),
        due.format("%H:%M").to_string(),
    )
}
