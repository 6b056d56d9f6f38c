use chrono::{Duration, NaiveTime};

use super::clock::TimePolicy;

pub const DEFAULT_SUPPORT_PHONE: &str = "+46 73 75 86 865";

/// Tunables for the booking lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfig {
    /// Sender number for translator SMS offers.
    pub sms_number: String,
    /// Line customers and translators must call for late cancellations.
    pub support_phone: String,
    pub immediate_minutes: u32,
    pub cancellation_window_hours: u32,
    pub night_start: NaiveTime,
    pub night_end: NaiveTime,
}

impl Default for BookingConfig {
    fn default() -> Self {
        let policy = TimePolicy::default();
        Self {
            sms_number: String::new(),
            support_phone: DEFAULT_SUPPORT_PHONE.to_string(),
            immediate_minutes: 5,
            cancellation_window_hours: 24,
            night_start: policy.night_start,
            night_end: policy.night_end,
        }
    }
}

impl BookingConfig {
    pub fn time_policy(&self) -> TimePolicy {
        TimePolicy {
            immediate_offset: Duration::minutes(i64::from(self.immediate_minutes)),
            cancellation_window: Duration::hours(i64::from(self.cancellation_window_hours)),
            night_start: self.night_start,
            night_end: self.night_end,
        }
    }
}
