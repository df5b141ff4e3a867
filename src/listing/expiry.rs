//! Expiry and "time ago" classification for listings.
//!
//! Both classifiers are pure functions of a target timestamp and an explicit
//! `now`, and both floor their divisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;
const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// How pressing an expiry is, from the viewer's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyTier {
    Past,
    Urgent,
    Warning,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryClass {
    Expired,
    ExpiresSoon,
    HoursLeft(i64),
    DaysLeft(i64),
}

impl ExpiryClass {
    pub fn tier(&self) -> UrgencyTier {
        match self {
            ExpiryClass::Expired => UrgencyTier::Past,
            ExpiryClass::ExpiresSoon => UrgencyTier::Urgent,
            ExpiryClass::HoursLeft(_) => UrgencyTier::Warning,
            ExpiryClass::DaysLeft(_) => UrgencyTier::Normal,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ExpiryClass::Expired => "Expired".to_string(),
            ExpiryClass::ExpiresSoon => "Expires soon".to_string(),
            ExpiryClass::HoursLeft(hours) => format!("{}h left", hours),
            ExpiryClass::DaysLeft(days) => format!("{}d left", days),
        }
    }
}

/// Serializable form of an [`ExpiryClass`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExpiryStatus {
    #[schema(example = "5h left")]
    pub label: String,
    pub tier: UrgencyTier,
}

impl From<ExpiryClass> for ExpiryStatus {
    fn from(class: ExpiryClass) -> Self {
        Self {
            label: class.label(),
            tier: class.tier(),
        }
    }
}

/// Classify how much time is left before `expires_at`.
pub fn classify_expiry(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> ExpiryClass {
    let remaining = (expires_at - now).num_milliseconds();

    if remaining < 0 {
        ExpiryClass::Expired
    } else if remaining < MILLIS_PER_HOUR {
        ExpiryClass::ExpiresSoon
    } else if remaining < MILLIS_PER_DAY {
        ExpiryClass::HoursLeft(remaining / MILLIS_PER_HOUR)
    } else {
        ExpiryClass::DaysLeft(remaining / MILLIS_PER_DAY)
    }
}

/// Whole hours between `now` and `expires_at`, floored. Negative once expired.
pub fn hours_until(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (expires_at - now)
        .num_milliseconds()
        .div_euclid(MILLIS_PER_HOUR)
}

/// Relative description of how long ago `created_at` was, e.g. "3 hours ago".
pub fn format_time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds();
    if seconds < 30 {
        return "just now".to_string();
    }

    let minutes = seconds / 60;
    let hours = seconds / 3_600;
    let days = seconds / 86_400;
    let weeks = days / 7;

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        ago(minutes, "minute")
    } else if hours < 24 {
        ago(hours, "hour")
    } else if days < 7 {
        ago(days, "day")
    } else if weeks < 4 {
        ago(weeks, "week")
    } else {
        // Months and years don't divide weeks evenly; report at least one.
        let months = (days / 30).max(1);
        if months < 12 {
            ago(months, "month")
        } else {
            ago((days / 365).max(1), "year")
        }
    }
}

fn ago(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}
