//! # Conditions
//!
//! Maintains a set of status conditions keyed by type.
//!
//! `lastTransitionTime` only moves when a condition's status changes, so
//! replaying a reconciliation with the same outcome leaves the status untouched
//! and produces no spurious watch events.

use crate::crd::{Condition, ConditionStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// Source of the current time for status timestamps
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// RFC3339 rendering used for every timestamp written to status
#[must_use]
pub fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Set a condition, appending it when no condition of that type exists.
///
/// The transition time is set to `now` on first observation and whenever the
/// status changes. Otherwise only `reason` and `message` are updated.
pub fn set_condition(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: ConditionStatus,
    reason: &str,
    message: &str,
    now: DateTime<Utc>,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        if existing.status != status {
            existing.status = status;
            existing.last_transition_time = Some(format_time(now));
        }
        existing.reason = reason.to_string();
        existing.message = message.to_string();
        return;
    }

    conditions.push(Condition {
        r#type: condition_type.to_string(),
        status,
        last_transition_time: Some(format_time(now)),
        reason: reason.to_string(),
        message: message.to_string(),
    });
}

#[must_use]
pub fn find_condition<'a>(conditions: &'a [Condition], condition_type: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Whether a condition of `condition_type` exists with the wanted status
#[must_use]
pub fn has_condition(conditions: &[Condition], condition_type: &str, status: ConditionStatus) -> bool {
    find_condition(conditions, condition_type).is_some_and(|c| c.status == status)
}
