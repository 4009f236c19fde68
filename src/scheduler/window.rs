//! Time-window eligibility arithmetic
//!
//! Pure integer functions deciding whether a broadcast is still within its
//! active lifetime and whether its next repeat is due. All timestamps are
//! epoch seconds; both comparisons truncate to whole minutes before
//! comparing, matching the minimum allowed interval/duration of 5 minutes,
//! so second-level jitter never causes missed or duplicate sends under the
//! normal tick cadence.
//!
//! No wall-clock access happens here; callers pass `now` in.

/// Check whether a broadcast is within its active lifetime.
///
/// True iff `now/60 - created_at/60 <= duration_minutes` with floor
/// division on both sides. Boundary equality counts as within: a broadcast
/// created at minute 0 with a 120-minute duration is still within at
/// minute 120.
pub fn within_lifetime(now: i64, created_at: i64, duration_minutes: i64) -> bool {
    let now_minutes = now.div_euclid(60);
    let created_minutes = created_at.div_euclid(60);
    now_minutes - created_minutes <= duration_minutes
}

/// Check whether a broadcast is due for its next repeat.
///
/// A broadcast that has never been sent is due immediately. Otherwise it is
/// due iff `now/60 - last_sent_at/60 >= interval_minutes`.
pub fn is_due(now: i64, last_sent_at: Option<i64>, interval_minutes: i64) -> bool {
    let Some(last_sent) = last_sent_at else {
        return true;
    };
    let now_minutes = now.div_euclid(60);
    let last_minutes = last_sent.div_euclid(60);
    now_minutes - last_minutes >= interval_minutes
}
