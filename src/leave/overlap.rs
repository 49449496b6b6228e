//! Date-conflict check for new submissions.

use chrono::NaiveDate;

use crate::model::LeaveRequest;

/// Closed-interval overlap: `[s1, e1]` and `[s2, e2]` share a day iff
/// `s1 <= e2 && s2 <= e1`.
pub fn ranges_overlap(s1: NaiveDate, e1: NaiveDate, s2: NaiveDate, e2: NaiveDate) -> bool {
    s1 <= e2 && s2 <= e1
}

/// First of `existing` that still holds its dates (Pending or Approved) and
/// overlaps `[start, end]`.
pub fn find_conflict(
    existing: &[LeaveRequest],
    start: NaiveDate,
    end: NaiveDate,
) -> Option<&LeaveRequest> {
    existing.iter().find(|r| {
        r.status.blocks_dates() && ranges_overlap(start, end, r.start_date, r.end_date)
    })
}
