use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
    ToSchema, Default,
)]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Requests in these states still hold their dates.
    pub fn blocks_dates(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

/// Leave categories with their fixed policy notes. Both draw on the same
/// annual balance.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr,
    ToSchema, Default,
)]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    #[default]
    #[serde(rename = "Annual Leave", alias = "annual")]
    Annual,
    #[serde(rename = "Sick Leave", alias = "sick")]
    Sick,
}

impl LeaveType {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            LeaveType::Annual => "Annual Leave",
            LeaveType::Sick => "Sick Leave",
        }
    }

    pub fn policy_note(self) -> &'static str {
        match self {
            LeaveType::Annual => "Standard paid annual leave.",
            LeaveType::Sick => "Medical certificate required.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 4,
    "leave_type": "Annual Leave",
    "start_date": "2026-01-05",
    "end_date": "2026-01-07",
    "status": "Pending",
    "reason": "Standard paid annual leave.",
    "created_at": "2026-01-01T00:00:00Z"
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub employee_id: u64,
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    pub reason: String,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn days(&self) -> u32 {
        inclusive_days(self.start_date, self.end_date)
    }
}

/// Calendar days covered by `[start, end]`, both ends included. Zero when
/// the range is inverted.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let span = (end - start).num_days() + 1;
    u32::try_from(span).unwrap_or(0)
}

#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn days_are_inclusive() {
        assert_eq!(inclusive_days(date("2025-06-01"), date("2025-06-03")), 3);
        assert_eq!(inclusive_days(date("2025-06-01"), date("2025-06-01")), 1);
        assert_eq!(inclusive_days(date("2024-02-28"), date("2024-03-01")), 3);
        assert_eq!(inclusive_days(date("2025-06-03"), date("2025-06-01")), 0);
    }

    #[test]
    fn policy_notes_are_fixed() {
        assert_eq!(LeaveType::Annual.policy_note(), "Standard paid annual leave.");
        assert_eq!(LeaveType::Sick.policy_note(), "Medical certificate required.");
    }

    #[test]
    fn leave_type_accepts_labels_and_short_names() {
        let t: LeaveType = serde_json::from_str("\"Sick Leave\"").unwrap();
        assert_eq!(t, LeaveType::Sick);
        let t: LeaveType = serde_json::from_str("\"annual\"").unwrap();
        assert_eq!(t, LeaveType::Annual);
        assert_eq!(LeaveType::from_str("sick").unwrap(), LeaveType::Sick);
    }

    #[test]
    fn status_storage_names() {
        assert_eq!(LeaveStatus::Cancelled.as_str(), "cancelled");
        assert_eq!(LeaveStatus::from_str("approved").unwrap(), LeaveStatus::Approved);
        assert!(LeaveStatus::Approved.blocks_dates());
        assert!(!LeaveStatus::Rejected.blocks_dates());
        assert!(LeaveStatus::Rejected.is_terminal());
        assert!(!LeaveStatus::Pending.is_terminal());
    }
}
