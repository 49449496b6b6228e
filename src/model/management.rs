use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Designates `manager_id` as the approving manager of `employee_id` for
/// the closed interval `[start_date, end_date]`; an absent end is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ManagementLink {
    pub id: u64,
    pub employee_id: u64,
    pub manager_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = Option<String>, format = "date")]
    pub end_date: Option<NaiveDate>,
}

impl ManagementLink {
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.start_date <= day && self.end_date.is_none_or(|end| day <= end)
    }

    /// True when this link still covers `day` or anything after it.
    pub fn reaches(&self, day: NaiveDate) -> bool {
        self.end_date.is_none_or(|end| end >= day)
    }
}

#[derive(Debug, Clone)]
pub struct NewManagementLink {
    pub employee_id: u64,
    pub manager_id: u64,
    pub start_date: NaiveDate,
}
