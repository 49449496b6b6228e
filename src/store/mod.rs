//! Persistence seam for the leave engine.
//!
//! The engine never talks to a database directly; it is handed a
//! `LeaveStore`. `MySqlStore` backs the server, `MemoryStore` backs tests
//! and local demos. Both apply a [`Transition`] as one atomic unit.

mod error;
pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::{
    Credentials, Employee, LeaveRequest, LeaveStatus, ManagementLink, NewEmployee,
    NewLeaveRequest, NewManagementLink, Role,
};

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Conditional status change of one request, optionally moving its
/// owner's balance in the same unit.
#[derive(Debug, Clone)]
pub struct Transition {
    pub request_id: u64,
    pub from: LeaveStatus,
    pub to: LeaveStatus,
    pub reason: String,
    /// Added to the owner's balance; negative for a debit.
    pub balance_delta: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied { request: LeaveRequest, balance: u32 },
    /// The request was no longer in `from` when the unit ran.
    StatusMismatch { actual: LeaveStatus },
    InsufficientBalance { balance: u32 },
    RequestMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceWrite {
    Applied(u32),
    Insufficient(u32),
    EmployeeMissing,
}

/// Equality / range / set-membership filter over leave requests. Empty
/// fields match everything.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub employee_ids: Option<Vec<u64>>,
    pub statuses: Option<Vec<LeaveStatus>>,
    pub start_from: Option<NaiveDate>,
    pub start_to: Option<NaiveDate>,
}

impl RequestFilter {
    pub fn for_employee(employee_id: u64) -> Self {
        Self {
            employee_ids: Some(vec![employee_id]),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: LeaveStatus) -> Self {
        self.statuses.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn matches(&self, request: &LeaveRequest) -> bool {
        self.employee_ids
            .as_ref()
            .is_none_or(|ids| ids.contains(&request.employee_id))
            && self
                .statuses
                .as_ref()
                .is_none_or(|s| s.contains(&request.status))
            && self.start_from.is_none_or(|from| request.start_date >= from)
            && self.start_to.is_none_or(|to| request.start_date <= to)
    }
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee>;
    async fn employee(&self, id: u64) -> StoreResult<Option<Employee>>;
    async fn credentials(&self, email: &str) -> StoreResult<Option<Credentials>>;
    async fn employees(&self) -> StoreResult<Vec<Employee>>;
    async fn employees_by_ids(&self, ids: &[u64]) -> StoreResult<Vec<Employee>>;
    async fn update_role(&self, id: u64, role: Role) -> StoreResult<bool>;
    async fn update_department(&self, id: u64, department: &str) -> StoreResult<bool>;

    /// Adds `delta` to the balance unless the result would be negative.
    async fn adjust_balance(&self, id: u64, delta: i64) -> StoreResult<BalanceWrite>;
    async fn set_balance(&self, id: u64, balance: u32) -> StoreResult<bool>;

    async fn insert_request(&self, new: NewLeaveRequest) -> StoreResult<LeaveRequest>;
    async fn request(&self, id: u64) -> StoreResult<Option<LeaveRequest>>;
    /// Matching requests ordered by start date, then id.
    async fn requests(&self, filter: &RequestFilter) -> StoreResult<Vec<LeaveRequest>>;
    async fn apply_transition(&self, transition: Transition) -> StoreResult<TransitionOutcome>;

    async fn insert_link(&self, new: NewManagementLink) -> StoreResult<ManagementLink>;
    async fn links_for_employee(&self, employee_id: u64) -> StoreResult<Vec<ManagementLink>>;
    async fn links_for_manager(&self, manager_id: u64) -> StoreResult<Vec<ManagementLink>>;
    async fn close_link(&self, link_id: u64, end_date: NaiveDate) -> StoreResult<bool>;
}
