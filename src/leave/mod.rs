//! Leave request lifecycle engine.
//!
//! `LeaveService` is the entry point. It owns the [`BalanceLedger`] and the
//! [`ManagementDirectory`], validates every precondition before touching
//! state, and commits each transition through the store as one unit while
//! holding the owner's lock.

pub mod clock;
pub mod hierarchy;
pub mod ledger;
mod lifecycle;
pub mod overlap;
pub mod reporting;
mod staff;
mod team;

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Denial, LeaveError};
use crate::model::Role;
use crate::store::LeaveStore;
use crate::utils::employee_locks::EmployeeLocks;

pub use clock::{Clock, FixedClock, SystemClock};
pub use hierarchy::ManagementDirectory;
pub use ledger::{BalanceLedger, EmployeeGuard};
pub use lifecycle::{ApprovalOutcome, CancelOutcome, SubmitLeave};
pub use staff::{AdminRequestQuery, NewStaff};
pub use team::{EmployeeBalance, TeamRequest};

/// Authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub employee_id: u64,
    pub role: Role,
}

impl Actor {
    pub fn new(employee_id: u64, role: Role) -> Self {
        Self { employee_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub(crate) fn require_admin(&self, action: &'static str) -> Result<(), Denial> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(Denial::AdminOnly(action))
        }
    }

    pub(crate) fn require_manager(&self, action: &'static str) -> Result<(), Denial> {
        if self.role == Role::Manager {
            Ok(())
        } else {
            Err(Denial::ManagerOnly(action))
        }
    }
}

/// Who may decide on a pending request besides admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApprovalScope {
    /// Managers decide only for employees they currently manage.
    #[default]
    Managed,
    /// Any manager may decide any request.
    Any,
}

impl FromStr for ApprovalScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "managed" => Ok(Self::Managed),
            "any" => Ok(Self::Any),
            other => Err(format!("unknown approval scope {other:?}; expected managed or any")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LeavePolicy {
    pub approval_scope: ApprovalScope,
    /// Balance given to accounts created without an explicit one.
    pub default_allotment: u32,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            approval_scope: ApprovalScope::Managed,
            default_allotment: 25,
        }
    }
}

pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    ledger: BalanceLedger,
    directory: ManagementDirectory,
    clock: Arc<dyn Clock>,
    policy: LeavePolicy,
}

impl LeaveService {
    pub fn new(store: Arc<dyn LeaveStore>, clock: Arc<dyn Clock>, policy: LeavePolicy) -> Self {
        let locks = EmployeeLocks::new();
        Self {
            ledger: BalanceLedger::new(store.clone(), locks.clone()),
            directory: ManagementDirectory::new(store.clone(), clock.clone(), locks),
            store,
            clock,
            policy,
        }
    }

    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }

    pub fn directory(&self) -> &ManagementDirectory {
        &self.directory
    }

    pub fn store(&self) -> &dyn LeaveStore {
        self.store.as_ref()
    }

    pub fn policy(&self) -> LeavePolicy {
        self.policy
    }

    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }
}

/// Logs a refused operation with its stable code and hands the error back.
pub(crate) fn refused(operation: &'static str, err: impl Into<LeaveError>) -> LeaveError {
    let err = err.into();
    warn!(operation, code = err.code(), "{err}");
    err
}
