//! Error taxonomy for the leave engine.
//!
//! Every failure is one of three caller-facing kinds (validation,
//! authorization, not-found) or a storage fault. Each carries a stable
//! `code()` for programmatic matching; the `Display` text is for humans.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveDate;
use serde_json::json;
use thiserror::Error;

use crate::model::LeaveStatus;
use crate::store::StoreError;

pub type LeaveResult<T> = Result<T, LeaveError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    Storage,
}

/// Decisions a manager or admin takes on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn verb(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            Decision::Approve => "approved",
            Decision::Reject => "rejected",
        }
    }
}

/// A broken business rule or malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("Cannot request leave in the past")]
    StartInPast { start: NaiveDate, today: NaiveDate },

    #[error("End date of {end} is not after the start date of {start}")]
    EndNotAfterStart { start: NaiveDate, end: NaiveDate },

    #[error("Days requested exceed remaining balance")]
    ExceedsBalance { requested: u32, balance: u32 },

    #[error("Date range of request overlaps with existing request")]
    Overlap { existing: u64 },

    #[error("Only pending requests can be {}", .decision.past_tense())]
    NotPending {
        decision: Decision,
        status: LeaveStatus,
    },

    #[error("Leave request already cancelled")]
    AlreadyCancelled,

    #[error("A {status} leave request cannot be cancelled")]
    NotCancellable { status: LeaveStatus },

    #[error("User does not have enough leave balance")]
    InsufficientBalance { requested: u32, balance: u32 },

    #[error("Selected user is not a manager")]
    NotAManager { user_id: u64 },

    #[error("This employee is already assigned to a manager")]
    AlreadyAssigned { employee_id: u64 },

    #[error("Employee {employee_id} has no open management link")]
    NoOpenLink { employee_id: u64 },

    #[error("End date of {end} is before the link start date of {start}")]
    LinkEndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("Email already in use")]
    EmailInUse,

    #[error("Invalid balance value")]
    InvalidBalance,

    #[error("{0} is required")]
    MissingField(&'static str),
}

impl Violation {
    pub fn code(&self) -> &'static str {
        match self {
            Self::StartInPast { .. } => "START_IN_PAST",
            Self::EndNotAfterStart { .. } => "END_NOT_AFTER_START",
            Self::ExceedsBalance { .. } => "EXCEEDS_BALANCE",
            Self::Overlap { .. } => "OVERLAPPING_REQUEST",
            Self::NotPending { .. } => "NOT_PENDING",
            Self::AlreadyCancelled => "ALREADY_CANCELLED",
            Self::NotCancellable { .. } => "NOT_CANCELLABLE",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::NotAManager { .. } => "NOT_A_MANAGER",
            Self::AlreadyAssigned { .. } => "ALREADY_ASSIGNED",
            Self::NoOpenLink { .. } => "NO_OPEN_LINK",
            Self::LinkEndBeforeStart { .. } => "LINK_END_BEFORE_START",
            Self::EmailInUse => "EMAIL_IN_USE",
            Self::InvalidBalance => "INVALID_BALANCE",
            Self::MissingField(_) => "MISSING_FIELD",
        }
    }
}

/// The actor lacks the role or relationship an operation needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("Only managers or admins can {} leave", .0.verb())]
    ApproverRoleRequired(Decision),

    #[error("Unauthorised to cancel this request")]
    NotOwnerOrAdmin,

    #[error("Only admins can {0}")]
    AdminOnly(&'static str),

    #[error("Only managers can {0}")]
    ManagerOnly(&'static str),

    #[error("You do not manage this employee")]
    NotManagerOfOwner { manager_id: u64, employee_id: u64 },
}

impl Denial {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ApproverRoleRequired(_) => "APPROVER_ROLE_REQUIRED",
            Self::NotOwnerOrAdmin => "NOT_OWNER_OR_ADMIN",
            Self::AdminOnly(_) => "ADMIN_ONLY",
            Self::ManagerOnly(_) => "MANAGER_ONLY",
            Self::NotManagerOfOwner { .. } => "NOT_MANAGER_OF_OWNER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Missing {
    #[error("Employee {0} not found")]
    Employee(u64),

    #[error("Leave request {0} not found")]
    Request(u64),

    #[error("Manager {0} not found")]
    Manager(u64),
}

impl Missing {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Employee(_) => "EMPLOYEE_NOT_FOUND",
            Self::Request(_) => "REQUEST_NOT_FOUND",
            Self::Manager(_) => "MANAGER_NOT_FOUND",
        }
    }
}

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error(transparent)]
    Validation(#[from] Violation),

    #[error(transparent)]
    Authorization(#[from] Denial),

    #[error(transparent)]
    NotFound(#[from] Missing),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl LeaveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(v) => v.code(),
            Self::Authorization(d) => d.code(),
            Self::NotFound(m) => m.code(),
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            Self::Storage(e) => {
                tracing::error!(error = %e, "Storage failure");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": message,
            "code": self.code(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_http_status() {
        let v: LeaveError = Violation::AlreadyCancelled.into();
        assert_eq!(v.status_code(), StatusCode::BAD_REQUEST);
        let d: LeaveError = Denial::NotOwnerOrAdmin.into();
        assert_eq!(d.status_code(), StatusCode::FORBIDDEN);
        let m: LeaveError = Missing::Request(9).into();
        assert_eq!(m.status_code(), StatusCode::NOT_FOUND);
        let s: LeaveError = StoreError::Corrupt("bad status".into()).into();
        assert_eq!(s.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn messages_name_the_rule() {
        let e = Violation::NotPending {
            decision: Decision::Approve,
            status: LeaveStatus::Approved,
        };
        assert_eq!(e.to_string(), "Only pending requests can be approved");
        assert_eq!(e.code(), "NOT_PENDING");

        let e = Denial::ApproverRoleRequired(Decision::Reject);
        assert_eq!(e.to_string(), "Only managers or admins can reject leave");

        let e: LeaveError = Violation::ExceedsBalance {
            requested: 3,
            balance: 1,
        }
        .into();
        assert_eq!(e.code(), "EXCEEDS_BALANCE");
        assert_eq!(e.to_string(), "Days requested exceed remaining balance");
    }
}
