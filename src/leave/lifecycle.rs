//! Leave request state machine.
//!
//! ```text
//! Pending ──approve──▶ Approved ──cancel──▶ Cancelled
//!    │ └────reject───▶ Rejected
//!    └──────cancel──────────────────────▶ Cancelled
//! ```
//!
//! Each operation resolves the request, takes its owner's lock, checks every
//! precondition, then commits one guarded [`Transition`]. Nothing is written
//! when a check fails.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::error::{Decision, Denial, LeaveResult, Missing, Violation};
use crate::model::{
    LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest, Role, inclusive_days,
};
use crate::store::{RequestFilter, StoreError, Transition, TransitionOutcome};

use super::ledger::EmployeeGuard;
use super::overlap::find_conflict;
use super::{Actor, ApprovalScope, LeaveService, refused};

pub const MANAGER_APPROVAL_REASON: &str = "OK to approve";
pub const ADMIN_APPROVAL_REASON: &str = "Approved by admin";
pub const DEFAULT_REJECTION_REASON: &str = "Rejected by manager";
pub const CANCELLATION_REASON: &str = "Cancelled by user or admin";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitLeave {
    #[schema(value_type = String, format = "date", example = "2026-07-10")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date", example = "2026-07-12")]
    pub end_date: NaiveDate,
    /// Defaults to annual leave.
    #[serde(default)]
    pub leave_type: Option<LeaveType>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApprovalOutcome {
    pub request: LeaveRequest,
    pub days_approved: u32,
    pub new_balance: u32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CancelOutcome {
    pub request: LeaveRequest,
    /// Days credited back; zero unless the request had been approved.
    pub restored_days: u32,
    pub balance: u32,
}

impl LeaveService {
    pub async fn submit(&self, actor: Actor, leave: SubmitLeave) -> LeaveResult<LeaveRequest> {
        let owner = actor.employee_id;
        let SubmitLeave {
            start_date,
            end_date,
            leave_type,
        } = leave;
        let leave_type = leave_type.unwrap_or_default();

        let today = self.clock.today();
        if start_date < today {
            return Err(refused(
                "submit",
                Violation::StartInPast {
                    start: start_date,
                    today,
                },
            ));
        }

        let _guard = self.ledger.lock(owner).await;
        let employee = self
            .store
            .employee(owner)
            .await?
            .ok_or(Missing::Employee(owner))?;

        if end_date < start_date {
            return Err(refused(
                "submit",
                Violation::EndNotAfterStart {
                    start: start_date,
                    end: end_date,
                },
            ));
        }

        let existing = self
            .store
            .requests(
                &RequestFilter::for_employee(owner)
                    .with_status(LeaveStatus::Pending)
                    .with_status(LeaveStatus::Approved),
            )
            .await?;
        if let Some(conflict) = find_conflict(&existing, start_date, end_date) {
            return Err(refused(
                "submit",
                Violation::Overlap {
                    existing: conflict.id,
                },
            ));
        }

        // A single-day range still goes through the overlap check first.
        if end_date == start_date {
            return Err(refused(
                "submit",
                Violation::EndNotAfterStart {
                    start: start_date,
                    end: end_date,
                },
            ));
        }

        let days = inclusive_days(start_date, end_date);
        if days > employee.annual_leave_balance {
            return Err(refused(
                "submit",
                Violation::ExceedsBalance {
                    requested: days,
                    balance: employee.annual_leave_balance,
                },
            ));
        }

        let request = self
            .store
            .insert_request(NewLeaveRequest {
                employee_id: owner,
                leave_type,
                start_date,
                end_date,
                reason: leave_type.policy_note().to_string(),
            })
            .await?;
        info!(
            request_id = request.id,
            employee_id = owner,
            days,
            leave_type = leave_type.label(),
            "Leave request submitted"
        );
        Ok(request)
    }

    pub async fn approve(&self, actor: Actor, request_id: u64) -> LeaveResult<ApprovalOutcome> {
        if !actor.role.can_decide_leave() {
            return Err(refused(
                "approve",
                Denial::ApproverRoleRequired(Decision::Approve),
            ));
        }
        let (guard, request) = self.lock_request(request_id).await?;
        self.check_decider(actor, request.employee_id, "approve").await?;
        if request.status != LeaveStatus::Pending {
            return Err(refused(
                "approve",
                Violation::NotPending {
                    decision: Decision::Approve,
                    status: request.status,
                },
            ));
        }

        let days = request.days();
        let balance = self.ledger.balance(request.employee_id).await?;
        if days > balance {
            return Err(refused(
                "approve",
                Violation::InsufficientBalance {
                    requested: days,
                    balance,
                },
            ));
        }

        let reason = match actor.role {
            Role::Admin => ADMIN_APPROVAL_REASON,
            _ => MANAGER_APPROVAL_REASON,
        };
        let transition = Transition {
            request_id,
            from: LeaveStatus::Pending,
            to: LeaveStatus::Approved,
            reason: reason.to_string(),
            balance_delta: -i64::from(days),
        };
        let (request, new_balance) = self
            .settle(&guard, transition, Decision::Approve, days)
            .await?;
        Ok(ApprovalOutcome {
            request,
            days_approved: days,
            new_balance,
        })
    }

    pub async fn reject(
        &self,
        actor: Actor,
        request_id: u64,
        reason: Option<String>,
    ) -> LeaveResult<LeaveRequest> {
        if !actor.role.can_decide_leave() {
            return Err(refused(
                "reject",
                Denial::ApproverRoleRequired(Decision::Reject),
            ));
        }
        let (guard, request) = self.lock_request(request_id).await?;
        self.check_decider(actor, request.employee_id, "reject").await?;
        if request.status != LeaveStatus::Pending {
            return Err(refused(
                "reject",
                Violation::NotPending {
                    decision: Decision::Reject,
                    status: request.status,
                },
            ));
        }

        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());
        let transition = Transition {
            request_id,
            from: LeaveStatus::Pending,
            to: LeaveStatus::Rejected,
            reason,
            balance_delta: 0,
        };
        let (request, _) = self
            .settle(&guard, transition, Decision::Reject, 0)
            .await?;
        Ok(request)
    }

    pub async fn cancel(&self, actor: Actor, request_id: u64) -> LeaveResult<CancelOutcome> {
        let (guard, request) = self.lock_request(request_id).await?;
        if request.employee_id != actor.employee_id && !actor.is_admin() {
            return Err(refused("cancel", Denial::NotOwnerOrAdmin));
        }

        let restored_days = match request.status {
            LeaveStatus::Pending => 0,
            LeaveStatus::Approved => request.days(),
            LeaveStatus::Cancelled => return Err(refused("cancel", Violation::AlreadyCancelled)),
            status @ LeaveStatus::Rejected => {
                return Err(refused("cancel", Violation::NotCancellable { status }));
            }
        };

        let transition = Transition {
            request_id,
            from: request.status,
            to: LeaveStatus::Cancelled,
            reason: CANCELLATION_REASON.to_string(),
            balance_delta: i64::from(restored_days),
        };
        match self.ledger.commit(&guard, transition).await? {
            TransitionOutcome::Applied { request, balance } => Ok(CancelOutcome {
                request,
                restored_days,
                balance,
            }),
            TransitionOutcome::StatusMismatch { actual } => Err(refused(
                "cancel",
                match actual {
                    LeaveStatus::Cancelled => Violation::AlreadyCancelled,
                    status => Violation::NotCancellable { status },
                },
            )),
            TransitionOutcome::RequestMissing => Err(Missing::Request(request_id).into()),
            TransitionOutcome::InsufficientBalance { .. } => Err(StoreError::Corrupt(format!(
                "crediting request {request_id} was refused"
            ))
            .into()),
        }
    }

    /// The actor's own requests ordered by start date.
    pub async fn my_requests(&self, actor: Actor) -> LeaveResult<Vec<LeaveRequest>> {
        Ok(self
            .store
            .requests(&RequestFilter::for_employee(actor.employee_id))
            .await?)
    }

    pub async fn remaining_balance(&self, actor: Actor) -> LeaveResult<u32> {
        self.ledger.balance(actor.employee_id).await
    }

    /// Loads a request, locks its owner, then reads it again so the status
    /// checked is the one the transition will see.
    async fn lock_request(&self, request_id: u64) -> LeaveResult<(EmployeeGuard, LeaveRequest)> {
        let owner = self
            .store
            .request(request_id)
            .await?
            .ok_or(Missing::Request(request_id))?
            .employee_id;
        let guard = self.ledger.lock(owner).await;
        let request = self
            .store
            .request(request_id)
            .await?
            .ok_or(Missing::Request(request_id))?;
        Ok((guard, request))
    }

    async fn check_decider(
        &self,
        actor: Actor,
        owner: u64,
        operation: &'static str,
    ) -> LeaveResult<()> {
        if actor.role != Role::Manager || self.policy.approval_scope == ApprovalScope::Any {
            return Ok(());
        }
        if self.directory.manages(actor.employee_id, owner).await? {
            Ok(())
        } else {
            Err(refused(
                operation,
                Denial::NotManagerOfOwner {
                    manager_id: actor.employee_id,
                    employee_id: owner,
                },
            ))
        }
    }

    async fn settle(
        &self,
        guard: &EmployeeGuard,
        transition: Transition,
        decision: Decision,
        days: u32,
    ) -> LeaveResult<(LeaveRequest, u32)> {
        let request_id = transition.request_id;
        let operation = match decision {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        };
        match self.ledger.commit(guard, transition).await? {
            TransitionOutcome::Applied { request, balance } => Ok((request, balance)),
            TransitionOutcome::StatusMismatch { actual } => Err(refused(
                operation,
                Violation::NotPending {
                    decision,
                    status: actual,
                },
            )),
            TransitionOutcome::InsufficientBalance { balance } => Err(refused(
                operation,
                Violation::InsufficientBalance {
                    requested: days,
                    balance,
                },
            )),
            TransitionOutcome::RequestMissing => Err(Missing::Request(request_id).into()),
        }
    }
}
