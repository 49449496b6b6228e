use std::sync::Arc;

use futures::lock::OwnedMutexGuard;
use tracing::info;

use crate::error::{LeaveResult, Missing, Violation};
use crate::store::{BalanceWrite, LeaveStore, Transition, TransitionOutcome};
use crate::utils::employee_locks::EmployeeLocks;

/// Exclusive hold on one employee's balance and requests.
pub struct EmployeeGuard {
    employee_id: u64,
    _guard: OwnedMutexGuard<()>,
}

impl EmployeeGuard {
    pub fn employee_id(&self) -> u64 {
        self.employee_id
    }
}

/// Per-employee annual leave balances.
///
/// Every write runs under the employee's [`EmployeeGuard`] and goes through a
/// store call that refuses to take a balance below zero, so the balance stays
/// non-negative even if another process shares the database.
#[derive(Clone)]
pub struct BalanceLedger {
    store: Arc<dyn LeaveStore>,
    locks: EmployeeLocks,
}

impl BalanceLedger {
    pub fn new(store: Arc<dyn LeaveStore>, locks: EmployeeLocks) -> Self {
        Self { store, locks }
    }

    pub async fn lock(&self, employee_id: u64) -> EmployeeGuard {
        EmployeeGuard {
            employee_id,
            _guard: self.locks.acquire(employee_id).await,
        }
    }

    pub async fn balance(&self, employee_id: u64) -> LeaveResult<u32> {
        let employee = self
            .store
            .employee(employee_id)
            .await?
            .ok_or(Missing::Employee(employee_id))?;
        Ok(employee.annual_leave_balance)
    }

    /// Removes `days` from the balance. Fails with `INSUFFICIENT_BALANCE`
    /// when the balance is smaller than `days`.
    pub async fn debit(&self, employee_id: u64, days: u32) -> LeaveResult<u32> {
        let guard = self.lock(employee_id).await;
        self.adjust(&guard, -i64::from(days), days).await
    }

    pub async fn credit(&self, employee_id: u64, days: u32) -> LeaveResult<u32> {
        let guard = self.lock(employee_id).await;
        self.adjust(&guard, i64::from(days), days).await
    }

    /// Overwrites the balance. Role checks belong to the caller.
    pub async fn set_balance(&self, employee_id: u64, balance: u32) -> LeaveResult<u32> {
        let _guard = self.lock(employee_id).await;
        if !self.store.set_balance(employee_id, balance).await? {
            return Err(Missing::Employee(employee_id).into());
        }
        info!(employee_id, balance, "Leave balance set");
        Ok(balance)
    }

    async fn adjust(&self, guard: &EmployeeGuard, delta: i64, days: u32) -> LeaveResult<u32> {
        let employee_id = guard.employee_id();
        match self.store.adjust_balance(employee_id, delta).await? {
            BalanceWrite::Applied(balance) => {
                info!(employee_id, delta, balance, "Leave balance adjusted");
                Ok(balance)
            }
            BalanceWrite::Insufficient(balance) => Err(Violation::InsufficientBalance {
                requested: days,
                balance,
            }
            .into()),
            BalanceWrite::EmployeeMissing => Err(Missing::Employee(employee_id).into()),
        }
    }

    /// Commits a status change together with its balance movement. The
    /// caller must hold the guard of the request's owner.
    pub(crate) async fn commit(
        &self,
        guard: &EmployeeGuard,
        transition: Transition,
    ) -> LeaveResult<TransitionOutcome> {
        let request_id = transition.request_id;
        let delta = transition.balance_delta;
        let outcome = self.store.apply_transition(transition).await?;
        if let TransitionOutcome::Applied { request, balance } = &outcome {
            info!(
                employee_id = guard.employee_id(),
                request_id,
                status = %request.status,
                delta,
                balance,
                "Leave request transition committed"
            );
        }
        Ok(outcome)
    }
}
