use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{Denial, LeaveResult, Missing};
use crate::model::{Employee, LeaveRequest, LeaveStatus};
use crate::store::RequestFilter;

use super::{Actor, LeaveService, refused};

/// A pending request together with the name of the person who filed it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeamRequest {
    #[serde(flatten)]
    pub request: LeaveRequest,
    pub employee_name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmployeeBalance {
    pub employee_id: u64,
    pub name: String,
    pub remaining_leave_days: u32,
}

impl LeaveService {
    /// Pending requests of every employee the manager manages today.
    pub async fn pending_for_team(&self, actor: Actor) -> LeaveResult<Vec<TeamRequest>> {
        actor
            .require_manager("view pending leave requests")
            .map_err(|d| refused("pending_for_team", d))?;
        let team = self.managed_team(actor).await?;
        if team.is_empty() {
            return Ok(Vec::new());
        }

        let filter = RequestFilter {
            employee_ids: Some(team.iter().map(|e| e.id).collect()),
            ..RequestFilter::default()
        }
        .with_status(LeaveStatus::Pending);
        let requests = self.store.requests(&filter).await?;

        Ok(requests
            .into_iter()
            .map(|request| {
                let employee_name = team
                    .iter()
                    .find(|e| e.id == request.employee_id)
                    .map(Employee::full_name)
                    .unwrap_or_default();
                TeamRequest {
                    request,
                    employee_name,
                }
            })
            .collect())
    }

    pub async fn managed_employees(&self, actor: Actor) -> LeaveResult<Vec<Employee>> {
        actor
            .require_manager("view managed users")
            .map_err(|d| refused("managed_employees", d))?;
        self.managed_team(actor).await
    }

    /// Remaining days of one managed employee.
    pub async fn employee_balance(
        &self,
        actor: Actor,
        employee_id: u64,
    ) -> LeaveResult<EmployeeBalance> {
        actor
            .require_manager("view team balances")
            .map_err(|d| refused("employee_balance", d))?;
        let employee = self
            .store
            .employee(employee_id)
            .await?
            .ok_or(Missing::Employee(employee_id))?;
        if !self.directory.manages(actor.employee_id, employee_id).await? {
            return Err(refused(
                "employee_balance",
                Denial::NotManagerOfOwner {
                    manager_id: actor.employee_id,
                    employee_id,
                },
            ));
        }
        Ok(EmployeeBalance {
            employee_id,
            name: employee.full_name(),
            remaining_leave_days: employee.annual_leave_balance,
        })
    }

    pub(crate) async fn managed_team(&self, actor: Actor) -> LeaveResult<Vec<Employee>> {
        let ids = self
            .directory
            .managed_employees(actor.employee_id)
            .await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.store.employees_by_ids(&ids).await?)
    }
}
