//! Administrative operations on accounts, balances and management links.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::error::{LeaveResult, Missing, Violation};
use crate::model::{
    Employee, LeaveRequest, LeaveStatus, ManagementLink, NewEmployee, Role,
};
use crate::store::{RequestFilter, StoreError};

use super::{Actor, LeaveService, refused};

/// Account to create. The password is hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewStaff {
    pub firstname: String,
    pub surname: String,
    pub email: String,
    pub department: String,
    pub role: Role,
    pub password_hash: String,
    /// Falls back to the configured default allotment.
    pub annual_leave_balance: Option<u32>,
}

/// Narrows the admin view of pending requests. `user_id` wins when both
/// are set.
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AdminRequestQuery {
    pub user_id: Option<u64>,
    pub manager_id: Option<u64>,
}

impl LeaveService {
    pub async fn add_staff(&self, actor: Actor, staff: NewStaff) -> LeaveResult<Employee> {
        actor
            .require_admin("add users")
            .map_err(|d| refused("add_staff", d))?;
        for (field, value) in [
            ("firstname", &staff.firstname),
            ("surname", &staff.surname),
            ("email", &staff.email),
            ("department", &staff.department),
        ] {
            if value.trim().is_empty() {
                return Err(refused("add_staff", Violation::MissingField(field)));
            }
        }

        let new = NewEmployee {
            firstname: staff.firstname.trim().to_string(),
            surname: staff.surname.trim().to_string(),
            email: staff.email.trim().to_lowercase(),
            department: staff.department.trim().to_string(),
            role: staff.role,
            password_hash: staff.password_hash,
            annual_leave_balance: staff
                .annual_leave_balance
                .unwrap_or(self.policy.default_allotment),
        };
        match self.store.insert_employee(new).await {
            Ok(employee) => {
                info!(employee_id = employee.id, role = %employee.role, "Employee created");
                Ok(employee)
            }
            Err(StoreError::Duplicate(_)) => Err(refused("add_staff", Violation::EmailInUse)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_role(&self, actor: Actor, employee_id: u64, role: Role) -> LeaveResult<Employee> {
        actor
            .require_admin("update roles")
            .map_err(|d| refused("update_role", d))?;
        if !self.store.update_role(employee_id, role).await? {
            return Err(Missing::Employee(employee_id).into());
        }
        info!(employee_id, role = %role, "Role updated");
        self.fetch_employee(employee_id).await
    }

    pub async fn update_department(
        &self,
        actor: Actor,
        employee_id: u64,
        department: &str,
    ) -> LeaveResult<Employee> {
        actor
            .require_admin("update departments")
            .map_err(|d| refused("update_department", d))?;
        let department = department.trim();
        if department.is_empty() {
            return Err(refused("update_department", Violation::MissingField("department")));
        }
        if !self.store.update_department(employee_id, department).await? {
            return Err(Missing::Employee(employee_id).into());
        }
        info!(employee_id, department, "Department updated");
        self.fetch_employee(employee_id).await
    }

    pub async fn list_employees(&self, actor: Actor) -> LeaveResult<Vec<Employee>> {
        actor
            .require_admin("list users")
            .map_err(|d| refused("list_employees", d))?;
        Ok(self.store.employees().await?)
    }

    /// Pending requests, optionally for one employee or one manager's team.
    pub async fn list_leave_requests(
        &self,
        actor: Actor,
        query: AdminRequestQuery,
    ) -> LeaveResult<Vec<LeaveRequest>> {
        actor
            .require_admin("list leave requests")
            .map_err(|d| refused("list_leave_requests", d))?;

        let employee_ids = match (query.user_id, query.manager_id) {
            (Some(user_id), _) => Some(vec![user_id]),
            (None, Some(manager_id)) => {
                let team = self.directory.managed_employees(manager_id).await?;
                if team.is_empty() {
                    return Ok(Vec::new());
                }
                Some(team)
            }
            (None, None) => None,
        };
        let filter = RequestFilter {
            employee_ids,
            ..RequestFilter::default()
        }
        .with_status(LeaveStatus::Pending);
        Ok(self.store.requests(&filter).await?)
    }

    pub async fn set_balance(&self, actor: Actor, employee_id: u64, balance: u32) -> LeaveResult<u32> {
        actor
            .require_admin("update leave balances")
            .map_err(|d| refused("set_balance", d))?;
        self.ledger.set_balance(employee_id, balance).await
    }

    pub async fn assign_manager(
        &self,
        actor: Actor,
        employee_id: u64,
        manager_id: u64,
        start_date: Option<NaiveDate>,
    ) -> LeaveResult<ManagementLink> {
        actor
            .require_admin("assign managers")
            .map_err(|d| refused("assign_manager", d))?;
        self.directory
            .assign(employee_id, manager_id, start_date)
            .await
            .map_err(|e| refused("assign_manager", e))
    }

    pub async fn end_management(
        &self,
        actor: Actor,
        employee_id: u64,
        end_date: Option<NaiveDate>,
    ) -> LeaveResult<ManagementLink> {
        actor
            .require_admin("end management links")
            .map_err(|d| refused("end_management", d))?;
        self.directory
            .end_management(employee_id, end_date)
            .await
            .map_err(|e| refused("end_management", e))
    }

    async fn fetch_employee(&self, employee_id: u64) -> LeaveResult<Employee> {
        Ok(self
            .store
            .employee(employee_id)
            .await?
            .ok_or(Missing::Employee(employee_id))?)
    }
}
