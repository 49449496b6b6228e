//! Read-only rollups over the request set.
//!
//! The free functions are pure and recompute everything from the slices they
//! are given. The `LeaveService` methods below them do the role checks and
//! fetch the data.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::LeaveResult;
use crate::model::{Employee, LeaveRequest, LeaveStatus};
use crate::store::RequestFilter;

use super::{Actor, LeaveService, refused};

/// Upcoming leave covers `[today, today + UPCOMING_WINDOW_DAYS]`.
pub const UPCOMING_WINDOW_DAYS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmployeeUsage {
    pub employee_id: u64,
    pub name: String,
    pub department: String,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UsageStatistics {
    pub total_approved_requests: usize,
    pub total_approved_days: u32,
    pub by_department: BTreeMap<String, u32>,
    /// Ordered by employee id.
    pub by_employee: Vec<EmployeeUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CompanySummary {
    pub total_approved_days: u32,
    pub by_department: BTreeMap<String, u32>,
    pub by_employee: BTreeMap<u64, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PendingCount {
    pub employee_id: u64,
    pub name: String,
    pub pending: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UpcomingLeave {
    pub employee_id: u64,
    pub name: String,
    pub request: LeaveRequest,
}

fn approved(requests: &[LeaveRequest]) -> impl Iterator<Item = &LeaveRequest> {
    requests.iter().filter(|r| r.status == LeaveStatus::Approved)
}

fn by_id(employees: &[Employee]) -> HashMap<u64, &Employee> {
    employees.iter().map(|e| (e.id, e)).collect()
}

/// Approved days summed by department. Requests whose owner is not in
/// `employees` are left out.
pub fn department_usage(requests: &[LeaveRequest], employees: &[Employee]) -> BTreeMap<String, u32> {
    let owners = by_id(employees);
    let mut totals = BTreeMap::new();
    for request in approved(requests) {
        if let Some(owner) = owners.get(&request.employee_id) {
            *totals.entry(owner.department.clone()).or_insert(0) += request.days();
        }
    }
    totals
}

pub fn usage_statistics(requests: &[LeaveRequest], employees: &[Employee]) -> UsageStatistics {
    let owners = by_id(employees);
    let mut per_employee: BTreeMap<u64, u32> = BTreeMap::new();
    let mut total_approved_requests = 0;
    let mut total_approved_days = 0;
    for request in approved(requests) {
        total_approved_requests += 1;
        total_approved_days += request.days();
        *per_employee.entry(request.employee_id).or_insert(0) += request.days();
    }

    let by_employee = per_employee
        .into_iter()
        .map(|(employee_id, days)| {
            let owner = owners.get(&employee_id);
            EmployeeUsage {
                employee_id,
                name: owner.map(|e| e.full_name()).unwrap_or_default(),
                department: owner.map(|e| e.department.clone()).unwrap_or_default(),
                days,
            }
        })
        .collect();

    UsageStatistics {
        total_approved_requests,
        total_approved_days,
        by_department: department_usage(requests, employees),
        by_employee,
    }
}

pub fn company_summary(requests: &[LeaveRequest], employees: &[Employee]) -> CompanySummary {
    let mut by_employee = BTreeMap::new();
    for request in approved(requests) {
        *by_employee.entry(request.employee_id).or_insert(0) += request.days();
    }
    CompanySummary {
        total_approved_days: by_employee.values().sum(),
        by_department: department_usage(requests, employees),
        by_employee,
    }
}

/// Pending count for every member of `team`, zeros included, in team order.
pub fn pending_summary(team: &[Employee], requests: &[LeaveRequest]) -> Vec<PendingCount> {
    team.iter()
        .map(|e| PendingCount {
            employee_id: e.id,
            name: e.full_name(),
            pending: requests
                .iter()
                .filter(|r| r.employee_id == e.id && r.status == LeaveStatus::Pending)
                .count(),
        })
        .collect()
}

/// Approved leave of `team` starting within the upcoming window, by start
/// date.
pub fn upcoming_leaves(
    team: &[Employee],
    requests: &[LeaveRequest],
    today: NaiveDate,
) -> Vec<UpcomingLeave> {
    let horizon = today
        .checked_add_days(Days::new(UPCOMING_WINDOW_DAYS))
        .unwrap_or(NaiveDate::MAX);
    let members = by_id(team);
    let mut upcoming: Vec<_> = approved(requests)
        .filter(|r| r.start_date >= today && r.start_date <= horizon)
        .filter_map(|r| {
            members.get(&r.employee_id).map(|e| UpcomingLeave {
                employee_id: e.id,
                name: e.full_name(),
                request: r.clone(),
            })
        })
        .collect();
    upcoming.sort_by_key(|u| (u.request.start_date, u.request.id));
    upcoming
}

impl LeaveService {
    pub async fn usage_statistics(&self, actor: Actor) -> LeaveResult<UsageStatistics> {
        actor
            .require_admin("view leave usage")
            .map_err(|d| refused("usage_statistics", d))?;
        let (requests, employees) = self.approved_with_owners().await?;
        Ok(usage_statistics(&requests, &employees))
    }

    pub async fn company_summary(&self, actor: Actor) -> LeaveResult<CompanySummary> {
        actor
            .require_admin("view company reports")
            .map_err(|d| refused("company_summary", d))?;
        let (requests, employees) = self.approved_with_owners().await?;
        Ok(company_summary(&requests, &employees))
    }

    pub async fn department_usage(&self, actor: Actor) -> LeaveResult<BTreeMap<String, u32>> {
        actor
            .require_admin("view department reports")
            .map_err(|d| refused("department_usage", d))?;
        let (requests, employees) = self.approved_with_owners().await?;
        Ok(department_usage(&requests, &employees))
    }

    pub async fn pending_summary(&self, actor: Actor) -> LeaveResult<Vec<PendingCount>> {
        actor
            .require_manager("view team reports")
            .map_err(|d| refused("pending_summary", d))?;
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
        Ok(pending_summary(&team, &requests))
    }

    pub async fn upcoming_team_leaves(&self, actor: Actor) -> LeaveResult<Vec<UpcomingLeave>> {
        actor
            .require_manager("view team reports")
            .map_err(|d| refused("upcoming_team_leaves", d))?;
        let team = self.managed_team(actor).await?;
        if team.is_empty() {
            return Ok(Vec::new());
        }
        let today = self.clock.today();
        let filter = RequestFilter {
            employee_ids: Some(team.iter().map(|e| e.id).collect()),
            start_from: Some(today),
            ..RequestFilter::default()
        }
        .with_status(LeaveStatus::Approved);
        let requests = self.store.requests(&filter).await?;
        Ok(upcoming_leaves(&team, &requests, today))
    }

    async fn approved_with_owners(&self) -> LeaveResult<(Vec<LeaveRequest>, Vec<Employee>)> {
        let requests = self
            .store
            .requests(&RequestFilter::default().with_status(LeaveStatus::Approved))
            .await?;
        let employees = self.store.employees().await?;
        Ok((requests, employees))
    }
}
