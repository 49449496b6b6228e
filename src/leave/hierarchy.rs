//! Who manages whom.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::error::{LeaveResult, Missing, Violation};
use crate::model::{ManagementLink, NewManagementLink, Role};
use crate::store::{LeaveStore, StoreError};
use crate::utils::employee_locks::EmployeeLocks;

use super::clock::Clock;

/// Management links, one active link per employee at any day.
///
/// Link writes for an employee run under that employee's lock, the same
/// one the ledger uses, so two concurrent assignments cannot both pass the
/// "no existing link" check.
#[derive(Clone)]
pub struct ManagementDirectory {
    store: Arc<dyn LeaveStore>,
    clock: Arc<dyn Clock>,
    locks: EmployeeLocks,
}

impl ManagementDirectory {
    pub fn new(store: Arc<dyn LeaveStore>, clock: Arc<dyn Clock>, locks: EmployeeLocks) -> Self {
        Self { store, clock, locks }
    }

    /// Links `employee_id` to `manager_id` from `start_date` (today when
    /// absent). The manager must hold the `manager` role and the employee
    /// must have no link that is open or still running on `start_date`.
    pub async fn assign(
        &self,
        employee_id: u64,
        manager_id: u64,
        start_date: Option<NaiveDate>,
    ) -> LeaveResult<ManagementLink> {
        let start_date = start_date.unwrap_or_else(|| self.clock.today());
        let _guard = self.locks.acquire(employee_id).await;

        self.store
            .employee(employee_id)
            .await?
            .ok_or(Missing::Employee(employee_id))?;
        let manager = self
            .store
            .employee(manager_id)
            .await?
            .ok_or(Missing::Manager(manager_id))?;
        if manager.role != Role::Manager {
            return Err(Violation::NotAManager {
                user_id: manager_id,
            }
            .into());
        }

        let links = self.store.links_for_employee(employee_id).await?;
        if links.iter().any(|l| l.reaches(start_date)) {
            return Err(Violation::AlreadyAssigned { employee_id }.into());
        }

        let link = self
            .store
            .insert_link(NewManagementLink {
                employee_id,
                manager_id,
                start_date,
            })
            .await?;
        info!(employee_id, manager_id, %start_date, "Manager assigned");
        Ok(link)
    }

    /// Closes the employee's open-ended link on `end_date` (inclusive).
    pub async fn end_management(
        &self,
        employee_id: u64,
        end_date: Option<NaiveDate>,
    ) -> LeaveResult<ManagementLink> {
        let end_date = end_date.unwrap_or_else(|| self.clock.today());
        let _guard = self.locks.acquire(employee_id).await;

        let mut link = self
            .store
            .links_for_employee(employee_id)
            .await?
            .into_iter()
            .find(|l| l.end_date.is_none())
            .ok_or(Violation::NoOpenLink { employee_id })?;
        if end_date < link.start_date {
            return Err(Violation::LinkEndBeforeStart {
                start: link.start_date,
                end: end_date,
            }
            .into());
        }

        if !self.store.close_link(link.id, end_date).await? {
            return Err(StoreError::Corrupt(format!("link {} vanished", link.id)).into());
        }
        link.end_date = Some(end_date);
        info!(employee_id, manager_id = link.manager_id, %end_date, "Management ended");
        Ok(link)
    }

    /// Ids of the employees `manager_id` manages today, ascending.
    pub async fn managed_employees(&self, manager_id: u64) -> LeaveResult<Vec<u64>> {
        let today = self.clock.today();
        let ids: BTreeSet<u64> = self
            .store
            .links_for_manager(manager_id)
            .await?
            .into_iter()
            .filter(|l| l.is_active_on(today))
            .map(|l| l.employee_id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    pub async fn current_manager(&self, employee_id: u64) -> LeaveResult<Option<u64>> {
        let today = self.clock.today();
        Ok(self
            .store
            .links_for_employee(employee_id)
            .await?
            .into_iter()
            .find(|l| l.is_active_on(today))
            .map(|l| l.manager_id))
    }

    pub async fn manages(&self, manager_id: u64, employee_id: u64) -> LeaveResult<bool> {
        Ok(self.current_manager(employee_id).await? == Some(manager_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leave::clock::FixedClock;
    use crate::model::NewEmployee;
    use crate::store::MemoryStore;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn setup() -> (ManagementDirectory, u64, u64, u64) {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for (email, role) in [
            ("emp@example.com", Role::Employee),
            ("boss@example.com", Role::Manager),
            ("other@example.com", Role::Employee),
        ] {
            let e = store
                .insert_employee(NewEmployee {
                    firstname: "Test".into(),
                    surname: "User".into(),
                    email: email.into(),
                    department: "Ops".into(),
                    role,
                    password_hash: "x".into(),
                    annual_leave_balance: 10,
                })
                .await
                .unwrap();
            ids.push(e.id);
        }
        let clock = Arc::new(FixedClock(date("2025-03-01")));
        let directory = ManagementDirectory::new(store, clock, EmployeeLocks::new());
        (directory, ids[0], ids[1], ids[2])
    }

    #[actix_web::test]
    async fn assign_requires_manager_role() {
        let (dir, emp, _, other) = setup().await;
        let err = dir.assign(emp, other, None).await.unwrap_err();
        assert_eq!(err.code(), "NOT_A_MANAGER");
        let err = dir.assign(emp, 999, None).await.unwrap_err();
        assert_eq!(err.code(), "MANAGER_NOT_FOUND");
    }

    #[actix_web::test]
    async fn second_assignment_is_refused_while_linked() {
        let (dir, emp, boss, _) = setup().await;
        dir.assign(emp, boss, Some(date("2025-01-01"))).await.unwrap();
        let err = dir.assign(emp, boss, None).await.unwrap_err();
        assert_eq!(err.code(), "ALREADY_ASSIGNED");
        assert_eq!(dir.managed_employees(boss).await.unwrap(), vec![emp]);
        assert!(dir.manages(boss, emp).await.unwrap());
    }

    #[actix_web::test]
    async fn ended_link_allows_reassignment_after_end() {
        let (dir, emp, boss, _) = setup().await;
        dir.assign(emp, boss, Some(date("2025-01-01"))).await.unwrap();
        let closed = dir.end_management(emp, Some(date("2025-02-15"))).await.unwrap();
        assert_eq!(closed.end_date, Some(date("2025-02-15")));
        assert!(!dir.manages(boss, emp).await.unwrap());
        assert!(dir.managed_employees(boss).await.unwrap().is_empty());

        let err = dir.assign(emp, boss, Some(date("2025-02-15"))).await.unwrap_err();
        assert_eq!(err.code(), "ALREADY_ASSIGNED");
        dir.assign(emp, boss, Some(date("2025-02-16"))).await.unwrap();
        assert_eq!(dir.current_manager(emp).await.unwrap(), Some(boss));
    }

    #[actix_web::test]
    async fn end_management_checks_open_link_and_dates() {
        let (dir, emp, boss, _) = setup().await;
        let err = dir.end_management(emp, None).await.unwrap_err();
        assert_eq!(err.code(), "NO_OPEN_LINK");

        dir.assign(emp, boss, Some(date("2025-02-01"))).await.unwrap();
        let err = dir
            .end_management(emp, Some(date("2025-01-31")))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "LINK_END_BEFORE_START");
    }

    #[actix_web::test]
    async fn future_link_is_not_yet_active() {
        let (dir, emp, boss, _) = setup().await;
        dir.assign(emp, boss, Some(date("2025-04-01"))).await.unwrap();
        assert!(!dir.manages(boss, emp).await.unwrap());
    }
}
