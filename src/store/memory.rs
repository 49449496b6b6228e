use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use super::{
    BalanceWrite, LeaveStore, RequestFilter, StoreError, StoreResult, Transition,
    TransitionOutcome,
};
use crate::model::{
    Credentials, Employee, LeaveRequest, ManagementLink, NewEmployee, NewLeaveRequest,
    NewManagementLink, Role,
};

#[derive(Default)]
struct State {
    employees: BTreeMap<u64, Credentials>,
    requests: BTreeMap<u64, LeaveRequest>,
    links: BTreeMap<u64, ManagementLink>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local store. Every call holds one mutex for its whole body, so
/// each method, `apply_transition` included, is atomic.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".into()))
    }
}

fn apply_delta(balance: u32, delta: i64) -> Option<u32> {
    u32::try_from(i64::from(balance) + delta).ok()
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let mut state = self.state()?;
        let email = new.email.to_lowercase();
        if state
            .employees
            .values()
            .any(|c| c.employee.email.eq_ignore_ascii_case(&email))
        {
            return Err(StoreError::Duplicate("email"));
        }

        let id = state.next_id();
        let employee = Employee {
            id,
            firstname: new.firstname,
            surname: new.surname,
            email,
            department: new.department,
            role: new.role,
            annual_leave_balance: new.annual_leave_balance,
        };
        state.employees.insert(
            id,
            Credentials {
                employee: employee.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(employee)
    }

    async fn employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.state()?.employees.get(&id).map(|c| c.employee.clone()))
    }

    async fn credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
        Ok(self
            .state()?
            .employees
            .values()
            .find(|c| c.employee.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn employees(&self) -> StoreResult<Vec<Employee>> {
        Ok(self
            .state()?
            .employees
            .values()
            .map(|c| c.employee.clone())
            .collect())
    }

    async fn employees_by_ids(&self, ids: &[u64]) -> StoreResult<Vec<Employee>> {
        let state = self.state()?;
        Ok(ids
            .iter()
            .filter_map(|id| state.employees.get(id))
            .map(|c| c.employee.clone())
            .collect())
    }

    async fn update_role(&self, id: u64, role: Role) -> StoreResult<bool> {
        Ok(match self.state()?.employees.get_mut(&id) {
            Some(c) => {
                c.employee.role = role;
                true
            }
            None => false,
        })
    }

    async fn update_department(&self, id: u64, department: &str) -> StoreResult<bool> {
        Ok(match self.state()?.employees.get_mut(&id) {
            Some(c) => {
                c.employee.department = department.to_string();
                true
            }
            None => false,
        })
    }

    async fn adjust_balance(&self, id: u64, delta: i64) -> StoreResult<BalanceWrite> {
        let mut state = self.state()?;
        let Some(c) = state.employees.get_mut(&id) else {
            return Ok(BalanceWrite::EmployeeMissing);
        };
        let current = c.employee.annual_leave_balance;
        Ok(match apply_delta(current, delta) {
            Some(balance) => {
                c.employee.annual_leave_balance = balance;
                BalanceWrite::Applied(balance)
            }
            None => BalanceWrite::Insufficient(current),
        })
    }

    async fn set_balance(&self, id: u64, balance: u32) -> StoreResult<bool> {
        Ok(match self.state()?.employees.get_mut(&id) {
            Some(c) => {
                c.employee.annual_leave_balance = balance;
                true
            }
            None => false,
        })
    }

    async fn insert_request(&self, new: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let mut state = self.state()?;
        let id = state.next_id();
        let request = LeaveRequest {
            id,
            employee_id: new.employee_id,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            status: Default::default(),
            reason: new.reason,
            created_at: Utc::now(),
        };
        state.requests.insert(id, request.clone());
        Ok(request)
    }

    async fn request(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.state()?.requests.get(&id).cloned())
    }

    async fn requests(&self, filter: &RequestFilter) -> StoreResult<Vec<LeaveRequest>> {
        let mut found: Vec<_> = self
            .state()?
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        found.sort_by_key(|r| (r.start_date, r.id));
        Ok(found)
    }

    async fn apply_transition(&self, t: Transition) -> StoreResult<TransitionOutcome> {
        let mut state = self.state()?;
        let Some(request) = state.requests.get(&t.request_id) else {
            return Ok(TransitionOutcome::RequestMissing);
        };
        if request.status != t.from {
            return Ok(TransitionOutcome::StatusMismatch {
                actual: request.status,
            });
        }
        let owner = request.employee_id;

        let Some(credentials) = state.employees.get_mut(&owner) else {
            return Err(StoreError::Corrupt(format!(
                "request {} references missing employee {owner}",
                t.request_id
            )));
        };
        let current = credentials.employee.annual_leave_balance;
        let Some(balance) = apply_delta(current, t.balance_delta) else {
            return Ok(TransitionOutcome::InsufficientBalance { balance: current });
        };
        credentials.employee.annual_leave_balance = balance;

        let request = state
            .requests
            .get_mut(&t.request_id)
            .ok_or_else(|| StoreError::Corrupt(format!("request {} vanished", t.request_id)))?;
        request.status = t.to;
        request.reason = t.reason;

        Ok(TransitionOutcome::Applied {
            request: request.clone(),
            balance,
        })
    }

    async fn insert_link(&self, new: NewManagementLink) -> StoreResult<ManagementLink> {
        let mut state = self.state()?;
        let id = state.next_id();
        let link = ManagementLink {
            id,
            employee_id: new.employee_id,
            manager_id: new.manager_id,
            start_date: new.start_date,
            end_date: None,
        };
        state.links.insert(id, link.clone());
        Ok(link)
    }

    async fn links_for_employee(&self, employee_id: u64) -> StoreResult<Vec<ManagementLink>> {
        Ok(self
            .state()?
            .links
            .values()
            .filter(|l| l.employee_id == employee_id)
            .cloned()
            .collect())
    }

    async fn links_for_manager(&self, manager_id: u64) -> StoreResult<Vec<ManagementLink>> {
        Ok(self
            .state()?
            .links
            .values()
            .filter(|l| l.manager_id == manager_id)
            .cloned()
            .collect())
    }

    async fn close_link(&self, link_id: u64, end_date: NaiveDate) -> StoreResult<bool> {
        Ok(match self.state()?.links.get_mut(&link_id) {
            Some(link) => {
                link.end_date = Some(end_date);
                true
            }
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LeaveStatus, LeaveType};

    fn new_employee(email: &str, balance: u32) -> NewEmployee {
        NewEmployee {
            firstname: "Unit".into(),
            surname: "Employee".into(),
            email: email.into(),
            department: "Test".into(),
            role: Role::Employee,
            password_hash: "hash".into(),
            annual_leave_balance: balance,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[actix_web::test]
    async fn email_is_unique_case_insensitively() {
        let store = MemoryStore::new();
        store.insert_employee(new_employee("a@example.com", 1)).await.unwrap();
        let err = store
            .insert_employee(new_employee("A@Example.com", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate("email")));
    }

    #[actix_web::test]
    async fn adjust_balance_refuses_to_go_negative() {
        let store = MemoryStore::new();
        let e = store.insert_employee(new_employee("a@example.com", 2)).await.unwrap();
        assert_eq!(store.adjust_balance(e.id, -2).await.unwrap(), BalanceWrite::Applied(0));
        assert_eq!(store.adjust_balance(e.id, -1).await.unwrap(), BalanceWrite::Insufficient(0));
        assert_eq!(store.adjust_balance(99, 1).await.unwrap(), BalanceWrite::EmployeeMissing);
    }

    #[actix_web::test]
    async fn transition_checks_expected_status() {
        let store = MemoryStore::new();
        let e = store.insert_employee(new_employee("a@example.com", 5)).await.unwrap();
        let r = store
            .insert_request(NewLeaveRequest {
                employee_id: e.id,
                leave_type: LeaveType::Annual,
                start_date: date("2030-01-01"),
                end_date: date("2030-01-03"),
                reason: "note".into(),
            })
            .await
            .unwrap();

        let approve = Transition {
            request_id: r.id,
            from: LeaveStatus::Pending,
            to: LeaveStatus::Approved,
            reason: "ok".into(),
            balance_delta: -3,
        };
        match store.apply_transition(approve.clone()).await.unwrap() {
            TransitionOutcome::Applied { request, balance } => {
                assert_eq!(request.status, LeaveStatus::Approved);
                assert_eq!(balance, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            store.apply_transition(approve).await.unwrap(),
            TransitionOutcome::StatusMismatch {
                actual: LeaveStatus::Approved
            }
        );
        assert_eq!(store.employee(e.id).await.unwrap().unwrap().annual_leave_balance, 2);
    }

    #[actix_web::test]
    async fn transition_leaves_state_alone_when_balance_short() {
        let store = MemoryStore::new();
        let e = store.insert_employee(new_employee("a@example.com", 1)).await.unwrap();
        let r = store
            .insert_request(NewLeaveRequest {
                employee_id: e.id,
                leave_type: LeaveType::Sick,
                start_date: date("2030-01-01"),
                end_date: date("2030-01-03"),
                reason: "note".into(),
            })
            .await
            .unwrap();

        let outcome = store
            .apply_transition(Transition {
                request_id: r.id,
                from: LeaveStatus::Pending,
                to: LeaveStatus::Approved,
                reason: "ok".into(),
                balance_delta: -3,
            })
            .await
            .unwrap();
        assert_eq!(outcome, TransitionOutcome::InsufficientBalance { balance: 1 });
        let stored = store.request(r.id).await.unwrap().unwrap();
        assert_eq!(stored.status, LeaveStatus::Pending);
        assert_eq!(stored.reason, "note");
    }

    #[actix_web::test]
    async fn reads_cover_credentials_employees_and_links() {
        let store = MemoryStore::new();
        let a = store.insert_employee(new_employee("a@example.com", 1)).await.unwrap();
        let b = store.insert_employee(new_employee("b@example.com", 1)).await.unwrap();

        let creds = store.credentials("A@example.com").await.unwrap().unwrap();
        assert_eq!(creds.employee.id, a.id);
        assert_eq!(creds.password_hash, "hash");
        assert_eq!(store.employees().await.unwrap().len(), 2);

        let link = store
            .insert_link(NewManagementLink {
                employee_id: a.id,
                manager_id: b.id,
                start_date: date("2030-01-01"),
            })
            .await
            .unwrap();
        assert_eq!(store.links_for_employee(a.id).await.unwrap(), vec![link.clone()]);
        assert_eq!(store.links_for_manager(b.id).await.unwrap(), vec![link]);
        assert!(store.links_for_manager(a.id).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn poisoned_lock_surfaces_as_store_error() {
        let store = MemoryStore::new();
        std::thread::scope(|s| {
            let _ = s
                .spawn(|| {
                    let _held = store.state.lock().unwrap();
                    panic!("poison");
                })
                .join();
        });
        let err = store.employees().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
