#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use leave_tracker::leave::{
    Actor, ApprovalScope, FixedClock, LeavePolicy, LeaveService, SubmitLeave,
};
use leave_tracker::model::{NewEmployee, Role};
use leave_tracker::store::{LeaveStore, MemoryStore};

pub const TODAY: &str = "2025-06-01";

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn leave(start: &str, end: &str) -> SubmitLeave {
    SubmitLeave {
        start_date: date(start),
        end_date: date(end),
        leave_type: None,
    }
}

/// One admin, one manager and one employee managed by that manager since
/// 2024-01-01, mirroring the demo accounts.
pub struct World {
    pub store: Arc<MemoryStore>,
    pub service: Arc<LeaveService>,
    pub admin: Actor,
    pub manager: Actor,
    pub employee: Actor,
}

impl World {
    pub async fn balance(&self, actor: Actor) -> u32 {
        self.service.remaining_balance(actor).await.unwrap()
    }

    /// Adds an employee outside the manager's team.
    pub async fn outsider(&self, email: &str, balance: u32) -> Actor {
        let e = self
            .store
            .insert_employee(new_employee(email, Role::Employee, balance, "unused"))
            .await
            .unwrap();
        Actor::new(e.id, Role::Employee)
    }
}

pub fn new_employee(email: &str, role: Role, balance: u32, password_hash: &str) -> NewEmployee {
    NewEmployee {
        firstname: "Unit".into(),
        surname: role.as_str().to_string(),
        email: email.into(),
        department: "Test".into(),
        role,
        password_hash: password_hash.into(),
        annual_leave_balance: balance,
    }
}

pub async fn world(employee_balance: u32, scope: ApprovalScope) -> World {
    world_with_hash(employee_balance, scope, "unused").await
}

pub async fn world_with_hash(employee_balance: u32, scope: ApprovalScope, password_hash: &str) -> World {
    let store = Arc::new(MemoryStore::new());
    let admin = store
        .insert_employee(new_employee("admin@example.com", Role::Admin, 25, password_hash))
        .await
        .unwrap();
    let manager = store
        .insert_employee(new_employee("unit-manager@example.com", Role::Manager, 25, password_hash))
        .await
        .unwrap();
    let employee = store
        .insert_employee(new_employee(
            "unit-employee@example.com",
            Role::Employee,
            employee_balance,
            password_hash,
        ))
        .await
        .unwrap();

    let service = Arc::new(LeaveService::new(
        store.clone(),
        Arc::new(FixedClock(date(TODAY))),
        LeavePolicy {
            approval_scope: scope,
            default_allotment: 25,
        },
    ));
    service
        .directory()
        .assign(employee.id, manager.id, Some(date("2024-01-01")))
        .await
        .unwrap();

    World {
        store,
        service,
        admin: Actor::new(admin.id, Role::Admin),
        manager: Actor::new(manager.id, Role::Manager),
        employee: Actor::new(employee.id, Role::Employee),
    }
}
