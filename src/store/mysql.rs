use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder};

use super::{
    BalanceWrite, LeaveStore, RequestFilter, StoreError, StoreResult, Transition,
    TransitionOutcome,
};
use crate::model::{
    Credentials, Employee, LeaveRequest, LeaveStatus, LeaveType, ManagementLink, NewEmployee,
    NewLeaveRequest, NewManagementLink, Role,
};

const EMPLOYEE_COLUMNS: &str =
    "id, firstname, surname, email, department, role, annual_leave_balance";
const REQUEST_COLUMNS: &str =
    "id, employee_id, leave_type, start_date, end_date, status, reason, created_at";
const LINK_COLUMNS: &str = "id, employee_id, manager_id, start_date, end_date";

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    firstname: String,
    surname: String,
    email: String,
    department: String,
    role: String,
    annual_leave_balance: i32,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Employee {
            id: row.id,
            role: parse(&row.role, "role")?,
            annual_leave_balance: u32::try_from(row.annual_leave_balance).map_err(|_| {
                StoreError::Corrupt(format!("employee {} has negative balance", row.id))
            })?,
            firstname: row.firstname,
            surname: row.surname,
            email: row.email,
            department: row.department,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    employee: EmployeeRow,
    password_hash: String,
}

#[derive(FromRow)]
struct RequestRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RequestRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> Result<Self, Self::Error> {
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: parse::<LeaveType>(&row.leave_type, "leave_type")?,
            start_date: row.start_date,
            end_date: row.end_date,
            status: parse::<LeaveStatus>(&row.status, "status")?,
            reason: row.reason.unwrap_or_default(),
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct LinkRow {
    id: u64,
    employee_id: u64,
    manager_id: u64,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
}

impl From<LinkRow> for ManagementLink {
    fn from(row: LinkRow) -> Self {
        ManagementLink {
            id: row.id,
            employee_id: row.employee_id,
            manager_id: row.manager_id,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

fn parse<T: FromStr>(value: &str, column: &str) -> StoreResult<T> {
    T::from_str(value).map_err(|_| StoreError::Corrupt(format!("{column} = {value:?}")))
}

fn is_duplicate(e: &sqlx::Error) -> bool {
    // MySQL reports unique-key violations as SQLSTATE 23000
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23000"))
}

/// MySQL-backed store. Transitions and balance writes run inside a
/// transaction that locks the touched rows with `SELECT ... FOR UPDATE`.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn insert_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
                (firstname, surname, email, department, role, password_hash, annual_leave_balance)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.firstname)
        .bind(&new.surname)
        .bind(new.email.to_lowercase())
        .bind(&new.department)
        .bind(new.role.as_str())
        .bind(&new.password_hash)
        .bind(new.annual_leave_balance)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_duplicate(&e) {
                StoreError::Duplicate("email")
            } else {
                StoreError::Database(e)
            }
        })?;

        self.employee(result.last_insert_id())
            .await?
            .ok_or_else(|| StoreError::Corrupt("inserted employee not readable".into()))
    }

    async fn employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn credentials(&self, email: &str) -> StoreResult<Option<Credentials>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS}, password_hash FROM employees WHERE email = ?");
        let Some(row) = sqlx::query_as::<_, CredentialsRow>(&sql)
            .bind(email.to_lowercase())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(Credentials {
            employee: row.employee.try_into()?,
            password_hash: row.password_hash,
        }))
    }

    async fn employees(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY id");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Employee::try_from)
            .collect()
    }

    async fn employees_by_ids(&self, ids: &[u64]) -> StoreResult<Vec<Employee>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<MySql> = QueryBuilder::new(format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id IN ("
        ));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        query.push(") ORDER BY id");

        query
            .build_query_as::<EmployeeRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Employee::try_from)
            .collect()
    }

    async fn update_role(&self, id: u64, role: Role) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE employees SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0 || self.employee(id).await?.is_some())
    }

    async fn update_department(&self, id: u64, department: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE employees SET department = ? WHERE id = ?")
            .bind(department)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0 || self.employee(id).await?.is_some())
    }

    async fn adjust_balance(&self, id: u64, delta: i64) -> StoreResult<BalanceWrite> {
        let mut tx = self.pool.begin().await?;

        let current: Option<i32> = sqlx::query_scalar(
            "SELECT annual_leave_balance FROM employees WHERE id = ? FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(current) = current else {
            return Ok(BalanceWrite::EmployeeMissing);
        };

        let next = i64::from(current) + delta;
        let current = u32::try_from(current)
            .map_err(|_| StoreError::Corrupt(format!("employee {id} has negative balance")))?;
        let Ok(next) = u32::try_from(next) else {
            return Ok(BalanceWrite::Insufficient(current));
        };

        sqlx::query("UPDATE employees SET annual_leave_balance = ? WHERE id = ?")
            .bind(next)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(BalanceWrite::Applied(next))
    }

    async fn set_balance(&self, id: u64, balance: u32) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE employees SET annual_leave_balance = ? WHERE id = ?")
            .bind(balance)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0 || self.employee(id).await?.is_some())
    }

    async fn insert_request(&self, new: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, status, reason)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.leave_type.as_str())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(LeaveStatus::Pending.as_str())
        .bind(&new.reason)
        .execute(&self.pool)
        .await?;

        self.request(result.last_insert_id())
            .await?
            .ok_or_else(|| StoreError::Corrupt("inserted leave request not readable".into()))
    }

    async fn request(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn requests(&self, filter: &RequestFilter) -> StoreResult<Vec<LeaveRequest>> {
        let mut query: QueryBuilder<MySql> = QueryBuilder::new(format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE 1=1"
        ));

        if let Some(ids) = &filter.employee_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            query.push(" AND employee_id IN (");
            let mut separated = query.separated(", ");
            for id in ids {
                separated.push_bind(*id);
            }
            query.push(")");
        }

        if let Some(statuses) = &filter.statuses {
            if statuses.is_empty() {
                return Ok(Vec::new());
            }
            query.push(" AND status IN (");
            let mut separated = query.separated(", ");
            for status in statuses {
                separated.push_bind(status.as_str());
            }
            query.push(")");
        }

        if let Some(from) = filter.start_from {
            query.push(" AND start_date >= ").push_bind(from);
        }
        if let Some(to) = filter.start_to {
            query.push(" AND start_date <= ").push_bind(to);
        }
        query.push(" ORDER BY start_date, id");

        query
            .build_query_as::<RequestRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect()
    }

    async fn apply_transition(&self, t: Transition) -> StoreResult<TransitionOutcome> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<(u64, String)> = sqlx::query_as(
            "SELECT employee_id, status FROM leave_requests WHERE id = ? FOR UPDATE",
        )
        .bind(t.request_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((owner, status)) = locked else {
            return Ok(TransitionOutcome::RequestMissing);
        };
        let actual: LeaveStatus = parse(&status, "status")?;
        if actual != t.from {
            return Ok(TransitionOutcome::StatusMismatch { actual });
        }

        let current: i32 = sqlx::query_scalar(
            "SELECT annual_leave_balance FROM employees WHERE id = ? FOR UPDATE",
        )
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            StoreError::Corrupt(format!(
                "request {} references missing employee {owner}",
                t.request_id
            ))
        })?;
        let current_days = u32::try_from(current)
            .map_err(|_| StoreError::Corrupt(format!("employee {owner} has negative balance")))?;
        let Ok(balance) = u32::try_from(i64::from(current) + t.balance_delta) else {
            return Ok(TransitionOutcome::InsufficientBalance {
                balance: current_days,
            });
        };

        if t.balance_delta != 0 {
            sqlx::query("UPDATE employees SET annual_leave_balance = ? WHERE id = ?")
                .bind(balance)
                .bind(owner)
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query("UPDATE leave_requests SET status = ?, reason = ? WHERE id = ? AND status = ?")
            .bind(t.to.as_str())
            .bind(&t.reason)
            .bind(t.request_id)
            .bind(t.from.as_str())
            .execute(&mut *tx)
            .await?;

        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?");
        let request: LeaveRequest = sqlx::query_as::<_, RequestRow>(&sql)
            .bind(t.request_id)
            .fetch_one(&mut *tx)
            .await?
            .try_into()?;

        tx.commit().await?;

        Ok(TransitionOutcome::Applied { request, balance })
    }

    async fn insert_link(&self, new: NewManagementLink) -> StoreResult<ManagementLink> {
        let result = sqlx::query(
            "INSERT INTO management_links (employee_id, manager_id, start_date) VALUES (?, ?, ?)",
        )
        .bind(new.employee_id)
        .bind(new.manager_id)
        .bind(new.start_date)
        .execute(&self.pool)
        .await?;

        Ok(ManagementLink {
            id: result.last_insert_id(),
            employee_id: new.employee_id,
            manager_id: new.manager_id,
            start_date: new.start_date,
            end_date: None,
        })
    }

    async fn links_for_employee(&self, employee_id: u64) -> StoreResult<Vec<ManagementLink>> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM management_links WHERE employee_id = ? ORDER BY start_date"
        );
        Ok(sqlx::query_as::<_, LinkRow>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ManagementLink::from)
            .collect())
    }

    async fn links_for_manager(&self, manager_id: u64) -> StoreResult<Vec<ManagementLink>> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM management_links WHERE manager_id = ? ORDER BY employee_id"
        );
        Ok(sqlx::query_as::<_, LinkRow>(&sql)
            .bind(manager_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ManagementLink::from)
            .collect())
    }

    async fn close_link(&self, link_id: u64, end_date: NaiveDate) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE management_links SET end_date = ? WHERE id = ?")
            .bind(end_date)
            .bind(link_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
