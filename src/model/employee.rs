use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 4,
        "firstname": "Unit",
        "surname": "Employee",
        "email": "unit-employee@example.com",
        "department": "Test",
        "role": "employee",
        "annual_leave_balance": 10
    })
)]
pub struct Employee {
    #[schema(example = 4)]
    pub id: u64,

    #[schema(example = "Unit")]
    pub firstname: String,

    #[schema(example = "Employee")]
    pub surname: String,

    #[schema(example = "unit-employee@example.com")]
    pub email: String,

    #[schema(example = "Test")]
    pub department: String,

    pub role: Role,

    /// Remaining leave days. Only the balance ledger writes this.
    #[schema(example = 10)]
    pub annual_leave_balance: u32,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.surname)
    }
}

/// Everything needed to create an employee row. The password arrives
/// already hashed.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub firstname: String,
    pub surname: String,
    pub email: String,
    pub department: String,
    pub role: Role,
    pub password_hash: String,
    pub annual_leave_balance: u32,
}
