use super::employee::Employee;

/// Login material for an employee account.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub employee: Employee,
    pub password_hash: String,
}
