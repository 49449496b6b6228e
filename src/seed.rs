use anyhow::{Context, Result};
use tracing::info;

use crate::auth::password::hash_password;
use crate::leave::LeaveService;
use crate::model::{NewEmployee, Role};

/// Creates the admin account unless one with `email` already exists.
/// Returns whether an account was created.
pub async fn ensure_admin(service: &LeaveService, email: &str, password: &str) -> Result<bool> {
    let email = email.trim().to_lowercase();
    if service
        .store()
        .credentials(&email)
        .await
        .context("Failed to look up seed admin")?
        .is_some()
    {
        return Ok(false);
    }

    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!("Failed to hash seed password: {e}"))?;
    let admin = service
        .store()
        .insert_employee(NewEmployee {
            firstname: "System".to_string(),
            surname: "Admin".to_string(),
            email,
            department: "Administration".to_string(),
            role: Role::Admin,
            password_hash,
            annual_leave_balance: service.policy().default_allotment,
        })
        .await
        .context("Failed to create seed admin")?;
    info!(employee_id = admin.id, "Seed admin created");
    Ok(true)
}
