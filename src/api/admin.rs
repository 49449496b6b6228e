use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::error;
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::error::{LeaveError, Violation};
use crate::leave::reporting::{CompanySummary, UsageStatistics};
use crate::leave::{AdminRequestQuery, ApprovalOutcome, LeaveService, NewStaff};
use crate::model::{Employee, LeaveRequest, ManagementLink, Role};

#[derive(Deserialize, ToSchema)]
pub struct AddUser {
    #[schema(example = "Unit")]
    pub firstname: String,
    #[schema(example = "Employee")]
    pub surname: String,
    #[schema(example = "unit-employee@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
    #[schema(example = "Test")]
    pub department: String,
    /// Defaults to `employee`.
    pub role: Option<Role>,
    /// Defaults to the configured allotment.
    #[schema(example = 25)]
    pub annual_leave_balance: Option<u32>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateRole {
    pub role: Role,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateDepartment {
    #[schema(example = "Finance")]
    pub department: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateBalance {
    /// Whole, non-negative number of days.
    #[schema(value_type = u32, example = 20)]
    pub balance: Value,
}

#[derive(Deserialize, ToSchema)]
pub struct AssignManager {
    #[schema(example = 4)]
    pub employee_id: u64,
    #[schema(example = 3)]
    pub manager_id: u64,
    /// Defaults to today.
    #[schema(value_type = Option<String>, format = "date", example = "2026-01-01")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct EndManagement {
    #[schema(example = 4)]
    pub employee_id: u64,
    /// Last managed day, inclusive. Defaults to today.
    #[schema(value_type = Option<String>, format = "date", example = "2026-06-30")]
    pub end_date: Option<NaiveDate>,
}

/// Accepts only JSON integers in `0..=u32::MAX`.
fn parse_balance(value: &Value) -> Result<u32, Violation> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(Violation::InvalidBalance)
}

#[utoipa::path(
    post,
    path = "/api/admin/add-user",
    request_body = AddUser,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Missing field or email already in use"),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn add_user(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<AddUser>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor();
    actor.require_admin("add users").map_err(LeaveError::from)?;

    let AddUser {
        firstname,
        surname,
        email,
        password,
        department,
        role,
        annual_leave_balance,
    } = payload.into_inner();
    if password.is_empty() {
        return Err(LeaveError::from(Violation::MissingField("password")).into());
    }

    let password_hash = hash_password(&password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let employee = service
        .add_staff(
            actor,
            NewStaff {
                firstname,
                surname,
                email,
                department,
                role: role.unwrap_or(Role::Employee),
                password_hash,
                annual_leave_balance,
            },
        )
        .await?;
    Ok(HttpResponse::Created().json(employee))
}

#[utoipa::path(
    patch,
    path = "/api/admin/update-role/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee to update")),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role updated", body = Employee),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_role(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<UpdateRole>,
) -> actix_web::Result<HttpResponse> {
    let employee = service
        .update_role(auth.actor(), path.into_inner(), payload.role)
        .await?;
    Ok(HttpResponse::Ok().json(employee))
}

#[utoipa::path(
    patch,
    path = "/api/admin/update-department/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee to update")),
    request_body = UpdateDepartment,
    responses(
        (status = 200, description = "Department updated", body = Employee),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_department(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<UpdateDepartment>,
) -> actix_web::Result<HttpResponse> {
    let employee = service
        .update_department(auth.actor(), path.into_inner(), &payload.department)
        .await?;
    Ok(HttpResponse::Ok().json(employee))
}

#[utoipa::path(
    get,
    path = "/api/admin/all-users",
    responses(
        (status = 200, description = "Every employee", body = [Employee]),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn all_users(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<HttpResponse> {
    let employees = service.list_employees(auth.actor()).await?;
    Ok(HttpResponse::Ok().json(employees))
}

#[utoipa::path(
    get,
    path = "/api/admin/all-leave-requests",
    params(AdminRequestQuery),
    responses(
        (status = 200, description = "Pending leave requests", body = [LeaveRequest]),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn all_leave_requests(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    query: web::Query<AdminRequestQuery>,
) -> actix_web::Result<HttpResponse> {
    let requests = service
        .list_leave_requests(auth.actor(), query.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    patch,
    path = "/api/admin/approve/{leave_request_id}",
    params(("leave_request_id" = u64, Path, description = "Request to approve")),
    responses(
        (status = 200, description = "Leave approved and balance debited", body = ApprovalOutcome),
        (status = 400, description = "Not pending or insufficient balance"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_as_admin(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor();
    actor
        .require_admin("approve leave here")
        .map_err(LeaveError::from)?;
    let outcome = service.approve(actor, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/admin/leave-usage-stats",
    responses(
        (status = 200, description = "Approved leave usage", body = UsageStatistics),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn leave_usage_stats(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<HttpResponse> {
    let stats = service.usage_statistics(auth.actor()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

#[utoipa::path(
    patch,
    path = "/api/admin/update-leave-balance/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee to update")),
    request_body = UpdateBalance,
    responses(
        (status = 200, description = "Balance overwritten", body = Object,
         example = json!({"employee_id": 4, "balance": 20})),
        (status = 400, description = "Negative or non-integer balance"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_leave_balance(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<UpdateBalance>,
) -> actix_web::Result<HttpResponse> {
    let actor = auth.actor();
    actor
        .require_admin("update leave balances")
        .map_err(LeaveError::from)?;
    let employee_id = path.into_inner();
    let balance = parse_balance(&payload.balance).map_err(LeaveError::from)?;

    let balance = service.set_balance(actor, employee_id, balance).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "employee_id": employee_id,
        "balance": balance,
    })))
}

#[utoipa::path(
    post,
    path = "/api/admin/assign-manager",
    request_body = AssignManager,
    responses(
        (status = 201, description = "Management link created", body = ManagementLink),
        (status = 400, description = "Not a manager, or already assigned"),
        (status = 403, description = "Admins only"),
        (status = 404, description = "Employee or manager not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn assign_manager(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<AssignManager>,
) -> actix_web::Result<HttpResponse> {
    let link = service
        .assign_manager(
            auth.actor(),
            payload.employee_id,
            payload.manager_id,
            payload.start_date,
        )
        .await?;
    Ok(HttpResponse::Created().json(link))
}

#[utoipa::path(
    post,
    path = "/api/admin/end-management",
    request_body = EndManagement,
    responses(
        (status = 200, description = "Management link closed", body = ManagementLink),
        (status = 400, description = "No open link, or end before start"),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn end_management(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<EndManagement>,
) -> actix_web::Result<HttpResponse> {
    let link = service
        .end_management(auth.actor(), payload.employee_id, payload.end_date)
        .await?;
    Ok(HttpResponse::Ok().json(link))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/company-summary",
    responses(
        (status = 200, description = "Approved days company-wide", body = CompanySummary),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn company_summary(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<HttpResponse> {
    let summary = service.company_summary(auth.actor()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    get,
    path = "/api/admin/reports/department-usage",
    responses(
        (status = 200, description = "Approved days per department", body = Object,
         example = json!({"Engineering": 12, "Sales": 3})),
        (status = 403, description = "Admins only")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn department_usage(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<HttpResponse> {
    let usage: BTreeMap<String, u32> = service.department_usage(auth.actor()).await?;
    Ok(HttpResponse::Ok().json(usage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn balance_must_be_a_whole_non_negative_number() {
        assert_eq!(parse_balance(&json!(20)), Ok(20));
        assert_eq!(parse_balance(&json!(0)), Ok(0));
        assert_eq!(parse_balance(&json!(-1)), Err(Violation::InvalidBalance));
        assert_eq!(parse_balance(&json!(2.5)), Err(Violation::InvalidBalance));
        assert_eq!(parse_balance(&json!("20")), Err(Violation::InvalidBalance));
        assert_eq!(parse_balance(&json!(u64::MAX)), Err(Violation::InvalidBalance));
    }
}
