use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::leave::reporting::{PendingCount, UpcomingLeave};
use crate::leave::{
    ApprovalOutcome, CancelOutcome, EmployeeBalance, LeaveService, SubmitLeave, TeamRequest,
};
use crate::model::{Employee, LeaveRequest};

#[derive(Deserialize, ToSchema)]
pub struct LeaveRequestRef {
    #[schema(example = 1)]
    #[serde(alias = "leaveRequestId")]
    pub leave_request_id: u64,
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = 1)]
    #[serde(alias = "leaveRequestId")]
    pub leave_request_id: u64,
    /// Stored verbatim; a fixed default is used when absent.
    #[schema(example = "Team offsite that week")]
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct RemainingLeave {
    #[schema(example = 4)]
    pub employee_id: u64,
    #[schema(example = 10)]
    pub remaining_leave_days: u32,
}

/* =========================
Employee endpoints
========================= */
#[utoipa::path(
    post,
    path = "/api/leave-requests",
    request_body(content = SubmitLeave, description = "Dates are inclusive", content_type = "application/json"),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Past start, bad range, overlap or exceeded balance"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn submit_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<SubmitLeave>,
) -> actix_web::Result<HttpResponse> {
    let request = service.submit(auth.actor(), payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(request))
}

#[utoipa::path(
    delete,
    path = "/api/leave-requests",
    request_body = LeaveRequestRef,
    responses(
        (status = 200, description = "Leave request cancelled", body = CancelOutcome),
        (status = 400, description = "Already cancelled or rejected"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<LeaveRequestRef>,
) -> actix_web::Result<HttpResponse> {
    let outcome = service.cancel(auth.actor(), payload.leave_request_id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/leave-requests/status",
    responses(
        (status = 200, description = "Own leave requests by start date", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_status(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<HttpResponse> {
    let requests = service.my_requests(auth.actor()).await?;
    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    get,
    path = "/api/leave-requests/remaining",
    responses(
        (status = 200, description = "Own remaining leave days", body = RemainingLeave),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn remaining_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<HttpResponse> {
    let remaining_leave_days = service.remaining_balance(auth.actor()).await?;
    Ok(HttpResponse::Ok().json(RemainingLeave {
        employee_id: auth.employee_id,
        remaining_leave_days,
    }))
}

/* =========================
Manager endpoints
========================= */
#[utoipa::path(
    patch,
    path = "/api/leave-requests/approve",
    request_body = LeaveRequestRef,
    responses(
        (status = 200, description = "Leave approved and balance debited", body = ApprovalOutcome),
        (status = 400, description = "Not pending or insufficient balance"),
        (status = 403, description = "Not a manager of the owner, or not a manager/admin"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<LeaveRequestRef>,
) -> actix_web::Result<HttpResponse> {
    let outcome = service.approve(auth.actor(), payload.leave_request_id).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    patch,
    path = "/api/leave-requests/reject",
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 400, description = "Not pending"),
        (status = 403, description = "Not a manager of the owner, or not a manager/admin"),
        (status = 404, description = "Leave request not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<RejectLeave>,
) -> actix_web::Result<HttpResponse> {
    let RejectLeave {
        leave_request_id,
        reason,
    } = payload.into_inner();
    let request = service.reject(auth.actor(), leave_request_id, reason).await?;
    Ok(HttpResponse::Ok().json(request))
}

#[utoipa::path(
    get,
    path = "/api/leave-requests/pending",
    responses(
        (status = 200, description = "Pending requests of the managed team", body = [TeamRequest]),
        (status = 403, description = "Managers only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn pending_requests(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<HttpResponse> {
    let requests = service.pending_for_team(auth.actor()).await?;
    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    get,
    path = "/api/leave-requests/managed-users",
    responses(
        (status = 200, description = "Employees currently managed by the caller", body = [Employee]),
        (status = 403, description = "Managers only")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn managed_users(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<HttpResponse> {
    let employees = service.managed_employees(auth.actor()).await?;
    Ok(HttpResponse::Ok().json(employees))
}

#[utoipa::path(
    get,
    path = "/api/leave-requests/remaining/{employee_id}",
    params(("employee_id" = u64, Path, description = "Managed employee")),
    responses(
        (status = 200, description = "Remaining leave of a managed employee", body = EmployeeBalance),
        (status = 403, description = "Managers only, and only for their own team"),
        (status = 404, description = "Employee not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn employee_remaining(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> actix_web::Result<HttpResponse> {
    let balance = service
        .employee_balance(auth.actor(), path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(balance))
}

#[utoipa::path(
    get,
    path = "/api/leave-requests/reports/pending-summary",
    responses(
        (status = 200, description = "Pending counts per managed employee", body = [PendingCount]),
        (status = 403, description = "Managers only")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn pending_summary(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<HttpResponse> {
    let summary = service.pending_summary(auth.actor()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

#[utoipa::path(
    get,
    path = "/api/leave-requests/reports/upcoming-leaves",
    responses(
        (status = 200, description = "Approved team leave starting in the next 30 days", body = [UpcomingLeave]),
        (status = 403, description = "Managers only")
    ),
    security(("bearer_auth" = [])),
    tag = "Reports"
)]
pub async fn upcoming_leaves(
    auth: AuthUser,
    service: web::Data<LeaveService>,
) -> actix_web::Result<HttpResponse> {
    let upcoming = service.upcoming_team_leaves(auth.actor()).await?;
    Ok(HttpResponse::Ok().json(upcoming))
}
