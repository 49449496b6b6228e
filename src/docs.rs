use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

use crate::api::admin::{AddUser, AssignManager, EndManagement, UpdateBalance, UpdateDepartment, UpdateRole};
use crate::api::leave_request::{LeaveRequestRef, RejectLeave, RemainingLeave};
use crate::auth::handlers::{LoginRequest, LoginResponse};
use crate::leave::reporting::{
    CompanySummary, EmployeeUsage, PendingCount, UpcomingLeave, UsageStatistics,
};
use crate::leave::{
    AdminRequestQuery, ApprovalOutcome, CancelOutcome, EmployeeBalance, SubmitLeave, TeamRequest,
};
use crate::model::{Employee, LeaveRequest, LeaveStatus, LeaveType, ManagementLink, Role};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Tracker API",
        version = "1.0.0",
        description = r#"
## Leave Tracker

Employees request annual or sick leave against a per-employee balance;
managers and admins approve or reject it.

### Key Features
- **Leave requests**: submit, cancel, and follow the status of your own requests
- **Approvals**: managers decide for their team, admins for everyone
- **Balances**: debited on approval, credited back when an approved request is cancelled
- **Reports**: usage per department and employee, pending counts, upcoming team leave

### Security
Every endpoint except `/auth/login` needs a **JWT Bearer** token.

### Errors
Failures return `{"error": "<message>", "code": "<STABLE_CODE>"}`.
"#,
    ),
    paths(
        crate::auth::handlers::login,

        crate::api::leave_request::submit_leave,
        crate::api::leave_request::cancel_leave,
        crate::api::leave_request::leave_status,
        crate::api::leave_request::remaining_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::pending_requests,
        crate::api::leave_request::managed_users,
        crate::api::leave_request::employee_remaining,
        crate::api::leave_request::pending_summary,
        crate::api::leave_request::upcoming_leaves,

        crate::api::admin::add_user,
        crate::api::admin::update_role,
        crate::api::admin::update_department,
        crate::api::admin::all_users,
        crate::api::admin::all_leave_requests,
        crate::api::admin::approve_as_admin,
        crate::api::admin::leave_usage_stats,
        crate::api::admin::update_leave_balance,
        crate::api::admin::assign_manager,
        crate::api::admin::end_management,
        crate::api::admin::company_summary,
        crate::api::admin::department_usage
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            Employee,
            Role,
            LeaveRequest,
            LeaveStatus,
            LeaveType,
            ManagementLink,
            SubmitLeave,
            LeaveRequestRef,
            RejectLeave,
            RemainingLeave,
            ApprovalOutcome,
            CancelOutcome,
            TeamRequest,
            EmployeeBalance,
            AdminRequestQuery,
            AddUser,
            UpdateRole,
            UpdateDepartment,
            UpdateBalance,
            AssignManager,
            EndManagement,
            UsageStatistics,
            EmployeeUsage,
            CompanySummary,
            PendingCount,
            UpcomingLeave
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login"),
        (name = "Leave", description = "Leave request lifecycle"),
        (name = "Admin", description = "Account and hierarchy administration"),
        (name = "Reports", description = "Read-only leave rollups"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
