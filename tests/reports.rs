mod common;

use common::{leave, world};
use leave_tracker::leave::ApprovalScope;

#[actix_web::test]
async fn admin_reports_sum_approved_days_only() {
    let w = world(20, ApprovalScope::Managed).await;
    let a = w
        .service
        .submit(w.employee, leave("2025-06-10", "2025-06-12"))
        .await
        .unwrap();
    let b = w
        .service
        .submit(w.employee, leave("2025-06-20", "2025-06-21"))
        .await
        .unwrap();
    w.service
        .submit(w.employee, leave("2025-06-25", "2025-06-26"))
        .await
        .unwrap();
    w.service.approve(w.manager, a.id).await.unwrap();
    w.service.approve(w.manager, b.id).await.unwrap();

    let stats = w.service.usage_statistics(w.admin).await.unwrap();
    assert_eq!(stats.total_approved_requests, 2);
    assert_eq!(stats.total_approved_days, 5);
    assert_eq!(stats.by_department.get("Test"), Some(&5));
    assert_eq!(stats.by_employee.len(), 1);

    w.service.cancel(w.employee, b.id).await.unwrap();
    let summary = w.service.company_summary(w.admin).await.unwrap();
    assert_eq!(summary.total_approved_days, 3);
    assert_eq!(summary.by_employee.get(&w.employee.employee_id), Some(&3));

    let departments = w.service.department_usage(w.admin).await.unwrap();
    assert_eq!(departments.get("Test"), Some(&3));

    let err = w.service.usage_statistics(w.manager).await.unwrap_err();
    assert_eq!(err.code(), "ADMIN_ONLY");
}

#[actix_web::test]
async fn team_reports_follow_the_hierarchy() {
    let w = world(20, ApprovalScope::Managed).await;
    let soon = w
        .service
        .submit(w.employee, leave("2025-06-10", "2025-06-12"))
        .await
        .unwrap();
    let later = w
        .service
        .submit(w.employee, leave("2025-08-10", "2025-08-12"))
        .await
        .unwrap();
    w.service
        .submit(w.employee, leave("2025-06-20", "2025-06-21"))
        .await
        .unwrap();
    w.service.approve(w.manager, soon.id).await.unwrap();
    w.service.approve(w.manager, later.id).await.unwrap();

    let outsider = w.outsider("outsider@example.com", 10).await;
    w.service
        .submit(outsider, leave("2025-06-10", "2025-06-12"))
        .await
        .unwrap();

    let pending = w.service.pending_summary(w.manager).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].employee_id, w.employee.employee_id);
    assert_eq!(pending[0].pending, 1);

    let upcoming = w.service.upcoming_team_leaves(w.manager).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].request.id, soon.id);

    let err = w.service.upcoming_team_leaves(w.admin).await.unwrap_err();
    assert_eq!(err.code(), "MANAGER_ONLY");
}
