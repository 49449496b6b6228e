mod common;

use std::net::SocketAddr;

use actix_web::{App, http::StatusCode, test, web::Data};
use common::{world_with_hash, World};
use leave_tracker::auth::jwt::generate_access_token;
use leave_tracker::auth::password::hash_password;
use leave_tracker::config::Config;
use leave_tracker::leave::{Actor, ApprovalScope};
use leave_tracker::routes::{self, RateLimiters};
use leave_tracker::store::LeaveStore;
use serde_json::{Value, json};

const SECRET: &str = "test-secret";

fn config() -> Config {
    Config {
        database_url: "mysql://unused".into(),
        jwt_secret: SECRET.into(),
        server_addr: "127.0.0.1:0".into(),
        access_token_ttl: 3600,
        rate_login_per_min: 600,
        rate_protected_per_min: 6000,
        api_prefix: "/api".into(),
        default_leave_allotment: 25,
        approval_scope: ApprovalScope::Managed,
        log_dir: "logs".into(),
        log_level: "info".into(),
        seed_admin_email: None,
        seed_admin_password: None,
    }
}

fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

async fn token(w: &World, actor: Actor) -> String {
    let employee = w.store.employee(actor.employee_id).await.unwrap().unwrap();
    generate_access_token(&employee, SECRET, 3600).unwrap()
}

async fn setup() -> World {
    let hash = hash_password("password123").unwrap();
    world_with_hash(10, ApprovalScope::Managed, &hash).await
}

macro_rules! app {
    ($w:expr) => {{
        let config = config();
        let limiters = RateLimiters::from_config(&config).unwrap();
        test::init_service(
            App::new()
                .app_data(Data::from($w.service.clone()))
                .app_data(Data::new(config.clone()))
                .configure(|cfg| routes::configure(cfg, &config, &limiters)),
        )
        .await
    }};
}

#[actix_web::test]
async fn login_issues_a_usable_token() {
    let w = setup().await;
    let app = app!(w);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr(peer())
        .set_json(json!({"email": "Unit-Employee@example.com", "password": "password123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();
    assert_eq!(body["employee"]["id"], json!(w.employee.employee_id));

    let req = test::TestRequest::get()
        .uri("/api/leave-requests/remaining")
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {token}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["remaining_leave_days"], json!(10));
}

#[actix_web::test]
async fn wrong_password_is_unauthorized() {
    let w = setup().await;
    let app = app!(w);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .peer_addr(peer())
        .set_json(json!({"email": "unit-employee@example.com", "password": "nope"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}

#[actix_web::test]
async fn protected_routes_need_a_bearer_token() {
    let w = setup().await;
    let app = app!(w);

    let req = test::TestRequest::get()
        .uri("/api/leave-requests/status")
        .peer_addr(peer())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "UNAUTHENTICATED");
}

#[actix_web::test]
async fn submit_then_approve_over_http() {
    let w = setup().await;
    let app = app!(w);
    let employee = token(&w, w.employee).await;
    let manager = token(&w, w.manager).await;

    let req = test::TestRequest::post()
        .uri("/api/leave-requests")
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {employee}")))
        .set_json(json!({"start_date": "2025-06-10", "end_date": "2025-06-12"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["status"], "Pending");
    assert_eq!(created["leave_type"], "Annual Leave");
    let id = created["id"].as_u64().unwrap();

    let approve = || {
        test::TestRequest::patch()
            .uri("/api/leave-requests/approve")
            .peer_addr(peer())
            .insert_header(("Authorization", format!("Bearer {manager}")))
            .set_json(json!({"leave_request_id": id}))
            .to_request()
    };
    let resp = test::call_service(&app, approve()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["days_approved"], json!(3));
    assert_eq!(body["new_balance"], json!(7));

    let resp = test::call_service(&app, approve()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "NOT_PENDING");
    assert_eq!(body["error"], "Only pending requests can be approved");
}

#[actix_web::test]
async fn past_dates_are_a_bad_request() {
    let w = setup().await;
    let app = app!(w);
    let employee = token(&w, w.employee).await;

    let req = test::TestRequest::post()
        .uri("/api/leave-requests")
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {employee}")))
        .set_json(json!({"start_date": "2025-05-01", "end_date": "2025-05-03", "leave_type": "sick"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "START_IN_PAST");
}

#[actix_web::test]
async fn cancelling_someone_elses_request_is_forbidden() {
    let w = setup().await;
    let app = app!(w);
    let r = w
        .service
        .submit(w.employee, common::leave("2025-06-10", "2025-06-12"))
        .await
        .unwrap();
    let manager = token(&w, w.manager).await;

    let req = test::TestRequest::delete()
        .uri("/api/leave-requests")
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {manager}")))
        .set_json(json!({"leave_request_id": r.id}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "NOT_OWNER_OR_ADMIN");
}

#[actix_web::test]
async fn admin_endpoints_refuse_employees() {
    let w = setup().await;
    let app = app!(w);
    let employee = token(&w, w.employee).await;

    let req = test::TestRequest::get()
        .uri("/api/admin/all-users")
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {employee}")))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "ADMIN_ONLY");
}

#[actix_web::test]
async fn balance_update_validates_the_number() {
    let w = setup().await;
    let app = app!(w);
    let admin = token(&w, w.admin).await;
    let uri = format!("/api/admin/update-leave-balance/{}", w.employee.employee_id);

    for bad in [json!(-3), json!(2.5), json!("ten")] {
        let req = test::TestRequest::patch()
            .uri(&uri)
            .peer_addr(peer())
            .insert_header(("Authorization", format!("Bearer {admin}")))
            .set_json(json!({"balance": bad}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "INVALID_BALANCE");
    }

    let req = test::TestRequest::patch()
        .uri(&uri)
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {admin}")))
        .set_json(json!({"balance": 18}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(w.balance(w.employee).await, 18);
}

#[actix_web::test]
async fn admin_adds_staff_and_assigns_a_manager() {
    let w = setup().await;
    let app = app!(w);
    let admin = token(&w, w.admin).await;

    let req = test::TestRequest::post()
        .uri("/api/admin/add-user")
        .peer_addr(peer())
        .insert_header(("Authorization", format!("Bearer {admin}")))
        .set_json(json!({
            "firstname": "New",
            "surname": "Starter",
            "email": "new@example.com",
            "password": "password123",
            "department": "Sales"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["annual_leave_balance"], json!(25));
    assert_eq!(created["role"], "employee");
    let new_id = created["id"].as_u64().unwrap();

    let assign = |employee_id: u64| {
        test::TestRequest::post()
            .uri("/api/admin/assign-manager")
            .peer_addr(peer())
            .insert_header(("Authorization", format!("Bearer {admin}")))
            .set_json(json!({"employee_id": employee_id, "manager_id": w.manager.employee_id}))
            .to_request()
    };
    let resp = test::call_service(&app, assign(new_id)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(&app, assign(new_id)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "ALREADY_ASSIGNED");

    let team = w.service.managed_employees(w.manager).await.unwrap();
    assert_eq!(team.len(), 2);
}
