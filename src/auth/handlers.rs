use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

use crate::auth::{jwt::generate_access_token, password::verify_password};
use crate::config::Config;
use crate::leave::LeaveService;
use crate::model::Employee;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "unit-employee@example.com")]
    pub email: String,
    #[schema(example = "password123")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Seconds until the token expires.
    pub expires_in: usize,
    pub employee: Employee,
}

fn invalid_credentials() -> HttpResponse {
    HttpResponse::Unauthorized().json(json!({
        "error": "Invalid credentials",
        "code": "INVALID_CREDENTIALS",
    }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token issued", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip(service, config, user), fields(email = %user.email))]
pub async fn login(
    user: web::Json<LoginRequest>,
    service: web::Data<LeaveService>,
    config: web::Data<Config>,
) -> HttpResponse {
    info!("Login request received");

    let email = user.email.trim().to_lowercase();
    if email.is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().json(json!({
            "error": "Email and password are required",
            "code": "MISSING_FIELD",
        }));
    }

    let credentials = match service.store().credentials(&email).await {
        Ok(Some(c)) => c,
        Ok(None) => {
            info!("Invalid credentials: unknown email");
            return invalid_credentials();
        }
        Err(e) => {
            error!(error = %e, "Database error while fetching credentials");
            return HttpResponse::InternalServerError().finish();
        }
    };

    if let Err(e) = verify_password(&user.password, &credentials.password_hash) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return invalid_credentials();
    }
    debug!(employee_id = credentials.employee.id, "Password verified");

    let access_token = match generate_access_token(
        &credentials.employee,
        &config.jwt_secret,
        config.access_token_ttl,
    ) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "Failed to sign access token");
            return HttpResponse::InternalServerError().finish();
        }
    };

    info!(employee_id = credentials.employee.id, "Login successful");
    HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: config.access_token_ttl,
        employee: credentials.employee,
    })
}
