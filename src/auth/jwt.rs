use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::Employee;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub employee_id: u64,
    /// Login email.
    pub sub: String,
    pub role: u8, // role id
    pub exp: usize,
    pub jti: String,
}

fn now() -> usize {
    usize::try_from(Utc::now().timestamp()).unwrap_or_default()
}

pub fn generate_access_token(employee: &Employee, secret: &str, ttl: usize) -> Result<String, Error> {
    let claims = Claims {
        employee_id: employee.id,
        sub: employee.email.clone(),
        role: employee.role.id(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}
