use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};
use lazy_static::lazy_static;
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::ApiJson;
use super::validation::{non_blank, validate_age, validate_email, validate_password};
use crate::db::{
    LoginRequest, LoginResponse, Profile, RegisterRequest, RegisterResponse, User, UserResponse,
    ROLE_CUSTOMER,
};
use crate::AppState;

lazy_static! {
    /// Verified against when the email is unknown so both failure paths cost one argon2 run
    static ref UNKNOWN_USER_HASH: Option<String> = hash_password("salonbook-unknown-user").ok();
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Login endpoint
///
/// POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (Some(email), Some(password)) = (
        non_blank(&request.email).map(str::to_lowercase),
        request.password.as_deref(),
    ) else {
        return Err(ApiError::bad_request("Email and password are required"));
    };

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let Some(user) = user else {
        if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
            verify_password(password, hash);
        }
        return Err(ApiError::unauthorized("Invalid credentials"));
    };

    if !verify_password(password, &user.password_hash) {
        tracing::info!(email = %email, "Failed login attempt");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let profile: Option<Profile> = sqlx::query_as("SELECT * FROM profiles WHERE email = ?")
        .bind(&user.email)
        .fetch_optional(&state.db)
        .await?;

    Ok(Json(LoginResponse {
        user: UserResponse::from(user),
        profile,
    }))
}

/// Registration endpoint - creates a customer account and, when profile fields are
/// supplied, the profile in the same transaction.
///
/// POST /api/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let email = non_blank(&request.email).map(str::to_lowercase);
    let password = request.password.as_deref().unwrap_or_default();

    let mut errors = ValidationErrorBuilder::new();
    match &email {
        Some(email) => {
            errors.check("email", validate_email(email));
        }
        None => {
            errors.add("email", "Email is required");
        }
    }
    errors.check("password", validate_password(password));
    errors.check("age", validate_age(request.profile.age));
    errors.finish()?;
    let email = email.unwrap_or_default();

    let password_hash = hash_password(password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to create account")
    })?;
    let now = chrono::Utc::now().to_rfc3339();

    let mut tx = state.db.begin().await?;

    let result = sqlx::query(
        "INSERT INTO users (email, password_hash, role, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(ROLE_CUSTOMER)
    .bind(&now)
    .execute(&mut *tx)
    .await
    .map_err(|e| match ApiError::from(e) {
        err if err.status() == StatusCode::CONFLICT => {
            ApiError::conflict("An account with this email already exists")
        }
        err => err,
    })?;

    if !request.profile.is_empty() {
        let fields = &request.profile;
        sqlx::query(
            r#"
            INSERT INTO profiles (email, name, age, sex, address, contact_number, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&email)
        .bind(&fields.name)
        .bind(fields.age)
        .bind(&fields.sex)
        .bind(&fields.address)
        .bind(&fields.contact_number)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(email = %email, "Registered new account");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserResponse {
                id: result.last_insert_rowid(),
                email,
                role: ROLE_CUSTOMER.to_string(),
            },
        }),
    ))
}
