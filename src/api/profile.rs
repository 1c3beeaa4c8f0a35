use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::{ApiJson, ApiQuery};
use super::validation::{non_blank, validate_age};
use crate::db::{Profile, ProfileQuery, ProfileRequest};
use crate::AppState;

async fn fetch_profile(state: &AppState, email: &str) -> Result<Option<Profile>, ApiError> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE email = ?")
        .bind(email)
        .fetch_optional(&state.db)
        .await?;
    Ok(profile)
}

fn required_email(email: &Option<String>) -> Result<String, ApiError> {
    non_blank(email)
        .map(str::to_lowercase)
        .ok_or_else(|| ApiError::validation_field("email", "Email is required"))
}

/// Get a profile by email
///
/// GET /api/profile?email=
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ProfileQuery>,
) -> Result<Json<Profile>, ApiError> {
    let email = required_email(&query.email)?;
    let profile = fetch_profile(&state, &email)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    Ok(Json(profile))
}

/// Create the profile for an existing account
///
/// POST /api/profile
pub async fn create_profile(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ProfileRequest>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    let email = required_email(&req.email)?;
    let mut errors = ValidationErrorBuilder::new();
    errors.check("age", validate_age(req.fields.age));
    errors.finish()?;

    let user: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if user.is_none() {
        return Err(ApiError::not_found("Account not found"));
    }

    let fields = &req.fields;
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
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db)
    .await
    .map_err(|e| match ApiError::from(e) {
        err if err.status() == StatusCode::CONFLICT => {
            ApiError::conflict("Profile already exists")
        }
        err => err,
    })?;

    let profile = fetch_profile(&state, &email)
        .await?
        .ok_or_else(|| ApiError::internal("Profile was not stored"))?;

    tracing::info!(email = %email, "Profile created");
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Update profile fields; absent fields keep their stored value
///
/// PUT /api/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<ProfileRequest>,
) -> Result<Json<Profile>, ApiError> {
    let email = required_email(&req.email)?;
    let mut errors = ValidationErrorBuilder::new();
    errors.check("age", validate_age(req.fields.age));
    errors.finish()?;

    let fields = &req.fields;
    let result = sqlx::query(
        r#"
        UPDATE profiles SET
            name = COALESCE(?, name),
            age = COALESCE(?, age),
            sex = COALESCE(?, sex),
            address = COALESCE(?, address),
            contact_number = COALESCE(?, contact_number),
            updated_at = ?
        WHERE email = ?
        "#,
    )
    .bind(&fields.name)
    .bind(fields.age)
    .bind(&fields.sex)
    .bind(&fields.address)
    .bind(&fields.contact_number)
    .bind(chrono::Utc::now().to_rfc3339())
    .bind(&email)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Profile not found"));
    }

    let profile = fetch_profile(&state, &email)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    Ok(Json(profile))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{body_json, send, test_state};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    async fn register(state: &std::sync::Arc<crate::AppState>, email: &str) {
        let response = send(
            state,
            Method::POST,
            "/api/register",
            Some(json!({"email": email, "password": "long-password"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_profile_lifecycle() {
        let state = test_state().await;
        register(&state, "ana@example.com").await;

        let response = send(&state, Method::GET, "/api/profile?email=ana@example.com", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &state,
            Method::POST,
            "/api/profile",
            Some(json!({
                "email": "ana@example.com",
                "name": "Ana Cruz",
                "age": 28,
                "sex": "F",
                "address": "12 Mabini St",
                "contactnumber": "0917"
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(
            &state,
            Method::POST,
            "/api/profile",
            Some(json!({"email": "ana@example.com", "name": "Again"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = send(
            &state,
            Method::PUT,
            "/api/profile",
            Some(json!({"email": "ana@example.com", "address": "7 Rizal Ave"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["address"], "7 Rizal Ave");
        assert_eq!(body["name"], "Ana Cruz");
        assert_eq!(body["age"], 28);

        let response = send(&state, Method::GET, "/api/profile?email=ana@example.com", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["contactnumber"], "0917");
    }

    #[tokio::test]
    async fn test_profile_requires_existing_account() {
        let state = test_state().await;
        let response = send(
            &state,
            Method::POST,
            "/api/profile",
            Some(json!({"email": "ghost@example.com", "name": "Ghost"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            &state,
            Method::PUT,
            "/api/profile",
            Some(json!({"email": "ghost@example.com", "name": "Ghost"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_profile_requires_email() {
        let state = test_state().await;
        let response = send(&state, Method::GET, "/api/profile", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
