use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::{ApiJson, ApiQuery};
use super::validation::non_blank;
use crate::db::{CreateStaffRequest, Staff, StaffIdQuery, UpdateStaffRequest};
use crate::AppState;

async fn fetch_staff(state: &AppState, id: i64) -> Result<Option<Staff>, ApiError> {
    let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;
    Ok(staff)
}

/// List all staff members
///
/// GET /api/staff
pub async fn list_staff(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Staff>>, ApiError> {
    let staff = sqlx::query_as::<_, Staff>("SELECT * FROM staff ORDER BY id")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(staff))
}

/// Add a staff member
///
/// POST /api/staff
pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateStaffRequest>,
) -> Result<(StatusCode, Json<Staff>), ApiError> {
    let first_name = non_blank(&req.first_name);
    let last_name = non_blank(&req.last_name);
    let position = non_blank(&req.position);

    let mut missing = ValidationErrorBuilder::new();
    for (field, value) in [
        ("firstname", first_name),
        ("lastname", last_name),
        ("position", position),
    ] {
        if value.is_none() {
            missing.add(field, format!("{} is required", field));
        }
    }
    missing.finish_with_message("Missing required fields")?;

    let result = sqlx::query(
        "INSERT INTO staff (first_name, last_name, position, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(first_name)
    .bind(last_name)
    .bind(position)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    let id = result.last_insert_rowid();
    let staff = fetch_staff(&state, id)
        .await?
        .ok_or_else(|| ApiError::internal("Staff member was not stored"))?;

    tracing::info!(staff_id = id, "Staff member added");
    Ok((StatusCode::CREATED, Json(staff)))
}

/// Update a staff member; absent fields keep their stored value
///
/// PUT /api/staff
pub async fn update_staff(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<UpdateStaffRequest>,
) -> Result<Json<Staff>, ApiError> {
    let id = req
        .id
        .ok_or_else(|| ApiError::validation_field("id", "Staff id is required"))?;

    let result = sqlx::query(
        r#"
        UPDATE staff SET
            first_name = COALESCE(?, first_name),
            last_name = COALESCE(?, last_name),
            position = COALESCE(?, position)
        WHERE id = ?
        "#,
    )
    .bind(non_blank(&req.first_name))
    .bind(non_blank(&req.last_name))
    .bind(non_blank(&req.position))
    .bind(id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Staff member not found"));
    }

    let staff = fetch_staff(&state, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Staff member not found"))?;

    tracing::info!(staff_id = id, "Staff member updated");
    Ok(Json(staff))
}

/// Remove a staff member
///
/// DELETE /api/staff?id=
pub async fn delete_staff(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<StaffIdQuery>,
) -> Result<StatusCode, ApiError> {
    let id = query
        .id
        .ok_or_else(|| ApiError::validation_field("id", "Staff id is required"))?;

    let result = sqlx::query("DELETE FROM staff WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Staff member not found"));
    }

    tracing::info!(staff_id = id, "Staff member removed");
    Ok(StatusCode::NO_CONTENT)
}
