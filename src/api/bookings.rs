//! Booking lifecycle endpoints: checkout creates a booking, admins list, move it
//! through its statuses and delete it.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::{ApiJson, ApiQuery};
use super::validation::{non_blank, parse_booking_date, parse_booking_time, validate_email};
use crate::db::{
    Booking, BookingResponse, BookingStatus, CreateBookingRequest, DeleteBookingQuery,
    DeletedResponse, ListBookingsQuery, NewBooking, UpdateBookingRequest, DATE_FORMAT,
    TIME_FORMAT,
};
use crate::AppState;

impl CreateBookingRequest {
    /// Check required fields and normalize the request into a storable booking.
    pub fn validate(self) -> Result<NewBooking, ApiError> {
        let email = non_blank(&self.email).map(str::to_lowercase);
        let date = non_blank(&self.date);
        let time = non_blank(&self.time);
        let services = self.services.as_ref().and_then(|s| s.joined());
        let staff_name = non_blank(&self.staff_name);
        let payment_method = non_blank(&self.payment_method);

        let mut missing = ValidationErrorBuilder::new();
        for (field, present) in [
            ("email", email.is_some()),
            ("date", date.is_some()),
            ("time", time.is_some()),
            ("services", services.is_some()),
            ("staffname", staff_name.is_some()),
            ("paymentmethod", payment_method.is_some()),
        ] {
            if !present {
                missing.add(field, format!("{} is required", field));
            }
        }
        missing.finish_with_message("Missing required fields")?;

        let (Some(email), Some(date), Some(time), Some(services), Some(staff_name), Some(payment_method)) =
            (email, date, time, services, staff_name, payment_method)
        else {
            return Err(ApiError::bad_request("Missing required fields"));
        };

        let mut invalid = ValidationErrorBuilder::new();
        invalid.check("email", validate_email(&email));
        let date = parse_booking_date(date).map_err(|e| invalid.add("date", e)).ok();
        let time = parse_booking_time(time).map_err(|e| invalid.add("time", e)).ok();
        invalid.finish()?;

        let (Some(date), Some(time)) = (date, time) else {
            return Err(ApiError::bad_request("Invalid date or time"));
        };

        Ok(NewBooking {
            email,
            date,
            time,
            services,
            staff_name: staff_name.to_string(),
            payment_method: payment_method.to_string(),
        })
    }
}

/// Create a booking from a checkout submission
///
/// POST /api/booking
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let booking = req.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO bookings (email, date, time, services, staff_name, payment_method, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&booking.email)
    .bind(booking.date.format(DATE_FORMAT).to_string())
    .bind(booking.time.format(TIME_FORMAT).to_string())
    .bind(&booking.services)
    .bind(&booking.staff_name)
    .bind(&booking.payment_method)
    .bind(BookingStatus::Pending.as_str())
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(&state.db)
    .await?;

    let id = result.last_insert_rowid();
    let stored = Booking::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::internal("Booking was not stored"))?;

    tracing::info!(
        booking_id = id,
        email = %booking.email,
        date = %booking.date,
        "Booking created"
    );

    Ok((StatusCode::CREATED, Json(BookingResponse::from(stored))))
}

/// List bookings, newest first, optionally for one customer
///
/// GET /api/booking
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ListBookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = match non_blank(&query.email) {
        Some(email) => {
            sqlx::query_as::<_, Booking>(
                "SELECT * FROM bookings WHERE email = ? ORDER BY created_at DESC, id DESC",
            )
            .bind(email.to_lowercase())
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as::<_, Booking>("SELECT * FROM bookings ORDER BY created_at DESC, id DESC")
                .fetch_all(&state.db)
                .await?
        }
    };

    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

/// Change a booking's status and/or payment method
///
/// PUT /api/booking
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let id = req
        .id
        .ok_or_else(|| ApiError::validation_field("id", "Booking id is required"))?;

    let status = match non_blank(&req.status) {
        Some(raw) => Some(
            raw.parse::<BookingStatus>()
                .map_err(|_| ApiError::bad_request("Invalid status"))?,
        ),
        None => None,
    };
    let payment_method = non_blank(&req.payment_method);

    if status.is_none() && payment_method.is_none() {
        return Err(ApiError::bad_request("Status or payment method is required"));
    }

    let result = sqlx::query(
        r#"
        UPDATE bookings SET
            status = COALESCE(?, status),
            payment_method = COALESCE(?, payment_method)
        WHERE id = ?
        "#,
    )
    .bind(status.map(|s| s.as_str()))
    .bind(payment_method)
    .bind(id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Booking not found"));
    }

    let booking = Booking::get_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    tracing::info!(booking_id = id, status = %booking.status, "Booking updated");
    Ok(Json(BookingResponse::from(booking)))
}

/// Delete one booking by id, or every past booking with `?past=true`
///
/// DELETE /api/booking
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<DeleteBookingQuery>,
) -> Result<Response, ApiError> {
    if query.past {
        let today = chrono::Local::now().date_naive();
        let deleted = Booking::delete_dated_before(&state.db, today).await?;
        tracing::info!(deleted, "Deleted past bookings");
        return Ok(Json(DeletedResponse { deleted }).into_response());
    }

    let id = query
        .id
        .ok_or_else(|| ApiError::bad_request("Booking id or past flag is required"))?;

    let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Booking not found"));
    }

    tracing::info!(booking_id = id, "Booking deleted");
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, send, test_state};
    use axum::http::Method;
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn example_booking() -> Value {
        json!({
            "email": "a@b.com",
            "date": "2024-01-01",
            "time": "10:00",
            "services": "Hair Trim",
            "staffname": "Jo",
            "paymentmethod": "cash"
        })
    }

    async fn booking_count(state: &AppState) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings")
            .fetch_one(&state.db)
            .await
            .unwrap();
        count
    }

    async fn insert_dated(state: &AppState, date: &str) -> i64 {
        sqlx::query(
            r#"INSERT INTO bookings (email, date, time, services, staff_name, payment_method, status, created_at)
               VALUES ('c@d.com', ?, '09:00', 'Manicure', 'Lea', 'gcash', 'Pending', ?)"#,
        )
        .bind(date)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&state.db)
        .await
        .unwrap()
        .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_create_then_list_formats_time() {
        let state = test_state().await;

        let response = send(&state, Method::POST, "/api/booking", Some(example_booking())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = body_json(response).await;
        assert_eq!(created["status"], "Pending");

        let response = send(&state, Method::GET, "/api/booking", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let list = body_json(response).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["email"], "a@b.com");
        assert_eq!(list[0]["time"], "10:00 AM");
        assert_eq!(list[0]["date"], "January 1, 2024");
        assert_eq!(list[0]["services"], "Hair Trim");
        assert_eq!(list[0]["staffname"], "Jo");
    }

    #[tokio::test]
    async fn test_create_missing_field_inserts_nothing() {
        let state = test_state().await;

        for field in ["email", "date", "time", "services", "staffname", "paymentmethod"] {
            let mut payload = example_booking();
            payload.as_object_mut().unwrap().remove(field);

            let response = send(&state, Method::POST, "/api/booking", Some(payload)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "missing {}", field);
            let body = body_json(response).await;
            assert_eq!(body["error"]["message"], "Missing required fields");
            assert!(body["error"]["details"][field].is_array());
        }

        assert_eq!(booking_count(&state).await, 0);
    }

    #[tokio::test]
    async fn test_create_joins_service_list_and_strips_time_of_day() {
        let state = test_state().await;
        let mut payload = example_booking();
        payload["services"] = json!(["Hair Trim", "Manicure"]);
        payload["date"] = json!("2024-03-15T08:00:00.000Z");
        payload["time"] = json!("2:30 PM");

        let response = send(&state, Method::POST, "/api/booking", Some(payload)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let stored: Booking = sqlx::query_as("SELECT * FROM bookings")
            .fetch_one(&state.db)
            .await
            .unwrap();
        assert_eq!(stored.services, "Hair Trim, Manicure");
        assert_eq!(stored.date, "2024-03-15");
        assert_eq!(stored.time, "14:30");
    }

    #[tokio::test]
    async fn test_create_rejects_bad_values() {
        let state = test_state().await;

        let mut payload = example_booking();
        payload["services"] = json!([]);
        let response = send(&state, Method::POST, "/api/booking", Some(payload)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let mut payload = example_booking();
        payload["date"] = json!("next tuesday");
        let response = send(&state, Method::POST, "/api/booking", Some(payload)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]["details"]["date"].is_array());

        let response = send(
            &state,
            Method::POST,
            "/api/booking",
            Some(json!("not an object")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        assert_eq!(booking_count(&state).await, 0);
    }

    #[tokio::test]
    async fn test_list_newest_first_and_filter_by_email() {
        let state = test_state().await;
        send(&state, Method::POST, "/api/booking", Some(example_booking())).await;
        let mut other = example_booking();
        other["email"] = json!("z@y.com");
        send(&state, Method::POST, "/api/booking", Some(other)).await;

        let list = body_json(send(&state, Method::GET, "/api/booking", None).await).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["email"], "z@y.com");

        let list = body_json(send(&state, Method::GET, "/api/booking?email=a@b.com", None).await).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["email"], "a@b.com");
    }

    #[tokio::test]
    async fn test_update_status() {
        let state = test_state().await;
        let created = body_json(send(&state, Method::POST, "/api/booking", Some(example_booking())).await).await;
        let id = created["id"].as_i64().unwrap();

        let response = send(
            &state,
            Method::PUT,
            "/api/booking",
            Some(json!({"id": id, "status": "Ongoing"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "Ongoing");

        let response = send(
            &state,
            Method::PUT,
            "/api/booking",
            Some(json!({"id": id, "paymentmethod": "gcash"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["paymentmethod"], "gcash");
        assert_eq!(body["status"], "Ongoing");
    }

    #[tokio::test]
    async fn test_update_rejects_unknown_status() {
        let state = test_state().await;
        let created = body_json(send(&state, Method::POST, "/api/booking", Some(example_booking())).await).await;
        let id = created["id"].as_i64().unwrap();

        for status in ["Cancelled", "pending", "DONE"] {
            let response = send(
                &state,
                Method::PUT,
                "/api/booking",
                Some(json!({"id": id, "status": status})),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let stored = Booking::get_by_id(&state.db, id).await.unwrap().unwrap();
        assert_eq!(stored.status, "Pending");
    }

    #[tokio::test]
    async fn test_update_unknown_booking_is_404() {
        let state = test_state().await;
        let response = send(
            &state,
            Method::PUT,
            "/api/booking",
            Some(json!({"id": 999, "status": "Completed"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let state = test_state().await;
        let created = body_json(send(&state, Method::POST, "/api/booking", Some(example_booking())).await).await;
        let id = created["id"].as_i64().unwrap();

        let response = send(&state, Method::DELETE, &format!("/api/booking?id={}", id), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&state, Method::DELETE, &format!("/api/booking?id={}", id), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&state, Method::DELETE, "/api/booking", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_past_keeps_today_and_future() {
        let state = test_state().await;
        let today = chrono::Local::now().date_naive();
        let fmt = |d: NaiveDate| d.format(DATE_FORMAT).to_string();

        insert_dated(&state, &fmt(today - chrono::Duration::days(1))).await;
        insert_dated(&state, &fmt(today - chrono::Duration::days(40))).await;
        insert_dated(&state, &fmt(today)).await;
        insert_dated(&state, &fmt(today + chrono::Duration::days(3))).await;

        let response = send(&state, Method::DELETE, "/api/booking?past=true", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["deleted"], 2);
        assert_eq!(booking_count(&state).await, 2);
    }

    #[tokio::test]
    async fn test_booking_method_gate() {
        let state = test_state().await;
        let response = send(&state, Method::PATCH, "/api/booking", None).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let allow = response.headers().get("allow").unwrap().to_str().unwrap();
        for method in ["GET", "POST", "PUT", "DELETE"] {
            assert!(allow.contains(method), "Allow header {} missing {}", allow, method);
        }
    }
}
