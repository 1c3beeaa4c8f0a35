use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::ApiJson;
use super::validation::{non_blank, validate_amount};
use crate::payment::{to_minor_units, LinkRequest, PaymentError, PaymentLink};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePaymentRequest {
    /// Amount in major currency units
    pub amount: Option<f64>,
    pub description: Option<String>,
    pub remarks: Option<String>,
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotConfigured => {
                ApiError::service_unavailable("Online payment is not available")
            }
            other => {
                tracing::error!(error = %other, "Payment provider error");
                ApiError::external_service("Payment provider request failed")
            }
        }
    }
}

/// Request a hosted payment link from the provider
///
/// POST /api/payment
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreatePaymentRequest>,
) -> Result<Json<PaymentLink>, ApiError> {
    let description = non_blank(&req.description);

    let mut errors = ValidationErrorBuilder::new();
    match req.amount {
        Some(amount) => {
            errors.check("amount", validate_amount(amount));
        }
        None => {
            errors.add("amount", "Amount is required");
        }
    }
    if description.is_none() {
        errors.add("description", "Description is required");
    }
    errors.finish()?;

    let request = LinkRequest {
        amount: to_minor_units(req.amount.unwrap_or_default()),
        description: description.unwrap_or_default().to_string(),
        remarks: non_blank(&req.remarks).map(str::to_string),
    };

    let link = state.payments.create_link(&request).await?;

    tracing::info!(link_id = %link.id, amount = request.amount, "Payment link created");
    Ok(Json(link))
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{body_json, send, test_state_with};
    use crate::config::Config;
    use axum::{
        http::{HeaderMap, Method, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    /// Serve a stand-in provider on an ephemeral port and return its base URL.
    async fn spawn_provider(status: StatusCode) -> String {
        let app = Router::new().route(
            "/v1/links",
            post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
                let authorized = headers
                    .get("authorization")
                    .and_then(|h| h.to_str().ok())
                    .map(|h| h.starts_with("Basic "))
                    .unwrap_or(false);
                if !authorized {
                    return (StatusCode::UNAUTHORIZED, Json(json!({"errors": []})));
                }
                let amount = body["data"]["attributes"]["amount"].clone();
                (
                    status,
                    Json(json!({
                        "data": {
                            "id": "link_abc123",
                            "attributes": {
                                "amount": amount,
                                "checkout_url": "https://pay.example/l/abc123",
                                "reference_number": "RX9",
                                "status": "unpaid"
                            }
                        }
                    })),
                )
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn config_for(api_base: String) -> Config {
        let mut config = Config::default();
        config.payment.secret_key = Some("sk_test_salon".to_string());
        config.payment.api_base = api_base;
        config
    }

    #[tokio::test]
    async fn test_payment_link_created() {
        let base = spawn_provider(StatusCode::OK).await;
        let state = test_state_with(config_for(base)).await;

        let response = send(
            &state,
            Method::POST,
            "/api/payment",
            Some(json!({"amount": 450.0, "description": "Hair Trim"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["id"], "link_abc123");
        assert_eq!(body["checkout_url"], "https://pay.example/l/abc123");
        assert_eq!(body["reference_number"], "RX9");
    }

    #[tokio::test]
    async fn test_provider_failure_is_bad_gateway() {
        let base = spawn_provider(StatusCode::INTERNAL_SERVER_ERROR).await;
        let state = test_state_with(config_for(base)).await;

        let response = send(
            &state,
            Method::POST,
            "/api/payment",
            Some(json!({"amount": 450.0, "description": "Hair Trim"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "Payment provider request failed");
    }

    #[tokio::test]
    async fn test_payment_without_key_is_unavailable() {
        let state = test_state_with(Config::default()).await;
        let response = send(
            &state,
            Method::POST,
            "/api/payment",
            Some(json!({"amount": 450.0, "description": "Hair Trim"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_payment_validation() {
        let state = test_state_with(Config::default()).await;
        let response = send(
            &state,
            Method::POST,
            "/api/payment",
            Some(json!({"amount": -5})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"]["details"]["amount"].is_array());
        assert!(body["error"]["details"]["description"].is_array());
    }
}
