//! Payment-link provider client.
//!
//! The salon never handles card data itself: checkout asks the provider for a hosted
//! payment link and hands the customer its URL. Requests are authenticated with the
//! server-held secret key using HTTP basic auth (key as user, empty password).

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::PaymentConfig;

/// Errors from the payment provider
#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("payment provider is not configured")]
    NotConfigured,

    #[error("payment provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("payment provider returned {status}: {body}")]
    Provider { status: u16, body: String },
}

/// A link to request from the provider
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRequest {
    /// Amount in minor currency units (centavos)
    pub amount: i64,
    pub description: String,
    pub remarks: Option<String>,
}

/// The provider's hosted payment link
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentLink {
    pub id: String,
    pub checkout_url: String,
    pub reference_number: Option<String>,
    pub status: Option<String>,
}

#[derive(Serialize)]
struct LinkEnvelope<'a> {
    data: LinkData<'a>,
}

#[derive(Serialize)]
struct LinkData<'a> {
    attributes: LinkAttributes<'a>,
}

#[derive(Serialize)]
struct LinkAttributes<'a> {
    amount: i64,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    remarks: Option<&'a str>,
}

#[derive(Deserialize)]
struct LinkResponse {
    data: LinkResponseData,
}

#[derive(Deserialize)]
struct LinkResponseData {
    id: String,
    attributes: LinkResponseAttributes,
}

#[derive(Deserialize)]
struct LinkResponseAttributes {
    checkout_url: String,
    reference_number: Option<String>,
    status: Option<String>,
}

/// Convert a major-unit amount (e.g. pesos) into minor units, rounding to the nearest unit.
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Client for the payment-link API
#[derive(Clone)]
pub struct PaymentClient {
    secret_key: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl PaymentClient {
    pub fn new(config: &PaymentConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("salonbook/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            secret_key: config.secret_key.clone().filter(|k| !k.is_empty()),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.secret_key.is_some()
    }

    /// Ask the provider for a hosted payment link.
    pub async fn create_link(&self, request: &LinkRequest) -> Result<PaymentLink, PaymentError> {
        let secret_key = self.secret_key.as_deref().ok_or(PaymentError::NotConfigured)?;

        let body = LinkEnvelope {
            data: LinkData {
                attributes: LinkAttributes {
                    amount: request.amount,
                    description: &request.description,
                    remarks: request.remarks.as_deref(),
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/links", self.api_base))
            .basic_auth(secret_key, Some(""))
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Provider { status, body });
        }

        let parsed: LinkResponse = response.json().await?;
        Ok(PaymentLink {
            id: parsed.data.id,
            checkout_url: parsed.data.attributes.checkout_url,
            reference_number: parsed.data.attributes.reference_number,
            status: parsed.data.attributes.status,
        })
    }
}
