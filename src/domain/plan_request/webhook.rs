//! Payment provider webhook verification.
//!
//! The provider signs `"<unix ts>.<raw body>"` with HMAC-SHA256 and sends
//! `X-Webhook-Signature: t=<ts>,v1=<hex>`. Events older than five minutes are
//! refused.

use axum::http::StatusCode;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::domain::foundation::{PlanRequestId, Timestamp};

const MAX_EVENT_AGE_SECS: i64 = 300;
const MAX_CLOCK_SKEW_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    #[error("Invalid timestamp")]
    InvalidTimestamp,

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Webhooks are not configured")]
    NotConfigured,
}

impl WebhookError {
    /// 4xx tells the provider not to retry; 5xx asks for a retry.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature | WebhookError::TimestampOutOfRange => {
                StatusCode::UNAUTHORIZED
            }
            WebhookError::InvalidTimestamp | WebhookError::ParseError(_) => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Events the core reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type")]
pub enum PaymentEvent {
    #[serde(rename = "payment.confirmed")]
    Confirmed { request_id: PlanRequestId },
    #[serde(rename = "payment.expired")]
    Expired { request_id: PlanRequestId },
}

impl PaymentEvent {
    pub fn request_id(&self) -> PlanRequestId {
        match self {
            PaymentEvent::Confirmed { request_id } | PaymentEvent::Expired { request_id } => {
                *request_id
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses `t=<ts>,v1=<hex>`. Unknown fields are ignored.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut v1_signature = None;

        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;
            match key {
                "t" => {
                    timestamp = Some(value.parse::<i64>().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        Ok(SignatureHeader {
            timestamp: timestamp
                .ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?,
            v1_signature: v1_signature
                .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?,
        })
    }
}

pub struct PaymentWebhookVerifier {
    secret: String,
}

impl PaymentWebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Checks the signature and freshness, then parses the event.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<PaymentEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;
        validate_timestamp(header.timestamp, Timestamp::now().as_unix_secs())?;

        let expected = sign(&self.secret, header.timestamp, payload)?;
        if expected.len() != header.v1_signature.len()
            || !bool::from(expected.ct_eq(&header.v1_signature))
        {
            return Err(WebhookError::InvalidSignature);
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::ParseError(e.to_string()))
    }
}

fn validate_timestamp(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    let age = now - timestamp;
    if age > MAX_EVENT_AGE_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }
    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::InvalidTimestamp);
    }
    Ok(())
}

fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> Result<Vec<u8>, WebhookError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Builds a valid signature header. Used by tests and local tooling.
pub fn signature_header_for(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    match sign(secret, timestamp, payload) {
        Ok(sig) => format!("t={},v1={}", timestamp, hex::encode(sig)),
        Err(_) => format!("t={},v1=", timestamp),
    }
}
