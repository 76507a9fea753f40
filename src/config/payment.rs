//! Payment configuration

use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// HMAC secret for `/api/webhooks/payment`. Unset disables the endpoint.
    pub webhook_secret: Option<String>,

    /// Age after which unpaid plan requests are swept to abandoned
    #[serde(default = "default_abandon_after_hours")]
    pub abandon_after_hours: u32,

    /// Checkout URL prefix; requests get `?ref=<id>` appended
    pub payment_link_base: Option<String>,

    /// Period of the background abandonment sweep. 0 disables it.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl PaymentConfig {
    pub fn webhooks_enabled(&self) -> bool {
        self.webhook_secret
            .as_deref()
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.abandon_after_hours == 0 {
            return Err(ValidationError::InvalidAbandonWindow);
        }
        if let Some(base) = &self.payment_link_base {
            if !base.starts_with("https://") && !base.starts_with("http://") {
                return Err(ValidationError::InvalidPaymentLink);
            }
        }
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            webhook_secret: None,
            abandon_after_hours: default_abandon_after_hours(),
            payment_link_base: None,
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_abandon_after_hours() -> u32 {
    48
}

fn default_sweep_interval_secs() -> u64 {
    3600
}
