//! Payment provider configuration
//!
//! Every provider section is optional. A provider without a section is not
//! registered, and orders naming it fail with a configuration error.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::signature::DigestAlgorithm;

/// Payment configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Upper bound on one status poll, in seconds
    #[serde(default = "default_status_check_timeout")]
    pub status_check_timeout_secs: u64,

    pub robokassa: Option<RobokassaConfig>,

    pub unitpay: Option<UnitpayConfig>,

    pub coinpayments: Option<CoinPaymentsConfig>,
}

/// Robokassa credentials
#[derive(Debug, Clone, Deserialize)]
pub struct RobokassaConfig {
    pub merchant_login: String,

    /// Signs outgoing redirects
    pub password1: SecretString,

    /// Verifies result notifications
    pub password2: SecretString,

    /// `sha256` or `sha512`, as set in the merchant panel
    #[serde(default = "default_robokassa_algorithm")]
    pub algorithm: String,

    #[serde(default)]
    pub is_test: bool,

    pub base_url: Option<String>,
}

/// Unitpay credentials
#[derive(Debug, Clone, Deserialize)]
pub struct UnitpayConfig {
    /// Public key from the project settings, part of the payment form path
    pub public_key: String,

    pub secret_key: SecretString,

    pub base_url: Option<String>,

    /// JSON API host used for status polling
    pub api_url: Option<String>,
}

/// CoinPayments credentials
#[derive(Debug, Clone, Deserialize)]
pub struct CoinPaymentsConfig {
    pub merchant_id: String,

    /// Signs IPN bodies
    pub ipn_secret: SecretString,

    /// API key pair for `get_tx_info`
    pub public_key: String,
    pub private_key: SecretString,

    pub base_url: Option<String>,

    pub api_url: Option<String>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            status_check_timeout_secs: default_status_check_timeout(),
            robokassa: None,
            unitpay: None,
            coinpayments: None,
        }
    }
}

impl PaymentConfig {
    /// Status poll timeout as Duration
    pub fn status_check_timeout(&self) -> Duration {
        Duration::from_secs(self.status_check_timeout_secs)
    }

    /// Names of configured providers, for startup logging
    pub fn enabled_providers(&self) -> Vec<&'static str> {
        let mut providers = Vec::new();
        if self.robokassa.is_some() {
            providers.push("robokassa");
        }
        if self.unitpay.is_some() {
            providers.push("unitpay");
        }
        if self.coinpayments.is_some() {
            providers.push("coinpayments");
        }
        providers
    }

    /// Validate payment configuration
    pub fn validate(&self, require_https: bool) -> Result<(), ValidationError> {
        if self.status_check_timeout_secs == 0 || self.status_check_timeout_secs > 120 {
            return Err(ValidationError::InvalidStatusCheckTimeout);
        }
        if let Some(robokassa) = &self.robokassa {
            robokassa.validate(require_https)?;
        }
        if let Some(unitpay) = &self.unitpay {
            unitpay.validate(require_https)?;
        }
        if let Some(coinpayments) = &self.coinpayments {
            coinpayments.validate(require_https)?;
        }
        Ok(())
    }
}

impl RobokassaConfig {
    /// Parsed digest algorithm
    pub fn digest_algorithm(&self) -> Result<DigestAlgorithm, ValidationError> {
        let algorithm: DigestAlgorithm =
            self.algorithm
                .parse()
                .map_err(|_| ValidationError::UnknownDigestAlgorithm {
                    provider: "robokassa",
                    algorithm: self.algorithm.clone(),
                })?;
        if algorithm.is_keyed() {
            return Err(ValidationError::UnknownDigestAlgorithm {
                provider: "robokassa",
                algorithm: self.algorithm.clone(),
            });
        }
        Ok(algorithm)
    }

    fn validate(&self, require_https: bool) -> Result<(), ValidationError> {
        require_non_empty(&self.merchant_login, "payment.robokassa.merchant_login")?;
        require_secret(&self.password1, "payment.robokassa.password1")?;
        require_secret(&self.password2, "payment.robokassa.password2")?;
        self.digest_algorithm()?;
        validate_url(self.base_url.as_deref(), "robokassa", require_https)
    }
}

impl UnitpayConfig {
    fn validate(&self, require_https: bool) -> Result<(), ValidationError> {
        require_non_empty(&self.public_key, "payment.unitpay.public_key")?;
        require_secret(&self.secret_key, "payment.unitpay.secret_key")?;
        validate_url(self.base_url.as_deref(), "unitpay", require_https)?;
        validate_url(self.api_url.as_deref(), "unitpay", require_https)
    }
}

impl CoinPaymentsConfig {
    fn validate(&self, require_https: bool) -> Result<(), ValidationError> {
        require_non_empty(&self.merchant_id, "payment.coinpayments.merchant_id")?;
        require_secret(&self.ipn_secret, "payment.coinpayments.ipn_secret")?;
        require_non_empty(&self.public_key, "payment.coinpayments.public_key")?;
        require_secret(&self.private_key, "payment.coinpayments.private_key")?;
        validate_url(self.base_url.as_deref(), "coinpayments", require_https)?;
        validate_url(self.api_url.as_deref(), "coinpayments", require_https)
    }
}

fn require_non_empty(value: &str, name: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingRequired(name));
    }
    Ok(())
}

fn require_secret(value: &SecretString, name: &'static str) -> Result<(), ValidationError> {
    require_non_empty(value.expose_secret(), name)
}

fn validate_url(
    url: Option<&str>,
    provider: &'static str,
    require_https: bool,
) -> Result<(), ValidationError> {
    let Some(url) = url else {
        return Ok(());
    };
    let parsed = reqwest::Url::parse(url).map_err(|_| ValidationError::InvalidBaseUrl(provider))?;
    if require_https && parsed.scheme() != "https" {
        return Err(ValidationError::BaseUrlMustBeHttps(provider));
    }
    Ok(())
}

fn default_status_check_timeout() -> u64 {
    10
}

fn default_robokassa_algorithm() -> String {
    "sha256".to_string()
}
