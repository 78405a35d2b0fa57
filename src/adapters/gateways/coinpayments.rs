//! CoinPayments gateway.
//!
//! The checkout redirect is an unsigned `_pay_simple` button URL. IPN calls
//! carry an `HMAC` header holding HMAC-SHA512 of the raw body, keyed with
//! the IPN secret. The status API (`get_tx_info`) is signed the same way
//! with the private API key.
//!
//! IPN `status` codes: `>= 100` or `2` complete, `< 0` failed, anything
//! else still waiting.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::config::CoinPaymentsConfig;
use crate::domain::foundation::ProviderId;
use crate::domain::order::{Order, PaymentNotification, PaymentOutcome};
use crate::domain::signature::{DigestAlgorithm, SignatureScheme};
use crate::ports::{
    GatewayError, GatewayResponse, NotificationPayload, PaymentGateway, PaymentStatusCheck,
    RedirectRequest,
};

use super::fields;

const DEFAULT_BASE_URL: &str = "https://www.coinpayments.net/index.php";
const DEFAULT_API_URL: &str = "https://www.coinpayments.net/api.php";
const HMAC_HEADER: &str = "hmac";

/// Coarse reading of a CoinPayments status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TxState {
    Complete,
    Failed,
    Waiting,
}

impl TxState {
    fn from_code(code: i64) -> Self {
        if code >= 100 || code == 2 {
            TxState::Complete
        } else if code < 0 {
            TxState::Failed
        } else {
            TxState::Waiting
        }
    }
}

pub struct CoinPaymentsGateway {
    provider: ProviderId,
    merchant_id: String,
    ipn_secret: SecretString,
    public_key: String,
    private_key: SecretString,
    scheme: SignatureScheme,
    base_url: String,
    api_url: String,
    http_client: reqwest::Client,
}

impl CoinPaymentsGateway {
    pub fn new(
        merchant_id: impl Into<String>,
        ipn_secret: SecretString,
        public_key: impl Into<String>,
        private_key: SecretString,
    ) -> Self {
        Self {
            provider: ProviderId::from_static("coinpayments"),
            merchant_id: merchant_id.into(),
            ipn_secret,
            public_key: public_key.into(),
            private_key,
            scheme: SignatureScheme::new(DigestAlgorithm::HmacSha512, ""),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &CoinPaymentsConfig) -> Self {
        let mut gateway = Self::new(
            config.merchant_id.clone(),
            config.ipn_secret.clone(),
            config.public_key.clone(),
            config.private_key.clone(),
        );
        if let Some(url) = &config.base_url {
            gateway = gateway.with_base_url(url.clone());
        }
        if let Some(url) = &config.api_url {
            gateway = gateway.with_api_url(url.clone());
        }
        gateway
    }

    /// Set a custom checkout URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom API URL (for testing).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    fn status_code(form: &fields::Fields) -> Result<i64, GatewayError> {
        fields::required(form, "status")?
            .parse()
            .map_err(|_| GatewayError::malformed("status", "not an integer"))
    }

    async fn fetch_tx_info(&self, txn_id: &str, timeout: Duration) -> Result<TxInfo, String> {
        let body = serde_urlencoded::to_string([
            ("version", "1"),
            ("cmd", "get_tx_info"),
            ("key", self.public_key.as_str()),
            ("txid", txn_id),
            ("format", "json"),
        ])
        .map_err(|e| e.to_string())?;
        let hmac = self
            .scheme
            .sign_raw(body.as_bytes(), self.private_key.expose_secret())
            .map_err(|e| e.to_string())?;

        let response = self
            .http_client
            .post(&self.api_url)
            .header("HMAC", hmac)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let parsed: ApiResponse = response.json().await.map_err(|e| e.to_string())?;
        if parsed.error != "ok" {
            return Err(parsed.error);
        }
        parsed.result.ok_or_else(|| "missing result".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    error: String,
    result: Option<TxInfo>,
}

#[derive(Debug, Deserialize)]
struct TxInfo {
    status: i64,
    status_text: Option<String>,
}

#[async_trait]
impl PaymentGateway for CoinPaymentsGateway {
    fn provider(&self) -> &ProviderId {
        &self.provider
    }

    fn build_redirect(&self, request: &RedirectRequest) -> Result<String, GatewayError> {
        let mut params = vec![
            ("cmd", "_pay_simple".to_string()),
            ("reset", "1".to_string()),
            ("merchant", self.merchant_id.clone()),
            ("item_name", request.description.clone()),
            ("invoice", request.order_id.to_string()),
            ("currency", request.amount.currency().code().to_string()),
            ("amountf", request.amount.to_decimal_string()),
            ("want_shipping", "0".to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.fail_url.clone()),
        ];
        if let Some(email) = &request.customer_email {
            params.push(("email", email.clone()));
        }
        fields::url_with_params(&self.base_url, &params)
    }

    fn parse_notification(
        &self,
        payload: &NotificationPayload,
    ) -> Result<PaymentNotification, GatewayError> {
        let received = payload
            .header(HMAC_HEADER)
            .ok_or_else(|| GatewayError::MissingField("HMAC header".to_string()))?;
        let form = payload.form_fields()?;

        let signature_ok =
            self.scheme
                .verify_raw(&payload.body, self.ipn_secret.expose_secret(), received)?;
        let merchant_ok = form.get("merchant").map(String::as_str) == Some(self.merchant_id.as_str());
        if signature_ok && !merchant_ok {
            tracing::warn!("CoinPayments IPN signed correctly but for another merchant");
        }

        let currency = fields::currency(fields::required(&form, "currency1")?, "currency1")?;
        let amount = fields::amount(fields::required(&form, "amount1")?, currency, "amount1")?;
        let outcome = match TxState::from_code(Self::status_code(&form)?) {
            TxState::Complete => PaymentOutcome::Succeeded,
            TxState::Failed => PaymentOutcome::Failed {
                reason: form.get("status_text").cloned(),
            },
            TxState::Waiting => PaymentOutcome::Pending,
        };

        Ok(PaymentNotification {
            provider: self.provider.clone(),
            order_id: fields::order_id(&form, "invoice")?,
            amount,
            provider_payment_id: fields::required(&form, "txn_id")?.to_string(),
            outcome,
            is_verified: signature_ok && merchant_ok,
        })
    }

    /// `get_tx_info` reports coin amounts only, so a conclusive answer
    /// carries the order total.
    async fn check_status(&self, order: &Order, timeout: Duration) -> PaymentStatusCheck {
        let Some(txn_id) = order.payment_id.as_deref() else {
            return PaymentStatusCheck::unknown("no coinpayments transaction id recorded yet");
        };

        let info = match self.fetch_tx_info(txn_id, timeout).await {
            Ok(info) => info,
            Err(reason) => {
                tracing::warn!(order_id = %order.id, error = %reason, "CoinPayments status check failed");
                return PaymentStatusCheck::unknown(reason);
            }
        };

        match TxState::from_code(info.status) {
            TxState::Complete => PaymentStatusCheck::Paid {
                payment_id: txn_id.to_string(),
                amount: order.total.clone(),
            },
            TxState::Failed => PaymentStatusCheck::Failed {
                payment_id: txn_id.to_string(),
                amount: order.total.clone(),
                reason: info.status_text,
            },
            TxState::Waiting => PaymentStatusCheck::Pending,
        }
    }

    fn acknowledge(&self, _notification: &PaymentNotification) -> GatewayResponse {
        GatewayResponse::text(true, "IPN OK")
    }

    fn reject(&self, reason: &str) -> GatewayResponse {
        GatewayResponse::text(false, format!("IPN Error: {}", reason))
    }
}
