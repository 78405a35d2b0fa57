//! Unitpay gateway.
//!
//! # Signatures
//!
//! - Payment form: `account{up}currency{up}desc{up}sum{up}secretKey`
//! - Handler call: `method{up}<params sorted by key>{up}secretKey`, with
//!   `signature` and the legacy `sign` left out
//!
//! Unitpay calls the handler with `method=check` before charging and
//! `pay` or `error` afterwards. Replies are JSON `result` or `error`
//! objects; an `error` makes Unitpay retry.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::UnitpayConfig;
use crate::domain::foundation::ProviderId;
use crate::domain::order::{Order, PaymentNotification, PaymentOutcome};
use crate::domain::signature::{DigestAlgorithm, SignatureField, SignatureScheme};
use crate::ports::{
    GatewayError, GatewayResponse, NotificationPayload, PaymentGateway, PaymentStatusCheck,
    RedirectRequest,
};

use super::fields::{self, Fields};

const DEFAULT_BASE_URL: &str = "https://unitpay.money/pay";
const DEFAULT_API_URL: &str = "https://unitpay.money/api";
const DELIMITER: &str = "{up}";

pub struct UnitpayGateway {
    provider: ProviderId,
    public_key: String,
    secret_key: SecretString,
    scheme: SignatureScheme,
    base_url: String,
    api_url: String,
    http_client: reqwest::Client,
}

impl UnitpayGateway {
    pub fn new(public_key: impl Into<String>, secret_key: SecretString) -> Self {
        Self {
            provider: ProviderId::from_static("unitpay"),
            public_key: public_key.into(),
            secret_key,
            scheme: SignatureScheme::new(DigestAlgorithm::Sha256, DELIMITER),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &UnitpayConfig) -> Self {
        let mut gateway = Self::new(config.public_key.clone(), config.secret_key.clone());
        if let Some(url) = &config.base_url {
            gateway = gateway.with_base_url(url.clone());
        }
        if let Some(url) = &config.api_url {
            gateway = gateway.with_api_url(url.clone());
        }
        gateway
    }

    /// Set a custom payment form URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a custom JSON API URL (for testing).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// `params[key]` entries, sorted by key, as signed by Unitpay.
    fn signed_params(form: &Fields) -> Vec<(&str, &str)> {
        let mut params: Vec<(&str, &str)> = form
            .iter()
            .filter_map(|(k, v)| {
                let key = k.strip_prefix("params[")?.strip_suffix(']')?;
                Some((key, v.as_str()))
            })
            .filter(|(k, _)| *k != "signature" && *k != "sign")
            .collect();
        params.sort_by(|a, b| a.0.cmp(b.0));
        params
    }

    fn outcome(method: &str, form: &Fields) -> Result<PaymentOutcome, GatewayError> {
        match method {
            "check" => Ok(PaymentOutcome::Pending),
            "pay" => Ok(PaymentOutcome::Succeeded),
            "error" => Ok(PaymentOutcome::Failed {
                reason: form.get("params[errorMessage]").cloned(),
            }),
            other => Err(GatewayError::malformed(
                "method",
                format!("unsupported handler method '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    result: Option<PaymentInfo>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentInfo {
    status: String,
    order_sum: String,
    order_currency: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[async_trait]
impl PaymentGateway for UnitpayGateway {
    fn provider(&self) -> &ProviderId {
        &self.provider
    }

    fn build_redirect(&self, request: &RedirectRequest) -> Result<String, GatewayError> {
        let account = request.order_id.to_string();
        let currency = request.amount.currency().code().to_string();
        let sum = request.amount.to_decimal_string();

        let signature = self.scheme.sign(
            &[
                SignatureField::required("account", Some(&account)),
                SignatureField::required("currency", Some(&currency)),
                SignatureField::present("desc", &request.description),
                SignatureField::required("sum", Some(&sum)),
            ],
            self.secret_key.expose_secret(),
        )?;

        let mut params = vec![
            ("sum", sum),
            ("account", account),
            ("desc", request.description.clone()),
            ("currency", currency),
            ("signature", signature),
            ("resultUrl", request.success_url.clone()),
            ("backUrl", request.fail_url.clone()),
        ];
        if let Some(email) = &request.customer_email {
            params.push(("customerEmail", email.clone()));
        }

        let base = format!("{}/{}", self.base_url.trim_end_matches('/'), self.public_key);
        fields::url_with_params(&base, &params)
    }

    fn parse_notification(
        &self,
        payload: &NotificationPayload,
    ) -> Result<PaymentNotification, GatewayError> {
        let form = payload.form_fields()?;
        let method = fields::required(&form, "method")?;
        let received = fields::required(&form, "params[signature]")?;
        let order_sum = fields::required(&form, "params[orderSum]")?;
        let order_currency = fields::required(&form, "params[orderCurrency]")?;
        let unitpay_id = fields::required(&form, "params[unitpayId]")?;

        let params = Self::signed_params(&form);
        let mut signed = Vec::with_capacity(params.len() + 1);
        signed.push(SignatureField::required("method", Some(method)));
        signed.extend(params.iter().map(|&(k, v)| SignatureField::present(k, v)));
        let is_verified = self
            .scheme
            .verify(&signed, self.secret_key.expose_secret(), received)?;

        let currency = fields::currency(order_currency, "params[orderCurrency]")?;
        Ok(PaymentNotification {
            provider: self.provider.clone(),
            order_id: fields::order_id(&form, "params[account]")?,
            amount: fields::amount(order_sum, currency, "params[orderSum]")?,
            provider_payment_id: unitpay_id.to_string(),
            outcome: Self::outcome(method, &form)?,
            is_verified,
        })
    }

    async fn check_status(&self, order: &Order, timeout: Duration) -> PaymentStatusCheck {
        let Some(payment_id) = order.payment_id.as_deref() else {
            return PaymentStatusCheck::unknown("no unitpay payment id recorded yet");
        };

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&[
                ("method", "getPayment"),
                ("params[paymentId]", payment_id),
                ("params[secretKey]", self.secret_key.expose_secret().as_str()),
            ])
            .timeout(timeout)
            .send()
            .await;

        let body: ApiResponse = match response {
            Ok(resp) => match resp.json().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(order_id = %order.id, error = %e, "Unitpay status response unreadable");
                    return PaymentStatusCheck::unknown(format!("unreadable response: {}", e));
                }
            },
            Err(e) => {
                tracing::warn!(order_id = %order.id, error = %e, "Unitpay status check failed");
                return PaymentStatusCheck::unknown(e.to_string());
            }
        };

        let info = match (body.result, body.error) {
            (Some(info), _) => info,
            (None, Some(error)) => return PaymentStatusCheck::unknown(error.message),
            (None, None) => return PaymentStatusCheck::unknown("empty response"),
        };

        let amount = match fields::currency(&info.order_currency, "orderCurrency")
            .and_then(|c| fields::amount(&info.order_sum, c, "orderSum"))
        {
            Ok(amount) => amount,
            Err(e) => return PaymentStatusCheck::unknown(e.to_string()),
        };

        match info.status.as_str() {
            "success" => PaymentStatusCheck::Paid {
                payment_id: payment_id.to_string(),
                amount,
            },
            "error" | "error_pay" | "error_check" => PaymentStatusCheck::Failed {
                payment_id: payment_id.to_string(),
                amount,
                reason: Some(info.status.clone()),
            },
            "wait" | "secure" => PaymentStatusCheck::Pending,
            other => PaymentStatusCheck::unknown(format!("unitpay status '{}'", other)),
        }
    }

    fn acknowledge(&self, _notification: &PaymentNotification) -> GatewayResponse {
        GatewayResponse::json(
            true,
            json!({ "result": { "message": "Request processed successfully" } }),
        )
    }

    fn reject(&self, reason: &str) -> GatewayResponse {
        GatewayResponse::json(false, json!({ "error": { "message": reason } }))
    }
}
