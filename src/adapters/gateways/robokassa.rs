//! Robokassa gateway.
//!
//! # Signatures
//!
//! - Redirect: `MerchantLogin:OutSum:InvId[:OutSumCurrency]:Password1:Shp_order=<id>`
//! - Result notification: `OutSum:InvId:Password2:Shp_order=<id>`, sent as
//!   uppercase hex
//!
//! `InvId` must be an integer, so orders are not sent as `InvId`. The
//! redirect passes `InvId=0`, Robokassa numbers the invoice itself, and the
//! order id travels in the `Shp_order` user parameter, which Robokassa signs
//! and echoes back. The assigned `InvId` is the provider payment id.
//!
//! Robokassa expects the body `OK{InvId}` on success and retries anything
//! else.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::config::RobokassaConfig;
use crate::domain::foundation::{Currency, ProviderId};
use crate::domain::order::{Order, PaymentNotification, PaymentOutcome};
use crate::domain::signature::{DigestAlgorithm, SignatureField, SignatureScheme, TokenCase};
use crate::ports::{
    GatewayError, GatewayResponse, NotificationPayload, PaymentGateway, PaymentStatusCheck,
    RedirectRequest,
};

use super::fields;

const DEFAULT_BASE_URL: &str = "https://auth.robokassa.ru/Merchant/Index.aspx";

/// `InvId` value asking Robokassa to assign the invoice number.
const AUTO_INV_ID: &str = "0";

/// User parameter carrying the order id.
const ORDER_PARAM: &str = "Shp_order";

/// Currency Robokassa settles in when `OutSumCurrency` is absent.
const SETTLEMENT_CURRENCY: &str = "RUB";

pub struct RobokassaGateway {
    provider: ProviderId,
    merchant_login: String,
    password1: SecretString,
    password2: SecretString,
    scheme: SignatureScheme,
    is_test: bool,
    base_url: String,
}

impl RobokassaGateway {
    pub fn new(
        merchant_login: impl Into<String>,
        password1: SecretString,
        password2: SecretString,
        algorithm: DigestAlgorithm,
    ) -> Self {
        Self {
            provider: ProviderId::from_static("robokassa"),
            merchant_login: merchant_login.into(),
            password1,
            password2,
            scheme: SignatureScheme::new(algorithm, ":").with_case(TokenCase::Upper),
            is_test: false,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Build from validated configuration.
    pub fn from_config(config: &RobokassaConfig) -> Result<Self, GatewayError> {
        let algorithm = config
            .digest_algorithm()
            .map_err(|e| GatewayError::Configuration(e.to_string()))?;
        let mut gateway = Self::new(
            config.merchant_login.clone(),
            config.password1.clone(),
            config.password2.clone(),
            algorithm,
        )
        .with_test_mode(config.is_test);
        if let Some(url) = &config.base_url {
            gateway = gateway.with_base_url(url.clone());
        }
        Ok(gateway)
    }

    pub fn with_test_mode(mut self, is_test: bool) -> Self {
        self.is_test = is_test;
        self
    }

    /// Set a custom payment form URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn settles_natively(currency: &Currency) -> bool {
        currency.code() == SETTLEMENT_CURRENCY
    }

    /// `Shp_order=<id>`, the form user parameters take inside a signature.
    fn order_param(order_id: &str) -> String {
        format!("{}={}", ORDER_PARAM, order_id)
    }
}

#[async_trait]
impl PaymentGateway for RobokassaGateway {
    fn provider(&self) -> &ProviderId {
        &self.provider
    }

    fn build_redirect(&self, request: &RedirectRequest) -> Result<String, GatewayError> {
        let out_sum = request.amount.to_decimal_string();
        let order_id = request.order_id.to_string();
        let order_param = Self::order_param(&order_id);
        let currency = request.amount.currency().code();

        let mut signed = vec![
            SignatureField::required("MerchantLogin", Some(&self.merchant_login)),
            SignatureField::required("OutSum", Some(&out_sum)),
            SignatureField::required("InvId", Some(AUTO_INV_ID)),
        ];
        if !Self::settles_natively(request.amount.currency()) {
            signed.push(SignatureField::required("OutSumCurrency", Some(currency)));
        }
        let signature = self.scheme.sign_with_trailing(
            &signed,
            self.password1.expose_secret(),
            &[SignatureField::required(ORDER_PARAM, Some(&order_param))],
        )?;

        let mut params = vec![
            ("MerchantLogin", self.merchant_login.clone()),
            ("OutSum", out_sum.clone()),
            ("InvId", AUTO_INV_ID.to_string()),
            (ORDER_PARAM, order_id),
            ("Description", request.description.clone()),
            ("SignatureValue", signature),
            ("SuccessURL", request.success_url.clone()),
            ("FailURL", request.fail_url.clone()),
        ];
        if !Self::settles_natively(request.amount.currency()) {
            params.push(("OutSumCurrency", currency.to_string()));
        }
        if let Some(email) = &request.customer_email {
            params.push(("Email", email.clone()));
        }
        if self.is_test {
            params.push(("IsTest", "1".to_string()));
        }

        fields::url_with_params(&self.base_url, &params)
    }

    fn parse_notification(
        &self,
        payload: &NotificationPayload,
    ) -> Result<PaymentNotification, GatewayError> {
        let form = payload.form_fields()?;
        let out_sum = fields::required(&form, "OutSum")?;
        let inv_id = fields::required(&form, "InvId")?;
        let order_id = fields::required(&form, ORDER_PARAM)?;
        let received = fields::required(&form, "SignatureValue")?;

        let currency = match form.get("OutSumCurrency").filter(|c| !c.trim().is_empty()) {
            Some(code) => fields::currency(code, "OutSumCurrency")?,
            None => fields::currency(SETTLEMENT_CURRENCY, "OutSumCurrency")?,
        };

        let order_param = Self::order_param(order_id);
        let is_verified = self.scheme.verify_with_trailing(
            &[
                SignatureField::required("OutSum", Some(out_sum)),
                SignatureField::required("InvId", Some(inv_id)),
            ],
            self.password2.expose_secret(),
            &[SignatureField::required(ORDER_PARAM, Some(&order_param))],
            received,
        )?;

        Ok(PaymentNotification {
            provider: self.provider.clone(),
            order_id: fields::order_id(&form, ORDER_PARAM)?,
            amount: fields::amount(out_sum, currency, "OutSum")?,
            provider_payment_id: inv_id.to_string(),
            outcome: PaymentOutcome::Succeeded,
            is_verified,
        })
    }

    async fn check_status(&self, order: &Order, _timeout: Duration) -> PaymentStatusCheck {
        tracing::debug!(order_id = %order.id, "Robokassa has no status polling; reporting unknown");
        PaymentStatusCheck::unknown("robokassa does not offer status polling")
    }

    fn acknowledge(&self, notification: &PaymentNotification) -> GatewayResponse {
        GatewayResponse::text(true, format!("OK{}", notification.provider_payment_id))
    }

    fn reject(&self, reason: &str) -> GatewayResponse {
        GatewayResponse::text(false, reason.to_string())
    }
}
