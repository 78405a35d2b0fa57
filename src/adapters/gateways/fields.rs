//! Helpers for pulling typed values out of provider field maps.

use std::collections::HashMap;

use crate::domain::foundation::{Currency, Money, OrderId};
use crate::ports::GatewayError;

pub(crate) type Fields = HashMap<String, String>;

/// A field that must be present and non-empty.
pub(crate) fn required<'a>(fields: &'a Fields, name: &str) -> Result<&'a str, GatewayError> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| GatewayError::MissingField(name.to_string()))
}

pub(crate) fn order_id(fields: &Fields, name: &str) -> Result<OrderId, GatewayError> {
    required(fields, name)?
        .parse()
        .map_err(|_| GatewayError::malformed(name, "not an order id"))
}

pub(crate) fn currency(code: &str, field: &str) -> Result<Currency, GatewayError> {
    Currency::new(code).map_err(|e| GatewayError::malformed(field, e.to_string()))
}

pub(crate) fn amount(value: &str, currency: Currency, field: &str) -> Result<Money, GatewayError> {
    Money::parse_decimal(value, currency).map_err(|e| GatewayError::malformed(field, e.to_string()))
}

pub(crate) fn url_with_params(base: &str, params: &[(&str, String)]) -> Result<String, GatewayError> {
    reqwest::Url::parse_with_params(base, params)
        .map(String::from)
        .map_err(|e| GatewayError::Configuration(format!("invalid base url '{}': {}", base, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn blank_required_field_is_missing() {
        let f = fields(&[("InvId", "  ")]);
        assert_eq!(
            required(&f, "InvId"),
            Err(GatewayError::MissingField("InvId".into()))
        );
        assert!(required(&f, "OutSum").is_err());
    }

    #[test]
    fn amount_accepts_trailing_zero_precision() {
        let usd = Currency::new("usd").unwrap();
        let money = amount("100.050000", usd, "OutSum").unwrap();
        assert_eq!(money.minor_units(), 10_005);
    }

    #[test]
    fn non_uuid_order_reference_is_malformed() {
        let f = fields(&[("invoice", "42")]);
        assert!(matches!(
            order_id(&f, "invoice"),
            Err(GatewayError::Malformed { .. })
        ));
    }

    #[test]
    fn url_params_are_encoded() {
        let url = url_with_params(
            "https://pay.example.test/form",
            &[("Description", "Order #1 & more".to_string())],
        )
        .unwrap();
        assert_eq!(
            url,
            "https://pay.example.test/form?Description=Order+%231+%26+more"
        );
    }
}
