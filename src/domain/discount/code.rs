//! Discount code value object.
//!
//! Codes are matched case-insensitively, so they are stored and compared in
//! their normalized uppercase form.

use crate::domain::foundation::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_CODE_LEN: usize = 64;

/// A normalized discount code, e.g. `SUMMER20`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiscountCode(String);

impl DiscountCode {
    pub fn try_new(code: &str) -> Result<Self, ValidationError> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("discount_code"));
        }
        if trimmed.len() > MAX_CODE_LEN {
            return Err(ValidationError::out_of_range(
                "discount_code_length",
                1,
                MAX_CODE_LEN as i64,
                trimmed.len() as i64,
            ));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::invalid_format(
                "discount_code",
                "letters, digits, '-' and '_' only",
            ));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DiscountCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(&value)
    }
}

impl TryFrom<&str> for DiscountCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<DiscountCode> for String {
    fn from(code: DiscountCode) -> Self {
        code.0
    }
}

impl fmt::Display for DiscountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
