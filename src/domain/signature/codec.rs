//! Table-driven signing and constant-time verification.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256, Sha512};
use std::str::FromStr;
use subtle::ConstantTimeEq;

use super::errors::SignatureError;

/// Digest algorithms used by supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
    HmacSha256,
    HmacSha512,
}

impl DigestAlgorithm {
    /// Keyed algorithms use the secret as the HMAC key; plain digests
    /// take it as the last joined field instead.
    pub fn is_keyed(&self) -> bool {
        matches!(self, DigestAlgorithm::HmacSha256 | DigestAlgorithm::HmacSha512)
    }

    /// `key` is ignored by the plain digests.
    fn digest(&self, message: &[u8], key: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let bytes = match self {
            DigestAlgorithm::Sha256 => Sha256::digest(message).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(message).to_vec(),
            DigestAlgorithm::HmacSha256 => {
                let mut mac = Hmac::<Sha256>::new_from_slice(key)
                    .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
            DigestAlgorithm::HmacSha512 => {
                let mut mac = Hmac::<Sha512>::new_from_slice(key)
                    .map_err(|e| SignatureError::InvalidKey(e.to_string()))?;
                mac.update(message);
                mac.finalize().into_bytes().to_vec()
            }
        };
        Ok(bytes)
    }
}

impl FromStr for DigestAlgorithm {
    type Err = SignatureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            "hmac-sha256" => Ok(DigestAlgorithm::HmacSha256),
            "hmac-sha512" => Ok(DigestAlgorithm::HmacSha512),
            other => Err(SignatureError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Letter case of the hex token a provider sends and expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCase {
    Lower,
    Upper,
}

/// One named value contributing to a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureField<'a> {
    name: &'a str,
    value: Option<&'a str>,
    allow_empty: bool,
}

impl<'a> SignatureField<'a> {
    /// A field that must be present and non-empty.
    pub fn required(name: &'a str, value: Option<&'a str>) -> Self {
        Self {
            name,
            value,
            allow_empty: false,
        }
    }

    /// A field whose value may legitimately be empty.
    pub fn present(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            value: Some(value),
            allow_empty: true,
        }
    }

    fn value(&self) -> Result<&'a str, SignatureError> {
        match self.value {
            Some(v) if self.allow_empty || !v.is_empty() => Ok(v),
            _ => Err(SignatureError::MissingField(self.name.to_string())),
        }
    }
}

/// A provider's signature format: digest, delimiter and token case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureScheme {
    pub algorithm: DigestAlgorithm,
    pub delimiter: String,
    pub case: TokenCase,
}

impl SignatureScheme {
    pub fn new(algorithm: DigestAlgorithm, delimiter: impl Into<String>) -> Self {
        Self {
            algorithm,
            delimiter: delimiter.into(),
            case: TokenCase::Lower,
        }
    }

    pub fn with_case(mut self, case: TokenCase) -> Self {
        self.case = case;
        self
    }

    /// Joins the fields in the given order and returns the hex token.
    ///
    /// Fails fast on the first missing required field.
    pub fn sign(&self, fields: &[SignatureField<'_>], secret: &str) -> Result<String, SignatureError> {
        self.sign_with_trailing(fields, secret, &[])
    }

    /// Like [`SignatureScheme::sign`], with `trailing` joined after the
    /// secret. Keyed algorithms append them to the fields instead.
    pub fn sign_with_trailing(
        &self,
        fields: &[SignatureField<'_>],
        secret: &str,
        trailing: &[SignatureField<'_>],
    ) -> Result<String, SignatureError> {
        let mut parts = Vec::with_capacity(fields.len() + trailing.len() + 1);
        for field in fields {
            parts.push(field.value()?);
        }
        if !self.algorithm.is_keyed() {
            parts.push(secret);
        }
        for field in trailing {
            parts.push(field.value()?);
        }
        let message = parts.join(&self.delimiter);
        self.digest_hex(message.as_bytes(), secret)
    }

    /// Signs an opaque message, e.g. a raw notification body.
    ///
    /// Plain digests append the delimiter and secret to the message.
    pub fn sign_raw(&self, message: &[u8], secret: &str) -> Result<String, SignatureError> {
        if self.algorithm.is_keyed() {
            return self.digest_hex(message, secret);
        }
        let mut salted = message.to_vec();
        salted.extend_from_slice(self.delimiter.as_bytes());
        salted.extend_from_slice(secret.as_bytes());
        self.digest_hex(&salted, secret)
    }

    fn digest_hex(&self, message: &[u8], secret: &str) -> Result<String, SignatureError> {
        let bytes = self.algorithm.digest(message, secret.as_bytes())?;
        Ok(self.encode(&bytes))
    }

    /// Recomputes the token and compares it with `received` in constant time.
    ///
    /// Comparison ignores ASCII case so uppercase and lowercase hex both match.
    pub fn verify(
        &self,
        fields: &[SignatureField<'_>],
        secret: &str,
        received: &str,
    ) -> Result<bool, SignatureError> {
        self.verify_with_trailing(fields, secret, &[], received)
    }

    /// Verifying counterpart of [`SignatureScheme::sign_with_trailing`].
    pub fn verify_with_trailing(
        &self,
        fields: &[SignatureField<'_>],
        secret: &str,
        trailing: &[SignatureField<'_>],
        received: &str,
    ) -> Result<bool, SignatureError> {
        let expected = self.sign_with_trailing(fields, secret, trailing)?;
        Ok(constant_time_eq_ignore_case(&expected, received))
    }

    /// Raw-message counterpart of [`SignatureScheme::verify`].
    pub fn verify_raw(
        &self,
        message: &[u8],
        secret: &str,
        received: &str,
    ) -> Result<bool, SignatureError> {
        let expected = self.sign_raw(message, secret)?;
        Ok(constant_time_eq_ignore_case(&expected, received))
    }

    fn encode(&self, bytes: &[u8]) -> String {
        match self.case {
            TokenCase::Lower => hex::encode(bytes),
            TokenCase::Upper => hex::encode_upper(bytes),
        }
    }
}

fn constant_time_eq_ignore_case(expected: &str, received: &str) -> bool {
    let expected = expected.trim().to_ascii_lowercase();
    let received = received.trim().to_ascii_lowercase();
    if expected.len() != received.len() {
        return false;
    }
    expected.as_bytes().ct_eq(received.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "s3cr3t-password";

    fn all_schemes() -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::new(DigestAlgorithm::Sha256, ":").with_case(TokenCase::Upper),
            SignatureScheme::new(DigestAlgorithm::Sha512, ":"),
            SignatureScheme::new(DigestAlgorithm::Sha256, "{up}"),
            SignatureScheme::new(DigestAlgorithm::HmacSha256, "&"),
            SignatureScheme::new(DigestAlgorithm::HmacSha512, ""),
        ]
    }

    // ══════════════════════════════════════════════════════════════
    // Known vectors
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn trailing_fields_follow_the_secret() {
        let scheme = SignatureScheme::new(DigestAlgorithm::Sha256, ":");
        let token = scheme
            .sign_with_trailing(
                &[SignatureField::required("OutSum", Some("1.00"))],
                "pw",
                &[SignatureField::required("Shp_order", Some("Shp_order=abc"))],
            )
            .unwrap();
        assert_eq!(token, hex::encode(Sha256::digest(b"1.00:pw:Shp_order=abc")));
        assert!(scheme
            .verify_with_trailing(
                &[SignatureField::required("OutSum", Some("1.00"))],
                "pw",
                &[SignatureField::required("Shp_order", Some("Shp_order=abc"))],
                &token.to_uppercase(),
            )
            .unwrap());
    }

    #[test]
    fn plain_digest_appends_secret_as_last_field() {
        let scheme = SignatureScheme::new(DigestAlgorithm::Sha256, ":");
        let token = scheme
            .sign(
                &[
                    SignatureField::required("OutSum", Some("100.00")),
                    SignatureField::required("InvId", Some("42")),
                ],
                "pw",
            )
            .unwrap();

        assert_eq!(token, hex::encode(Sha256::digest(b"100.00:42:pw")));
    }

    #[test]
    fn keyed_digest_uses_secret_as_key_only() {
        let scheme = SignatureScheme::new(DigestAlgorithm::HmacSha512, ":");
        let token = scheme
            .sign(&[SignatureField::required("a", Some("1"))], "key")
            .unwrap();

        let mut mac = Hmac::<Sha512>::new_from_slice(b"key").unwrap();
        mac.update(b"1");
        assert_eq!(token, hex::encode(mac.finalize().into_bytes()));
    }

    #[test]
    fn uppercase_scheme_emits_uppercase_hex() {
        let scheme = SignatureScheme::new(DigestAlgorithm::Sha256, ":").with_case(TokenCase::Upper);
        let token = scheme
            .sign(&[SignatureField::required("x", Some("y"))], SECRET)
            .unwrap();
        assert_eq!(token, token.to_ascii_uppercase());
    }

    #[test]
    fn verify_accepts_either_case() {
        let scheme = SignatureScheme::new(DigestAlgorithm::Sha256, ":");
        let fields = [SignatureField::required("x", Some("y"))];
        let token = scheme.sign(&fields, SECRET).unwrap();

        assert!(scheme.verify(&fields, SECRET, &token.to_ascii_uppercase()).unwrap());
        assert!(scheme.verify(&fields, SECRET, &token).unwrap());
    }

    #[test]
    fn field_order_matters() {
        let scheme = SignatureScheme::new(DigestAlgorithm::Sha256, ":");
        let a = SignatureField::required("a", Some("1"));
        let b = SignatureField::required("b", Some("2"));

        let forward = scheme.sign(&[a, b], SECRET).unwrap();
        assert!(!scheme.verify(&[b, a], SECRET, &forward).unwrap());
    }

    #[test]
    fn raw_body_round_trip() {
        let scheme = SignatureScheme::new(DigestAlgorithm::HmacSha512, "");
        let body = b"amount1=10.00&invoice=abc&status=100";
        let token = scheme.sign_raw(body, SECRET).unwrap();

        assert!(scheme.verify_raw(body, SECRET, &token).unwrap());
        assert!(!scheme.verify_raw(b"amount1=99.00&invoice=abc&status=100", SECRET, &token).unwrap());
    }

    // ══════════════════════════════════════════════════════════════
    // Caller errors vs. verification failures
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn missing_required_field_is_distinct_error() {
        let scheme = SignatureScheme::new(DigestAlgorithm::Sha256, ":");
        let result = scheme.verify(
            &[
                SignatureField::required("OutSum", Some("1.00")),
                SignatureField::required("InvId", None),
            ],
            SECRET,
            "deadbeef",
        );
        assert_eq!(result, Err(SignatureError::MissingField("InvId".to_string())));
    }

    #[test]
    fn empty_required_field_counts_as_missing() {
        let scheme = SignatureScheme::new(DigestAlgorithm::Sha256, ":");
        let result = scheme.sign(&[SignatureField::required("InvId", Some(""))], SECRET);
        assert!(matches!(result, Err(SignatureError::MissingField(name)) if name == "InvId"));
    }

    #[test]
    fn present_field_may_be_empty() {
        let scheme = SignatureScheme::new(DigestAlgorithm::Sha256, "{up}");
        assert!(scheme
            .sign(&[SignatureField::present("params[errorMessage]", "")], SECRET)
            .is_ok());
    }

    #[test]
    fn wrong_length_token_is_false_not_error() {
        let scheme = SignatureScheme::new(DigestAlgorithm::Sha256, ":");
        let fields = [SignatureField::required("x", Some("y"))];
        assert_eq!(scheme.verify(&fields, SECRET, "abc"), Ok(false));
        assert_eq!(scheme.verify(&fields, SECRET, ""), Ok(false));
    }

    #[test]
    fn algorithm_names_parse_from_config() {
        assert_eq!("SHA256".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Sha256));
        assert_eq!("sha512".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::Sha512));
        assert_eq!("hmac_sha512".parse::<DigestAlgorithm>(), Ok(DigestAlgorithm::HmacSha512));
        assert!(matches!(
            "md5".parse::<DigestAlgorithm>(),
            Err(SignatureError::UnknownAlgorithm(_))
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Properties
    // ══════════════════════════════════════════════════════════════

    proptest! {
        #[test]
        fn sign_then_verify_round_trips(
            values in proptest::collection::vec("[a-zA-Z0-9.@ -]{1,24}", 1..6),
            secret in "[a-zA-Z0-9]{1,32}",
        ) {
            for scheme in all_schemes() {
                let fields: Vec<_> = values
                    .iter()
                    .map(|v| SignatureField::required("f", Some(v.as_str())))
                    .collect();
                let token = scheme.sign(&fields, &secret).unwrap();
                prop_assert!(scheme.verify(&fields, &secret, &token).unwrap());
            }
        }

        #[test]
        fn flipping_any_field_byte_breaks_verification(
            values in proptest::collection::vec("[a-z0-9]{1,16}", 1..5),
            field_pick in any::<prop::sample::Index>(),
            byte_pick in any::<prop::sample::Index>(),
        ) {
            for scheme in all_schemes() {
                let fields: Vec<_> = values
                    .iter()
                    .map(|v| SignatureField::required("f", Some(v.as_str())))
                    .collect();
                let token = scheme.sign(&fields, SECRET).unwrap();

                let mut tampered = values.clone();
                let target = field_pick.index(tampered.len());
                let mut bytes = tampered[target].clone().into_bytes();
                let at = byte_pick.index(bytes.len());
                bytes[at] = if bytes[at] == b'Z' { b'Y' } else { b'Z' };
                tampered[target] = String::from_utf8(bytes).unwrap();

                let tampered_fields: Vec<_> = tampered
                    .iter()
                    .map(|v| SignatureField::required("f", Some(v.as_str())))
                    .collect();
                prop_assert!(!scheme.verify(&tampered_fields, SECRET, &token).unwrap());
            }
        }
    }
}
