//! Discount rejection reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a discount code cannot be applied.
///
/// Callers branch on [`RejectionReason::code`]; the message is for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    InvalidCode,
    NotYetActive,
    Expired,
    UsageLimitReached,
    AlreadyUsed,
    BelongsToAnotherUser,
}

impl RejectionReason {
    /// Machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::InvalidCode => "INVALID_CODE",
            RejectionReason::NotYetActive => "NOT_YET_ACTIVE",
            RejectionReason::Expired => "EXPIRED",
            RejectionReason::UsageLimitReached => "USAGE_LIMIT_REACHED",
            RejectionReason::AlreadyUsed => "ALREADY_USED",
            RejectionReason::BelongsToAnotherUser => "BELONGS_TO_ANOTHER_USER",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RejectionReason::InvalidCode => "invalid code",
            RejectionReason::NotYetActive => "not yet active",
            RejectionReason::Expired => "expired",
            RejectionReason::UsageLimitReached => "usage limit reached",
            RejectionReason::AlreadyUsed => "already used by you",
            RejectionReason::BelongsToAnotherUser => "belongs to another user",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_name_matches_code() {
        for reason in [
            RejectionReason::InvalidCode,
            RejectionReason::NotYetActive,
            RejectionReason::Expired,
            RejectionReason::UsageLimitReached,
            RejectionReason::AlreadyUsed,
            RejectionReason::BelongsToAnotherUser,
        ] {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.code()));
        }
    }

    #[test]
    fn messages_are_fixed() {
        assert_eq!(RejectionReason::InvalidCode.to_string(), "invalid code");
        assert_eq!(RejectionReason::BelongsToAnotherUser.message(), "belongs to another user");
    }
}
