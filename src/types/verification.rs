//! Human verification outcome

use serde::{Deserialize, Serialize};

/// Reasons a verification can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationCode {
    MissingInputResponse,
    MissingInputSecret,
    LowScore,
    ActionMismatch,
    VerificationFailed,
}

impl VerificationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationCode::MissingInputResponse => "missing-input-response",
            VerificationCode::MissingInputSecret => "missing-input-secret",
            VerificationCode::LowScore => "low-score",
            VerificationCode::ActionMismatch => "action-mismatch",
            VerificationCode::VerificationFailed => "verification-failed",
        }
    }
}

/// Result of checking a verification token.
///
/// Returned verbatim as the `details` of a failed-verification API error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub error_codes: Vec<String>,
}

impl Verification {
    pub fn passed() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failed(code: VerificationCode) -> Self {
        Self {
            success: false,
            error_codes: vec![code.as_str().to_string()],
            ..Default::default()
        }
    }
}
