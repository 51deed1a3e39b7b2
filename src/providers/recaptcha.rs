//! reCAPTCHA v3 token verification.
//!
//! Posts `secret`/`response` form data to the siteverify endpoint and
//! applies the score threshold and action check locally.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use super::record_request;
use super::traits::HumanVerifier;
use crate::types::{Verification, VerificationCode};

/// Default siteverify endpoint.
pub const DEFAULT_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Default minimum score accepted.
pub const DEFAULT_MIN_SCORE: f64 = 0.5;

/// Action name bound to recommendation tokens.
pub const ACTION_RECOMMENDATIONS: &str = "getRecommendations";

/// Action name bound to food-details tokens.
pub const ACTION_FOOD_DETAILS: &str = "getFoodDetails";

const PROVIDER: &str = "recaptcha";

#[derive(Clone)]
pub struct RecaptchaVerifier {
    http: Client,
    verify_url: String,
    secret: Option<String>,
}

impl std::fmt::Debug for RecaptchaVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecaptchaVerifier")
            .field("verify_url", &self.verify_url)
            .field("has_secret", &self.secret.is_some())
            .finish()
    }
}

impl RecaptchaVerifier {
    pub fn new(http: Client, secret: Option<String>) -> Self {
        Self::with_verify_url(http, DEFAULT_VERIFY_URL, secret)
    }

    /// Create a verifier against a custom endpoint (for testing with wiremock).
    pub fn with_verify_url(http: Client, verify_url: &str, secret: Option<String>) -> Self {
        Self {
            http,
            verify_url: verify_url.to_string(),
            secret,
        }
    }

    async fn siteverify(&self, secret: &str, token: &str) -> reqwest::Result<SiteVerifyResponse> {
        self.http
            .post(&self.verify_url)
            .form(&[("secret", secret), ("response", token)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl HumanVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str, expected_action: &str, min_score: f64) -> Verification {
        if token.is_empty() {
            return Verification::failed(VerificationCode::MissingInputResponse);
        }
        let Some(secret) = self.secret.as_deref() else {
            error!("verification secret is not configured");
            return Verification::failed(VerificationCode::MissingInputSecret);
        };

        let started = Instant::now();
        let response = self
            .siteverify(secret, token)
            .await
            .map_err(crate::ForkcastError::from);
        record_request(PROVIDER, started, &response);
        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "verification request failed");
                return Verification::failed(VerificationCode::VerificationFailed);
            }
        };

        let mut verification = Verification {
            success: response.success,
            score: response.score,
            action: response.action,
            challenge_timestamp: response.challenge_ts,
            hostname: response.hostname,
            error_codes: response.error_codes,
        };

        if verification.success {
            if verification.score.is_some_and(|score| score < min_score) {
                verification.success = false;
                verification.error_codes = vec![VerificationCode::LowScore.as_str().to_string()];
            } else if verification.action.as_deref() != Some(expected_action) {
                verification.success = false;
                verification.error_codes =
                    vec![VerificationCode::ActionMismatch.as_str().to_string()];
            }
        }

        info!(
            action = expected_action,
            score = ?verification.score,
            success = verification.success,
            "verification checked"
        );
        verification
    }
}

#[derive(Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    score: Option<f64>,
    action: Option<String>,
    challenge_ts: Option<String>,
    hostname: Option<String>,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}
