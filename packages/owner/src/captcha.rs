//! reCAPTCHA token verification.

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;

use crate::config::CaptchaConfig;
use crate::error::{OwnerError, Result};
use crate::http::send_text;

/// Service name used in logs and errors.
pub const CAPTCHA_SERVICE: &str = "reCAPTCHA";

/// Response of the `siteverify` endpoint.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
}

/// Verifies captcha response tokens against the configured endpoint.
#[derive(Debug, Clone)]
pub struct CaptchaVerifier {
    client: Client,
    config: CaptchaConfig,
}

impl CaptchaVerifier {
    pub fn new(client: Client, config: CaptchaConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Verify a captcha response token.
    ///
    /// Always succeeds without a request when no site key is configured.
    /// An unreachable endpoint, a non-success status, an unreadable answer
    /// or `success: false` yields `OwnerError::CaptchaRejected`.
    pub fn verify(&self, token: &str) -> Result<()> {
        if !self.is_enabled() {
            tracing::info!("RECAPTCHA_SITE_KEY is not set, skipping verification");
            return Ok(());
        }

        tracing::info!("verifying captcha response token");
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("secret", &self.config.secret_key)
            .append_pair("response", token)
            .finish();

        let request = self
            .client
            .post(&self.config.verify_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form);

        let body = match send_text(request, CAPTCHA_SERVICE) {
            Ok(body) => body,
            Err(OwnerError::UpstreamStatus { .. } | OwnerError::Http(_)) => {
                return Err(OwnerError::CaptchaRejected)
            }
            Err(e) => return Err(e),
        };

        let response: VerifyResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(error = %e, "unreadable captcha verification response");
            OwnerError::CaptchaRejected
        })?;

        if response.success {
            tracing::info!("captcha verified");
            Ok(())
        } else {
            tracing::warn!(error_codes = ?response.error_codes, "captcha verification failed");
            Err(OwnerError::CaptchaRejected)
        }
    }
}
