//! Configuration constants, environment loading and EGRID validation.

use regex::Regex;
use std::net::SocketAddr;
use std::sync::LazyLock;
use std::time::Duration;

use crate::error::{OwnerError, Result};

/// Default timeout for upstream calls in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default prefix for GBDBS transaction ids.
pub const DEFAULT_TRANSACTION_PREFIX: &str = "SOMAP";

/// reCAPTCHA verification endpoint.
pub const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Default bind address of the HTTP server.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:5022";

/// EGRID pattern: CH followed by 12 digits.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static EGRID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^CH\d{12}$").expect("valid regex"));

/// Validate EGRID format.
///
/// The EGRID ends up inside the SOAP request body, so anything but the
/// expected shape is rejected before a request is built.
///
/// # Examples
/// ```
/// use plotinfo_owner::config::validate_egrid;
///
/// assert!(validate_egrid("CH207506973252").is_ok());
/// assert!(validate_egrid("CH2075<x/>").is_err());
/// ```
pub fn validate_egrid(egrid: &str) -> Result<()> {
    if EGRID_PATTERN.is_match(egrid) {
        Ok(())
    } else {
        Err(OwnerError::InvalidEgrid(egrid.to_string()))
    }
}

/// Captcha settings. Verification is enabled only when `site_key` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptchaConfig {
    pub site_key: String,
    pub secret_key: String,
    pub verify_url: String,
}

impl CaptchaConfig {
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.site_key.is_empty()
    }
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            site_key: String::new(),
            secret_key: String::new(),
            verify_url: RECAPTCHA_VERIFY_URL.to_string(),
        }
    }
}

/// Configuration for the plot owner service.
///
/// Built once at startup and handed to the service; nothing re-reads the
/// environment per request.
#[derive(Debug, Clone)]
pub struct OwnerConfig {
    pub gbdbs_service_url: String,
    pub timeout: Duration,
    pub transaction_prefix: String,
    pub hide_owner_addresses: bool,
    pub captcha: CaptchaConfig,
    pub listen_addr: SocketAddr,
}

impl OwnerConfig {
    pub fn from_env() -> Result<Self> {
        let gbdbs_service_url = std::env::var("GBDBS_SERVICE_URL")
            .map_err(|_| OwnerError::Config("GBDBS_SERVICE_URL not set".into()))?;

        let timeout_secs: u64 = std::env::var("GBDBS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let transaction_prefix = std::env::var("GBDBS_TRANSACTION_PREFIX")
            .unwrap_or_else(|_| DEFAULT_TRANSACTION_PREFIX.into());

        let hide_owner_addresses = std::env::var("HIDE_OWNER_ADDRESSES")
            .ok()
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let captcha = CaptchaConfig {
            site_key: std::env::var("RECAPTCHA_SITE_KEY").unwrap_or_default(),
            secret_key: std::env::var("RECAPTCHA_SECRET_KEY").unwrap_or_default(),
            verify_url: std::env::var("RECAPTCHA_VERIFY_URL")
                .unwrap_or_else(|_| RECAPTCHA_VERIFY_URL.into()),
        };

        let listen_addr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.into());
        let listen_addr = parse_listen_addr(&listen_addr)?;

        if captcha.is_enabled() {
            tracing::info!("captcha verification is enabled");
        } else {
            tracing::info!("RECAPTCHA_SITE_KEY is not set, captcha verification disabled");
        }

        Ok(Self {
            gbdbs_service_url,
            timeout: Duration::from_secs(timeout_secs),
            transaction_prefix,
            hide_owner_addresses,
            captcha,
            listen_addr,
        })
    }

    pub fn new(gbdbs_service_url: impl Into<String>) -> Self {
        Self {
            gbdbs_service_url: gbdbs_service_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            transaction_prefix: DEFAULT_TRANSACTION_PREFIX.to_string(),
            hide_owner_addresses: false,
            captcha: CaptchaConfig::default(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 5022)),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_hidden_addresses(mut self, hide: bool) -> Self {
        self.hide_owner_addresses = hide;
        self
    }

    pub fn with_captcha(mut self, captcha: CaptchaConfig) -> Self {
        self.captcha = captcha;
        self
    }

    pub fn with_listen_addr(mut self, listen_addr: SocketAddr) -> Self {
        self.listen_addr = listen_addr;
        self
    }
}

/// Parse a bind address like `127.0.0.1:5022`.
pub fn parse_listen_addr(value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|_| OwnerError::Config(format!("invalid listen address: {value}")))
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
