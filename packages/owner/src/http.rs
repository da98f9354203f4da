//! HTTP client wrapper for calls to the registry and captcha services.
//!
//! Calls are single attempts. A timeout or connection failure surfaces as
//! `OwnerError::Http`, a non-success status as `OwnerError::UpstreamStatus`.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};

use crate::error::{OwnerError, Result};

/// User agent string identifying this service.
const USER_AGENT: &str = concat!("plotinfo-owner/", env!("CARGO_PKG_VERSION"));

/// Create a configured HTTP client.
///
/// # Arguments
/// * `timeout` - Total timeout applied to every request
///
/// # Returns
/// A `reqwest::blocking::Client` configured with timeout and user agent.
pub fn create_client(timeout: Duration) -> Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Send a prepared request and return the response body as text.
///
/// Non-success responses are logged with their body verbatim.
///
/// # Arguments
/// * `request` - Request to send
/// * `service` - Service name used in logs and errors
pub fn send_text(request: RequestBuilder, service: &'static str) -> Result<String> {
    let response = request.send().map_err(|e| {
        tracing::error!(service, error = %e, "upstream request failed");
        OwnerError::Http(e)
    })?;

    let status = response.status();
    let body = response.text()?;

    if !status.is_success() {
        tracing::error!(service, status = %status, "upstream error response:\n\n{body}");
        return Err(OwnerError::UpstreamStatus {
            service,
            status: status.as_u16(),
            body,
        });
    }

    Ok(body)
}
