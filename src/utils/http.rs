// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use reqwest::blocking::Client;
use reqwest::StatusCode;

use crate::errors::{EtlError, Result};

/// Fetch `url` and return the response body.
///
/// A 404 answer yields `Ok(None)` unless `fail_on_404` is set; every other non-success
/// status is an [`EtlError::Http`]. Basic authentication is used when `username` is given.
pub fn fetch(
    url: &str,
    fail_on_404: bool,
    verify_cert: bool,
    username: Option<&str>,
    password: &str,
) -> Result<Option<Vec<u8>>> {
    let client = Client::builder()
        .danger_accept_invalid_certs(!verify_cert)
        .build()
        .map_err(|e| EtlError::http(format!("Failed to create an HTTP client: {}", e)))?;

    let mut request = client.get(url);
    if let Some(username) = username {
        request = request.basic_auth(username, Some(password));
    }

    let response = request
        .send()
        .map_err(|e| EtlError::http(format!("Failed to fetch {}: {}", url, e)))?;

    match response.status() {
        StatusCode::NOT_FOUND if fail_on_404 => Err(EtlError::http(format!(
            "Failed to fetch {} (file not found)",
            url
        ))),
        StatusCode::NOT_FOUND => Ok(None),
        status if !status.is_success() => Err(EtlError::http(format!(
            "Failed to fetch {} (HTTP status {})",
            url, status
        ))),
        _ => {
            let body = response
                .bytes()
                .map_err(|e| EtlError::http(format!("Failed to read {}: {}", url, e)))?;
            Ok(Some(body.to_vec()))
        }
    }
}
