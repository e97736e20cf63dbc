//! Version-check protocol spoken with the release endpoint.
//!
//! One call is one HTTP round trip:
//!
//! ```text
//! GET <endpoint>?v=<protocol>&version=<local>
//! User-Agent: msh (<platform>) msh/<local>
//!
//! 200 OK
//! latest version: v2.5.0
//! ```
//!
//! Retries are the poller's business; a failed call is reported once.
use std::time::Duration;

use reqwest::blocking::Client;
use strum::Display;
use tracing::debug;

use crate::{
    constants::{UNSUPPORTED_PLATFORM, UPDATE_ERROR_VERSION, UPDATE_REQUEST_TIMEOUT},
    error::UpdateError,
    version::delta_version,
};

/// Outcome of one version check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum UpdateStatus {
    /// The check failed; nothing is known about the online release.
    Error,
    /// The running version is the latest official release.
    Updated,
    /// A newer official release exists.
    UpdateAvailable,
    /// The running version is ahead of every official release.
    UnofficialVersion,
}

impl UpdateStatus {
    /// Classifies `online - local` as returned by [`delta_version`].
    pub fn from_delta(delta: i128) -> Self {
        match delta {
            d if d > 0 => UpdateStatus::UpdateAvailable,
            d if d < 0 => UpdateStatus::UnofficialVersion,
            _ => UpdateStatus::Updated,
        }
    }
}

/// Classification together with the version the endpoint advertised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    pub status: UpdateStatus,
    pub online_version: String,
}

impl UpdateCheck {
    /// The result reported when a check fails.
    pub fn failed() -> Self {
        Self {
            status: UpdateStatus::Error,
            online_version: UPDATE_ERROR_VERSION.to_string(),
        }
    }
}

impl From<&Result<UpdateCheck, UpdateError>> for UpdateCheck {
    fn from(result: &Result<UpdateCheck, UpdateError>) -> Self {
        match result {
            Ok(check) => check.clone(),
            Err(_) => UpdateCheck::failed(),
        }
    }
}

/// Platform token advertised in the `User-Agent` header.
pub fn platform_label(os: &str) -> &'static str {
    match os {
        "windows" => "windows",
        "linux" => "linux",
        "macos" => "macintosh",
        _ => UNSUPPORTED_PLATFORM,
    }
}

/// `User-Agent` header value for a given platform and client version.
pub fn user_agent(platform: &str, client_version: &str) -> String {
    format!("msh ({platform}) msh/{client_version}")
}

/// Client for the release endpoint.
#[derive(Debug, Clone)]
pub struct UpdateClient {
    client: Client,
    endpoint: String,
}

impl UpdateClient {
    /// Builds a client with the standard request timeout.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, UpdateError> {
        Self::with_timeout(endpoint, UPDATE_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpdateError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(UpdateError::Client)?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Asks the endpoint for the latest release and classifies `client_version`
    /// against it.
    ///
    /// On error the caller should treat the outcome as [`UpdateCheck::failed`].
    pub fn check_update(
        &self,
        protocol_version: &str,
        client_version: &str,
        response_header: &str,
    ) -> Result<UpdateCheck, UpdateError> {
        let platform = platform_label(std::env::consts::OS);

        debug!(
            "Requesting latest version from {} (protocol {protocol_version})",
            self.endpoint
        );

        let body = self
            .client
            .get(&self.endpoint)
            .query(&[("v", protocol_version), ("version", client_version)])
            .header(
                reqwest::header::USER_AGENT,
                user_agent(platform, client_version),
            )
            .send()?
            .text()?;

        let online_version = body
            .strip_prefix(response_header)
            .map(str::trim)
            .ok_or_else(|| UpdateError::UnexpectedResponse { body: body.clone() })?
            .to_string();

        let delta = delta_version(&online_version, client_version)?;
        let status = UpdateStatus::from_delta(delta);
        debug!("Online version {online_version}, local {client_version}: {status}");

        Ok(UpdateCheck {
            status,
            online_version,
        })
    }
}
