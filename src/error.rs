//! Error handling for msh.
use std::num::ParseIntError;

use thiserror::Error;

/// Errors raised while parsing or comparing dotted version strings.
#[derive(Debug, Error)]
pub enum VersionError {
    /// The version does not start with the `v` marker.
    #[error("version '{0}' does not start with 'v'")]
    MissingPrefix(String),

    /// A component between two dots is empty (e.g. `v1..2`).
    #[error("version '{0}' contains an empty component")]
    EmptyComponent(String),

    /// A component is not a non-negative integer.
    #[error("invalid component '{component}' in version '{version}': {source}")]
    InvalidComponent {
        /// The full version string.
        version: String,
        /// The component that failed to parse.
        component: String,
        /// The underlying parse failure.
        #[source]
        source: ParseIntError,
    },

    /// A component is too large to be folded into a single place value.
    #[error("component {component} of version '{version}' must be below {limit}")]
    ComponentOutOfRange {
        /// The full version string.
        version: String,
        /// The offending component value.
        component: u64,
        /// Exclusive upper bound for a component.
        limit: u64,
    },

    /// The version has more components than one encoded integer can hold.
    #[error("version '{version}' has more than {limit} components")]
    TooManyComponents {
        /// The full version string.
        version: String,
        /// Maximum number of components.
        limit: usize,
    },
}

/// Errors raised by the remote version check.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// The HTTP client could not be built.
    #[error("failed to build update client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed or its body could not be read.
    #[error("version request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The body did not start with the expected response header.
    #[error("unexpected response from version endpoint: {body:?}")]
    UnexpectedResponse {
        /// Raw response body, for diagnostics.
        body: String,
    },

    /// The online or local version could not be compared.
    #[error("failed to compare versions: {0}")]
    Version(#[from] VersionError),
}

/// Errors raised by the server controller.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The server process could not be spawned.
    #[error("failed to start server `{command}`: {source}")]
    Spawn {
        /// The command line that was executed.
        command: String,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// The server is not running, so there is nothing to stop or command.
    #[error("server is not running (status: {0})")]
    NotRunning(crate::server::ServerStatus),

    /// The server terminal is not accepting input.
    #[error("server terminal is not active")]
    TerminalInactive,

    /// Writing a command to the server terminal failed.
    #[error("failed to send `{command}` to server terminal: {source}")]
    Write {
        /// The command that could not be delivered.
        command: String,
        /// The underlying error that occurred.
        #[source]
        source: std::io::Error,
    },

    /// An internal lock was poisoned.
    #[error("Failed to acquire server lock")]
    LockPoisoned,
}

impl<T> From<std::sync::PoisonError<T>> for ServerError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        ServerError::LockPoisoned
    }
}

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error reading or accessing a configuration file.
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// Error parsing YAML configuration.
    #[error("Invalid YAML format: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A `${VAR}` reference names a variable that is not set.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A duration value could not be parsed.
    #[error("Invalid duration value: '{0}'")]
    InvalidDuration(String),

    /// No configuration file was given and none was found.
    #[error("No configuration file found (looked for {0})")]
    NotFound(String),
}

/// Errors raised by the shutdown listener.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {0}")]
    Install(#[source] std::io::Error),
}
