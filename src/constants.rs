//! Constants and default values for the msh lifecycle core.
//!
//! Wire-level values of the update protocol and the default cadences of the
//! background threads live here so the poller, the protocol client and the
//! shutdown coordinator agree on them.

use std::time::Duration;

// ============================================================================
// Update protocol
// ============================================================================

/// Wire format version sent as the `v` query parameter.
pub const UPDATE_PROTOCOL_VERSION: &str = "1";

/// Prefix every successful response body starts with.
pub const UPDATE_RESPONSE_HEADER: &str = "latest version: ";

/// Remote endpoint queried for the latest official release.
pub const UPDATE_ENDPOINT: &str =
    "http://minecraft-server-hibernation.heliohost.us/latest-version.php";

/// Timeout applied to the whole version-check round trip.
pub const UPDATE_REQUEST_TIMEOUT: Duration = Duration::from_secs(4);

/// Online version reported when the check fails.
pub const UPDATE_ERROR_VERSION: &str = "error";

/// Platform token used when the running OS is not one of the recognised ones.
pub const UNSUPPORTED_PLATFORM: &str = "osNotSupported";

// ============================================================================
// Cadences
// ============================================================================

/// Period between two version checks.
pub const UPDATE_CHECK_INTERVAL: Duration = Duration::from_secs(4 * 60 * 60);

/// Period between two in-game update notifications.
pub const UPDATE_NOTIFY_INTERVAL: Duration = Duration::from_secs(20 * 60);

/// Time granted to the server to enter its stopping state during a forced shutdown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

// ============================================================================
// Version encoding
// ============================================================================

/// Place-value base used when folding a dotted version into one integer.
/// Every component must be strictly below this value.
pub const VERSION_COMPONENT_BASE: u64 = 1000;

// ============================================================================
// Server terminal
// ============================================================================

/// Console command sent to the server when it is asked to stop.
pub const DEFAULT_STOP_COMMAND: &str = "stop";

/// Console command used to broadcast a chat message to every player.
pub const SAY_COMMAND: &str = "say";

/// Default configuration file names probed in the working directory.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["msh.yaml", "msh-config.yaml"];
