//! CLI-specific error formatting for user-facing messages.

use crate::config::CONFIG_PATH_ENV;
use crate::error::HubError;

/// Map a [`HubError`] to a user-facing help string with actionable guidance.
pub fn format_error_help(err: &HubError) -> String {
    match err {
        HubError::Configuration(msg) => {
            format!("Configuration error: {msg}. Pass --config <path> or set {CONFIG_PATH_ENV}")
        }
        HubError::Serialization(e) => {
            format!("Invalid JSON: {e}. Check the config document and any --args value")
        }
        HubError::InvalidArgument(msg) => {
            format!("{msg}. Run: ecommerce-mcp tools")
        }
        HubError::UnsupportedTransport(msg) => {
            format!("{msg}. Only http servers are dialled unless --allow-stdio is given")
        }
        HubError::Timeout(ms) => {
            format!("Timed out after {ms}ms. Raise --connect-timeout-ms or check the server")
        }
        other => format!("{other}"),
    }
}
