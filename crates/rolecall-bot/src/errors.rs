//! Discord-specific error handling for the bot.
//!
//! Converts serenity errors into the crate's `RoleError` so the core
//! state machine can react to permission refusals and missing entities
//! without knowing about HTTP, and provides a `log_error` helper that
//! picks the log level from the error class.

use rolecall_core::RoleError;
use serenity::http::HttpError;
use tracing::{error, warn};

/// Map a serenity `Error` onto `RoleError`.
///
/// Discord JSON error codes take precedence over the HTTP status:
/// 50001 (missing access) and 50013 (missing permissions) are
/// permission refusals; the 10xxx "unknown entity" family means the
/// target no longer exists. Anything else is an opaque platform error.
pub fn map_discord_error(err: serenity::Error) -> RoleError {
    match &err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) => classify_raw(
            resp.status_code.as_u16(),
            resp.error.code as u32,
            &resp.error.message,
        ),
        _ => RoleError::Platform(err.to_string()),
    }
}

fn classify_raw(http_status: u16, raw_code: u32, message: &str) -> RoleError {
    match raw_code {
        // Missing Access / Missing Permissions
        50001 | 50013 => RoleError::PermissionDenied,
        // Unknown channel / guild / member / message / emoji / role
        10003 | 10004 | 10007 | 10008 | 10014 | 10011 => {
            RoleError::NotFound(message.to_string())
        }
        _ if http_status == 403 => RoleError::PermissionDenied,
        _ if http_status == 404 => RoleError::NotFound(message.to_string()),
        _ => RoleError::Platform(format!(
            "HTTP {} / code {}: {}",
            http_status, raw_code, message
        )),
    }
}

/// Log a `RoleError` at the appropriate level.
///
/// - Persistence and serialization failures → `error!` (state is at risk)
/// - Everything platform-side → `warn!` (the gateway keeps running)
pub fn log_error(context: &str, err: &RoleError) {
    match err {
        RoleError::Persistence(_) | RoleError::Serde(_) => {
            error!("{}: {}", context, err);
        }
        _ => {
            warn!("{}: {}", context, err);
        }
    }
}
