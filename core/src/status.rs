//! Reason to transport status mapping.
//!
//! Statuses are HTTP codes; RPC adapters translate them further if needed.

use crate::error::Reason;
use crate::result::ActionResult;

/// `200 OK`
pub const OK: u16 = 200;
/// `304 Not Modified`
pub const NOT_MODIFIED: u16 = 304;
/// `400 Bad Request`
pub const BAD_REQUEST: u16 = 400;
/// `401 Unauthorized`
pub const UNAUTHORIZED: u16 = 401;
/// `403 Forbidden`
pub const FORBIDDEN: u16 = 403;
/// `404 Not Found`
pub const NOT_FOUND: u16 = 404;
/// `429 Too Many Requests`
pub const TOO_MANY_REQUESTS: u16 = 429;
/// `500 Internal Server Error`
pub const INTERNAL_SERVER_ERROR: u16 = 500;
/// `503 Service Unavailable`
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// Status for a classified reason; `None` means success.
///
/// # Examples
///
/// ```
/// use pipeline_core::{Reason, status};
///
/// assert_eq!(status::status_for(Some(&Reason::Validation)), 400);
/// assert_eq!(status::status_for(None), 200);
/// ```
#[must_use]
pub const fn status_for(reason: Option<&Reason>) -> u16 {
    let Some(reason) = reason else {
        return OK;
    };
    match reason {
        Reason::TooManyRequests => TOO_MANY_REQUESTS,
        Reason::AccessDenied
        | Reason::ProfileDenied
        | Reason::ProfileDeniedByIp
        | Reason::UpdateRequired
        | Reason::InactiveUser => FORBIDDEN,
        Reason::AuthorizationRequired => UNAUTHORIZED,
        Reason::ServerRespondedWithError => OK,
        Reason::Validation => BAD_REQUEST,
        Reason::ServerUnavailable => SERVICE_UNAVAILABLE,
        Reason::NotFound => NOT_FOUND,
        _ => INTERNAL_SERVER_ERROR,
    }
}

/// Status for a runner result. An explicit override always wins.
#[must_use]
pub fn response_status(result: &ActionResult, override_status: Option<u16>) -> u16 {
    match override_status {
        Some(status) if status > 0 => status,
        _ => status_for(result.reason()),
    }
}
