//! restc_errors component
//!
//! Error handling: `RestcError` enum, `RestcResult` type, and the reason
//! codes used to tag socket cancellation.
//!
//! This is the closed error taxonomy for the whole client: parsing,
//! protocol, pool, and transport failures all resolve to one of these
//! variants so callers can match on it exhaustively.
//!
//! # Examples
//!
//! ```
//! use restc_errors::{RestcError, RestcResult};
//!
//! fn parse_chunk_size(line: &str) -> RestcResult<u64> {
//!     u64::from_str_radix(line, 16)
//!         .map_err(|_| RestcError::Parse(format!("bad chunk size: {line}")))
//! }
//!
//! match parse_chunk_size("zz") {
//!     Ok(_) => unreachable!(),
//!     Err(RestcError::Parse(msg)) => assert!(msg.contains("zz")),
//!     Err(_) => unreachable!(),
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use std::time::Duration;
use thiserror::Error;

/// Why a socket was closed out from under a pending read or write.
///
/// Closing the socket is the only cancellation primitive in the engine
/// (spec §5); this is attached to the resulting IO error so the caller
/// can tell a timeout from a caller-initiated abort from a pool shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// A connect/send/reply deadline expired before the operation
    /// completed; see [`RestcError::IoTimeout`].
    TimeOut,
    /// The caller dropped the request/reply before it finished.
    CallerClosed,
    /// The connection pool was shut down while this connection was in use.
    PoolShutdown,
}

impl std::fmt::Display for CancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CancelReason::TimeOut => "TIME_OUT",
            CancelReason::CallerClosed => "CALLER_CLOSED",
            CancelReason::PoolShutdown => "POOL_SHUTDOWN",
        };
        f.write_str(s)
    }
}

/// The closed error taxonomy for the restc core.
///
/// Each variant matches one row of the table in spec.md §7. Transient IO
/// and connect failures are retried by the engine up to `max_attempts`;
/// everything else surfaces to the caller unchanged.
#[derive(Debug, Error)]
pub enum RestcError {
    /// Malformed URL, response line, header, chunk size, or JSON token.
    #[error("parse error: {0}")]
    Parse(String),

    /// CRLF missing, unsupported HTTP version, or a body length mismatch.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Redirect limit, memory budget, pool capacity, or an oversized header.
    #[error("constraint violated: {0}")]
    Constraint(String),

    /// Socket IO failure that doesn't map to a more specific kind.
    #[error("communication error: {0}")]
    Communication(String),

    /// Every resolved address was tried without a successful connect.
    #[error("failed to connect to {host}:{port}: {message}")]
    FailedToConnect {
        /// Host that could not be reached.
        host: String,
        /// Port that could not be reached.
        port: u16,
        /// Underlying failure description.
        message: String,
    },

    /// A connect/send/reply deadline elapsed and the socket was closed
    /// out from under the pending operation.
    #[error("io timeout after {0:?} ({1})")]
    IoTimeout(Duration, CancelReason),

    /// The deflate/gzip stream rejected the input.
    #[error("decompression error: {0}")]
    Decompress(String),

    /// A non-2xx response, surfaced when `throw_on_http_error` is true.
    #[error("http error: {status} {reason}")]
    Http {
        /// HTTP status code of the response that triggered this error.
        status: u16,
        /// Reason phrase taken from the response line.
        reason: String,
    },

    /// Strict JSON decoding encountered a field with no matching target.
    #[error("unknown JSON property: {0}")]
    UnknownProperty(String),

    /// A connection or pool was used after it was shut down.
    #[error("object expired: {0}")]
    ObjectExpired(String),

    /// TLS was requested in a build without TLS support.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Underlying socket IO failure, converted automatically.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RestcError {
    /// Build an [`RestcError::IoTimeout`] tagged with the elapsed
    /// duration and [`CancelReason::TimeOut`].
    pub fn timeout(after: Duration) -> Self {
        RestcError::IoTimeout(after, CancelReason::TimeOut)
    }

    /// Build an [`RestcError::Http`] from a status code and reason phrase.
    pub fn http(status: u16, reason: impl Into<String>) -> Self {
        RestcError::Http {
            status,
            reason: reason.into(),
        }
    }

    /// The HTTP status code, if this is an [`RestcError::Http`].
    pub fn status(&self) -> Option<u16> {
        match self {
            RestcError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True if this is an `Http` error carrying a 401 status.
    ///
    /// spec.md §7 calls for "specialized sub-kinds" of `HttpError` for a
    /// handful of statuses; rather than one enum variant per status (which
    /// would make every `match` on `RestcError` enumerate them), the
    /// status is carried as data and these helpers answer the same
    /// question. See DESIGN.md's Open Questions for the rationale.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// True if this is an `Http` error carrying a 403 status.
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// True if this is an `Http` error carrying a 404 status.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True if this is an `Http` error carrying a 405 status.
    pub fn is_method_not_allowed(&self) -> bool {
        self.status() == Some(405)
    }

    /// True if this is an `Http` error carrying a 406 status.
    pub fn is_not_acceptable(&self) -> bool {
        self.status() == Some(406)
    }

    /// True if this is an `Http` error carrying a 407 status.
    pub fn is_proxy_auth_required(&self) -> bool {
        self.status() == Some(407)
    }

    /// True if this is an `Http` error carrying a 408 status.
    pub fn is_request_timeout(&self) -> bool {
        self.status() == Some(408)
    }
}

/// Result type alias for restc operations.
pub type RestcResult<T> = Result<T, RestcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_status_helpers() {
        let e = RestcError::http(401, "Unauthorized");
        assert!(e.is_unauthorized());
        assert!(!e.is_forbidden());
        assert_eq!(e.status(), Some(401));
    }

    #[test]
    fn non_http_error_has_no_status() {
        let e = RestcError::Parse("bad url".into());
        assert_eq!(e.status(), None);
        assert!(!e.is_not_found());
    }

    #[test]
    fn cancel_reason_display() {
        assert_eq!(CancelReason::TimeOut.to_string(), "TIME_OUT");
        assert_eq!(CancelReason::PoolShutdown.to_string(), "POOL_SHUTDOWN");
    }
}
