//! The error taxonomy used for structured logging.
//!
//! No core operation returns `Result<_, CoreError>` to its caller: per the
//! propagation policy, the only outward signal of a problem is a log record
//! plus one of a clamp, a silent no-op, or (debug-only) an assertion abort.
//! `CoreError` exists purely so `tracing` call sites can attach a single
//! structured `%err` field consistently instead of ad hoc string messages.

use thiserror::Error;

/// One of the four kinds of thing that can go wrong inside the core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A programmer error: a caller violated a documented precondition.
    /// Fatal in debug builds (`debug_assert!`), logged and skipped in
    /// release.
    #[error("precondition violated: {0}")]
    PreconditionViolation(&'static str),

    /// The operation's target no longer exists (output destroyed, container
    /// unmapped between request and dispatch). Always a silent no-op.
    #[error("operation target no longer exists: {0}")]
    TransientIgnorable(&'static str),

    /// A numeric input was out of its legal range and got clamped.
    #[error("clamped out-of-range input: {0}")]
    ClampableInput(&'static str),

    /// A client requested an illegal state transition.
    #[error("client requested an illegal state: {0}")]
    ClientMisbehavior(&'static str),
}

/// Log a [`CoreError::PreconditionViolation`] and, in debug builds, abort.
///
/// Release builds log at `error!` and return so the caller's no-op path
/// runs; debug builds additionally assert, surfacing the bug immediately in
/// development instead of limping along with corrupted invariants.
pub fn report_precondition_violation(what: &'static str) {
    let err = CoreError::PreconditionViolation(what);
    error!(%err, "precondition violation");
    debug_assert!(false, "{err}");
}

/// Log a [`CoreError::TransientIgnorable`] at `warn!` and no-op.
pub fn report_transient(what: &'static str) {
    let err = CoreError::TransientIgnorable(what);
    warn!(%err, "ignoring operation on a vanished target");
}

/// Log a [`CoreError::ClampableInput`] at `trace!` (high frequency, not
/// worth warn-level noise per call) and no-op; the caller applies the clamp.
pub fn report_clamped(what: &'static str) {
    let err = CoreError::ClampableInput(what);
    trace!(%err, "clamped out-of-range input");
}

/// Log a [`CoreError::ClientMisbehavior`] at `warn!` and no-op.
pub fn report_client_misbehavior(what: &'static str) {
    let err = CoreError::ClientMisbehavior(what);
    warn!(%err, "ignoring illegal client request");
}
