//! `tracing-subscriber` initializer (§4.9).
//!
//! `loomwm-core` never constructs its own subscriber implicitly: every
//! module logs through the global `tracing` macros imported crate-wide in
//! `lib.rs`, and it is up to the process embedding this crate (a host
//! binary, or a test) to install one. This mirrors the teacher's `main.rs`,
//! which builds its `EnvFilter` the same way before calling
//! `tracing_subscriber::fmt().init()`.

use std::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Install a compact `fmt` subscriber honoring `RUST_LOG`, falling back to
/// `error,loomwm_core=info` when unset or unparsable — fatal-only noise
/// from dependencies, informational logging from this crate.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::from_str("error,loomwm_core=info").unwrap());

    let _ = tracing_subscriber::fmt().compact().with_env_filter(filter).try_init();
}

/// Like [`init`], but at `trace` level for this crate; used by tests that
/// want to see every log site fire.
pub fn init_for_tests() {
    let filter = EnvFilter::from_str("error,loomwm_core=trace").unwrap();
    let _ = tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
