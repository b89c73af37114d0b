// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracing subscriber setup for binaries and tools embedding the client.

use ncrypt_core::NcryptError;
use tracing_subscriber::EnvFilter;

/// Default filter directive for `level`: ncrypt crates at `level`, others at warn.
pub fn default_directive(level: &str) -> String {
    format!("ncrypt={level},warn")
}

/// Install a global fmt subscriber. `RUST_LOG` overrides `level`.
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(level: &str) -> Result<(), NcryptError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init()
        .map_err(|e| NcryptError::Internal(format!("failed to install tracing subscriber: {e}")))
}
