// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for ncrypt integration tests.
//!
//! Provides a scripted transport and wire fixtures for fast, deterministic
//! tests without a running vault server.
//!
//! # Components
//!
//! - [`MockTransport`] - Scripted `ApiTransport` that records every request
//! - [`fixtures`] - Cheap master keys and secret resources in wire form

pub mod fixtures;
pub mod mock_transport;

pub use fixtures::{
    TEST_KDF_ITERATIONS, corrupted_secret_json, secret_json, test_bundle, test_kdf_params,
};
pub use mock_transport::{MockReply, MockTransport};
