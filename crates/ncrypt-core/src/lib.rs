// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the ncrypt secrets vault client.
//!
//! This crate provides the shared error type, the small set of domain types
//! every other crate speaks (ids, role levels, bearer tokens), and the
//! [`ApiTransport`] trait through which the client reaches the server.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::NcryptError;
pub use traits::{ApiRequest, ApiResponse, ApiTransport, Method, RequestBody};
pub use types::{AuthToken, MemberId, RoleLevel, SecretId};
