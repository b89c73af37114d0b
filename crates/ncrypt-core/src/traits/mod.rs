// SPDX-FileCopyrightText: 2026 ncrypt Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The client core never performs I/O directly; it reaches the server through
//! an [`ApiTransport`] implementation using `#[async_trait]` for dynamic dispatch.

pub mod transport;

pub use transport::{ApiRequest, ApiResponse, ApiTransport, Method, RequestBody};
