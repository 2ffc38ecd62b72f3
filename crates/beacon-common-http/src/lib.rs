// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Beacon.
//!
//! This crate provides:
//! - One [`HttpClientConfig`] for the application's primary HTTP client and
//!   the error-report transport, so both observe the same request timeout
//! - A client builder that applies that config's User-Agent header and timeout
//! - The busy-indicator boundary signalled around each request lifecycle

mod busy;
mod client;

pub use busy::{BusyGuard, BusyIndicator, NoopIndicator};
pub use client::{
	builder_with_config, new_client, user_agent, HttpClientConfig, DEFAULT_REQUEST_TIMEOUT,
};
