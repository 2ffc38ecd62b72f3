// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the core crate.

use thiserror::Error;

/// Errors raised while encoding, decoding or parsing core types.
#[derive(Debug, Error)]
pub enum CoreError {
	#[error("invalid error kind: {0}")]
	InvalidKind(String),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
