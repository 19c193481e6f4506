// Copyright 2025 PageSpeed Report Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error type shared by the core crate.

use thiserror::Error;

/// Errors raised by core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Caller supplied something unusable.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A required part of an API response was absent.
    #[error("Missing data: {0}")]
    MissingData(String),
}

impl Error {
    /// Create an [`Error::InvalidInput`].
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an [`Error::MissingData`].
    pub fn missing_data(msg: impl Into<String>) -> Self {
        Error::MissingData(msg.into())
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
