// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The error taxonomy of the resource cache.
//!
//! None of these errors is fatal to the cache: every failed attempt can be
//! retried by the caller, who alone decides whether a missing resource is
//! fatal to its own operation.

use thiserror::Error;

/// Errors produced while turning a resource name into bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No search directory or package contains the name.
    #[error("resource '{0}' not found")]
    NotFound(String),
    /// The name was rejected by sanitization.
    #[error("invalid resource name '{0}'")]
    InvalidName(String),
    /// The name was found but its bytes could not be read.
    #[error("failed to read resource '{name}': {reason}")]
    Io {
        /// The sanitized name.
        name: String,
        /// The underlying failure.
        reason: String,
    },
}

/// An error reported by a resource decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DecodeError(pub String);

impl DecodeError {
    /// Creates a decode error from anything printable.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<std::io::Error> for DecodeError {
    fn from(error: std::io::Error) -> Self {
        Self(error.to_string())
    }
}

/// Errors returned by resource requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The resolver found no file with this name.
    #[error("resource '{0}' not found")]
    NotFound(String),
    /// The name was rejected by sanitization.
    #[error("invalid resource name '{0}'")]
    InvalidName(String),
    /// No decoder is registered for the requested type.
    #[error("no decoder registered for resource type '{0}'")]
    UnknownType(String),
    /// The decoder (or the byte source feeding it) reported an error.
    #[error("failed to decode resource: {0}")]
    DecodeFailed(String),
    /// A background load was cancelled before it was finalized.
    #[error("background load cancelled")]
    Cancelled,
}

impl From<ResolveError> for LoadError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::NotFound(name) => LoadError::NotFound(name),
            ResolveError::InvalidName(name) => LoadError::InvalidName(name),
            ResolveError::Io { name, reason } => {
                LoadError::DecodeFailed(format!("{name}: {reason}"))
            }
        }
    }
}

impl From<DecodeError> for LoadError {
    fn from(error: DecodeError) -> Self {
        LoadError::DecodeFailed(error.0)
    }
}
