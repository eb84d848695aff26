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

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing package files.
#[derive(Debug, Error)]
pub enum PackageError {
    /// An underlying I/O operation failed.
    #[error("package I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file does not start with the package magic.
    #[error("'{0}' is not a package file")]
    NotAPackage(PathBuf),
    /// The package was written by an incompatible version.
    #[error("unsupported package version {0}")]
    UnsupportedVersion(u32),
    /// The entry index could not be decoded.
    #[error("failed to decode package index: {0}")]
    IndexDecode(#[from] bincode::error::DecodeError),
    /// The entry index could not be encoded.
    #[error("failed to encode package index: {0}")]
    IndexEncode(#[from] bincode::error::EncodeError),
    /// The index points outside the data region, or is otherwise inconsistent.
    #[error("corrupt package: {0}")]
    Corrupt(String),
    /// No entry with this name.
    #[error("entry '{0}' not found in package")]
    EntryNotFound(String),
    /// The entry's bytes do not match its recorded checksum.
    #[error("checksum mismatch for entry '{0}'")]
    ChecksumMismatch(String),
    /// The entry's compressed bytes could not be decompressed.
    #[error("failed to decompress entry '{name}': {reason}")]
    Decompress {
        /// The entry name.
        name: String,
        /// The decompressor's message.
        reason: String,
    },
    /// An entry name was rejected by sanitization.
    #[error("invalid entry name '{0}'")]
    InvalidName(String),
    /// Two entries share a name.
    #[error("duplicate entry '{0}'")]
    DuplicateEntry(String),
}

/// Errors raised while mounting search locations.
#[derive(Debug, Error)]
pub enum MountError {
    /// The directory does not exist or is not a directory.
    #[error("resource directory '{path}' is not accessible: {source}")]
    Directory {
        /// The requested path.
        path: PathBuf,
        /// The underlying failure.
        source: std::io::Error,
    },
    /// The location is already mounted.
    #[error("'{0}' is already mounted")]
    AlreadyMounted(PathBuf),
    /// The package could not be opened.
    #[error(transparent)]
    Package(#[from] PackageError),
}
