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

//! Resource name sanitization.
//!
//! Every name is sanitized before it reaches a directory or a package index.
//! Sanitization is the only thing standing between a caller-supplied name and
//! the host file system, so names that would leave the resource roots are
//! rejected rather than repaired.

use larder_core::ResolveError;
use std::io;
use std::path::{Path, PathBuf};

/// Turns a caller-supplied name into the canonical form used for lookups.
///
/// - Backslashes become `/` and surrounding whitespace is trimmed.
/// - Empty names and names containing NUL are rejected.
/// - Absolute names are accepted only when they lie under one of `roots`;
///   the root prefix is stripped.
/// - Empty and `.` components are dropped; `..` removes the previous
///   component, and a `..` with nothing left to remove is rejected.
pub fn sanitize_name(name: &str, roots: &[PathBuf]) -> Result<String, ResolveError> {
    let invalid = || ResolveError::InvalidName(name.to_string());

    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains('\0') {
        return Err(invalid());
    }

    let mut unified = trimmed.replace('\\', "/");
    if is_absolute(&unified) {
        unified = strip_root(&unified, roots).ok_or_else(invalid)?;
    }

    let mut components: Vec<&str> = Vec::new();
    for component in unified.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if components.pop().is_none() {
                    return Err(invalid());
                }
            }
            other => components.push(other),
        }
    }

    if components.is_empty() {
        return Err(invalid());
    }
    Ok(components.join("/"))
}

/// Canonicalizes a resource directory path.
///
/// Fails if the directory does not exist.
pub fn sanitize_dir_name(path: &Path) -> io::Result<PathBuf> {
    let canonical = std::fs::canonicalize(path)?;
    if !canonical.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not a directory", canonical.display()),
        ));
    }
    Ok(canonical)
}

fn is_absolute(name: &str) -> bool {
    let bytes = name.as_bytes();
    name.starts_with('/') || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

fn strip_root(name: &str, roots: &[PathBuf]) -> Option<String> {
    roots.iter().find_map(|root| {
        let mut prefix = root.to_string_lossy().replace('\\', "/");
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        name.strip_prefix(prefix.as_str()).map(str::to_string)
    })
}
