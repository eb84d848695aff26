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

//! Stable, case-insensitive string hashing.

use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::Xxh3;

/// A 64-bit hash of a string, computed over its ASCII-lowercased bytes.
///
/// The hash is XXH3 with the default seed, so a given string produces the
/// same value on every run and on every platform. This lets identities,
/// package indices and dependency edges be compared across invocations.
///
/// The empty string always hashes to [`StringHash::ZERO`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StringHash(u64);

impl StringHash {
    /// The hash of the empty string.
    pub const ZERO: StringHash = StringHash(0);

    /// Hashes `value`, ignoring ASCII case.
    pub fn new(value: &str) -> Self {
        if value.is_empty() {
            return Self::ZERO;
        }

        let mut hasher = Xxh3::new();
        let mut buffer = [0u8; 64];
        for chunk in value.as_bytes().chunks(buffer.len()) {
            let lowered = &mut buffer[..chunk.len()];
            lowered.copy_from_slice(chunk);
            lowered.make_ascii_lowercase();
            hasher.update(lowered);
        }
        Self(hasher.digest())
    }

    /// Wraps an already computed hash value.
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw hash value.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Returns `true` for the hash of the empty string.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<&str> for StringHash {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for StringHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:016x}", self.0)
    }
}
