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

//! Package files: read-only archives of named resources.
//!
//! Layout:
//!
//! ```text
//! "LPAK" | version: u32 LE | index_len: u64 LE | index (bincode) | data
//! ```
//!
//! The index is a list of [`PackageEntry`]. Entry offsets are relative to the
//! start of the data region. Entries may be LZ4 compressed and always carry a
//! BLAKE3 checksum of their uncompressed bytes, verified on every read.

mod builder;

pub use builder::{PackageBuilder, PackageSummary};

use crate::error::PackageError;
use larder_core::StringHash;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The four bytes every package starts with.
pub const PACKAGE_MAGIC: [u8; 4] = *b"LPAK";
/// The package format version written by this crate.
pub const PACKAGE_VERSION: u32 = 1;
/// Size of the fixed header preceding the index.
pub const HEADER_SIZE: u64 = 16;

/// One file stored in a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    /// Sanitized entry name.
    pub name: String,
    /// Offset of the stored bytes from the start of the data region.
    pub offset: u64,
    /// Uncompressed size.
    pub size: u64,
    /// Number of bytes stored in the package.
    pub stored_size: u64,
    /// Whether the stored bytes are LZ4 compressed.
    pub compressed: bool,
    /// BLAKE3 hash of the uncompressed bytes.
    pub checksum: [u8; 32],
}

/// A package file opened for reading.
///
/// The index is loaded once at open time; entry bytes are read on demand.
/// Lookups ignore ASCII case, like resource identities do.
#[derive(Debug)]
pub struct PackageFile {
    path: PathBuf,
    entries: Vec<PackageEntry>,
    lookup: HashMap<StringHash, usize>,
    data_start: u64,
    file: Mutex<File>,
}

impl PackageFile {
    /// Opens a package and loads its index.
    ///
    /// # Errors
    /// Fails if the file cannot be read, is not a package, has an unsupported
    /// version, or its index references bytes outside the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PackageError> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();

        let mut header = [0u8; HEADER_SIZE as usize];
        if file_len < HEADER_SIZE {
            return Err(PackageError::NotAPackage(path.to_path_buf()));
        }
        file.read_exact(&mut header)?;
        if header[0..4] != PACKAGE_MAGIC {
            return Err(PackageError::NotAPackage(path.to_path_buf()));
        }
        let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if version != PACKAGE_VERSION {
            return Err(PackageError::UnsupportedVersion(version));
        }
        let mut index_len_bytes = [0u8; 8];
        index_len_bytes.copy_from_slice(&header[8..16]);
        let index_len = u64::from_le_bytes(index_len_bytes);

        let data_start = HEADER_SIZE
            .checked_add(index_len)
            .filter(|end| *end <= file_len)
            .ok_or_else(|| PackageError::Corrupt("index extends past end of file".into()))?;

        let mut index_bytes = vec![0u8; index_len as usize];
        file.read_exact(&mut index_bytes)?;
        let (entries, _): (Vec<PackageEntry>, _) =
            bincode::serde::decode_from_slice(&index_bytes, bincode::config::standard())?;

        let data_len = file_len - data_start;
        let mut lookup = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let end = entry.offset.checked_add(entry.stored_size);
            if end.map_or(true, |end| end > data_len) {
                return Err(PackageError::Corrupt(format!(
                    "entry '{}' extends past end of data",
                    entry.name
                )));
            }
            if lookup.insert(StringHash::new(&entry.name), position).is_some() {
                return Err(PackageError::DuplicateEntry(entry.name.clone()));
            }
        }

        log::debug!(
            "Opened package '{}' with {} entries.",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            entries,
            lookup,
            data_start,
            file: Mutex::new(file),
        })
    }

    /// Path the package was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of all entries, in the order they were written.
    pub fn list_entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` for a package without entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry with this (sanitized) name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains_key(&StringHash::new(name))
    }

    /// Metadata of an entry.
    pub fn entry(&self, name: &str) -> Option<&PackageEntry> {
        self.lookup
            .get(&StringHash::new(name))
            .map(|&position| &self.entries[position])
    }

    /// Sum of the uncompressed sizes of all entries.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|entry| entry.size).sum()
    }

    /// Reads, decompresses and verifies an entry.
    pub fn read(&self, name: &str) -> Result<Vec<u8>, PackageError> {
        let entry = self
            .entry(name)
            .ok_or_else(|| PackageError::EntryNotFound(name.to_string()))?;

        let mut stored = vec![0u8; entry.stored_size as usize];
        {
            let mut file = self
                .file
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            file.seek(SeekFrom::Start(self.data_start + entry.offset))?;
            file.read_exact(&mut stored)?;
        }

        let bytes = if entry.compressed {
            lz4_flex::decompress_size_prepended(&stored).map_err(|e| PackageError::Decompress {
                name: entry.name.clone(),
                reason: e.to_string(),
            })?
        } else {
            stored
        };

        if bytes.len() as u64 != entry.size || *blake3::hash(&bytes).as_bytes() != entry.checksum {
            return Err(PackageError::ChecksumMismatch(entry.name.clone()));
        }
        Ok(bytes)
    }
}
