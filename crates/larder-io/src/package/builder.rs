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

use super::{PackageEntry, PACKAGE_MAGIC, PACKAGE_VERSION};
use crate::error::PackageError;
use crate::sanitize::sanitize_name;
use larder_core::StringHash;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use walkdir::WalkDir;

/// Statistics about a written package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageSummary {
    /// Number of entries written.
    pub entries: usize,
    /// Sum of uncompressed entry sizes.
    pub total_size: u64,
    /// Bytes actually stored in the data region.
    pub stored_size: u64,
}

/// Collects named byte blobs and writes them as a package file.
#[derive(Debug, Default)]
pub struct PackageBuilder {
    compress: bool,
    files: Vec<(String, Vec<u8>)>,
    names: HashSet<StringHash>,
}

impl PackageBuilder {
    /// Creates an empty builder. Compression is off by default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables LZ4 compression for entries that shrink when compressed.
    pub fn compress(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// `true` if nothing was added.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Adds an entry from memory.
    pub fn add_bytes(&mut self, name: &str, bytes: Vec<u8>) -> Result<&mut Self, PackageError> {
        let name =
            sanitize_name(name, &[]).map_err(|_| PackageError::InvalidName(name.to_string()))?;
        if !self.names.insert(StringHash::new(&name)) {
            return Err(PackageError::DuplicateEntry(name));
        }
        self.files.push((name, bytes));
        Ok(self)
    }

    /// Adds an entry read from a file on disk.
    pub fn add_file(&mut self, name: &str, path: &Path) -> Result<&mut Self, PackageError> {
        let bytes = fs::read(path)?;
        self.add_bytes(name, bytes)
    }

    /// Adds every file below `root`, named by its path relative to `root`.
    ///
    /// Files are added in sorted path order so the output is reproducible.
    /// Returns the number of files added.
    pub fn add_directory(&mut self, root: &Path) -> Result<usize, PackageError> {
        let mut added = 0;
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| PackageError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|_| PackageError::InvalidName(entry.path().display().to_string()))?;
            let name = relative.to_string_lossy().replace('\\', "/");
            self.add_file(&name, entry.path())?;
            added += 1;
        }
        Ok(added)
    }

    /// Writes the package to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<PackageSummary, PackageError> {
        let mut entries = Vec::with_capacity(self.files.len());
        let mut blobs = Vec::with_capacity(self.files.len());
        let mut offset = 0u64;
        let mut total_size = 0u64;

        for (name, bytes) in &self.files {
            let checksum = *blake3::hash(bytes).as_bytes();
            let compressed = if self.compress {
                let candidate = lz4_flex::compress_prepend_size(bytes);
                (candidate.len() < bytes.len()).then_some(candidate)
            } else {
                None
            };

            let (stored, is_compressed) = match compressed {
                Some(candidate) => (candidate, true),
                None => (bytes.clone(), false),
            };

            entries.push(PackageEntry {
                name: name.clone(),
                offset,
                size: bytes.len() as u64,
                stored_size: stored.len() as u64,
                compressed: is_compressed,
                checksum,
            });
            offset += stored.len() as u64;
            total_size += bytes.len() as u64;
            blobs.push(stored);
        }

        let index = bincode::serde::encode_to_vec(&entries, bincode::config::standard())?;

        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(&PACKAGE_MAGIC)?;
        out.write_all(&PACKAGE_VERSION.to_le_bytes())?;
        out.write_all(&(index.len() as u64).to_le_bytes())?;
        out.write_all(&index)?;
        for blob in &blobs {
            out.write_all(blob)?;
        }
        out.flush()?;

        log::debug!(
            "Wrote package '{}': {} entries, {} bytes stored.",
            path.display(),
            entries.len(),
            offset
        );

        Ok(PackageSummary {
            entries: entries.len(),
            total_size,
            stored_size: offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageFile;

    #[test]
    fn test_rejects_duplicate_names_ignoring_case() {
        let mut builder = PackageBuilder::new();
        builder.add_bytes("a/B.txt", vec![1]).unwrap();
        assert!(matches!(
            builder.add_bytes("A\\b.TXT", vec![2]),
            Err(PackageError::DuplicateEntry(_))
        ));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_rejects_escaping_names() {
        let mut builder = PackageBuilder::new();
        assert!(matches!(
            builder.add_bytes("../outside", vec![]),
            Err(PackageError::InvalidName(_))
        ));
    }

    #[test]
    fn test_add_directory_uses_relative_forward_slash_names() {
        let source = tempfile::tempdir().unwrap();
        fs::create_dir_all(source.path().join("sub")).unwrap();
        fs::write(source.path().join("root.txt"), b"root").unwrap();
        fs::write(source.path().join("sub").join("leaf.txt"), b"leaf").unwrap();

        let mut builder = PackageBuilder::new();
        assert_eq!(builder.add_directory(source.path()).unwrap(), 2);

        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("dir.pak");
        let summary = builder.write_to(&path).unwrap();
        assert_eq!(summary.entries, 2);
        assert_eq!(summary.total_size, 8);

        let package = PackageFile::open(&path).unwrap();
        assert_eq!(package.read("sub/leaf.txt").unwrap(), b"leaf");
        assert_eq!(package.read("root.txt").unwrap(), b"root");
    }

    #[test]
    fn test_incompressible_entries_are_stored_raw() {
        let mut builder = PackageBuilder::new().compress(true);
        builder.add_bytes("tiny", vec![1, 2, 3]).unwrap();

        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("tiny.pak");
        let summary = builder.write_to(&path).unwrap();
        assert_eq!(summary.stored_size, 3);
        assert!(!PackageFile::open(&path).unwrap().entry("tiny").unwrap().compressed);
    }
}
