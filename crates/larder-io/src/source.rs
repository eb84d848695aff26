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

use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Where the bytes of a [`ByteSource`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOrigin {
    /// A file inside a resource directory.
    Directory {
        /// The resource directory.
        root: PathBuf,
        /// The full path of the file.
        path: PathBuf,
    },
    /// An entry of a mounted package file.
    Package {
        /// Path of the package file.
        package: PathBuf,
    },
    /// Bytes handed over directly by the caller.
    Memory,
}

/// The raw bytes of one resource, ready to be decoded.
///
/// The bytes are owned, so a source can be moved to a background worker and
/// read there without touching the file system again.
#[derive(Debug, Clone)]
pub struct ByteSource {
    name: String,
    origin: SourceOrigin,
    cursor: Cursor<Vec<u8>>,
}

impl ByteSource {
    /// Creates a source for `name` from its bytes.
    pub fn new(name: impl Into<String>, origin: SourceOrigin, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            origin,
            cursor: Cursor::new(bytes),
        }
    }

    /// Creates an in-memory source.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name, SourceOrigin::Memory, bytes)
    }

    /// The sanitized resource name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the bytes came from.
    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    /// Path of the file on disk, for sources read from a directory.
    pub fn file_path(&self) -> Option<&Path> {
        match &self.origin {
            SourceOrigin::Directory { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Total size in bytes.
    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    /// `true` for an empty source.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All bytes, regardless of the read position.
    pub fn bytes(&self) -> &[u8] {
        self.cursor.get_ref()
    }

    /// The bytes after the current read position.
    pub fn remaining(&self) -> &[u8] {
        let position = (self.cursor.position() as usize).min(self.len());
        &self.cursor.get_ref()[position..]
    }

    /// Consumes the source, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}

impl Read for ByteSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl Seek for ByteSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cursor.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_advances_remaining() {
        let mut source = ByteSource::from_bytes("a.bin", vec![1, 2, 3, 4]);
        let mut head = [0u8; 2];
        source.read_exact(&mut head).unwrap();
        assert_eq!(head, [1, 2]);
        assert_eq!(source.remaining(), &[3, 4]);
        assert_eq!(ByteSource::bytes(&source).len(), 4);

        source.seek(SeekFrom::Start(0)).unwrap();
        assert_eq!(source.remaining().len(), 4);
    }

    #[test]
    fn test_file_path_only_for_directory_sources() {
        let source = ByteSource::new(
            "a.png",
            SourceOrigin::Directory {
                root: PathBuf::from("/data"),
                path: PathBuf::from("/data/a.png"),
            },
            Vec::new(),
        );
        assert_eq!(source.file_path(), Some(Path::new("/data/a.png")));
        assert!(source.is_empty());
        assert!(ByteSource::from_bytes("b", vec![]).file_path().is_none());
    }
}
