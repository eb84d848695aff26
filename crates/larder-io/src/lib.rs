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

//! # Larder IO
//!
//! Everything between a resource name and its bytes: name sanitization,
//! package files, the search path resolver that layers packages over plain
//! directories, and the file watcher that drives hot-reload.

#![warn(missing_docs)]

pub mod error;
pub mod package;
pub mod resolver;
pub mod sanitize;
pub mod source;
pub mod watcher;

pub use error::{MountError, PackageError};
pub use package::{PackageBuilder, PackageEntry, PackageFile, PackageSummary};
pub use resolver::{Location, PackageOverlay, SearchDirectory, SearchPathResolver, PRIORITY_LAST};
pub use sanitize::{sanitize_dir_name, sanitize_name};
pub use source::{ByteSource, SourceOrigin};
pub use watcher::{ChangeDebouncer, FileChange, FileWatcher};
