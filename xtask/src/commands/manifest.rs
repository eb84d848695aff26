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

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The `Package.toml` manifest describing what goes into a package.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackageManifest {
    /// Directories whose files are packed, named relative to their directory.
    pub source_directories: Vec<PathBuf>,
    /// Where the package is written.
    pub output: PathBuf,
    /// LZ4-compress entries that shrink.
    pub compress: bool,
}

impl Default for PackageManifest {
    fn default() -> Self {
        Self {
            source_directories: vec![PathBuf::from("resources")],
            output: PathBuf::from(".dist/resources.pak"),
            compress: false,
        }
    }
}

impl PackageManifest {
    /// Loads `path`, or the defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No '{}' found, using the default manifest.", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest '{}'", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("Failed to parse TOML from '{}'", path.display()))
    }
}
