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

use crate::commands::manifest::PackageManifest;
use crate::helpers::*;
use anyhow::{Context, Result};
use larder_io::{PackageBuilder, PackageFile, PackageSummary};
use std::fs;
use std::path::Path;

/// Builds the package described by the manifest at `manifest_path`.
pub fn pack(manifest_path: &Path) -> Result<()> {
    print_task_start("Packing Resources", "📦", MAGENTA);
    let manifest = PackageManifest::load(manifest_path)?;

    match build_package(&manifest)? {
        Some(summary) => {
            print_success(&format!(
                "Wrote {} entries to '{}' ({} stored, {} uncompressed)",
                summary.entries,
                manifest.output.display(),
                human_size(summary.stored_size),
                human_size(summary.total_size)
            ));
        }
        None => print_error("No source directories found. Nothing to pack."),
    }
    Ok(())
}

/// Packs every existing source directory into `manifest.output`.
///
/// Returns `None` when none of the source directories exist.
pub fn build_package(manifest: &PackageManifest) -> Result<Option<PackageSummary>> {
    let mut builder = PackageBuilder::new().compress(manifest.compress);
    let mut found = false;

    for dir in &manifest.source_directories {
        if !dir.is_dir() {
            log::warn!("Skipping missing source directory '{}'.", dir.display());
            continue;
        }
        found = true;
        let added = builder
            .add_directory(dir)
            .with_context(|| format!("Failed to pack '{}'", dir.display()))?;
        print_info(&format!("{} files from '{}'", added, dir.display()));
    }
    if !found {
        return Ok(None);
    }

    if let Some(parent) = manifest.output.parent() {
        fs::create_dir_all(parent)?;
    }
    let summary = builder
        .write_to(&manifest.output)
        .with_context(|| format!("Failed to write '{}'", manifest.output.display()))?;
    Ok(Some(summary))
}

/// Prints the entries of a package, optionally reading each one back to
/// verify its checksum.
pub fn list(package_path: &Path, verify: bool) -> Result<()> {
    print_task_start("Package Contents", "🔍", CYAN);
    let package = PackageFile::open(package_path)
        .with_context(|| format!("Failed to open package '{}'", package_path.display()))?;

    let mut corrupt = 0;
    for name in package.list_entries() {
        let Some(entry) = package.entry(name) else {
            continue;
        };
        let status = if !verify {
            ""
        } else if package.read(name).is_ok() {
            CHECK
        } else {
            corrupt += 1;
            CROSS
        };
        println!(
            "  {:>10}  {}{}  {}",
            human_size(entry.size),
            if entry.compressed { "lz4 " } else { "    " },
            name,
            status
        );
    }

    println!(
        "{}{} entries, {}{}",
        BOLD,
        package.len(),
        human_size(package.total_size()),
        RESET
    );
    if corrupt > 0 {
        anyhow::bail!("{} entries failed verification", corrupt);
    }
    Ok(())
}
