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

//! Resolution of resource names to bytes across directories and packages.

use crate::error::MountError;
use crate::package::PackageFile;
use crate::sanitize::{sanitize_dir_name, sanitize_name};
use crate::source::{ByteSource, SourceOrigin};
use larder_core::ResolveError;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Priority that appends a location after every existing one.
pub const PRIORITY_LAST: u32 = u32::MAX;

/// A plain directory searched for resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDirectory {
    /// Canonical directory path.
    pub path: PathBuf,
    /// Lower values are searched first.
    pub priority: u32,
}

/// A package mounted as a search location.
#[derive(Debug, Clone)]
pub struct PackageOverlay {
    /// The opened package.
    pub package: Arc<PackageFile>,
    /// Lower values are searched first.
    pub priority: u32,
}

/// Which search location produced a match.
#[derive(Debug, Clone)]
pub enum Location {
    /// A file under a resource directory.
    Directory {
        /// The directory root.
        root: PathBuf,
        /// The full file path.
        path: PathBuf,
    },
    /// An entry of a mounted package.
    Package(Arc<PackageFile>),
}

/// An immutable view of the search lists.
#[derive(Debug, Clone, Default)]
pub struct SearchLists {
    directories: Vec<SearchDirectory>,
    packages: Vec<PackageOverlay>,
    search_packages_first: bool,
}

impl SearchLists {
    /// Mounted directories in search order.
    pub fn directories(&self) -> &[SearchDirectory] {
        &self.directories
    }

    /// Mounted packages in search order.
    pub fn packages(&self) -> &[PackageOverlay] {
        &self.packages
    }

    /// Whether packages are searched before directories.
    pub fn search_packages_first(&self) -> bool {
        self.search_packages_first
    }

    fn roots(&self) -> Vec<PathBuf> {
        self.directories.iter().map(|d| d.path.clone()).collect()
    }

    fn find_in_packages(&self, name: &str) -> Option<Location> {
        self.packages
            .iter()
            .find(|overlay| overlay.package.contains(name))
            .map(|overlay| Location::Package(overlay.package.clone()))
    }

    fn find_in_directories(&self, name: &str) -> Option<Location> {
        self.directories.iter().find_map(|dir| {
            let path = dir.path.join(name);
            path.is_file().then(|| Location::Directory {
                root: dir.path.clone(),
                path,
            })
        })
    }

    fn locate(&self, name: &str) -> Option<Location> {
        if self.search_packages_first {
            self.find_in_packages(name)
                .or_else(|| self.find_in_directories(name))
        } else {
            self.find_in_directories(name)
                .or_else(|| self.find_in_packages(name))
        }
    }
}

/// Resolves sanitized resource names against mounted directories and packages.
///
/// The search lists are kept in an immutable snapshot that mutations replace
/// wholesale. A lookup running on a background worker therefore always sees
/// one consistent list, either from before or after a concurrent mount.
#[derive(Debug, Default)]
pub struct SearchPathResolver {
    lists: RwLock<Arc<SearchLists>>,
}

impl SearchPathResolver {
    /// Creates a resolver with no search locations.
    pub fn new(search_packages_first: bool) -> Self {
        Self {
            lists: RwLock::new(Arc::new(SearchLists {
                search_packages_first,
                ..Default::default()
            })),
        }
    }

    /// The current snapshot of the search lists.
    pub fn snapshot(&self) -> Arc<SearchLists> {
        self.lists
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn update(&self, mutate: impl FnOnce(&mut SearchLists)) {
        let mut guard = self
            .lists
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut next = SearchLists::clone(&guard);
        mutate(&mut next);
        *guard = Arc::new(next);
    }

    /// Whether packages are searched before directories.
    pub fn search_packages_first(&self) -> bool {
        self.snapshot().search_packages_first
    }

    /// Selects which list is searched first.
    pub fn set_search_packages_first(&self, enabled: bool) {
        self.update(|lists| lists.search_packages_first = enabled);
    }

    /// Adds a resource directory and returns its canonical path.
    ///
    /// Lower priorities are searched first; [`PRIORITY_LAST`] appends.
    pub fn add_resource_dir(&self, path: &Path, priority: u32) -> Result<PathBuf, MountError> {
        let canonical = sanitize_dir_name(path).map_err(|source| MountError::Directory {
            path: path.to_path_buf(),
            source,
        })?;

        if self
            .snapshot()
            .directories
            .iter()
            .any(|dir| dir.path == canonical)
        {
            return Err(MountError::AlreadyMounted(canonical));
        }

        let entry = SearchDirectory {
            path: canonical.clone(),
            priority,
        };
        self.update(|lists| {
            let position = insert_position(&lists.directories, |d| d.priority, priority);
            lists.directories.insert(position, entry);
        });
        log::info!("Added resource directory '{}'.", canonical.display());
        Ok(canonical)
    }

    /// Removes a resource directory. Returns `false` if it was not mounted.
    pub fn remove_resource_dir(&self, path: &Path) -> bool {
        let target = sanitize_dir_name(path).unwrap_or_else(|_| path.to_path_buf());
        let mut removed = false;
        self.update(|lists| {
            let before = lists.directories.len();
            lists.directories.retain(|dir| dir.path != target);
            removed = lists.directories.len() != before;
        });
        if removed {
            log::info!("Removed resource directory '{}'.", target.display());
        }
        removed
    }

    /// Mounts an opened package.
    pub fn add_package_file(
        &self,
        package: Arc<PackageFile>,
        priority: u32,
    ) -> Result<(), MountError> {
        if self
            .snapshot()
            .packages
            .iter()
            .any(|overlay| overlay.package.path() == package.path())
        {
            return Err(MountError::AlreadyMounted(package.path().to_path_buf()));
        }

        log::info!(
            "Added package file '{}' ({} entries).",
            package.path().display(),
            package.len()
        );
        self.update(|lists| {
            let position = insert_position(&lists.packages, |p| p.priority, priority);
            lists
                .packages
                .insert(position, PackageOverlay { package, priority });
        });
        Ok(())
    }

    /// Opens and mounts a package file.
    pub fn add_package_path(
        &self,
        path: &Path,
        priority: u32,
    ) -> Result<Arc<PackageFile>, MountError> {
        let package = Arc::new(PackageFile::open(path)?);
        self.add_package_file(package.clone(), priority)?;
        Ok(package)
    }

    /// Unmounts a package by path, returning it if it was mounted.
    pub fn remove_package_file(&self, path: &Path) -> Option<Arc<PackageFile>> {
        let mut removed = None;
        self.update(|lists| {
            if let Some(position) = lists
                .packages
                .iter()
                .position(|overlay| overlay.package.path() == path)
            {
                removed = Some(lists.packages.remove(position).package);
            }
        });
        if removed.is_some() {
            log::info!("Removed package file '{}'.", path.display());
        }
        removed
    }

    /// Mounted directories, in search order.
    pub fn resource_dirs(&self) -> Vec<PathBuf> {
        self.snapshot().roots()
    }

    /// Mounted packages, in search order.
    pub fn package_files(&self) -> Vec<Arc<PackageFile>> {
        self.snapshot()
            .packages
            .iter()
            .map(|overlay| overlay.package.clone())
            .collect()
    }

    /// Sanitizes a name against the current directory roots.
    pub fn sanitize_name(&self, name: &str) -> Result<String, ResolveError> {
        sanitize_name(name, &self.snapshot().roots())
    }

    /// Finds the location that would serve `name`.
    pub fn locate(&self, name: &str) -> Result<(String, Location), ResolveError> {
        let lists = self.snapshot();
        let sanitized = sanitize_name(name, &lists.roots())?;
        match lists.locate(&sanitized) {
            Some(location) => Ok((sanitized, location)),
            None => Err(ResolveError::NotFound(sanitized)),
        }
    }

    /// Resolves a name and reads its bytes.
    pub fn resolve(&self, name: &str) -> Result<ByteSource, ResolveError> {
        let (sanitized, location) = self.locate(name)?;
        let io_error = |reason: String| ResolveError::Io {
            name: sanitized.clone(),
            reason,
        };

        match location {
            Location::Directory { root, path } => {
                let bytes = std::fs::read(&path).map_err(|e| io_error(e.to_string()))?;
                log::trace!("Resolved '{}' to '{}'.", sanitized, path.display());
                Ok(ByteSource::new(
                    sanitized.clone(),
                    SourceOrigin::Directory { root, path },
                    bytes,
                ))
            }
            Location::Package(package) => {
                let bytes = package
                    .read(&sanitized)
                    .map_err(|e| io_error(e.to_string()))?;
                log::trace!(
                    "Resolved '{}' from package '{}'.",
                    sanitized,
                    package.path().display()
                );
                Ok(ByteSource::new(
                    sanitized.clone(),
                    SourceOrigin::Package {
                        package: package.path().to_path_buf(),
                    },
                    bytes,
                ))
            }
        }
    }

    /// Whether `name` resolves, without reading it.
    pub fn exists(&self, name: &str) -> bool {
        self.locate(name).is_ok()
    }

    /// Full path of the file that would serve `name`, if a directory serves it.
    pub fn resource_file_name(&self, name: &str) -> Option<PathBuf> {
        let lists = self.snapshot();
        let sanitized = sanitize_name(name, &lists.roots()).ok()?;
        match lists.find_in_directories(&sanitized)? {
            Location::Directory { path, .. } => Some(path),
            Location::Package(_) => None,
        }
    }

    /// The first mounted directory that contains `path`.
    ///
    /// `path` is sanitized like a resource name, so it cannot point outside
    /// the mounted directories.
    pub fn preferred_resource_dir(&self, path: &Path) -> Option<PathBuf> {
        let lists = self.snapshot();
        let relative = sanitize_name(&path.to_string_lossy(), &lists.roots()).ok()?;
        lists
            .directories
            .iter()
            .find(|dir| dir.path.join(&relative).exists())
            .map(|dir| dir.path.clone())
    }
}

fn insert_position<T>(items: &[T], priority_of: impl Fn(&T) -> u32, priority: u32) -> usize {
    items
        .iter()
        .position(|item| priority_of(item) > priority)
        .unwrap_or(items.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_position_keeps_registration_order_for_equal_priorities() {
        let priorities = [0u32, 1, 1, 5];
        assert_eq!(insert_position(&priorities, |p| *p, 1), 3);
        assert_eq!(insert_position(&priorities, |p| *p, 0), 1);
        assert_eq!(insert_position(&priorities, |p| *p, PRIORITY_LAST), 4);
        assert_eq!(insert_position(&priorities, |p| *p, 3), 3);
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_mounts() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = SearchPathResolver::new(true);
        let before = resolver.snapshot();
        resolver.add_resource_dir(dir.path(), PRIORITY_LAST).unwrap();
        assert!(before.directories().is_empty());
        assert_eq!(resolver.snapshot().directories().len(), 1);
    }

    #[test]
    fn test_mounting_same_directory_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = SearchPathResolver::new(true);
        resolver.add_resource_dir(dir.path(), 0).unwrap();
        assert!(matches!(
            resolver.add_resource_dir(dir.path(), 1),
            Err(MountError::AlreadyMounted(_))
        ));
    }

    #[test]
    fn test_missing_directory_cannot_be_mounted() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = SearchPathResolver::new(true);
        assert!(matches!(
            resolver.add_resource_dir(&dir.path().join("nope"), 0),
            Err(MountError::Directory { .. })
        ));
    }
}
