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

//! Reloading cached resources in place, and the file watchers that trigger it.

use crate::cache::{LoadMode, ResourceCache};
use crate::decoder::decode_resource;
use crate::dependency::file_identity;
use larder_core::event::ResourceEvent;
use larder_core::{ResourceIdentity, StringHash};
use larder_io::{FileChange, FileWatcher};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// One [`FileWatcher`] per watched resource directory.
pub struct WatcherSet {
    delay: Duration,
    watchers: Vec<FileWatcher>,
}

impl WatcherSet {
    /// Creates an empty set whose watchers debounce with `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            watchers: Vec::new(),
        }
    }

    /// Starts watching `root`. Failures are logged; the directory stays usable.
    pub fn watch(&mut self, root: &Path) {
        if self.watchers.iter().any(|w| w.root() == root) {
            return;
        }
        match FileWatcher::new(root, self.delay) {
            Ok(watcher) => self.watchers.push(watcher),
            Err(e) => log::warn!("Could not watch '{}' for changes: {e}", root.display()),
        }
    }

    /// Stops watching `root`.
    pub fn unwatch(&mut self, root: &Path) -> bool {
        let before = self.watchers.len();
        self.watchers.retain(|w| w.root() != root);
        self.watchers.len() != before
    }

    /// Stops every watcher.
    pub fn clear(&mut self) {
        self.watchers.clear();
    }

    /// Number of watched directories.
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    /// `true` if nothing is watched.
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }

    /// Settled changes across every watched directory.
    pub fn poll(&mut self) -> Vec<FileChange> {
        self.watchers
            .iter_mut()
            .flat_map(FileWatcher::poll_changes)
            .collect()
    }
}

impl ResourceCache {
    /// Re-decodes a cached resource and swaps the new payload into its entry.
    ///
    /// Every handle to the entry observes the new payload. On failure the old
    /// payload stays and `ReloadFailed` is emitted. Returns `false` if the
    /// resource is not cached or the reload failed.
    pub fn reload_resource(&mut self, identity: &ResourceIdentity) -> bool {
        let Some(handle) = self.store.get(identity.key()).cloned() else {
            log::debug!("Not reloading '{identity}': not cached.");
            return false;
        };
        self.emit(ResourceEvent::ReloadStarted(identity.clone()));

        let Some(decoder) = self.decoders.get(identity.type_id()) else {
            log::warn!("Cannot reload '{identity}': no decoder for its type.");
            self.emit(ResourceEvent::ReloadFailed(identity.clone()));
            return false;
        };

        match decode_resource(&self.resolver, decoder.as_ref(), handle.identity()) {
            Ok((resource, context)) => {
                handle.replace_payload(resource);
                let (old_use, new_use) = self
                    .store
                    .refresh_memory_use(identity.key())
                    .unwrap_or_default();
                handle.touch(self.store.next_tick());
                self.record_dependencies(handle.identity(), &context);
                self.load_dependencies(&context, LoadMode::Immediate);
                log::debug!(
                    "Reloaded '{identity}' (generation {}, {old_use} -> {new_use} bytes).",
                    handle.generation()
                );
                self.emit(ResourceEvent::ReloadFinished(identity.clone()));
                self.evict(identity.type_id());
                true
            }
            Err(e) => {
                log::warn!("Failed to reload '{identity}', keeping the previous version: {e}");
                self.emit(ResourceEvent::ReloadFailed(identity.clone()));
                false
            }
        }
    }

    /// Reloads `identity`, then everything that transitively depends on it,
    /// dependencies before dependents.
    ///
    /// Returns the resources that reloaded successfully, in reload order.
    pub fn reload_resource_with_dependencies(
        &mut self,
        identity: &ResourceIdentity,
    ) -> Vec<ResourceIdentity> {
        self.reload_cascades(std::slice::from_ref(identity))
    }

    /// Reacts to a change of the file serving `name`.
    ///
    /// Emits `FileChanged`, then reloads every cached resource with that name
    /// and everything that declared the file as a dependency.
    pub fn handle_file_changed(&mut self, name: &str) -> Vec<ResourceIdentity> {
        let file_name = self
            .resolver
            .resource_file_name(name)
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        self.file_changed(name, &file_name)
    }

    pub(crate) fn file_changed(&mut self, resource_name: &str, file_name: &str) -> Vec<ResourceIdentity> {
        log::debug!("File '{file_name}' changed.");
        self.emit(ResourceEvent::FileChanged {
            file_name: file_name.to_string(),
            resource_name: resource_name.to_string(),
        });

        let Ok(name) = self.resolver.sanitize_name(resource_name) else {
            return Vec::new();
        };
        let mut roots = self.store.find_by_name(StringHash::new(&name));
        roots.sort_by(|a, b| a.type_name().cmp(b.type_name()));
        roots.push(file_identity(&name));
        self.reload_cascades(&roots)
    }

    fn reload_cascades(&mut self, roots: &[ResourceIdentity]) -> Vec<ResourceIdentity> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for root in roots {
            let store = &self.store;
            let cascade = self
                .dependencies
                .cascade_set(root, |id| store.contains(id.key()));
            for identity in self.dependencies.reload_order(root, &cascade) {
                if seen.insert(identity.key()) {
                    order.push(identity);
                }
            }
        }

        let mut reloaded = Vec::new();
        for identity in order {
            if self.store.contains(identity.key()) && self.reload_resource(&identity) {
                reloaded.push(identity);
            }
        }
        reloaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_each_directory_is_watched_once() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let mut watchers = WatcherSet::new(Duration::ZERO);

        watchers.watch(&root);
        watchers.watch(&root);
        assert_eq!(watchers.len(), 1);

        assert!(watchers.unwatch(&root));
        assert!(!watchers.unwatch(&root));
        assert!(watchers.is_empty());
    }
}
