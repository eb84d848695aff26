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

//! File watching for resource hot-reload.
//!
//! A [`FileWatcher`] observes one resource directory through `notify` and
//! reports changed files by resource name. Editors and exporters usually touch
//! a file several times while saving it, so changes are held back until the
//! file has been quiet for the configured delay.

use crossbeam_channel::{Receiver, TryRecvError};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A settled change to a file under a watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Full path of the changed file.
    pub file_name: PathBuf,
    /// Path relative to the watched directory, with `/` separators.
    pub resource_name: String,
}

/// Holds raw change notifications until each file has been quiet for `delay`.
#[derive(Debug)]
pub struct ChangeDebouncer {
    delay: Duration,
    pending: HashMap<String, (PathBuf, Instant)>,
}

impl ChangeDebouncer {
    /// Creates a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
        }
    }

    /// Records a raw change observed at `now`, restarting that file's quiet period.
    pub fn record(&mut self, resource_name: String, file_name: PathBuf, now: Instant) {
        self.pending.insert(resource_name, (file_name, now));
    }

    /// Removes and returns the changes whose quiet period has elapsed by `now`,
    /// sorted by resource name.
    pub fn take_ready(&mut self, now: Instant) -> Vec<FileChange> {
        let delay = self.delay;
        let mut ready: Vec<FileChange> = Vec::new();
        self.pending.retain(|name, (path, seen)| {
            if now.saturating_duration_since(*seen) >= delay {
                ready.push(FileChange {
                    file_name: path.clone(),
                    resource_name: name.clone(),
                });
                false
            } else {
                true
            }
        });
        ready.sort_by(|a, b| a.resource_name.cmp(&b.resource_name));
        ready
    }

    /// Number of changes still waiting.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Watches one resource directory for file modifications.
pub struct FileWatcher {
    root: PathBuf,
    _watcher: RecommendedWatcher,
    receiver: Receiver<PathBuf>,
    debouncer: ChangeDebouncer,
}

impl FileWatcher {
    /// Starts watching `root` recursively.
    ///
    /// `root` should be canonical, as returned by
    /// [`SearchPathResolver::add_resource_dir`](crate::SearchPathResolver::add_resource_dir),
    /// so reported paths can be made relative to it.
    pub fn new(root: &Path, delay: Duration) -> notify::Result<Self> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            match result {
                Ok(event) => {
                    if matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Any
                    ) {
                        for path in event.paths {
                            let _ = sender.send(path);
                        }
                    }
                }
                Err(e) => log::warn!("File watcher error: {e}"),
            }
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        log::debug!("Watching '{}' for changes.", root.display());

        Ok(Self {
            root: root.to_path_buf(),
            _watcher: watcher,
            receiver,
            debouncer: ChangeDebouncer::new(delay),
        })
    }

    /// The watched directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Collects raw notifications and returns the changes that have settled.
    pub fn poll_changes(&mut self) -> Vec<FileChange> {
        let now = Instant::now();
        loop {
            match self.receiver.try_recv() {
                Ok(path) => {
                    if path.is_dir() {
                        continue;
                    }
                    if let Ok(relative) = path.strip_prefix(&self.root) {
                        let name = relative.to_string_lossy().replace('\\', "/");
                        self.debouncer.record(name, path.clone(), now);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.debouncer.take_ready(now)
    }
}
