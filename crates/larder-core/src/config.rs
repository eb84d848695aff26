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

//! Configuration of the resource cache.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Runtime configuration of a resource cache.
///
/// Every field has a default, so a RON document only needs to list what it
/// changes:
///
/// ```
/// use larder_core::config::CacheConfig;
///
/// let config = CacheConfig::from_ron_str(
///     r#"(auto_reload_resources: true, memory_budgets: {"Texture": 1048576})"#,
/// )
/// .unwrap();
/// assert!(config.auto_reload_resources);
/// assert_eq!(config.memory_budgets["Texture"], 1 << 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Watch resource directories and reload resources whose files change.
    pub auto_reload_resources: bool,
    /// Install an empty placeholder entry when a load fails, instead of only
    /// returning the error.
    pub return_failed_resources: bool,
    /// Search mounted packages before plain directories.
    pub search_packages_first: bool,
    /// Time budget per update cycle for finalizing background loads.
    pub finish_background_resources_ms: u64,
    /// Number of background decode workers. With `0`, background requests
    /// are decoded on the requesting thread and still finalized by `update`.
    pub background_workers: usize,
    /// Delay before a file change is reported, letting writers finish.
    pub file_change_delay_ms: u64,
    /// Per-type memory budgets in bytes, keyed by type name. `0` is unlimited.
    pub memory_budgets: BTreeMap<String, u64>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            auto_reload_resources: false,
            return_failed_resources: false,
            search_packages_first: true,
            finish_background_resources_ms: 5,
            background_workers: default_worker_count(),
            file_change_delay_ms: 1000,
            memory_budgets: BTreeMap::new(),
        }
    }
}

impl CacheConfig {
    /// Parses a configuration from RON.
    pub fn from_ron_str(source: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }

    /// The finalize budget as a [`Duration`].
    pub fn finish_background_budget(&self) -> Duration {
        Duration::from_millis(self.finish_background_resources_ms)
    }

    /// The file change delay as a [`Duration`].
    pub fn file_change_delay(&self) -> Duration {
        Duration::from_millis(self.file_change_delay_ms)
    }
}

fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}
