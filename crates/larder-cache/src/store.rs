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

//! The in-memory index of cached resources, with per-type memory accounting.
//!
//! Resources are grouped by type. Each group tracks the memory use of its
//! entries against an optional budget; when a group goes over budget, the
//! least recently used entries that nobody outside the store holds are
//! dropped until it fits again.

use larder_core::{ResourceHandle, ResourceIdentity, ResourceKey, StringHash};
use std::collections::HashMap;
use std::fmt;

#[derive(Default)]
struct ResourceGroup {
    /// Budget in bytes, `0` for unlimited.
    budget: u64,
    memory_use: u64,
    resources: HashMap<StringHash, StoredResource>,
}

/// An indexed entry and the size it was accounted with.
struct StoredResource {
    handle: ResourceHandle,
    accounted: u64,
}

impl ResourceGroup {
    fn over_budget(&self) -> bool {
        self.budget > 0 && self.memory_use > self.budget
    }
}

/// Cached resources indexed by identity.
#[derive(Default)]
pub struct ResourceStore {
    groups: HashMap<StringHash, ResourceGroup>,
    total_memory_use: u64,
    tick: u64,
}

impl ResourceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the logical clock used for LRU ordering.
    pub fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Looks an entry up without counting it as a use.
    pub fn get(&self, key: ResourceKey) -> Option<&ResourceHandle> {
        self.groups
            .get(&key.type_id)?
            .resources
            .get(&key.name_id)
            .map(|stored| &stored.handle)
    }

    /// Looks an entry up and stamps it as the most recently used.
    pub fn get_and_touch(&mut self, key: ResourceKey) -> Option<ResourceHandle> {
        let handle = self.get(key)?.clone();
        handle.touch(self.next_tick());
        Some(handle)
    }

    /// Whether an entry with this key is indexed.
    pub fn contains(&self, key: ResourceKey) -> bool {
        self.get(key).is_some()
    }

    /// Indexes `handle`, replacing any entry with the same identity.
    ///
    /// The inserted entry is stamped as the most recently used. Returns the
    /// replaced entry.
    pub fn insert(&mut self, handle: ResourceHandle) -> Option<ResourceHandle> {
        let key = handle.identity().key();
        handle.touch(self.next_tick());
        let added = handle.memory_use();

        let group = self.groups.entry(key.type_id).or_default();
        let replaced = group.resources.insert(
            key.name_id,
            StoredResource {
                handle,
                accounted: added,
            },
        );
        let removed = replaced.as_ref().map_or(0, |stored| stored.accounted);
        group.memory_use = group.memory_use - removed + added;
        self.total_memory_use = self.total_memory_use - removed + added;
        replaced.map(|stored| stored.handle)
    }

    /// Unindexes an entry. Holders keep their handles.
    pub fn remove(&mut self, key: ResourceKey) -> Option<ResourceHandle> {
        let group = self.groups.get_mut(&key.type_id)?;
        let stored = group.resources.remove(&key.name_id)?;
        group.memory_use -= stored.accounted;
        self.total_memory_use -= stored.accounted;
        Some(stored.handle)
    }

    /// Unindexes every entry of the given type (or of every type) whose
    /// identity matches `predicate`.
    pub fn remove_where(
        &mut self,
        type_id: Option<StringHash>,
        mut predicate: impl FnMut(&ResourceIdentity) -> bool,
    ) -> Vec<ResourceHandle> {
        let keys: Vec<ResourceKey> = self
            .groups
            .iter()
            .filter(|(group_type, _)| type_id.map_or(true, |t| t == **group_type))
            .flat_map(|(_, group)| group.resources.values())
            .map(|stored| &stored.handle)
            .filter(|handle| predicate(handle.identity()))
            .map(|handle| handle.identity().key())
            .collect();
        keys.into_iter().filter_map(|key| self.remove(key)).collect()
    }

    /// Re-reads the memory use of an indexed entry after its payload changed.
    ///
    /// Returns the previously accounted and the new size, or `None` if the
    /// key is not indexed.
    pub fn refresh_memory_use(&mut self, key: ResourceKey) -> Option<(u64, u64)> {
        let group = self.groups.get_mut(&key.type_id)?;
        let stored = group.resources.get_mut(&key.name_id)?;
        let old = stored.accounted;
        let new = stored.handle.memory_use();
        stored.accounted = new;
        group.memory_use = group.memory_use - old + new;
        self.total_memory_use = self.total_memory_use - old + new;
        Some((old, new))
    }

    /// Sets the budget of a type in bytes. `0` means unlimited.
    pub fn set_memory_budget(&mut self, type_id: StringHash, bytes: u64) {
        self.groups.entry(type_id).or_default().budget = bytes;
    }

    /// The budget of a type, `0` if unlimited or never set.
    pub fn memory_budget(&self, type_id: StringHash) -> u64 {
        self.groups.get(&type_id).map_or(0, |g| g.budget)
    }

    /// Bytes used by indexed entries of one type.
    pub fn memory_use(&self, type_id: StringHash) -> u64 {
        self.groups.get(&type_id).map_or(0, |g| g.memory_use)
    }

    /// Bytes used by every indexed entry.
    pub fn total_memory_use(&self) -> u64 {
        self.total_memory_use
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.groups.values().map(|g| g.resources.len()).sum()
    }

    /// `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every indexed entry of one type, in no particular order.
    pub fn resources_of_type(&self, type_id: StringHash) -> Vec<ResourceHandle> {
        self.groups
            .get(&type_id)
            .map(|g| g.resources.values().map(|s| s.handle.clone()).collect())
            .unwrap_or_default()
    }

    /// Identities of indexed entries of any type with the given name.
    pub fn find_by_name(&self, name_id: StringHash) -> Vec<ResourceIdentity> {
        self.groups
            .values()
            .filter_map(|g| g.resources.get(&name_id))
            .map(|stored| stored.handle.identity().clone())
            .collect()
    }

    /// Every indexed entry.
    pub fn handles(&self) -> impl Iterator<Item = &ResourceHandle> {
        self.groups
            .values()
            .flat_map(|g| g.resources.values().map(|s| &s.handle))
    }

    /// Evicts entries of one type until it fits its budget.
    ///
    /// Only entries held by the store alone are candidates, oldest
    /// `last_used_tick` first. If the remaining entries are all held elsewhere
    /// the group stays over budget.
    pub fn evict(&mut self, type_id: StringHash) -> Vec<ResourceHandle> {
        let Some(group) = self.groups.get(&type_id) else {
            return Vec::new();
        };
        if !group.over_budget() {
            return Vec::new();
        }

        let mut candidates: Vec<(u64, ResourceKey)> = group
            .resources
            .values()
            .map(|stored| &stored.handle)
            .filter(|handle| handle.holders() == 1)
            .map(|handle| (handle.last_used_tick(), handle.identity().key()))
            .collect();
        candidates.sort_unstable_by_key(|(tick, _)| *tick);

        let mut evicted = Vec::new();
        for (_, key) in candidates {
            if !self.groups.get(&type_id).is_some_and(ResourceGroup::over_budget) {
                break;
            }
            if let Some(handle) = self.remove(key) {
                log::debug!(
                    "Evicted '{}' ({} bytes) to fit the {} budget.",
                    handle.identity(),
                    handle.memory_use(),
                    handle.identity().type_name()
                );
                evicted.push(handle);
            }
        }
        evicted
    }

    /// Runs [`evict`](Self::evict) on every group that is over budget.
    pub fn evict_all_over_budget(&mut self) -> Vec<ResourceHandle> {
        let over: Vec<StringHash> = self
            .groups
            .iter()
            .filter(|(_, g)| g.over_budget())
            .map(|(t, _)| *t)
            .collect();
        over.into_iter().flat_map(|t| self.evict(t)).collect()
    }

    /// Builds a per-type usage report by rescanning every entry.
    pub fn report(&self) -> MemoryReport {
        let mut types: Vec<TypeMemoryUsage> = self
            .groups
            .iter()
            .filter(|(_, g)| !g.resources.is_empty() || g.budget > 0)
            .map(|(type_id, group)| {
                let mut usage = TypeMemoryUsage {
                    type_name: group
                        .resources
                        .values()
                        .next()
                        .map(|s| s.handle.identity().type_name().to_string())
                        .unwrap_or_else(|| format!("#{type_id}")),
                    count: group.resources.len(),
                    memory_use: 0,
                    budget: group.budget,
                    largest: None,
                };
                for stored in group.resources.values() {
                    let size = stored.accounted;
                    usage.memory_use += size;
                    if usage.largest.as_ref().map_or(true, |(_, s)| size > *s) {
                        usage.largest = Some((stored.handle.name().to_string(), size));
                    }
                }
                usage
            })
            .collect();
        types.sort_by(|a, b| a.type_name.cmp(&b.type_name));
        let total_memory_use = types.iter().map(|t| t.memory_use).sum();
        MemoryReport {
            types,
            total_memory_use,
        }
    }
}

/// Memory usage of one resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMemoryUsage {
    /// The type name.
    pub type_name: String,
    /// Number of indexed entries.
    pub count: usize,
    /// Bytes used by those entries.
    pub memory_use: u64,
    /// Budget, `0` if unlimited.
    pub budget: u64,
    /// Name and size of the largest entry.
    pub largest: Option<(String, u64)>,
}

impl TypeMemoryUsage {
    /// Average entry size in bytes.
    pub fn average(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.memory_use / self.count as u64
        }
    }
}

/// A snapshot of cache memory usage, one row per type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryReport {
    /// Rows sorted by type name.
    pub types: Vec<TypeMemoryUsage>,
    /// Sum of all rows.
    pub total_memory_use: u64,
}

impl fmt::Display for MemoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<24} {:>6} {:>12} {:>12} {:>12}  largest",
            "type", "count", "memory", "average", "budget"
        )?;
        for row in &self.types {
            let budget = if row.budget == 0 {
                "-".to_string()
            } else {
                row.budget.to_string()
            };
            let largest = row
                .largest
                .as_ref()
                .map(|(name, size)| format!("{name} ({size})"))
                .unwrap_or_default();
            writeln!(
                f,
                "{:<24} {:>6} {:>12} {:>12} {:>12}  {}",
                row.type_name,
                row.count,
                row.memory_use,
                row.average(),
                budget,
                largest
            )?;
        }
        write!(f, "total memory use: {} bytes", self.total_memory_use)
    }
}
