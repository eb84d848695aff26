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

//! The dependency graph between cached resources.
//!
//! Edges point from a dependent (a material) to its dependencies (the
//! textures it samples). Edges are recorded while the dependent is decoded
//! and are what a reload walks to refresh everything built on top of a
//! changed resource. Plain files that are not resources themselves (an
//! included shader chunk) take part through [`file_identity`].

use larder_core::{ResourceIdentity, ResourceKey};
use std::collections::{HashMap, HashSet, VecDeque};

/// The identity standing for a plain file in the dependency graph.
///
/// File identities have an empty type name, so they never collide with a
/// decodable resource and are never found in the store.
pub fn file_identity(name: &str) -> ResourceIdentity {
    ResourceIdentity::new("", name)
}

/// Bidirectional dependency edges plus the stack of dependents being decoded.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    /// dependent -> the resources it depends on.
    dependencies: HashMap<ResourceKey, HashSet<ResourceIdentity>>,
    /// dependency -> the resources that depend on it.
    dependents: HashMap<ResourceKey, HashSet<ResourceIdentity>>,
    scopes: Vec<ResourceIdentity>,
}

impl DependencyTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts recording the dependencies of `dependent`.
    ///
    /// The previous edges of `dependent` are cleared first, so a reload whose
    /// new version no longer references something drops that edge.
    pub fn begin_scope(&mut self, dependent: &ResourceIdentity) {
        self.reset_dependencies(dependent);
        self.scopes.push(dependent.clone());
    }

    /// Adds an edge from the innermost open scope to `dependency`.
    ///
    /// Returns `false` (and records nothing) outside of any scope.
    pub fn record(&mut self, dependency: &ResourceIdentity) -> bool {
        let Some(dependent) = self.scopes.last().cloned() else {
            log::warn!("Dependency '{dependency}' recorded outside of a decode scope, ignoring.");
            return false;
        };
        self.add_dependency(&dependent, dependency);
        true
    }

    /// Closes the innermost scope.
    pub fn end_scope(&mut self) -> Option<ResourceIdentity> {
        self.scopes.pop()
    }

    /// Adds an edge directly. Duplicate edges are ignored; self edges are rejected.
    pub fn add_dependency(&mut self, dependent: &ResourceIdentity, dependency: &ResourceIdentity) {
        if dependent == dependency {
            log::warn!("Ignoring self dependency of '{dependent}'.");
            return;
        }
        self.dependencies
            .entry(dependent.key())
            .or_default()
            .insert(dependency.clone());
        self.dependents
            .entry(dependency.key())
            .or_default()
            .insert(dependent.clone());
    }

    /// Removes every edge from `dependent` to its dependencies.
    pub fn reset_dependencies(&mut self, dependent: &ResourceIdentity) {
        let Some(dependencies) = self.dependencies.remove(&dependent.key()) else {
            return;
        };
        for dependency in dependencies {
            if let Some(dependents) = self.dependents.get_mut(&dependency.key()) {
                dependents.remove(dependent);
                if dependents.is_empty() {
                    self.dependents.remove(&dependency.key());
                }
            }
        }
    }

    /// What `dependent` depends on, sorted by name.
    pub fn dependencies_of(&self, dependent: &ResourceIdentity) -> Vec<ResourceIdentity> {
        sorted(self.dependencies.get(&dependent.key()))
    }

    /// What depends directly on `dependency`, sorted by name.
    pub fn dependents_of(&self, dependency: &ResourceIdentity) -> Vec<ResourceIdentity> {
        sorted(self.dependents.get(&dependency.key()))
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(HashSet::len).sum()
    }

    /// Everything that transitively depends on `changed`, in breadth-first order.
    ///
    /// `changed` itself is not included. Dependents for which `is_live`
    /// returns `false` are no longer cached: their edges are dropped and the
    /// walk does not continue through them. Each resource appears once even
    /// when the graph has cycles.
    pub fn cascade_set(
        &mut self,
        changed: &ResourceIdentity,
        is_live: impl Fn(&ResourceIdentity) -> bool,
    ) -> Vec<ResourceIdentity> {
        let mut visited: HashSet<ResourceKey> = HashSet::from([changed.key()]);
        let mut queue: VecDeque<ResourceIdentity> = VecDeque::from([changed.clone()]);
        let mut cascade = Vec::new();

        while let Some(current) = queue.pop_front() {
            for dependent in self.dependents_of(&current) {
                if !is_live(&dependent) {
                    log::trace!("Dropping edges of '{dependent}': no longer cached.");
                    self.reset_dependencies(&dependent);
                    continue;
                }
                if visited.insert(dependent.key()) {
                    cascade.push(dependent.clone());
                    queue.push_back(dependent);
                }
            }
        }
        cascade
    }

    /// The order in which `changed` and its cascade set should be reloaded.
    ///
    /// Dependencies come before their dependents. On a cycle the breadth-first
    /// order of `cascade` is used instead.
    pub fn reload_order(
        &self,
        changed: &ResourceIdentity,
        cascade: &[ResourceIdentity],
    ) -> Vec<ResourceIdentity> {
        let nodes: Vec<ResourceIdentity> = std::iter::once(changed.clone())
            .chain(cascade.iter().cloned())
            .collect();
        let by_key: HashMap<ResourceKey, &ResourceIdentity> =
            nodes.iter().map(|id| (id.key(), id)).collect();

        let mut edges: Vec<(ResourceKey, ResourceKey)> = Vec::new();
        for node in &nodes {
            for dependent in self.dependents.get(&node.key()).into_iter().flatten() {
                if by_key.contains_key(&dependent.key()) {
                    edges.push((node.key(), dependent.key()));
                }
            }
        }

        match topological_sort(nodes.iter().map(ResourceIdentity::key), edges) {
            Ok(order) => order
                .into_iter()
                .filter_map(|key| by_key.get(&key).map(|id| (*id).clone()))
                .collect(),
            Err(CycleError) => {
                log::warn!(
                    "Dependency cycle below '{changed}', reloading in discovery order."
                );
                nodes
            }
        }
    }
}

fn sorted(set: Option<&HashSet<ResourceIdentity>>) -> Vec<ResourceIdentity> {
    let mut items: Vec<ResourceIdentity> = set.into_iter().flatten().cloned().collect();
    items.sort_by(|a, b| (a.type_name(), a.name()).cmp(&(b.type_name(), b.name())));
    items
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CycleError;

/// Kahn's algorithm over `(dependency, dependent)` edges.
///
/// Nodes with equal standing keep the order they were given in.
fn topological_sort(
    nodes: impl IntoIterator<Item = ResourceKey>,
    edges: impl IntoIterator<Item = (ResourceKey, ResourceKey)>,
) -> Result<Vec<ResourceKey>, CycleError> {
    let node_list: Vec<ResourceKey> = nodes.into_iter().collect();
    let mut adjacency: HashMap<ResourceKey, Vec<ResourceKey>> = HashMap::new();
    let mut in_degree: HashMap<ResourceKey, usize> = node_list.iter().map(|k| (*k, 0)).collect();

    for (parent, child) in edges {
        adjacency.entry(parent).or_default().push(child);
        if let Some(degree) = in_degree.get_mut(&child) {
            *degree += 1;
        }
    }

    let mut queue: VecDeque<ResourceKey> = node_list
        .iter()
        .filter(|k| in_degree.get(k).copied().unwrap_or(0) == 0)
        .copied()
        .collect();

    let mut sorted_list = Vec::with_capacity(node_list.len());
    while let Some(parent) = queue.pop_front() {
        sorted_list.push(parent);
        for child in adjacency.get(&parent).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(child) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(*child);
                }
            }
        }
    }

    if sorted_list.len() == node_list.len() {
        Ok(sorted_list)
    } else {
        Err(CycleError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::identify;

    fn names(ids: &[ResourceIdentity]) -> Vec<&str> {
        ids.iter().map(|id| id.name()).collect()
    }

    /// A depends on B, B depends on C, D is unrelated.
    fn chain() -> DependencyTracker {
        let mut tracker = DependencyTracker::new();
        tracker.add_dependency(&identify("Scene", "A"), &identify("Material", "B"));
        tracker.add_dependency(&identify("Material", "B"), &identify("Texture", "C"));
        tracker.add_dependency(&identify("Scene", "D"), &identify("Texture", "E"));
        tracker
    }

    #[test]
    fn test_cascade_walks_dependents_transitively() {
        let mut tracker = chain();
        let cascade = tracker.cascade_set(&identify("Texture", "C"), |_| true);
        assert_eq!(names(&cascade), vec!["B", "A"]);

        let order = tracker.reload_order(&identify("Texture", "C"), &cascade);
        assert_eq!(names(&order), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_scope_replaces_previous_edges() {
        let mut tracker = chain();
        let material = identify("Material", "B");
        tracker.begin_scope(&material);
        assert!(tracker.record(&identify("Texture", "F")));
        assert_eq!(tracker.end_scope(), Some(material.clone()));

        assert_eq!(names(&tracker.dependencies_of(&material)), vec!["F"]);
        assert!(tracker.dependents_of(&identify("Texture", "C")).is_empty());
        assert!(!tracker.record(&identify("Texture", "G")));
    }

    #[test]
    fn test_duplicate_edges_are_idempotent() {
        let mut tracker = DependencyTracker::new();
        let a = identify("Material", "a");
        let t = identify("Texture", "t");
        tracker.add_dependency(&a, &t);
        tracker.add_dependency(&a, &identify("texture", "./t"));
        assert_eq!(tracker.edge_count(), 1);
    }

    #[test]
    fn test_stale_dependents_are_pruned() {
        let mut tracker = chain();
        let a = identify("Scene", "A");
        let cascade = tracker.cascade_set(&identify("Texture", "C"), |id| *id != a);
        assert_eq!(names(&cascade), vec!["B"]);
        assert!(tracker.dependencies_of(&a).is_empty());
        assert_eq!(tracker.edge_count(), 2);
    }

    #[test]
    fn test_cycles_terminate() {
        let mut tracker = DependencyTracker::new();
        let a = identify("Material", "a");
        let b = identify("Material", "b");
        tracker.add_dependency(&a, &b);
        tracker.add_dependency(&b, &a);

        let cascade = tracker.cascade_set(&a, |_| true);
        assert_eq!(names(&cascade), vec!["b"]);
        assert_eq!(names(&tracker.reload_order(&a, &cascade)), vec!["a", "b"]);
    }

    #[test]
    fn test_diamond_reloads_shared_dependent_after_both_parents() {
        let mut tracker = DependencyTracker::new();
        let texture = identify("Texture", "t");
        let left = identify("Material", "left");
        let right = identify("Material", "right");
        let scene = identify("Scene", "s");
        tracker.add_dependency(&left, &texture);
        tracker.add_dependency(&right, &texture);
        tracker.add_dependency(&scene, &left);
        tracker.add_dependency(&scene, &right);
        tracker.add_dependency(&right, &left);

        let cascade = tracker.cascade_set(&texture, |_| true);
        let order = tracker.reload_order(&texture, &cascade);
        assert_eq!(names(&order), vec!["t", "left", "right", "s"]);
    }

    #[test]
    fn test_file_identities_do_not_collide_with_resources() {
        assert_ne!(file_identity("a.glsl"), identify("Shader", "a.glsl"));
        assert_eq!(file_identity("./a.glsl"), file_identity("a.glsl"));
    }
}
