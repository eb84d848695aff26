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

//! Resource identities: the (type, name) pair every cached resource is indexed by.

use crate::hash::StringHash;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The copyable part of a [`ResourceIdentity`], used as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Hash of the resource type name.
    pub type_id: StringHash,
    /// Hash of the normalized resource name.
    pub name_id: StringHash,
}

/// The identity of a named, typed resource.
///
/// Two identities are equal when their type and name hashes are equal; the
/// human-readable strings are carried along for diagnostics and for the
/// resolver, which needs the name to locate bytes.
///
/// Cloning is cheap: the strings are shared.
#[derive(Clone)]
pub struct ResourceIdentity {
    key: ResourceKey,
    type_name: Arc<str>,
    name: Arc<str>,
}

impl ResourceIdentity {
    /// Builds the identity of the resource `name` of type `type_name`.
    ///
    /// The name is normalized with [`normalize_name`] before hashing. This
    /// never fails; names that would escape the resource roots are rejected
    /// later, by the resolver.
    pub fn new(type_name: &str, name: &str) -> Self {
        let name = normalize_name(name);
        Self {
            key: ResourceKey {
                type_id: StringHash::new(type_name),
                name_id: StringHash::new(&name),
            },
            type_name: Arc::from(type_name),
            name: Arc::from(name.as_str()),
        }
    }

    /// The map key of this identity.
    pub fn key(&self) -> ResourceKey {
        self.key
    }

    /// Hash of the type name.
    pub fn type_id(&self) -> StringHash {
        self.key.type_id
    }

    /// Hash of the normalized name.
    pub fn name_id(&self) -> StringHash {
        self.key.name_id
    }

    /// The type name this identity was created with.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The normalized resource name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Shorthand for [`ResourceIdentity::new`].
pub fn identify(type_name: &str, resource_name: &str) -> ResourceIdentity {
    ResourceIdentity::new(type_name, resource_name)
}

/// Lightweight, infallible name normalization used for identities.
///
/// Backslashes become forward slashes, surrounding whitespace is trimmed and
/// any number of leading `./` segments are removed.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = name.trim().replace('\\', "/");
    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest.to_string();
    }
    normalized
}

impl PartialEq for ResourceIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ResourceIdentity {}

impl Hash for ResourceIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceIdentity")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.type_name, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identify_is_deterministic() {
        let a = identify("Texture", "tex.png");
        let b = identify("Texture", "tex.png");
        assert_eq!(a, b);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_identity_normalizes_separators_and_dot_prefix() {
        let a = identify("Texture", ".\\textures\\wall.png");
        let b = identify("Texture", "textures/wall.png");
        assert_eq!(a, b);
        assert_eq!(a.name(), "textures/wall.png");
    }

    #[test]
    fn test_same_name_different_type_differs() {
        let a = identify("Texture", "thing");
        let b = identify("Model", "thing");
        assert_ne!(a, b);
        assert_eq!(a.name_id(), b.name_id());
    }

    #[test]
    fn test_identity_usable_in_sets() {
        let mut set = HashSet::new();
        set.insert(identify("Texture", "A.png"));
        set.insert(identify("texture", "a.PNG"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_display_contains_type_and_name() {
        assert_eq!(identify("Xml", "ui/menu.xml").to_string(), "Xml:ui/menu.xml");
    }
}
