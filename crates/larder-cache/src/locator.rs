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

//! An optional process-wide cache.
//!
//! Code that cannot thread a `&mut ResourceCache` through (scripting glue,
//! debug consoles) can reach a cache installed here. Nothing in the crate
//! depends on it; a cache works the same whether or not it is installed.

use crate::cache::ResourceCache;
use std::sync::{Mutex, MutexGuard};

static GLOBAL_CACHE: Mutex<Option<ResourceCache>> = Mutex::new(None);

fn lock() -> MutexGuard<'static, Option<ResourceCache>> {
    GLOBAL_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Installs `cache` as the global cache, returning the one it replaces.
pub fn install(cache: ResourceCache) -> Option<ResourceCache> {
    log::debug!("Installing global resource cache.");
    lock().replace(cache)
}

/// Removes and returns the global cache.
pub fn uninstall() -> Option<ResourceCache> {
    lock().take()
}

/// Returns `true` if a global cache is installed.
pub fn is_installed() -> bool {
    lock().is_some()
}

/// Runs `f` on the global cache. Returns `None` if none is installed.
///
/// The cache stays locked for the duration of `f`; calling back into this
/// module from `f` deadlocks.
pub fn with_global_cache<R>(f: impl FnOnce(&mut ResourceCache) -> R) -> Option<R> {
    lock().as_mut().map(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::{CacheConfig, Resource};

    struct Flag(bool);

    impl Resource for Flag {
        const TYPE_NAME: &'static str = "Flag";
    }

    #[test]
    fn test_global_cache_lifecycle() {
        assert!(with_global_cache(|_| ()).is_none());

        let cache = ResourceCache::new(CacheConfig {
            background_workers: 0,
            ..CacheConfig::default()
        });
        assert!(install(cache).is_none());
        assert!(is_installed());

        let count = with_global_cache(|cache| {
            cache.add_manual("debug/flag", Flag(true)).unwrap();
            cache.resource_count()
        });
        assert_eq!(count, Some(1));

        let cache = uninstall().unwrap();
        assert!(cache.get_existing("Flag", "debug/flag").unwrap().get::<Flag>().unwrap().0);
        assert!(!is_installed());
    }
}
