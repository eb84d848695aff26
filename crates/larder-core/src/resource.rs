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

//! Resource payloads, cache entries and the handles callers hold on to.

use crate::identity::ResourceIdentity;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// A marker trait for types that can be stored in the resource cache.
///
/// The supertraits allow a decoded resource to be built on a background
/// worker and then shared between threads. `TYPE_NAME` is the name the type's
/// decoder is registered under and the name hashed into its identities.
///
/// # Examples
///
/// ```
/// use larder_core::resource::Resource;
///
/// struct Texture {
///     pixels: Vec<u8>,
/// }
///
/// impl Resource for Texture {
///     const TYPE_NAME: &'static str = "Texture";
///
///     fn memory_use(&self) -> u64 {
///         self.pixels.len() as u64
///     }
/// }
/// ```
pub trait Resource: Send + Sync + 'static {
    /// The resource type name.
    const TYPE_NAME: &'static str;

    /// Approximate number of bytes this resource keeps alive.
    ///
    /// Used for per-type memory budgets. Defaults to the shallow size of the value.
    fn memory_use(&self) -> u64 {
        std::mem::size_of_val(self) as u64
    }
}

/// A type-erased, decoded resource together with its memory footprint.
#[derive(Clone)]
pub struct ErasedResource {
    payload: Arc<dyn Any + Send + Sync>,
    memory_use: u64,
}

impl ErasedResource {
    /// Erases a typed resource, capturing its memory use.
    pub fn new<T: Resource>(resource: T) -> Self {
        let memory_use = resource.memory_use();
        Self {
            payload: Arc::new(resource),
            memory_use,
        }
    }

    /// Erases an arbitrary value with an explicit memory use.
    pub fn from_any(payload: Arc<dyn Any + Send + Sync>, memory_use: u64) -> Self {
        Self {
            payload,
            memory_use,
        }
    }

    /// The recorded memory use in bytes.
    pub fn memory_use(&self) -> u64 {
        self.memory_use
    }

    /// Returns the payload as `T`, if it is one.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.payload.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for ErasedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedResource")
            .field("memory_use", &self.memory_use)
            .finish_non_exhaustive()
    }
}

/// The state of an asynchronous load.
///
/// States only ever move forward: `Queued → Loading → Success | Fail → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AsyncLoadState {
    /// Accepted, not yet picked up by a worker.
    Queued = 0,
    /// A worker is resolving and decoding.
    Loading = 1,
    /// Decoded, waiting for finalize.
    Success = 2,
    /// Failed, waiting for finalize.
    Fail = 3,
    /// Finalized. Terminal.
    Done = 4,
}

impl AsyncLoadState {
    fn rank(self) -> u8 {
        match self {
            AsyncLoadState::Queued => 0,
            AsyncLoadState::Loading => 1,
            AsyncLoadState::Success | AsyncLoadState::Fail => 2,
            AsyncLoadState::Done => 3,
        }
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_transition_to(self, next: AsyncLoadState) -> bool {
        matches!(
            (self, next),
            (AsyncLoadState::Queued, AsyncLoadState::Loading)
                | (AsyncLoadState::Loading, AsyncLoadState::Success)
                | (AsyncLoadState::Loading, AsyncLoadState::Fail)
                | (AsyncLoadState::Success, AsyncLoadState::Done)
                | (AsyncLoadState::Fail, AsyncLoadState::Done)
        )
    }

    /// Whether the state has reached or passed `other`.
    pub fn is_at_least(self, other: AsyncLoadState) -> bool {
        self.rank() >= other.rank()
    }

    /// Converts the `repr(u8)` value back to a state.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AsyncLoadState::Queued),
            1 => Some(AsyncLoadState::Loading),
            2 => Some(AsyncLoadState::Success),
            3 => Some(AsyncLoadState::Fail),
            4 => Some(AsyncLoadState::Done),
            _ => None,
        }
    }
}

/// A cached resource.
///
/// Entries are owned by the resource store and shared with callers through
/// [`ResourceHandle`]. The payload can be swapped in place on reload, so a
/// handle always observes the latest successfully loaded data.
pub struct ResourceEntry {
    identity: ResourceIdentity,
    payload: RwLock<Option<ErasedResource>>,
    memory_use: AtomicU64,
    last_used_tick: AtomicU64,
    generation: AtomicU32,
}

impl ResourceEntry {
    fn build(identity: ResourceIdentity, payload: Option<ErasedResource>) -> Self {
        let memory_use = payload.as_ref().map_or(0, ErasedResource::memory_use);
        Self {
            identity,
            payload: RwLock::new(payload),
            memory_use: AtomicU64::new(memory_use),
            last_used_tick: AtomicU64::new(0),
            generation: AtomicU32::new(0),
        }
    }
}

/// A shared, reference-counted view of a cached resource.
///
/// Cloning a handle is cheap. A handle stays valid after the store drops its
/// own reference (on release or eviction); the payload is destroyed when the
/// last handle goes away.
#[derive(Clone)]
pub struct ResourceHandle(Arc<ResourceEntry>);

impl ResourceHandle {
    /// Wraps a decoded resource in a new entry.
    pub fn new(identity: ResourceIdentity, resource: ErasedResource) -> Self {
        Self(Arc::new(ResourceEntry::build(identity, Some(resource))))
    }

    /// Creates an empty placeholder standing in for a resource that failed to load.
    pub fn failed(identity: ResourceIdentity) -> Self {
        Self(Arc::new(ResourceEntry::build(identity, None)))
    }

    /// The identity of the resource.
    pub fn identity(&self) -> &ResourceIdentity {
        &self.0.identity
    }

    /// The resource name.
    pub fn name(&self) -> &str {
        self.0.identity.name()
    }

    /// Returns the payload as `T`, or `None` for placeholders and type mismatches.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.read_payload().as_ref().and_then(|p| p.downcast::<T>())
    }

    /// Returns the type-erased payload.
    pub fn erased(&self) -> Option<ErasedResource> {
        self.read_payload().clone()
    }

    /// `true` if this is a placeholder for a failed load.
    pub fn is_failed(&self) -> bool {
        self.read_payload().is_none()
    }

    /// The memory use currently recorded for this entry.
    pub fn memory_use(&self) -> u64 {
        self.0.memory_use.load(Ordering::Acquire)
    }

    /// The logical tick of the last cache access.
    pub fn last_used_tick(&self) -> u64 {
        self.0.last_used_tick.load(Ordering::Acquire)
    }

    /// Number of times the payload was replaced by a reload.
    pub fn generation(&self) -> u32 {
        self.0.generation.load(Ordering::Acquire)
    }

    /// The load state of the entry: `Done` once it holds a payload, `Fail`
    /// while it is a placeholder.
    pub fn async_state(&self) -> AsyncLoadState {
        if self.is_failed() {
            AsyncLoadState::Fail
        } else {
            AsyncLoadState::Done
        }
    }

    /// `true` if both handles point at the same entry.
    pub fn ptr_eq(&self, other: &ResourceHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Number of live handles to this entry, the store's own included.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// Records an access at `tick`.
    pub fn touch(&self, tick: u64) {
        self.0.last_used_tick.store(tick, Ordering::Release);
    }

    /// Swaps in a reloaded payload and returns the previous memory use.
    ///
    /// Reserved for the cache's reload path, which re-accounts the entry
    /// afterwards. A store keeps the size it accounted at insertion, so a
    /// swap made elsewhere is not reflected in its counters until the
    /// entry is reloaded or replaced.
    #[doc(hidden)]
    pub fn replace_payload(&self, resource: ErasedResource) -> u64 {
        let new_use = resource.memory_use();
        let mut payload = self
            .0
            .payload
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *payload = Some(resource);
        self.0.generation.fetch_add(1, Ordering::AcqRel);
        self.0.memory_use.swap(new_use, Ordering::AcqRel)
    }

    fn read_payload(&self) -> std::sync::RwLockReadGuard<'_, Option<ErasedResource>> {
        self.0
            .payload
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("identity", &self.0.identity)
            .field("memory_use", &self.memory_use())
            .field("failed", &self.is_failed())
            .finish()
    }
}
