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

//! # Larder Cache
//!
//! The resource cache proper. A [`ResourceCache`] maps `(type, name)`
//! identities to shared [`ResourceHandle`](larder_core::ResourceHandle)s,
//! decodes missing resources through registered [`ResourceDecoder`]s either
//! inline or on a worker pool, keeps each type under its memory budget,
//! tracks which resources were built from which, and reloads them in place
//! when their files change.

#![warn(missing_docs)]

pub mod cache;
pub mod decoder;
pub mod dependency;
pub mod loader;
pub mod locator;
pub mod reload;
pub mod store;

pub use cache::ResourceCache;
pub use decoder::{DecodeContext, DecoderRegistry, ResourceDecoder};
pub use dependency::{file_identity, DependencyTracker};
pub use loader::{BackgroundLoader, PendingResource};
pub use reload::WatcherSet;
pub use store::{MemoryReport, ResourceStore, TypeMemoryUsage};

pub use larder_core::{
    identify, AsyncLoadState, CacheConfig, DecodeError, ErasedResource, LoadError, Resource,
    ResourceHandle, ResourceIdentity,
};
pub use larder_io::ByteSource;
