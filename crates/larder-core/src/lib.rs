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

//! # Larder Core
//!
//! Foundational crate of the Larder resource cache: resource identities,
//! handles, the error taxonomy, lifecycle events and configuration. It knows
//! nothing about files or decoding.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod event;
pub mod hash;
pub mod identity;
pub mod resource;

pub use config::CacheConfig;
pub use error::{DecodeError, LoadError, ResolveError};
pub use hash::StringHash;
pub use identity::{identify, ResourceIdentity, ResourceKey};
pub use resource::{AsyncLoadState, ErasedResource, Resource, ResourceHandle};
