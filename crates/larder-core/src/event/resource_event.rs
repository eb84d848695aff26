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

use crate::identity::ResourceIdentity;

/// Lifecycle notifications emitted by the resource cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    /// A reload of a cached resource is starting.
    ReloadStarted(ResourceIdentity),
    /// A reload completed and the new payload is installed.
    ReloadFinished(ResourceIdentity),
    /// A reload failed; the previous payload is kept.
    ReloadFailed(ResourceIdentity),
    /// A watched file changed on disk.
    FileChanged {
        /// Absolute path of the changed file.
        file_name: String,
        /// The file name relative to its resource directory.
        resource_name: String,
    },
    /// Decoding a resource failed.
    LoadFailed {
        /// The resource that failed.
        identity: ResourceIdentity,
        /// The decoder's message.
        reason: String,
    },
    /// The resolver did not find the resource.
    ResourceNotFound(ResourceIdentity),
    /// No decoder is registered for the requested type.
    UnknownResourceType(ResourceIdentity),
    /// A background load was finalized.
    BackgroundLoaded {
        /// The resource that was loaded.
        identity: ResourceIdentity,
        /// Whether an entry with a payload was installed.
        success: bool,
    },
}

impl ResourceEvent {
    /// The identity the event refers to, if it refers to one.
    pub fn identity(&self) -> Option<&ResourceIdentity> {
        match self {
            ResourceEvent::ReloadStarted(id)
            | ResourceEvent::ReloadFinished(id)
            | ResourceEvent::ReloadFailed(id)
            | ResourceEvent::ResourceNotFound(id)
            | ResourceEvent::UnknownResourceType(id) => Some(id),
            ResourceEvent::LoadFailed { identity, .. }
            | ResourceEvent::BackgroundLoaded { identity, .. } => Some(identity),
            ResourceEvent::FileChanged { .. } => None,
        }
    }
}

/// A fire-and-forget consumer of [`ResourceEvent`]s.
pub trait ResourceEventSink: Send + Sync {
    /// Delivers one event. Must not block.
    fn notify(&self, event: ResourceEvent);
}

impl ResourceEventSink for flume::Sender<ResourceEvent> {
    fn notify(&self, event: ResourceEvent) {
        if self.send(event).is_err() {
            log::trace!("Dropping resource event: receiver disconnected.");
        }
    }
}

/// A sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ResourceEventSink for NullSink {
    fn notify(&self, _event: ResourceEvent) {}
}
