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

use super::{ResourceEvent, ResourceEventSink};

/// An unbounded, thread-safe event channel.
///
/// The bus is generic over the event type so tools can reuse it for their own
/// notifications; the cache uses `EventBus<ResourceEvent>` as its default sink.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Clone + Send + 'static> EventBus<T> {
    /// Creates a bus backed by an unbounded channel.
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        log::debug!("EventBus initialized.");
        Self { sender, receiver }
    }

    /// Sends an event. Never blocks; the receiver half lives in the bus, so
    /// the send can only fail while the bus is being torn down.
    pub fn publish(&self, event: T) {
        if let Err(e) = self.sender.send(event) {
            log::error!("Failed to publish event: {e}.");
        }
    }

    /// Returns a clone of the sending half.
    pub fn sender(&self) -> flume::Sender<T> {
        self.sender.clone()
    }

    /// Returns the receiving half.
    pub fn receiver(&self) -> &flume::Receiver<T> {
        &self.receiver
    }

    /// Takes every event published so far, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// Number of events waiting to be received.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl<T: Clone + Send + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceEventSink for EventBus<ResourceEvent> {
    fn notify(&self, event: ResourceEvent) {
        self.publish(event);
    }
}
