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

//! Resource lifecycle notifications.
//!
//! The cache reports what happens to resources (reloads, failures, background
//! completions, file changes) through a [`ResourceEventSink`]. Delivery is
//! fire-and-forget. The default sink is an [`EventBus`], a generic MPSC channel
//! whose receiver the owner drains at its own pace.

mod bus;
mod resource_event;

pub use self::bus::EventBus;
pub use self::resource_event::{NullSink, ResourceEvent, ResourceEventSink};
