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

//! Background loading.
//!
//! A background load runs in two phases. Workers resolve and decode
//! (`Queued → Loading → Success | Fail`); the owner later finalizes the
//! result into the store (`→ Done`). Finished tasks come back through a
//! channel and are finalized in the order they finished.

use crate::decoder::{decode_resource, AnyDecoder, DecodeContext};
use crossbeam_channel::{Receiver, Sender};
use larder_core::{
    AsyncLoadState, ErasedResource, LoadError, ResourceHandle, ResourceIdentity, ResourceKey,
};
use larder_io::SearchPathResolver;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread;

struct PendingShared {
    identity: ResourceIdentity,
    state: AtomicU8,
    cancelled: AtomicBool,
    result: OnceLock<Result<ResourceHandle, LoadError>>,
}

/// A handle on a background load.
///
/// Cheap to clone and safe to poll from any thread. The result becomes
/// available once the owner of the cache has finalized the load.
#[derive(Clone)]
pub struct PendingResource {
    shared: Arc<PendingShared>,
}

impl PendingResource {
    fn with_state(identity: ResourceIdentity, state: AsyncLoadState) -> Self {
        Self {
            shared: Arc::new(PendingShared {
                identity,
                state: AtomicU8::new(state as u8),
                cancelled: AtomicBool::new(false),
                result: OnceLock::new(),
            }),
        }
    }

    pub(crate) fn queued(identity: ResourceIdentity) -> Self {
        Self::with_state(identity, AsyncLoadState::Queued)
    }

    /// A load that needed no background work.
    pub(crate) fn completed(identity: ResourceIdentity, result: Result<ResourceHandle, LoadError>) -> Self {
        let pending = Self::with_state(identity, AsyncLoadState::Done);
        let _ = pending.shared.result.set(result);
        pending
    }

    /// The resource being loaded.
    pub fn identity(&self) -> &ResourceIdentity {
        &self.shared.identity
    }

    /// The current state.
    pub fn state(&self) -> AsyncLoadState {
        AsyncLoadState::from_u8(self.shared.state.load(Ordering::Acquire))
            .unwrap_or(AsyncLoadState::Done)
    }

    /// `true` once the load has been finalized.
    pub fn is_done(&self) -> bool {
        self.state() == AsyncLoadState::Done
    }

    /// Requests cancellation. The decode may still run to completion, but the
    /// result is discarded when finalized and nothing enters the store.
    pub fn cancel(&self) {
        self.shared.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    /// The outcome, once finalized.
    pub fn result(&self) -> Option<Result<ResourceHandle, LoadError>> {
        self.shared.result.get().cloned()
    }

    /// Whether both values track the same load.
    pub fn ptr_eq(&self, other: &PendingResource) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    /// Moves forward to `next`. Illegal transitions are refused.
    pub(crate) fn advance(&self, next: AsyncLoadState) -> bool {
        let mut current = self.shared.state.load(Ordering::Acquire);
        loop {
            let allowed = AsyncLoadState::from_u8(current)
                .is_some_and(|state| state.can_transition_to(next));
            if !allowed {
                return false;
            }
            match self.shared.state.compare_exchange_weak(
                current,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Publishes the outcome and marks the load `Done`.
    pub(crate) fn finish(&self, result: Result<ResourceHandle, LoadError>) {
        let _ = self.shared.result.set(result);
        self.advance(AsyncLoadState::Done);
    }
}

impl std::fmt::Debug for PendingResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingResource")
            .field("identity", self.identity())
            .field("state", &self.state())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

pub(crate) type DecodeOutcome = Result<(ErasedResource, DecodeContext), LoadError>;

/// One background request travelling from the owner to a worker and back.
pub(crate) struct LoadTask {
    pub(crate) pending: PendingResource,
    pub(crate) send_failure_event: bool,
    pub(crate) outcome: Option<DecodeOutcome>,
    decoder: Arc<dyn AnyDecoder>,
}

/// Phase one of a background load. Panicking decoders count as failures.
fn run_task(mut task: LoadTask, resolver: &SearchPathResolver) -> LoadTask {
    task.pending.advance(AsyncLoadState::Loading);
    let identity = task.pending.identity().clone();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        decode_resource(resolver, task.decoder.as_ref(), &identity)
    }))
    .unwrap_or_else(|_| {
        log::error!("Decoder panicked while loading '{identity}'.");
        Err(LoadError::DecodeFailed(format!("decoder panicked on '{identity}'")))
    });
    let next = if outcome.is_ok() {
        AsyncLoadState::Success
    } else {
        AsyncLoadState::Fail
    };
    task.pending.advance(next);
    task.outcome = Some(outcome);
    task
}

/// The worker pool and the set of loads in flight.
pub struct BackgroundLoader {
    resolver: Arc<SearchPathResolver>,
    task_sender: Option<Sender<LoadTask>>,
    done_sender: Sender<LoadTask>,
    done_receiver: Receiver<LoadTask>,
    workers: Vec<thread::JoinHandle<()>>,
    shutting_down: Arc<AtomicBool>,
    in_flight: HashMap<ResourceKey, PendingResource>,
    /// Tasks sent out and not yet received back, cancelled ones included.
    outstanding: usize,
}

impl BackgroundLoader {
    /// Starts `worker_count` workers sharing `resolver`.
    ///
    /// With no workers (by request or because threads could not be spawned)
    /// requests are decoded on the calling thread when enqueued.
    pub fn new(worker_count: usize, resolver: Arc<SearchPathResolver>) -> Self {
        let (task_sender, task_receiver) = crossbeam_channel::unbounded::<LoadTask>();
        let (done_sender, done_receiver) = crossbeam_channel::unbounded::<LoadTask>();
        let shutting_down = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let tasks = task_receiver.clone();
            let done = done_sender.clone();
            let resolver = Arc::clone(&resolver);
            let shutting_down = Arc::clone(&shutting_down);
            let spawned = thread::Builder::new()
                .name(format!("larder-loader-{index}"))
                .spawn(move || {
                    while let Ok(task) = tasks.recv() {
                        if shutting_down.load(Ordering::Relaxed) {
                            break;
                        }
                        if done.send(run_task(task, &resolver)).is_err() {
                            break;
                        }
                    }
                    log::trace!("Loader worker {index} exiting.");
                });
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => log::error!("Failed to spawn loader worker {index}: {e}"),
            }
        }
        log::debug!("Background loader started with {} workers.", workers.len());

        Self {
            resolver,
            task_sender: Some(task_sender),
            done_sender,
            done_receiver,
            workers,
            shutting_down,
            in_flight: HashMap::new(),
            outstanding: 0,
        }
    }

    /// Queues a load, or returns the load already in flight for the same
    /// identity. A cancelled load is never attached to; a fresh one takes
    /// its place and the cancelled one is discarded when it comes back.
    pub(crate) fn enqueue(
        &mut self,
        identity: ResourceIdentity,
        decoder: Arc<dyn AnyDecoder>,
        send_failure_event: bool,
    ) -> PendingResource {
        let key = identity.key();
        if let Some(pending) = self.in_flight.get(&key) {
            if !pending.is_cancelled() {
                log::trace!("'{identity}' is already loading, attaching.");
                return pending.clone();
            }
            log::debug!("'{identity}' was cancelled while loading, queueing it again.");
        }

        let pending = PendingResource::queued(identity);
        self.in_flight.insert(key, pending.clone());
        self.outstanding += 1;
        let task = LoadTask {
            pending: pending.clone(),
            send_failure_event,
            outcome: None,
            decoder,
        };

        let task = match &self.task_sender {
            Some(sender) if !self.workers.is_empty() => match sender.send(task) {
                Ok(()) => return pending,
                Err(unsent) => unsent.into_inner(),
            },
            _ => task,
        };
        let finished = run_task(task, &self.resolver);
        if self.done_sender.send(finished).is_err() {
            log::error!("Background loader completion channel closed.");
            self.outstanding -= 1;
        }
        pending
    }

    /// The in-flight load for `key`, if any.
    pub fn pending(&self, key: ResourceKey) -> Option<&PendingResource> {
        self.in_flight.get(&key)
    }

    /// Whether a load for `key` is in flight.
    pub fn is_in_flight(&self, key: ResourceKey) -> bool {
        self.in_flight.contains_key(&key)
    }

    /// Number of loads in flight, finished or not.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// The next task whose decode has finished, without blocking.
    pub(crate) fn try_next_finished(&mut self) -> Option<LoadTask> {
        let task = self.done_receiver.try_recv().ok()?;
        self.outstanding -= 1;
        Some(task)
    }

    /// Blocks until some outstanding task finishes decoding.
    pub(crate) fn wait_next_finished(&mut self) -> Option<LoadTask> {
        if self.outstanding == 0 {
            return None;
        }
        let task = self.done_receiver.recv().ok()?;
        self.outstanding -= 1;
        Some(task)
    }

    /// Forgets a finalized load, unless a newer load of the same identity
    /// has replaced it.
    pub(crate) fn retire(&mut self, pending: &PendingResource) -> bool {
        let key = pending.identity().key();
        if !self.in_flight.get(&key).is_some_and(|current| current.ptr_eq(pending)) {
            return false;
        }
        self.in_flight.remove(&key);
        true
    }

    /// Stops the workers. Loads that have not started are dropped.
    pub fn shutdown(&mut self) {
        self.shutting_down.store(true, Ordering::Relaxed);
        self.task_sender.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for BackgroundLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::DecoderRegistry;
    use larder_core::{DecodeError, Resource, StringHash};
    use larder_io::ByteSource;
    use std::fs;
    use tempfile::tempdir;

    struct Text(String);

    impl Resource for Text {
        const TYPE_NAME: &'static str = "Text";
    }

    fn text_decoder() -> Arc<dyn AnyDecoder> {
        let mut registry = DecoderRegistry::new();
        registry.register::<Text>(|source: &mut ByteSource, _: &mut DecodeContext| {
            String::from_utf8(source.bytes().to_vec())
                .map(Text)
                .map_err(|e| DecodeError::new(e.to_string()))
        });
        registry.get(StringHash::new("Text")).unwrap()
    }

    fn resolver_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Arc<SearchPathResolver>) {
        let dir = tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let resolver = SearchPathResolver::new(true);
        resolver.add_resource_dir(dir.path(), 0).unwrap();
        (dir, Arc::new(resolver))
    }

    #[test]
    fn test_state_only_moves_forward() {
        let pending = PendingResource::queued(ResourceIdentity::new("Text", "a"));
        assert!(!pending.advance(AsyncLoadState::Done));
        assert!(pending.advance(AsyncLoadState::Loading));
        assert!(pending.advance(AsyncLoadState::Fail));
        assert!(!pending.advance(AsyncLoadState::Success));
        pending.finish(Err(LoadError::Cancelled));
        assert!(pending.is_done());
        assert!(!pending.advance(AsyncLoadState::Loading));
    }

    #[test]
    fn test_second_request_attaches_to_the_first() {
        let (_dir, resolver) = resolver_with(&[("a.txt", "a")]);
        let mut loader = BackgroundLoader::new(1, resolver);
        let identity = ResourceIdentity::new("Text", "a.txt");

        let first = loader.enqueue(identity.clone(), text_decoder(), true);
        let second = loader.enqueue(identity, text_decoder(), false);
        assert!(first.ptr_eq(&second));
        assert_eq!(loader.in_flight(), 1);

        let task = loader.wait_next_finished().unwrap();
        assert_eq!(task.pending.state(), AsyncLoadState::Success);
        assert!(task.send_failure_event);
        assert!(loader.retire(&task.pending));
        assert_eq!(loader.in_flight(), 0);
        assert!(loader.wait_next_finished().is_none());
    }

    #[test]
    fn test_cancelled_load_is_replaced_not_joined() {
        let (_dir, resolver) = resolver_with(&[("a.txt", "a")]);
        let mut loader = BackgroundLoader::new(0, resolver);
        let identity = ResourceIdentity::new("Text", "a.txt");

        let first = loader.enqueue(identity.clone(), text_decoder(), true);
        first.cancel();
        let second = loader.enqueue(identity, text_decoder(), true);
        assert!(!first.ptr_eq(&second));
        assert!(!second.is_cancelled());
        assert_eq!(loader.in_flight(), 1);

        let stale = loader.wait_next_finished().unwrap();
        assert!(stale.pending.ptr_eq(&first));
        assert!(!loader.retire(&stale.pending));
        assert_eq!(loader.in_flight(), 1);

        let fresh = loader.wait_next_finished().unwrap();
        assert!(loader.retire(&fresh.pending));
        assert!(loader.wait_next_finished().is_none());
    }

    #[test]
    fn test_inline_mode_decodes_on_enqueue() {
        let (_dir, resolver) = resolver_with(&[]);
        let mut loader = BackgroundLoader::new(0, resolver);
        let pending = loader.enqueue(ResourceIdentity::new("Text", "missing.txt"), text_decoder(), true);

        assert_eq!(pending.state(), AsyncLoadState::Fail);
        let task = loader.try_next_finished().unwrap();
        assert!(matches!(task.outcome, Some(Err(LoadError::NotFound(_)))));
    }
}
