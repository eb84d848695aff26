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

//! The [`ResourceCache`], the owner-facing entry point.

use crate::decoder::{decode_resource, DecodeContext, DecoderRegistry, ResourceDecoder};
use crate::dependency::{file_identity, DependencyTracker};
use crate::loader::{BackgroundLoader, LoadTask, PendingResource};
use crate::reload::WatcherSet;
use crate::store::{MemoryReport, ResourceStore};
use larder_core::event::{EventBus, ResourceEvent, ResourceEventSink};
use larder_core::{
    CacheConfig, ErasedResource, LoadError, Resource, ResourceHandle, ResourceIdentity,
    ResourceKey, StringHash,
};
use larder_io::{MountError, PackageFile, SearchPathResolver};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How the dependencies of a freshly decoded resource are brought in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadMode {
    /// Loaded before the request returns.
    Immediate,
    /// Queued on the background loader.
    Background,
}

/// A cache of named, decoded resources.
///
/// The cache is owned by one line of execution: every method takes `&mut self`
/// (or `&self`) and background workers only ever decode. Finalizing
/// background loads, polling file watchers and periodic eviction happen in
/// [`update`](Self::update), which the owner calls once per cycle.
pub struct ResourceCache {
    pub(crate) config: CacheConfig,
    pub(crate) resolver: Arc<SearchPathResolver>,
    pub(crate) decoders: DecoderRegistry,
    pub(crate) store: ResourceStore,
    pub(crate) dependencies: DependencyTracker,
    pub(crate) loader: BackgroundLoader,
    pub(crate) watchers: WatcherSet,
    sink: Arc<dyn ResourceEventSink>,
    bus: Option<Arc<EventBus<ResourceEvent>>>,
}

impl ResourceCache {
    /// Creates a cache with no search paths and no decoders.
    ///
    /// Events go to an internal [`EventBus`], read with
    /// [`drain_events`](Self::drain_events).
    pub fn new(config: CacheConfig) -> Self {
        let resolver = Arc::new(SearchPathResolver::new(config.search_packages_first));
        let loader = BackgroundLoader::new(config.background_workers, Arc::clone(&resolver));
        let mut store = ResourceStore::new();
        for (type_name, bytes) in &config.memory_budgets {
            store.set_memory_budget(StringHash::new(type_name), *bytes);
        }
        let bus = Arc::new(EventBus::new());
        log::debug!(
            "Resource cache created ({} background workers).",
            loader.worker_count()
        );

        Self {
            resolver,
            loader,
            store,
            decoders: DecoderRegistry::new(),
            dependencies: DependencyTracker::new(),
            watchers: WatcherSet::new(config.file_change_delay()),
            sink: bus.clone(),
            bus: Some(bus),
            config,
        }
    }

    /// Sends events to `sink` instead of the internal bus.
    pub fn with_event_sink(mut self, sink: Arc<dyn ResourceEventSink>) -> Self {
        self.sink = sink;
        self.bus = None;
        self
    }

    /// The current configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The resolver shared with the background workers.
    pub fn resolver(&self) -> &Arc<SearchPathResolver> {
        &self.resolver
    }

    /// Registers the decoder for resources of type `T`.
    pub fn register_decoder<T: Resource>(&mut self, decoder: impl ResourceDecoder<T>) {
        self.decoders.register::<T>(decoder);
    }

    /// The internal event bus, unless a custom sink was installed.
    pub fn event_bus(&self) -> Option<&Arc<EventBus<ResourceEvent>>> {
        self.bus.as_ref()
    }

    /// Takes every event emitted so far from the internal bus.
    pub fn drain_events(&self) -> Vec<ResourceEvent> {
        self.bus.as_ref().map(|bus| bus.drain()).unwrap_or_default()
    }

    pub(crate) fn emit(&self, event: ResourceEvent) {
        self.sink.notify(event);
    }

    // --- Settings ---

    /// Enables or disables file watching and automatic reloads.
    pub fn set_auto_reload_resources(&mut self, enabled: bool) {
        if enabled == self.config.auto_reload_resources {
            return;
        }
        self.config.auto_reload_resources = enabled;
        if enabled {
            for root in self.resolver.resource_dirs() {
                self.watchers.watch(&root);
            }
        } else {
            self.watchers.clear();
        }
        log::debug!("Automatic resource reloading {}.", if enabled { "enabled" } else { "disabled" });
    }

    /// Whether file changes reload resources.
    pub fn auto_reload_resources(&self) -> bool {
        self.config.auto_reload_resources
    }

    /// Makes failed loads install an empty placeholder entry.
    pub fn set_return_failed_resources(&mut self, enabled: bool) {
        self.config.return_failed_resources = enabled;
    }

    /// Whether failed loads install placeholders.
    pub fn return_failed_resources(&self) -> bool {
        self.config.return_failed_resources
    }

    /// Selects whether packages are searched before directories.
    pub fn set_search_packages_first(&mut self, enabled: bool) {
        self.config.search_packages_first = enabled;
        self.resolver.set_search_packages_first(enabled);
    }

    /// Whether packages are searched before directories.
    pub fn search_packages_first(&self) -> bool {
        self.resolver.search_packages_first()
    }

    /// Sets the per-update time budget for finalizing background loads.
    pub fn set_finish_background_resources_ms(&mut self, ms: u64) {
        self.config.finish_background_resources_ms = ms;
    }

    /// The per-update finalize budget in milliseconds.
    pub fn finish_background_resources_ms(&self) -> u64 {
        self.config.finish_background_resources_ms
    }

    // --- Search paths ---

    /// Mounts a resource directory and returns its canonical path.
    pub fn add_resource_dir(&mut self, path: &Path, priority: u32) -> Result<PathBuf, MountError> {
        let root = self.resolver.add_resource_dir(path, priority)?;
        if self.config.auto_reload_resources {
            self.watchers.watch(&root);
        }
        Ok(root)
    }

    /// Unmounts a resource directory.
    pub fn remove_resource_dir(&mut self, path: &Path) -> bool {
        let root = larder_io::sanitize_dir_name(path).unwrap_or_else(|_| path.to_path_buf());
        self.watchers.unwatch(&root);
        self.resolver.remove_resource_dir(path)
    }

    /// Opens and mounts a package file.
    pub fn add_package_file(
        &mut self,
        path: &Path,
        priority: u32,
    ) -> Result<Arc<PackageFile>, MountError> {
        self.resolver.add_package_path(path, priority)
    }

    /// Mounts an already opened package.
    pub fn add_package(&mut self, package: Arc<PackageFile>, priority: u32) -> Result<(), MountError> {
        self.resolver.add_package_file(package, priority)
    }

    /// Unmounts a package.
    ///
    /// With `release_resources`, cached resources whose names the package
    /// provides are released; `force_reload` then loads them again from
    /// whatever location serves them now.
    pub fn remove_package_file(
        &mut self,
        path: &Path,
        release_resources: bool,
        force_reload: bool,
    ) -> bool {
        let Some(package) = self.resolver.remove_package_file(path) else {
            return false;
        };
        if release_resources {
            let names: std::collections::HashSet<StringHash> =
                package.list_entries().map(StringHash::new).collect();
            let released = self
                .store
                .remove_where(None, |identity| names.contains(&identity.name_id()));
            log::debug!(
                "Released {} resources provided by '{}'.",
                released.len(),
                path.display()
            );
            self.after_release(released, force_reload);
        }
        true
    }

    /// Mounted directories in search order.
    pub fn resource_dirs(&self) -> Vec<PathBuf> {
        self.resolver.resource_dirs()
    }

    /// Mounted packages in search order.
    pub fn package_files(&self) -> Vec<Arc<PackageFile>> {
        self.resolver.package_files()
    }

    /// Whether `name` resolves.
    pub fn exists(&self, name: &str) -> bool {
        self.resolver.exists(name)
    }

    /// Full path of the directory file serving `name`, if any.
    pub fn resource_file_name(&self, name: &str) -> Option<PathBuf> {
        self.resolver.resource_file_name(name)
    }

    /// The first mounted directory containing `path`.
    pub fn preferred_resource_dir(&self, path: &Path) -> Option<PathBuf> {
        self.resolver.preferred_resource_dir(path)
    }

    /// Sanitizes a resource name against the mounted directories.
    pub fn sanitize_name(&self, name: &str) -> Result<String, LoadError> {
        Ok(self.resolver.sanitize_name(name)?)
    }

    // --- Requests ---

    /// The cached entry for `type_name`/`name`, without loading or touching it.
    pub fn get_existing(&self, type_name: &str, name: &str) -> Option<ResourceHandle> {
        let name = self.resolver.sanitize_name(name).ok()?;
        self.store
            .get(ResourceIdentity::new(type_name, &name).key())
            .cloned()
    }

    /// The cached entry for `identity`, without loading or touching it.
    pub fn get_existing_identity(&self, identity: &ResourceIdentity) -> Option<ResourceHandle> {
        self.store.get(identity.key()).cloned()
    }

    /// Returns the cached resource or loads it now.
    ///
    /// A resource that is being loaded in the background is waited for
    /// instead of decoded twice.
    pub fn get_or_load(
        &mut self,
        type_name: &str,
        name: &str,
        send_failure_event: bool,
    ) -> Result<ResourceHandle, LoadError> {
        let identity = self.identity_for(type_name, name, send_failure_event)?;
        self.get_or_load_identity(&identity, send_failure_event)
    }

    /// Typed shorthand for [`get_or_load`](Self::get_or_load).
    pub fn get<T: Resource>(&mut self, name: &str) -> Result<ResourceHandle, LoadError> {
        self.get_or_load(T::TYPE_NAME, name, true)
    }

    pub(crate) fn get_or_load_identity(
        &mut self,
        identity: &ResourceIdentity,
        send_failure_event: bool,
    ) -> Result<ResourceHandle, LoadError> {
        if let Some(handle) = self.store.get_and_touch(identity.key()) {
            return Ok(handle);
        }
        if self.loader.is_in_flight(identity.key()) {
            log::debug!("'{identity}' is loading in the background, waiting for it.");
            self.finish_until_done(identity.key());
            if let Some(handle) = self.store.get_and_touch(identity.key()) {
                return Ok(handle);
            }
        }

        let Some(decoder) = self.decoders.get(identity.type_id()) else {
            let error = LoadError::UnknownType(identity.type_name().to_string());
            return self.fail(identity, error, send_failure_event);
        };
        match decode_resource(&self.resolver, decoder.as_ref(), identity) {
            Ok((resource, context)) => {
                let handle = ResourceHandle::new(identity.clone(), resource);
                log::debug!("Loaded '{identity}' ({} bytes).", handle.memory_use());
                self.install(&handle, &context, LoadMode::Immediate);
                Ok(handle)
            }
            Err(error) => self.fail(identity, error, send_failure_event),
        }
    }

    /// Loads a resource without caching it.
    ///
    /// The result is not indexed, not budgeted and records no dependency
    /// edges. Its own dependencies are loaded into the cache as usual.
    pub fn get_temporary(
        &mut self,
        type_name: &str,
        name: &str,
        send_failure_event: bool,
    ) -> Result<ResourceHandle, LoadError> {
        let identity = self.identity_for(type_name, name, send_failure_event)?;
        let Some(decoder) = self.decoders.get(identity.type_id()) else {
            let error = LoadError::UnknownType(type_name.to_string());
            self.report_failure(&identity, &error, send_failure_event);
            return Err(error);
        };
        match decode_resource(&self.resolver, decoder.as_ref(), &identity) {
            Ok((resource, context)) => {
                self.load_dependencies(&context, LoadMode::Immediate);
                Ok(ResourceHandle::new(identity, resource))
            }
            Err(error) => {
                self.report_failure(&identity, &error, send_failure_event);
                Err(error)
            }
        }
    }

    /// Inserts a resource built by the caller, replacing any cached entry
    /// with the same identity.
    pub fn add_manual<T: Resource>(&mut self, name: &str, resource: T) -> Result<ResourceHandle, LoadError> {
        let name = self.resolver.sanitize_name(name)?;
        let handle = ResourceHandle::new(
            ResourceIdentity::new(T::TYPE_NAME, &name),
            ErasedResource::new(resource),
        );
        self.add_manual_handle(handle.clone());
        Ok(handle)
    }

    /// Inserts a prebuilt entry.
    pub fn add_manual_handle(&mut self, handle: ResourceHandle) {
        let type_id = handle.identity().type_id();
        log::debug!("Added manual resource '{}'.", handle.identity());
        self.store.insert(handle);
        self.evict(type_id);
    }

    // --- Background ---

    /// Starts loading a resource on the worker pool.
    ///
    /// Returns immediately. A resource that is already cached yields a
    /// finished [`PendingResource`]; one already in flight yields the existing
    /// one. Unknown types are rejected here.
    pub fn background_load(
        &mut self,
        type_name: &str,
        name: &str,
        send_failure_event: bool,
    ) -> Result<PendingResource, LoadError> {
        let identity = self.identity_for(type_name, name, send_failure_event)?;
        self.enqueue_background(identity, send_failure_event)
    }

    pub(crate) fn enqueue_background(
        &mut self,
        identity: ResourceIdentity,
        send_failure_event: bool,
    ) -> Result<PendingResource, LoadError> {
        if let Some(handle) = self.store.get(identity.key()) {
            let handle = handle.clone();
            return Ok(PendingResource::completed(identity, Ok(handle)));
        }
        let Some(decoder) = self.decoders.get(identity.type_id()) else {
            let error = LoadError::UnknownType(identity.type_name().to_string());
            self.report_failure(&identity, &error, send_failure_event);
            return Err(error);
        };
        log::debug!("Queued background load of '{identity}'.");
        Ok(self.loader.enqueue(identity, decoder, send_failure_event))
    }

    /// The in-flight background load of `identity`, if any.
    pub fn pending_background(&self, identity: &ResourceIdentity) -> Option<PendingResource> {
        self.loader.pending(identity.key()).cloned()
    }

    /// Number of background loads not yet finalized.
    pub fn background_in_flight(&self) -> usize {
        self.loader.in_flight()
    }

    /// Finalizes finished background loads, oldest completion first, until
    /// none are left or `budget` has elapsed. Returns how many were finalized.
    ///
    /// At least one finished load is finalized per call, so a zero budget
    /// still makes progress.
    pub fn finish_background_resources(&mut self, budget: Duration) -> usize {
        let start = Instant::now();
        let mut finished = 0;
        while let Some(task) = self.loader.try_next_finished() {
            self.finalize(task);
            finished += 1;
            if start.elapsed() >= budget {
                break;
            }
        }
        if finished > 0 {
            log::trace!("Finalized {finished} background loads.");
        }
        finished
    }

    /// Blocks until `identity` is no longer in flight, finalizing everything
    /// that completes before it.
    pub fn wait_for_background(&mut self, identity: &ResourceIdentity) {
        self.finish_until_done(identity.key());
    }

    /// Blocks until every background load has been finalized.
    pub fn wait_for_all_background(&mut self) {
        while let Some(task) = self.loader.wait_next_finished() {
            self.finalize(task);
        }
    }

    fn finish_until_done(&mut self, key: ResourceKey) {
        while self.loader.is_in_flight(key) {
            let Some(task) = self.loader.wait_next_finished() else {
                break;
            };
            self.finalize(task);
        }
    }

    fn finalize(&mut self, mut task: LoadTask) {
        let pending = task.pending.clone();
        self.loader.retire(&pending);
        let identity = pending.identity().clone();

        if pending.is_cancelled() {
            log::debug!("Discarding cancelled background load of '{identity}'.");
            pending.finish(Err(LoadError::Cancelled));
            return;
        }

        // An entry added while the load was in flight (`add_manual`) wins.
        if let Some(existing) = self.store.get(identity.key()).cloned() {
            log::debug!("'{identity}' was added while loading in the background, keeping that entry.");
            let success = !existing.is_failed();
            pending.finish(Ok(existing));
            self.emit(ResourceEvent::BackgroundLoaded { identity, success });
            return;
        }

        let result = match task.outcome.take().unwrap_or(Err(LoadError::Cancelled)) {
            Ok((resource, context)) => {
                let handle = ResourceHandle::new(identity.clone(), resource);
                log::debug!(
                    "Finalized background load of '{identity}' ({} bytes).",
                    handle.memory_use()
                );
                self.install(&handle, &context, LoadMode::Background);
                Ok(handle)
            }
            Err(error) => self.fail(&identity, error, task.send_failure_event),
        };

        let success = result.as_ref().is_ok_and(|handle| !handle.is_failed());
        pending.finish(result);
        self.emit(ResourceEvent::BackgroundLoaded { identity, success });
    }

    // --- Insertion and failure ---

    fn identity_for(
        &self,
        type_name: &str,
        name: &str,
        send_failure_event: bool,
    ) -> Result<ResourceIdentity, LoadError> {
        match self.resolver.sanitize_name(name) {
            Ok(sanitized) => Ok(ResourceIdentity::new(type_name, &sanitized)),
            Err(error) => {
                let error = LoadError::from(error);
                self.report_failure(&ResourceIdentity::new(type_name, name), &error, send_failure_event);
                Err(error)
            }
        }
    }

    pub(crate) fn install(&mut self, handle: &ResourceHandle, context: &DecodeContext, mode: LoadMode) {
        self.store.insert(handle.clone());
        self.record_dependencies(handle.identity(), context);
        self.load_dependencies(context, mode);
        self.evict(handle.identity().type_id());
    }

    pub(crate) fn record_dependencies(&mut self, dependent: &ResourceIdentity, context: &DecodeContext) {
        self.dependencies.begin_scope(dependent);
        for dependency in context.dependencies() {
            self.dependencies.record(dependency);
        }
        for file in context.file_dependencies() {
            self.dependencies.record(&file_identity(file));
        }
        self.dependencies.end_scope();
    }

    pub(crate) fn load_dependencies(&mut self, context: &DecodeContext, mode: LoadMode) {
        for dependency in context.dependencies() {
            if self.store.contains(dependency.key()) {
                continue;
            }
            let result = match mode {
                LoadMode::Immediate => self.get_or_load_identity(dependency, true).map(|_| ()),
                LoadMode::Background => self.enqueue_background(dependency.clone(), true).map(|_| ()),
            };
            if let Err(e) = result {
                log::warn!(
                    "Dependency '{dependency}' of '{}' failed to load: {e}",
                    context.identity()
                );
            }
        }
    }

    fn report_failure(&self, identity: &ResourceIdentity, error: &LoadError, send_failure_event: bool) {
        log::warn!("Failed to load '{identity}': {error}");
        if !send_failure_event {
            return;
        }
        let event = match error {
            LoadError::NotFound(_) | LoadError::InvalidName(_) => {
                ResourceEvent::ResourceNotFound(identity.clone())
            }
            LoadError::UnknownType(_) => ResourceEvent::UnknownResourceType(identity.clone()),
            LoadError::DecodeFailed(reason) => ResourceEvent::LoadFailed {
                identity: identity.clone(),
                reason: reason.clone(),
            },
            LoadError::Cancelled => return,
        };
        self.emit(event);
    }

    fn fail(
        &mut self,
        identity: &ResourceIdentity,
        error: LoadError,
        send_failure_event: bool,
    ) -> Result<ResourceHandle, LoadError> {
        self.report_failure(identity, &error, send_failure_event);
        if self.config.return_failed_resources
            && !matches!(error, LoadError::InvalidName(_) | LoadError::Cancelled)
        {
            let placeholder = ResourceHandle::failed(identity.clone());
            self.store.insert(placeholder.clone());
            return Ok(placeholder);
        }
        Err(error)
    }

    // --- Release and memory ---

    /// Unindexes one resource. Returns `false` if it was not cached.
    ///
    /// Holders keep their handles. With `force_reload` the resource is loaded
    /// again right away, into a new entry.
    pub fn release(&mut self, type_name: &str, name: &str, force_reload: bool) -> bool {
        let Ok(name) = self.resolver.sanitize_name(name) else {
            return false;
        };
        let identity = ResourceIdentity::new(type_name, &name);
        let Some(handle) = self.store.remove(identity.key()) else {
            return false;
        };
        self.after_release(vec![handle], force_reload);
        true
    }

    /// Unindexes every resource, or every resource of one type.
    pub fn release_all(&mut self, type_name: Option<&str>, force_reload: bool) -> usize {
        let released = self
            .store
            .remove_where(type_name.map(StringHash::new), |_| true);
        let count = released.len();
        self.after_release(released, force_reload);
        count
    }

    /// Unindexes resources whose name contains `partial_name`.
    pub fn release_matching(
        &mut self,
        type_name: Option<&str>,
        partial_name: &str,
        force_reload: bool,
    ) -> usize {
        let needle = partial_name.to_ascii_lowercase();
        let released = self.store.remove_where(type_name.map(StringHash::new), |identity| {
            identity.name().to_ascii_lowercase().contains(&needle)
        });
        let count = released.len();
        self.after_release(released, force_reload);
        count
    }

    fn after_release(&mut self, released: Vec<ResourceHandle>, force_reload: bool) {
        for handle in released {
            log::debug!(
                "Released '{}' ({} outside holders).",
                handle.identity(),
                handle.holders() - 1
            );
            if force_reload {
                if let Err(e) = self.get_or_load_identity(handle.identity(), true) {
                    log::warn!("Forced reload of '{}' failed: {e}", handle.identity());
                }
            }
        }
    }

    /// Sets the memory budget of a type in bytes and evicts down to it. `0` is unlimited.
    pub fn set_memory_budget(&mut self, type_name: &str, bytes: u64) {
        let type_id = StringHash::new(type_name);
        self.store.set_memory_budget(type_id, bytes);
        self.evict(type_id);
    }

    /// The memory budget of a type, `0` if unlimited.
    pub fn memory_budget(&self, type_name: &str) -> u64 {
        self.store.memory_budget(StringHash::new(type_name))
    }

    /// Bytes used by cached resources of one type.
    pub fn memory_use(&self, type_name: &str) -> u64 {
        self.store.memory_use(StringHash::new(type_name))
    }

    /// Bytes used by every cached resource.
    pub fn total_memory_use(&self) -> u64 {
        self.store.total_memory_use()
    }

    /// Cached resources of one type.
    pub fn resources_of_type(&self, type_name: &str) -> Vec<ResourceHandle> {
        self.store.resources_of_type(StringHash::new(type_name))
    }

    /// Number of cached resources.
    pub fn resource_count(&self) -> usize {
        self.store.len()
    }

    /// Rescans the cache and logs per-type memory usage.
    pub fn memory_report(&self) -> MemoryReport {
        let report = self.store.report();
        log::info!("Resource memory usage:\n{report}");
        report
    }

    pub(crate) fn evict(&mut self, type_id: StringHash) {
        let evicted = self.store.evict(type_id);
        if !evicted.is_empty() {
            log::debug!("Evicted {} resources over budget.", evicted.len());
        }
    }

    // --- Dependencies ---

    /// Declares that `resource` depends on the plain file `dependency_name`.
    ///
    /// A change to that file reloads `resource`.
    pub fn store_resource_dependency(&mut self, resource: &ResourceIdentity, dependency_name: &str) {
        let Ok(name) = self.resolver.sanitize_name(dependency_name) else {
            log::warn!("Ignoring invalid dependency name '{dependency_name}' of '{resource}'.");
            return;
        };
        self.dependencies
            .add_dependency(resource, &file_identity(&name));
    }

    /// Declares that `dependent` depends on the resource `dependency`.
    pub fn add_dependency(&mut self, dependent: &ResourceIdentity, dependency: &ResourceIdentity) {
        self.dependencies.add_dependency(dependent, dependency);
    }

    /// Forgets every dependency of `resource`.
    pub fn reset_dependencies(&mut self, resource: &ResourceIdentity) {
        self.dependencies.reset_dependencies(resource);
    }

    /// The dependency graph.
    pub fn dependencies(&self) -> &DependencyTracker {
        &self.dependencies
    }

    // --- Update ---

    /// Runs one owner cycle: finalizes background loads within the configured
    /// budget, handles settled file changes and evicts every type over budget.
    pub fn update(&mut self) {
        self.finish_background_resources(self.config.finish_background_budget());
        if self.config.auto_reload_resources {
            for change in self.watchers.poll() {
                self.file_changed(&change.resource_name, &change.file_name.to_string_lossy());
            }
        }
        let evicted = self.store.evict_all_over_budget();
        if !evicted.is_empty() {
            log::debug!("Update evicted {} resources over budget.", evicted.len());
        }
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
