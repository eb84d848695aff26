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

//! Decoders turn resolved bytes into typed resources.
//!
//! A decoder is registered per resource type and stored type-erased, so the
//! cache can dispatch on the type hash of an identity alone.

use larder_core::{
    DecodeError, ErasedResource, LoadError, Resource, ResourceIdentity, StringHash,
};
use larder_io::{ByteSource, SearchPathResolver};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

/// Decodes resources of type `T`.
///
/// Decoders run on background workers as well as on the owner thread, so
/// they must be `Send + Sync` and must not touch the cache itself. Other
/// resources a decoded value needs are declared through
/// [`DecodeContext::depend_on`] and loaded by the cache afterwards.
pub trait ResourceDecoder<T: Resource>: Send + Sync + 'static {
    /// Decodes one resource from `source`.
    fn decode(&self, source: &mut ByteSource, context: &mut DecodeContext) -> Result<T, DecodeError>;
}

impl<T, F> ResourceDecoder<T> for F
where
    T: Resource,
    F: Fn(&mut ByteSource, &mut DecodeContext) -> Result<T, DecodeError> + Send + Sync + 'static,
{
    fn decode(&self, source: &mut ByteSource, context: &mut DecodeContext) -> Result<T, DecodeError> {
        self(source, context)
    }
}

/// Per-decode scratch space handed to a decoder.
///
/// Declared names are sanitized the same way requests are, against the
/// resource directories mounted when the decode started.
#[derive(Debug)]
pub struct DecodeContext {
    identity: ResourceIdentity,
    roots: Vec<PathBuf>,
    dependencies: Vec<ResourceIdentity>,
    file_dependencies: Vec<String>,
}

impl DecodeContext {
    /// Creates the context for decoding `identity` with no mounted
    /// directories; absolute dependency names are rejected.
    pub fn new(identity: ResourceIdentity) -> Self {
        Self::with_roots(identity, Vec::new())
    }

    /// Creates the context for decoding `identity`, accepting absolute
    /// dependency names that lie under one of `roots`.
    pub fn with_roots(identity: ResourceIdentity, roots: Vec<PathBuf>) -> Self {
        Self {
            identity,
            roots,
            dependencies: Vec::new(),
            file_dependencies: Vec::new(),
        }
    }

    fn sanitize(&self, name: &str) -> Option<String> {
        match larder_io::sanitize_name(name, &self.roots) {
            Ok(sanitized) => Some(sanitized),
            Err(e) => {
                log::warn!("Ignoring dependency of '{}': {e}", self.identity);
                None
            }
        }
    }

    /// The resource being decoded.
    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    /// Declares that the resource being decoded depends on another resource.
    ///
    /// The cache records the edge and makes sure the dependency is loaded.
    /// Returns the identity the dependency is cached under, or `None` if the
    /// name is invalid, in which case nothing is recorded.
    pub fn depend_on(&mut self, type_name: &str, name: &str) -> Option<ResourceIdentity> {
        let dependency = ResourceIdentity::new(type_name, &self.sanitize(name)?);
        if !self.dependencies.contains(&dependency) {
            self.dependencies.push(dependency.clone());
        }
        Some(dependency)
    }

    /// Typed variant of [`depend_on`](Self::depend_on).
    pub fn depend_on_resource<T: Resource>(&mut self, name: &str) -> Option<ResourceIdentity> {
        self.depend_on(T::TYPE_NAME, name)
    }

    /// Declares a plain file (an include, a shader chunk) the resource was built from.
    ///
    /// The file is not loaded as a resource; a change to it reloads the
    /// resource being decoded.
    pub fn depend_on_file(&mut self, name: &str) {
        let Some(name) = self.sanitize(name) else {
            return;
        };
        if !self.file_dependencies.contains(&name) {
            self.file_dependencies.push(name);
        }
    }

    /// Resource dependencies declared so far, in declaration order.
    pub fn dependencies(&self) -> &[ResourceIdentity] {
        &self.dependencies
    }

    /// File dependencies declared so far.
    pub fn file_dependencies(&self) -> &[String] {
        &self.file_dependencies
    }
}

/// Internal trait for decoding any resource type.
pub(crate) trait AnyDecoder: Send + Sync {
    fn decode_any(
        &self,
        source: &mut ByteSource,
        context: &mut DecodeContext,
    ) -> Result<ErasedResource, DecodeError>;
}

/// Adapts a typed `ResourceDecoder<T>` to `AnyDecoder`.
struct DecoderWrapper<T, D>(D, PhantomData<fn() -> T>);

impl<T: Resource, D: ResourceDecoder<T>> AnyDecoder for DecoderWrapper<T, D> {
    fn decode_any(
        &self,
        source: &mut ByteSource,
        context: &mut DecodeContext,
    ) -> Result<ErasedResource, DecodeError> {
        let resource: T = self.0.decode(source, context)?;
        Ok(ErasedResource::new(resource))
    }
}

/// Decoders keyed by resource type hash.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: HashMap<StringHash, (String, Arc<dyn AnyDecoder>)>,
}

impl DecoderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the decoder for `T`, replacing any previous one.
    pub fn register<T: Resource>(&mut self, decoder: impl ResourceDecoder<T>) {
        let wrapped = DecoderWrapper(decoder, PhantomData);
        let previous = self
            .decoders
            .insert(StringHash::new(T::TYPE_NAME), (T::TYPE_NAME.to_string(), Arc::new(wrapped)));
        if previous.is_some() {
            log::debug!("Replaced decoder for resource type '{}'.", T::TYPE_NAME);
        }
    }

    /// Whether a decoder is registered for the type hash.
    pub fn contains(&self, type_id: StringHash) -> bool {
        self.decoders.contains_key(&type_id)
    }

    /// Names of the registered types, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.decoders.values().map(|(n, _)| n.clone()).collect();
        names.sort();
        names
    }

    pub(crate) fn get(&self, type_id: StringHash) -> Option<Arc<dyn AnyDecoder>> {
        self.decoders.get(&type_id).map(|(_, d)| d.clone())
    }
}

/// Resolves and decodes `identity` in one go. Runs on workers and the owner alike.
pub(crate) fn decode_resource(
    resolver: &SearchPathResolver,
    decoder: &dyn AnyDecoder,
    identity: &ResourceIdentity,
) -> Result<(ErasedResource, DecodeContext), LoadError> {
    let mut source = resolver.resolve(identity.name())?;
    let mut context = DecodeContext::with_roots(identity.clone(), resolver.resource_dirs());
    let resource = decoder.decode_any(&mut source, &mut context)?;
    Ok((resource, context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    struct Text(String);

    impl Resource for Text {
        const TYPE_NAME: &'static str = "Text";

        fn memory_use(&self) -> u64 {
            self.0.len() as u64
        }
    }

    fn decode_text(source: &mut ByteSource, context: &mut DecodeContext) -> Result<Text, DecodeError> {
        let mut text = String::new();
        source.read_to_string(&mut text)?;
        for line in text.lines() {
            if let Some(include) = line.strip_prefix("#include ") {
                context.depend_on_file(include);
            }
        }
        Ok(Text(text))
    }

    #[test]
    fn test_registered_decoder_is_found_by_type_hash() {
        let mut registry = DecoderRegistry::new();
        registry.register::<Text>(decode_text);

        assert!(registry.contains(StringHash::new("text")));
        assert!(!registry.contains(StringHash::new("Texture")));
        assert_eq!(registry.type_names(), vec!["Text".to_string()]);

        let decoder = registry.get(StringHash::new("Text")).unwrap();
        let mut source = ByteSource::from_bytes("a.txt", b"hello\n#include common.txt".to_vec());
        let mut context = DecodeContext::new(ResourceIdentity::new("Text", "a.txt"));
        let erased = decoder.decode_any(&mut source, &mut context).unwrap();

        assert_eq!(erased.memory_use(), 25);
        assert!(erased.downcast::<Text>().is_some());
        assert_eq!(context.file_dependencies(), ["common.txt".to_string()]);
    }

    #[test]
    fn test_dependencies_are_deduplicated() {
        let mut context = DecodeContext::new(ResourceIdentity::new("Material", "m.xml"));
        context.depend_on("Texture", "a.png");
        context.depend_on("texture", "./a.png");
        context.depend_on_resource::<Text>("notes.txt");
        assert_eq!(context.dependencies().len(), 2);
    }

    #[test]
    fn test_dependency_names_are_sanitized() {
        let mut context = DecodeContext::new(ResourceIdentity::new("Material", "m.xml"));
        let first = context.depend_on("Texture", "sub/../a.png").unwrap();
        let second = context.depend_on("Texture", "textures//./a.png/..//a.png");
        assert_eq!(first.name(), "a.png");
        assert_eq!(second.unwrap().name(), "textures/a.png");
        assert_eq!(context.dependencies().len(), 2);

        assert!(context.depend_on("Texture", "../outside.png").is_none());
        assert!(context.depend_on("Texture", "/etc/passwd").is_none());
        assert_eq!(context.dependencies().len(), 2);

        context.depend_on_file("shaders/../common.inc");
        context.depend_on_file("../../escape.inc");
        assert_eq!(context.file_dependencies(), ["common.inc".to_string()]);
    }
}
