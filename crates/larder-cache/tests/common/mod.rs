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

// Shared fixtures: three resource types that reference each other through
// a tiny line-based text format.
#![allow(dead_code)]

use larder_cache::{
    ByteSource, CacheConfig, DecodeContext, DecodeError, Resource, ResourceCache,
};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
pub struct Texture {
    pub bytes: Vec<u8>,
}

impl Resource for Texture {
    const TYPE_NAME: &'static str = "Texture";

    fn memory_use(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// `texture <name>` and `include <file>` lines.
#[derive(Debug)]
pub struct Material {
    pub text: String,
}

impl Resource for Material {
    const TYPE_NAME: &'static str = "Material";

    fn memory_use(&self) -> u64 {
        self.text.len() as u64
    }
}

/// `material <name>` lines.
#[derive(Debug)]
pub struct Scene {
    pub text: String,
}

impl Resource for Scene {
    const TYPE_NAME: &'static str = "Scene";

    fn memory_use(&self) -> u64 {
        self.text.len() as u64
    }
}

/// Counts decoder invocations per type.
#[derive(Debug, Default)]
pub struct DecodeCounts {
    pub textures: AtomicUsize,
    pub materials: AtomicUsize,
    pub scenes: AtomicUsize,
}

impl DecodeCounts {
    pub fn textures(&self) -> usize {
        self.textures.load(Ordering::SeqCst)
    }
}

fn read_text(source: &ByteSource) -> Result<String, DecodeError> {
    String::from_utf8(source.bytes().to_vec()).map_err(|e| DecodeError::new(e.to_string()))
}

pub fn register_decoders(cache: &mut ResourceCache) -> Arc<DecodeCounts> {
    let counts = Arc::new(DecodeCounts::default());

    let c = Arc::clone(&counts);
    cache.register_decoder::<Texture>(
        move |source: &mut ByteSource, _: &mut DecodeContext| -> Result<Texture, DecodeError> {
            c.textures.fetch_add(1, Ordering::SeqCst);
            if source.bytes().starts_with(b"corrupt") {
                return Err(DecodeError::new("corrupt texture"));
            }
            Ok(Texture {
                bytes: source.bytes().to_vec(),
            })
        },
    );

    let c = Arc::clone(&counts);
    cache.register_decoder::<Material>(
        move |source: &mut ByteSource, context: &mut DecodeContext| -> Result<Material, DecodeError> {
            c.materials.fetch_add(1, Ordering::SeqCst);
            let text = read_text(source)?;
            for line in text.lines() {
                if let Some(texture) = line.strip_prefix("texture ") {
                    context.depend_on_resource::<Texture>(texture.trim());
                } else if let Some(file) = line.strip_prefix("include ") {
                    context.depend_on_file(file.trim());
                }
            }
            Ok(Material { text })
        },
    );

    let c = Arc::clone(&counts);
    cache.register_decoder::<Scene>(
        move |source: &mut ByteSource, context: &mut DecodeContext| -> Result<Scene, DecodeError> {
            c.scenes.fetch_add(1, Ordering::SeqCst);
            let text = read_text(source)?;
            for line in text.lines() {
                if let Some(material) = line.strip_prefix("material ") {
                    context.depend_on_resource::<Material>(material.trim());
                }
            }
            Ok(Scene { text })
        },
    );

    counts
}

pub fn write(root: &Path, name: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// A cache over `root` with decode-on-enqueue background loading.
pub fn inline_cache(root: &Path) -> (ResourceCache, Arc<DecodeCounts>) {
    cache_with(
        root,
        CacheConfig {
            background_workers: 0,
            ..CacheConfig::default()
        },
    )
}

pub fn cache_with(root: &Path, config: CacheConfig) -> (ResourceCache, Arc<DecodeCounts>) {
    let mut cache = ResourceCache::new(config);
    let counts = register_decoders(&mut cache);
    cache.add_resource_dir(root, 0).unwrap();
    (cache, counts)
}

pub fn texture_bytes(handle: &larder_cache::ResourceHandle) -> Vec<u8> {
    handle.get::<Texture>().unwrap().bytes.clone()
}
