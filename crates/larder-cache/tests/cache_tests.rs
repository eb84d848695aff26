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

mod common;

use anyhow::Result;
use common::{inline_cache, texture_bytes, write, Material, Texture};
use larder_cache::{
    identify, CacheConfig, ErasedResource, LoadError, ResourceCache, ResourceIdentity,
};
use larder_core::event::ResourceEvent;
use larder_io::PackageBuilder;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_repeated_requests_share_one_entry() -> Result<()> {
    let dir = tempdir()?;
    write(dir.path(), "tex/a.png", [1u8; 16]);
    let (mut cache, counts) = inline_cache(dir.path());

    assert!(cache.get_existing("Texture", "tex/a.png").is_none());
    let first = cache.get_or_load("Texture", "tex/a.png", true)?;
    let second = cache.get_or_load("texture", "TEX/A.PNG", true)?;
    let third = cache.get::<Texture>("./tex\\a.png")?;

    assert!(first.ptr_eq(&second));
    assert!(first.ptr_eq(&third));
    assert_eq!(counts.textures(), 1);
    assert_eq!(first.holders(), 4);
    assert_eq!(cache.total_memory_use(), 16);
    assert_eq!(cache.resource_count(), 1);
    Ok(())
}

#[test]
fn test_budget_evicts_least_recently_used_unheld_entry() -> Result<()> {
    let dir = tempdir()?;
    for name in ["A.png", "B.png", "C.png"] {
        write(dir.path(), name, [0u8; 40]);
    }
    let (mut cache, _) = inline_cache(dir.path());
    cache.set_memory_budget("Texture", 100);

    cache.get::<Texture>("A.png")?;
    cache.get::<Texture>("B.png")?;
    let c = cache.get::<Texture>("C.png")?;

    assert!(cache.get_existing("Texture", "A.png").is_none());
    assert!(cache.get_existing("Texture", "B.png").is_some());
    assert!(cache.get_existing("Texture", "C.png").is_some());
    assert_eq!(cache.memory_use("Texture"), 80);
    assert_eq!(c.memory_use(), 40);
    Ok(())
}

#[test]
fn test_touching_an_entry_protects_it_from_eviction() -> Result<()> {
    let dir = tempdir()?;
    for name in ["A.png", "B.png", "C.png"] {
        write(dir.path(), name, [0u8; 40]);
    }
    let (mut cache, _) = inline_cache(dir.path());

    for name in ["A.png", "B.png", "C.png", "A.png"] {
        cache.get::<Texture>(name)?;
    }
    cache.set_memory_budget("Texture", 100);

    assert!(cache.get_existing("Texture", "A.png").is_some());
    assert!(cache.get_existing("Texture", "B.png").is_none());
    assert!(cache.get_existing("Texture", "C.png").is_some());
    Ok(())
}

#[test]
fn test_held_entries_survive_and_evicted_handles_stay_valid() -> Result<()> {
    let dir = tempdir()?;
    write(dir.path(), "A.png", [7u8; 60]);
    write(dir.path(), "B.png", [8u8; 60]);
    let (mut cache, counts) = inline_cache(dir.path());
    cache.set_memory_budget("Texture", 100);

    let a = cache.get::<Texture>("A.png")?;
    let b = cache.get::<Texture>("B.png")?;
    assert_eq!(cache.memory_use("Texture"), 120);

    drop(b);
    cache.update();
    assert_eq!(cache.memory_use("Texture"), 60);
    assert!(cache.get_existing("Texture", "B.png").is_none());

    assert!(cache.release("Texture", "A.png", false));
    assert_eq!(texture_bytes(&a), vec![7u8; 60]);
    assert_eq!(cache.total_memory_use(), 0);

    let reloaded = cache.get::<Texture>("A.png")?;
    assert!(!reloaded.ptr_eq(&a));
    assert_eq!(counts.textures(), 3);
    Ok(())
}

#[test]
fn test_memory_accounting_stays_exact_under_random_churn() {
    let mut cache = ResourceCache::new(CacheConfig {
        background_workers: 0,
        ..CacheConfig::default()
    });
    let mut rng = StdRng::seed_from_u64(0x1A2D);
    let mut held = Vec::new();

    for _ in 0..500 {
        match rng.gen_range(0..10) {
            0..=5 => {
                let name = format!("tex{}.png", rng.gen_range(0..24));
                let size = rng.gen_range(1..200);
                let handle = cache
                    .add_manual(&name, Texture { bytes: vec![0; size] })
                    .unwrap();
                if rng.gen_bool(0.2) {
                    held.push(handle);
                }
            }
            6 => {
                let name = format!("tex{}.png", rng.gen_range(0..24));
                cache.release("Texture", &name, false);
            }
            7 => cache.set_memory_budget("Texture", rng.gen_range(0..2000)),
            8 => {
                if !held.is_empty() {
                    held.swap_remove(rng.gen_range(0..held.len()));
                }
            }
            _ => cache.update(),
        }

        let sum: u64 = cache
            .resources_of_type("Texture")
            .iter()
            .map(|h| h.memory_use())
            .sum();
        assert_eq!(cache.total_memory_use(), sum);
        assert_eq!(cache.memory_use("Texture"), sum);
        assert_eq!(cache.memory_report().total_memory_use, sum);
    }
}

#[test]
fn test_outside_payload_swap_cannot_desync_accounting() -> Result<()> {
    let dir = tempdir()?;
    write(dir.path(), "A.png", [1u8; 10]);
    write(dir.path(), "B.png", [2u8; 10]);
    let (mut cache, _) = inline_cache(dir.path());

    let a = cache.get::<Texture>("A.png")?;
    a.replace_payload(ErasedResource::new(Texture { bytes: vec![0; 100] }));
    assert_eq!(a.memory_use(), 100);
    assert_eq!(cache.total_memory_use(), 10);
    assert!(cache.release("Texture", "A.png", false));
    assert_eq!(cache.total_memory_use(), 0);
    assert_eq!(cache.memory_use("Texture"), 0);

    let b = cache.get::<Texture>("B.png")?;
    b.replace_payload(ErasedResource::new(Texture { bytes: vec![0; 3] }));
    assert!(cache.reload_resource(b.identity()));
    assert_eq!(cache.memory_use("Texture"), 10);
    assert_eq!(cache.memory_report().total_memory_use, 10);
    Ok(())
}

#[test]
fn test_failed_loads_emit_one_event_per_attempt() {
    let dir = tempdir().unwrap();
    write(dir.path(), "bad.png", b"corrupt data");
    let (mut cache, _) = inline_cache(dir.path());

    let missing = identify("Texture", "missing.png");
    assert_eq!(
        cache.get_or_load("Texture", "missing.png", true).unwrap_err(),
        LoadError::NotFound("missing.png".into())
    );
    assert!(cache.get_or_load("Texture", "missing.png", true).is_err());
    assert!(cache.get_or_load("Texture", "missing.png", false).is_err());
    assert!(matches!(
        cache.get_or_load("Texture", "bad.png", true),
        Err(LoadError::DecodeFailed(_))
    ));
    assert!(matches!(
        cache.get_or_load("Sound", "a.wav", true),
        Err(LoadError::UnknownType(_))
    ));

    let events = cache.drain_events();
    assert_eq!(events.len(), 4);
    assert_eq!(events[0], ResourceEvent::ResourceNotFound(missing.clone()));
    assert_eq!(events[1], ResourceEvent::ResourceNotFound(missing));
    assert!(matches!(&events[2], ResourceEvent::LoadFailed { reason, .. } if reason == "corrupt texture"));
    assert!(matches!(&events[3], ResourceEvent::UnknownResourceType(_)));
    assert_eq!(cache.resource_count(), 0);
}

#[test]
fn test_failed_resources_can_be_returned_as_placeholders() {
    let dir = tempdir().unwrap();
    let (mut cache, _) = inline_cache(dir.path());
    cache.set_return_failed_resources(true);

    let placeholder = cache.get_or_load("Texture", "late.png", true).unwrap();
    assert!(placeholder.is_failed());
    assert_eq!(placeholder.memory_use(), 0);
    assert!(cache
        .get_existing("Texture", "late.png")
        .unwrap()
        .ptr_eq(&placeholder));

    write(dir.path(), "late.png", [3u8; 4]);
    assert!(cache.reload_resource(placeholder.identity()));
    assert!(!placeholder.is_failed());
    assert_eq!(texture_bytes(&placeholder), vec![3u8; 4]);
    assert_eq!(cache.total_memory_use(), 4);
}

#[test]
fn test_temporary_resources_are_never_cached() -> Result<()> {
    let dir = tempdir()?;
    write(dir.path(), "t.png", [1u8; 8]);
    write(dir.path(), "m.mat", "texture t.png\n");
    let (mut cache, counts) = inline_cache(dir.path());

    let first = cache.get_temporary("Texture", "t.png", true)?;
    let second = cache.get_temporary("Texture", "t.png", true)?;
    assert!(!first.ptr_eq(&second));
    assert_eq!(counts.textures(), 2);
    assert_eq!(cache.resource_count(), 0);

    let material = cache.get_temporary("Material", "m.mat", true)?;
    assert!(material.get::<Material>().is_some());
    assert!(cache.get_existing("Material", "m.mat").is_none());
    assert!(cache.get_existing("Texture", "t.png").is_some());
    assert_eq!(cache.dependencies().edge_count(), 0);

    assert!(matches!(
        cache.get_temporary("Texture", "../t.png", true),
        Err(LoadError::InvalidName(_))
    ));
    Ok(())
}

#[test]
fn test_dependencies_are_loaded_and_recorded() -> Result<()> {
    let dir = tempdir()?;
    write(dir.path(), "a.png", [1u8; 2]);
    write(dir.path(), "b.png", [2u8; 2]);
    write(dir.path(), "m.mat", "texture a.png\ntexture b.png\n");
    let (mut cache, _) = inline_cache(dir.path());

    let material = cache.get::<Material>("m.mat")?;
    assert_eq!(cache.resource_count(), 3);

    let dependents = cache
        .dependencies()
        .dependents_of(&identify("Texture", "a.png"));
    assert_eq!(dependents, vec![material.identity().clone()]);
    let dependencies: Vec<ResourceIdentity> =
        cache.dependencies().dependencies_of(material.identity());
    assert_eq!(dependencies.len(), 2);
    Ok(())
}

#[test]
fn test_packages_shadow_directories_until_the_order_is_flipped() -> Result<()> {
    let root = tempdir()?;
    let dir = root.path().join("D");
    write(&dir, "tex.png", b"from-directory");
    let package_path = root.path().join("P.pak");
    let mut builder = PackageBuilder::new();
    builder.add_bytes("tex.png", b"from-package".to_vec())?;
    builder.write_to(&package_path)?;

    let mut cache = ResourceCache::new(CacheConfig {
        background_workers: 0,
        ..CacheConfig::default()
    });
    common::register_decoders(&mut cache);
    cache.add_package_file(&package_path, 0)?;
    cache.add_resource_dir(&dir, 1)?;
    assert!(cache.search_packages_first());

    let packed = cache.get::<Texture>("tex.png")?;
    assert_eq!(texture_bytes(&packed), b"from-package");
    assert_eq!(cache.resource_file_name("tex.png"), Some(fs::canonicalize(&dir)?.join("tex.png")));

    cache.set_search_packages_first(false);
    assert!(cache.release("Texture", "tex.png", true));
    let loose = cache.get_existing("Texture", "tex.png").unwrap();
    assert_eq!(texture_bytes(&loose), b"from-directory");

    cache.set_search_packages_first(true);
    cache.release_all(Some("Texture"), false);
    cache.get::<Texture>("tex.png")?;
    assert!(cache.remove_package_file(&package_path, true, true));
    let reloaded = cache.get_existing("Texture", "tex.png").unwrap();
    assert_eq!(texture_bytes(&reloaded), b"from-directory");
    assert!(cache.package_files().is_empty());
    Ok(())
}
