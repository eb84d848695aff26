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

use larder_core::ResolveError;
use larder_io::{PackageBuilder, SearchPathResolver, SourceOrigin, PRIORITY_LAST};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn write_package(dir: &Path, file: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(file);
    let mut builder = PackageBuilder::new().compress(true);
    for (name, bytes) in entries {
        builder.add_bytes(name, bytes.to_vec()).unwrap();
    }
    builder.write_to(&path).unwrap();
    path
}

/// Package `P` (priority 0) and directory `D` (priority 1) both provide `tex.png`.
fn package_and_directory() -> (TempDir, SearchPathResolver) {
    let root = tempdir().unwrap();
    let dir = root.path().join("D");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("tex.png"), b"from-directory").unwrap();
    let package = write_package(root.path(), "P.pak", &[("tex.png", b"from-package")]);

    let resolver = SearchPathResolver::new(false);
    resolver.add_package_path(&package, 0).unwrap();
    resolver.add_resource_dir(&dir, 1).unwrap();
    (root, resolver)
}

#[test]
fn test_search_order_follows_the_packages_first_flag() {
    let (_root, resolver) = package_and_directory();

    let source = resolver.resolve("tex.png").unwrap();
    assert_eq!(source.bytes(), b"from-directory");
    assert!(matches!(source.origin(), SourceOrigin::Directory { .. }));

    resolver.set_search_packages_first(true);
    let source = resolver.resolve("tex.png").unwrap();
    assert_eq!(source.bytes(), b"from-package");
    assert!(matches!(source.origin(), SourceOrigin::Package { .. }));

    resolver.set_search_packages_first(false);
    assert_eq!(resolver.resolve("tex.png").unwrap().bytes(), b"from-directory");
}

#[test]
fn test_lower_priority_directory_wins() {
    let root = tempdir().unwrap();
    let first = root.path().join("first");
    let second = root.path().join("second");
    for (dir, content) in [(&first, "first"), (&second, "second")] {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("config.json"), content).unwrap();
    }

    let resolver = SearchPathResolver::new(true);
    resolver.add_resource_dir(&second, PRIORITY_LAST).unwrap();
    resolver.add_resource_dir(&first, 0).unwrap();

    assert_eq!(resolver.resolve("config.json").unwrap().bytes(), b"first");
    assert_eq!(resolver.resource_dirs().len(), 2);

    assert!(resolver.remove_resource_dir(&first));
    assert_eq!(resolver.resolve("config.json").unwrap().bytes(), b"second");
}

#[test]
fn test_higher_priority_package_shadows_later_ones() {
    let root = tempdir().unwrap();
    let base = write_package(root.path(), "base.pak", &[("a.txt", b"base"), ("b.txt", b"only-base")]);
    let patch = write_package(root.path(), "patch.pak", &[("a.txt", b"patch")]);

    let resolver = SearchPathResolver::new(true);
    resolver.add_package_path(&base, PRIORITY_LAST).unwrap();
    resolver.add_package_path(&patch, 0).unwrap();

    assert_eq!(resolver.resolve("a.txt").unwrap().bytes(), b"patch");
    assert_eq!(resolver.resolve("b.txt").unwrap().bytes(), b"only-base");

    let removed = resolver.remove_package_file(&patch).expect("patch was mounted");
    assert_eq!(removed.list_entries().collect::<Vec<_>>(), vec!["a.txt"]);
    assert_eq!(resolver.resolve("a.txt").unwrap().bytes(), b"base");
}

#[test]
fn test_exists_and_missing_names() {
    let (_root, resolver) = package_and_directory();
    assert!(resolver.exists("tex.png"));
    assert!(resolver.exists("./tex.png"));
    assert!(!resolver.exists("other.png"));
    assert_eq!(
        resolver.resolve("other.png").unwrap_err(),
        ResolveError::NotFound("other.png".into())
    );
}

#[test]
fn test_traversal_is_rejected_before_lookup() {
    let (root, resolver) = package_and_directory();
    fs::write(root.path().join("secret.txt"), b"secret").unwrap();

    assert_eq!(
        resolver.resolve("../secret.txt").unwrap_err(),
        ResolveError::InvalidName("../secret.txt".into())
    );
    assert!(!resolver.exists("../secret.txt"));
}

#[test]
fn test_absolute_names_under_a_root_resolve() {
    let (_root, resolver) = package_and_directory();
    let dir = resolver.resource_dirs()[0].clone();
    let absolute = dir.join("tex.png");

    let file_name = resolver.resource_file_name("tex.png").unwrap();
    assert_eq!(file_name, absolute);
    assert_eq!(
        resolver.sanitize_name(&absolute.to_string_lossy()).unwrap(),
        "tex.png"
    );
    assert_eq!(resolver.preferred_resource_dir(Path::new("tex.png")), Some(dir));
}

#[test]
fn test_preferred_dir_never_leaves_the_mounted_roots() {
    let (root, resolver) = package_and_directory();
    let secret = root.path().join("secret.txt");
    fs::write(&secret, b"secret").unwrap();
    let dir = resolver.resource_dirs()[0].clone();

    assert_eq!(resolver.preferred_resource_dir(&secret), None);
    assert_eq!(resolver.preferred_resource_dir(Path::new("../secret.txt")), None);
    assert_eq!(
        resolver.preferred_resource_dir(&dir.join("tex.png")),
        Some(dir.clone())
    );
    assert_eq!(resolver.preferred_resource_dir(Path::new("sub/../tex.png")), Some(dir));
}
