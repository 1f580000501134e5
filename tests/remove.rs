// tests/remove.rs

//! Manifest-driven removal and the revdep check.

mod common;

use common::*;
use kiln::{CookOptions, Error};
use std::fs;

#[test]
fn test_remove_unknown_package_mutates_nothing() {
    let (temp, kitchen) = project();
    let upstream = temp.path().join("upstream/foo-1.0.tar.gz");
    write_recipe(temp.path(), "foo", &foo_recipe(&upstream, None, ""));
    fs::create_dir_all(kitchen.layout().staging_dir("bar-2.0/usr/bin")).unwrap();
    fs::write(kitchen.layout().staging_dir("bar-2.0/usr/bin/bar"), "bar").unwrap();

    let before = snapshot(temp.path());
    let err = kitchen.remove("bar").unwrap_err();
    assert!(matches!(err, Error::NotRegistered(_)));
    assert_eq!(err.exit_code(), 12);
    assert_eq!(snapshot(temp.path()), before);
}

#[test]
fn test_remove_after_install() {
    if !tools_available(&["sh", "tar", "curl"]) {
        return;
    }
    let (temp, kitchen) = project();
    let upstream = upstream_foo(temp.path());
    write_recipe(temp.path(), "foo", &foo_recipe(&upstream, None, ""));
    let recipe = kitchen.load_recipe("foo").unwrap();
    let result = kitchen.cook(&recipe, CookOptions::default()).unwrap();

    // A file the manifest never saw
    fs::write(result.staging.join("usr/bin/leftover"), "x").unwrap();
    // A listed file that is already gone
    fs::remove_file(result.staging.join("usr/share/doc/foo/README")).unwrap();

    let outcome = kitchen.remove("foo").unwrap();
    assert_eq!(outcome.removal.id, "foo-1.0");
    assert_eq!(outcome.removal.listed, 2);
    assert_eq!(outcome.removal.removed, 1);
    assert_eq!(outcome.removal.unmanifested, 1);
    assert!(!outcome.warnings.is_empty());
    assert!(!result.staging.exists());
    assert!(!result.registry_entry.exists());

    // postremove ran from the project root with the staging root as DESTDIR
    assert!(outcome.hook_ran);
    let marker = fs::read_to_string(temp.path().join("postremove.ran")).unwrap();
    assert_eq!(marker.trim(), result.staging.display().to_string());

    // Second removal has nothing left to find
    assert!(matches!(kitchen.remove("foo-1.0"), Err(Error::NotRegistered(_))));
}

#[test]
fn test_failed_hook_still_deletes_registry_entry() {
    if !tools_available(&["sh", "tar", "curl"]) {
        return;
    }
    let (temp, kitchen) = project();
    let upstream = upstream_foo(temp.path());
    let text = foo_recipe(&upstream, None, "")
        .replace("postremove=echo \"$DESTDIR\" > postremove.ran", "postremove=exit 3");
    write_recipe(temp.path(), "foo", &text);
    let recipe = kitchen.load_recipe("foo").unwrap();
    let result = kitchen.cook(&recipe, CookOptions::default()).unwrap();

    let outcome = kitchen.remove("foo-1.0").unwrap();
    assert!(!outcome.hook_ran);
    assert!(outcome.warnings.iter().any(|w| w.contains("postremove")));
    assert!(!result.registry_entry.exists());
}

#[test]
fn test_missing_manifest_is_reported() {
    let (_temp, kitchen) = project();
    let entry = kitchen.registry().dir().join("foo-1.0");
    fs::create_dir_all(&entry).unwrap();

    let err = kitchen.remove("foo").unwrap_err();
    assert!(matches!(err, Error::ManifestMissing(_)));
    assert_eq!(err.exit_code(), 13);
    assert!(entry.exists());
}

#[test]
fn test_bi_reports_revdep_without_failing() {
    if !tools_available(&["sh", "tar", "curl"]) {
        return;
    }
    let (temp, kitchen) = project();
    let upstream = upstream_foo(temp.path());
    write_recipe(temp.path(), "foo", &foo_recipe(&upstream, None, ""));
    let recipe = kitchen.load_recipe("foo").unwrap();

    let result = kitchen.cook(&recipe, CookOptions { revdep: true }).unwrap();
    let report = result.revdep.unwrap();
    // Only shell scripts were installed
    assert_eq!(report.scanned, 0);
    assert!(report.is_clean());
}
