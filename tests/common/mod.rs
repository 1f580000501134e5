// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use kiln::{Kitchen, KitchenConfig};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Script shipped in the fixture tarball
pub const HELLO: &str = "#!/bin/sh\necho hello from kiln\n";

/// A scratch project root with a Kitchen pointed at it.
///
/// Keep the TempDir alive to prevent cleanup.
pub fn project() -> (TempDir, Kitchen) {
    let temp = tempfile::tempdir().unwrap();
    let kitchen = Kitchen::new(KitchenConfig::new(temp.path()).with_jobs(2));
    (temp, kitchen)
}

/// True when every tool is on PATH; prints a skip note otherwise.
pub fn tools_available(tools: &[&str]) -> bool {
    for tool in tools {
        if which::which(tool).is_err() {
            eprintln!("Skipping: {} not available", tool);
            return false;
        }
    }
    true
}

/// Write a gzip tarball whose entries all live under `top/`.
pub fn write_tarball(path: &Path, top: &str, files: &[(&str, &str)]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = File::create(path).unwrap();
    let gz = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(gz);
    for (name, body) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/{}", top, name), body.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

/// Upstream source tarball for the `foo` fixture; returns its path.
pub fn upstream_foo(root: &Path) -> PathBuf {
    let path = root.join("upstream/foo-1.0.tar.gz");
    write_tarball(
        &path,
        "foo-1.0",
        &[("hello.in", HELLO), ("README", "foo is a test package\n")],
    );
    path
}

/// Write `recipes/<name>/<name>.ini`.
pub fn write_recipe(root: &Path, name: &str, body: &str) -> PathBuf {
    let path = root.join("recipes").join(name).join(format!("{}.ini", name));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, body).unwrap();
    path
}

/// Recipe text for `foo` built with plain shell commands.
pub fn foo_recipe(source: &Path, checksum: Option<&str>, extra_package: &str) -> String {
    let checksum = checksum
        .map(|c| format!("checksum={}\n", c))
        .unwrap_or_default();
    format!(
        r#"[package]
name=foo
version=1.0
desc="fixture package"
source=file://{source}
{checksum}fakeroot=no
pack=gz
{extra_package}

[build]
config=echo configured > .configured
build=test -f .configured && cp hello.in hello && chmod +x hello
install=mkdir -p "$DESTDIR$PREFIX/bin" "$DESTDIR$PREFIX/share/doc/foo" && cp hello "$DESTDIR$PREFIX/bin/" && cp README "$DESTDIR$PREFIX/share/doc/foo/"

[hooks]
postremove=echo "$DESTDIR" > postremove.ran
"#,
        source = source.display(),
    )
}

/// Run git in `dir` with a throwaway identity; panics on failure.
pub fn git(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args([
            "-c",
            "user.name=kiln tests",
            "-c",
            "user.email=tests@kiln.invalid",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {:?} failed in {}", args, dir.display());
}

/// Write `files` into `dir` and commit them, creating the repository first
/// if needed.
pub fn git_commit(dir: &Path, files: &[(&str, &str)], message: &str) {
    if !dir.join(".git").exists() {
        fs::create_dir_all(dir).unwrap();
        git(dir, &["init", "-q"]);
    }
    for (name, body) in files {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, body).unwrap();
    }
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
}

/// Every path under `root`, relative and sorted.
pub fn snapshot(root: &Path) -> Vec<String> {
    let mut paths: Vec<String> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.path().strip_prefix(root).unwrap().display().to_string())
        .collect();
    paths.sort();
    paths
}
