//! Fixtures shared by the CLI tests.
#![allow(dead_code)]

use std::{
    env::consts::{DLL_PREFIX, DLL_SUFFIX},
    path::{Path, PathBuf},
    process::Command,
    sync::OnceLock,
};

use abckit::prelude::*;

/// Builds the `abckit-test-plugin` library once per test binary.
fn plugin_library() -> &'static Path {
    static LIBRARY: OnceLock<PathBuf> = OnceLock::new();
    LIBRARY.get_or_init(|| {
        // a target dir of its own, the outer cargo keeps the workspace one locked
        let target_dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("test-plugin");
        let status = Command::new(env!("CARGO"))
            .current_dir(env!("CARGO_MANIFEST_DIR"))
            .args(["build", "--quiet", "--package", "abckit-test-plugin", "--target-dir"])
            .arg(&target_dir)
            .status()
            .expect("failed to run cargo");
        assert!(status.success(), "building abckit-test-plugin failed: {status}");
        target_dir
            .join("debug")
            .join(format!("{DLL_PREFIX}abckit_test_plugin{DLL_SUFFIX}"))
    })
}

/// Copies the test plugin into `dir` under the plugin name `name`, which selects the
/// `<name>_*` lifecycle functions.
pub fn plugin_named(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(format!("{DLL_PREFIX}{name}{DLL_SUFFIX}"));
    std::fs::copy(plugin_library(), &path).expect("failed to copy the test plugin");
    path
}

/// Writes a dynamic file with the modules `index` and `lib` to `dir/input.abc`.
pub fn input_file(dir: &Path) -> PathBuf {
    let mut file = AbcFile::new(Target::Dynamic);
    file.add_module("index", ModuleFlags::empty()).unwrap();
    file.add_module("lib", ModuleFlags::EXTERNAL).unwrap();

    let path = dir.join("input.abc");
    file.write(&path).unwrap();
    path
}
