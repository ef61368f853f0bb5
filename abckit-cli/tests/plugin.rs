//! Loading a real shared-library plugin, through the library and through the `abckit` binary.

mod common;

use std::process::Command;

use abckit::prelude::*;
use abckit_cli::{
    app::{Cli, Validation},
    run,
};
use common::{input_file, plugin_named};

fn cli(input: &std::path::Path, plugin: &std::path::Path) -> Cli {
    Cli {
        input_file: input.to_path_buf(),
        plugin_path: plugin.to_path_buf(),
        output_file: None,
        lifecycle: false,
        validation: Validation::Production,
        verbose: false,
    }
}

#[test]
fn test_entry_plugin_runs() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut file = AbcFile::from_path(&input_file(dir.path()))?;

    let plugin = NativePlugin::load(&plugin_named(dir.path(), "fixture"))?;
    assert_eq!(plugin.name(), "fixture");
    let mut driver = PluginDriver::new(plugin);
    driver.run_to_completion(&mut file)?;
    assert_eq!(driver.state(), State::Detached);
    Ok(())
}

#[test]
fn test_lifecycle_plugin_runs_stages_in_order() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut file = AbcFile::from_path(&input_file(dir.path()))?;

    // the fixture stages report out of order calls with a non-zero code
    let plugin = NativePlugin::load_lifecycle(&plugin_named(dir.path(), "fixture"))?;
    let mut driver = PluginDriver::new(plugin);
    driver.initialize()?;
    driver.after_parse(&mut file)?;
    driver.after_check(&mut file)?;
    driver.after_lowerings(&mut file)?;
    driver.detach()?;

    let mut rerun = PluginDriver::new(driver.into_inner());
    rerun.run_to_completion(&mut file)?;
    assert_eq!(rerun.state(), State::Detached);
    Ok(())
}

#[test]
fn test_lifecycle_plugin_failure_stops_the_driver() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut file = AbcFile::from_path(&input_file(dir.path()))?;

    let plugin = NativePlugin::load_lifecycle(&plugin_named(dir.path(), "failing"))?;
    let mut driver = PluginDriver::new(plugin);
    match driver.run_to_completion(&mut file) {
        Err(Error::PluginFailed { stage, code }) => {
            assert_eq!(stage, "AfterCheck");
            assert_eq!(code, 7);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(driver.state(), State::AfterParse);
    Ok(())
}

#[test]
fn test_lifecycle_symbols_follow_the_library_name() -> Result<()> {
    let dir = tempfile::tempdir()?;
    match NativePlugin::load_lifecycle(&plugin_named(dir.path(), "renamed")) {
        Err(Error::SymbolNotFound(symbol)) => assert_eq!(symbol, "renamed_Initialize"),
        other => panic!("unexpected {other:?}"),
    }
    Ok(())
}

#[test]
fn test_run_writes_output() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = input_file(dir.path());
    let output = dir.path().join("output.abc");

    let mut args = cli(&input, &plugin_named(dir.path(), "fixture"));
    args.output_file = Some(output.clone());
    run::run(&args)?;

    let written = AbcFile::from_path(&output)?;
    assert_eq!(written.modules().count(), 2);
    Ok(())
}

#[test]
fn test_run_reports_plugin_failure() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = input_file(dir.path());
    let output = dir.path().join("output.abc");

    let mut args = cli(&input, &plugin_named(dir.path(), "failing"));
    args.lifecycle = true;
    args.output_file = Some(output.clone());
    let error = run::run(&args).unwrap_err();

    let failure = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .expect("abckit error in the chain");
    assert!(matches!(failure, Error::PluginFailed { code: 7, .. }));
    assert!(!output.exists());
    Ok(())
}

fn abckit(args: &[&std::ffi::OsStr]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_abckit"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run abckit")
}

#[test]
fn test_exit_codes() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = input_file(dir.path());
    let fixture = plugin_named(dir.path(), "fixture");
    let failing = plugin_named(dir.path(), "failing");
    let output = dir.path().join("output.abc");

    let ok = abckit(&[
        "--input-file".as_ref(),
        input.as_os_str(),
        "--plugin-path".as_ref(),
        fixture.as_os_str(),
        "--output-file".as_ref(),
        output.as_os_str(),
    ]);
    assert_eq!(ok.status.code(), Some(0));
    assert!(output.exists());

    let lifecycle = abckit(&[
        "--input-file".as_ref(),
        input.as_os_str(),
        "--plugin-path".as_ref(),
        fixture.as_os_str(),
        "--lifecycle".as_ref(),
    ]);
    assert_eq!(lifecycle.status.code(), Some(0));

    let failed = abckit(&[
        "--input-file".as_ref(),
        input.as_os_str(),
        "--plugin-path".as_ref(),
        failing.as_os_str(),
        "--lifecycle".as_ref(),
    ]);
    assert_eq!(failed.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&failed.stderr);
    assert!(stderr.contains("failed with code 7"), "{stderr}");

    let missing_input = abckit(&[
        "--input-file".as_ref(),
        dir.path().join("absent.abc").as_os_str(),
        "--plugin-path".as_ref(),
        fixture.as_os_str(),
    ]);
    assert_eq!(missing_input.status.code(), Some(1));
    if cfg!(unix) {
        let stderr = String::from_utf8_lossy(&missing_input.stderr);
        assert_eq!(stderr.matches("No such file or directory").count(), 1, "{stderr}");
    }
    Ok(())
}

#[test]
fn test_argument_errors_exit_with_one() {
    let none = abckit(&[]);
    assert_eq!(none.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&none.stderr).contains("required"));

    let bad_level = abckit(&[
        "--input-file".as_ref(),
        "a".as_ref(),
        "--plugin-path".as_ref(),
        "b".as_ref(),
        "--validation".as_ref(),
        "paranoid".as_ref(),
    ]);
    assert_eq!(bad_level.status.code(), Some(1));

    let help = abckit(&["--help".as_ref()]);
    assert_eq!(help.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&help.stdout).contains("--plugin-path"));

    let version = abckit(&["--version".as_ref()]);
    assert_eq!(version.status.code(), Some(0));
}
