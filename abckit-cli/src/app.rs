use std::path::PathBuf;

use clap::{error::ErrorKind, Parser, ValueEnum};

/// abckit - run a transformation plugin over an abc bytecode file
#[derive(Debug, Parser)]
#[command(name = "abckit", version, about, long_about = None)]
pub struct Cli {
    /// Bytecode file to open.
    #[arg(long, value_name = "FILE")]
    pub input_file: PathBuf,

    /// Shared library implementing the plugin.
    #[arg(long, value_name = "FILE")]
    pub plugin_path: PathBuf,

    /// Where to write the transformed file. Nothing is written without it.
    #[arg(long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Drive the `<name>_Initialize` .. `<name>_AfterLowerings` functions instead of `Entry`.
    #[arg(long)]
    pub lifecycle: bool,

    /// Checks run while opening the input.
    #[arg(long, value_enum, default_value_t = Validation::Production)]
    pub validation: Validation,

    /// Enable verbose (debug-level) logging output.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Named validation presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Validation {
    Disabled,
    Minimal,
    Production,
    Strict,
}

impl From<Validation> for abckit::ValidationConfig {
    fn from(level: Validation) -> Self {
        match level {
            Validation::Disabled => abckit::ValidationConfig::disabled(),
            Validation::Minimal => abckit::ValidationConfig::minimal(),
            Validation::Production => abckit::ValidationConfig::production(),
            Validation::Strict => abckit::ValidationConfig::strict(),
        }
    }
}

/// Process exit code for a failed parse: `0` after printing help or the version, `1` for any
/// invalid invocation.
#[must_use]
pub fn exit_code(error: &clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_options() {
        let cli = Cli::try_parse_from([
            "abckit",
            "--input-file",
            "in.abc",
            "--plugin-path",
            "libplugin.so",
            "--output-file",
            "out.abc",
            "--lifecycle",
            "--validation",
            "strict",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.input_file, PathBuf::from("in.abc"));
        assert_eq!(cli.plugin_path, PathBuf::from("libplugin.so"));
        assert_eq!(cli.output_file, Some(PathBuf::from("out.abc")));
        assert!(cli.lifecycle && cli.verbose);
        assert_eq!(cli.validation, Validation::Strict);
    }

    #[test]
    fn defaults() {
        let cli =
            Cli::try_parse_from(["abckit", "--input-file", "a", "--plugin-path", "b"]).unwrap();
        assert_eq!(cli.output_file, None);
        assert!(!cli.lifecycle);
        assert_eq!(cli.validation, Validation::Production);
    }

    #[test]
    fn invalid_invocations_exit_with_one() {
        let missing = Cli::try_parse_from(["abckit", "--input-file", "a"]).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::MissingRequiredArgument);
        assert_eq!(exit_code(&missing), 1);

        let unknown = Cli::try_parse_from([
            "abckit",
            "--input-file",
            "a",
            "--plugin-path",
            "b",
            "--validation",
            "paranoid",
        ])
        .unwrap_err();
        assert_eq!(exit_code(&unknown), 1);

        let stray = Cli::try_parse_from(["abckit", "--frobnicate"]).unwrap_err();
        assert_eq!(exit_code(&stray), 1);
    }

    #[test]
    fn help_and_version_exit_with_zero() {
        let help = Cli::try_parse_from(["abckit", "--help"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
        assert_eq!(exit_code(&help), 0);

        let version = Cli::try_parse_from(["abckit", "--version"]).unwrap_err();
        assert_eq!(version.kind(), ErrorKind::DisplayVersion);
        assert_eq!(exit_code(&version), 0);
    }
}
