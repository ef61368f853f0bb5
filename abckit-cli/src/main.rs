use abckit_cli::{
    app::{self, Cli},
    run,
};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            // help and version go to stdout, usage errors to stderr
            let _ = error.print();
            std::process::exit(app::exit_code(&error));
        }
    };

    // abckit info+ on stderr; --verbose enables debug; RUST_LOG overrides
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("abckit", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    if let Err(error) = ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    }) {
        log::warn!("failed to set Ctrl+C handler: {error}");
    }

    run::run(&cli)
}
