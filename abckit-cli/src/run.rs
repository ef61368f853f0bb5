use anyhow::Context;
use abckit::{
    plugin::{NativePlugin, PluginDriver},
    AbcFile,
};

use crate::app::Cli;

/// Opens the input, drives the plugin through every stage and writes the result.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut file = AbcFile::from_path_with_validation(&cli.input_file, cli.validation.into())
        .with_context(|| format!("failed to open {}", cli.input_file.display()))?;
    log::info!(
        "opened {} ({} target, {} modules)",
        cli.input_file.display(),
        file.target(),
        file.modules().count()
    );

    let plugin = if cli.lifecycle {
        NativePlugin::load_lifecycle(&cli.plugin_path)
    } else {
        NativePlugin::load(&cli.plugin_path)
    }
    .with_context(|| format!("failed to load plugin {}", cli.plugin_path.display()))?;

    let mut driver = PluginDriver::new(plugin);
    driver.run_to_completion(&mut file).with_context(|| {
        format!(
            "plugin {} failed in stage after {}",
            cli.plugin_path.display(),
            driver.state()
        )
    })?;

    match &cli.output_file {
        Some(output) => {
            file.write(output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            log::info!("wrote {}", output.display());
        }
        None => log::info!("no --output-file given, result discarded"),
    }
    Ok(())
}
