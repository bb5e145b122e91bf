//! tagver CLI
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use tagver::Cli;
use tagver_core::ReleaseEvent;
use tagver_core::config::ConfigLoader;
use tracing::debug;

mod checkpoint;
mod observability;

fn main() {
    let cli = Cli::parse();
    cli.color.apply();

    match run(&cli) {
        Ok(()) => {}
        Err(err) => {
            let renderer = checkpoint::Renderer::new(cli.silent, cli.dry_run);
            renderer.render_error(&err);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if let Some(ref dir) = cli.chdir {
        std::env::set_current_dir(dir)
            .with_context(|| format!("failed to change directory to {}", dir.display()))?;
    }

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let cwd = camino::Utf8PathBuf::try_from(cwd).map_err(|e| {
        anyhow::anyhow!(
            "current directory is not valid UTF-8: {}",
            e.into_path_buf().display()
        )
    })?;
    let mut loader = ConfigLoader::new().with_project_search(&cwd);
    if let Some(ref config_path) = cli.config {
        let config_path = camino::Utf8PathBuf::try_from(config_path.clone()).map_err(|e| {
            anyhow::anyhow!(
                "config path is not valid UTF-8: {}",
                e.into_path_buf().display()
            )
        })?;
        loader = loader.with_file(&config_path);
    }
    let mut config = loader.load().context("failed to load configuration")?;
    cli.apply_overrides(&mut config);
    let deprecations = config.modernize();

    let obs_config = observability::ObservabilityConfig::from_env_with_overrides(
        config
            .log_dir
            .as_ref()
            .map(|dir| dir.as_std_path().to_path_buf()),
    );
    let env_filter = observability::env_filter(cli.quiet, cli.verbose, config.log_level.as_str());
    let _guard = observability::init_observability(&obs_config, env_filter)
        .context("failed to initialize logging")?;

    debug!(
        verbose = cli.verbose,
        quiet = cli.quiet,
        color = ?cli.color,
        chdir = ?cli.chdir,
        dry_run = config.dry_run,
        "CLI initialized"
    );

    if !tagver_core::git::is_inside_repo().unwrap_or(false) {
        anyhow::bail!("{} is not inside a git repository", cwd);
    }

    let renderer = checkpoint::Renderer::new(config.silent, config.dry_run);
    for warning in deprecations {
        renderer.render(&ReleaseEvent::Warning(warning));
    }

    let outcome = tagver_core::release::run(&cwd, &config, &mut |event| renderer.render(&event))?;
    debug!(
        previous = %outcome.previous,
        version = %outcome.version,
        tag = %outcome.tag,
        "release complete"
    );
    Ok(())
}
