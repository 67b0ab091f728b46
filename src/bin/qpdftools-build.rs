use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use qpdftools_build::artifact::{LocalDirectories, ZipArchiver};
use qpdftools_build::env::ProcessEnv;
use qpdftools_build::process::SystemRunner;
use qpdftools_build::stages::flatpak::HttpFetcher;
use qpdftools_build::{Layout, PackagingConfig, PackagingContext, Pipeline};

mod cli;

use cli::Cli;

fn main() -> ExitCode {
    cli::init_logging();

    match run(&Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let request = cli.request();
    let project_dir = cli.project_dir()?;
    let config = PackagingConfig::resolve(&project_dir, cli.config.as_deref())?;
    let fetcher = HttpFetcher::new()?;

    let ctx = PackagingContext {
        layout: Layout::resolve(&project_dir, &config.paths),
        config: &config,
        runner: &SystemRunner,
        dirs: &LocalDirectories,
        archiver: &ZipArchiver,
        env: &ProcessEnv,
        fetcher: &fetcher,
    };
    let report = Pipeline::new(ctx).run(&request)?;

    if report.artifacts.is_empty() {
        tracing::info!("Build completed");
    } else {
        tracing::info!("Build completed, {} artifact(s):", report.artifacts.len());
        for artifact in &report.artifacts {
            tracing::info!("  {}", artifact.display());
        }
    }
    Ok(())
}
