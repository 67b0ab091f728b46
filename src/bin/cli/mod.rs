//! Command line surface of `qpdftools-build`.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use qpdftools_build::{BuildRequest, BuildType, Platform};

/// Variable holding the log filter directive, e.g. `QPDFTOOLS_LOG=debug`.
pub(crate) const LOG_ENV: &str = "QPDFTOOLS_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PlatformArg {
    /// Detect from the host
    Auto,
    Windows,
    Linux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum BuildTypeArg {
    Debug,
    Release,
}

/// Build QPDFTools and create its distributable packages.
#[derive(Debug, Parser)]
#[command(name = "qpdftools-build", version)]
pub(crate) struct Cli {
    /// Target platform
    #[arg(long, value_enum, default_value_t = PlatformArg::Auto)]
    pub platform: PlatformArg,

    /// Build type
    #[arg(long = "type", value_enum, default_value_t = BuildTypeArg::Release)]
    pub build_type: BuildTypeArg,

    /// Create the NSIS installer (Windows)
    #[arg(long, visible_alias = "installer")]
    pub package: bool,

    /// Create the portable package
    #[arg(long)]
    pub portable: bool,

    /// Build the Flatpak (Linux)
    #[arg(long, conflicts_with_all = ["package", "portable"])]
    pub flatpak: bool,

    /// Project root containing CMakeLists.txt [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Packaging config [default: <project>/packaging.toml when present]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub(crate) fn request(&self) -> BuildRequest {
        let platform = match self.platform {
            PlatformArg::Auto => Platform::host(),
            PlatformArg::Windows => Platform::Windows,
            PlatformArg::Linux => Platform::Linux,
        };
        let build_type = match self.build_type {
            BuildTypeArg::Debug => BuildType::Debug,
            BuildTypeArg::Release => BuildType::Release,
        };
        BuildRequest {
            platform,
            build_type,
            want_installer: self.package,
            want_portable: self.portable,
            want_flatpak: self.flatpak,
        }
    }

    /// Absolute project directory; relative values are taken from the
    /// current directory.
    pub(crate) fn project_dir(&self) -> Result<PathBuf> {
        let cwd = std::env::current_dir().context("resolving current directory")?;
        Ok(match &self.project_dir {
            Some(dir) => cwd.join(dir),
            None => cwd,
        })
    }
}

pub(crate) fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("qpdftools-build").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_build_release_for_host() {
        let cli = parse(&[]).unwrap();
        let request = cli.request();

        assert_eq!(request.platform, Platform::host());
        assert_eq!(request.build_type, BuildType::Release);
        assert!(!request.needs_install());
        assert!(!request.want_flatpak);
    }

    #[test]
    fn installer_is_an_alias_for_package() {
        let cli = parse(&["--installer", "--platform", "windows", "--type", "debug"]).unwrap();
        let request = cli.request();

        assert!(request.want_installer);
        assert_eq!(request.platform, Platform::Windows);
        assert_eq!(request.build_type, BuildType::Debug);
    }

    #[test]
    fn flatpak_conflicts_with_packaging() {
        assert!(parse(&["--flatpak", "--portable"]).is_err());
        assert!(parse(&["--flatpak", "--package"]).is_err());
        assert!(parse(&["--flatpak", "--platform", "linux"]).is_ok());
    }

    #[test]
    fn flatpak_help_describes_a_build_only() {
        let command = Cli::command();
        let flatpak = command
            .get_arguments()
            .find(|arg| arg.get_id() == "flatpak")
            .unwrap();
        let help = flatpak.get_help().unwrap().to_string();

        assert!(help.contains("Build the Flatpak"));
        assert!(!help.contains("install"));
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(parse(&["--platform", "macos"]).is_err());
        assert!(parse(&["--type", "relwithdebinfo"]).is_err());
    }

    #[test]
    fn relative_project_dir_is_anchored() {
        let cli = parse(&["--project-dir", "qpdftools"]).unwrap();
        let dir = cli.project_dir().unwrap();

        assert!(dir.is_absolute());
        assert!(dir.ends_with("qpdftools"));
    }
}
