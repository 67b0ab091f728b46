//! Stage orchestration.
//!
//! ```text
//! preflight -> configure -> build
//!     -> [install -> installer (Windows) -> portable -> checksums]
//!     -> [flatpak (Linux)]
//! ```
//!
//! Any stage error aborts the run; nothing after it executes.

pub mod context;

pub use context::{Layout, PackagingContext};

use anyhow::Result;
use std::path::PathBuf;

use crate::artifact::write_checksum;
use crate::locator::ToolLocator;
use crate::preflight;
use crate::request::{BuildRequest, Platform};
use crate::stages::{build, flatpak, install, installer, portable};
use crate::version::ProjectVersion;

/// Artifacts placed into the installers directory by one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub artifacts: Vec<PathBuf>,
    pub checksums: Vec<PathBuf>,
}

pub struct Pipeline<'a> {
    ctx: PackagingContext<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(ctx: PackagingContext<'a>) -> Self {
        Self { ctx }
    }

    /// Run every stage `request` asks for, in order.
    ///
    /// # Arguments
    ///
    /// * `request` - Parsed command line request
    ///
    /// # Returns
    ///
    /// * `Ok(report)` - artifacts placed into the installers directory and
    ///   their checksum files
    /// * `Err` from the first failing stage; later stages do not run
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let report = Pipeline::new(ctx).run(&request)?;
    /// for artifact in &report.artifacts {
    ///     println!("{}", artifact.display());
    /// }
    /// ```
    pub fn run(&self, request: &BuildRequest) -> Result<PipelineReport> {
        let ctx = &self.ctx;
        tracing::info!(
            "Building {} ({}) for {} in {}",
            ctx.config.app.name,
            request.build_type,
            request.platform,
            ctx.layout.project_dir.display()
        );

        preflight::check_host_tools(ctx.env, request)?;

        build::configure(ctx, request.build_type, request.platform)?;
        build::build(ctx, request.build_type)?;

        let mut report = PipelineReport::default();
        if request.needs_install() {
            install::install(ctx, request)?;

            if request.want_installer {
                self.installer(request, &mut report)?;
            }
            if request.want_portable {
                report.artifacts.extend(self.portable(request)?);
            }
        }

        if request.want_flatpak {
            match request.platform {
                Platform::Linux => flatpak::build_flatpak(ctx)?,
                Platform::Windows => {
                    tracing::warn!("Flatpak builds are only supported on Linux; skipping")
                }
            }
        }

        for artifact in &report.artifacts {
            report.checksums.push(write_checksum(artifact)?);
        }
        Ok(report)
    }

    fn installer(&self, request: &BuildRequest, report: &mut PipelineReport) -> Result<()> {
        match request.platform {
            Platform::Windows => {
                let produced = installer::make_installer(&self.ctx, request.build_type)?;
                report.artifacts.extend(produced);
            }
            Platform::Linux => {
                tracing::warn!("NSIS installers are only built for Windows; skipping")
            }
        }
        Ok(())
    }

    fn portable(&self, request: &BuildRequest) -> Result<Vec<PathBuf>> {
        let ctx = &self.ctx;
        let (version, deploy_tool) = match request.platform {
            Platform::Windows => {
                let manifest = ctx.layout.project_path(&ctx.config.app.version_manifest);
                (ProjectVersion::from_manifest(&manifest), self.locate_deploy_tool())
            }
            Platform::Linux => (ProjectVersion::unknown(), None),
        };
        portable::make_portable(ctx, request.platform, &version, deploy_tool.as_deref())
    }

    fn locate_deploy_tool(&self) -> Option<PathBuf> {
        let ctx = &self.ctx;
        let config = &ctx.config.deploy_tool;
        let found = ToolLocator::for_deploy_tool(config).find(ctx.env, &config.filename);
        match &found {
            Some(path) => tracing::info!("Found {} at {}", config.filename, path.display()),
            None => {
                let show = |key: &str| {
                    ctx.env
                        .var_os(key)
                        .map(|v| v.to_string_lossy().into_owned())
                        .unwrap_or_default()
                };
                tracing::warn!(
                    "could not find {}; PATH={} {}={}",
                    config.filename,
                    show("PATH"),
                    config.install_dir_var,
                    show(&config.install_dir_var)
                );
            }
        }
        found
    }
}
