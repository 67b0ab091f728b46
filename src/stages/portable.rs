//! Portable bundles.
//!
//! On Linux the portable package is the installed tree zipped as-is. On
//! Windows a self-contained directory is assembled first: the installed tree,
//! third-party DLLs in `bin/`, toolkit libraries from the deployment tool, a
//! launcher that puts `bin/` on `PATH`, and a README. That directory is then
//! archived under a versioned name.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::pipeline::PackagingContext;
use crate::process::Cmd;
use crate::request::Platform;
use crate::version::ProjectVersion;

/// Runtime library directory inside the portable tree.
pub const PORTABLE_BIN_DIR: &str = "bin";

pub const README_NAME: &str = "README.txt";

/// Build the portable package for `platform`.
///
/// Linux zips the dist tree as-is. Windows assembles the portable directory
/// (installed tree, bundled `bin/`, deployed toolkit libraries, launcher and
/// README) and archives it under a versioned name.
///
/// # Arguments
///
/// * `ctx` - Packaging context; dist must already be installed
/// * `platform` - Target platform of the run
/// * `version` - Project version, used in the Windows archive name
/// * `deploy_tool` - Located deployment tool; `None` skips that step with a
///   warning
///
/// # Returns
///
/// * `Ok(artifacts)` - every file placed into the installers directory, the
///   archive first
/// * `Err` if copying or archiving fails; missing optional inputs and a
///   failing deployment tool only log warnings
///
/// # Example
///
/// ```rust,ignore
/// use qpdftools_build::stages::portable::make_portable;
/// use qpdftools_build::version::ProjectVersion;
/// use qpdftools_build::Platform;
///
/// let artifacts = make_portable(&ctx, Platform::Linux, &ProjectVersion::unknown(), None)?;
/// ```
pub fn make_portable(
    ctx: &PackagingContext<'_>,
    platform: Platform,
    version: &ProjectVersion,
    deploy_tool: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    match platform {
        Platform::Windows => make_windows_portable(ctx, version, deploy_tool),
        Platform::Linux => make_flat_portable(ctx, platform).map(|archive| vec![archive]),
    }
}

pub fn flat_archive_name(app: &str, platform: Platform) -> String {
    format!("{app}-{platform}-portable.zip")
}

pub fn windows_archive_name(app: &str, version: &ProjectVersion) -> String {
    format!("{app}-{version}-windows-portable.zip")
}

/// Zip the dist tree with dist-relative entry names.
fn make_flat_portable(ctx: &PackagingContext<'_>, platform: Platform) -> Result<PathBuf> {
    let layout = &ctx.layout;
    let archive = layout
        .installers_dir
        .join(flat_archive_name(&ctx.config.app.name, platform));
    let count = ctx
        .archiver
        .zip_tree(&layout.dist_dir, &archive)
        .context("archiving the portable package")?;
    tracing::info!("Portable package created: {} ({count} files)", archive.display());
    Ok(archive)
}

fn make_windows_portable(
    ctx: &PackagingContext<'_>,
    version: &ProjectVersion,
    deploy_tool: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let layout = &ctx.layout;
    let portable = &layout.portable_dir;
    let bin = portable.join(PORTABLE_BIN_DIR);

    ctx.dirs.ensure(portable, true)?;
    ctx.dirs.ensure(&bin, false)?;
    ctx.dirs
        .copy_tree(&layout.dist_dir, portable)
        .context("copying the installed tree into the portable directory")?;

    bundle_dependency_archive(ctx, &bin)?;
    bundle_secondary_binaries(ctx, &bin)?;

    match main_executable(ctx)? {
        Some(relative) => {
            let exe = portable.join(&relative);
            match deploy_tool {
                Some(tool) => run_deploy_tool(ctx, tool, &exe),
                None => tracing::warn!(
                    "{} not available; toolkit libraries may be missing from the portable package",
                    ctx.config.deploy_tool.filename
                ),
            }
            ctx.dirs.write_file(
                &portable.join(launcher_name(&ctx.config.app.name)),
                &launcher_script(&relative),
            )?;
        }
        None => tracing::warn!(
            "no executable found in {}; portable package has no launcher",
            layout.dist_dir.display()
        ),
    }
    ctx.dirs
        .write_file(&portable.join(README_NAME), &readme_text(&ctx.config.app.name))?;

    let archive = layout
        .installers_dir
        .join(windows_archive_name(&ctx.config.app.name, version));
    let count = ctx
        .archiver
        .zip_tree(portable, &archive)
        .context("archiving the portable package")?;
    tracing::info!("Portable package created: {} ({count} files)", archive.display());

    let mut artifacts = vec![archive];
    artifacts.extend(relocate_secondary_installer(ctx)?);
    Ok(artifacts)
}

/// Extract `<root>/bin/*` of the pinned dependency archive into `bin`.
fn bundle_dependency_archive(ctx: &PackagingContext<'_>, bin: &Path) -> Result<()> {
    let windows = &ctx.config.windows;
    let archive = ctx.layout.project_path(&windows.dependency_archive);
    if !ctx.dirs.is_file(&archive) {
        tracing::warn!(
            "dependency archive {} not found; its libraries will be missing",
            archive.display()
        );
        return Ok(());
    }

    let prefix = format!("{}/bin/", windows.dependency_archive_root);
    let count = ctx
        .archiver
        .extract_prefixed(&archive, &prefix, bin, Some(&prefix))
        .with_context(|| format!("bundling libraries from '{}'", archive.display()))?;
    tracing::info!("Bundled {count} files from {}", archive.display());
    Ok(())
}

fn bundle_secondary_binaries(ctx: &PackagingContext<'_>, bin: &Path) -> Result<()> {
    let source = ctx.layout.project_path(&ctx.config.windows.secondary_bin_dir);
    if !ctx.dirs.is_dir(&source) {
        tracing::warn!("{} not found; skipping bundled tool binaries", source.display());
        return Ok(());
    }
    ctx.dirs
        .copy_tree(&source, bin)
        .with_context(|| format!("bundling binaries from '{}'", source.display()))
}

/// Main executable relative to the dist directory.
fn main_executable(ctx: &PackagingContext<'_>) -> Result<Option<PathBuf>> {
    let dist = &ctx.layout.dist_dir;
    let found = match &ctx.config.app.executable {
        Some(name) => ctx.dirs.find_first_named(dist, name)?,
        None => ctx.dirs.find_first_with_extension(dist, "exe")?,
    };
    Ok(found.and_then(|path| path.strip_prefix(dist).ok().map(Path::to_path_buf)))
}

fn run_deploy_tool(ctx: &PackagingContext<'_>, tool: &Path, exe: &Path) {
    let cmd = Cmd::new(tool)
        .args(&ctx.config.deploy_tool.args)
        .arg_path(exe);
    match ctx.runner.run(&cmd) {
        Ok(()) => tracing::info!("Deployed toolkit libraries next to {}", exe.display()),
        Err(err) => tracing::warn!(
            "deployment tool failed ({err:#}); toolkit libraries may be missing"
        ),
    }
}

fn relocate_secondary_installer(ctx: &PackagingContext<'_>) -> Result<Option<PathBuf>> {
    let source = ctx
        .layout
        .project_path(&ctx.config.windows.secondary_installer);
    let Some(name) = source.file_name() else {
        return Ok(None);
    };
    if !ctx.dirs.is_file(&source) {
        tracing::debug!("no secondary installer at {}", source.display());
        return Ok(None);
    }

    let installers_dir = &ctx.layout.installers_dir;
    ctx.dirs.ensure(installers_dir, false)?;
    let destination = installers_dir.join(name);
    ctx.dirs.move_file(&source, &destination)?;
    tracing::info!("Moved {} to {}", source.display(), destination.display());
    Ok(Some(destination))
}

pub fn launcher_name(app: &str) -> String {
    format!("{app}.bat")
}

/// Batch launcher putting the bundled `bin` first on `PATH`.
pub fn launcher_script(exe_relative: &Path) -> String {
    let exe = exe_relative.to_string_lossy().replace('/', "\\");
    format!(
        "@echo off\r\n\
         set \"PATH=%~dp0{PORTABLE_BIN_DIR};%PATH%\"\r\n\
         start \"\" \"%~dp0{exe}\" %*\r\n"
    )
}

pub fn readme_text(app: &str) -> String {
    format!(
        "{app} portable\r\n\
         \r\n\
         Start {app} with {launcher}.\r\n\
         \r\n\
         Do not move or rename the files in this folder. The {PORTABLE_BIN_DIR} folder\r\n\
         must stay next to the executable, it holds the libraries the program\r\n\
         loads at startup.\r\n",
        launcher = launcher_name(app)
    )
}
