//! Install the build outputs into a freshly recreated dist directory.

use anyhow::{Context, Result};

use crate::pipeline::PackagingContext;
use crate::process::Cmd;
use crate::request::BuildRequest;

/// `cmake --install <build> --prefix <dist> --config <type> [--strip]`.
///
/// Debug builds keep their symbols; only Windows release installs strip.
pub fn install_command(ctx: &PackagingContext<'_>, request: &BuildRequest) -> Cmd {
    let layout = &ctx.layout;
    let cmd = Cmd::new("cmake")
        .arg("--install")
        .arg_path(&layout.build_dir)
        .arg("--prefix")
        .arg_path(&layout.dist_dir)
        .args(["--config", request.build_type.cmake_name()]);
    if request.strips_symbols() {
        cmd.arg("--strip")
    } else {
        cmd
    }
}

/// Wipe and recreate the dist directory, then install into it. Packaging
/// stages only ever read a dist tree produced by this call in the same run.
pub fn install(ctx: &PackagingContext<'_>, request: &BuildRequest) -> Result<()> {
    ctx.dirs.ensure(&ctx.layout.dist_dir, true)?;
    ctx.runner
        .run(&install_command(ctx, request))
        .with_context(|| format!("installing into '{}'", ctx.layout.dist_dir.display()))
}
