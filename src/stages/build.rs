//! Native build: CMake configure and build steps.
//!
//! The build directory persists across invocations so CMake can rebuild
//! incrementally; it is created if missing and never cleaned here.

use anyhow::{Context, Result};

use crate::pipeline::PackagingContext;
use crate::process::Cmd;
use crate::request::{BuildType, Platform};

/// `cmake -B <build> -S <project> -DCMAKE_BUILD_TYPE=<type> [-G <generator>]`.
///
/// On Windows the generator is pinned unless a Visual Studio developer
/// environment is already active, so hosts with several toolchains installed
/// resolve to the same one.
pub fn configure_command(
    ctx: &PackagingContext<'_>,
    build_type: BuildType,
    platform: Platform,
) -> Cmd {
    let layout = &ctx.layout;
    let mut cmd = Cmd::new("cmake")
        .arg("-B")
        .arg_path(&layout.build_dir)
        .arg("-S")
        .arg_path(&layout.project_dir)
        .arg(format!("-DCMAKE_BUILD_TYPE={}", build_type.cmake_name()));

    let windows = &ctx.config.windows;
    if platform == Platform::Windows && !ctx.env.is_set(&windows.ide_marker) {
        cmd = cmd.arg("-G").arg(&windows.generator);
    }
    cmd
}

pub fn configure(
    ctx: &PackagingContext<'_>,
    build_type: BuildType,
    platform: Platform,
) -> Result<()> {
    ctx.dirs.ensure(&ctx.layout.build_dir, false)?;
    ctx.runner
        .run(&configure_command(ctx, build_type, platform))
        .context("configuring the native build")
}

/// `cmake --build <build> --config <type>`.
pub fn build(ctx: &PackagingContext<'_>, build_type: BuildType) -> Result<()> {
    let cmd = Cmd::new("cmake")
        .arg("--build")
        .arg_path(&ctx.layout.build_dir)
        .args(["--config", build_type.cmake_name()]);
    ctx.runner.run(&cmd).context("building the native project")
}
