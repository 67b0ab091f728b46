//! Preflight checks for build validation.
//!
//! Validates that the host has the tools a request needs before any stage
//! runs, so a missing `cpack` surfaces up front instead of after a full build.

use anyhow::{bail, Result};
use std::path::Path;

use crate::env::EnvSource;
use crate::request::{BuildRequest, Platform};

/// A host tool and where to get it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostTool {
    pub command: &'static str,
    pub provider: &'static str,
}

const CMAKE: HostTool = HostTool {
    command: "cmake",
    provider: "CMake (https://cmake.org/download/)",
};

const CPACK: HostTool = HostTool {
    command: "cpack",
    provider: "CMake (ships cpack) plus NSIS (https://nsis.sourceforge.io/)",
};

const FLATPAK_BUILDER: HostTool = HostTool {
    command: "flatpak-builder",
    provider: "flatpak-builder (distribution package)",
};

/// Check if a command exists on the `PATH` seen through `env`.
pub fn command_exists(env: &dyn EnvSource, cmd: &str) -> bool {
    env.non_empty("PATH")
        .is_some_and(|paths| which::which_in(cmd, Some(paths), Path::new(".")).is_ok())
}

/// Tools `request` will invoke.
///
/// Stages that do not apply to the target platform are skipped later on, so
/// their tools are not required here.
pub fn required_tools(request: &BuildRequest) -> Vec<HostTool> {
    let mut tools = vec![CMAKE];
    if request.want_installer && request.platform == Platform::Windows {
        tools.push(CPACK);
    }
    if request.want_flatpak && request.platform == Platform::Linux {
        tools.push(FLATPAK_BUILDER);
    }
    tools
}

/// Check that specific tools are available.
///
/// # Arguments
///
/// * `env` - Environment whose `PATH` is searched
/// * `tools` - Tools to look for
///
/// # Returns
///
/// * `Ok(())` if all tools are found
/// * `Err` listing every missing tool and where to get it
pub fn check_required_tools(env: &dyn EnvSource, tools: &[HostTool]) -> Result<()> {
    let missing: Vec<_> = tools
        .iter()
        .filter(|tool| !command_exists(env, tool.command))
        .collect();

    if !missing.is_empty() {
        let msg = missing
            .iter()
            .map(|t| format!("  {} (install: {})", t.command, t.provider))
            .collect::<Vec<_>>()
            .join("\n");
        bail!("Missing required host tools:\n{}", msg);
    }

    Ok(())
}

/// Check every tool `request` needs.
pub fn check_host_tools(env: &dyn EnvSource, request: &BuildRequest) -> Result<()> {
    check_required_tools(env, &required_tools(request))
}
