//! What a single invocation was asked to produce.

use std::fmt;

/// Operating system the artifacts are produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    /// Platform of the machine running the build.
    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Linux
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Native build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildType {
    Debug,
    Release,
}

impl BuildType {
    /// Spelling expected by CMake (`CMAKE_BUILD_TYPE`, `--config`, `-C`).
    pub fn cmake_name(self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::Release => "Release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cmake_name())
    }
}

/// Parsed command line request. Immutable for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildRequest {
    pub platform: Platform,
    pub build_type: BuildType,
    pub want_installer: bool,
    pub want_portable: bool,
    pub want_flatpak: bool,
}

impl BuildRequest {
    /// Plain build for the given platform with no packaging.
    pub fn build_only(platform: Platform, build_type: BuildType) -> Self {
        Self {
            platform,
            build_type,
            want_installer: false,
            want_portable: false,
            want_flatpak: false,
        }
    }

    /// Whether the dist directory has to be installed this run.
    pub fn needs_install(&self) -> bool {
        self.want_installer || self.want_portable
    }

    /// Symbols are stripped on Windows release installs only.
    pub fn strips_symbols(&self) -> bool {
        self.platform == Platform::Windows && self.build_type != BuildType::Debug
    }
}
