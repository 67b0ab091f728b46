//! Build and packaging orchestration for QPDFTools.
//!
//! Drives the native toolchain (CMake, CPack, the Qt deployment tool,
//! flatpak-builder) and assembles the distributable artifacts:
//!
//! - **NSIS installer** (Windows) via CPack
//! - **Portable bundle**: a self-contained directory plus zip on Windows, a
//!   flat zip of the installed tree elsewhere
//! - **Flatpak** (Linux) built from the published manifest against the local tree
//!
//! # Architecture
//!
//! ```text
//! qpdftools-build (bin)
//!     │  parses CLI into a BuildRequest, loads PackagingConfig
//!     ▼
//! Pipeline ── PackagingContext ──┬── CommandRunner   (process)
//!     │                          ├── DirectoryManager (artifact::filesystem)
//!     │                          ├── ArchiveWriter    (artifact::archive)
//!     │                          ├── EnvSource        (env)
//!     │                          └── ManifestFetcher  (stages::flatpak)
//!     ▼
//! stages: build → install → installer → portable → flatpak
//! ```
//!
//! Every side effect goes through one of the collaborator traits, so the
//! stages are tested against recording doubles and temporary directories.

pub mod artifact;
pub mod config;
pub mod env;
pub mod locator;
pub mod pipeline;
pub mod preflight;
pub mod process;
pub mod request;
pub mod stages;
pub mod version;

#[cfg(test)]
mod testing;

pub use config::PackagingConfig;
pub use pipeline::{Layout, PackagingContext, Pipeline, PipelineReport};
pub use request::{BuildRequest, BuildType, Platform};
