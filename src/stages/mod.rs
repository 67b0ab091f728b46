//! Packaging stages, in the order the pipeline runs them.
//!
//! - [`build`] - CMake configure and build
//! - [`install`] - install into a fresh dist directory
//! - [`installer`] - NSIS installer via CPack (Windows)
//! - [`portable`] - portable bundle and archive
//! - [`flatpak`] - Flatpak build from the published manifest (Linux)

pub mod build;
pub mod flatpak;
pub mod install;
pub mod installer;
pub mod portable;
