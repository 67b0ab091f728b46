//! Packaging configuration.
//!
//! Every pinned name, path and URL the pipeline uses lives here. The optional
//! `packaging.toml` at the project root overrides any subset of the defaults:
//!
//! ```toml
//! [app]
//! name = "qpdftools"
//!
//! [windows]
//! dependency_archive = "qpdf-11.9.1-msvc64.zip"
//! dependency_archive_root = "qpdf-11.9.1-msvc64"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the project directory.
pub const CONFIG_FILENAME: &str = "packaging.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackagingConfig {
    pub app: AppConfig,
    pub paths: PathsConfig,
    pub windows: WindowsConfig,
    pub deploy_tool: DeployToolConfig,
    pub flatpak: FlatpakConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Base name of every produced artifact.
    pub name: String,
    /// Main executable file name; the first `.exe` in dist is used when unset.
    pub executable: Option<String>,
    /// Build-system manifest the project version is read from.
    pub version_manifest: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "qpdftools".to_string(),
            executable: None,
            version_manifest: PathBuf::from("CMakeLists.txt"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub build: PathBuf,
    pub dist: PathBuf,
    pub portable: PathBuf,
    pub installers: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            build: PathBuf::from("build"),
            dist: PathBuf::from("dist"),
            portable: PathBuf::from("portable"),
            installers: PathBuf::from("installers"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowsConfig {
    /// Generator passed to `cmake -G` when no IDE environment is active.
    pub generator: String,
    /// Variable set by a Visual Studio developer prompt.
    pub ide_marker: String,
    /// Pinned third-party binary archive, relative to the project directory.
    pub dependency_archive: PathBuf,
    /// Top-level folder inside the dependency archive.
    pub dependency_archive_root: String,
    /// Secondary tool binaries copied into the portable `bin`.
    pub secondary_bin_dir: PathBuf,
    /// Separately produced installer for the bundled secondary tool.
    pub secondary_installer: PathBuf,
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            generator: "Visual Studio 17 2022".to_string(),
            ide_marker: "VSINSTALLDIR".to_string(),
            dependency_archive: PathBuf::from("qpdf-11.9.1-msvc64.zip"),
            dependency_archive_root: "qpdf-11.9.1-msvc64".to_string(),
            secondary_bin_dir: PathBuf::from("deps/ghostscript/bin"),
            secondary_installer: PathBuf::from("gs10051w64.exe"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeployToolConfig {
    pub filename: String,
    /// Variable whose presence marks the CI environment.
    pub ci_marker: String,
    /// Candidate directories relative to the CI marker's value.
    pub ci_relative_dirs: Vec<PathBuf>,
    /// Candidate directories probed as-is in the CI environment.
    pub ci_absolute_dirs: Vec<PathBuf>,
    /// Variable pointing at the toolkit's binary directory.
    pub install_dir_var: String,
    pub args: Vec<String>,
}

impl Default for DeployToolConfig {
    fn default() -> Self {
        Self {
            filename: "windeployqt.exe".to_string(),
            ci_marker: "IQTA_TOOLS".to_string(),
            ci_relative_dirs: vec![PathBuf::from("Qt/6.2.4/msvc2019_64/bin")],
            ci_absolute_dirs: vec![PathBuf::from("/Qt/6.2.4/msvc2019_64/bin")],
            install_dir_var: "Qt6_DIR".to_string(),
            args: ["--verbose", "0", "--no-compiler-runtime", "--no-opengl-sw"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FlatpakConfig {
    pub app_id: String,
    pub manifest_url: String,
    /// Module whose sources are replaced; the last module when unset.
    pub module: Option<String>,
    /// Remote dependencies are installed from.
    pub remote: String,
    pub build_dir: PathBuf,
}

impl Default for FlatpakConfig {
    fn default() -> Self {
        Self {
            app_id: "io.github.silash35.qpdftools".to_string(),
            manifest_url: "https://raw.githubusercontent.com/flathub/io.github.silash35.qpdftools/master/io.github.silash35.qpdftools.yml".to_string(),
            module: None,
            remote: "flathub".to_string(),
            build_dir: PathBuf::from("build-flatpak"),
        }
    }
}

impl PackagingConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load `path`; a missing file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading packaging config '{}'", path.display()))?;
        Self::from_toml(&text)
            .with_context(|| format!("parsing packaging config '{}'", path.display()))
    }

    /// Explicit path if given, else `packaging.toml` in the project directory
    /// when present, else built-in defaults.
    pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let default_path = project_dir.join(CONFIG_FILENAME);
        if default_path.is_file() {
            tracing::info!("Using packaging config {}", default_path.display());
            return Self::load(&default_path);
        }
        Ok(Self::default())
    }
}
