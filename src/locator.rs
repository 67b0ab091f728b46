//! Optional external tool discovery.
//!
//! A [`ToolLocator`] is an ordered list of strategies. Each one either
//! produces an existing path or nothing; the first hit wins. Not finding the
//! tool is never an error, callers decide how to degrade.
//!
//! Default order for the Qt deployment tool:
//! 1. CI-pinned install locations (only when the CI marker variable is set)
//! 2. `<install-dir-var>/<filename>`
//! 3. Every directory on `PATH`

use std::path::{Path, PathBuf};

use crate::config::DeployToolConfig;
use crate::env::EnvSource;

/// One way of resolving a tool path.
pub trait LocateStrategy {
    fn describe(&self) -> String;

    fn locate(&self, env: &dyn EnvSource, filename: &str) -> Option<PathBuf>;
}

/// Version-pinned directories probed only inside the CI environment.
#[derive(Debug, Clone)]
pub struct CiCandidates {
    pub marker: String,
    /// Joined onto the marker variable's value.
    pub relative_dirs: Vec<PathBuf>,
    pub absolute_dirs: Vec<PathBuf>,
}

impl LocateStrategy for CiCandidates {
    fn describe(&self) -> String {
        format!("CI locations (${} set)", self.marker)
    }

    fn locate(&self, env: &dyn EnvSource, filename: &str) -> Option<PathBuf> {
        let root = env.var_os(&self.marker)?;
        let root = Path::new(&root);
        self.relative_dirs
            .iter()
            .map(|dir| root.join(dir))
            .chain(self.absolute_dirs.iter().cloned())
            .map(|dir| dir.join(filename))
            .find(|candidate| candidate.is_file())
    }
}

/// Directory named by an environment variable.
#[derive(Debug, Clone)]
pub struct InstallDirVar {
    pub var: String,
}

impl LocateStrategy for InstallDirVar {
    fn describe(&self) -> String {
        format!("${}", self.var)
    }

    fn locate(&self, env: &dyn EnvSource, filename: &str) -> Option<PathBuf> {
        let dir = env.non_empty(&self.var)?;
        let candidate = Path::new(&dir).join(filename);
        candidate.is_file().then_some(candidate)
    }
}

/// Every directory on `PATH`, in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPath;

impl LocateStrategy for SearchPath {
    fn describe(&self) -> String {
        "PATH".to_string()
    }

    fn locate(&self, env: &dyn EnvSource, filename: &str) -> Option<PathBuf> {
        let paths = env.non_empty("PATH")?;
        which::which_in(filename, Some(paths), Path::new("."))
            .ok()
            .filter(|path| path.is_file())
    }
}

/// Ordered fallback chain of [`LocateStrategy`] values.
pub struct ToolLocator {
    strategies: Vec<Box<dyn LocateStrategy>>,
}

impl ToolLocator {
    pub fn new(strategies: Vec<Box<dyn LocateStrategy>>) -> Self {
        Self { strategies }
    }

    /// CI locations, then the install-dir variable, then `PATH`.
    pub fn for_deploy_tool(config: &DeployToolConfig) -> Self {
        Self::new(vec![
            Box::new(CiCandidates {
                marker: config.ci_marker.clone(),
                relative_dirs: config.ci_relative_dirs.clone(),
                absolute_dirs: config.ci_absolute_dirs.clone(),
            }),
            Box::new(InstallDirVar {
                var: config.install_dir_var.clone(),
            }),
            Box::new(SearchPath),
        ])
    }

    pub fn find(&self, env: &dyn EnvSource, filename: &str) -> Option<PathBuf> {
        for strategy in &self.strategies {
            if let Some(path) = strategy.locate(env, filename) {
                tracing::debug!("found {filename} via {}", strategy.describe());
                return Some(path);
            }
        }
        None
    }
}
