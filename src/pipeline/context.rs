//! Everything a stage needs: resolved directories, configuration, and the
//! collaborators through which it touches processes, disk, network and the
//! environment.

use std::path::{Path, PathBuf};

use crate::artifact::{ArchiveWriter, DirectoryManager};
use crate::config::{PackagingConfig, PathsConfig};
use crate::env::EnvSource;
use crate::process::CommandRunner;
use crate::stages::flatpak::ManifestFetcher;

/// Directories of one packaging run.
///
/// - `build_dir` persists across invocations (native incremental builds).
/// - `dist_dir` and `portable_dir` are wiped and rebuilt every packaging run.
/// - `installers_dir` is additive and never wiped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub project_dir: PathBuf,
    pub build_dir: PathBuf,
    pub dist_dir: PathBuf,
    pub portable_dir: PathBuf,
    pub installers_dir: PathBuf,
}

impl Layout {
    /// Resolve configured paths against `project_dir`; absolute paths are kept.
    pub fn resolve(project_dir: &Path, paths: &PathsConfig) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            build_dir: resolve_project_path(project_dir, &paths.build),
            dist_dir: resolve_project_path(project_dir, &paths.dist),
            portable_dir: resolve_project_path(project_dir, &paths.portable),
            installers_dir: resolve_project_path(project_dir, &paths.installers),
        }
    }

    pub fn project_path(&self, path: &Path) -> PathBuf {
        resolve_project_path(&self.project_dir, path)
    }
}

pub(crate) fn resolve_project_path(project_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_dir.join(path)
    }
}

/// Shared state handed to every stage.
pub struct PackagingContext<'a> {
    pub layout: Layout,
    pub config: &'a PackagingConfig,
    pub runner: &'a dyn CommandRunner,
    pub dirs: &'a dyn DirectoryManager,
    pub archiver: &'a dyn ArchiveWriter,
    pub env: &'a dyn EnvSource,
    pub fetcher: &'a dyn ManifestFetcher,
}
