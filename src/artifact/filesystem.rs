//! Filesystem side effects of the packaging stages.
//!
//! Stages never touch `std::fs` for tree-level work directly; they go through
//! [`DirectoryManager`] so the directory lifecycle rules (clean vs additive)
//! live in one place.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub trait DirectoryManager {
    /// Make `path` an existing directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Directory to create, parents included
    /// * `clean` - Remove whatever is at `path` first (directory tree, file
    ///   or symlink), leaving an empty directory
    ///
    /// # Returns
    ///
    /// * `Ok(())` once `path` is a directory
    /// * `Err` if removal or creation fails, or if `clean` is false and a
    ///   non-directory already sits at `path`
    fn ensure(&self, path: &Path, clean: bool) -> Result<()>;

    /// Recursively copy the entries of `src` into `dst`, overwriting files
    /// that already exist.
    ///
    /// Symlinks are recreated, not followed (Unix). Regular files keep their
    /// permissions and, unless the copy is read-only, their modification time.
    ///
    /// # Arguments
    ///
    /// * `src` - Source directory
    /// * `dst` - Destination directory (created if it doesn't exist)
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use qpdftools_build::artifact::{DirectoryManager, LocalDirectories};
    /// use std::path::Path;
    ///
    /// LocalDirectories.copy_tree(Path::new("dist"), Path::new("portable"))?;
    /// ```
    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<()>;

    fn move_file(&self, src: &Path, dst: &Path) -> Result<()>;

    fn write_file(&self, path: &Path, contents: &str) -> Result<()>;

    /// Whether `path` is a regular file (symlinks followed).
    fn is_file(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Regular files directly inside `dir`, sorted. A missing `dir` is empty.
    fn files_in(&self, dir: &Path) -> Result<Vec<PathBuf>>;

    /// First regular file under `root` with extension `ext`, in sorted
    /// traversal order.
    fn find_first_with_extension(&self, root: &Path, ext: &str) -> Result<Option<PathBuf>>;

    /// First regular file under `root` named `name`, ignoring ASCII case.
    fn find_first_named(&self, root: &Path, name: &str) -> Result<Option<PathBuf>>;
}

/// [`DirectoryManager`] backed by the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalDirectories;

impl DirectoryManager for LocalDirectories {
    fn ensure(&self, path: &Path, clean: bool) -> Result<()> {
        if let Ok(meta) = fs::symlink_metadata(path) {
            if clean {
                if meta.is_dir() {
                    fs::remove_dir_all(path).with_context(|| {
                        format!("removing stale directory '{}'", path.display())
                    })?;
                } else {
                    fs::remove_file(path)
                        .with_context(|| format!("removing stale '{}'", path.display()))?;
                }
            } else if !path.is_dir() {
                bail!("'{}' exists and is not a directory", path.display());
            }
        }
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("creating directory '{}'", path.display()))?;
        }
        Ok(())
    }

    fn copy_tree(&self, src: &Path, dst: &Path) -> Result<()> {
        if !dst.exists() {
            fs::create_dir_all(dst)
                .with_context(|| format!("creating directory '{}'", dst.display()))?;
        }

        for entry in
            fs::read_dir(src).with_context(|| format!("reading directory '{}'", src.display()))?
        {
            let entry = entry?;
            copy_entry(&entry.path(), &dst.join(entry.file_name()), entry.file_type()?)?;
        }
        Ok(())
    }

    fn move_file(&self, src: &Path, dst: &Path) -> Result<()> {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory '{}'", parent.display()))?;
        }
        // rename fails across filesystems; fall back to copy+delete
        let rename_err = match fs::rename(src, dst) {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        tracing::debug!("rename '{}' failed ({rename_err}); copying instead", src.display());
        fs::copy(src, dst).with_context(|| {
            format!(
                "copying '{}' to '{}' after rename failed ({rename_err})",
                src.display(),
                dst.display()
            )
        })?;
        fs::remove_file(src).with_context(|| format!("removing '{}'", src.display()))?;
        Ok(())
    }

    fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).with_context(|| format!("writing '{}'", path.display()))
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn files_in(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in
            fs::read_dir(dir).with_context(|| format!("reading directory '{}'", dir.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    fn find_first_with_extension(&self, root: &Path, ext: &str) -> Result<Option<PathBuf>> {
        find_first(root, |path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext))
        })
    }

    fn find_first_named(&self, root: &Path, name: &str) -> Result<Option<PathBuf>> {
        find_first(root, |path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }
}

fn copy_entry(src: &Path, dst: &Path, file_type: fs::FileType) -> Result<()> {
    if file_type.is_dir() {
        return LocalDirectories.copy_tree(src, dst);
    }

    if file_type.is_symlink() {
        return copy_symlink(src, dst);
    }

    fs::copy(src, dst)
        .with_context(|| format!("copying '{}' to '{}'", src.display(), dst.display()))?;
    preserve_mtime(src, dst);
    Ok(())
}

/// Best effort: a read-only copy cannot be opened to set its timestamp.
fn preserve_mtime(src: &Path, dst: &Path) {
    let result = fs::metadata(src).and_then(|meta| meta.modified()).and_then(|modified| {
        File::options()
            .write(true)
            .open(dst)
            .and_then(|file| file.set_modified(modified))
    });
    if let Err(err) = result {
        tracing::debug!("kept new modification time on '{}' ({err})", dst.display());
    }
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = fs::read_link(src)?;
    if dst.exists() || dst.is_symlink() {
        fs::remove_file(dst)?;
    }
    std::os::unix::fs::symlink(&target, dst)
        .with_context(|| format!("creating symlink '{}'", dst.display()))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)
        .with_context(|| format!("copying '{}' to '{}'", src.display(), dst.display()))?;
    Ok(())
}

fn find_first(root: &Path, matches: impl Fn(&Path) -> bool) -> Result<Option<PathBuf>> {
    if !root.is_dir() {
        return Ok(None);
    }
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walking '{}'", root.display()))?;
        if entry.file_type().is_file() && matches(entry.path()) {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}
