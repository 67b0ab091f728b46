//! Zip archive creation and prefix-filtered extraction.

use anyhow::{bail, Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub trait ArchiveWriter {
    /// Zip every file under `source_dir` into `dest_archive`.
    ///
    /// Entries are named with `/`-separated paths relative to `source_dir`.
    /// Symlinks that resolve to a file are stored with the target's
    /// contents under the link's own name; dangling links and links to
    /// directories are skipped.
    ///
    /// # Arguments
    ///
    /// * `source_dir` - Tree to archive; its own name is not part of any entry
    /// * `dest_archive` - Output zip (parent directories are created)
    ///
    /// # Returns
    ///
    /// * `Ok(count)` - number of files written
    /// * `Err` if the tree cannot be walked or the archive cannot be written
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use qpdftools_build::artifact::{ArchiveWriter, ZipArchiver};
    /// use std::path::Path;
    ///
    /// let files = ZipArchiver.zip_tree(
    ///     Path::new("dist"),
    ///     Path::new("installers/qpdftools-linux-portable.zip"),
    /// )?;
    /// ```
    fn zip_tree(&self, source_dir: &Path, dest_archive: &Path) -> Result<usize>;

    /// Extract entries of `source_archive` whose names start with
    /// `name_prefix` into `dest_dir`.
    ///
    /// # Arguments
    ///
    /// * `source_archive` - Zip to read
    /// * `name_prefix` - Only entries whose names start with this are taken
    /// * `dest_dir` - Extraction root (created as needed)
    /// * `strip_prefix` - Removed from entry names first, rebasing a nested
    ///   folder onto `dest_dir`
    ///
    /// # Returns
    ///
    /// * `Ok(count)` - number of files written; zero when nothing matches
    /// * `Err` if the archive is unreadable or an entry would escape `dest_dir`
    fn extract_prefixed(
        &self,
        source_archive: &Path,
        name_prefix: &str,
        dest_dir: &Path,
        strip_prefix: Option<&str>,
    ) -> Result<usize>;
}

/// [`ArchiveWriter`] producing deflate-compressed zip files.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiver;

impl ArchiveWriter for ZipArchiver {
    fn zip_tree(&self, source_dir: &Path, dest_archive: &Path) -> Result<usize> {
        if let Some(parent) = dest_archive.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory '{}'", parent.display()))?;
        }
        let file = File::create(dest_archive)
            .with_context(|| format!("creating archive '{}'", dest_archive.display()))?;
        let mut zip = ZipWriter::new(file);
        let base = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut written = 0;
        for entry in WalkDir::new(source_dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking '{}'", source_dir.display()))?;
            // follows symlinks, so shared-library links (libX.so.N) are kept
            if !entry.path().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path.strip_prefix(source_dir)?;
            let name = relative.to_string_lossy().replace('\\', "/");

            let options = match file_mode(path) {
                Some(mode) => base.unix_permissions(mode),
                None => base,
            };
            zip.start_file(name.as_str(), options)
                .with_context(|| format!("adding '{}' to archive", name))?;
            let mut source =
                File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
            io::copy(&mut source, &mut zip)
                .with_context(|| format!("compressing '{}'", path.display()))?;
            written += 1;
        }

        zip.finish()
            .with_context(|| format!("finalizing archive '{}'", dest_archive.display()))?;
        Ok(written)
    }

    fn extract_prefixed(
        &self,
        source_archive: &Path,
        name_prefix: &str,
        dest_dir: &Path,
        strip_prefix: Option<&str>,
    ) -> Result<usize> {
        let file = File::open(source_archive)
            .with_context(|| format!("opening archive '{}'", source_archive.display()))?;
        let mut archive = ZipArchive::new(file)
            .with_context(|| format!("reading archive '{}'", source_archive.display()))?;

        let mut written = 0;
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let name = entry.name().to_string();
            if !name.starts_with(name_prefix) {
                continue;
            }

            let rebased = match strip_prefix {
                Some(strip) => name.strip_prefix(strip).unwrap_or(&name),
                None => name.as_str(),
            };
            if rebased.trim_matches('/').is_empty() {
                continue;
            }
            let target = dest_dir.join(safe_relative_path(rebased)?);

            if entry.is_dir() {
                fs::create_dir_all(&target)
                    .with_context(|| format!("creating directory '{}'", target.display()))?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory '{}'", parent.display()))?;
            }
            let mut out = File::create(&target)
                .with_context(|| format!("creating '{}'", target.display()))?;
            io::copy(&mut entry, &mut out)
                .with_context(|| format!("extracting '{}'", name))?;
            written += 1;
        }
        Ok(written)
    }
}

/// Entry name as a relative path that cannot escape the extraction root.
fn safe_relative_path(name: &str) -> Result<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                bail!("archive entry '{}' escapes the extraction directory", name)
            }
        }
    }
    Ok(path)
}

#[cfg(unix)]
fn file_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).ok().map(|m| m.permissions().mode())
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
        WalkDir::new(root)
            .into_iter()
            .map(|e| e.unwrap())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                let rel = e.path().strip_prefix(root).unwrap();
                (
                    rel.to_string_lossy().replace('\\', "/"),
                    fs::read(e.path()).unwrap(),
                )
            })
            .collect()
    }

    fn write_zip(path: &Path, entries: &[(&str, Option<&[u8]>)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, contents) in entries {
            match contents {
                Some(bytes) => {
                    zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                    zip.write_all(bytes).unwrap();
                }
                None => zip.add_directory(*name, SimpleFileOptions::default()).unwrap(),
            }
        }
        zip.finish().unwrap();
    }

    #[test]
    fn zip_then_extract_reproduces_tree() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("dist");
        fs::create_dir_all(src.join("bin")).unwrap();
        fs::create_dir_all(src.join("share/icons")).unwrap();
        fs::write(src.join("bin/qpdftools"), b"\x7fELF binary").unwrap();
        fs::write(src.join("share/icons/app.svg"), "<svg/>").unwrap();
        fs::write(src.join("LICENSE"), "GPL").unwrap();

        let archive = temp.path().join("out/tree.zip");
        let count = ZipArchiver.zip_tree(&src, &archive).unwrap();
        assert_eq!(count, 3);

        let dest = temp.path().join("restored");
        let extracted = ZipArchiver
            .extract_prefixed(&archive, "", &dest, None)
            .unwrap();

        assert_eq!(extracted, 3);
        assert_eq!(snapshot(&src), snapshot(&dest));
    }

    #[test]
    fn zip_entries_do_not_include_source_dir_name() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("dist");
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::write(src.join("lib/a.so"), "a").unwrap();

        let archive = temp.path().join("dist.zip");
        ZipArchiver.zip_tree(&src, &archive).unwrap();

        let zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let names: Vec<_> = zip.file_names().collect();
        assert_eq!(names, ["lib/a.so"]);
    }

    #[cfg(unix)]
    #[test]
    fn zip_tree_stores_file_symlinks_with_target_contents() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("dist");
        fs::create_dir_all(src.join("lib")).unwrap();
        fs::write(src.join("lib/libqpdf.so.29.8.0"), b"\x7fELF lib").unwrap();
        std::os::unix::fs::symlink("libqpdf.so.29.8.0", src.join("lib/libqpdf.so.29")).unwrap();
        std::os::unix::fs::symlink("missing.so", src.join("lib/dangling.so")).unwrap();

        let archive = temp.path().join("dist.zip");
        let count = ZipArchiver.zip_tree(&src, &archive).unwrap();

        assert_eq!(count, 2);
        let mut zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let names: Vec<_> = zip.file_names().map(String::from).collect();
        assert_eq!(names, ["lib/libqpdf.so.29", "lib/libqpdf.so.29.8.0"]);

        let mut linked = Vec::new();
        io::copy(&mut zip.by_name("lib/libqpdf.so.29").unwrap(), &mut linked).unwrap();
        assert_eq!(linked, b"\x7fELF lib");
    }

    #[test]
    fn non_matching_prefix_extracts_nothing() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("dep.zip");
        write_zip(&archive, &[("depbase/bin/x.dll", Some(b"x"))]);

        let dest = temp.path().join("out");
        let count = ZipArchiver
            .extract_prefixed(&archive, "other/", &dest, None)
            .unwrap();

        assert_eq!(count, 0);
        assert!(!dest.exists());
    }

    #[test]
    fn strip_prefix_flattens_nested_folder() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("dep.zip");
        write_zip(
            &archive,
            &[
                ("depbase/", None),
                ("depbase/bin/", None),
                ("depbase/bin/x.dll", Some(b"x")),
                ("depbase/bin/y.dll", Some(b"y")),
                ("depbase/include/x.h", Some(b"h")),
            ],
        );

        let bin = temp.path().join("portable/bin");
        let count = ZipArchiver
            .extract_prefixed(&archive, "depbase/bin/", &bin, Some("depbase/bin/"))
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read(bin.join("x.dll")).unwrap(), b"x");
        assert_eq!(fs::read(bin.join("y.dll")).unwrap(), b"y");
        assert!(!bin.join("depbase").exists());
        assert!(!temp.path().join("portable/include").exists());
    }

    #[test]
    fn traversal_entries_are_rejected() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.zip");
        write_zip(&archive, &[("../escape.txt", Some(b"boom"))]);

        let dest = temp.path().join("out");
        let result = ZipArchiver.extract_prefixed(&archive, "", &dest, None);

        assert!(result.is_err());
        assert!(!temp.path().join("escape.txt").exists());
    }
}
