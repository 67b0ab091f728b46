//! Filesystem and archive primitives used by the packaging stages.
//!
//! - [`filesystem`] - directory lifecycle, tree copies, moves, file search
//! - [`archive`] - zip creation and prefix-filtered extraction
//! - [`checksum`] - SHA-256 sidecar files for produced artifacts

pub mod archive;
pub mod checksum;
pub mod filesystem;

pub use archive::{ArchiveWriter, ZipArchiver};
pub use checksum::write_checksum;
pub use filesystem::{DirectoryManager, LocalDirectories};
