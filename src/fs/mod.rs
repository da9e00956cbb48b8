pub mod bitmap;
pub mod defs;
pub mod error;
pub mod fd;
pub mod file_system;
pub mod path;

pub use defs::{DirEntry, FileKind, Inode, SuperBlock};
pub use error::{FsError, FsResult};
pub use file_system::{FileSystem, ListEntry};
