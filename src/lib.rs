//! An in-memory, Unix-like filesystem tree for Rust.
//! Simulates a root, directories, files and a current working directory without touching
//! any real storage.
//!
//! ### Overview
//!
//! `unix-fs-kit` keeps every entry in memory. Each directory holds its children as a list
//! sorted by name, so listings come out ordered without any extra work.
//!
//! **Key ideas**:
//! - **Single components**: every operation takes one name, resolved in the current working
//!   directory. The tokens `.`, `..` and `/` navigate; they can never name an entry.
//! - **Safety**: entries are addressed by arena handles; a removed entry can't be reached
//!   through a stale handle, and the current working directory can't be removed.
//! - **Testability**: `check_invariants()` verifies the whole tree structure.
//!
//! ### Example
//!
//! ```
//! use unix_fs_kit::{FsBackend, UnixFS};
//!
//! let mut fs = UnixFS::new();
//! fs.mkdir("a").unwrap();
//! fs.cd("a").unwrap();
//! fs.mkdir("b").unwrap();
//! fs.cd("b").unwrap();
//! assert_eq!(fs.pwd(), "/a/b");
//! ```

mod core;
mod vfs;

pub use crate::core::utils::{self, NameClass, classify};
pub use crate::core::{FsBackend, Result};
pub use vfs::{Entry, EntryType, UnixFS};
