mod arena;
mod entry;
mod unix_fs;

pub use entry::{Entry, EntryType};
pub use unix_fs::UnixFS;
