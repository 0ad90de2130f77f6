use std::io::Write;

/// Operations every filesystem of this kit supports.
///
/// All names are single path components resolved against the current working directory.
/// The reserved tokens `.`, `..` and `/` are accepted by the navigation and listing
/// operations, never as names of real entries.
pub trait FsBackend {
    /// Returns the absolute path of the current working directory (`/`, `/a/b`, ...).
    fn pwd(&self) -> String;

    /// Writes the absolute path of the current working directory as one line.
    fn pwd_to<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self.pwd())?;
        Ok(())
    }

    /// Changes the current working directory.
    fn cd(&mut self, name: &str) -> Result<()>;

    /// Returns `true` if `name` is an entry of the current working directory.
    fn exists(&self, name: &str) -> bool;

    /// Returns the rendered lines of a listing; directories carry a trailing `/`.
    fn ls(&self, name: &str) -> Result<impl Iterator<Item = String>>;

    /// Writes the listing of `name` line by line.
    fn ls_to<W: Write>(&self, name: &str, out: &mut W) -> Result<()> {
        for line in self.ls(name)? {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    /// Creates an empty directory in the current working directory.
    fn mkdir(&mut self, name: &str) -> Result<()>;

    /// Creates a file in the current working directory. Existing names are left as they are.
    fn touch(&mut self, name: &str) -> Result<()>;

    /// Removes an entry of the current working directory, with all its contents.
    fn rm(&mut self, name: &str) -> Result<()>;

    /// Removes all entries, but preserves the root.
    fn cleanup(&mut self) -> bool;
}

pub type Result<T> = std::result::Result<T, anyhow::Error>;

pub mod utils {
    pub const CURRENT: &str = ".";
    pub const PARENT: &str = "..";
    pub const ROOT: &str = "/";

    /// How a raw name argument is treated.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub enum NameClass {
        /// `.`, `..` or `/`: fine as an argument, never a name.
        Reserved,
        /// Empty or containing `/`.
        Invalid,
        /// Usable as the name of a file or directory.
        Plain,
    }

    pub fn classify(name: &str) -> NameClass {
        if is_reserved(name) {
            NameClass::Reserved
        } else if is_invalid(name) {
            NameClass::Invalid
        } else {
            NameClass::Plain
        }
    }

    pub fn is_reserved(name: &str) -> bool {
        name == CURRENT || name == PARENT || name == ROOT
    }

    /// Note that `/` itself is invalid too; reserved tokens are checked first by `classify()`.
    pub fn is_invalid(name: &str) -> bool {
        name.is_empty() || name.contains('/')
    }

    /// Empty string and `.` both address the current directory.
    pub fn is_current(name: &str) -> bool {
        name.is_empty() || name == CURRENT
    }
}
