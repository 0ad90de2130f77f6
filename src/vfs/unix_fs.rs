//! This module provides an in-memory Unix-like filesystem tree with a current directory cursor.

use anyhow::anyhow;
use log::{debug, trace, warn};

use super::arena::{Arena, NodeId};
use crate::core::utils::{self, NameClass};
use crate::core::{FsBackend, Result};
use crate::{Entry, EntryType};

/// An in-memory filesystem made of a root, directories and files, navigated with a current
/// working directory cursor.
///
/// All names are single path components resolved against the current working directory
/// (`cwd`). The tokens `.`, `..` and `/` are understood by `cd()` and `ls()`, but can never be
/// used as names of entries.
///
/// ### Internal state
///
/// * `nodes` — The arena owning every entry of the tree. Entries refer to each other through
///   `NodeId` handles:
///   - `parent` — the directory holding the entry (`None` for the root).
///   - `prev` / `next` — neighbours in the children list of the parent.
///   - `first_child` — head of the children list of the root or a directory.
///
/// * `root` — Handle of the root entry, named `/`.
///
/// * `cwd` — Current Working Directory. A non-owning handle which always addresses the root
///   or a directory, never a file.
///
/// ### Invariants
///
/// 1. **Root existence**: the root is always present, unique, and has type `Root`.
/// 2. **Ordering**: the children of every directory are sorted by name (byte order), and
///    their names are unique.
/// 3. **Parent consistency**: every entry except the root is linked into the children list
///    of its `parent`.
/// 4. **Valid names**: no entry name is empty, contains `/`, or is a reserved token.
/// 5. **Live cursor**: `cwd` is never removed; `rm()` refuses the cursor and its ancestors.
///
/// ### Thread Safety
///
/// This struct is **not thread‑safe**. If concurrent access is required, wrap it in
/// a synchronization primitive (e.g., `Arc<Mutex<UnixFS>>`) at the application level.
///
/// ### Example
///
/// ```
/// use unix_fs_kit::{FsBackend, UnixFS};
///
/// let mut fs = UnixFS::new();
/// fs.mkdir("docs").unwrap();
/// fs.touch("readme").unwrap();
///
/// let lines: Vec<String> = fs.ls(".").unwrap().collect();
/// assert_eq!(lines, ["docs/", "readme"]);
///
/// fs.cd("docs").unwrap();
/// assert_eq!(fs.pwd(), "/docs");
/// ```
#[derive(Debug)]
pub struct UnixFS {
    nodes: Arena,
    root: NodeId,
    cwd: NodeId,
    strict_names: bool,
}

impl UnixFS {
    /// Creates new UnixFS instance holding only the root, which is also the current directory.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates new UnixFS instance with room for `capacity` entries before reallocation.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Arena::with_capacity(capacity.max(1));
        let root = nodes.alloc(Entry::new(utils::ROOT, EntryType::Root));
        Self {
            nodes,
            root,
            cwd: root,
            strict_names: false,
        }
    }

    /// With strict names `touch()` rejects `.`, `..` and `/` the same way `mkdir()` does.
    /// By default they are accepted by `touch()` as a no-op.
    pub fn set_strict_names(&mut self, strict: bool) {
        self.strict_names = strict;
    }

    pub fn is_strict_names(&self) -> bool {
        self.strict_names
    }

    /// Returns the entry of the current working directory.
    pub fn cwd(&self) -> &Entry {
        self.nodes.get(self.cwd).unwrap() // safe unwrap(): the cursor is never released
    }

    /// Number of entries in the tree, the root included.
    pub fn len(&self) -> usize {
        self.nodes.live()
    }

    /// Returns `true` if the root has no entries.
    pub fn is_empty(&self) -> bool {
        self.nodes.children(self.root).next().is_none()
    }

    /// Checks if `name` is a directory of the current working directory.
    pub fn is_dir(&self, name: &str) -> Result<bool> {
        Ok(self.entry(name)?.is_dir())
    }

    /// Checks if `name` is a file of the current working directory.
    pub fn is_file(&self, name: &str) -> Result<bool> {
        Ok(self.entry(name)?.is_file())
    }

    /// Returns all entries below the current working directory, recursively.
    ///
    /// Paths are relative to the current working directory and listed depth-first in name
    /// order, each directory right before its contents:
    /// ```text
    /// docs/
    /// docs/note
    /// readme
    /// ```
    pub fn tree(&self) -> Vec<String> {
        let mut result = Vec::new();
        let mut stack = self.child_frames(self.cwd, "");
        while let Some((id, prefix)) = stack.pop() {
            let Ok(entry) = self.nodes.get(id) else {
                continue;
            };
            let path = format!("{prefix}{}", entry.display_name());
            if entry.is_dir() {
                stack.extend(self.child_frames(id, &path));
            }
            result.push(path);
        }
        result
    }

    /// Destroys the filesystem, releasing every entry (children before their parents).
    /// Returns the number of released entries, the root included.
    pub fn teardown(mut self) -> Result<usize> {
        let released = self.nodes.release_subtree(self.root)?;
        debug!("teardown: {} entries released", released);
        Ok(released)
    }

    /// Verifies the structural invariants of the whole tree.
    pub fn check_invariants(&self) -> Result<()> {
        let root = self.nodes.get(self.root)?;
        if !root.is_root() || root.parent.is_some() || root.prev.is_some() || root.next.is_some() {
            return Err(anyhow!("root entry is malformed"));
        }
        if !self.nodes.contains(self.cwd) {
            return Err(anyhow!("current directory was released"));
        }
        if !self.nodes.get(self.cwd)?.is_container() {
            return Err(anyhow!("current directory is a file"));
        }

        let mut visited = 1;
        let mut stack = vec![self.root];
        while let Some(dir) = stack.pop() {
            let mut prev: Option<(NodeId, &Entry)> = None;
            for (id, entry) in self.nodes.children(dir) {
                visited += 1;
                if utils::classify(entry.name()) != NameClass::Plain {
                    return Err(anyhow!("illegal entry name: '{}'", entry.name()));
                }
                if entry.is_root() {
                    return Err(anyhow!("second root found: '{}'", entry.name()));
                }
                if entry.parent != Some(dir) {
                    return Err(anyhow!("{} is linked to a wrong parent", entry.name()));
                }
                if entry.prev != prev.map(|(prev_id, _)| prev_id) {
                    return Err(anyhow!("{} has a broken back link", entry.name()));
                }
                if let Some((_, prev_entry)) = prev {
                    if prev_entry.name() >= entry.name() {
                        return Err(anyhow!(
                            "{} is out of order after {}",
                            entry.name(),
                            prev_entry.name()
                        ));
                    }
                }
                if entry.is_file() && entry.first_child.is_some() {
                    return Err(anyhow!("file {} has children", entry.name()));
                }
                if entry.is_dir() {
                    stack.push(id);
                }
                prev = Some((id, entry));
            }
        }

        if visited != self.nodes.live() {
            return Err(anyhow!(
                "{} entries reachable, {} allocated",
                visited,
                self.nodes.live()
            ));
        }
        Ok(())
    }

    /// Looks `name` up among the children of the current working directory.
    fn resolve(&self, name: &str) -> Option<NodeId> {
        let found = self
            .nodes
            .children(self.cwd)
            .find(|(_, entry)| entry.name() == name)
            .map(|(id, _)| id);
        trace!("resolve '{}': {:?}", name, found);
        found
    }

    fn entry(&self, name: &str) -> Result<&Entry> {
        let id = self
            .resolve(name)
            .ok_or_else(|| anyhow!("{} does not exist", name))?;
        self.nodes.get(id)
    }

    /// The root is its own parent.
    fn parent_of(&self, id: NodeId) -> NodeId {
        self.nodes
            .get(id)
            .ok()
            .and_then(|entry| entry.parent)
            .unwrap_or(self.root)
    }

    /// Returns `true` if `node` is `of` or one of its ancestors.
    fn is_ancestor_or_self(&self, node: NodeId, of: NodeId) -> bool {
        let mut curr = Some(of);
        while let Some(id) = curr {
            if id == node {
                return true;
            }
            curr = self.nodes.get(id).ok().and_then(|entry| entry.parent);
        }
        false
    }

    fn render_children(&self, dir: NodeId) -> Vec<String> {
        self.nodes
            .children(dir)
            .map(|(_, entry)| entry.display_name())
            .collect()
    }

    /// Stack frames for `tree()`, pushed so that the first child pops first.
    fn child_frames(&self, dir: NodeId, prefix: &str) -> Vec<(NodeId, String)> {
        let mut frames: Vec<_> = self
            .nodes
            .children(dir)
            .map(|(id, _)| (id, prefix.to_string()))
            .collect();
        frames.reverse();
        frames
    }

    /// Inserts a new entry into the current working directory, keeping the children sorted.
    /// `name` must be a plain name not yet present.
    fn insert(&mut self, name: &str, entry_type: EntryType) -> Result<()> {
        let prev = self
            .nodes
            .children(self.cwd)
            .take_while(|(_, entry)| entry.name() < name)
            .last()
            .map(|(id, _)| id);
        let id = self.nodes.alloc(Entry::new(name, entry_type));
        if let Err(e) = self.nodes.link_after(self.cwd, prev, id) {
            self.nodes.release(id)?;
            return Err(e);
        }
        debug!("created {:?} '{}' in {}", entry_type, name, self.pwd());
        Ok(())
    }
}

impl Default for UnixFS {
    fn default() -> Self {
        Self::new()
    }
}

impl FsBackend for UnixFS {
    /// Returns the absolute path of the current working directory.
    fn pwd(&self) -> String {
        let mut names = Vec::new();
        let mut curr = self.cwd;
        while curr != self.root {
            match self.nodes.get(curr) {
                Ok(entry) => names.push(entry.name()),
                Err(_) => break,
            }
            curr = self.parent_of(curr);
        }
        names.reverse();
        format!("{}{}", utils::ROOT, names.join("/"))
    }

    /// Changes the current working directory.
    /// * `name` is `.` or empty (stay), `..` (parent, the root stays at the root), `/` (root),
    ///   or the name of a directory of the current working directory.
    ///
    /// An error is returned if `name` does not exist or is a file; the cursor is unchanged.
    fn cd(&mut self, name: &str) -> Result<()> {
        let target = match name {
            _ if utils::is_current(name) => self.cwd,
            utils::PARENT => self.parent_of(self.cwd),
            utils::ROOT => self.root,
            _ => {
                let id = self
                    .resolve(name)
                    .ok_or_else(|| anyhow!("{} does not exist", name))?;
                if !self.nodes.get(id)?.is_container() {
                    return Err(anyhow!("{} is not a directory", name));
                }
                id
            }
        };
        self.cwd = target;
        trace!("cd '{}': now in {}", name, self.pwd());
        Ok(())
    }

    /// Checks if `name` exists in the current working directory.
    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Returns the rendered lines of a listing, in name order.
    ///
    /// * `.` or empty — the entries of the current working directory;
    /// * `..` — the entries of its parent;
    /// * `/` — the entries of the root;
    /// * a file name — that name alone;
    /// * a directory name — the entries of that directory.
    ///
    /// Directories are shown with a trailing `/`. An empty directory yields nothing.
    /// An error is returned if `name` does not exist in the current working directory.
    fn ls(&self, name: &str) -> Result<impl Iterator<Item = String>> {
        let lines = match name {
            _ if utils::is_current(name) => self.render_children(self.cwd),
            utils::PARENT => self.render_children(self.parent_of(self.cwd)),
            utils::ROOT => self.render_children(self.root),
            _ => {
                let id = self
                    .resolve(name)
                    .ok_or_else(|| anyhow!("{} does not exist", name))?;
                let entry = self.nodes.get(id)?;
                if entry.is_file() {
                    vec![entry.display_name()]
                } else {
                    self.render_children(id)
                }
            }
        };
        Ok(lines.into_iter())
    }

    /// Creates an empty directory in the current working directory.
    ///
    /// Returns an error if `name` already exists, is a reserved token (`.`, `..`, `/`),
    /// is empty, or contains `/`.
    fn mkdir(&mut self, name: &str) -> Result<()> {
        if self.exists(name) {
            return Err(anyhow!("{} already exists", name));
        }
        match utils::classify(name) {
            NameClass::Reserved => Err(anyhow!("{} is a reserved name", name)),
            NameClass::Invalid => Err(anyhow!("invalid name: '{}'", name)),
            NameClass::Plain => self.insert(name, EntryType::Directory),
        }
    }

    /// Creates an empty file in the current working directory.
    ///
    /// Creating an existing name succeeds and leaves the tree unchanged. A reserved token is
    /// accepted as a no-op too, unless strict names are set (see `set_strict_names()`).
    /// Returns an error if `name` is empty or contains `/`.
    fn touch(&mut self, name: &str) -> Result<()> {
        match utils::classify(name) {
            NameClass::Reserved if self.strict_names => {
                Err(anyhow!("{} is a reserved name", name))
            }
            NameClass::Reserved => Ok(()),
            NameClass::Invalid => Err(anyhow!("invalid name: '{}'", name)),
            NameClass::Plain if self.exists(name) => Ok(()),
            NameClass::Plain => self.insert(name, EntryType::File),
        }
    }

    /// Removes a file or directory of the current working directory.
    /// A directory is removed with all its contents.
    ///
    /// Returns an error if `name` is a reserved token, is invalid, does not exist, or holds
    /// the current working directory.
    fn rm(&mut self, name: &str) -> Result<()> {
        match utils::classify(name) {
            NameClass::Reserved => return Err(anyhow!("{} is a reserved name", name)),
            NameClass::Invalid => return Err(anyhow!("invalid name: '{}'", name)),
            NameClass::Plain => {}
        }
        let id = self
            .resolve(name)
            .ok_or_else(|| anyhow!("{} does not exist", name))?;
        if self.is_ancestor_or_self(id, self.cwd) {
            warn!("refusing to remove '{}': it holds the current directory", name);
            return Err(anyhow!("cannot remove {}: it holds the current directory", name));
        }

        self.nodes.unlink(id)?;
        let released = self.nodes.release_subtree(id)?;
        debug!("removed '{}' from {}: {} entries released", name, self.pwd(), released);
        Ok(())
    }

    /// Removes all entries, but preserves the root. The cursor moves to the root.
    fn cleanup(&mut self) -> bool {
        let top: Vec<NodeId> = self.nodes.children(self.root).map(|(id, _)| id).collect();
        self.cwd = self.root;

        let mut released = 0;
        for id in top {
            let result = self
                .nodes
                .unlink(id)
                .and_then(|_| self.nodes.release_subtree(id));
            match result {
                Ok(count) => released += count,
                Err(e) => {
                    warn!("cleanup failed: {}", e);
                    return false;
                }
            }
        }
        debug!("cleanup: {} entries released", released);
        true
    }
}
