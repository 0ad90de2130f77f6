use super::arena::NodeId;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EntryType {
    Root,
    File,
    Directory,
}

/// One node of the tree.
///
/// Links are arena handles: `parent` is `None` only for the root, `prev`/`next` chain the
/// sorted siblings, `first_child` heads the children list of a root or directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    name: String,
    entry_type: EntryType,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
}

impl Entry {
    pub fn new(name: &str, entry_type: EntryType) -> Entry {
        Entry {
            name: name.to_string(),
            entry_type,
            parent: None,
            prev: None,
            next: None,
            first_child: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    pub fn is_root(&self) -> bool {
        self.entry_type == EntryType::Root
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    /// Root and directories may hold children.
    pub fn is_container(&self) -> bool {
        self.entry_type != EntryType::File
    }

    /// The entry as shown by `ls`.
    pub fn display_name(&self) -> String {
        match self.entry_type {
            EntryType::Directory => format!("{}/", self.name),
            _ => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(Entry::new("docs", EntryType::Directory).display_name(), "docs/");
        assert_eq!(Entry::new("a.txt", EntryType::File).display_name(), "a.txt");
        assert_eq!(Entry::new("/", EntryType::Root).display_name(), "/");
    }

    #[test]
    fn test_kinds() {
        let root = Entry::new("/", EntryType::Root);
        assert!(root.is_root() && root.is_container() && !root.is_dir());

        let file = Entry::new("f", EntryType::File);
        assert!(file.is_file() && !file.is_container());

        let dir = Entry::new("d", EntryType::Directory);
        assert!(dir.is_dir() && dir.is_container());
        assert_eq!(dir.first_child, None);
    }
}
