//! Index-addressed node storage.
//!
//! Nodes live in a `Vec` of slots and are referenced by `NodeId` handles. A freed slot gets a
//! new generation before it is reused, so a handle kept past the release of its node is
//! reported as stale instead of silently addressing a different node.
//!
//! Sibling lists are only modified through `link_after()` and `unlink()`.

use anyhow::anyhow;

use super::entry::Entry;
use crate::core::Result;

/// Handle of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<usize>,
    live: usize,
}

impl Arena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    /// Number of allocated (not yet released) nodes.
    pub fn live(&self) -> usize {
        self.live
    }

    pub fn alloc(&mut self, entry: Entry) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.entry = Some(entry);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            entry: Some(entry),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Releases a single node. Its links are not touched; see `unlink()`.
    pub fn release(&mut self, id: NodeId) -> Result<Entry> {
        let slot = self
            .slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .ok_or_else(|| anyhow!("stale node handle: {:?}", id))?;
        let entry = slot
            .entry
            .take()
            .ok_or_else(|| anyhow!("node already released: {:?}", id))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        Ok(entry)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_ok()
    }

    pub fn get(&self, id: NodeId) -> Result<&Entry> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
            .ok_or_else(|| anyhow!("stale node handle: {:?}", id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Entry> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
            .ok_or_else(|| anyhow!("stale node handle: {:?}", id))
    }

    /// Iterates over the children of `parent` in list order.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let next = self.get(parent).ok().and_then(|entry| entry.first_child);
        Children { arena: self, next }
    }

    /// Links the detached `node` into the children list of `parent`, right after `prev`
    /// (or at the head when `prev` is `None`).
    pub fn link_after(&mut self, parent: NodeId, prev: Option<NodeId>, node: NodeId) -> Result<()> {
        if !self.get(parent)?.is_container() {
            return Err(anyhow!("{} is not a directory", self.get(parent)?.name()));
        }
        let next = match prev {
            Some(prev) => {
                let prev_entry = self.get(prev)?;
                debug_assert_eq!(prev_entry.parent, Some(parent));
                prev_entry.next
            }
            None => self.get(parent)?.first_child,
        };

        let entry = self.get_mut(node)?;
        debug_assert!(entry.parent.is_none() && entry.prev.is_none() && entry.next.is_none());
        entry.parent = Some(parent);
        entry.prev = prev;
        entry.next = next;

        match prev {
            Some(prev) => self.get_mut(prev)?.next = Some(node),
            None => self.get_mut(parent)?.first_child = Some(node),
        }
        if let Some(next) = next {
            self.get_mut(next)?.prev = Some(node);
        }
        Ok(())
    }

    /// Detaches `node` from its parent's children list, repairing the neighbour links.
    pub fn unlink(&mut self, node: NodeId) -> Result<()> {
        let entry = self.get(node)?;
        let parent = entry
            .parent
            .ok_or_else(|| anyhow!("{} has no parent", entry.name()))?;
        let (prev, next) = (entry.prev, entry.next);

        match prev {
            Some(prev) => self.get_mut(prev)?.next = next,
            None => self.get_mut(parent)?.first_child = next,
        }
        if let Some(next) = next {
            self.get_mut(next)?.prev = prev;
        }

        let entry = self.get_mut(node)?;
        entry.parent = None;
        entry.prev = None;
        entry.next = None;
        Ok(())
    }

    /// Releases `top` and everything below it, children before their parent.
    /// Returns the number of released nodes.
    ///
    /// `top` should be unlinked first unless it is the root.
    pub fn release_subtree(&mut self, top: NodeId) -> Result<usize> {
        let mut released = 0;
        let mut stack = vec![(top, false)];
        while let Some((id, expanded)) = stack.pop() {
            let first_child = self.get(id)?.first_child;
            if !expanded && first_child.is_some() {
                stack.push((id, true));
                stack.extend(self.children(id).map(|(child, _)| (child, false)));
                continue;
            }
            self.release(id)?;
            released += 1;
        }
        Ok(released)
    }
}

pub(crate) struct Children<'a> {
    arena: &'a Arena,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Entry);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let entry = self.arena.get(id).ok()?;
        self.next = entry.next;
        Some((id, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntryType;

    fn names(arena: &Arena, parent: NodeId) -> Vec<String> {
        arena
            .children(parent)
            .map(|(_, entry)| entry.name().to_string())
            .collect()
    }

    fn setup() -> (Arena, NodeId) {
        let mut arena = Arena::with_capacity(8);
        let root = arena.alloc(Entry::new("/", EntryType::Root));
        (arena, root)
    }

    mod storage {
        use super::*;

        #[test]
        fn test_alloc_and_release() -> Result<()> {
            let (mut arena, root) = setup();
            assert_eq!(arena.live(), 1);

            let a = arena.alloc(Entry::new("a", EntryType::File));
            assert_eq!(arena.live(), 2);
            assert_eq!(arena.get(a)?.name(), "a");

            let entry = arena.release(a)?;
            assert_eq!(entry.name(), "a");
            assert_eq!(arena.live(), 1);
            assert!(arena.contains(root));
            Ok(())
        }

        #[test]
        fn test_stale_handle_is_rejected() -> Result<()> {
            let (mut arena, _root) = setup();
            let a = arena.alloc(Entry::new("a", EntryType::File));
            arena.release(a)?;

            // the slot is reused, the old handle must not reach the new node
            let b = arena.alloc(Entry::new("b", EntryType::File));
            assert_eq!(a.index, b.index);
            assert!(!arena.contains(a));
            assert!(arena.get(a).is_err());
            assert_eq!(arena.get(b)?.name(), "b");
            Ok(())
        }

        #[test]
        fn test_double_release_fails() -> Result<()> {
            let (mut arena, _root) = setup();
            let a = arena.alloc(Entry::new("a", EntryType::File));
            arena.release(a)?;
            assert!(arena.release(a).is_err());
            assert_eq!(arena.live(), 1);
            Ok(())
        }
    }

    mod links {
        use super::*;

        #[test]
        fn test_link_head_middle_tail() -> Result<()> {
            let (mut arena, root) = setup();
            let b = arena.alloc(Entry::new("b", EntryType::File));
            arena.link_after(root, None, b)?;
            let d = arena.alloc(Entry::new("d", EntryType::File));
            arena.link_after(root, Some(b), d)?;
            let a = arena.alloc(Entry::new("a", EntryType::File));
            arena.link_after(root, None, a)?;
            let c = arena.alloc(Entry::new("c", EntryType::File));
            arena.link_after(root, Some(b), c)?;

            assert_eq!(names(&arena, root), ["a", "b", "c", "d"]);
            assert_eq!(arena.get(root)?.first_child, Some(a));
            assert_eq!(arena.get(c)?.prev, Some(b));
            assert_eq!(arena.get(c)?.next, Some(d));
            assert_eq!(arena.get(d)?.prev, Some(c));
            assert_eq!(arena.get(d)?.next, None);
            assert_eq!(arena.get(a)?.prev, None);
            Ok(())
        }

        #[test]
        fn test_link_into_file_fails() -> Result<()> {
            let (mut arena, root) = setup();
            let f = arena.alloc(Entry::new("f", EntryType::File));
            arena.link_after(root, None, f)?;
            let g = arena.alloc(Entry::new("g", EntryType::File));
            assert!(arena.link_after(f, None, g).is_err());
            Ok(())
        }

        #[test]
        fn test_unlink_repairs_links() -> Result<()> {
            let (mut arena, root) = setup();
            let mut prev = None;
            let mut ids = Vec::new();
            for name in ["a", "b", "c"] {
                let id = arena.alloc(Entry::new(name, EntryType::File));
                arena.link_after(root, prev, id)?;
                prev = Some(id);
                ids.push(id);
            }

            arena.unlink(ids[1])?;
            assert_eq!(names(&arena, root), ["a", "c"]);
            assert_eq!(arena.get(ids[2])?.prev, Some(ids[0]));
            assert_eq!(arena.get(ids[0])?.next, Some(ids[2]));

            arena.unlink(ids[0])?;
            assert_eq!(names(&arena, root), ["c"]);
            assert_eq!(arena.get(root)?.first_child, Some(ids[2]));
            assert_eq!(arena.get(ids[2])?.prev, None);

            arena.unlink(ids[2])?;
            assert!(names(&arena, root).is_empty());
            assert_eq!(arena.get(root)?.first_child, None);
            Ok(())
        }

        #[test]
        fn test_unlink_root_fails() {
            let (mut arena, root) = setup();
            assert!(arena.unlink(root).is_err());
        }
    }

    mod subtree {
        use super::*;

        #[test]
        fn test_release_subtree_post_order() -> Result<()> {
            let (mut arena, root) = setup();
            let d = arena.alloc(Entry::new("d", EntryType::Directory));
            arena.link_after(root, None, d)?;
            let e = arena.alloc(Entry::new("e", EntryType::Directory));
            arena.link_after(d, None, e)?;
            let f = arena.alloc(Entry::new("f", EntryType::File));
            arena.link_after(e, None, f)?;
            let g = arena.alloc(Entry::new("g", EntryType::File));
            arena.link_after(d, Some(e), g)?;
            assert_eq!(arena.live(), 5);

            arena.unlink(d)?;
            assert_eq!(arena.release_subtree(d)?, 4);
            assert_eq!(arena.live(), 1);
            for id in [d, e, f, g] {
                assert!(!arena.contains(id));
            }
            assert_eq!(arena.get(root)?.first_child, None);
            Ok(())
        }

        #[test]
        fn test_release_deep_chain() -> Result<()> {
            let (mut arena, root) = setup();
            let mut parent = root;
            for _ in 0..100_000 {
                let id = arena.alloc(Entry::new("d", EntryType::Directory));
                arena.link_after(parent, None, id)?;
                parent = id;
            }
            assert_eq!(arena.release_subtree(root)?, 100_001);
            assert_eq!(arena.live(), 0);
            Ok(())
        }
    }
}
