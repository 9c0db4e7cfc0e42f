use crate::arena::{Handle, TypedArena};
use crate::bst::node::Node;
use crate::entry::Entry;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;
use std::ops::{Index, IndexMut};

/// Unbalanced binary search tree whose nodes live in a `TypedArena`.
///
/// This type only knows how to navigate and relink nodes. It never restructures the tree on its
/// own; balancing policies are layered on top of it.
pub struct Tree<T, U> {
    arena: TypedArena<Node<T, U>>,
    pub root: Option<Handle>,
}

impl<T, U> Tree<T, U> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Tree {
            arena: TypedArena::with_capacity(capacity),
            root: None,
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    pub fn allocate(&mut self, node: Node<T, U>) -> Handle {
        self.arena.allocate(node)
    }

    /// Releases a node that has already been detached from the tree.
    pub fn free(&mut self, handle: Handle) -> Node<T, U> {
        self.arena.free(handle)
    }

    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = None;
    }

    /// Returns the handle of the node holding `key`.
    pub fn find<V>(&self, key: &V) -> Option<Handle>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let mut curr = self.root;
        while let Some(handle) = curr {
            let node = &self[handle];
            curr = match key.cmp(node.entry.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(handle),
            };
        }
        None
    }

    pub fn get<V>(&self, key: &V) -> Option<&Entry<T, U>>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        self.find(key).map(|handle| &self[handle].entry)
    }

    pub fn get_mut<V>(&mut self, key: &V) -> Option<&mut Entry<T, U>>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        match self.find(key) {
            Some(handle) => Some(&mut self[handle].entry),
            None => None,
        }
    }

    pub fn leftmost(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self[handle].left {
            handle = left;
        }
        handle
    }

    pub fn rightmost(&self, mut handle: Handle) -> Handle {
        while let Some(right) = self[handle].right {
            handle = right;
        }
        handle
    }

    /// Returns the node that precedes `handle` in an in-order traversal.
    pub fn predecessor(&self, handle: Handle) -> Option<Handle> {
        if let Some(left) = self[handle].left {
            return Some(self.rightmost(left));
        }

        let mut child = handle;
        let mut parent = self[handle].parent;
        while let Some(curr) = parent {
            if self[curr].right == Some(child) {
                return Some(curr);
            }
            child = curr;
            parent = self[curr].parent;
        }
        None
    }

    pub fn min(&self) -> Option<&Entry<T, U>> {
        self.root.map(|root| &self[self.leftmost(root)].entry)
    }

    pub fn max(&self) -> Option<&Entry<T, U>> {
        self.root.map(|root| &self[self.rightmost(root)].entry)
    }

    /// Returns the entry with the greatest key less than or equal to `key`.
    pub fn floor<V>(&self, key: &V) -> Option<&Entry<T, U>>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let mut curr = self.root;
        let mut ret = None;
        while let Some(handle) = curr {
            let node = &self[handle];
            curr = match key.cmp(node.entry.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => {
                    ret = Some(&node.entry);
                    node.right
                },
                Ordering::Equal => return Some(&node.entry),
            };
        }
        ret
    }

    /// Returns the entry with the least key greater than or equal to `key`.
    pub fn ceil<V>(&self, key: &V) -> Option<&Entry<T, U>>
    where
        T: Borrow<V>,
        V: Ord + ?Sized,
    {
        let mut curr = self.root;
        let mut ret = None;
        while let Some(handle) = curr {
            let node = &self[handle];
            curr = match key.cmp(node.entry.key.borrow()) {
                Ordering::Greater => node.right,
                Ordering::Less => {
                    ret = Some(&node.entry);
                    node.left
                },
                Ordering::Equal => return Some(&node.entry),
            };
        }
        ret
    }

    /// Puts `new` in the slot of `parent` that currently holds `old`, or makes it the root if
    /// `parent` is `None`. The parent link of `new` is updated; `old` is left untouched.
    pub fn replace_child(&mut self, parent: Option<Handle>, old: Handle, new: Option<Handle>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                if self[parent].left == Some(old) {
                    self[parent].left = new;
                } else {
                    self[parent].right = new;
                }
            },
        }
        if let Some(new) = new {
            self[new].parent = parent;
        }
    }

    /// Exchanges the entries of two nodes. Both nodes keep their position, links and height.
    ///
    /// # Panics
    ///
    /// Panics if the handles are equal or if either one does not refer to a live node.
    pub fn swap_entries(&mut self, first: Handle, second: Handle) {
        debug_assert_ne!(first, second, "Error: attempting to swap a node with itself.");
        match self.arena.get_pair_mut(first, second) {
            Some((a, b)) => mem::swap(&mut a.entry, &mut b.entry),
            None => panic!("Error: attempting to swap invalid nodes."),
        }
    }

    pub fn iter(&self) -> Iter<T, U> {
        Iter {
            tree: self,
            current: self.root,
            stack: Vec::new(),
        }
    }
}

impl<T, U> Index<Handle> for Tree<T, U> {
    type Output = Node<T, U>;

    fn index(&self, handle: Handle) -> &Self::Output {
        &self.arena[handle]
    }
}

impl<T, U> IndexMut<Handle> for Tree<T, U> {
    fn index_mut(&mut self, handle: Handle) -> &mut Self::Output {
        &mut self.arena[handle]
    }
}

impl<T, U> IntoIterator for Tree<T, U> {
    type IntoIter = IntoIter<T, U>;
    type Item = (T, U);

    fn into_iter(self) -> Self::IntoIter {
        let current = self.root;
        IntoIter {
            tree: self,
            current,
            stack: Vec::new(),
        }
    }
}

/// In-order iterator that yields owned pairs, releasing each node as it is visited.
pub struct IntoIter<T, U> {
    tree: Tree<T, U>,
    current: Option<Handle>,
    stack: Vec<Handle>,
}

impl<T, U> Iterator for IntoIter<T, U> {
    type Item = (T, U);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(handle) = self.current {
            self.stack.push(handle);
            self.current = self.tree[handle].left;
        }
        let handle = self.stack.pop()?;
        let Node { entry, right, .. } = self.tree.free(handle);
        self.current = right;
        Some(entry.into_pair())
    }
}

/// In-order iterator that yields borrowed pairs.
pub struct Iter<'a, T, U>
where
    T: 'a,
    U: 'a,
{
    tree: &'a Tree<T, U>,
    current: Option<Handle>,
    stack: Vec<Handle>,
}

impl<'a, T, U> Iterator for Iter<'a, T, U>
where
    T: 'a,
    U: 'a,
{
    type Item = (&'a T, &'a U);

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        while let Some(handle) = self.current {
            self.stack.push(handle);
            self.current = tree[handle].left;
        }
        self.stack.pop().map(|handle| {
            let Node {
                entry: Entry { ref key, ref value },
                right,
                ..
            } = tree[handle];
            self.current = right;
            (key, value)
        })
    }
}
