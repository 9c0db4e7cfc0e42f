use crate::arena::Handle;
use crate::entry::Entry;

/// A struct representing an internal node of a binary search tree.
///
/// Children are owned through the tree's arena; `parent` is a plain back-reference used for
/// upward traversal and plays no part in deallocation.
pub struct Node<T, U> {
    pub entry: Entry<T, U>,
    pub height: usize,
    pub parent: Option<Handle>,
    pub left: Option<Handle>,
    pub right: Option<Handle>,
}

impl<T, U> Node<T, U> {
    /// Creates a detached leaf.
    pub fn new(key: T, value: U, parent: Option<Handle>) -> Self {
        Node {
            entry: Entry::new(key, value),
            height: 1,
            parent,
            left: None,
            right: None,
        }
    }

    pub fn has_two_children(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}
