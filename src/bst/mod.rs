//! Unbalanced binary search tree that the self-balancing trees are built on.

mod node;
mod tree;

pub use self::node::Node;
pub use self::tree::{IntoIter, Iter, Tree};
