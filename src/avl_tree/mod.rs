//! Self-balancing binary search tree where the heights of the two child subtrees of any node
//! differ by at most one.

mod map;
mod set;
mod tree;

pub use self::map::{AvlMap, AvlMapIntoIter, AvlMapIter};
pub use self::set::{AvlSet, AvlSetIntoIter, AvlSetIter};

use std::error;
use std::fmt;
use std::result;

/// Error returned by strict lookups when the requested key is not in the tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct KeyError;

impl error::Error for KeyError {}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "key does not exist")
    }
}

pub type Result<T> = result::Result<T, KeyError>;
