//! Ordered collections backed by an arena-allocated avl tree.

#[macro_use]
extern crate log;

mod bst;
mod entry;
pub mod arena;
pub mod avl_tree;
