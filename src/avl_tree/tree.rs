use crate::arena::Handle;
use crate::bst::{Node, Tree};
use crate::entry::Entry;
use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::mem;

/// Returns the cached height of a subtree. A missing subtree has height 0.
pub fn height<T, U>(tree: &Tree<T, U>, node: Option<Handle>) -> usize {
    match node {
        None => 0,
        Some(handle) => tree[handle].height,
    }
}

fn update<T, U>(tree: &mut Tree<T, U>, handle: Handle) {
    let Node { left, right, .. } = tree[handle];
    let new_height = cmp::max(height(tree, left), height(tree, right)) + 1;
    tree[handle].height = new_height;
}

fn balance_factor<T, U>(tree: &Tree<T, U>, handle: Handle) -> i32 {
    let Node { left, right, .. } = tree[handle];
    (height(tree, left) as i32) - (height(tree, right) as i32)
}

// precondition: `node` has a left child
pub fn rotate_right<T, U>(tree: &mut Tree<T, U>, node: Handle) {
    let child = match tree[node].left {
        Some(child) => child,
        None => unreachable!(),
    };
    trace!("rotating right at {:?}", node);

    let parent = tree[node].parent;
    let inner = tree[child].right;
    tree[node].left = inner;
    if let Some(inner) = inner {
        tree[inner].parent = Some(node);
    }
    tree.replace_child(parent, node, Some(child));
    tree[child].right = Some(node);
    tree[node].parent = Some(child);

    update(tree, node);
    update(tree, child);
}

// precondition: `node` has a right child
pub fn rotate_left<T, U>(tree: &mut Tree<T, U>, node: Handle) {
    let child = match tree[node].right {
        Some(child) => child,
        None => unreachable!(),
    };
    trace!("rotating left at {:?}", node);

    let parent = tree[node].parent;
    let inner = tree[child].left;
    tree[node].right = inner;
    if let Some(inner) = inner {
        tree[inner].parent = Some(node);
    }
    tree.replace_child(parent, node, Some(child));
    tree[child].left = Some(node);
    tree[node].parent = Some(child);

    update(tree, node);
    update(tree, child);
}

/// Restores the height and balance invariants on every node from `start` up to the root.
///
/// The walk never stops early: after a deletion, each ancestor may need its own rotation.
pub fn rebalance_from<T, U>(tree: &mut Tree<T, U>, start: Option<Handle>) {
    let mut curr = start;
    while let Some(node) = curr {
        let balance = balance_factor(tree, node);
        if balance > 1 {
            let child = match tree[node].left {
                Some(child) => child,
                None => unreachable!(),
            };
            // ties go to the single rotation
            if balance_factor(tree, child) < 0 {
                rotate_left(tree, child);
            }
            rotate_right(tree, node);
        } else if balance < -1 {
            let child = match tree[node].right {
                Some(child) => child,
                None => unreachable!(),
            };
            if balance_factor(tree, child) > 0 {
                rotate_right(tree, child);
            }
            rotate_left(tree, node);
        }
        update(tree, node);

        // a rotation moves `node` below its old child, so the parent is re-read
        curr = tree[node].parent;
    }
}

/// Inserts a key-value pair. If the key already exists, the stored entry is replaced in place
/// and returned; the shape of the tree does not change. Both the value and the stored key are
/// replaced, so the key passed in is the one kept.
pub fn insert<T, U>(tree: &mut Tree<T, U>, key: T, value: U) -> Option<Entry<T, U>>
where
    T: Ord,
{
    let mut parent = None;
    let mut curr = tree.root;
    let mut is_left = false;
    while let Some(handle) = curr {
        curr = match key.cmp(&tree[handle].entry.key) {
            Ordering::Less => {
                is_left = true;
                tree[handle].left
            },
            Ordering::Greater => {
                is_left = false;
                tree[handle].right
            },
            Ordering::Equal => {
                return Some(mem::replace(&mut tree[handle].entry, Entry::new(key, value)));
            },
        };
        parent = Some(handle);
    }

    let new_node = tree.allocate(Node::new(key, value, parent));
    match parent {
        None => tree.root = Some(new_node),
        Some(parent) => {
            if is_left {
                tree[parent].left = Some(new_node);
            } else {
                tree[parent].right = Some(new_node);
            }
        },
    }

    // a fresh leaf is balanced, so the walk starts at its parent
    rebalance_from(tree, parent);
    None
}

/// Removes the entry with a particular key and returns it, or returns `None` if the key does
/// not exist.
pub fn remove<T, U, V>(tree: &mut Tree<T, U>, key: &V) -> Option<Entry<T, U>>
where
    T: Borrow<V>,
    V: Ord + ?Sized,
{
    let mut target = tree.find(key)?;

    // reduce to removing a node with at most one child
    if tree[target].has_two_children() {
        let predecessor = match tree.predecessor(target) {
            Some(predecessor) => predecessor,
            None => unreachable!(),
        };
        tree.swap_entries(target, predecessor);
        target = predecessor;
    }

    let Node { parent, left, right, .. } = tree[target];
    tree.replace_child(parent, target, left.or(right));
    let Node { entry, .. } = tree.free(target);

    if tree.root.is_none() {
        debug!("removed last entry, tree is empty");
    } else if parent.is_none() {
        debug!("removed root, promoted {:?}", tree.root);
    }

    rebalance_from(tree, parent);
    Some(entry)
}

/// Checks that the heights of the two subtrees of every node differ by at most one.
pub fn is_balanced<T, U>(tree: &Tree<T, U>) -> bool {
    is_balanced_subtree(tree, tree.root)
}

fn is_balanced_subtree<T, U>(tree: &Tree<T, U>, node: Option<Handle>) -> bool {
    match node {
        None => true,
        Some(handle) => {
            let Node { left, right, .. } = tree[handle];
            let left_height = height(tree, left);
            let right_height = height(tree, right);
            cmp::max(left_height, right_height) - cmp::min(left_height, right_height) <= 1
                && is_balanced_subtree(tree, left)
                && is_balanced_subtree(tree, right)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{height, insert, is_balanced, remove, rotate_left, rotate_right};
    use crate::arena::Handle;
    use crate::bst::Tree;
    use proptest::prelude::*;
    use std::cmp;
    use std::collections::BTreeSet;

    type Shape = Vec<(u32, usize, Option<u32>, Option<u32>, Option<u32>)>;

    fn key_of(tree: &Tree<u32, u32>, handle: Option<Handle>) -> Option<u32> {
        handle.map(|handle| tree[handle].entry.key)
    }

    // Recomputes heights from scratch and checks them against the cached ones, along with the
    // parent links and key ordering.
    fn check_subtree(tree: &Tree<u32, u32>, node: Option<Handle>, parent: Option<Handle>) -> usize {
        match node {
            None => 0,
            Some(handle) => {
                let curr = &tree[handle];
                assert_eq!(curr.parent, parent);
                if let Some(left) = curr.left {
                    assert!(tree[left].entry.key < curr.entry.key);
                }
                if let Some(right) = curr.right {
                    assert!(tree[right].entry.key > curr.entry.key);
                }
                let left_height = check_subtree(tree, curr.left, Some(handle));
                let right_height = check_subtree(tree, curr.right, Some(handle));
                let computed = cmp::max(left_height, right_height) + 1;
                assert_eq!(curr.height, computed);
                computed
            },
        }
    }

    fn check(tree: &Tree<u32, u32>) {
        check_subtree(tree, tree.root, None);
        assert!(is_balanced(tree));
    }

    // Pre-order listing of (key, height, parent, left, right).
    fn shape(tree: &Tree<u32, u32>) -> Shape {
        let mut ret = Vec::new();
        let mut stack = Vec::new();
        stack.extend(tree.root);
        while let Some(handle) = stack.pop() {
            let node = &tree[handle];
            ret.push((
                node.entry.key,
                node.height,
                key_of(tree, node.parent),
                key_of(tree, node.left),
                key_of(tree, node.right),
            ));
            stack.extend(node.right);
            stack.extend(node.left);
        }
        ret
    }

    fn parents(tree: &Tree<u32, u32>) -> Vec<(u32, Option<u32>)> {
        let mut ret = shape(tree)
            .into_iter()
            .map(|(key, _, parent, _, _)| (key, parent))
            .collect::<Vec<_>>();
        ret.sort();
        ret
    }

    fn build(keys: &[u32]) -> Tree<u32, u32> {
        let mut tree = Tree::new();
        for key in keys {
            insert(&mut tree, *key, *key);
            check(&tree);
        }
        tree
    }

    fn keys(tree: &Tree<u32, u32>) -> Vec<u32> {
        tree.iter().map(|(key, _)| *key).collect()
    }

    #[test]
    fn test_height_of_missing_subtree() {
        let tree: Tree<u32, u32> = Tree::new();
        assert_eq!(height(&tree, None), 0);
        assert!(is_balanced(&tree));
    }

    #[test]
    fn test_leaf_height() {
        let tree = build(&[1]);
        assert_eq!(height(&tree, tree.root), 1);
    }

    #[test]
    fn test_ascending_inserts_rotate_left() {
        let tree = build(&[1, 2, 3]);
        assert_eq!(
            shape(&tree),
            vec![
                (2, 2, None, Some(1), Some(3)),
                (1, 1, Some(2), None, None),
                (3, 1, Some(2), None, None),
            ],
        );
    }

    #[test]
    fn test_descending_inserts_rotate_right() {
        let tree = build(&[3, 2, 1]);
        assert_eq!(
            shape(&tree),
            vec![
                (2, 2, None, Some(1), Some(3)),
                (1, 1, Some(2), None, None),
                (3, 1, Some(2), None, None),
            ],
        );
    }

    #[test]
    fn test_left_right_double_rotation() {
        let tree = build(&[3, 1, 2]);
        assert_eq!(
            shape(&tree),
            vec![
                (2, 2, None, Some(1), Some(3)),
                (1, 1, Some(2), None, None),
                (3, 1, Some(2), None, None),
            ],
        );
    }

    #[test]
    fn test_right_left_double_rotation() {
        let tree = build(&[1, 3, 2]);
        assert_eq!(key_of(&tree, tree.root), Some(2));
        assert_eq!(keys(&tree), vec![1, 2, 3]);
    }

    #[test]
    fn test_rotations_preserve_order() {
        let mut tree = build(&[4, 2, 6, 1, 3, 5, 7]);
        let root = tree.root.unwrap();

        rotate_right(&mut tree, root);
        assert_eq!(key_of(&tree, tree.root), Some(2));
        assert_eq!(keys(&tree), vec![1, 2, 3, 4, 5, 6, 7]);
        check_subtree(&tree, tree.root, None);
        // left subtree has height 1, right subtree has height 3
        assert!(!is_balanced(&tree));

        let root = tree.root.unwrap();
        rotate_left(&mut tree, root);
        assert_eq!(key_of(&tree, tree.root), Some(4));
        check(&tree);
    }

    #[test]
    fn test_is_balanced_detects_violation_below_root() {
        let mut tree = build(&[4, 2, 6, 1, 3, 5, 7]);
        let two = tree.find(&2).unwrap();

        // 1 takes the place of 2 and is left with an empty left subtree and a right chain 2 -> 3
        rotate_right(&mut tree, two);
        assert_eq!(key_of(&tree, tree.root), Some(4));
        assert_eq!(height(&tree, tree[tree.root.unwrap()].left), 3);
        assert_eq!(height(&tree, tree[tree.root.unwrap()].right), 2);
        assert!(!is_balanced(&tree));

        let one = tree.find(&1).unwrap();
        rotate_left(&mut tree, one);
        check(&tree);
    }

    #[test]
    fn test_remove_keeps_balance() {
        let mut tree = build(&[1, 2, 3, 4, 5]);
        assert_eq!(remove(&mut tree, &1).map(|entry| entry.key), Some(1));
        check(&tree);
        assert_eq!(keys(&tree), vec![2, 3, 4, 5]);
    }

    #[test]
    fn test_remove_two_children_uses_predecessor() {
        let mut tree = build(&[5, 3, 8, 1, 4, 7, 9]);
        let root = tree.root;

        let entry = remove(&mut tree, &5).unwrap();
        assert_eq!((entry.key, entry.value), (5, 5));
        check(&tree);

        // the root position survives and now holds the predecessor
        assert_eq!(tree.root, root);
        assert_eq!(
            shape(&tree),
            vec![
                (4, 3, None, Some(3), Some(8)),
                (3, 2, Some(4), Some(1), None),
                (1, 1, Some(3), None, None),
                (8, 2, Some(4), Some(7), Some(9)),
                (7, 1, Some(8), None, None),
                (9, 1, Some(8), None, None),
            ],
        );
    }

    #[test]
    fn test_remove_cascades_to_root() {
        // Fibonacci-shaped tree: removing the shallowest leaf forces rotations on two levels.
        let mut tree = build(&[8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1]);
        remove(&mut tree, &12);
        check(&tree);
        assert_eq!(keys(&tree), vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(key_of(&tree, tree.root), Some(5));
    }

    #[test]
    fn test_remove_root_only() {
        let mut tree = build(&[1]);
        assert!(remove(&mut tree, &1).is_some());
        assert_eq!(tree.root, None);
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn test_remove_root_with_one_child() {
        let mut tree = build(&[1, 2]);
        remove(&mut tree, &1);
        assert_eq!(shape(&tree), vec![(2, 1, None, None, None)]);
    }

    #[test]
    fn test_remove_missing() {
        let mut tree = build(&[1, 2, 3]);
        let before = shape(&tree);
        assert!(remove(&mut tree, &4).is_none());
        assert_eq!(shape(&tree), before);
    }

    #[test]
    fn test_insert_replace_keeps_shape() {
        let mut tree = build(&[5, 3, 8, 1]);
        let before = shape(&tree);

        let old = insert(&mut tree, 3, 30).unwrap();
        assert_eq!((old.key, old.value), (3, 3));
        assert_eq!(shape(&tree), before);
        assert_eq!(tree.get(&3).map(|entry| entry.value), Some(30));
        assert_eq!(tree.len(), 4);
    }

    #[test]
    fn test_insert_then_remove_restores_shape() {
        let mut tree = build(&[2, 1, 3]);
        let before = shape(&tree);
        insert(&mut tree, 4, 4);
        remove(&mut tree, &4);
        assert_eq!(shape(&tree), before);
    }

    proptest! {
        #[test]
        fn prop_balanced_after_every_operation(ops in prop::collection::vec((any::<bool>(), 0u32..256), 0..400)) {
            let mut tree = Tree::new();
            let mut expected = BTreeSet::new();
            for (is_insert, key) in ops {
                if is_insert {
                    insert(&mut tree, key, key);
                    expected.insert(key);
                } else {
                    prop_assert_eq!(remove(&mut tree, &key).is_some(), expected.remove(&key));
                }
                check(&tree);
                prop_assert_eq!(tree.len(), expected.len());
            }
            prop_assert_eq!(keys(&tree), expected.into_iter().collect::<Vec<u32>>());
        }

        #[test]
        fn prop_height_bound(inserted in prop::collection::vec(any::<u32>(), 1..1000)) {
            let mut tree = Tree::new();
            for key in inserted {
                insert(&mut tree, key, key);
                let bound = 1.44 * ((tree.len() + 2) as f64).log2();
                prop_assert!((height(&tree, tree.root) as f64) <= bound);
            }
        }

        #[test]
        fn prop_overwrite_keeps_shape(inserted in prop::collection::vec(0u32..500, 1..200), index in any::<prop::sample::Index>()) {
            let mut tree = Tree::new();
            for key in &inserted {
                insert(&mut tree, *key, 0);
            }
            let before = shape(&tree);
            let key = *index.get(&inserted);

            prop_assert!(insert(&mut tree, key, 1).is_some());
            prop_assert!(insert(&mut tree, key, 2).is_some());
            prop_assert_eq!(shape(&tree), before);
            prop_assert_eq!(tree.get(&key).map(|entry| entry.value), Some(2));
        }

        #[test]
        fn prop_insert_remove_round_trip(inserted in prop::collection::vec(0u32..1000, 0..200), extra in 0u32..1000) {
            let mut tree = Tree::new();
            for key in &inserted {
                insert(&mut tree, *key, *key);
            }
            prop_assume!(tree.find(&extra).is_none());

            let before = shape(&tree);
            let before_keys = keys(&tree);
            let before_parents = parents(&tree);

            insert(&mut tree, extra, extra);
            let mut after_parents = parents(&tree);
            after_parents.retain(|(key, _)| *key != extra);
            // every rotation moves an existing node under a new parent
            let rotated = before_parents != after_parents;

            remove(&mut tree, &extra);
            check(&tree);
            prop_assert_eq!(keys(&tree), before_keys);
            if !rotated {
                prop_assert_eq!(shape(&tree), before);
            }
        }
    }
}
