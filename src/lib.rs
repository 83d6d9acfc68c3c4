//! This crate is an allocator-agnostic container library built around an
//! intrusive binary search tree.
//!
//! Three layers stack up, leaves first:
//!
//! * [`caps`]: the capability contracts every algorithm is parameterized
//!   over: allocation ([`caps::NodeAllocator`]), optional payload lifecycle
//!   ([`caps::Lifecycle`]), and comparison ([`caps::Comparator`]). All
//!   dispatch is static; a tree is monomorphized over its capabilities.
//! * [`node`]: the shape-agnostic binary tree engine: the node relation
//!   (owning `left`/`right` edges, a non-owning `parent` back-reference),
//!   creation and whole-subtree teardown, and the size/height/balance
//!   measurements.
//! * [`tree`]: the search-tree engine layering ordering on top, and
//!   [`traverse`], whose structural and collaborator-driven walks work over
//!   any topology.
//!
//! The most important invariants of the search tree are:
//!
//! 1. For every node, all the nodes in its left subtree compare strictly
//!    less than it, and all the nodes in its right subtree strictly greater.
//! 2. Every non-root node is recorded as exactly one child of its parent;
//!    the root has no parent.
//! 3. The tree's `len` equals the count of nodes reachable from the root.
//!
//! Nothing rebalances: the shape is whatever the insertion order produces,
//! and `height` / `balance_factor` are informational. The tree is
//! single-owner and synchronous; concurrent mutation must be serialized
//! externally.
//!
//! # Examples
//!
//! ```
//! use arbor::traverse::{self, Order};
//! use arbor::tree::Bst;
//!
//! let mut tree = Bst::new();
//! for key in [5, 3, 8, 1, 4, 7, 9] {
//!     tree.insert(key).unwrap();
//! }
//!
//! // In-order traversal yields the comparator's increasing sequence.
//! let mut keys = Vec::new();
//! traverse::traverse(tree.root(), Order::In, &mut |&k| keys.push(k));
//! assert_eq!(keys, [1, 3, 4, 5, 7, 8, 9]);
//!
//! // Removing the root promotes its in-order successor.
//! assert_eq!(tree.remove(&5), Some(5));
//! assert_eq!(*tree.root().unwrap().payload(), 7);
//! ```

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

pub mod caps;
pub mod node;
pub mod traverse;
pub mod tree;

#[cfg(test)]
pub(crate) mod test;
