//! The capability contracts the tree engines are parameterized over:
//! allocation, payload lifecycle, and comparison.
//!
//! None of these carry tree state. They are handed to the engines explicitly
//! so that a tree never reaches for a global allocator or an implicit
//! ordering. Each capability is an ordinary trait, which keeps the dispatch
//! static: a `Bst<T, C, A>` is monomorphized over its comparator and
//! allocator.
//!
//! # Examples
//!
//! A shared allocator with a hard ceiling on live nodes:
//!
//! ```
//! use arbor::caps::BoundedHeap;
//! use arbor::caps::NaturalOrder;
//! use arbor::tree::{Bst, InsertError};
//!
//! let mut alloc = BoundedHeap::new(2);
//! let mut tree = Bst::with_comparator_in(NaturalOrder, &mut alloc);
//!
//! tree.insert(1).unwrap();
//! tree.insert(2).unwrap();
//!
//! // The third allocation is refused and the payload comes back untouched.
//! assert_eq!(tree.insert(3), Err(InsertError::AllocationFailed(3)));
//! assert_eq!(tree.len(), 2);
//! ```

use std::cmp::Ordering;
use std::ptr::NonNull;

use thiserror::Error;

use crate::node::{Node, NodeHandle};

/// An allocation capability could not produce storage.
///
/// Surfaced by [`NodeAllocator`] implementations with a storage ceiling and
/// by the [`Fifo`]/[`Lifo`] traversal collaborators. Retrying is only
/// meaningful once storage has been returned to the capability.
///
/// [`Fifo`]: crate::traverse::Fifo
/// [`Lifo`]: crate::traverse::Lifo
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("allocation capability could not produce storage")]
pub struct AllocError;

/// A [`Lifecycle::init`] hook refused a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("payload initialization hook failed")]
pub struct InitError;

/// The allocation capability: produces and releases node storage.
///
/// A valid implementation must be able to satisfy at least as many
/// [`allocate`] calls as there are live nodes, and must treat exhaustion as a
/// normal result rather than a panic. The capability is shared with, and must
/// outlive, every tree using it; the engines neither pool nor cache released
/// storage. A `&mut A` borrow implements the trait too, so one allocator
/// instance can back several trees at once.
///
/// [`allocate`]: NodeAllocator::allocate
pub trait NodeAllocator<T> {
    /// Moves `node` into fresh storage and returns an owning handle to it.
    ///
    /// On failure the node is handed back, so the caller keeps ownership of
    /// its payload and nothing is leaked.
    fn allocate(&mut self, node: Node<T>) -> Result<NodeHandle<T>, Node<T>>;

    /// Releases the storage behind `handle` and returns the node by value,
    /// reverting ownership of the payload to the caller.
    ///
    /// # Safety
    ///
    /// `handle` must have been produced by this allocator (or one it is
    /// interchangeable with, as [`Heap`] instances are).
    unsafe fn release(&mut self, handle: NodeHandle<T>) -> Node<T>;
}

impl<'a, T, A: NodeAllocator<T>> NodeAllocator<T> for &'a mut A {
    fn allocate(&mut self, node: Node<T>) -> Result<NodeHandle<T>, Node<T>> {
        (**self).allocate(node)
    }

    unsafe fn release(&mut self, handle: NodeHandle<T>) -> Node<T> {
        (**self).release(handle)
    }
}

/// The default allocation capability: one `Box` per node.
///
/// `Box::new` aborts rather than reporting exhaustion, so this allocator
/// never returns an error. All `Heap` instances are interchangeable; a handle
/// allocated by one may be released by another.
#[derive(Debug, Default, Clone, Copy)]
pub struct Heap;

impl<T> NodeAllocator<T> for Heap {
    fn allocate(&mut self, node: Node<T>) -> Result<NodeHandle<T>, Node<T>> {
        let ptr = NonNull::from(Box::leak(Box::new(node)));
        // SAFETY: The pointer came from `Box::leak` just above, so it is a
        // unique, live node that nothing else owns.
        Ok(unsafe { NodeHandle::from_raw(ptr) })
    }

    unsafe fn release(&mut self, handle: NodeHandle<T>) -> Node<T> {
        *Box::from_raw(handle.into_raw().as_ptr())
    }
}

/// A [`Heap`] with a ceiling on live nodes.
///
/// [`allocate`] fails with the node handed back once `limit` nodes are live;
/// releasing a node frees up a slot again. Useful for exercising allocation
/// failure paths and for capping the footprint of a tree.
///
/// [`allocate`]: NodeAllocator::allocate
#[derive(Debug, Clone)]
pub struct BoundedHeap {
    live: usize,
    limit: usize,
}

impl BoundedHeap {
    /// A bounded allocator that satisfies at most `limit` live nodes.
    pub fn new(limit: usize) -> Self {
        Self { live: 0, limit }
    }

    /// How many nodes are currently live.
    pub fn live(&self) -> usize {
        self.live
    }
}

impl<T> NodeAllocator<T> for BoundedHeap {
    fn allocate(&mut self, node: Node<T>) -> Result<NodeHandle<T>, Node<T>> {
        if self.live == self.limit {
            return Err(node);
        }
        self.live += 1;
        Heap.allocate(node)
    }

    unsafe fn release(&mut self, handle: NodeHandle<T>) -> Node<T> {
        self.live -= 1;
        Heap.release(handle)
    }
}

/// The optional payload-lifecycle capability.
///
/// [`init`] runs when a node takes ownership of a payload through
/// [`node::create_with`]; [`deinit`] runs once per payload during whole-tree
/// teardown through [`node::destroy_with`] or [`Bst::clear_with`]. Removal of
/// a single node never invokes `deinit`; the payload's ownership reverts to
/// the caller instead.
///
/// The capability may be legitimately absent: `()` implements it with an
/// `init` that accepts everything and a `deinit` that just drops.
///
/// [`init`]: Lifecycle::init
/// [`deinit`]: Lifecycle::deinit
/// [`node::create_with`]: crate::node::create_with
/// [`node::destroy_with`]: crate::node::destroy_with
/// [`Bst::clear_with`]: crate::tree::Bst::clear_with
pub trait Lifecycle<T> {
    /// Finishes setting up a payload that was just moved into node storage.
    ///
    /// On failure the node is torn back down and the payload returns to the
    /// caller untouched by the tree.
    fn init(&mut self, payload: &mut T) -> Result<(), InitError>;

    /// Consumes one payload during whole-tree teardown.
    fn deinit(&mut self, payload: T);
}

impl<T> Lifecycle<T> for () {
    fn init(&mut self, _payload: &mut T) -> Result<(), InitError> {
        Ok(())
    }

    fn deinit(&mut self, payload: T) {
        drop(payload);
    }
}

/// The comparison capability: a total order over payloads.
///
/// The comparator is fixed when a tree is constructed and must be stable
/// (the same two inputs always yield the same sign) for the lifetime of
/// every tree using it. A comparator that is not a valid total order yields
/// an unspecified tree shape (but no memory unsafety from safe code).
///
/// Any `Fn(&T, &T) -> Ordering` closure is a comparator.
pub trait Comparator<T> {
    /// Compares two payloads, returning the ordering of `a` relative to `b`.
    fn cmp(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn cmp(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// The comparison capability derived from a payload's own [`Ord`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NaturalOrder;

impl<T: Ord> Comparator<T> for NaturalOrder {
    fn cmp(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}
