//! The binary search tree engine: ordering semantics layered on top of the
//! [`node`](crate::node) engine through the comparison capability.
//!
//! A [`Bst`] maintains three invariants after every completed public
//! operation:
//!
//! 1. For every node, everything in its left subtree compares strictly less
//!    than it and everything in its right subtree strictly greater.
//! 2. Every non-root node is recorded as exactly one child of its parent;
//!    the root's parent is absent.
//! 3. [`len`](Bst::len) equals the number of nodes reachable from the root.
//!
//! Duplicates are never inserted, and every fallible operation that refuses
//! hands the caller's payload or node back untouched; partial mutation is
//! not observable on failure.
//!
//! # Examples
//!
//! ```
//! use arbor::tree::{Bst, InsertError};
//!
//! let mut tree = Bst::new();
//!
//! // Nothing in here yet.
//! assert_eq!(tree.find(&1), None);
//!
//! tree.insert(1).unwrap();
//! assert_eq!(tree.find(&1), Some(&1));
//!
//! // A payload comparing equal to a resident node is refused.
//! assert_eq!(tree.insert(1), Err(InsertError::Duplicate(1)));
//!
//! // Removal hands the payload back rather than destroying it.
//! assert_eq!(tree.remove(&1), Some(1));
//! assert_eq!(tree.find(&1), None);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::ptr::NonNull;

use crate::caps::{Comparator, Heap, Lifecycle, NaturalOrder, NodeAllocator};
use crate::node::{self, CreateError, Link, Node, NodeHandle};

/// A binary search tree over payloads of type `T`, ordered by a comparison
/// capability `C` fixed at construction and backed by an allocation
/// capability `A`.
///
/// The tree is single-owner and synchronous: no internal locking, no
/// suspension points. Nothing here rebalances: the shape is whatever the
/// insertion order produces.
pub struct Bst<T, C = NaturalOrder, A: NodeAllocator<T> = Heap> {
    // A `Link` rather than `Option<NodeHandle<T>>` so the root can be copied
    // around during splicing like any other edge.
    root: Link<T>,
    len: usize,
    cmp: C,
    alloc: A,
}

/// Where a descent ended: the slot a new node would occupy.
enum Slot<T> {
    Root,
    LeftOf(NonNull<Node<T>>),
    RightOf(NonNull<Node<T>>),
}

/// [`Bst::insert`] refused a payload; it comes back inside the error.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum InsertError<T> {
    /// A node comparing equal is already in the tree.
    Duplicate(T),
    /// The allocation capability could not produce node storage.
    AllocationFailed(T),
}

impl<T> InsertError<T> {
    /// Hands the refused payload back.
    pub fn into_payload(self) -> T {
        match self {
            InsertError::Duplicate(payload) | InsertError::AllocationFailed(payload) => payload,
        }
    }
}

impl<T> fmt::Display for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::Duplicate(_) => f.write_str("a node comparing equal is already present"),
            InsertError::AllocationFailed(_) => {
                f.write_str("node storage could not be allocated")
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for InsertError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::Duplicate(payload) => {
                f.debug_tuple("Duplicate").field(payload).finish()
            }
            InsertError::AllocationFailed(payload) => {
                f.debug_tuple("AllocationFailed").field(payload).finish()
            }
        }
    }
}

impl<T: fmt::Debug> std::error::Error for InsertError<T> {}

/// [`Bst::insert_node`] found a resident node comparing equal. The rejected
/// node rides along, unattached, exactly as it was handed in.
pub struct DuplicateKey<T>(
    /// The rejected node, still solitary.
    pub NodeHandle<T>,
);

impl<T> DuplicateKey<T> {
    /// Hands the rejected node back.
    pub fn into_node(self) -> NodeHandle<T> {
        self.0
    }
}

impl<T> fmt::Display for DuplicateKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a node comparing equal is already present")
    }
}

impl<T: fmt::Debug> fmt::Debug for DuplicateKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DuplicateKey").field(&self.0).finish()
    }
}

impl<T: fmt::Debug> std::error::Error for DuplicateKey<T> {}

impl<T: Ord> Bst<T> {
    /// An empty tree ordered by `T`'s own [`Ord`], backed by the [`Heap`]
    /// allocator.
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<T: Ord> Default for Bst<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Comparator<T>> Bst<T, C> {
    /// An empty tree ordered by `cmp`, backed by the [`Heap`] allocator.
    ///
    /// `cmp` must be a valid total order over every payload the tree will
    /// ever hold, and stable for the tree's lifetime.
    ///
    /// # Examples
    ///
    /// ```
    /// use arbor::tree::Bst;
    ///
    /// // Order strings by length, ties broken lexicographically.
    /// let mut tree = Bst::with_comparator(|a: &&str, b: &&str| {
    ///     a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    /// });
    /// tree.insert("pine").unwrap();
    /// tree.insert("oak").unwrap();
    /// assert_eq!(tree.find(&"oak"), Some(&"oak"));
    /// ```
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_comparator_in(cmp, Heap)
    }
}

impl<T, C, A: NodeAllocator<T>> Bst<T, C, A> {
    /// An empty tree ordered by `cmp` whose nodes live in `alloc`.
    ///
    /// `alloc` is commonly a `&mut` borrow of a capability shared between
    /// several trees; it must outlive the tree.
    pub fn with_comparator_in(cmp: C, alloc: A) -> Self {
        Bst {
            root: Link::none(),
            len: 0,
            cmp,
            alloc,
        }
    }

    /// How many nodes the tree currently holds.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The root node, if the tree is non-empty. The usual entry point for
    /// the [`traverse`](crate::traverse) engine.
    pub fn root(&self) -> Option<&Node<T>> {
        // SAFETY: The root edge owns a live node and the shared borrow of
        // `self` keeps the whole structure alive.
        unsafe { self.root.0.as_ref().map(|ptr| ptr.as_ref()) }
    }

    /// The tree's height: -1 when empty, 0 for a single node.
    pub fn height(&self) -> isize {
        node::height(self.root())
    }

    /// Builds a solitary node holding `payload` with this tree's allocator,
    /// ready for [`insert_node`](Bst::insert_node).
    pub fn create_node(&mut self, payload: T) -> Result<NodeHandle<T>, CreateError<T>> {
        node::create(None, None, payload, &mut self.alloc)
    }

    /// Searches with a caller-supplied key comparison, for lookups by a key
    /// type other than `T`.
    ///
    /// `f` is called with resident payloads and returns the ordering of the
    /// *sought key* relative to each: [`Less`](Ordering::Less) descends
    /// left, [`Greater`](Ordering::Greater) descends right. It must agree
    /// with the order the tree was built under.
    ///
    /// # Examples
    ///
    /// ```
    /// use arbor::tree::Bst;
    ///
    /// let mut tree = Bst::with_comparator(|a: &(u32, &str), b: &(u32, &str)| a.0.cmp(&b.0));
    /// tree.insert((7, "seven")).unwrap();
    /// tree.insert((3, "three")).unwrap();
    ///
    /// let found = tree.search_by(|resident| 3.cmp(&resident.0));
    /// assert_eq!(found.map(|node| node.payload().1), Some("three"));
    /// assert!(tree.search_by(|resident| 5.cmp(&resident.0)).is_none());
    /// ```
    pub fn search_by<F>(&self, f: F) -> Option<&Node<T>>
    where
        F: Fn(&T) -> Ordering,
    {
        // SAFETY: The pointer is attached to this tree, which the shared
        // borrow of `self` keeps alive.
        self.locate_by(f).map(|ptr| unsafe { &*ptr.as_ptr() })
    }

    /// [`search_by`](Bst::search_by), returning the node's location as the
    /// tree's own edge pointer rather than a shared reference.
    ///
    /// This is the lookup to pair with [`remove_node`](Bst::remove_node):
    /// the returned pointer carries the provenance of the node's allocation,
    /// so the removal may write through it. A pointer laundered out of a
    /// shared `&Node<T>` (as `search_by` returns) is read-only and must not
    /// be handed to `remove_node`.
    ///
    /// The pointer stays valid until the node is removed or the tree is
    /// cleared or dropped.
    pub fn locate_by<F>(&self, f: F) -> Option<NonNull<Node<T>>>
    where
        F: Fn(&T) -> Ordering,
    {
        let mut cur = self.root.0;
        while let Some(ptr) = cur {
            // SAFETY: `ptr` is attached to this tree, which the shared
            // borrow of `self` keeps alive.
            let node = unsafe { &*ptr.as_ptr() };
            match f(&node.payload) {
                Ordering::Less => cur = node.left.0,
                Ordering::Equal => return Some(ptr),
                Ordering::Greater => cur = node.right.0,
            }
        }
        None
    }

    /// Detaches `node` from the tree and returns ownership of it, payload
    /// included, to the caller. The payload is not destroyed. The returned
    /// handle's relations are all cleared.
    ///
    /// A node with two children is replaced by its in-order successor (the
    /// leftmost node of its right subtree): the successor is relocated into
    /// the node's former topological slot, re-adopting the node's children.
    /// No payload is copied or moved in the process, so outstanding raw
    /// pointers to *other* nodes stay valid.
    ///
    /// # Safety
    ///
    /// `node` must currently be attached to this tree, and the pointer must
    /// be valid for writes: obtain it from [`locate_by`](Bst::locate_by),
    /// not by casting a shared `&Node<T>`. Passing a detached node, a node
    /// of another tree, or the same node twice is undefined behavior. Under
    /// `debug_assertions` an O(height) ancestry walk catches the common
    /// misuses.
    pub unsafe fn remove_node(&mut self, node: NonNull<Node<T>>) -> NodeHandle<T> {
        debug_assert!(
            self.is_attached(node),
            "remove_node called with a node that is not attached to this tree",
        );

        let n = node.as_ptr();
        match ((*n).left.0, (*n).right.0) {
            (Some(left), Some(right)) => {
                // In-order successor: leftmost of the right subtree. By
                // construction it has no left child.
                let mut succ = right;
                while let Some(l) = (*succ.as_ptr()).left.0 {
                    succ = l;
                }

                if succ != right {
                    // Unlink the successor from its parent; its right
                    // subtree takes its place there.
                    let succ_parent = (*succ.as_ptr())
                        .parent
                        .0
                        .expect("successor below the right child has a parent");
                    let succ_right = (*succ.as_ptr()).right.0;
                    (*succ_parent.as_ptr()).left = Link(succ_right);
                    if let Some(r) = succ_right {
                        (*r.as_ptr()).parent = Link(Some(succ_parent));
                    }
                    // The successor adopts the removed node's right subtree.
                    (*succ.as_ptr()).right = Link(Some(right));
                    (*right.as_ptr()).parent = Link(Some(succ));
                }

                // The successor adopts the removed node's left subtree and
                // takes over its slot.
                (*succ.as_ptr()).left = Link(Some(left));
                (*left.as_ptr()).parent = Link(Some(succ));
                let parent = (*n).parent;
                (*succ.as_ptr()).parent = parent;
                self.replace_child(parent, node, Some(succ));
            }
            (only_child, None) | (None, only_child) => {
                // At most one child: splice it straight into our slot.
                if let Some(child) = only_child {
                    (*child.as_ptr()).parent = (*n).parent;
                }
                self.replace_child((*n).parent, node, only_child);
            }
        }

        (*n).left = Link::none();
        (*n).right = Link::none();
        (*n).parent = Link::none();
        self.len -= 1;

        if cfg!(debug_assertions) {
            if let Some(root) = self.root.0 {
                debug_assert!((*root.as_ptr()).parent.0.is_none());
            }
        }

        NodeHandle::from_raw(node)
    }

    /// Tears the whole tree down, releasing every node back to the
    /// allocator. Payloads are dropped the ordinary way. Also what `Drop`
    /// runs.
    pub fn clear(&mut self) {
        self.clear_with(&mut ());
    }

    /// [`clear`](Bst::clear), passing every payload through the lifecycle
    /// capability's `deinit` hook, once per payload.
    pub fn clear_with<L: Lifecycle<T>>(&mut self, lifecycle: &mut L) {
        if let Some(root) = self.root.take().0 {
            // SAFETY: The root edge owned the node and `take` just severed
            // it from the tree, so the handle is the sole owner.
            let handle = unsafe { NodeHandle::from_raw(root) };
            node::destroy_with(handle, lifecycle, &mut self.alloc);
        }
        self.len = 0;
    }

    /// Whether walking parent links up from `node` ends at this tree's root.
    /// Debug-assertion support for [`remove_node`](Bst::remove_node).
    unsafe fn is_attached(&self, node: NonNull<Node<T>>) -> bool {
        let mut cur = node;
        while let Some(parent) = (*cur.as_ptr()).parent.0 {
            cur = parent;
        }
        self.root.0 == Some(cur)
    }

    /// Points the slot that held `old` (a child edge of `parent`, or the
    /// root when `parent` is absent) at `new` instead.
    unsafe fn replace_child(
        &mut self,
        parent: Link<T>,
        old: NonNull<Node<T>>,
        new: Option<NonNull<Node<T>>>,
    ) {
        match parent.0 {
            None => self.root = Link(new),
            Some(p) => {
                let p = p.as_ptr();
                if (*p).left.0 == Some(old) {
                    (*p).left = Link(new);
                } else {
                    debug_assert_eq!((*p).right.0, Some(old));
                    (*p).right = Link(new);
                }
            }
        }
    }
}

impl<T, C: Comparator<T>, A: NodeAllocator<T>> Bst<T, C, A> {
    /// Attaches an externally built node to the tree.
    ///
    /// On success the tree owns the node's structural relations until it is
    /// removed again. If a resident node compares equal, the handle comes
    /// back inside [`DuplicateKey`] with nothing attached and the tree
    /// unchanged.
    ///
    /// The node must be solitary (no children, no parent); handles from
    /// [`create_node`](Bst::create_node) or a childless [`node::create`]
    /// are. Its storage must come from an allocator this tree's own can
    /// release, since teardown releases every attached node.
    ///
    /// # Examples
    ///
    /// ```
    /// use arbor::tree::Bst;
    ///
    /// let mut tree = Bst::new();
    /// let node = tree.create_node(7).unwrap();
    /// tree.insert_node(node).unwrap();
    ///
    /// let rejected = tree.create_node(7).unwrap();
    /// let err = tree.insert_node(rejected).unwrap_err();
    /// assert_eq!(*err.into_node().payload(), 7);
    /// # assert_eq!(tree.len(), 1);
    /// ```
    pub fn insert_node(&mut self, node: NodeHandle<T>) -> Result<(), DuplicateKey<T>> {
        debug_assert!(
            node.node().left().is_none()
                && node.node().right().is_none()
                && node.node().parent().is_none(),
            "insert_node expects a solitary node",
        );

        let slot = match self.find_slot(node.payload()) {
            Ok(slot) => slot,
            Err(_resident) => return Err(DuplicateKey(node)),
        };
        let new = node.into_raw();
        // SAFETY: `new` is owned (the handle was just consumed) and `slot`
        // was located by the descent above while we have held `&mut self`.
        unsafe { self.attach(new, slot) };
        Ok(())
    }

    /// Builds a node for `payload` with the tree's allocator and attaches
    /// it. The descent happens before the allocation, so a duplicate payload
    /// costs no storage and either failure hands the payload back with the
    /// tree untouched.
    pub fn insert(&mut self, payload: T) -> Result<(), InsertError<T>> {
        let slot = match self.find_slot(&payload) {
            Ok(slot) => slot,
            Err(_resident) => return Err(InsertError::Duplicate(payload)),
        };
        let new = match node::create(None, None, payload, &mut self.alloc) {
            Ok(handle) => handle.into_raw(),
            Err(err) => return Err(InsertError::AllocationFailed(err.into_payload())),
        };
        // SAFETY: `new` is owned and solitary; the slot is still current
        // because `&mut self` has been held since the descent.
        unsafe { self.attach(new, slot) };
        Ok(())
    }

    /// The resident payload comparing equal to `probe` under the tree's
    /// comparator, if any.
    pub fn find(&self, probe: &T) -> Option<&T> {
        let cmp = &self.cmp;
        self.search_by(|resident| cmp.cmp(probe, resident))
            .map(Node::payload)
    }

    /// Removes the node comparing equal to `probe`, if any, releases its
    /// storage back to the tree's allocator, and returns the payload.
    pub fn remove(&mut self, probe: &T) -> Option<T> {
        let cmp = &self.cmp;
        let found = self.locate_by(|resident| cmp.cmp(probe, resident))?;
        // SAFETY: `found` was located in this tree just now and no
        // structural mutation has happened since.
        let handle = unsafe { self.remove_node(found) };
        // SAFETY: Every attached node's storage came from an allocator
        // compatible with the tree's own (see `insert_node`).
        let node = unsafe { self.alloc.release(handle) };
        Some(node.into_payload())
    }

    /// Descends from the root looking for `payload`'s slot. `Err` carries
    /// the resident node comparing equal.
    fn find_slot(&self, payload: &T) -> Result<Slot<T>, NonNull<Node<T>>> {
        let mut cur = match self.root.0 {
            Some(ptr) => ptr,
            None => return Ok(Slot::Root),
        };
        loop {
            // SAFETY: `cur` is attached to this live tree.
            let resident = unsafe { &*cur.as_ptr() };
            match self.cmp.cmp(payload, &resident.payload) {
                Ordering::Less => match resident.left.0 {
                    Some(left) => cur = left,
                    None => return Ok(Slot::LeftOf(cur)),
                },
                Ordering::Equal => return Err(cur),
                Ordering::Greater => match resident.right.0 {
                    Some(right) => cur = right,
                    None => return Ok(Slot::RightOf(cur)),
                },
            }
        }
    }

    /// Wires an owned solitary node into `slot`.
    ///
    /// # Safety
    ///
    /// `new` must be an owned, live node and `slot` must still describe an
    /// empty slot of this tree.
    unsafe fn attach(&mut self, new: NonNull<Node<T>>, slot: Slot<T>) {
        let n = new.as_ptr();
        (*n).left = Link::none();
        (*n).right = Link::none();
        match slot {
            Slot::Root => {
                (*n).parent = Link::none();
                self.root = Link(Some(new));
            }
            Slot::LeftOf(parent) => {
                // A left child compares strictly less than its parent.
                debug_assert_eq!(
                    self.cmp.cmp(&(*n).payload, &(*parent.as_ptr()).payload),
                    Ordering::Less,
                );
                (*n).parent = Link(Some(parent));
                (*parent.as_ptr()).left = Link(Some(new));
            }
            Slot::RightOf(parent) => {
                // A right child compares strictly greater than its parent.
                debug_assert_eq!(
                    self.cmp.cmp(&(*parent.as_ptr()).payload, &(*n).payload),
                    Ordering::Less,
                );
                (*n).parent = Link(Some(parent));
                (*parent.as_ptr()).right = Link(Some(new));
            }
        }
        self.len += 1;
    }
}

impl<T, C, A: NodeAllocator<T>> Drop for Bst<T, C, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: fmt::Debug, C, A: NodeAllocator<T>> fmt::Debug for Bst<T, C, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bst")
            .field("len", &self.len)
            .field("root", &self.root())
            .finish()
    }
}
