//! The shape-agnostic binary tree engine: the node relation itself plus
//! creation, teardown, and the size/height/balance measurements.
//!
//! A [`Node`] carries two owning edges (`left`, `right`) and one non-owning
//! back-reference (`parent`). The parent link exists purely for navigation;
//! it is never walked during teardown and never counted toward ownership.
//! Nothing at this layer imposes an ordering (that is the search-tree
//! layer's job), so these operations work on any topology.
//!
//! Teardown and the measurements run on an explicit work stack rather than
//! the call stack: a degenerate near-linear chain of 10 000 nodes must not
//! crash them.
//!
//! # Examples
//!
//! ```
//! use arbor::caps::Heap;
//! use arbor::node;
//!
//! let mut alloc = Heap;
//! let left = node::create(None, None, 'b', &mut alloc).unwrap();
//! let right = node::create(None, None, 'c', &mut alloc).unwrap();
//! let root = node::create(Some(left), Some(right), 'a', &mut alloc).unwrap();
//!
//! assert_eq!(node::size(Some(root.node())), 3);
//! assert_eq!(node::height(Some(root.node())), 1);
//! assert_eq!(node::balance_factor(root.node()), 0);
//!
//! node::destroy(root, &mut alloc);
//! ```

use std::fmt;
use std::ptr::NonNull;

use crate::caps::{InitError, Lifecycle, NodeAllocator};

/// A possibly-absent edge to a node. Whether the edge owns its target is a
/// convention of the field it sits in: `left`/`right` own, `parent` does not.
pub(crate) struct Link<T>(pub(crate) Option<NonNull<Node<T>>>);

// Manual impls so `Link` is `Copy` regardless of `T`.
impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        Self(self.0)
    }
}
impl<T> Copy for Link<T> {}

impl<T> Link<T> {
    pub(crate) fn none() -> Self {
        Link(None)
    }

    pub(crate) fn take(&mut self) -> Self {
        Link(self.0.take())
    }
}

/// One node of a binary tree.
///
/// The payload is embedded in the node, giving one allocation per logical
/// element; the structural relations are independent of the payload's layout.
pub struct Node<T> {
    pub(crate) left: Link<T>,
    pub(crate) right: Link<T>,
    pub(crate) parent: Link<T>,
    pub(crate) payload: T,
}

impl<T> Node<T> {
    /// A node with no relations at all.
    pub(crate) fn solitary(payload: T) -> Self {
        Node {
            left: Link::none(),
            right: Link::none(),
            parent: Link::none(),
            payload,
        }
    }

    /// The payload carried by this node.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Mutable access to the payload.
    ///
    /// Mutating a payload that is attached to a search tree in a way that
    /// changes how it compares breaks the order invariant; detach it first.
    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    /// Consumes the node, returning its payload. Any children still wired to
    /// the node are leaked; tear subtrees down with [`destroy`] instead.
    pub fn into_payload(self) -> T {
        self.payload
    }

    /// The left child, if present.
    pub fn left(&self) -> Option<&Node<T>> {
        // SAFETY: An owning edge of a live node always points at a live
        // node, and the shared borrow of `self` keeps the subtree alive.
        unsafe { self.left.0.as_ref().map(|ptr| ptr.as_ref()) }
    }

    /// The right child, if present.
    pub fn right(&self) -> Option<&Node<T>> {
        // SAFETY: As in `left`.
        unsafe { self.right.0.as_ref().map(|ptr| ptr.as_ref()) }
    }

    /// The parent, if one has been established. [`create`] leaves the parent
    /// of its children absent; only the search-tree layer maintains it.
    pub fn parent(&self) -> Option<&Node<T>> {
        // SAFETY: A parent link of an attached node points at a live node
        // further up the same tree, which the shared borrow keeps alive.
        unsafe { self.parent.0.as_ref().map(|ptr| ptr.as_ref()) }
    }
}

impl<T: fmt::Debug> fmt::Debug for Node<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("payload", &self.payload)
            .field("left", &self.left())
            .field("right", &self.right())
            .finish()
    }
}

/// An owning handle to an allocated node that is not attached to any tree.
///
/// The handle owns the node and everything wired below it. It deliberately
/// has no `Drop`: storage must go back to the allocator that produced it, so
/// dropping a handle without [`destroy`]ing it or releasing it leaks.
pub struct NodeHandle<T>(NonNull<Node<T>>);

impl<T> NodeHandle<T> {
    /// Builds a handle from a raw node pointer.
    ///
    /// # Safety
    ///
    /// `ptr` must point at a live, detached node that nothing else owns.
    /// Typically only allocator implementations call this.
    pub unsafe fn from_raw(ptr: NonNull<Node<T>>) -> Self {
        NodeHandle(ptr)
    }

    /// Consumes the handle, returning the raw node pointer and with it the
    /// responsibility for the node's storage.
    pub fn into_raw(self) -> NonNull<Node<T>> {
        self.0
    }

    pub(crate) fn as_ptr(&self) -> NonNull<Node<T>> {
        self.0
    }

    /// A view of the node behind the handle.
    pub fn node(&self) -> &Node<T> {
        // SAFETY: The handle owns the node, which stays live until it is
        // released back to its allocator.
        unsafe { self.0.as_ref() }
    }

    /// The handle's payload.
    pub fn payload(&self) -> &T {
        self.node().payload()
    }

    /// Mutable access to the handle's payload.
    pub fn payload_mut(&mut self) -> &mut T {
        // SAFETY: The handle owns the node and `&mut self` makes this the
        // only live access to it.
        unsafe { &mut self.0.as_mut().payload }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeHandle").field(self.node()).finish()
    }
}

/// Creating a node failed; everything the caller handed in comes back inside
/// the error, so no partial state is ever observable.
pub enum CreateError<T> {
    /// The allocation capability could not produce storage.
    Alloc {
        /// The payload, untouched.
        payload: T,
        /// The left child the node would have adopted.
        left: Option<NodeHandle<T>>,
        /// The right child the node would have adopted.
        right: Option<NodeHandle<T>>,
    },
    /// The lifecycle `init` hook refused the payload; the node was torn back
    /// down. Only [`create_with`] produces this variant.
    Init {
        /// The payload, as `init` left it.
        payload: T,
        /// The left child the node would have adopted.
        left: Option<NodeHandle<T>>,
        /// The right child the node would have adopted.
        right: Option<NodeHandle<T>>,
        /// The hook's error.
        source: InitError,
    },
}

impl<T> CreateError<T> {
    /// Hands back the payload, dropping any returned children's handles
    /// (which leaks them; reclaim the children first if they matter).
    pub fn into_payload(self) -> T {
        match self {
            CreateError::Alloc { payload, .. } | CreateError::Init { payload, .. } => payload,
        }
    }
}

impl<T> fmt::Display for CreateError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateError::Alloc { .. } => f.write_str("node storage could not be allocated"),
            CreateError::Init { .. } => f.write_str("payload initialization hook failed"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CreateError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreateError::Alloc { payload, .. } => {
                f.debug_struct("Alloc").field("payload", payload).finish()
            }
            CreateError::Init { payload, source, .. } => f
                .debug_struct("Init")
                .field("payload", payload)
                .field("source", source)
                .finish(),
        }
    }
}

impl<T: fmt::Debug> std::error::Error for CreateError<T> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CreateError::Alloc { .. } => None,
            CreateError::Init { source, .. } => Some(source),
        }
    }
}

/// Builds one node wired to the given (possibly absent) children.
///
/// The children keep an absent parent link: establishing parent links is the
/// responsibility of the search-tree layer, and plain binary trees navigate
/// downward only. On allocation failure the payload and both children are
/// handed back inside the error.
pub fn create<T, A>(
    left: Option<NodeHandle<T>>,
    right: Option<NodeHandle<T>>,
    payload: T,
    alloc: &mut A,
) -> Result<NodeHandle<T>, CreateError<T>>
where
    A: NodeAllocator<T>,
{
    // The node goes into storage solitary; the children are wired afterward
    // so that a failed allocation cannot swallow their ownership.
    match alloc.allocate(Node::solitary(payload)) {
        Ok(handle) => {
            let ptr = handle.as_ptr().as_ptr();
            // SAFETY: `handle` owns the freshly allocated node and nothing
            // else references it yet.
            unsafe {
                (*ptr).left = Link(left.map(NodeHandle::into_raw));
                (*ptr).right = Link(right.map(NodeHandle::into_raw));
            }
            Ok(handle)
        }
        Err(node) => Err(CreateError::Alloc {
            payload: node.into_payload(),
            left,
            right,
        }),
    }
}

/// [`create`], with the payload additionally passed through a lifecycle
/// capability's `init` hook once it sits in node storage.
///
/// If the hook refuses, the node is released again and the payload and
/// children come back inside the error: the failure is atomic.
pub fn create_with<T, L, A>(
    left: Option<NodeHandle<T>>,
    right: Option<NodeHandle<T>>,
    payload: T,
    lifecycle: &mut L,
    alloc: &mut A,
) -> Result<NodeHandle<T>, CreateError<T>>
where
    L: Lifecycle<T>,
    A: NodeAllocator<T>,
{
    let mut handle = create(left, right, payload, alloc)?;
    match lifecycle.init(handle.payload_mut()) {
        Ok(()) => Ok(handle),
        Err(source) => {
            let ptr = handle.as_ptr().as_ptr();
            // SAFETY: `handle` owns the node; detaching the children before
            // releasing it keeps their ownership with us.
            let (left, right) = unsafe {
                (
                    (*ptr).left.take().0.map(|p| NodeHandle::from_raw(p)),
                    (*ptr).right.take().0.map(|p| NodeHandle::from_raw(p)),
                )
            };
            // SAFETY: The handle came from `alloc` inside `create`.
            let node = unsafe { alloc.release(handle) };
            Err(CreateError::Init {
                payload: node.into_payload(),
                left,
                right,
                source,
            })
        }
    }
}

/// Tears down the whole subtree behind `root`, releasing every node back to
/// `alloc`. Payloads are dropped the ordinary way.
///
/// Runs on an explicit work stack, so arbitrarily degenerate shapes are fine.
pub fn destroy<T, A>(root: NodeHandle<T>, alloc: &mut A)
where
    A: NodeAllocator<T>,
{
    destroy_with(root, &mut (), alloc)
}

/// [`destroy`], additionally passing every payload through the lifecycle
/// capability's `deinit` hook, exactly once per payload, in post-order
/// (children before their parent).
pub fn destroy_with<T, L, A>(root: NodeHandle<T>, lifecycle: &mut L, alloc: &mut A)
where
    L: Lifecycle<T>,
    A: NodeAllocator<T>,
{
    // Two-pass explicit-stack walk. The first pass records nodes in
    // node-right-left order; replaying it backwards yields exactly the
    // post-order the recursive formulation would produce.
    let mut walk = vec![root.into_raw()];
    let mut order = Vec::new();
    while let Some(ptr) = walk.pop() {
        // SAFETY: Every pointer on `walk` is a node we own and have not
        // released yet; the tree is a genuine tree (no shared subtrees), so
        // each node is visited once.
        unsafe {
            if let Some(left) = (*ptr.as_ptr()).left.0 {
                walk.push(left);
            }
            if let Some(right) = (*ptr.as_ptr()).right.0 {
                walk.push(right);
            }
        }
        order.push(ptr);
    }

    for ptr in order.into_iter().rev() {
        // SAFETY: `ptr` is owned and not yet released. Its children were
        // already released (post-order), so clearing the links before the
        // node travels by value keeps the returned `Node` free of dangling
        // edges.
        unsafe {
            (*ptr.as_ptr()).left = Link::none();
            (*ptr.as_ptr()).right = Link::none();
            (*ptr.as_ptr()).parent = Link::none();
            let node = alloc.release(NodeHandle::from_raw(ptr));
            lifecycle.deinit(node.into_payload());
        }
    }
}

/// Counts the nodes reachable from `root`. O(n); nothing caches this.
pub fn size<T>(root: Option<&Node<T>>) -> usize {
    let mut count = 0;
    let mut pending: Vec<&Node<T>> = root.into_iter().collect();
    while let Some(node) = pending.pop() {
        count += 1;
        if let Some(left) = node.left() {
            pending.push(left);
        }
        if let Some(right) = node.right() {
            pending.push(right);
        }
    }
    count
}

/// The height of the subtree at `root`: an absent tree is -1, a single node
/// is 0, otherwise one more than the taller child.
pub fn height<T>(root: Option<&Node<T>>) -> isize {
    let root = match root {
        Some(node) => node,
        None => return -1,
    };
    let mut max = 0;
    let mut pending = vec![(root, 0isize)];
    while let Some((node, depth)) = pending.pop() {
        if depth > max {
            max = depth;
        }
        if let Some(left) = node.left() {
            pending.push((left, depth + 1));
        }
        if let Some(right) = node.right() {
            pending.push((right, depth + 1));
        }
    }
    max
}

/// `height(left) - height(right)` for `node`. Informational only: nothing in
/// this crate rebalances.
pub fn balance_factor<T>(node: &Node<T>) -> isize {
    height(node.left()) - height(node.right())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::Heap;

    fn leaf(payload: i32, alloc: &mut Heap) -> NodeHandle<i32> {
        create(None, None, payload, alloc).unwrap()
    }

    /// The nodes need not be in search order; this layer doesn't care.
    fn diamond(alloc: &mut Heap) -> NodeHandle<i32> {
        let ll = leaf(4, alloc);
        let left = create(Some(ll), None, 2, alloc).unwrap();
        let right = leaf(3, alloc);
        create(Some(left), Some(right), 1, alloc).unwrap()
    }

    #[test]
    fn create_wires_children_without_parent_links() {
        let mut alloc = Heap;
        let root = diamond(&mut alloc);

        let node = root.node();
        assert_eq!(*node.payload(), 1);
        assert_eq!(node.left().map(Node::payload), Some(&2));
        assert_eq!(node.right().map(Node::payload), Some(&3));
        assert!(node.left().unwrap().parent().is_none());
        assert!(node.right().unwrap().parent().is_none());

        destroy(root, &mut alloc);
    }

    #[test]
    fn measurements() {
        let mut alloc = Heap;
        let root = diamond(&mut alloc);

        assert_eq!(size(Some(root.node())), 4);
        assert_eq!(height(Some(root.node())), 2);
        assert_eq!(balance_factor(root.node()), 2 - 1);
        assert_eq!(balance_factor(root.node().left().unwrap()), 1);

        destroy(root, &mut alloc);
    }

    #[test]
    fn absent_tree_measurements() {
        assert_eq!(size::<i32>(None), 0);
        assert_eq!(height::<i32>(None), -1);
    }

    #[test]
    fn destroy_with_deinits_in_post_order() {
        struct Recorder(Vec<i32>);
        impl Lifecycle<i32> for Recorder {
            fn init(&mut self, _payload: &mut i32) -> Result<(), InitError> {
                Ok(())
            }
            fn deinit(&mut self, payload: i32) {
                self.0.push(payload);
            }
        }

        let mut alloc = Heap;
        let root = diamond(&mut alloc);

        let mut recorder = Recorder(Vec::new());
        destroy_with(root, &mut recorder, &mut alloc);
        // Post-order over 1(2(4,_),3): 4, 2, 3, 1.
        assert_eq!(recorder.0, [4, 2, 3, 1]);
    }

    #[test]
    fn create_with_runs_the_init_hook() {
        struct Doubler;
        impl Lifecycle<i32> for Doubler {
            fn init(&mut self, payload: &mut i32) -> Result<(), InitError> {
                *payload *= 2;
                Ok(())
            }
            fn deinit(&mut self, _payload: i32) {}
        }

        let mut alloc = Heap;
        let handle = create_with(None, None, 21, &mut Doubler, &mut alloc).unwrap();
        assert_eq!(*handle.payload(), 42);
        destroy(handle, &mut alloc);
    }

    #[test]
    fn failed_init_hands_everything_back() {
        struct Refuser;
        impl Lifecycle<i32> for Refuser {
            fn init(&mut self, _payload: &mut i32) -> Result<(), InitError> {
                Err(InitError)
            }
            fn deinit(&mut self, _payload: i32) {}
        }

        let mut alloc = Heap;
        let left = leaf(2, &mut alloc);
        match create_with(Some(left), None, 1, &mut Refuser, &mut alloc) {
            Err(CreateError::Init {
                payload,
                left: Some(left),
                right: None,
                source: InitError,
            }) => {
                assert_eq!(payload, 1);
                assert_eq!(*left.payload(), 2);
                destroy(left, &mut alloc);
            }
            other => panic!("expected init failure, got {:?}", other),
        }
    }

    #[test]
    fn destroy_survives_a_long_chain() {
        let mut alloc = Heap;
        let mut root = leaf(0, &mut alloc);
        for payload in 1..10_000 {
            root = create(Some(root), None, payload, &mut alloc).unwrap();
        }
        assert_eq!(height(Some(root.node())), 9_999);
        assert_eq!(size(Some(root.node())), 10_000);
        destroy(root, &mut alloc);
    }
}
