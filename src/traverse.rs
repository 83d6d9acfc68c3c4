//! The traversal engine: structural pre/in/post-order walks, plus
//! breadth-first and depth-first walks that delegate their bookkeeping to
//! external queue/stack collaborators.
//!
//! Traversal only needs the node shape, so it works against any topology,
//! search-ordered or not. Handlers receive payloads; there is no early-abort
//! signal, a walk always runs to completion or to a collaborator failure.
//!
//! [`breadth_first`] and [`depth_first`] create a transient collaborator
//! scoped to the call and release it on every exit path. A collaborator
//! whose `enqueue`/`push` fails aborts the walk and the failure is
//! propagated; the engine never continues in an inconsistent state.
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
//! let mut pre = Vec::new();
//! traverse::traverse(tree.root(), Order::Pre, &mut |&k| pre.push(k));
//! assert_eq!(pre, [5, 3, 1, 4, 8, 7, 9]);
//!
//! let mut level = Vec::new();
//! traverse::breadth_first(tree.root(), |&k| level.push(k)).unwrap();
//! assert_eq!(level, [5, 3, 8, 1, 4, 7, 9]);
//! ```

use std::collections::VecDeque;

use crate::caps::AllocError;
use crate::node::Node;

/// Which single position of the node-left-right recursion fires the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Node, then left subtree, then right subtree.
    Pre,
    /// Left subtree, then node, then right subtree. Over a search tree this
    /// yields the comparator's strictly increasing sequence.
    In,
    /// Left subtree, then right subtree, then node.
    Post,
}

/// Recursively walks the subtree at `root`, invoking `visit` on each payload
/// at the position `order` selects. Absent subtrees are no-ops.
///
/// Call-stack depth is proportional to the tree's height; against adversarial
/// near-linear shapes prefer [`depth_first`], which walks pre-order on an
/// explicit collaborator instead.
pub fn traverse<T, F>(root: Option<&Node<T>>, order: Order, visit: &mut F)
where
    F: FnMut(&T),
{
    let node = match root {
        Some(node) => node,
        None => return,
    };
    if order == Order::Pre {
        visit(node.payload());
    }
    traverse(node.left(), order, visit);
    if order == Order::In {
        visit(node.payload());
    }
    traverse(node.right(), order, visit);
    if order == Order::Post {
        visit(node.payload());
    }
}

/// The FIFO collaborator contract for [`breadth_first_with`].
///
/// Growth and allocation policy are the collaborator's own business; the
/// engine only sees these three operations. A failed [`enqueue`] aborts the
/// walk that issued it.
///
/// [`enqueue`]: Fifo::enqueue
pub trait Fifo<I> {
    /// Appends `item` at the back.
    fn enqueue(&mut self, item: I) -> Result<(), AllocError>;
    /// Removes and returns the front item, or `None` when empty.
    fn dequeue(&mut self) -> Option<I>;
    /// Whether the queue holds no items.
    fn is_empty(&self) -> bool;
}

impl<I> Fifo<I> for VecDeque<I> {
    fn enqueue(&mut self, item: I) -> Result<(), AllocError> {
        self.push_back(item);
        Ok(())
    }

    fn dequeue(&mut self) -> Option<I> {
        self.pop_front()
    }

    fn is_empty(&self) -> bool {
        VecDeque::is_empty(self)
    }
}

/// The LIFO collaborator contract for [`depth_first_with`]; mirrors [`Fifo`].
pub trait Lifo<I> {
    /// Pushes `item` on top.
    fn push(&mut self, item: I) -> Result<(), AllocError>;
    /// Removes and returns the top item, or `None` when empty.
    fn pop(&mut self) -> Option<I>;
    /// Whether the stack holds no items.
    fn is_empty(&self) -> bool;
}

impl<I> Lifo<I> for Vec<I> {
    fn push(&mut self, item: I) -> Result<(), AllocError> {
        Vec::push(self, item);
        Ok(())
    }

    fn pop(&mut self) -> Option<I> {
        Vec::pop(self)
    }

    fn is_empty(&self) -> bool {
        Vec::is_empty(self)
    }
}

/// Level-by-level walk of the subtree at `root` using a [`VecDeque`] as the
/// queue collaborator (whose `enqueue` never fails).
pub fn breadth_first<T, F>(root: Option<&Node<T>>, visit: F) -> Result<(), AllocError>
where
    F: FnMut(&T),
{
    breadth_first_with::<_, VecDeque<_>, _>(root, visit)
}

/// Level-by-level walk with a caller-chosen queue collaborator.
///
/// A transient `Q` is created for this call and dropped on every exit path.
/// The root is seeded first; each dequeued node is visited and its present
/// children are enqueued left-then-right. A failed enqueue aborts the walk
/// and surfaces the collaborator's failure.
pub fn breadth_first_with<'a, T, Q, F>(root: Option<&'a Node<T>>, mut visit: F) -> Result<(), AllocError>
where
    Q: Fifo<&'a Node<T>> + Default,
    F: FnMut(&T),
{
    let root = match root {
        Some(node) => node,
        None => return Ok(()),
    };
    let mut queue = Q::default();
    queue.enqueue(root)?;
    while let Some(node) = queue.dequeue() {
        visit(node.payload());
        if let Some(left) = node.left() {
            queue.enqueue(left)?;
        }
        if let Some(right) = node.right() {
            queue.enqueue(right)?;
        }
    }
    Ok(())
}

/// Pre-order walk of the subtree at `root` using a [`Vec`] as the stack
/// collaborator (whose `push` never fails).
pub fn depth_first<T, F>(root: Option<&Node<T>>, visit: F) -> Result<(), AllocError>
where
    F: FnMut(&T),
{
    depth_first_with::<_, Vec<_>, _>(root, visit)
}

/// Pre-order walk with a caller-chosen stack collaborator.
///
/// Children are pushed right-then-left so the left subtree is processed
/// first (the stack inverts the order). Otherwise behaves exactly like
/// [`breadth_first_with`], including the abort on a failed push.
pub fn depth_first_with<'a, T, S, F>(root: Option<&'a Node<T>>, mut visit: F) -> Result<(), AllocError>
where
    S: Lifo<&'a Node<T>> + Default,
    F: FnMut(&T),
{
    let root = match root {
        Some(node) => node,
        None => return Ok(()),
    };
    let mut stack = S::default();
    stack.push(root)?;
    while let Some(node) = stack.pop() {
        visit(node.payload());
        if let Some(right) = node.right() {
            stack.push(right)?;
        }
        if let Some(left) = node.left() {
            stack.push(left)?;
        }
    }
    Ok(())
}
