//! Model-based property tests of the public API: a `Bst` against a
//! `HashSet`, plus structural properties checked after random workloads.

use std::collections::HashSet;

use quickcheck::{Arbitrary, Gen};

use arbor::node;
use arbor::traverse::{self, Order};
use arbor::tree::{Bst, InsertError};

/// An enum for the various kinds of "things" to do to
/// binary search trees in a quicktest.
#[derive(Copy, Clone, Debug)]
enum Op<K> {
    Insert(K),
    Remove(K),
    Find(K),
}

impl<K> Arbitrary for Op<K>
where
    K: Arbitrary,
{
    fn arbitrary(g: &mut Gen) -> Self {
        match g.choose(&[0, 1, 2]).unwrap() {
            0 => Op::Insert(K::arbitrary(g)),
            1 => Op::Remove(K::arbitrary(g)),
            2 => Op::Find(K::arbitrary(g)),
            _ => unreachable!(),
        }
    }
}

/// Applies a set of operations to a tree and a hash set. This way we can
/// ensure that after a random smattering of inserts and removes we have the
/// same set of keys in both.
fn do_ops(ops: &[Op<i8>], bst: &mut Bst<i8>, set: &mut HashSet<i8>) -> bool {
    for op in ops {
        match *op {
            Op::Insert(k) => {
                let was_new = set.insert(k);
                match bst.insert(k) {
                    Ok(()) if was_new => {}
                    Err(InsertError::Duplicate(back)) if !was_new && back == k => {}
                    _ => return false,
                }
            }
            Op::Remove(k) => {
                let expected = if set.remove(&k) { Some(k) } else { None };
                if bst.remove(&k) != expected {
                    return false;
                }
            }
            Op::Find(k) => {
                if bst.find(&k).copied() != set.get(&k).copied() {
                    return false;
                }
            }
        }
    }
    true
}

quickcheck::quickcheck! {
    fn fuzz_multiple_operations_i8(ops: Vec<Op<i8>>) -> bool {
        let mut tree = Bst::new();
        let mut set = HashSet::new();

        do_ops(&ops, &mut tree, &mut set)
            && set.iter().all(|k| tree.find(k) == Some(k))
            && tree.len() == set.len()
    }
}

quickcheck::quickcheck! {
    fn in_order_is_strictly_increasing(ops: Vec<Op<i8>>) -> bool {
        let mut tree = Bst::new();
        let mut set = HashSet::new();
        do_ops(&ops, &mut tree, &mut set);

        let mut keys = Vec::new();
        traverse::traverse(tree.root(), Order::In, &mut |&k| keys.push(k));
        keys.windows(2).all(|w| w[0] < w[1])
    }
}

quickcheck::quickcheck! {
    fn parents_are_consistent(ops: Vec<Op<i8>>) -> bool {
        fn consistent(node: &node::Node<i8>) -> bool {
            let left_ok = node.left().map_or(true, |l| {
                l.parent().map_or(false, |p| std::ptr::eq(p, node)) && consistent(l)
            });
            let right_ok = node.right().map_or(true, |r| {
                r.parent().map_or(false, |p| std::ptr::eq(p, node)) && consistent(r)
            });
            left_ok && right_ok
        }

        let mut tree = Bst::new();
        let mut set = HashSet::new();
        do_ops(&ops, &mut tree, &mut set);

        match tree.root() {
            None => tree.len() == 0,
            Some(root) => root.parent().is_none() && consistent(root)
        }
    }
}

quickcheck::quickcheck! {
    fn len_matches_a_full_traversal(ops: Vec<Op<i8>>) -> bool {
        let mut tree = Bst::new();
        let mut set = HashSet::new();
        do_ops(&ops, &mut tree, &mut set);

        node::size(tree.root()) == tree.len()
    }
}

quickcheck::quickcheck! {
    fn contains(xs: Vec<i8>) -> bool {
        let mut tree = Bst::new();
        for x in &xs {
            let _ = tree.insert(*x);
        }

        xs.iter().all(|x| tree.find(x) == Some(x))
    }
}

quickcheck::quickcheck! {
    fn contains_not(xs: Vec<i8>, nots: Vec<i8>) -> bool {
        let mut tree = Bst::new();
        for x in &xs {
            let _ = tree.insert(*x);
        }
        let added: HashSet<_> = xs.into_iter().collect();
        let nots: HashSet<_> = nots.into_iter().collect();
        let mut nots = nots.difference(&added);

        nots.all(|x| tree.find(x) == None)
    }
}

quickcheck::quickcheck! {
    fn with_deletions(xs: Vec<i8>, deletes: Vec<i8>) -> bool {
        let mut tree = Bst::new();
        for x in &xs {
            let _ = tree.insert(*x);
        }
        for delete in &deletes {
            tree.remove(delete);
        }

        let deleted: HashSet<_> = deletes.iter().copied().collect();
        let still_present: Vec<_> = xs.iter().filter(|x| !deleted.contains(x)).collect();

        deletes.iter().all(|x| tree.find(x).is_none())
            && still_present.iter().all(|x| tree.find(x).is_some())
    }
}
