use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rand::seq::SliceRandom;
use rand::SeedableRng;

use arbor::traverse::{self, Order};
use arbor::tree::Bst;

/// Builds a tree of `2^num_levels - 1` keys inserted in shuffled order, so
/// the unbalanced tree stays reasonably bushy rather than degenerating into
/// a chain.
fn build_tree(num_levels: u32) -> (Bst<i32>, Vec<i32>) {
    let num_nodes = 2i32.pow(num_levels) - 1;
    let mut keys: Vec<i32> = (0..num_nodes).collect();
    let mut rng = rand::rngs::StdRng::seed_from_u64(u64::from(num_levels));
    keys.shuffle(&mut rng);

    let mut tree = Bst::new();
    for &key in &keys {
        tree.insert(key).unwrap();
    }
    (tree, keys)
}

/// Helper to bench an operation on a BST.
/// It creates a group for the given name and closure and runs tests for
/// various tree sizes before finishing the group. The closure gets the tree
/// and a key that is present in it.
fn bench_helper(c: &mut Criterion, name: &str, f: impl Fn(&mut Bst<i32>, i32)) {
    let mut group = c.benchmark_group(name);

    for num_levels in [3u32, 7, 11, 15] {
        let (mut tree, keys) = build_tree(num_levels);
        let probe = keys[keys.len() / 2];
        let id = BenchmarkId::from_parameter(tree.len());

        group.bench_function(id, |b| {
            b.iter(|| f(&mut tree, black_box(probe)));
        });
    }

    group.finish();
}

pub fn criterion_benchmark(c: &mut Criterion) {
    bench_helper(c, "find", |tree, key| {
        let _value = black_box(tree.find(&key));
    });
    bench_helper(c, "find-miss", |tree, key| {
        let _value = black_box(tree.find(&(key + 1_000_000)));
    });

    // Remove-then-reinsert leaves the tree the same size on every
    // iteration, so no per-iteration rebuild is needed.
    bench_helper(c, "remove-insert", |tree, key| {
        let payload = tree.remove(&key).unwrap();
        tree.insert(payload).unwrap();
    });
    bench_helper(c, "remove-miss", |tree, key| {
        let _value = black_box(tree.remove(&(key + 1_000_000)));
    });

    bench_helper(c, "in-order-traversal", |tree, _key| {
        let mut sum = 0i64;
        traverse::traverse(tree.root(), Order::In, &mut |&k| sum += i64::from(k));
        black_box(sum);
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
