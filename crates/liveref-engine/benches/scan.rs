use criterion::{criterion_group, criterion_main, Criterion};

use liveref_engine::{LiveObject, LiveReferences, SkipObjects};
use liveref_heap::{ArrayObject, Class, Heap, Instance};

/// A binary-ish tree of `n` nodes under one static array, returning the
/// deepest node.
fn build_tree(heap: &Heap, n: usize) -> LiveObject {
    let class = Class::builder("Node")
        .reference("left")
        .reference("right")
        .build()
        .unwrap();
    let nodes: Vec<LiveObject> = (0..n).map(|_| Instance::alloc(&class)).collect();
    for i in 1..n {
        let parent = nodes[(i - 1) / 2].downcast_ref::<Instance>().unwrap();
        let field = if i % 2 == 1 { "left" } else { "right" };
        parent.set(field, nodes[i].clone()).unwrap();
    }
    heap.set_static("Bench", "tree", ArrayObject::alloc("Node", vec![nodes[0].clone()]));
    nodes[n - 1].clone()
}

fn bench_find_deepest_10k(c: &mut Criterion) {
    let heap = Heap::new();
    let deepest = build_tree(&heap, 10_000);
    let scanner = LiveReferences::new(&heap);

    c.bench_function("find_deepest_10k_nodes", |b| {
        b.iter(|| {
            let result = scanner.from_roots(&[deepest.clone()]).unwrap();
            assert_eq!(result.len(), 1);
        });
    });
}

fn bench_exhaust_10k(c: &mut Criterion) {
    let heap = Heap::new();
    build_tree(&heap, 10_000);
    let missing = Instance::alloc(&Class::builder("Stray").build().unwrap());
    let scanner = LiveReferences::new(&heap);

    c.bench_function("exhaust_10k_nodes", |b| {
        b.iter(|| {
            let result = scanner.from_roots(&[missing.clone()]).unwrap();
            assert!(result.is_empty());
        });
    });
}

fn bench_census_10k(c: &mut Criterion) {
    let heap = Heap::new();
    build_tree(&heap, 10_000);
    let Some(tree) = heap.get_static("Bench", "tree") else {
        panic!("tree root missing");
    };
    let scanner = LiveReferences::new(&heap);
    let skip = SkipObjects::new();

    c.bench_function("census_10k_nodes", |b| {
        b.iter(|| {
            let census = scanner.census(&[tree.clone()], Some(&skip)).unwrap();
            assert_eq!(census.total_objects, 10_001);
        });
    });
}

criterion_group!(benches, bench_find_deepest_10k, bench_exhaust_10k, bench_census_10k);
criterion_main!(benches);
