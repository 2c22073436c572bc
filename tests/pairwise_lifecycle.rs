// tests/pairwise_lifecycle.rs
// Buffer release accounting across every aliasing partition of x, y and z.

use pairbench::{
    Aliasing, BufferId, BufferPool, OpBenchmark, Order, PairwiseBenchmark, PairwiseOp, Shape,
    TensorHandle,
};

fn shape() -> Shape {
    Shape::new(vec![4, 4])
}

fn alloc(pool: &mut BufferPool) -> TensorHandle {
    pool.filled(shape(), Order::C, 0).unwrap()
}

/// Builds an instance for `partition`, drops every external handle, and
/// returns the instance plus the distinct buffer ids it should own.
fn build(pool: &mut BufferPool, partition: Aliasing) -> (PairwiseBenchmark, Vec<BufferId>) {
    let a = alloc(pool);
    let (x, y, z) = match partition {
        Aliasing::Distinct => {
            let b = alloc(pool);
            let c = alloc(pool);
            (a, b, c)
        }
        Aliasing::AllShared => (a.clone(), a.clone(), a),
        Aliasing::FirstIsResult => {
            let b = alloc(pool);
            (a.clone(), b, a)
        }
        Aliasing::SecondIsResult => {
            let b = alloc(pool);
            (a, b.clone(), b)
        }
        Aliasing::SharedOperands => {
            let c = alloc(pool);
            (a.clone(), a, c)
        }
    };

    let mut expected = vec![x.buffer_id(), y.buffer_id(), z.buffer_id()];
    expected.sort();
    expected.dedup();

    let bench = PairwiseBenchmark::new(PairwiseOp::Add, "lifecycle", x, y, Some(z)).unwrap();
    assert_eq!(bench.aliasing(), Some(partition));
    (bench, expected)
}

const PARTITIONS: [Aliasing; 5] = [
    Aliasing::Distinct,
    Aliasing::AllShared,
    Aliasing::FirstIsResult,
    Aliasing::SecondIsResult,
    Aliasing::SharedOperands,
];

#[test]
fn test_every_partition_releases_each_buffer_exactly_once() {
    for partition in PARTITIONS {
        let mut pool = BufferPool::new();
        let (bench, expected) = build(&mut pool, partition);

        let mut owned = bench.owned_buffers();
        owned.sort();
        assert_eq!(owned, expected, "{:?}", partition);

        // Nothing released while the instance holds its roles
        assert!(pool.release_log().released().is_empty(), "{:?}", partition);
        assert_eq!(pool.live(), expected.len());

        drop(bench);

        let counts = pool.release_log().release_counts();
        assert_eq!(counts.len(), expected.len(), "{:?}", partition);
        for id in &expected {
            assert_eq!(counts.get(id), Some(&1), "{:?} buffer {}", partition, id);
        }
        assert_eq!(pool.live(), 0);
    }
}

#[test]
fn test_shared_operands_partition_releases_result_buffer() {
    let mut pool = BufferPool::new();
    let (bench, _) = build(&mut pool, Aliasing::SharedOperands);
    let z_id = bench.z().unwrap().buffer_id();

    drop(bench);

    assert!(pool.release_log().is_released(z_id));
    assert_eq!(pool.live(), 0);
}

#[test]
fn test_prototype_releases_nothing() {
    let pool = BufferPool::new();
    let proto = PairwiseBenchmark::prototype(PairwiseOp::Multiply, "proto");
    assert!(proto.owned_buffers().is_empty());
    drop(proto);
    drop(PairwiseBenchmark::default());
    assert!(pool.release_log().released().is_empty());
}

#[test]
fn test_clone_keeps_buffers_alive_after_original_drops() {
    for partition in PARTITIONS {
        let mut pool = BufferPool::new();
        let (bench, expected) = build(&mut pool, partition);
        let clone = bench.clone_op();

        drop(bench);
        assert!(pool.release_log().released().is_empty(), "{:?}", partition);

        // The clone still runs against live buffers
        clone.execute_once().unwrap();

        drop(clone);
        let counts = pool.release_log().release_counts();
        assert_eq!(counts.len(), expected.len());
        assert!(counts.values().all(|c| *c == 1));
    }
}

#[test]
fn test_prototype_dropped_before_instances() {
    let mut pool = BufferPool::new();
    let proto = PairwiseBenchmark::prototype(PairwiseOp::Subtract, "fan-out");

    let x = alloc(&mut pool);
    let y = alloc(&mut pool);
    let first = proto.with_operands(x.clone(), y.clone(), None).unwrap();
    let second = proto.with_operands(x, y, None).unwrap();
    drop(proto);

    first.execute_once().unwrap();
    drop(first);
    assert!(pool.release_log().released().is_empty());

    second.execute_once().unwrap();
    drop(second);
    assert_eq!(pool.release_log().released().len(), 2);
    assert_eq!(pool.live(), 0);
}

#[test]
fn test_external_handle_outlives_benchmark() {
    let mut pool = BufferPool::new();
    let x = alloc(&mut pool);
    let y = alloc(&mut pool);
    let bench = PairwiseBenchmark::new(PairwiseOp::Add, "keep", x.clone(), y, None).unwrap();

    drop(bench);

    // y had no other owner; x is still held here
    assert_eq!(pool.release_log().released().len(), 1);
    assert!(!pool.release_log().is_released(x.buffer_id()));
    assert_eq!(x.read().unwrap().len(), 16);
}
