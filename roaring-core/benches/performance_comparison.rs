use roaring::RoaringBitmap;
use roaring_core::container::ValueConsumer;
use roaring_core::Bitmap;

use criterion::measurement::Measurement;
use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkGroup, BenchmarkId, Criterion,
    Throughput,
};

/// A value distribution that settles into one container encoding per chunk
#[derive(Clone, Copy, Debug)]
enum Shape {
    Sparse,
    Dense,
    Runs,
}

const SHAPES: [Shape; 3] = [Shape::Sparse, Shape::Dense, Shape::Runs];
const SPAN: u32 = 1 << 20;

impl Shape {
    fn ranges(self) -> Vec<std::ops::Range<u32>> {
        match self {
            Shape::Sparse => (0..SPAN).step_by(97).map(|v| v..v + 1).collect(),
            Shape::Dense => (0..SPAN).step_by(3).map(|v| v..v + 1).collect(),
            Shape::Runs => (0..SPAN).step_by(4096).map(|v| v..v + 1500).collect(),
        }
    }

    fn ours(self) -> Bitmap {
        let mut bitmap = Bitmap::new();
        for range in self.ranges() {
            bitmap.add_range(range);
        }
        bitmap.run_optimize();
        bitmap
    }

    fn theirs(self) -> RoaringBitmap {
        let mut bitmap = RoaringBitmap::new();
        for range in self.ranges() {
            bitmap.insert_range(range);
        }
        bitmap
    }
}

fn compare<Prep1, Prep2, Bench1, Bench2, In1, In2, Out1, Out2, M>(
    group: &mut BenchmarkGroup<'_, M>,
    shape: Shape,
    mut prep1: Prep1,
    mut prep2: Prep2,
    mut bench1: Bench1,
    mut bench2: Bench2,
) where
    Prep1: FnMut() -> In1,
    Prep2: FnMut() -> In2,
    Bench1: FnMut(In1) -> Out1,
    Bench2: FnMut(In2) -> Out2,
    M: Measurement,
{
    let shape = format!("{shape:?}");
    group.bench_function(BenchmarkId::new("roaring-core", &shape), |b| {
        b.iter_batched(&mut prep1, &mut bench1, BatchSize::SmallInput);
    });
    group.bench_function(BenchmarkId::new("roaring-rs", &shape), |b| {
        b.iter_batched(&mut prep2, &mut bench2, BatchSize::SmallInput);
    });
}

fn contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");
    for shape in SHAPES {
        let (ours, theirs) = (shape.ours(), shape.theirs());
        compare(
            &mut group,
            shape,
            || (),
            || (),
            |()| (0..SPAN).step_by(61).filter(|&v| ours.contains(black_box(v))).count(),
            |()| (0..SPAN).step_by(61).filter(|&v| theirs.contains(black_box(v))).count(),
        );
    }
}

fn iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");
    for shape in SHAPES {
        let (ours, theirs) = (shape.ours(), shape.theirs());
        group.throughput(Throughput::Elements(theirs.len()));
        compare(
            &mut group,
            shape,
            || (),
            || (),
            |()| ours.iter().map(u64::from).sum::<u64>(),
            |()| theirs.iter().map(u64::from).sum::<u64>(),
        );
        group.bench_function(BenchmarkId::new("roaring-core/batch", format!("{shape:?}")), |b| {
            let mut buf = [0u32; 256];
            b.iter(|| {
                let mut batches = ours.batch_iter();
                let mut total = 0u64;
                loop {
                    let n = batches.next_batch(&mut buf);
                    if n == 0 {
                        break total;
                    }
                    total += buf[..n].iter().map(|&v| u64::from(v)).sum::<u64>();
                }
            });
        });
    }
}

fn iterate_reverse(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate_reverse");
    for shape in SHAPES {
        let (ours, theirs) = (shape.ours(), shape.theirs());
        group.throughput(Throughput::Elements(theirs.len()));
        compare(
            &mut group,
            shape,
            || (),
            || (),
            |()| ours.reverse_iter().take(10_000).map(u64::from).sum::<u64>(),
            |()| theirs.iter().rev().take(10_000).map(u64::from).sum::<u64>(),
        );
    }
}

fn range_consumption(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_consumption");
    let (start, length) = (SPAN / 4, SPAN / 2);
    for shape in SHAPES {
        let (ours, theirs) = (shape.ours(), shape.theirs());
        compare(
            &mut group,
            shape,
            || (),
            || (),
            |()| {
                let mut sum = 0u64;
                let mut consumer = ValueConsumer::new(start, |value| sum += u64::from(value));
                ours.for_all_in_range(start, length, &mut consumer);
                sum
            },
            |()| {
                theirs
                    .iter()
                    .skip_while(|&v| v < start)
                    .take_while(|&v| v < start + length)
                    .map(u64::from)
                    .sum::<u64>()
            },
        );
    }
}

fn add_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_range");
    for shape in SHAPES {
        let ranges = shape.ranges();
        compare(
            &mut group,
            shape,
            Bitmap::new,
            RoaringBitmap::new,
            |mut bitmap: Bitmap| {
                for range in &ranges {
                    bitmap.add_range(range.clone());
                }
                bitmap
            },
            |mut bitmap: RoaringBitmap| {
                for range in &ranges {
                    bitmap.insert_range(range.clone());
                }
                bitmap
            },
        );
    }
}

fn and_cardinality(c: &mut Criterion) {
    let mut group = c.benchmark_group("and_cardinality");
    let (dense, dense_rs) = (Shape::Dense.ours(), Shape::Dense.theirs());
    for shape in SHAPES {
        let (ours, theirs) = (shape.ours(), shape.theirs());
        compare(
            &mut group,
            shape,
            || (),
            || (),
            |()| ours.and_cardinality(&dense),
            |()| theirs.intersection_len(&dense_rs),
        );
    }
}

fn flip(c: &mut Criterion) {
    let mut group = c.benchmark_group("flip");
    let window = SPAN / 8..SPAN - SPAN / 8;
    let mut mask = RoaringBitmap::new();
    mask.insert_range(window.clone());
    for shape in SHAPES {
        let (ours, theirs) = (shape.ours(), shape.theirs());
        compare(
            &mut group,
            shape,
            || (),
            || (),
            |()| ours.flip(window.clone()),
            |()| &theirs ^ &mask,
        );
    }
}

criterion_group!(
    comparison,
    contains,
    iterate,
    iterate_reverse,
    range_consumption,
    add_range,
    and_cardinality,
    flip,
);
criterion_main!(comparison);
