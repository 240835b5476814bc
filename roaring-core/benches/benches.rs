use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};

use roaring_core::container::{Container, ContainerKind, ContainerOps, ValueConsumer};
use roaring_core::{Bitmap, Portable};

fn add(c: &mut Criterion) {
    c.bench_function("add", |b| {
        let mut bitmap = Bitmap::new();

        b.iter(|| bitmap.add(10000));
    });
}

fn add_many(c: &mut Criterion) {
    c.bench_function("add_many", |b| {
        let mut bitmap = Bitmap::new();
        let int_slice = &[10, 100, 10_000, 1_000_000, 10_000_000];

        b.iter(|| bitmap.add_many(black_box(int_slice)));
    });
}

fn contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");
    for kind in [ContainerKind::Array, ContainerKind::Bitmap, ContainerKind::Run] {
        let container = Container::from_range(0..3000).into_kind(kind);
        group.bench_function(format!("{kind:?}"), |b| {
            b.iter(|| container.contains(black_box(1500)));
        });
    }
}

fn cardinality(c: &mut Criterion) {
    let mut group = c.benchmark_group("cardinality");

    for &size in &[100_000, 1_000_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let bitmap: Bitmap = (0..size).collect();

            b.iter(|| bitmap.cardinality());
        });
    }
}

fn binops(c: &mut Criterion) {
    let bitmap1: Bitmap = (0..200_000).step_by(3).collect();
    let bitmap2: Bitmap = (0..200_000).step_by(5).collect();

    macro_rules! bench_op {
        ($new:ident, $inplace:ident) => {{
            let mut group = c.benchmark_group(stringify!($new));

            group.bench_function("new", |b| {
                b.iter(|| bitmap1.$new(&bitmap2));
            });
            group.bench_function("inplace", |b| {
                b.iter_batched(
                    || bitmap1.clone(),
                    |mut dst_bitmap| dst_bitmap.$inplace(&bitmap2),
                    BatchSize::SmallInput,
                );
            });

            group
        }};
        ($new:ident, $inplace:ident, $fast:ident) => {{
            let mut group = bench_op!($new, $inplace);

            group.bench_function("fast", |b| {
                b.iter(|| Bitmap::$fast(&[&bitmap1, &bitmap2]));
            });

            group
        }};
    }

    bench_op!(and, and_inplace);
    bench_op!(or, or_inplace, fast_or);
    bench_op!(xor, xor_inplace);
    bench_op!(andnot, andnot_inplace);
}

fn iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");
    for kind in [ContainerKind::Array, ContainerKind::Bitmap, ContainerKind::Run] {
        let container = Container::from_range(0..4000).into_kind(kind);
        group.throughput(Throughput::Elements(4000));
        group.bench_function(BenchmarkId::new("single", format!("{kind:?}")), |b| {
            b.iter(|| container.iter().map(u32::from).sum::<u32>());
        });
        group.bench_function(BenchmarkId::new("batch", format!("{kind:?}")), |b| {
            let mut buf = [0u32; 256];
            b.iter(|| {
                let mut batches = container.batch_iter();
                let mut total = 0;
                loop {
                    let n = batches.next_batch(0x0001_0000, &mut buf);
                    if n == 0 {
                        break total;
                    }
                    total += n;
                }
            });
        });
    }
}

fn for_all_in_range(c: &mut Criterion) {
    let mut bitmap = Bitmap::new();
    bitmap.add_range(0..100_000);
    bitmap.add_many(&[150_000, 150_002, 200_000]);

    c.bench_function("for_all_in_range", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            let mut consumer = ValueConsumer::new(0, |value| sum += u64::from(value));
            bitmap.for_all_in_range(0, 250_000, &mut consumer);
            sum
        });
    });
}

fn run_optimize(c: &mut Criterion) {
    let mut bitmap = Bitmap::new();
    for start in (0..1_000_000).step_by(1000) {
        bitmap.add_range(start..start + 500);
    }
    bitmap.remove_run_compression();

    c.bench_function("run_optimize", |b| {
        b.iter_batched(
            || bitmap.clone(),
            |mut bitmap| bitmap.run_optimize(),
            BatchSize::SmallInput,
        );
    });
}

fn lazy_batch(c: &mut Criterion) {
    let parts: Vec<Bitmap> = (0..16u32)
        .map(|i| (0..20_000u32).map(|v| v * 16 + i).collect())
        .collect();

    let mut group = c.benchmark_group("union_many");
    group.bench_function("or_inplace", |b| {
        b.iter(|| {
            let mut result = Bitmap::new();
            for part in &parts {
                result.or_inplace(part);
            }
            result
        });
    });
    group.bench_function("lazy_batch", |b| {
        b.iter(|| {
            let mut result = Bitmap::new();
            result.lazy_batch(|lazy| {
                for part in &parts {
                    lazy.or_inplace(part);
                }
            });
            result
        });
    });
}

fn serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    for &size in &[100_000, 1_000_000] {
        let bitmap: Bitmap = (1..size).collect();
        group.throughput(Throughput::Elements(size.into()));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| bitmap.serialize::<Portable>());
        });
    }
}

fn deserialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("deserialize");
    for &size in &[100_000, 1_000_000] {
        let bitmap: Bitmap = (1..size).collect();
        let serialized_buffer = match bitmap.serialize::<Portable>() {
            Ok(buffer) => buffer,
            Err(err) => panic!("cannot serialize: {err}"),
        };
        group.throughput(Throughput::Elements(size.into()));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| Bitmap::try_deserialize::<Portable>(&serialized_buffer));
        });
    }
}

criterion_group!(
    benches,
    add,
    add_many,
    contains,
    cardinality,
    binops,
    iterate,
    for_all_in_range,
    run_optimize,
    lazy_batch,
    serialize,
    deserialize,
);
criterion_main!(benches);
