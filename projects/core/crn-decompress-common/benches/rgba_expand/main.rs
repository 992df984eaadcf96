use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use crn_decompress_common::allocate::allocate_align_64;
use crn_decompress_common::rgba::{expand_blocks_to_rgba, rgba_size, BlockKind};

#[cfg(not(target_os = "windows"))]
use pprof::criterion::{Output, PProfProfiler};

const WIDTH: usize = 2048;
const HEIGHT: usize = 2048;

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Expand blocks to RGBA8888");

    for kind in [BlockKind::Bc1, BlockKind::Bc3, BlockKind::Bc4, BlockKind::Bc5] {
        let num_blocks = (WIDTH / 4) * (HEIGHT / 4);
        let mut input = allocate_align_64(num_blocks * kind.bytes_per_block()).unwrap();
        for (x, byte) in input.as_mut_slice().iter_mut().enumerate() {
            *byte = (x.wrapping_mul(0x9E37_79B9) >> 7) as u8;
        }
        let mut output = allocate_align_64(rgba_size(WIDTH, HEIGHT)).unwrap();

        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_function(format!("{kind:?}"), |b| {
            b.iter(|| {
                expand_blocks_to_rgba(
                    input.as_slice(),
                    kind,
                    WIDTH,
                    HEIGHT,
                    output.as_mut_slice(),
                )
                .unwrap()
            })
        });
    }

    group.finish();
}

#[cfg(not(target_os = "windows"))]
criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = criterion_benchmark
}

#[cfg(target_os = "windows")]
criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = criterion_benchmark
}

criterion_main!(benches);
