use core::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use crn_decompress::test_prelude::CrnBuilder;
use crn_decompress::{CrnFormat, Unpacker};

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Unpack level");

    for format in [CrnFormat::Dxt1, CrnFormat::Dxt5, CrnFormat::DxnXY, CrnFormat::Dxt5A] {
        let data = CrnBuilder::patterned(format, 1024, 1024, 42).build();
        let unpacker = Unpacker::new(&data).unwrap();
        let info = unpacker.level_info(0).unwrap();
        let mut face = vec![0u8; info.face_size()];

        group.throughput(Throughput::Bytes(info.face_size() as u64));
        group.bench_function(format.name(), |b| {
            b.iter(|| {
                unpacker
                    .unpack_level(&mut [black_box(&mut face[..])], 0, 0)
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
