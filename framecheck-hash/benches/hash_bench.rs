//! Hashing benchmarks.
//!
//! Benchmarks for the Adler-32 strategies, MD5 and whole-frame hashing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use framecheck_core::{Image, VideoFormat};
use framecheck_hash::{hash_image, HashContext, HashType, Strategy};

fn create_test_buffer(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 7 + i / 255) & 0xff) as u8).collect()
}

fn create_test_frame(format: VideoFormat, width: u32, height: u32) -> Image {
    let mut image = Image::allocate(format, width, height).unwrap();
    let mut view = image.view_mut();
    let (w, h) = view.component_size(0);
    for y in 0..h {
        for x in 0..w {
            view.put_sample(0, x, y, (x * 255 / w) & 0xff);
        }
    }
    drop(view);
    image.fill_component(1, 128);
    image.fill_component(2, 128);
    image
}

// ============================================================================
// Adler-32 Strategy Benchmarks
// ============================================================================

fn bench_adler32(c: &mut Criterion) {
    let mut group = c.benchmark_group("adler32");
    let data = create_test_buffer(1 << 20);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for strategy in Strategy::ALL {
        let Ok(mut ctx) = HashContext::with_strategy(HashType::Adler32, strategy) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::from_parameter(format!("{strategy:?}")), &data, |b, data| {
            b.iter(|| {
                ctx.init();
                ctx.update(black_box(data));
                ctx.finalize();
            });
        });
    }

    group.finish();
}

// ============================================================================
// Frame Hash Benchmarks
// ============================================================================

fn bench_frame_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_hash");

    let cases = [
        ("I420_1080p", VideoFormat::I420, 1920, 1080),
        ("NV12_1080p", VideoFormat::Nv12, 1920, 1080),
        ("I420p10_1080p", VideoFormat::I420P10, 1920, 1080),
    ];

    for hash_type in HashType::ALL {
        for (name, format, width, height) in cases {
            let image = create_test_frame(format, width, height);
            let mut ctx = HashContext::new(hash_type);

            group.throughput(Throughput::Elements((width * height) as u64));
            group.bench_with_input(
                BenchmarkId::new(hash_type.name(), name),
                &image,
                |b, image| {
                    b.iter(|| hash_image(black_box(&image.view()), &mut ctx).unwrap());
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_adler32, bench_frame_hash);
criterion_main!(benches);
