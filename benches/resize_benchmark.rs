use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageBuffer, Rgb};
use imagemin::processing::{scaled_dimensions, CodecRegistry, ImageResizer};
use imagemin::{EncodeSettings, TargetFormat};

fn test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    }))
}

fn benchmark_dimensions(c: &mut Criterion) {
    c.bench_function("scaled_dimensions", |b| {
        b.iter(|| scaled_dimensions(black_box(4032), black_box(3024), black_box(1600)))
    });
}

fn benchmark_resize(c: &mut Criterion) {
    let image = test_image(2400, 1600);
    let resizer = ImageResizer::new();

    c.bench_function("lanczos3 2400x1600 -> 1600", |b| {
        b.iter(|| resizer.fit(black_box(image.clone()), 1600))
    });
}

fn benchmark_encode(c: &mut Criterion) {
    let image = test_image(800, 600);
    let codecs = CodecRegistry::new().expect("codec registry");
    let settings = EncodeSettings::default();

    let mut group = c.benchmark_group("encode 800x600");
    group.sample_size(10);
    for target in [TargetFormat::WebP, TargetFormat::Jpeg] {
        group.bench_function(target.as_str(), |b| {
            b.iter(|| codecs.encode(black_box(&image), target, &settings))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_dimensions, benchmark_resize, benchmark_encode);
criterion_main!(benches);
