use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gifanim::AnimationEncoder;

fn gradient_frame(width: usize, height: usize, phase: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            out.extend_from_slice(&[
                ((x + phase) % 256) as u8,
                ((y * 2 + phase) % 256) as u8,
                ((x + y) % 256) as u8,
                255,
            ]);
        }
    }
    out
}

fn bench_encode(c: &mut Criterion) {
    let frames: Vec<Vec<u8>> = (0..8).map(|i| gradient_frame(128, 128, i * 31)).collect();

    c.bench_function("encode_8_frames_128px", |b| {
        b.iter(|| {
            let mut enc = AnimationEncoder::new(128, 128);
            enc.set_quality(10);
            for frame in &frames {
                enc.add_frame(black_box(frame), 100).unwrap();
            }
            black_box(enc.finish().unwrap())
        })
    });

    c.bench_function("encode_shared_palette", |b| {
        b.iter(|| {
            let mut enc = AnimationEncoder::new(128, 128);
            enc.set_quality(10);
            enc.set_shared_palette(true);
            for frame in &frames {
                enc.add_frame(black_box(frame), 100).unwrap();
            }
            black_box(enc.finish().unwrap())
        })
    });
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
