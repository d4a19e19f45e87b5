//! Benchmarks for the render / encode / serialize pipeline.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use hmicb::{
    animation::{ContainerFlags, ContainerHeader, KeyframePolicy, encode_frames, serialize},
    render::render,
    script::{Command, Pixel},
};

const FRAMES: u32 = 60;

/// Short-lived sprites scattered over the canvas, some translucent.
fn scattered_commands(size: u32, count: usize) -> Vec<Command> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|_| {
            let start_frame = rng.gen_range(1..=FRAMES);
            let end_frame = (start_frame + rng.gen_range(0..8)).min(FRAMES);
            let color = if rng.gen_bool(0.3) {
                let [r, g, b]: [u8; 3] = rng.r#gen();
                format!("rgba({r},{g},{b},{})", rng.gen_range(1..255u8))
            } else {
                format!("#{:06X}", rng.gen_range(0..0x100_0000u32))
            };
            let pixels = (0..rng.gen_range(1..32))
                .map(|_| Pixel::new(rng.gen_range(1..=size), rng.gen_range(1..=size)))
                .collect();
            Command {
                start_frame,
                end_frame,
                color,
                pixels,
            }
        })
        .collect()
}

fn header(size: u32) -> ContainerHeader {
    ContainerHeader {
        width: size as u16,
        height: size as u16,
        fps: 30,
        frame_count: FRAMES,
        looping: true,
        flags: ContainerFlags {
            delta_encoding: true,
        },
    }
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for size in [32, 128, 512] {
        let commands = scattered_commands(size, 400);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &size,
            |b, &size| {
                b.iter(|| render(black_box(&commands), size, size, FRAMES));
            },
        );
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("delta_encode");

    for interval in [1, 10, 60] {
        let frames = render(&scattered_commands(128, 400), 128, 128, FRAMES).unwrap();
        let policy = KeyframePolicy::new(interval);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("interval_{}", interval)),
            &interval,
            |b, _| {
                b.iter(|| encode_frames(black_box(&frames), policy));
            },
        );
    }

    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");

    for size in [32, 128] {
        let frames = render(&scattered_commands(size, 400), size, size, FRAMES).unwrap();
        let records = encode_frames(&frames, KeyframePolicy::default());
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &size,
            |b, &size| {
                b.iter(|| serialize(header(size), black_box(&records)).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_encode, bench_serialize);
criterion_main!(benches);
