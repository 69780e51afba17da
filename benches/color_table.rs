//! Benchmarks for the color table and frame pipeline.

use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use xtstopng::{ColorTable, FrameDecoder, assign_colors, render_frame};

/// Pixel stream with `distinct` values, repeated, in scattered order.
fn pixel_stream(distinct: u32, len: usize) -> Vec<u32> {
    (0..len as u32)
        .map(|i| (i.wrapping_mul(2_654_435_761) % distinct).wrapping_mul(0x9e37))
        .collect()
}

fn bench_find_or_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_or_insert");

    for distinct in [16, 256, 4096, 65536] {
        let pixels = pixel_stream(distinct, 100_000);
        group.bench_with_input(
            BenchmarkId::from_parameter(distinct),
            &pixels,
            |b, pixels| {
                b.iter(|| {
                    let mut table = ColorTable::new();
                    for &p in pixels {
                        black_box(table.find_or_insert(p));
                    }
                    table.len()
                });
            },
        );
    }

    group.finish();
}

fn bench_assign(c: &mut Criterion) {
    let mut group = c.benchmark_group("assign_colors");

    for distinct in [256, 65536] {
        let mut table = ColorTable::new();
        for p in pixel_stream(distinct, distinct as usize * 4) {
            table.find_or_insert(p);
        }
        group.bench_function(BenchmarkId::from_parameter(distinct), |b| {
            b.iter(|| assign_colors(black_box(&mut table)));
        });
    }

    group.finish();
}

fn bench_decode_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_render");

    for size in [64u32, 256, 512] {
        let mut trace = format!("{size} {size} 32\n");
        for (i, p) in pixel_stream(64, (size * size / 4) as usize).into_iter().enumerate() {
            if i % 2 == 0 {
                trace.push_str(&format!("4,{p:x}\n"));
            } else {
                trace.push_str(&format!("{p:x}\n{p:x}\n2,{p:x}\n"));
            }
        }

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}", size, size)),
            &trace,
            |b, trace| {
                b.iter(|| {
                    let mut table = ColorTable::new();
                    let mut decoder = FrameDecoder::new(Cursor::new(trace.as_bytes()), "bench");
                    let frame = decoder.next_frame(&mut table).unwrap().unwrap();
                    assign_colors(&mut table);
                    render_frame(&frame, &table).unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_find_or_insert, bench_assign, bench_decode_render);
criterion_main!(benches);
