//! Line mutation throughput.

use bim::buffer::Buffer;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_line_insert(c: &mut Criterion) {
    c.bench_function("insert_1k_chars", |b| {
        b.iter(|| {
            let mut buf = Buffer::new(true, true);
            for i in 0..1000 {
                let cell = buf.make_cell('x');
                buf.line_insert(0, cell, i);
            }
            black_box(buf.lines[0].len())
        });
    });
}

fn bench_split_merge(c: &mut Criterion) {
    c.bench_function("split_merge_round_trip", |b| {
        let mut buf = Buffer::new(true, true);
        for i in 0..200 {
            let cell = buf.make_cell('y');
            buf.line_insert(0, cell, i);
        }
        b.iter(|| {
            buf.split_line(0, 100);
            buf.merge_lines(1);
            black_box(buf.line_count())
        });
    });
}

fn bench_undo_redo(c: &mut Criterion) {
    c.bench_function("undo_redo_100_edits", |b| {
        b.iter(|| {
            let mut buf = Buffer::new(true, true);
            for i in 0..100 {
                let cell = buf.make_cell('z');
                buf.line_insert(0, cell, i);
            }
            buf.set_history_break();
            buf.undo();
            buf.redo();
            black_box(buf.lines[0].len())
        });
    });
}

criterion_group!(benches, bench_line_insert, bench_split_merge, bench_undo_redo);
criterion_main!(benches);
