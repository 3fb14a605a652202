//! Highlighting throughput for representative inputs.

use bim::buffer::{Cell, Line};
use bim::syntax::Syntax;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn line_of(text: &str) -> Line {
    Line::from_cells(text.chars().map(Cell::new).collect())
}

fn bench_c_line(c: &mut Criterion) {
    c.bench_function("lex_c_line", |b| {
        b.iter(|| {
            let mut line =
                line_of("static int foo(const char * bar) { return 0x1F + 'c'; } /* tail */");
            black_box(Syntax::C.lex_line(&mut line, 0, 0))
        });
    });
}

fn bench_markdown_nested(c: &mut Criterion) {
    c.bench_function("lex_markdown_fenced_rust", |b| {
        b.iter(|| {
            let mut state = 0;
            let mut open = line_of("```rust");
            state = Syntax::Markdown.lex_line(&mut open, 0, state);
            let mut body = line_of("fn main() { let x = \"string\"; }");
            state = Syntax::Markdown.lex_line(&mut body, 1, state);
            let mut close = line_of("```");
            black_box(Syntax::Markdown.lex_line(&mut close, 2, state))
        });
    });
}

fn bench_long_string_line(c: &mut Criterion) {
    let long = format!("x = \"{}\"", "a".repeat(2000));
    c.bench_function("lex_long_string", |b| {
        b.iter(|| {
            let mut line = line_of(&long);
            black_box(Syntax::Python.lex_line(&mut line, 0, 0))
        });
    });
}

criterion_group!(
    benches,
    bench_c_line,
    bench_markdown_nested,
    bench_long_string_line
);
criterion_main!(benches);
