use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use query::{SearchQueryBuilder, parse_filter_expression};

const EXPRESSION: &str = "name=joumen&jobs.name=engineer&age>20&addresses.name!=sfax&age<60";

fn parse_benchmark(c: &mut Criterion) {
    c.bench_function("parse_filter_expression", |b| {
        b.iter(|| parse_filter_expression(black_box(EXPRESSION)))
    });
}

fn compile_benchmark(c: &mut Criterion) {
    let parameters = parse_filter_expression(EXPRESSION).expect("valid expression");

    c.bench_function("compile_search_query", |b| {
        b.iter(|| SearchQueryBuilder::from_parameters(black_box(parameters.clone())).build())
    });

    c.bench_function("compile_and_render_dsl", |b| {
        b.iter(|| {
            SearchQueryBuilder::from_parameters(black_box(parameters.clone()))
                .build()
                .query
                .to_dsl()
        })
    });
}

criterion_group!(benches, parse_benchmark, compile_benchmark);
criterion_main!(benches);
