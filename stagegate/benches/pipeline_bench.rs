//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use stagegate::prelude::*;
use std::sync::Arc;

fn three_stage_pipeline() -> Pipeline {
    PipelineBuilder::new("bench")
        .stage(Arc::new(
            FnStage::new("concept", |v: Value| Ok(json!({ "brief": v, "features": [1, 2] })))
                .with_validator(|out| field_truthy(out, "features")),
        ))
        .and_then(|b| {
            b.stage(Arc::new(
                FnStage::new("design", |v: Value| Ok(json!({ "tokens": {}, "concept": v })))
                    .with_validator(|out| field_truthy(out, "tokens")),
            ))
        })
        .and_then(|b| {
            b.stage(Arc::new(
                FnStage::new("code", |v: Value| Ok(json!({ "files": ["a.rs"], "design": v })))
                    .with_validator(|out| array_len(out, "files").is_some_and(|n| n > 0)),
            ))
        })
        .and_then(PipelineBuilder::build)
        .expect("bench pipeline is valid")
}

fn pipeline_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");

    let empty = PipelineBuilder::new("empty").build().expect("empty pipeline");
    c.bench_function("run_empty", |b| {
        b.iter(|| runtime.block_on(empty.run(black_box(json!("input")))))
    });

    let pipeline = three_stage_pipeline();
    c.bench_function("run_three_stages", |b| {
        b.iter(|| runtime.block_on(pipeline.run(black_box(json!("a dashboard")))))
    });

    c.bench_function("run_three_stages_traced", |b| {
        b.iter(|| runtime.block_on(pipeline.run_traced(black_box(json!("a dashboard")))))
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
