// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use unbroken_gotest::{Diagnostic, MetricDeriver, encode_batch, parse_events};

/// Build a synthetic `go test -json` run with `packages * tests` results
fn synthetic_run(packages: usize, tests: usize) -> String {
    let mut out = String::new();
    for p in 0..packages {
        let pkg = format!("github.com/acme/svc/pkg{p}");
        for t in 0..tests {
            let name = format!("TestCase{t}/sub_{t}");
            out.push_str(&format!(
                "{{\"Time\":\"2026-03-02T09:41:10.001+01:00\",\"Action\":\"run\",\"Package\":\"{pkg}\",\"Test\":\"{name}\"}}\n"
            ));
            out.push_str(&format!(
                "{{\"Time\":\"2026-03-02T09:41:10.002+01:00\",\"Action\":\"output\",\"Package\":\"{pkg}\",\"Test\":\"{name}\",\"Output\":\"=== RUN   {name}\\n\"}}\n"
            ));
            let action = if t % 7 == 0 { "fail" } else { "pass" };
            out.push_str(&format!(
                "{{\"Time\":\"2026-03-02T09:41:10.003+01:00\",\"Action\":\"{action}\",\"Package\":\"{pkg}\",\"Test\":\"{name}\",\"Elapsed\":0.01}}\n"
            ));
        }
        out.push_str(&format!(
            "{{\"Action\":\"output\",\"Package\":\"{pkg}\",\"Output\":\"ok  \\t{pkg}\\t0.5s\\tcoverage: 81.2% of statements\\n\"}}\n"
        ));
    }
    out
}

fn pipeline_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");

    for size in [10usize, 100, 1000] {
        let input = synthetic_run(10, size);
        group.throughput(Throughput::Bytes(input.len() as u64));

        group.bench_with_input(BenchmarkId::new("parse", size), &input, |b, input| {
            b.iter(|| parse_events(input.as_bytes()).expect("parse failed"))
        });

        let events = parse_events(input.as_bytes()).expect("parse failed");
        group.bench_with_input(BenchmarkId::new("derive_encode", size), &events, |b, events| {
            b.iter(|| {
                let metrics = MetricDeriver::new(Vec::<Diagnostic>::new()).derive_all(events);
                encode_batch(&metrics)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
