use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dms::synthetic::SyntheticFace;
use dms::{DmsConfig, DriverMonitor, MetricSample};

fn bench_metrics(c: &mut Criterion) {
    let frame = SyntheticFace::new().ear(0.27).mar(0.4).yaw(12.0).build();

    c.bench_function("metric_sample", |b| {
        b.iter(|| MetricSample::from_frame(black_box(&frame), 0))
    });
}

fn bench_process(c: &mut Criterion) {
    let open = SyntheticFace::new().build();
    let closed = SyntheticFace::new().ear(0.10).build();

    c.bench_function("process_frame", |b| {
        let mut monitor = DriverMonitor::new(DmsConfig::default()).unwrap();
        let mut ts = 0u64;
        b.iter(|| {
            ts += 33;
            let frame = if (ts / 33) % 40 < 5 { &closed } else { &open };
            black_box(monitor.process(Some(black_box(frame)), ts))
        })
    });

    c.bench_function("process_no_face", |b| {
        let mut monitor = DriverMonitor::new(DmsConfig::default()).unwrap();
        let mut ts = 0u64;
        b.iter(|| {
            ts += 33;
            black_box(monitor.process(None, ts))
        })
    });
}

criterion_group!(benches, bench_metrics, bench_process);
criterion_main!(benches);
