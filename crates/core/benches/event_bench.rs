//! 로그 이벤트 벤치마크
//!
//! LogEvent 생성, JSON 직렬화/역직렬화, 타임스탬프 포맷 성능을 측정합니다.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use floodmail_core::types::{Level, LogEvent, rfc3339};
use std::time::SystemTime;

const JSON_LINE: &str = r#"{"timestamp":"2024-01-15T12:00:00.250Z","level":"ERROR","logger":"app.db.pool","message":"connection refused: db01.example.com:5432","stack_trace":["at db::pool::connect","at app::main"],"thread":"worker-3","context":[["request_id","550e8400-e29b-41d4-a716-446655440000"]]}"#;

fn create_event() -> LogEvent {
    LogEvent::new(Level::Error, "connection refused: db01.example.com:5432")
        .with_logger("app.db.pool")
        .with_thread("worker-3")
        .with_stack_trace(vec![
            "at db::pool::connect".to_owned(),
            "at app::main".to_owned(),
        ])
        .with_context("request_id", "550e8400-e29b-41d4-a716-446655440000")
}

fn bench_event_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_creation");
    group.throughput(Throughput::Elements(1));

    group.bench_function("log_event_new", |b| {
        b.iter(|| LogEvent::new(black_box(Level::Warn), black_box("disk usage at 91%")))
    });

    group.bench_function("log_event_builder", |b| b.iter(create_event));

    group.finish();
}

fn bench_event_serialization(c: &mut Criterion) {
    let event = create_event();

    let mut group = c.benchmark_group("event_serialization");
    group.throughput(Throughput::Elements(1));

    group.bench_function("log_event_to_json", |b| {
        b.iter(|| serde_json::to_string(black_box(&event)).unwrap())
    });

    group.bench_function("log_event_from_json", |b| {
        b.iter(|| serde_json::from_str::<LogEvent>(black_box(JSON_LINE)).unwrap())
    });

    group.bench_function("timestamp_rfc3339", |b| {
        let now = SystemTime::now();
        b.iter(|| rfc3339::format(black_box(now)))
    });

    group.finish();
}

fn bench_level_parsing(c: &mut Criterion) {
    let inputs = ["error", "WARN", "Warning", "fatal", "unknown"];

    c.bench_function("level_from_str_loose", |b| {
        b.iter(|| {
            for input in &inputs {
                black_box(Level::from_str_loose(black_box(input)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_event_creation,
    bench_event_serialization,
    bench_level_parsing
);
criterion_main!(benches);
