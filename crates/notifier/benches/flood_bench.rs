//! 홍수 보호 및 채널 핫패스 벤치마크

use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use floodmail_core::types::{Level, LogEvent};
use floodmail_notifier::{
    ChannelConfigBuilder, EventBuffer, FilterEngine, FloodWindow, MemoryTransport,
    NotificationChannel,
};

fn bench_flood_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("flood_window");
    group.throughput(Throughput::Elements(1));

    for frequency in [5usize, 100, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("add", frequency),
            &frequency,
            |b, &frequency| {
                let mut window = FloodWindow::new(frequency, Duration::from_secs(60));
                let base = Instant::now();
                let mut tick = 0u64;
                b.iter(|| {
                    tick += 1;
                    window.add(black_box(base + Duration::from_micros(tick)))
                })
            },
        );
    }

    group.bench_function("disabled", |b| {
        let mut window = FloodWindow::new(0, Duration::ZERO);
        b.iter(|| window.add_now())
    });

    group.finish();
}

fn bench_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_buffer");
    group.throughput(Throughput::Elements(1));

    group.bench_function("push_overwrite", |b| {
        let mut buffer = EventBuffer::new(512);
        let event = LogEvent::new(Level::Error, "connection refused");
        b.iter(|| buffer.push(black_box(event.clone())))
    });

    group.finish();
}

fn bench_channel_on_event(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let _guard = runtime.enter();

    let transport = Arc::new(MemoryTransport::new());
    let config = ChannelConfigBuilder::new()
        .to("ops@example.com")
        .buffer_size(512)
        .flood(5, Duration::from_secs(60))
        .build()
        .unwrap();
    let channel =
        NotificationChannel::init(config, Arc::new(FilterEngine::empty()), transport).unwrap();

    let mut group = c.benchmark_group("channel");
    group.throughput(Throughput::Elements(1));

    // 5건 이후로는 홍수 억제 경로만 탄다
    group.bench_function("on_event_flooding", |b| {
        let event = LogEvent::new(Level::Error, "connection refused");
        b.iter(|| channel.on_event(black_box(event.clone())))
    });

    group.finish();
    runtime.block_on(channel.close(false));
}

criterion_group!(benches, bench_flood_window, bench_buffer, bench_channel_on_event);
criterion_main!(benches);
