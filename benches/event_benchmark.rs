use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pixel_dreamcast_rust::events::{Event, EventBus, Subscriber};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn benchmark_broadcast(c: &mut Criterion) {
    let bus = EventBus::new();
    let counter = Arc::new(AtomicU64::new(0));
    for _ in 0..8 {
        let counter = counter.clone();
        let subscriber: Subscriber = Arc::new(move |_: Event| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        bus.register(Event::VBlank, subscriber);
    }

    c.bench_function("broadcast_vblank_8_subscribers", |b| {
        b.iter(|| bus.broadcast(black_box(Event::VBlank)))
    });

    c.bench_function("broadcast_no_subscriber", |b| {
        b.iter(|| bus.broadcast(black_box(Event::Network)))
    });
}

fn benchmark_registration(c: &mut Criterion) {
    let bus = EventBus::new();
    let subscriber: Subscriber = Arc::new(|_: Event| {});

    c.bench_function("register_unregister", |b| {
        b.iter(|| {
            bus.register(Event::Pause, subscriber.clone());
            bus.unregister(Event::Pause, black_box(&subscriber));
        })
    });
}

criterion_group!(benches, benchmark_broadcast, benchmark_registration);
criterion_main!(benches);
