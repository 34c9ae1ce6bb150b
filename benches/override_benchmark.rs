use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pixel_dreamcast_rust::overrides::{apply_special_settings, jamma_setup_for};
use pixel_dreamcast_rust::{Config, InputInfo, IpMeta, Peripherals, Platform};

fn benchmark_console_overrides(c: &mut Criterion) {
    let header = IpMeta::for_product("T99999N", "JUE", Peripherals::VGA);

    c.bench_function("console_overrides_unknown_title", |b| {
        b.iter(|| {
            let mut config = Config::default();
            let mut input = InputInfo::default();
            apply_special_settings(black_box("T99999N"), Platform::Dreamcast, &header, &mut config, &mut input);
        })
    });

    c.bench_function("console_overrides_rtt_title", |b| {
        b.iter(|| {
            let mut config = Config::default();
            let mut input = InputInfo::default();
            apply_special_settings(black_box("T40205N"), Platform::Dreamcast, &header, &mut config, &mut input);
        })
    });

    c.bench_function("console_overrides_depth_scale_title", |b| {
        b.iter(|| {
            let mut config = Config::default();
            let mut input = InputInfo::default();
            apply_special_settings(black_box("MK-51182"), Platform::Dreamcast, &header, &mut config, &mut input);
        })
    });
}

fn benchmark_jvs_lookup(c: &mut Criterion) {
    c.bench_function("jamma_setup_known_title", |b| {
        b.iter(|| jamma_setup_for(black_box("OUTTRIGGER     JAPAN")))
    });

    c.bench_function("jamma_setup_unknown_title", |b| {
        b.iter(|| jamma_setup_for(black_box("UNKNOWN NAOMI GAME")))
    });
}

criterion_group!(benches, benchmark_console_overrides, benchmark_jvs_lookup);
criterion_main!(benches);
