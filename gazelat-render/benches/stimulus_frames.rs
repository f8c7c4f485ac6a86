use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use pprof::criterion::{Output, PProfProfiler};
use std::time::Duration;

use gazelat_core::Stimulus;
use gazelat_render::{FrameLayout, StimulusFrames};

fn full_hd() -> FrameLayout {
    FrameLayout {
        width: 1920,
        height: 1080,
        box_size: 100,
    }
}

/// Building all four frames happens once before the first trial.
pub fn bench_build(c: &mut Criterion) {
    let mut g = c.benchmark_group("build_frames");
    g.sample_size(20);

    g.bench_function("full_hd", |b| {
        b.iter(|| black_box(StimulusFrames::build(black_box(full_hd())).unwrap()));
    });

    g.finish();
}

/// The per-present copy into the surface framebuffer sits inside the
/// measured drawing delay.
pub fn bench_blit(c: &mut Criterion) {
    let mut g = c.benchmark_group("blit");
    g.sample_size(50)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1));

    let frames = StimulusFrames::build(full_hd()).unwrap();
    for stimulus in [Stimulus::IdleWhite, Stimulus::TriggeredWhite] {
        g.bench_function(format!("{stimulus:?}"), |b| {
            b.iter_batched_ref(
                || vec![0u8; 1920 * 1080 * 4],
                |fb| frames.blit(black_box(stimulus), fb).unwrap(),
                BatchSize::LargeInput,
            );
        });
    }

    g.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
        .confidence_level(0.95)
        .noise_threshold(0.02);
    targets = bench_build, bench_blit
}

criterion_main!(benches);
