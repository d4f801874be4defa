//! Benchmark smoke test for the full HD downscale and composite loop.

use std::sync::Arc;
use std::time::Instant;

use dualcam_core::{
    Alignment, FrameSize, MirrorFlip, PixelFormat, PlacementPoint, SynthesisConfig,
};
use dualcam_engine::SynthesisEngine;
use dualcam_scale::SoftwareScaler;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ITERATIONS: usize = 20;

#[test]
fn benchmark_pipeline_smoke_prints_latency() {
    let config = SynthesisConfig::uniform(
        FrameSize::new(1920, 1080),
        FrameSize::new(384, 216),
        FrameSize::new(1920, 1080),
        Alignment::new(64, 32),
        PlacementPoint::new(1800, 800),
        PixelFormat::Nv12,
    );

    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut source = vec![0_u8; config.front.packed_len()];
    rng.fill(&mut source[..]);
    let mut back = vec![0_u8; config.back.packed_len()];
    rng.fill(&mut back[..]);

    let mut engine = SynthesisEngine::configured(Arc::new(SoftwareScaler::new()), config)
        .expect("engine should initialize");
    let variants = [
        MirrorFlip::NoTransform,
        MirrorFlip::HorizontalMirror,
        MirrorFlip::VerticalFlip,
        MirrorFlip::Rotate180,
    ];

    let mut front = source.clone();
    let mut luma_total = 0usize;
    let start = Instant::now();

    for iteration in 0..ITERATIONS {
        front.copy_from_slice(&source);
        engine.set_mirror_flip(variants[iteration % variants.len()]);
        engine
            .downscale_packed(&mut front)
            .expect("downscale should succeed");
        let stats = engine
            .composite_packed(&front, &mut back)
            .expect("composite should succeed");
        luma_total += stats.luma_bytes;
    }

    let elapsed_ms = start.elapsed().as_millis();
    println!("benchmark_pipeline_elapsed_ms={elapsed_ms}");
    println!("benchmark_pipeline_frames={ITERATIONS}");
    assert_eq!(luma_total, ITERATIONS * 384 * 216);

    // Lightweight guardrail; strict frame-rate targets are environment-specific.
    assert!(
        elapsed_ms < 30_000,
        "pipeline smoke benchmark should stay bounded"
    );
}
