//! Shared fixtures for engine integration tests.

use dualcam_core::{
    Alignment, FrameSize, ImageDescriptor, PixelFormat, PlacementPoint, SynthesisConfig,
};

/// Full HD front and back, front downscaled to a fifth, NV12 everywhere.
#[allow(dead_code)]
pub fn full_hd_config(placement: PlacementPoint) -> SynthesisConfig {
    SynthesisConfig::uniform(
        FrameSize::new(1920, 1080),
        FrameSize::new(384, 216),
        FrameSize::new(1920, 1080),
        Alignment::NONE,
        placement,
        PixelFormat::Nv12,
    )
}

/// 16x8 front halved into a 16x8 back.
#[allow(dead_code)]
pub fn small_config(placement: PlacementPoint) -> SynthesisConfig {
    SynthesisConfig::uniform(
        FrameSize::new(16, 8),
        FrameSize::new(8, 4),
        FrameSize::new(16, 8),
        Alignment::NONE,
        placement,
        PixelFormat::Nv12,
    )
}

/// 8x4 front composited without scaling into a 16x8 back.
#[allow(dead_code)]
pub fn identity_config(placement: PlacementPoint, front_format: PixelFormat) -> SynthesisConfig {
    let mut config = SynthesisConfig::uniform(
        FrameSize::new(8, 4),
        FrameSize::new(8, 4),
        FrameSize::new(16, 8),
        Alignment::NONE,
        placement,
        PixelFormat::Nv12,
    );
    config.front.format = front_format;
    config.scaled.format = front_format;
    config
}

/// Packed frame whose luma rises along each row and whose chroma pairs are
/// `(pair, 200 - pair)`.
#[allow(dead_code)]
pub fn gradient_frame(descriptor: &ImageDescriptor) -> Vec<u8> {
    let pitch = descriptor.row_pitch();
    let mut frame = vec![0_u8; descriptor.packed_len()];
    let (luma, chroma) = frame.split_at_mut(descriptor.luma_plane_len());

    for (index, sample) in luma.iter_mut().enumerate() {
        *sample = ((index % pitch + index / pitch) % 200) as u8;
    }
    for (index, pair) in chroma.chunks_exact_mut(2).enumerate() {
        let column = (index % (pitch / 2)) as u8;
        pair[0] = column % 100;
        pair[1] = 200 - column % 100;
    }
    frame
}

/// Packed frame filled with one luma and one chroma value.
#[allow(dead_code)]
pub fn flat_frame(descriptor: &ImageDescriptor, luma: u8, chroma: u8) -> Vec<u8> {
    let mut frame = vec![luma; descriptor.packed_len()];
    frame[descriptor.luma_plane_len()..].fill(chroma);
    frame
}

/// Routes engine logs to the test harness; `RUST_LOG` selects the level.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
