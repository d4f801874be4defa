#![warn(missing_docs)]
//! # dualcam-compose
//!
//! ## Purpose
//! Copies a scaled front frame into a back frame at a placement, under one of
//! four geometric variants.
//!
//! ## Responsibilities
//! - Compute luma and chroma write origins from placement parity.
//! - Bounds-check every plane before the first byte is written.
//! - Run the per-variant copy loop for [`MirrorFlip`].
//!
//! ## Data flow
//! Scaled front [`SemiPlanar`] + [`CompositeJob`] -> [`composite`] -> bytes
//! written in place into the back [`SemiPlanarMut`], summarized by
//! [`CompositeStats`].
//!
//! ## Ownership and lifetimes
//! Both frames are borrowed for one call; the front frame is never mutated.
//!
//! ## Error model
//! Jobs that would index outside either frame fail with
//! [`SynthesisError::InvalidParameter`]; nothing is written in that case.
//!
//! ## Chroma convention
//! Every variant writes the same chroma rows as the straight copy: back chroma
//! rows `y / 2 + k` for `k < ceil(h / 2)`, starting at column
//! `x + chroma_column_delta(..)`. Mirrored variants move whole `U,V` pairs and
//! keep component order inside a pair.

use dualcam_core::{
    MirrorFlip, PlacementPoint, SemiPlanar, SemiPlanarMut, SynthesisError, chroma_column_delta,
};

/// One composite request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeJob {
    /// Scaled front width in pixels.
    pub width: u32,
    /// Scaled front height in pixels.
    pub height: u32,
    /// Top-left corner inside the back frame.
    pub placement: PlacementPoint,
    /// Geometric variant.
    pub mirror_flip: MirrorFlip,
    /// Swap the two bytes of every chroma pair (front and back interleave
    /// orders differ).
    pub swap_chroma: bool,
}

/// Byte counts written by one composite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeStats {
    /// Luma bytes written.
    pub luma_bytes: usize,
    /// Chroma bytes written.
    pub chroma_bytes: usize,
}

/// Write origins inside the back planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOrigin {
    /// Luma index of the top-left pixel.
    pub luma: usize,
    /// Chroma index of the first written byte.
    pub chroma: usize,
}

impl WriteOrigin {
    /// Computes origins for `placement` in a back frame with row `pitch`.
    pub fn new(placement: &PlacementPoint, pitch: usize) -> Self {
        let x = placement.x() as usize;
        let y = placement.y() as usize;
        let column = x.saturating_add_signed(chroma_column_delta(
            placement.on_odd_row(),
            placement.on_odd_col(),
        ));

        Self {
            luma: y * pitch + x,
            chroma: (y / 2) * pitch + column,
        }
    }
}

/// Composites `front` into `back` per `job`.
///
/// # Errors
/// Returns [`SynthesisError::EmptyInput`] when any plane is empty and
/// [`SynthesisError::InvalidParameter`] when the job does not fit either
/// frame.
pub fn composite(
    front: &SemiPlanar<'_>,
    back: &mut SemiPlanarMut<'_>,
    job: &CompositeJob,
) -> Result<CompositeStats, SynthesisError> {
    if front.luma.is_empty()
        || front.chroma.is_empty()
        || back.luma.is_empty()
        || back.chroma.is_empty()
    {
        return Err(SynthesisError::EmptyInput);
    }

    let region = Region::new(job);
    check_bounds(front, back, job, &region)?;
    let origin = WriteOrigin::new(&job.placement, back.pitch);

    match job.mirror_flip {
        MirrorFlip::NoTransform => copy_straight(front, back, &region, origin, job.swap_chroma),
        MirrorFlip::HorizontalMirror => {
            copy_horizontal_mirror(front, back, &region, origin, job.swap_chroma)
        }
        MirrorFlip::VerticalFlip => copy_vertical_flip(front, back, &region, origin, job.swap_chroma),
        MirrorFlip::Rotate180 => copy_rotate_180(front, back, &region, origin, job.swap_chroma),
    }

    Ok(region.stats(job.mirror_flip))
}

#[derive(Debug, Clone, Copy)]
struct Region {
    width: usize,
    height: usize,
    chroma_rows: usize,
}

impl Region {
    fn new(job: &CompositeJob) -> Self {
        Self {
            width: job.width as usize,
            height: job.height as usize,
            chroma_rows: (job.height as usize).div_ceil(2),
        }
    }

    /// Chroma bytes written per chroma row.
    fn chroma_span(&self, mirror_flip: MirrorFlip) -> usize {
        match mirror_flip {
            MirrorFlip::NoTransform | MirrorFlip::VerticalFlip => self.width,
            MirrorFlip::HorizontalMirror | MirrorFlip::Rotate180 => self.width / 2 * 2,
        }
    }

    fn stats(&self, mirror_flip: MirrorFlip) -> CompositeStats {
        CompositeStats {
            luma_bytes: self.width * self.height,
            chroma_bytes: self.chroma_span(mirror_flip) * self.chroma_rows,
        }
    }
}

fn check_bounds(
    front: &SemiPlanar<'_>,
    back: &SemiPlanarMut<'_>,
    job: &CompositeJob,
    region: &Region,
) -> Result<(), SynthesisError> {
    if region.width == 0 || region.height == 0 {
        return Ok(());
    }

    let x = job.placement.x() as usize;
    let y = job.placement.y() as usize;
    let origin = WriteOrigin::new(&job.placement, back.pitch);
    let chroma_column = origin.chroma - (y / 2) * back.pitch;

    let fits = region.width <= front.pitch
        && x + region.width <= back.pitch
        && chroma_column + region.width <= back.pitch
        && plane_fits(front.luma.len(), front.pitch, 0, region.height, region.width)
        && plane_fits(front.chroma.len(), front.pitch, 0, region.chroma_rows, region.width)
        && plane_fits(back.luma.len(), back.pitch, y, region.height, x + region.width)
        && plane_fits(
            back.chroma.len(),
            back.pitch,
            y / 2,
            region.chroma_rows,
            chroma_column + region.width,
        );

    if fits {
        Ok(())
    } else {
        Err(SynthesisError::InvalidParameter)
    }
}

/// Returns `true` when rows `first..first + rows` reach column `end` inside
/// `len` bytes.
fn plane_fits(len: usize, pitch: usize, first: usize, rows: usize, end: usize) -> bool {
    (first + rows - 1)
        .checked_mul(pitch)
        .and_then(|start| start.checked_add(end))
        .is_some_and(|required| required <= len)
}

fn copy_straight(
    front: &SemiPlanar<'_>,
    back: &mut SemiPlanarMut<'_>,
    region: &Region,
    origin: WriteOrigin,
    swap_chroma: bool,
) {
    let mut luma_offset = origin.luma;
    let mut chroma_offset = origin.chroma;

    for row in 0..region.height {
        let src = &front.luma[row * front.pitch..][..region.width];
        back.luma[luma_offset..luma_offset + region.width].copy_from_slice(src);

        if row % 2 == 0 {
            let src = &front.chroma[row / 2 * front.pitch..][..region.width];
            let dst = &mut back.chroma[chroma_offset..chroma_offset + region.width];
            write_chroma_row(dst, src, swap_chroma);
            chroma_offset += back.pitch;
        }
        luma_offset += back.pitch;
    }
}

fn copy_horizontal_mirror(
    front: &SemiPlanar<'_>,
    back: &mut SemiPlanarMut<'_>,
    region: &Region,
    origin: WriteOrigin,
    swap_chroma: bool,
) {
    for row in 0..region.height {
        let src = &front.luma[row * front.pitch..][..region.width];
        let dst_start = origin.luma + row * back.pitch;
        write_luma_row_mirrored(&mut back.luma[dst_start..dst_start + region.width], src);

        if row % 2 == 0 {
            let src = &front.chroma[row / 2 * front.pitch..][..region.width];
            let dst_start = origin.chroma + row / 2 * back.pitch;
            let dst = &mut back.chroma[dst_start..dst_start + region.width];
            write_chroma_row_mirrored(dst, src, swap_chroma);
        }
    }
}

fn copy_vertical_flip(
    front: &SemiPlanar<'_>,
    back: &mut SemiPlanarMut<'_>,
    region: &Region,
    origin: WriteOrigin,
    swap_chroma: bool,
) {
    for row in 0..region.height {
        let src = &front.luma[row * front.pitch..][..region.width];
        let dst_start = origin.luma + (region.height - 1 - row) * back.pitch;
        back.luma[dst_start..dst_start + region.width].copy_from_slice(src);

        if row % 2 == 0 {
            let src = &front.chroma[row / 2 * front.pitch..][..region.width];
            let dst_start = origin.chroma + (region.chroma_rows - 1 - row / 2) * back.pitch;
            let dst = &mut back.chroma[dst_start..dst_start + region.width];
            write_chroma_row(dst, src, swap_chroma);
        }
    }
}

fn copy_rotate_180(
    front: &SemiPlanar<'_>,
    back: &mut SemiPlanarMut<'_>,
    region: &Region,
    origin: WriteOrigin,
    swap_chroma: bool,
) {
    for row in 0..region.height {
        let src_row = region.height - 1 - row;
        let src = &front.luma[src_row * front.pitch..][..region.width];
        let dst_start = origin.luma + row * back.pitch;
        write_luma_row_mirrored(&mut back.luma[dst_start..dst_start + region.width], src);

        if row % 2 == 0 {
            let src_row = region.chroma_rows - 1 - row / 2;
            let src = &front.chroma[src_row * front.pitch..][..region.width];
            let dst_start = origin.chroma + row / 2 * back.pitch;
            let dst = &mut back.chroma[dst_start..dst_start + region.width];
            write_chroma_row_mirrored(dst, src, swap_chroma);
        }
    }
}

fn write_luma_row_mirrored(dst: &mut [u8], src: &[u8]) {
    for (out, sample) in dst.iter_mut().zip(src.iter().rev()) {
        *out = *sample;
    }
}

fn write_chroma_row(dst: &mut [u8], src: &[u8], swap: bool) {
    if !swap {
        dst.copy_from_slice(src);
        return;
    }

    let mut dst_pairs = dst.chunks_exact_mut(2);
    let mut src_pairs = src.chunks_exact(2);
    for (out, pair) in (&mut dst_pairs).zip(&mut src_pairs) {
        out[0] = pair[1];
        out[1] = pair[0];
    }
    // Odd widths end on a half pair; copy it through unchanged.
    dst_pairs
        .into_remainder()
        .copy_from_slice(src_pairs.remainder());
}

/// Writes whole pairs in reverse pair order; a trailing odd byte is left
/// untouched.
fn write_chroma_row_mirrored(dst: &mut [u8], src: &[u8], swap: bool) {
    let pairs = src.len() / 2;
    let (first, second) = if swap { (1, 0) } else { (0, 1) };
    for (out, pair) in dst.chunks_exact_mut(2).zip(src[..pairs * 2].chunks_exact(2).rev()) {
        out[0] = pair[first];
        out[1] = pair[second];
    }
}
