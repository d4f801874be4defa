#![warn(missing_docs)]
//! # dualcam-scale
//!
//! ## Purpose
//! Defines the scaling/colour-conversion service the engine delegates to.
//!
//! ## Responsibilities
//! - Define the backend-agnostic [`ScaleService`] contract.
//! - Provide [`SoftwareScaler`], a safe-Rust implementation of the contract.
//! - Provide [`ScriptedScaler`], a call-counting, fault-injecting wrapper for
//!   tests and CI.
//!
//! ## Data flow
//! Engine stages an interleaved frame -> [`ScaleService::interleaved_to_planar`]
//! -> [`ScaleService::scale_planar_bilinear`] ->
//! [`ScaleService::planar_to_interleaved`] -> interleaved frame at target size.
//!
//! ## Ownership and lifetimes
//! Services never own pixel memory; every plane is a borrowed slice valid for
//! one call.
//!
//! ## Error model
//! Geometry that does not fit the supplied slices is reported as
//! [`ScaleError`]; the engine forwards it unchanged.

use std::sync::Mutex;

use dualcam_core::{FrameSize, PixelFormat, ScaleError, SemiPlanar, SemiPlanarMut};

/// Borrowed three-plane (I420) frame.
#[derive(Debug, Clone, Copy)]
pub struct PlanarRef<'a> {
    /// Luma plane.
    pub y: &'a [u8],
    /// `U` plane.
    pub u: &'a [u8],
    /// `V` plane.
    pub v: &'a [u8],
    /// Luma row pitch.
    pub y_stride: usize,
    /// Row pitch of both chroma planes.
    pub uv_stride: usize,
}

/// Mutable counterpart of [`PlanarRef`].
#[derive(Debug)]
pub struct PlanarMut<'a> {
    /// Luma plane.
    pub y: &'a mut [u8],
    /// `U` plane.
    pub u: &'a mut [u8],
    /// `V` plane.
    pub v: &'a mut [u8],
    /// Luma row pitch.
    pub y_stride: usize,
    /// Row pitch of both chroma planes.
    pub uv_stride: usize,
}

impl PlanarMut<'_> {
    /// Reborrows as a read-only view.
    pub fn as_planar_ref(&self) -> PlanarRef<'_> {
        PlanarRef {
            y: self.y,
            u: self.u,
            v: self.v,
            y_stride: self.y_stride,
            uv_stride: self.uv_stride,
        }
    }
}

/// Scaling and colour-conversion operations consumed by the engine.
///
/// Chroma planes always cover `ceil(width / 2) x ceil(height / 2)` samples.
pub trait ScaleService: Send + Sync {
    /// Splits an interleaved chroma plane into separate `U`/`V` planes and
    /// copies luma.
    ///
    /// # Errors
    /// Returns [`ScaleError`] when geometry does not fit the slices.
    fn interleaved_to_planar(
        &self,
        src: &SemiPlanar<'_>,
        dst: &mut PlanarMut<'_>,
        size: FrameSize,
        format: PixelFormat,
    ) -> Result<(), ScaleError>;

    /// Resizes every plane from `src_size` to `dst_size` with bilinear
    /// filtering.
    ///
    /// # Errors
    /// Returns [`ScaleError`] when geometry does not fit the slices.
    fn scale_planar_bilinear(
        &self,
        src: &PlanarRef<'_>,
        src_size: FrameSize,
        dst: &mut PlanarMut<'_>,
        dst_size: FrameSize,
    ) -> Result<(), ScaleError>;

    /// Interleaves separate `U`/`V` planes into one chroma plane and copies
    /// luma.
    ///
    /// # Errors
    /// Returns [`ScaleError`] when geometry does not fit the slices.
    fn planar_to_interleaved(
        &self,
        src: &PlanarRef<'_>,
        dst: &mut SemiPlanarMut<'_>,
        size: FrameSize,
        format: PixelFormat,
    ) -> Result<(), ScaleError>;
}

/// Portable scaler working directly on byte slices.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareScaler;

impl SoftwareScaler {
    /// Creates a software scaler.
    pub fn new() -> Self {
        Self
    }
}

impl ScaleService for SoftwareScaler {
    fn interleaved_to_planar(
        &self,
        src: &SemiPlanar<'_>,
        dst: &mut PlanarMut<'_>,
        size: FrameSize,
        format: PixelFormat,
    ) -> Result<(), ScaleError> {
        check_size(size)?;
        let (width, height) = (size.width as usize, size.height as usize);
        let (pairs, chroma_rows) = (width.div_ceil(2), height.div_ceil(2));

        require_plane("source luma", src.luma.len(), src.pitch, width, height)?;
        require_plane("source chroma", src.chroma.len(), src.pitch, pairs * 2, chroma_rows)?;
        require_plane("planar y", dst.y.len(), dst.y_stride, width, height)?;
        require_plane("planar u", dst.u.len(), dst.uv_stride, pairs, chroma_rows)?;
        require_plane("planar v", dst.v.len(), dst.uv_stride, pairs, chroma_rows)?;

        copy_plane(src.luma, src.pitch, dst.y, dst.y_stride, width, height);

        let (u_index, v_index) = if format.u_first() { (0, 1) } else { (1, 0) };
        for row in 0..chroma_rows {
            let src_row = &src.chroma[row * src.pitch..row * src.pitch + pairs * 2];
            let u_row = &mut dst.u[row * dst.uv_stride..row * dst.uv_stride + pairs];
            let v_row = &mut dst.v[row * dst.uv_stride..row * dst.uv_stride + pairs];
            for (pair, sample) in src_row.chunks_exact(2).enumerate() {
                u_row[pair] = sample[u_index];
                v_row[pair] = sample[v_index];
            }
        }

        Ok(())
    }

    fn scale_planar_bilinear(
        &self,
        src: &PlanarRef<'_>,
        src_size: FrameSize,
        dst: &mut PlanarMut<'_>,
        dst_size: FrameSize,
    ) -> Result<(), ScaleError> {
        check_size(src_size)?;
        check_size(dst_size)?;

        let src_luma = PlaneGeometry::luma(src_size);
        let dst_luma = PlaneGeometry::luma(dst_size);
        let src_chroma = PlaneGeometry::chroma(src_size);
        let dst_chroma = PlaneGeometry::chroma(dst_size);

        require_plane("source y", src.y.len(), src.y_stride, src_luma.width, src_luma.height)?;
        require_plane("source u", src.u.len(), src.uv_stride, src_chroma.width, src_chroma.height)?;
        require_plane("source v", src.v.len(), src.uv_stride, src_chroma.width, src_chroma.height)?;
        require_plane("target y", dst.y.len(), dst.y_stride, dst_luma.width, dst_luma.height)?;
        require_plane("target u", dst.u.len(), dst.uv_stride, dst_chroma.width, dst_chroma.height)?;
        require_plane("target v", dst.v.len(), dst.uv_stride, dst_chroma.width, dst_chroma.height)?;

        scale_plane_bilinear(src.y, src.y_stride, src_luma, dst.y, dst.y_stride, dst_luma);
        scale_plane_bilinear(src.u, src.uv_stride, src_chroma, dst.u, dst.uv_stride, dst_chroma);
        scale_plane_bilinear(src.v, src.uv_stride, src_chroma, dst.v, dst.uv_stride, dst_chroma);

        Ok(())
    }

    fn planar_to_interleaved(
        &self,
        src: &PlanarRef<'_>,
        dst: &mut SemiPlanarMut<'_>,
        size: FrameSize,
        format: PixelFormat,
    ) -> Result<(), ScaleError> {
        check_size(size)?;
        let (width, height) = (size.width as usize, size.height as usize);
        let (pairs, chroma_rows) = (width.div_ceil(2), height.div_ceil(2));

        require_plane("planar y", src.y.len(), src.y_stride, width, height)?;
        require_plane("planar u", src.u.len(), src.uv_stride, pairs, chroma_rows)?;
        require_plane("planar v", src.v.len(), src.uv_stride, pairs, chroma_rows)?;
        require_plane("target luma", dst.luma.len(), dst.pitch, width, height)?;
        require_plane("target chroma", dst.chroma.len(), dst.pitch, pairs * 2, chroma_rows)?;

        copy_plane(src.y, src.y_stride, dst.luma, dst.pitch, width, height);

        let (u_index, v_index) = if format.u_first() { (0, 1) } else { (1, 0) };
        for row in 0..chroma_rows {
            let u_row = &src.u[row * src.uv_stride..row * src.uv_stride + pairs];
            let v_row = &src.v[row * src.uv_stride..row * src.uv_stride + pairs];
            let dst_row = &mut dst.chroma[row * dst.pitch..row * dst.pitch + pairs * 2];
            for (pair, sample) in dst_row.chunks_exact_mut(2).enumerate() {
                sample[u_index] = u_row[pair];
                sample[v_index] = v_row[pair];
            }
        }

        Ok(())
    }
}

/// Which collaborator operation a [`ScriptedScaler`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleStage {
    /// [`ScaleService::interleaved_to_planar`].
    InterleavedToPlanar,
    /// [`ScaleService::scale_planar_bilinear`].
    ScalePlanar,
    /// [`ScaleService::planar_to_interleaved`].
    PlanarToInterleaved,
}

/// Per-operation call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScaleCalls {
    /// Interleaved-to-planar calls.
    pub to_planar: u32,
    /// Bilinear scale calls.
    pub scale: u32,
    /// Planar-to-interleaved calls.
    pub to_interleaved: u32,
}

/// Deterministic wrapper around [`SoftwareScaler`] for test and CI usage.
///
/// Counts calls and can fail one stage with a chosen result code.
#[derive(Debug, Default)]
pub struct ScriptedScaler {
    inner: SoftwareScaler,
    fail_at: Option<(ScaleStage, i32)>,
    calls: Mutex<ScaleCalls>,
}

impl ScriptedScaler {
    /// Creates a wrapper that never fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a wrapper that fails `stage` with backend code `code`.
    pub fn failing_at(stage: ScaleStage, code: i32) -> Self {
        Self {
            fail_at: Some((stage, code)),
            ..Self::default()
        }
    }

    /// Returns a snapshot of the call counters.
    pub fn calls(&self) -> ScaleCalls {
        self.calls
            .lock()
            .map(|calls| *calls)
            .unwrap_or_default()
    }

    fn enter(&self, stage: ScaleStage) -> Result<(), ScaleError> {
        let mut calls = self.calls.lock().map_err(|_| ScaleError::Backend {
            code: -100,
            message: "scripted scaler lock poisoned".to_string(),
        })?;
        match stage {
            ScaleStage::InterleavedToPlanar => calls.to_planar += 1,
            ScaleStage::ScalePlanar => calls.scale += 1,
            ScaleStage::PlanarToInterleaved => calls.to_interleaved += 1,
        }

        match self.fail_at {
            Some((failing, code)) if failing == stage => Err(ScaleError::Backend {
                code,
                message: format!("scripted failure at {stage:?}"),
            }),
            _ => Ok(()),
        }
    }
}

impl ScaleService for ScriptedScaler {
    fn interleaved_to_planar(
        &self,
        src: &SemiPlanar<'_>,
        dst: &mut PlanarMut<'_>,
        size: FrameSize,
        format: PixelFormat,
    ) -> Result<(), ScaleError> {
        self.enter(ScaleStage::InterleavedToPlanar)?;
        self.inner.interleaved_to_planar(src, dst, size, format)
    }

    fn scale_planar_bilinear(
        &self,
        src: &PlanarRef<'_>,
        src_size: FrameSize,
        dst: &mut PlanarMut<'_>,
        dst_size: FrameSize,
    ) -> Result<(), ScaleError> {
        self.enter(ScaleStage::ScalePlanar)?;
        self.inner.scale_planar_bilinear(src, src_size, dst, dst_size)
    }

    fn planar_to_interleaved(
        &self,
        src: &PlanarRef<'_>,
        dst: &mut SemiPlanarMut<'_>,
        size: FrameSize,
        format: PixelFormat,
    ) -> Result<(), ScaleError> {
        self.enter(ScaleStage::PlanarToInterleaved)?;
        self.inner.planar_to_interleaved(src, dst, size, format)
    }
}

#[derive(Debug, Clone, Copy)]
struct PlaneGeometry {
    width: usize,
    height: usize,
}

impl PlaneGeometry {
    fn luma(size: FrameSize) -> Self {
        Self {
            width: size.width as usize,
            height: size.height as usize,
        }
    }

    fn chroma(size: FrameSize) -> Self {
        Self {
            width: (size.width as usize).div_ceil(2),
            height: (size.height as usize).div_ceil(2),
        }
    }
}

fn check_size(size: FrameSize) -> Result<(), ScaleError> {
    if size.width == 0 || size.height == 0 {
        return Err(ScaleError::InvalidArgument(format!(
            "frame size {}x{} must be non-zero",
            size.width, size.height
        )));
    }
    Ok(())
}

fn require_plane(
    plane: &'static str,
    actual: usize,
    stride: usize,
    width: usize,
    rows: usize,
) -> Result<(), ScaleError> {
    if stride < width {
        return Err(ScaleError::InvalidArgument(format!(
            "{plane} stride {stride} is narrower than {width}"
        )));
    }

    let required = stride * rows.saturating_sub(1) + width;
    if actual < required {
        return Err(ScaleError::PlaneTooSmall {
            plane,
            required,
            actual,
        });
    }
    Ok(())
}

fn copy_plane(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    width: usize,
    height: usize,
) {
    for row in 0..height {
        dst[row * dst_stride..row * dst_stride + width]
            .copy_from_slice(&src[row * src_stride..row * src_stride + width]);
    }
}

/// Source tap pair and 8-bit weight of the far tap for one output index.
#[derive(Debug, Clone, Copy)]
struct Tap {
    near: usize,
    far: usize,
    weight: u32,
}

/// Maps every output index to its two source taps, sampling pixel centres.
fn taps(src_len: usize, dst_len: usize) -> Vec<Tap> {
    let last = src_len - 1;
    (0..dst_len)
        .map(|index| {
            // 16.16 fixed-point centre of output pixel `index` in source space.
            let centre = ((2 * index as u64 + 1) * src_len as u64 * 65_536) / (2 * dst_len as u64);
            let position = centre.saturating_sub(32_768);
            let near = ((position >> 16) as usize).min(last);
            Tap {
                near,
                far: (near + 1).min(last),
                weight: ((position >> 8) & 0xff) as u32,
            }
        })
        .collect()
}

fn scale_plane_bilinear(
    src: &[u8],
    src_stride: usize,
    src_geometry: PlaneGeometry,
    dst: &mut [u8],
    dst_stride: usize,
    dst_geometry: PlaneGeometry,
) {
    if src_geometry.width == dst_geometry.width && src_geometry.height == dst_geometry.height {
        copy_plane(
            src,
            src_stride,
            dst,
            dst_stride,
            dst_geometry.width,
            dst_geometry.height,
        );
        return;
    }

    let columns = taps(src_geometry.width, dst_geometry.width);
    let rows = taps(src_geometry.height, dst_geometry.height);

    for (dst_row, row_tap) in rows.iter().enumerate() {
        let top = &src[row_tap.near * src_stride..];
        let bottom = &src[row_tap.far * src_stride..];
        let out = &mut dst[dst_row * dst_stride..dst_row * dst_stride + dst_geometry.width];
        let fy = row_tap.weight;

        for (pixel, column) in out.iter_mut().zip(&columns) {
            let fx = column.weight;
            let upper = u32::from(top[column.near]) * (256 - fx) + u32::from(top[column.far]) * fx;
            let lower =
                u32::from(bottom[column.near]) * (256 - fx) + u32::from(bottom[column.far]) * fx;
            *pixel = ((upper * (256 - fy) + lower * fy + 32_768) >> 16) as u8;
        }
    }
}
