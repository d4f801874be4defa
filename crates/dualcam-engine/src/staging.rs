//! Plane-offset bookkeeping for the downscale pipeline.
//!
//! All offsets derive from aligned row pitches, never from raw widths.

use dualcam_core::{ImageDescriptor, SemiPlanar, SemiPlanarMut, SynthesisError};
use dualcam_scale::{PlanarMut, PlanarRef};

/// Tightly packed I420 layout for an image of `rows` luma rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct I420Layout {
    y_stride: usize,
    uv_stride: usize,
    rows: usize,
    chroma_rows: usize,
}

impl I420Layout {
    /// Layout with luma pitch `pitch` and the descriptor's visible height.
    pub(crate) fn for_descriptor(descriptor: &ImageDescriptor) -> Self {
        let pitch = descriptor.row_pitch();
        let rows = descriptor.height as usize;
        Self {
            y_stride: pitch,
            uv_stride: pitch.div_ceil(2),
            rows,
            chroma_rows: rows.div_ceil(2),
        }
    }

    pub(crate) fn y_len(&self) -> usize {
        self.y_stride * self.rows
    }

    /// Length of one of the two chroma planes.
    pub(crate) fn chroma_len(&self) -> usize {
        self.uv_stride * self.chroma_rows
    }

    pub(crate) fn total_len(&self) -> usize {
        self.y_len() + 2 * self.chroma_len()
    }

    /// Returns `true` when luma fits `luma_len` and both chroma planes fit
    /// `chroma_len` back to back.
    pub(crate) fn fits(&self, luma_len: usize, chroma_len: usize) -> bool {
        self.y_len() <= luma_len && 2 * self.chroma_len() <= chroma_len
    }

    /// Read-only planes with `Y` in `luma` and `U`, `V` consecutive in
    /// `chroma`.
    pub(crate) fn planes<'a>(
        &self,
        luma: &'a [u8],
        chroma: &'a [u8],
    ) -> Result<PlanarRef<'a>, SynthesisError> {
        let y = luma
            .get(..self.y_len())
            .ok_or(SynthesisError::InvalidParameter)?;
        let uv = chroma
            .get(..2 * self.chroma_len())
            .ok_or(SynthesisError::InvalidParameter)?;
        let (u, v) = uv.split_at(self.chroma_len());

        Ok(PlanarRef {
            y,
            u,
            v,
            y_stride: self.y_stride,
            uv_stride: self.uv_stride,
        })
    }

    /// Mutable counterpart of [`I420Layout::planes`].
    pub(crate) fn planes_mut<'a>(
        &self,
        luma: &'a mut [u8],
        chroma: &'a mut [u8],
    ) -> Result<PlanarMut<'a>, SynthesisError> {
        let y_len = self.y_len();
        let chroma_len = self.chroma_len();
        let y = luma
            .get_mut(..y_len)
            .ok_or(SynthesisError::InvalidParameter)?;
        let uv = chroma
            .get_mut(..2 * chroma_len)
            .ok_or(SynthesisError::InvalidParameter)?;
        let (u, v) = uv.split_at_mut(chroma_len);

        Ok(PlanarMut {
            y,
            u,
            v,
            y_stride: self.y_stride,
            uv_stride: self.uv_stride,
        })
    }

    /// Planes laid out contiguously in one buffer.
    pub(crate) fn contiguous<'a>(&self, buffer: &'a [u8]) -> Result<PlanarRef<'a>, SynthesisError> {
        if buffer.len() < self.y_len() {
            return Err(SynthesisError::InvalidParameter);
        }
        let (luma, chroma) = buffer.split_at(self.y_len());
        self.planes(luma, chroma)
    }

    /// Mutable counterpart of [`I420Layout::contiguous`].
    pub(crate) fn contiguous_mut<'a>(
        &self,
        buffer: &'a mut [u8],
    ) -> Result<PlanarMut<'a>, SynthesisError> {
        if buffer.len() < self.y_len() {
            return Err(SynthesisError::InvalidParameter);
        }
        let (luma, chroma) = buffer.split_at_mut(self.y_len());
        self.planes_mut(luma, chroma)
    }
}

/// Caller memory holding the front frame during downscale.
///
/// The frame is staged into scratch, converted to I420 inside this memory,
/// resized back into scratch and finally re-interleaved here at target size.
#[derive(Debug)]
pub(crate) enum FrontFrame<'a> {
    /// One packed buffer: luma plane followed by chroma plane.
    Packed(&'a mut [u8]),
    /// Separately addressed luma and chroma planes.
    Planes {
        luma: &'a mut [u8],
        chroma: &'a mut [u8],
    },
}

impl FrontFrame<'_> {
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            FrontFrame::Packed(buffer) => buffer.is_empty(),
            FrontFrame::Planes { luma, chroma } => luma.is_empty() || chroma.is_empty(),
        }
    }

    /// Checks every later step fits before any byte is written.
    pub(crate) fn check_fits(
        &self,
        front: &ImageDescriptor,
        scaled: &ImageDescriptor,
        intermediate: &I420Layout,
    ) -> Result<(), SynthesisError> {
        let fits = match self {
            FrontFrame::Packed(buffer) => {
                buffer.len() >= front.packed_len()
                    && buffer.len() >= scaled.packed_len()
                    && intermediate.fits(front.luma_plane_len(), front.chroma_plane_len())
            }
            FrontFrame::Planes { luma, chroma } => {
                luma.len() >= front.luma_plane_len()
                    && chroma.len() >= front.chroma_plane_len()
                    && luma.len() >= scaled.luma_plane_len()
                    && chroma.len() >= scaled.chroma_plane_len()
                    && intermediate.fits(luma.len(), chroma.len())
            }
        };

        if fits {
            Ok(())
        } else {
            Err(SynthesisError::InvalidParameter)
        }
    }

    /// Copies the interleaved front frame into `scratch` as one packed frame.
    pub(crate) fn stage_into(&self, scratch: &mut [u8], front: &ImageDescriptor) {
        let luma_len = front.luma_plane_len();
        let chroma_len = front.chroma_plane_len();
        match self {
            FrontFrame::Packed(buffer) => {
                scratch[..luma_len + chroma_len].copy_from_slice(&buffer[..luma_len + chroma_len]);
            }
            FrontFrame::Planes { luma, chroma } => {
                scratch[..luma_len].copy_from_slice(&luma[..luma_len]);
                scratch[luma_len..luma_len + chroma_len].copy_from_slice(&chroma[..chroma_len]);
            }
        }
    }

    /// Intermediate I420 planes inside caller memory.
    pub(crate) fn intermediate_mut(
        &mut self,
        layout: &I420Layout,
        front: &ImageDescriptor,
    ) -> Result<PlanarMut<'_>, SynthesisError> {
        match self {
            FrontFrame::Packed(buffer) => {
                let (luma, chroma) = buffer.split_at_mut(front.luma_plane_len());
                layout.planes_mut(luma, chroma)
            }
            FrontFrame::Planes { luma, chroma } => layout.planes_mut(luma, chroma),
        }
    }

    /// Read-only view of [`FrontFrame::intermediate_mut`].
    pub(crate) fn intermediate(
        &self,
        layout: &I420Layout,
        front: &ImageDescriptor,
    ) -> Result<PlanarRef<'_>, SynthesisError> {
        match self {
            FrontFrame::Packed(buffer) => {
                let (luma, chroma) = buffer.split_at(front.luma_plane_len());
                layout.planes(luma, chroma)
            }
            FrontFrame::Planes { luma, chroma } => layout.planes(luma, chroma),
        }
    }

    /// Interleaved output frame at the scaled geometry.
    pub(crate) fn output(
        &mut self,
        scaled: &ImageDescriptor,
    ) -> Result<SemiPlanarMut<'_>, SynthesisError> {
        match self {
            FrontFrame::Packed(buffer) => SemiPlanarMut::from_packed(buffer, scaled),
            FrontFrame::Planes { luma, chroma } => Ok(SemiPlanarMut {
                luma: &mut **luma,
                chroma: &mut **chroma,
                pitch: scaled.row_pitch(),
            }),
        }
    }
}

/// Splits staged scratch bytes into the interleaved front frame.
pub(crate) fn staged_frame<'a>(
    scratch: &'a [u8],
    front: &ImageDescriptor,
) -> Result<SemiPlanar<'a>, SynthesisError> {
    let staged = scratch
        .get(..front.packed_len())
        .ok_or(SynthesisError::InvalidParameter)?;
    SemiPlanar::from_packed(staged, front)
}
