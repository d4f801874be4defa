#![warn(missing_docs)]
//! # dualcam-core
//!
//! ## Purpose
//! Defines the pure data model shared across the `dualcam` workspace.
//!
//! ## Responsibilities
//! - Describe YUV 4:2:0 buffers ([`ImageDescriptor`], [`PixelFormat`]).
//! - Hold the caller-supplied [`SynthesisConfig`] and its JSON codec.
//! - Derive placement parity, over-range state and corrected placements.
//! - Define the engine result codes ([`SynthesisError`]).
//!
//! ## Data flow
//! Callers build a [`SynthesisConfig`] (directly, through
//! [`SynthesisConfig::uniform`], or from JSON) and hand it to the engine.
//! The engine derives [`OverRangeState`] with [`over_range_state`] and clamps
//! the placement with [`corrected_placement`] before compositing.
//!
//! ## Ownership and lifetimes
//! Configuration values are small `Copy` types; the engine keeps its own copy.
//! [`SemiPlanar`] and [`SemiPlanarMut`] only borrow caller buffers for the
//! duration of one call.
//!
//! ## Error model
//! Engine operations return [`SynthesisError`], whose [`SynthesisError::code`]
//! is the stable numeric result code. Config decoding fails with
//! [`CoreError`].
//!
//! ## Example
//! ```rust
//! use dualcam_core::{
//!     Alignment, FrameSize, OverRangeState, PixelFormat, PlacementPoint, SynthesisConfig,
//!     over_range_state,
//! };
//!
//! let config = SynthesisConfig::uniform(
//!     FrameSize::new(1920, 1080),
//!     FrameSize::new(384, 216),
//!     FrameSize::new(1920, 1080),
//!     Alignment::NONE,
//!     PlacementPoint::new(1800, 444),
//!     PixelFormat::Nv12,
//! );
//! let state = over_range_state(&config.scaled, &config.back, &config.placement);
//! assert_eq!(state, OverRangeState::XExceeds);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rounds `num` up to the next multiple of `alignment`.
///
/// Alignment values of 0 or 1 mean "no alignment" and return `num` unchanged.
/// The mask form assumes `alignment` is a power of two, as hardware strides
/// and scanlines are.
pub fn aligned_stride(num: u32, alignment: u32) -> usize {
    let num = num as usize;
    if alignment > 1 {
        let alignment = alignment as usize;
        (num + alignment - 1) & !(alignment - 1)
    } else {
        num
    }
}

/// Supported 4:2:0 semi-planar layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PixelFormat {
    /// Luma plane followed by interleaved `U,V` pairs.
    #[default]
    Nv12,
    /// Luma plane followed by interleaved `V,U` pairs.
    Nv21,
    /// Any other layout. Rejected by validation.
    Unsupported,
}

impl PixelFormat {
    /// Returns `true` for the two layouts the engine can process.
    pub fn is_supported(self) -> bool {
        !matches!(self, PixelFormat::Unsupported)
    }

    /// Returns `true` when the first byte of each chroma pair is `U`.
    pub fn u_first(self) -> bool {
        !matches!(self, PixelFormat::Nv21)
    }

    /// Returns the canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            PixelFormat::Nv12 => "nv12",
            PixelFormat::Nv21 => "nv21",
            PixelFormat::Unsupported => "unsupported",
        }
    }
}

impl From<u32> for PixelFormat {
    fn from(code: u32) -> Self {
        match code {
            0 => PixelFormat::Nv12,
            1 => PixelFormat::Nv21,
            _ => PixelFormat::Unsupported,
        }
    }
}

impl From<String> for PixelFormat {
    fn from(name: String) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "nv12" => PixelFormat::Nv12,
            "nv21" => PixelFormat::Nv21,
            _ => PixelFormat::Unsupported,
        }
    }
}

impl From<PixelFormat> for String {
    fn from(format: PixelFormat) -> Self {
        format.as_str().to_string()
    }
}

/// Plain width/height pair used by the folded configuration builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Creates a size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Row (stride) and row-count (scanline) alignment shared by a set of buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Alignment {
    /// Row byte-width alignment.
    pub stride: u32,
    /// Row count alignment.
    pub scanline: u32,
}

impl Alignment {
    /// Unpadded buffers.
    pub const NONE: Alignment = Alignment {
        stride: 0,
        scanline: 0,
    };

    /// Creates an alignment pair.
    pub const fn new(stride: u32, scanline: u32) -> Self {
        Self { stride, scanline }
    }
}

/// Geometry and layout of one 4:2:0 buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Visible width in pixels.
    pub width: u32,
    /// Visible height in pixels.
    pub height: u32,
    /// Total buffer size in bytes.
    pub buffer_size: usize,
    /// Row alignment; `0` or `1` disables padding.
    #[serde(default)]
    pub stride: u32,
    /// Row-count alignment; `0` or `1` disables padding.
    #[serde(default)]
    pub scanline: u32,
    /// Chroma interleave order.
    pub format: PixelFormat,
}

impl ImageDescriptor {
    /// Creates a descriptor whose `buffer_size` is exactly the packed size.
    pub fn packed(size: FrameSize, alignment: Alignment, format: PixelFormat) -> Self {
        let mut descriptor = Self {
            width: size.width,
            height: size.height,
            buffer_size: 0,
            stride: alignment.stride,
            scanline: alignment.scanline,
            format,
        };
        descriptor.buffer_size = descriptor.packed_len();
        descriptor
    }

    /// Bytes between the starts of two consecutive rows, in either plane.
    pub fn row_pitch(&self) -> usize {
        aligned_stride(self.width, self.stride)
    }

    /// Row count of the padded luma plane.
    pub fn aligned_rows(&self) -> usize {
        aligned_stride(self.height, self.scanline)
    }

    /// Size of the padded luma plane.
    pub fn luma_plane_len(&self) -> usize {
        self.row_pitch() * self.aligned_rows()
    }

    /// Size of the padded interleaved chroma plane.
    ///
    /// An odd row count still needs a full chroma row for its last luma row.
    pub fn chroma_plane_len(&self) -> usize {
        self.row_pitch() * self.aligned_rows().div_ceil(2)
    }

    /// Minimum bytes needed to hold the packed frame.
    pub fn packed_len(&self) -> usize {
        self.luma_plane_len() + self.chroma_plane_len()
    }

    /// Visible chroma rows (one per two luma rows, rounded up).
    pub fn chroma_rows(&self) -> usize {
        (self.height as usize).div_ceil(2)
    }

    /// Returns `true` when `buffer_size` can hold the packed frame.
    pub fn has_room_for_frame(&self) -> bool {
        self.buffer_size >= self.packed_len()
    }

    /// Returns `true` when both dimensions equal `other`'s.
    pub fn same_size(&self, other: &ImageDescriptor) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Top-left corner of the composited region inside the back image.
///
/// Parity flags are derived from the coordinates on construction and cannot
/// be set independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "PlacementCoords", into = "PlacementCoords")]
pub struct PlacementPoint {
    x: u32,
    y: u32,
    on_odd_row: bool,
    on_odd_col: bool,
}

impl PlacementPoint {
    /// Creates a placement and derives its parity flags.
    pub const fn new(x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            on_odd_row: y % 2 == 1,
            on_odd_col: x % 2 == 1,
        }
    }

    /// Column of the top-left corner.
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Row of the top-left corner.
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// `true` when `y` is odd.
    pub const fn on_odd_row(&self) -> bool {
        self.on_odd_row
    }

    /// `true` when `x` is odd.
    pub const fn on_odd_col(&self) -> bool {
        self.on_odd_col
    }
}

#[derive(Serialize, Deserialize)]
struct PlacementCoords {
    x: u32,
    y: u32,
}

impl From<PlacementCoords> for PlacementPoint {
    fn from(coords: PlacementCoords) -> Self {
        PlacementPoint::new(coords.x, coords.y)
    }
}

impl From<PlacementPoint> for PlacementCoords {
    fn from(point: PlacementPoint) -> Self {
        PlacementCoords {
            x: point.x,
            y: point.y,
        }
    }
}

/// Complete geometry/format configuration for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Front image as delivered by the caller.
    pub front: ImageDescriptor,
    /// Front image after downscaling.
    pub scaled: ImageDescriptor,
    /// Back image receiving the composited region.
    pub back: ImageDescriptor,
    /// Where the scaled front image lands in the back image.
    pub placement: PlacementPoint,
}

impl SynthesisConfig {
    /// Builds a configuration where every buffer shares one alignment and
    /// format.
    ///
    /// The scaled descriptor gets the front buffer size, since the scratch
    /// buffer stages the unscaled frame before resizing.
    pub fn uniform(
        front: FrameSize,
        scaled: FrameSize,
        back: FrameSize,
        alignment: Alignment,
        placement: PlacementPoint,
        format: PixelFormat,
    ) -> Self {
        let front = ImageDescriptor::packed(front, alignment, format);
        let mut scaled = ImageDescriptor::packed(scaled, alignment, format);
        scaled.buffer_size = front.buffer_size;
        let back = ImageDescriptor::packed(back, alignment, format);

        Self {
            front,
            scaled,
            back,
            placement,
        }
    }

    /// Bytes the engine's scratch buffer needs for this configuration.
    pub fn scratch_len(&self) -> usize {
        self.scaled.buffer_size.max(self.front.buffer_size)
    }

    /// Returns `true` when downscaling is a no-op.
    pub fn is_identity_scale(&self) -> bool {
        self.front.same_size(&self.scaled)
    }

    /// Serializes the configuration to compact JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON serialization fails.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, CoreError> {
        serde_json::to_vec(self).map_err(CoreError::Codec)
    }

    /// Deserializes a configuration from JSON bytes.
    ///
    /// # Errors
    /// Returns [`CoreError::Codec`] when JSON decoding fails.
    pub fn from_json_bytes(raw: &[u8]) -> Result<Self, CoreError> {
        serde_json::from_slice(raw).map_err(CoreError::Codec)
    }
}

/// Which back-image bounds the composited region would cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OverRangeState {
    /// Region fits.
    #[default]
    InRange,
    /// Region crosses the right edge.
    XExceeds,
    /// Region crosses the bottom edge.
    YExceeds,
    /// Region crosses both edges.
    BothExceed,
}

impl OverRangeState {
    /// Returns `true` for any state other than [`OverRangeState::InRange`].
    pub fn is_over_range(self) -> bool {
        self != OverRangeState::InRange
    }
}

/// Geometric transform applied while compositing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MirrorFlip {
    /// Straight copy.
    #[default]
    NoTransform,
    /// Columns reversed.
    HorizontalMirror,
    /// Rows reversed.
    VerticalFlip,
    /// Rows and columns reversed.
    Rotate180,
}

/// Column shift applied to the chroma write origin for a placement parity.
///
/// An odd column would start mid-pair, so the origin moves left to the pair
/// that governs the placement's 2x2 block. Row parity only selects the chroma
/// row and never shifts columns.
pub const fn chroma_column_delta(on_odd_row: bool, on_odd_col: bool) -> isize {
    match (on_odd_row, on_odd_col) {
        (true, true) => -1,
        (false, true) => -1,
        (true, false) => 0,
        (false, false) => 0,
    }
}

/// Computes the over-range state for `scaled` placed at `placement` in `back`.
///
/// An odd coordinate grows the occupied box by one so chroma blocks stay
/// whole.
pub fn over_range_state(
    scaled: &ImageDescriptor,
    back: &ImageDescriptor,
    placement: &PlacementPoint,
) -> OverRangeState {
    let extent_x = u64::from(placement.x())
        + u64::from(scaled.width)
        + u64::from(placement.on_odd_col());
    let extent_y = u64::from(placement.y())
        + u64::from(scaled.height)
        + u64::from(placement.on_odd_row());

    let x_exceeds = extent_x > u64::from(back.width);
    let y_exceeds = extent_y > u64::from(back.height);

    match (x_exceeds, y_exceeds) {
        (true, true) => OverRangeState::BothExceed,
        (true, false) => OverRangeState::XExceeds,
        (false, true) => OverRangeState::YExceeds,
        (false, false) => OverRangeState::InRange,
    }
}

/// Clamps `placement` for `state`, leaving in-range axes untouched.
///
/// The clamped coordinate is `back - scaled - 1`, one pixel of slack short of
/// the edge.
pub fn corrected_placement(
    state: OverRangeState,
    scaled: &ImageDescriptor,
    back: &ImageDescriptor,
    placement: &PlacementPoint,
) -> PlacementPoint {
    let clamp_x = || back.width.saturating_sub(scaled.width).saturating_sub(1);
    let clamp_y = || back.height.saturating_sub(scaled.height).saturating_sub(1);

    match state {
        OverRangeState::InRange => *placement,
        OverRangeState::XExceeds => PlacementPoint::new(clamp_x(), placement.y()),
        OverRangeState::YExceeds => PlacementPoint::new(placement.x(), clamp_y()),
        OverRangeState::BothExceed => PlacementPoint::new(clamp_x(), clamp_y()),
    }
}

/// Borrowed semi-planar frame: a luma plane and an interleaved chroma plane
/// sharing one row pitch.
#[derive(Debug, Clone, Copy)]
pub struct SemiPlanar<'a> {
    /// Luma bytes.
    pub luma: &'a [u8],
    /// Interleaved chroma bytes.
    pub chroma: &'a [u8],
    /// Row pitch of both planes.
    pub pitch: usize,
}

impl<'a> SemiPlanar<'a> {
    /// Splits a packed buffer laid out per `descriptor`.
    ///
    /// # Errors
    /// Returns [`SynthesisError::EmptyInput`] for an empty buffer and
    /// [`SynthesisError::InvalidParameter`] when it is shorter than the packed
    /// frame.
    pub fn from_packed(
        buffer: &'a [u8],
        descriptor: &ImageDescriptor,
    ) -> Result<Self, SynthesisError> {
        if buffer.is_empty() {
            return Err(SynthesisError::EmptyInput);
        }
        if buffer.len() < descriptor.packed_len() {
            return Err(SynthesisError::InvalidParameter);
        }

        let (luma, rest) = buffer.split_at(descriptor.luma_plane_len());
        Ok(Self {
            luma,
            chroma: &rest[..descriptor.chroma_plane_len()],
            pitch: descriptor.row_pitch(),
        })
    }
}

/// Mutable counterpart of [`SemiPlanar`].
#[derive(Debug)]
pub struct SemiPlanarMut<'a> {
    /// Luma bytes.
    pub luma: &'a mut [u8],
    /// Interleaved chroma bytes.
    pub chroma: &'a mut [u8],
    /// Row pitch of both planes.
    pub pitch: usize,
}

impl<'a> SemiPlanarMut<'a> {
    /// Splits a packed buffer laid out per `descriptor`.
    ///
    /// # Errors
    /// Same as [`SemiPlanar::from_packed`].
    pub fn from_packed(
        buffer: &'a mut [u8],
        descriptor: &ImageDescriptor,
    ) -> Result<Self, SynthesisError> {
        if buffer.is_empty() {
            return Err(SynthesisError::EmptyInput);
        }
        if buffer.len() < descriptor.packed_len() {
            return Err(SynthesisError::InvalidParameter);
        }

        let (luma, rest) = buffer.split_at_mut(descriptor.luma_plane_len());
        Ok(Self {
            luma,
            chroma: &mut rest[..descriptor.chroma_plane_len()],
            pitch: descriptor.row_pitch(),
        })
    }
}

/// Failure reported by a scaling/colour-conversion service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleError {
    /// Width, height or stride arguments are unusable.
    #[error("invalid scale arguments: {0}")]
    InvalidArgument(String),
    /// A plane slice is shorter than the geometry requires.
    #[error("{plane} plane too small: need {required} bytes, got {actual}")]
    PlaneTooSmall {
        /// Plane name.
        plane: &'static str,
        /// Bytes required.
        required: usize,
        /// Bytes available.
        actual: usize,
    },
    /// Implementation-specific failure with its own code.
    #[error("scale backend failure ({code}): {message}")]
    Backend {
        /// Non-zero backend result code.
        code: i32,
        /// Backend description.
        message: String,
    },
}

impl ScaleError {
    /// Numeric result code reported by the service.
    pub fn code(&self) -> i32 {
        match self {
            ScaleError::InvalidArgument(_) => -1,
            ScaleError::PlaneTooSmall { .. } => -2,
            ScaleError::Backend { code, .. } => *code,
        }
    }
}

/// Engine result codes. Success is `Ok`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// Operation requires an initialized engine.
    #[error("engine is not initialized")]
    NotInitialized,
    /// Scratch buffer allocation failed.
    #[error("scratch buffer allocation failed")]
    OutOfMemory,
    /// A required buffer is empty.
    #[error("input buffer is empty")]
    EmptyInput,
    /// Geometry, format or buffer length violates the configuration.
    #[error("invalid parameter")]
    InvalidParameter,
    /// A required predecessor operation has not run.
    #[error("operation called out of order")]
    OrderError,
    /// Failure forwarded from the scaling service.
    #[error(transparent)]
    Scale(#[from] ScaleError),
}

impl SynthesisError {
    /// Stable numeric result code; `0` is reserved for success.
    pub fn code(&self) -> i32 {
        match self {
            SynthesisError::NotInitialized => 1,
            SynthesisError::OutOfMemory => 2,
            SynthesisError::EmptyInput => 3,
            SynthesisError::InvalidParameter => 4,
            SynthesisError::OrderError => 5,
            SynthesisError::Scale(error) => error.code(),
        }
    }
}

/// Error type for configuration codec failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON encoding/decoding error.
    #[error("config codec failure: {0}")]
    Codec(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    //! Unit tests for geometry helpers.

    use super::*;

    fn descriptor(width: u32, height: u32) -> ImageDescriptor {
        ImageDescriptor::packed(
            FrameSize::new(width, height),
            Alignment::NONE,
            PixelFormat::Nv12,
        )
    }

    #[test]
    fn aligned_stride_is_identity_without_alignment() {
        assert_eq!(aligned_stride(1918, 0), 1918);
        assert_eq!(aligned_stride(1918, 1), 1918);
        assert_eq!(aligned_stride(1918, 64), 1920);
        assert_eq!(aligned_stride(1080, 32), 1088);
        assert_eq!(aligned_stride(64, 64), 64);
    }

    #[test]
    fn packed_descriptor_accounts_for_padding() {
        let padded = ImageDescriptor::packed(
            FrameSize::new(100, 50),
            Alignment::new(64, 16),
            PixelFormat::Nv21,
        );
        assert_eq!(padded.row_pitch(), 128);
        assert_eq!(padded.aligned_rows(), 64);
        assert_eq!(padded.luma_plane_len(), 128 * 64);
        assert_eq!(padded.buffer_size, 128 * 64 * 3 / 2);
        assert!(padded.has_room_for_frame());
    }

    #[test]
    fn odd_row_count_rounds_the_chroma_plane_up() {
        let odd = ImageDescriptor::packed(
            FrameSize::new(240, 135),
            Alignment::NONE,
            PixelFormat::Nv12,
        );
        assert_eq!(odd.luma_plane_len(), 240 * 135);
        assert_eq!(odd.chroma_rows(), 68);
        assert_eq!(odd.chroma_plane_len(), 240 * 68);
        assert_eq!(odd.packed_len(), 240 * 135 + 240 * 68);
        assert_eq!(odd.buffer_size, odd.packed_len());

        let mut short = odd;
        short.buffer_size = 240 * 135 * 3 / 2;
        assert!(!short.has_room_for_frame());

        let buffer = vec![0_u8; odd.packed_len()];
        let frame = SemiPlanar::from_packed(&buffer, &odd).expect("frame should split");
        assert_eq!(frame.chroma.len(), 240 * 68);
    }

    #[test]
    fn placement_parity_follows_coordinates() {
        for (x, y) in [(0, 0), (1, 0), (0, 1), (333, 444), (1535, 1079)] {
            let point = PlacementPoint::new(x, y);
            assert_eq!(point.on_odd_col(), x % 2 == 1);
            assert_eq!(point.on_odd_row(), y % 2 == 1);
        }
    }

    #[test]
    fn chroma_delta_only_depends_on_column_parity() {
        assert_eq!(chroma_column_delta(false, false), 0);
        assert_eq!(chroma_column_delta(true, false), 0);
        assert_eq!(chroma_column_delta(false, true), -1);
        assert_eq!(chroma_column_delta(true, true), -1);
    }

    #[test]
    fn odd_placement_grows_the_occupied_box() {
        let scaled = descriptor(4, 4);
        let back = descriptor(8, 8);

        let fits = PlacementPoint::new(4, 4);
        assert_eq!(over_range_state(&scaled, &back, &fits), OverRangeState::InRange);

        let odd_col = PlacementPoint::new(3, 4);
        assert_eq!(over_range_state(&scaled, &back, &odd_col), OverRangeState::InRange);

        let odd_edge = PlacementPoint::new(5, 3);
        assert_eq!(
            over_range_state(&scaled, &back, &odd_edge),
            OverRangeState::XExceeds
        );

        let both = PlacementPoint::new(5, 5);
        assert_eq!(
            over_range_state(&scaled, &back, &both),
            OverRangeState::BothExceed
        );
    }

    #[test]
    fn correction_clamps_only_the_exceeding_axis() {
        let scaled = descriptor(384, 216);
        let back = descriptor(1920, 1080);

        let point = PlacementPoint::new(1800, 444);
        let fixed = corrected_placement(OverRangeState::XExceeds, &scaled, &back, &point);
        assert_eq!(fixed, PlacementPoint::new(1535, 444));

        let point = PlacementPoint::new(10, 1000);
        let fixed = corrected_placement(OverRangeState::YExceeds, &scaled, &back, &point);
        assert_eq!(fixed.x(), 10);
        assert_eq!(fixed.y() + 216, 1080 - 1);
    }

    #[test]
    fn correction_saturates_when_scaled_fills_the_back() {
        let scaled = descriptor(8, 8);
        let back = descriptor(8, 8);
        let point = PlacementPoint::new(1, 1);
        let fixed = corrected_placement(OverRangeState::BothExceed, &scaled, &back, &point);
        assert_eq!(fixed, PlacementPoint::new(0, 0));
    }

    #[test]
    fn pixel_format_names_round_trip() {
        assert_eq!(PixelFormat::from("NV21".to_string()), PixelFormat::Nv21);
        assert_eq!(PixelFormat::from("yuyv".to_string()), PixelFormat::Unsupported);
        assert_eq!(PixelFormat::from(1_u32), PixelFormat::Nv21);
        assert_eq!(PixelFormat::from(7_u32), PixelFormat::Unsupported);
        assert!(!PixelFormat::Nv21.u_first());
    }

    #[test]
    fn result_codes_are_stable() {
        assert_eq!(SynthesisError::NotInitialized.code(), 1);
        assert_eq!(SynthesisError::OutOfMemory.code(), 2);
        assert_eq!(SynthesisError::EmptyInput.code(), 3);
        assert_eq!(SynthesisError::InvalidParameter.code(), 4);
        assert_eq!(SynthesisError::OrderError.code(), 5);

        let delegated = SynthesisError::from(ScaleError::Backend {
            code: -42,
            message: "boom".to_string(),
        });
        assert_eq!(delegated.code(), -42);
        assert!(delegated.to_string().contains("boom"));
    }

    #[test]
    fn packed_split_rejects_short_buffers() {
        let desc = descriptor(4, 4);
        let short = vec![0_u8; desc.packed_len() - 1];
        assert_eq!(
            SemiPlanar::from_packed(&short, &desc).unwrap_err(),
            SynthesisError::InvalidParameter
        );
        assert_eq!(
            SemiPlanar::from_packed(&[], &desc).unwrap_err(),
            SynthesisError::EmptyInput
        );

        let full = vec![0_u8; desc.packed_len()];
        let frame = SemiPlanar::from_packed(&full, &desc).expect("split should work");
        assert_eq!(frame.luma.len(), 16);
        assert_eq!(frame.chroma.len(), 8);
        assert_eq!(frame.pitch, 4);
    }
}
