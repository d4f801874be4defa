#![warn(missing_docs)]
//! # dualcam-engine
//!
//! ## Purpose
//! Runs the picture-in-picture pipeline: configure, validate, correct the
//! placement, downscale the front frame and composite it into the back frame.
//!
//! ## Responsibilities
//! - Store the caller's [`SynthesisConfig`] and validate it per frame.
//! - Own the scratch buffer between [`SynthesisEngine::initialize`] and
//!   [`SynthesisEngine::deinit`].
//! - Drive the [`ScaleService`] collaborator for downscaling.
//! - Enforce call ordering (`downscale` before `composite`).
//!
//! ## Data flow
//! [`SynthesisEngine::set_configuration`] -> [`SynthesisEngine::initialize`]
//! -> per frame: [`SynthesisEngine::downscale_packed`] (validates, stages the
//! front frame in scratch, resizes in place) ->
//! [`SynthesisEngine::composite_packed`] (validates, clamps an over-range
//! placement, writes into the back frame).
//!
//! ## Ownership and lifetimes
//! The engine copies the configuration and exclusively owns its scratch
//! buffer. Frame buffers are borrowed for one call. One engine serves one
//! frame stream; run one engine per concurrent stream.
//!
//! ## Error model
//! Every operation returns [`SynthesisError`]. Collaborator failures are
//! forwarded unchanged and leave the engine un-scaled, so a following
//! composite fails with [`SynthesisError::OrderError`].
//!
//! ## Example
//! ```rust
//! use dualcam_core::{Alignment, FrameSize, PixelFormat, PlacementPoint, SynthesisConfig};
//! use dualcam_engine::SynthesisEngine;
//!
//! let config = SynthesisConfig::uniform(
//!     FrameSize::new(64, 48),
//!     FrameSize::new(16, 12),
//!     FrameSize::new(64, 48),
//!     Alignment::NONE,
//!     PlacementPoint::new(8, 8),
//!     PixelFormat::Nv12,
//! );
//! let mut engine = SynthesisEngine::default();
//! engine.set_configuration(config);
//! engine.initialize().expect("scratch allocation");
//!
//! let mut front = vec![128_u8; config.front.packed_len()];
//! let mut back = vec![16_u8; config.back.packed_len()];
//! engine.downscale_packed(&mut front).expect("downscale");
//! let stats = engine.composite_packed(&front, &mut back).expect("composite");
//! assert_eq!(stats.luma_bytes, 16 * 12);
//! ```

mod scratch;
mod staging;

use std::fmt;
use std::sync::Arc;

use dualcam_compose::{CompositeJob, CompositeStats};
use dualcam_core::{
    FrameSize, ImageDescriptor, MirrorFlip, OverRangeState, PlacementPoint, SemiPlanar,
    SemiPlanarMut, SynthesisConfig, SynthesisError, corrected_placement, over_range_state,
};
use dualcam_scale::{ScaleService, SoftwareScaler};
use tracing::{debug, warn};

use crate::scratch::ScratchBuffer;
use crate::staging::{FrontFrame, I420Layout};

/// Picture-in-picture compositing engine.
///
/// `initialized` is derived from scratch ownership: the engine is initialized
/// exactly while it holds a scratch buffer.
pub struct SynthesisEngine {
    scaler: Arc<dyn ScaleService>,
    config: Option<SynthesisConfig>,
    scratch: Option<ScratchBuffer>,
    scaled: bool,
    over_range: OverRangeState,
    mirror_flip: MirrorFlip,
}

impl fmt::Debug for SynthesisEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisEngine")
            .field("config", &self.config)
            .field("scratch_len", &self.scratch_len())
            .field("scaled", &self.scaled)
            .field("over_range", &self.over_range)
            .field("mirror_flip", &self.mirror_flip)
            .finish_non_exhaustive()
    }
}

impl Default for SynthesisEngine {
    fn default() -> Self {
        Self::new(Arc::new(SoftwareScaler::new()))
    }
}

impl SynthesisEngine {
    /// Creates an unconfigured, uninitialized engine backed by `scaler`.
    pub fn new(scaler: Arc<dyn ScaleService>) -> Self {
        Self {
            scaler,
            config: None,
            scratch: None,
            scaled: false,
            over_range: OverRangeState::InRange,
            mirror_flip: MirrorFlip::NoTransform,
        }
    }

    /// Configures and initializes in one step.
    ///
    /// # Errors
    /// Same as [`SynthesisEngine::initialize`].
    pub fn configured(
        scaler: Arc<dyn ScaleService>,
        config: SynthesisConfig,
    ) -> Result<Self, SynthesisError> {
        let mut engine = Self::new(scaler);
        engine.set_configuration(config);
        engine.initialize()?;
        Ok(engine)
    }

    /// Replaces the stored configuration. No checks run until
    /// [`SynthesisEngine::validate`].
    ///
    /// The current frame is no longer considered downscaled.
    pub fn set_configuration(&mut self, config: SynthesisConfig) {
        debug!(
            front = ?(config.front.width, config.front.height),
            scaled = ?(config.scaled.width, config.scaled.height),
            back = ?(config.back.width, config.back.height),
            x = config.placement.x(),
            y = config.placement.y(),
            "configuration set"
        );
        self.config = Some(config);
        self.scaled = false;
    }

    /// Allocates the zero-filled scratch buffer for the stored configuration.
    ///
    /// Any previous scratch buffer is released first. On success the
    /// over-range state and mirror/flip variant return to their defaults.
    ///
    /// # Errors
    /// - [`SynthesisError::OrderError`] when no configuration is set.
    /// - [`SynthesisError::OutOfMemory`] when allocation fails; the engine is
    ///   left uninitialized.
    pub fn initialize(&mut self) -> Result<(), SynthesisError> {
        let config = self.config.ok_or(SynthesisError::OrderError)?;

        self.scratch = None;
        self.scaled = false;
        let scratch = ScratchBuffer::allocate(config.scratch_len())?;
        debug!(scratch_len = scratch.len(), "engine initialized");

        self.scratch = Some(scratch);
        self.over_range = OverRangeState::InRange;
        self.mirror_flip = MirrorFlip::NoTransform;
        Ok(())
    }

    /// Releases the scratch buffer and forgets the configuration.
    ///
    /// Safe to call repeatedly and on a never-initialized engine.
    pub fn deinit(&mut self) {
        if self.scratch.take().is_some() {
            debug!("engine deinitialized");
        }
        self.config = None;
        self.scaled = false;
        self.over_range = OverRangeState::InRange;
        self.mirror_flip = MirrorFlip::NoTransform;
    }

    /// Checks the configuration and derives the over-range state for the
    /// current placement.
    ///
    /// # Errors
    /// - [`SynthesisError::NotInitialized`] before a successful
    ///   [`SynthesisEngine::initialize`].
    /// - [`SynthesisError::InvalidParameter`] when the scaled size is zero or
    ///   exceeds the front or back size, a format is unsupported, or a
    ///   descriptor's buffer size cannot hold its frame.
    pub fn validate(&mut self) -> Result<OverRangeState, SynthesisError> {
        if self.scratch.is_none() {
            return Err(SynthesisError::NotInitialized);
        }
        let config = self.config.ok_or(SynthesisError::NotInitialized)?;
        check_geometry(&config)?;

        self.over_range = over_range_state(&config.scaled, &config.back, &config.placement);
        Ok(self.over_range)
    }

    /// Moves the placement. Parity is re-derived; range is re-checked by the
    /// next [`SynthesisEngine::validate`].
    ///
    /// # Errors
    /// Returns [`SynthesisError::OrderError`] when no configuration is set.
    pub fn update_placement(&mut self, placement: PlacementPoint) -> Result<(), SynthesisError> {
        let config = self.config.as_mut().ok_or(SynthesisError::OrderError)?;
        config.placement = placement;
        Ok(())
    }

    /// Clamps the current placement back inside the back frame and returns
    /// the resulting point.
    ///
    /// The over-range state is re-detected for the current placement before
    /// clamping and left as detected afterwards. Geometry is not re-validated.
    ///
    /// # Errors
    /// Returns [`SynthesisError::OrderError`] when no configuration is set.
    pub fn fix_placement(&mut self) -> Result<PlacementPoint, SynthesisError> {
        let config = self.config.ok_or(SynthesisError::OrderError)?;
        let state = over_range_state(&config.scaled, &config.back, &config.placement);
        self.over_range = state;
        let corrected = corrected_placement(state, &config.scaled, &config.back, &config.placement);

        if corrected != config.placement {
            warn!(
                state = ?state,
                from_x = config.placement.x(),
                from_y = config.placement.y(),
                to_x = corrected.x(),
                to_y = corrected.y(),
                "placement corrected"
            );
        }
        self.update_placement(corrected)?;
        Ok(corrected)
    }

    /// Selects the geometric variant used by the next composite.
    pub fn set_mirror_flip(&mut self, mirror_flip: MirrorFlip) {
        debug!(?mirror_flip, "mirror/flip variant set");
        self.mirror_flip = mirror_flip;
    }

    /// Downscales a packed front frame in place.
    ///
    /// On success the buffer's leading bytes hold the frame laid out per the
    /// scaled descriptor.
    ///
    /// # Errors
    /// - [`SynthesisError::EmptyInput`] for an empty buffer.
    /// - Anything [`SynthesisEngine::validate`] reports.
    /// - [`SynthesisError::InvalidParameter`] when the buffer is shorter than
    ///   the front or scaled frame.
    /// - [`SynthesisError::OrderError`] when the configuration outgrew the
    ///   scratch buffer since the last initialize.
    /// - [`SynthesisError::Scale`] for collaborator failures.
    #[tracing::instrument(level = "debug", skip_all, fields(len = buffer.len()))]
    pub fn downscale_packed(&mut self, buffer: &mut [u8]) -> Result<(), SynthesisError> {
        self.downscale(FrontFrame::Packed(buffer))
    }

    /// Downscales separately addressed front luma and chroma planes in place.
    ///
    /// # Errors
    /// Same as [`SynthesisEngine::downscale_packed`], checked per plane.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(luma_len = luma.len(), chroma_len = chroma.len())
    )]
    pub fn downscale_planes(
        &mut self,
        luma: &mut [u8],
        chroma: &mut [u8],
    ) -> Result<(), SynthesisError> {
        self.downscale(FrontFrame::Planes { luma, chroma })
    }

    /// Composites the downscaled packed front frame into a packed back frame.
    ///
    /// # Errors
    /// - [`SynthesisError::EmptyInput`] when either buffer is empty.
    /// - [`SynthesisError::OrderError`] when the front frame has not been
    ///   downscaled since the last configuration change.
    /// - Anything [`SynthesisEngine::validate`] reports.
    /// - [`SynthesisError::InvalidParameter`] when a buffer is too short or
    ///   the corrected region still leaves the back frame.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(front_len = front.len(), back_len = back.len())
    )]
    pub fn composite_packed(
        &mut self,
        front: &[u8],
        back: &mut [u8],
    ) -> Result<CompositeStats, SynthesisError> {
        if front.is_empty() || back.is_empty() {
            return Err(SynthesisError::EmptyInput);
        }
        if !self.scaled {
            return Err(SynthesisError::OrderError);
        }

        let (config, job) = self.prepare_composite()?;
        let source = SemiPlanar::from_packed(front, front_layout(&config))?;
        let mut target = SemiPlanarMut::from_packed(back, &config.back)?;
        self.run_composite(&source, &mut target, &job)
    }

    /// Composites separately addressed planes.
    ///
    /// # Errors
    /// Same as [`SynthesisEngine::composite_packed`], checked per plane.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn composite_planes(
        &mut self,
        front_luma: &[u8],
        front_chroma: &[u8],
        back_luma: &mut [u8],
        back_chroma: &mut [u8],
    ) -> Result<CompositeStats, SynthesisError> {
        if front_luma.is_empty()
            || front_chroma.is_empty()
            || back_luma.is_empty()
            || back_chroma.is_empty()
        {
            return Err(SynthesisError::EmptyInput);
        }
        if !self.scaled {
            return Err(SynthesisError::OrderError);
        }

        let (config, job) = self.prepare_composite()?;
        let source = SemiPlanar {
            luma: front_luma,
            chroma: front_chroma,
            pitch: front_layout(&config).row_pitch(),
        };
        let mut target = SemiPlanarMut {
            luma: back_luma,
            chroma: back_chroma,
            pitch: config.back.row_pitch(),
        };
        self.run_composite(&source, &mut target, &job)
    }

    /// Current configuration, including any corrected placement.
    pub fn config(&self) -> Option<&SynthesisConfig> {
        self.config.as_ref()
    }

    /// Current placement.
    pub fn placement(&self) -> Option<PlacementPoint> {
        self.config.map(|config| config.placement)
    }

    /// Over-range state from the last validation.
    pub fn over_range(&self) -> OverRangeState {
        self.over_range
    }

    /// Selected geometric variant.
    pub fn mirror_flip(&self) -> MirrorFlip {
        self.mirror_flip
    }

    /// Returns `true` while the engine owns a scratch buffer.
    pub fn is_initialized(&self) -> bool {
        self.scratch.is_some()
    }

    /// Returns `true` once the current front frame has been downscaled.
    pub fn is_scaled(&self) -> bool {
        self.scaled
    }

    /// Scratch buffer size in bytes, `0` when uninitialized.
    pub fn scratch_len(&self) -> usize {
        self.scratch.as_ref().map_or(0, ScratchBuffer::len)
    }

    fn downscale(&mut self, mut frame: FrontFrame<'_>) -> Result<(), SynthesisError> {
        self.scaled = false;
        if frame.is_empty() {
            return Err(SynthesisError::EmptyInput);
        }
        self.validate()?;
        let config = self.config.ok_or(SynthesisError::NotInitialized)?;

        if config.is_identity_scale() {
            debug!("front already at target size");
            self.scaled = true;
            return Ok(());
        }

        let (front, scaled) = (config.front, config.scaled);
        let intermediate = I420Layout::for_descriptor(&front);
        let resized = I420Layout::for_descriptor(&scaled);
        frame.check_fits(&front, &scaled, &intermediate)?;

        let scratch = self
            .scratch
            .as_mut()
            .ok_or(SynthesisError::NotInitialized)?
            .as_mut_slice();
        if scratch.len() < config.scratch_len() {
            return Err(SynthesisError::OrderError);
        }
        if scratch.len() < front.packed_len() || scratch.len() < resized.total_len() {
            return Err(SynthesisError::InvalidParameter);
        }

        let scaler = self.scaler.as_ref();
        frame.stage_into(scratch, &front);
        {
            let staged = staging::staged_frame(scratch, &front)?;
            let mut planar = frame.intermediate_mut(&intermediate, &front)?;
            scaler.interleaved_to_planar(&staged, &mut planar, frame_size(&front), front.format)?;
        }
        {
            let source = frame.intermediate(&intermediate, &front)?;
            let mut target = resized.contiguous_mut(scratch)?;
            scaler.scale_planar_bilinear(
                &source,
                frame_size(&front),
                &mut target,
                frame_size(&scaled),
            )?;
        }
        {
            let source = resized.contiguous(scratch)?;
            let mut output = frame.output(&scaled)?;
            scaler.planar_to_interleaved(&source, &mut output, frame_size(&scaled), scaled.format)?;
        }

        self.scaled = true;
        debug!(
            width = scaled.width,
            height = scaled.height,
            "front frame downscaled"
        );
        Ok(())
    }

    /// Validates, corrects an over-range placement and builds the job.
    fn prepare_composite(&mut self) -> Result<(SynthesisConfig, CompositeJob), SynthesisError> {
        if self.validate()?.is_over_range() {
            self.fix_placement()?;
        }
        let config = self.config.ok_or(SynthesisError::NotInitialized)?;
        let job = CompositeJob {
            width: config.scaled.width,
            height: config.scaled.height,
            placement: config.placement,
            mirror_flip: self.mirror_flip,
            swap_chroma: front_layout(&config).format != config.back.format,
        };
        Ok((config, job))
    }

    fn run_composite(
        &self,
        source: &SemiPlanar<'_>,
        target: &mut SemiPlanarMut<'_>,
        job: &CompositeJob,
    ) -> Result<CompositeStats, SynthesisError> {
        let stats = dualcam_compose::composite(source, target, job)?;
        debug!(
            x = job.placement.x(),
            y = job.placement.y(),
            mirror_flip = ?job.mirror_flip,
            luma_bytes = stats.luma_bytes,
            chroma_bytes = stats.chroma_bytes,
            "front frame composited"
        );
        Ok(stats)
    }
}

/// Layout of the front buffer after downscale.
///
/// An identity scale leaves the buffer exactly as delivered.
fn front_layout(config: &SynthesisConfig) -> &ImageDescriptor {
    if config.is_identity_scale() {
        &config.front
    } else {
        &config.scaled
    }
}

fn frame_size(descriptor: &ImageDescriptor) -> FrameSize {
    FrameSize::new(descriptor.width, descriptor.height)
}

fn check_geometry(config: &SynthesisConfig) -> Result<(), SynthesisError> {
    let SynthesisConfig {
        front,
        scaled,
        back,
        ..
    } = config;

    let downscale_only = scaled.width <= front.width
        && scaled.height <= front.height
        && scaled.width <= back.width
        && scaled.height <= back.height;
    let non_empty = scaled.width > 0 && scaled.height > 0;
    let formats_supported = [front, scaled, back]
        .iter()
        .all(|descriptor| descriptor.format.is_supported());
    let buffers_fit = [front, scaled, back]
        .iter()
        .all(|descriptor| descriptor.has_room_for_frame());

    if downscale_only && non_empty && formats_supported && buffers_fit {
        Ok(())
    } else {
        Err(SynthesisError::InvalidParameter)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for engine state transitions.

    use dualcam_core::{Alignment, PixelFormat};

    use super::*;

    fn small_config() -> SynthesisConfig {
        SynthesisConfig::uniform(
            FrameSize::new(16, 8),
            FrameSize::new(8, 4),
            FrameSize::new(16, 8),
            Alignment::NONE,
            PlacementPoint::new(2, 2),
            PixelFormat::Nv12,
        )
    }

    #[test]
    fn initialize_requires_configuration() {
        let mut engine = SynthesisEngine::default();
        assert_eq!(engine.initialize(), Err(SynthesisError::OrderError));
        assert!(!engine.is_initialized());
    }

    #[test]
    fn validate_requires_initialization() {
        let mut engine = SynthesisEngine::default();
        engine.set_configuration(small_config());
        assert_eq!(engine.validate(), Err(SynthesisError::NotInitialized));
    }

    #[test]
    fn initialize_resets_variant_and_range() {
        let mut engine = SynthesisEngine::default();
        engine.set_configuration(small_config());
        engine.set_mirror_flip(MirrorFlip::Rotate180);
        engine.initialize().expect("initialize");
        assert_eq!(engine.mirror_flip(), MirrorFlip::NoTransform);
        assert_eq!(engine.over_range(), OverRangeState::InRange);
        assert_eq!(engine.scratch_len(), small_config().scratch_len());
    }

    #[test]
    fn upscaling_is_rejected() {
        let mut config = small_config();
        config.scaled.width = 32;
        let mut engine = SynthesisEngine::configured(Arc::new(SoftwareScaler), config)
            .expect("initialize");
        assert_eq!(engine.validate(), Err(SynthesisError::InvalidParameter));
    }

    #[test]
    fn unsupported_format_is_rejected() {
        let mut config = small_config();
        config.back.format = PixelFormat::Unsupported;
        let mut engine = SynthesisEngine::configured(Arc::new(SoftwareScaler), config)
            .expect("initialize");
        assert_eq!(engine.validate(), Err(SynthesisError::InvalidParameter));
    }

    #[test]
    fn update_placement_needs_a_configuration() {
        let mut engine = SynthesisEngine::default();
        assert_eq!(
            engine.update_placement(PlacementPoint::new(1, 1)),
            Err(SynthesisError::OrderError)
        );
    }

    #[test]
    fn set_configuration_clears_scaled_flag() {
        let config = small_config();
        let mut engine = SynthesisEngine::configured(Arc::new(SoftwareScaler), config)
            .expect("initialize");
        let mut front = vec![0_u8; config.front.packed_len()];
        engine.downscale_packed(&mut front).expect("downscale");
        assert!(engine.is_scaled());

        engine.set_configuration(config);
        assert!(!engine.is_scaled());
        assert!(engine.is_initialized());
    }

    #[test]
    fn larger_configuration_needs_reinitialization() {
        let config = small_config();
        let mut engine = SynthesisEngine::configured(Arc::new(SoftwareScaler), config)
            .expect("initialize");

        let bigger = SynthesisConfig::uniform(
            FrameSize::new(32, 16),
            FrameSize::new(8, 4),
            FrameSize::new(32, 16),
            Alignment::NONE,
            PlacementPoint::new(2, 2),
            PixelFormat::Nv12,
        );
        engine.set_configuration(bigger);
        let mut front = vec![0_u8; bigger.front.packed_len()];
        assert_eq!(
            engine.downscale_packed(&mut front),
            Err(SynthesisError::OrderError)
        );

        engine.initialize().expect("reinitialize");
        engine.downscale_packed(&mut front).expect("downscale");
    }
}
