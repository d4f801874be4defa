//! Engine-owned scratch memory.

use dualcam_core::SynthesisError;

/// Zero-filled buffer owned by one engine between `initialize` and `deinit`.
///
/// Dropping the value releases the memory, so replacing or clearing the
/// engine's `Option<ScratchBuffer>` is the whole teardown.
#[derive(Debug)]
pub(crate) struct ScratchBuffer {
    bytes: Vec<u8>,
}

impl ScratchBuffer {
    /// Allocates `len` zeroed bytes.
    ///
    /// # Errors
    /// Returns [`SynthesisError::OutOfMemory`] when the allocator refuses the
    /// reservation.
    pub(crate) fn allocate(len: usize) -> Result<Self, SynthesisError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(len)
            .map_err(|_| SynthesisError::OutOfMemory)?;
        bytes.resize(len, 0);
        Ok(Self { bytes })
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}
