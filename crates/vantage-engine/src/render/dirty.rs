//! Deferred invalidation for render request parameters.

use bitflags::bitflags;

bitflags! {
    /// Rebuilds pending for the next reconciliation.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct DirtyParameters: u8 {
        /// Projection and tile-grid geometry.
        const SIZE = 1 << 0;
        /// Framebuffer.
        const RESOLUTION = 1 << 1;
        /// Host image buffer.
        const IMAGE = 1 << 2;
        /// Noise color uniform.
        const NOISE = 1 << 3;
    }
}

impl Default for DirtyParameters {
    fn default() -> Self {
        Self::empty()
    }
}

/// Externally settable request parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Parameter {
    Position,
    Size,
    Resolution,
    GatherImage,
    Noise,
}

impl Parameter {
    /// Flags raised whenever this parameter is set, changed or not.
    pub const fn dependencies(self) -> DirtyParameters {
        match self {
            Parameter::Position => DirtyParameters::empty(),
            Parameter::Size => DirtyParameters::SIZE,
            Parameter::Resolution => DirtyParameters::RESOLUTION.union(DirtyParameters::IMAGE),
            Parameter::GatherImage => DirtyParameters::IMAGE,
            Parameter::Noise => DirtyParameters::NOISE,
        }
    }
}

/// Accumulates flags between reconciliations.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    pending: DirtyParameters,
}

impl DirtyTracker {
    /// Starts with everything dirty so the first reconciliation builds all.
    pub fn all() -> Self {
        Self { pending: DirtyParameters::all() }
    }

    /// Records a set of `param`; returns the flags it raised.
    pub fn mark(&mut self, param: Parameter) -> DirtyParameters {
        let flags = param.dependencies();
        self.pending |= flags;
        flags
    }

    #[inline]
    pub fn pending(&self) -> DirtyParameters {
        self.pending
    }

    /// Hands the accumulated flags to the caller and clears them.
    pub fn take(&mut self) -> DirtyParameters {
        std::mem::take(&mut self.pending)
    }
}
