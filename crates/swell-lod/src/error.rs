//! Initialization errors for the ocean LOD system.

/// Errors that prevent the per-frame loop from starting.
#[derive(Debug, thiserror::Error)]
pub enum OceanError {
    /// A collaborator the system cannot run without was not supplied.
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// The LOD data resolution cannot be split into geometry tiles.
    #[error(
        "lod data resolution {resolution} is not divisible by geometry down-sample factor {factor}"
    )]
    UnsupportedResolution {
        /// Configured texels per side.
        resolution: u32,
        /// Configured geometry divisor.
        factor: u32,
    },
}
