//! Errors surfaced by the hit-test path.

/// Failure of a single frame's hit test. The frame loop skips picking for
/// that frame; the next pointer move tries again.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PickError {
    #[error("Pick target unavailable: {0}")]
    TargetUnavailable(String),
    #[error("Pick framebuffer incomplete (status 0x{0:x})")]
    IncompleteTarget(u32),
    #[error("Pixel readback failed (GL error 0x{0:x})")]
    Readback(u32),
    #[error("Pixel readback returned a non-finite position")]
    NonFiniteReadback,
    #[error("Pointer ({x}, {y}) is outside the {width}x{height} pick target")]
    PointerOutside {
        x: f32,
        y: f32,
        width: u32,
        height: u32,
    },
}
