use thiserror::Error;

/// Failures the engine reports to its host.
///
/// Drawing operations never produce these: off-canvas brush and fill input is
/// clipped instead. An empty undo/redo stack is not an error either, it is the
/// `false` return of [`crate::CanvasEngine::undo`] / [`crate::CanvasEngine::redo`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    /// Raw pixel data does not describe a `width x height` RGBA image.
    #[error("pixel data is {actual} bytes but a {width}x{height} RGBA canvas needs {expected}")]
    ShapeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Explicit pixel accessor called outside the canvas.
    #[error("pixel ({x}, {y}) is outside the {width}x{height} canvas")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("unknown filter id {0}")]
    UnknownFilter(u8),

    #[error("unknown filter name `{0}`")]
    UnknownFilterName(String),
}
