//! Raster canvas engine: an owned RGBA8 buffer plus the tools that mutate it
//! (soft brush strokes, tolerance flood fill, image filters) and a bounded
//! snapshot undo/redo history.
//!
//! The engine is host-agnostic. It never decodes or encodes images and never
//! touches the filesystem; hosts feed it raw RGBA bytes and buffer-space
//! coordinates, and pull the raster back out for display.
//!
//! ```
//! use canvas_engine::{BrushConfig, CanvasEngine, FilterKind};
//!
//! let mut engine = CanvasEngine::new(64, 64);
//! let brush = BrushConfig::new(4.0, 0.3, 1.0, [20, 40, 200]);
//! engine.apply_brush(8.0, 8.0, 40.0, 30.0, &brush, false);
//! engine.end_stroke();
//! engine.apply_filter(FilterKind::Blur, 0.4);
//! assert!(engine.undo());
//! assert_eq!(engine.export().len(), 64 * 64 * 4);
//! ```

pub mod brush;
pub mod config;
pub mod engine;
pub mod error;
pub mod fill;
pub mod filters;
pub mod history;
pub mod pixel_buffer;

pub use brush::BrushConfig;
pub use config::EngineConfig;
pub use engine::CanvasEngine;
pub use error::CanvasError;
pub use fill::FillOutcome;
pub use filters::FilterKind;
pub use history::HistoryManager;
pub use pixel_buffer::{DirtyRect, PixelBuffer, Rgba, Snapshot};
