// ============================================================================
// CANVAS ENGINE: the host-facing façade over buffer, tools and history
// ============================================================================
//
// The engine owns exactly one PixelBuffer and one HistoryManager. Every
// mutating call takes `&mut self`, records one undo point per logical gesture,
// and grows the dirty rectangle the host re-uploads from.

use crate::brush::{BrushConfig, Stroke};
use crate::config::EngineConfig;
use crate::error::CanvasError;
use crate::fill::{self, FillOutcome};
use crate::filters::{self, FilterKind};
use crate::history::HistoryManager;
use crate::pixel_buffer::{DirtyRect, PixelBuffer, Rgba};

pub struct CanvasEngine {
    buffer: PixelBuffer,
    history: HistoryManager,
    /// Open drag, if any. Its base snapshot is the gesture's undo point.
    stroke: Option<Stroke>,
    config: EngineConfig,
    dirty: Option<DirtyRect>,
}

impl std::fmt::Debug for CanvasEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasEngine")
            .field("buffer", &self.buffer)
            .field("history", &self.history)
            .field("stroke_active", &self.stroke.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl CanvasEngine {
    /// Blank, fully transparent canvas with default settings.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_config(width, height, EngineConfig::default())
    }

    pub fn with_config(width: u32, height: u32, config: EngineConfig) -> Self {
        let history = HistoryManager::new(config.max_history_depth)
            .with_memory_limit(config.max_history_bytes);
        Self {
            buffer: PixelBuffer::new(width, height),
            history,
            stroke: None,
            config,
            dirty: None,
        }
    }

    /// Take ownership of already-decoded RGBA bytes as a fresh document.
    pub fn from_raw(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        config: EngineConfig,
    ) -> Result<Self, CanvasError> {
        let buffer = PixelBuffer::from_raw(pixels, width, height)?;
        let history = HistoryManager::new(config.max_history_depth)
            .with_memory_limit(config.max_history_bytes);
        log::info!("loaded {}x{} canvas", width, height);
        Ok(Self {
            buffer,
            history,
            stroke: None,
            config,
            dirty: DirtyRect::full(width, height),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Borrow the live raster for display without copying.
    pub fn pixels(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Owned copy of the raster.
    pub fn export(&self) -> Vec<u8> {
        self.buffer.export()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Result<Rgba, CanvasError> {
        self.buffer.get_pixel(x, y)
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_stroke_active(&self) -> bool {
        self.stroke.is_some()
    }

    /// Region changed since the last call, if any.
    pub fn take_dirty_rect(&mut self) -> Option<DirtyRect> {
        self.dirty.take()
    }

    /// Replace the canvas with decoded RGBA bytes. A loaded image starts a
    /// fresh document, so history is dropped. On error nothing changes.
    pub fn load(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<(), CanvasError> {
        if let Err(e) = self.buffer.load(pixels, width, height) {
            log::warn!("load rejected: {e}");
            return Err(e);
        }
        self.stroke = None;
        self.history.clear();
        self.mark_all_dirty();
        log::info!("loaded {}x{} canvas", width, height);
        Ok(())
    }

    /// Reset to transparent black. Undoable.
    pub fn clear(&mut self) {
        self.end_stroke();
        self.history.begin_mutation(&self.buffer);
        self.buffer.clear();
        self.mark_all_dirty();
    }

    /// Paint (or erase) one segment of a drag.
    ///
    /// The first segment after `end_stroke` (or after any other mutation)
    /// opens a new gesture and records its undo point; later segments extend
    /// it. Switching between draw and erase mid-drag opens a new gesture too.
    pub fn apply_brush(
        &mut self,
        x0: f32,
        y0: f32,
        x1: f32,
        y1: f32,
        brush: &BrushConfig,
        erase: bool,
    ) {
        if self.stroke.as_ref().is_some_and(|s| s.is_erase() != erase) {
            self.end_stroke();
        }

        if self.stroke.is_none() {
            let base = self.history.begin_mutation(&self.buffer);
            log::debug!(
                "{} stroke started (radius {:.1})",
                if erase { "erase" } else { "draw" },
                brush.radius()
            );
            self.stroke = Some(Stroke::new(base, erase));
        }
        let Some(stroke) = self.stroke.as_mut() else {
            return;
        };

        let touched = stroke.apply_segment(&mut self.buffer, (x0, y0), (x1, y1), brush);
        self.dirty = DirtyRect::merge(self.dirty, touched);
    }

    /// Pointer-up: close the open drag. Harmless when none is open.
    pub fn end_stroke(&mut self) {
        if let Some(stroke) = self.stroke.take() {
            log::debug!("stroke ended after {} stamps", stroke.stamp_count());
        }
    }

    /// Flood fill with the configured tolerance.
    pub fn flood_fill(&mut self, x: u32, y: u32, brush: &BrushConfig) -> FillOutcome {
        self.flood_fill_with_tolerance(x, y, brush, self.config.fill_tolerance)
    }

    /// Fill the region connected to `(x, y)` with the brush color at full
    /// alpha. An out-of-bounds seed changes nothing and records no history.
    pub fn flood_fill_with_tolerance(
        &mut self,
        x: u32,
        y: u32,
        brush: &BrushConfig,
        tolerance: u8,
    ) -> FillOutcome {
        self.end_stroke();
        if !self.buffer.in_bounds(x, y) {
            log::debug!("fill seed ({x}, {y}) is off canvas");
            return FillOutcome::default();
        }

        self.history.begin_mutation(&self.buffer);
        let outcome = fill::flood_fill(&mut self.buffer, x, y, brush.opaque_rgba(), tolerance);
        self.dirty = DirtyRect::merge(self.dirty, outcome.bounds);
        log::debug!(
            "fill at ({x}, {y}) tolerance {tolerance}: {} pixels",
            outcome.painted
        );
        outcome
    }

    pub fn apply_filter(&mut self, kind: FilterKind, intensity: f32) {
        self.end_stroke();
        self.history.begin_mutation(&self.buffer);
        let out = filters::apply(
            self.buffer.as_raw(),
            self.buffer.width(),
            self.buffer.height(),
            kind,
            intensity,
        );
        self.buffer.replace_pixels(out);
        self.mark_all_dirty();
        log::debug!("applied {kind} at intensity {intensity}");
    }

    /// Step back one gesture. `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        self.end_stroke();
        let changed = self.history.undo(&mut self.buffer);
        if changed {
            self.mark_all_dirty();
        }
        changed
    }

    /// Step forward one undone gesture. `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        self.end_stroke();
        let changed = self.history.redo(&mut self.buffer);
        if changed {
            self.mark_all_dirty();
        }
        changed
    }

    fn mark_all_dirty(&mut self) {
        // dimensions may have changed, so the full rect replaces any partial one
        self.dirty = DirtyRect::full(self.buffer.width(), self.buffer.height());
    }
}
