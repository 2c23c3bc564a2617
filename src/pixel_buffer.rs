// ============================================================================
// PIXEL BUFFER: owned RGBA8 raster, row-major, no padding
// ============================================================================

use std::sync::Arc;

use crate::error::CanvasError;

/// Bytes per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// One straight-alpha RGBA pixel.
pub type Rgba = [u8; 4];

/// Number of bytes a `width x height` RGBA raster occupies, or `None` if that
/// does not fit in memory addressing.
pub fn byte_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(CHANNELS)
}

/// Axis-aligned pixel rectangle. `x`/`y` are inclusive, `x + width` / `y + height`
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl DirtyRect {
    /// Build from inclusive min / exclusive max corners. Returns `None` for an
    /// empty span.
    pub fn from_min_max(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Option<Self> {
        if max_x <= min_x || max_y <= min_y {
            return None;
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }

    pub fn full(width: u32, height: u32) -> Option<Self> {
        Self::from_min_max(0, 0, width, height)
    }

    pub fn max_x(&self) -> u32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> u32 {
        self.y + self.height
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        DirtyRect {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    /// Merge `other` into an optional accumulator.
    pub fn merge(acc: Option<DirtyRect>, other: Option<DirtyRect>) -> Option<DirtyRect> {
        match (acc, other) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }
}

/// Immutable copy of a buffer's full state, used by the history stacks.
///
/// The bytes sit behind an `Arc` so an open stroke can read its pre-stroke
/// pixels from the same allocation the undo stack holds.
#[derive(Clone)]
pub struct Snapshot {
    width: u32,
    height: u32,
    pixels: Arc<[u8]>,
}

impl Snapshot {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    pub fn memory_bytes(&self) -> usize {
        self.pixels.len()
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// The live RGBA raster.
///
/// Invariant: `pixels.len() == width * height * 4` at all times. Every path
/// that swaps in new bytes validates the length first.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PixelBuffer {
    /// Fully transparent black canvas.
    ///
    /// # Panics
    /// If `width * height * 4` overflows `usize`.
    pub fn new(width: u32, height: u32) -> Self {
        let len = byte_len(width, height).unwrap_or_else(|| {
            panic!("canvas {}x{} is too large to address", width, height)
        });
        Self {
            width,
            height,
            pixels: vec![0; len],
        }
    }

    /// Take ownership of already-decoded RGBA bytes.
    pub fn from_raw(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self, CanvasError> {
        check_shape(pixels.len(), width, height)?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Replace contents and dimensions. On error the buffer is left untouched.
    pub fn load(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<(), CanvasError> {
        check_shape(pixels.len(), width, height)?;
        self.pixels = pixels.to_vec();
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Read-only view of the raw bytes, for zero-copy blits.
    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    /// Owned copy of the raw bytes.
    pub fn export(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    pub fn memory_bytes(&self) -> usize {
        self.pixels.len()
    }

    pub fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Result<Rgba, CanvasError> {
        let idx = self.checked_index(x, y)?;
        let mut px = [0u8; CHANNELS];
        px.copy_from_slice(&self.pixels[idx..idx + CHANNELS]);
        Ok(px)
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: Rgba) -> Result<(), CanvasError> {
        let idx = self.checked_index(x, y)?;
        self.pixels[idx..idx + CHANNELS].copy_from_slice(&rgba);
        Ok(())
    }

    pub fn fill(&mut self, rgba: Rgba) {
        for px in self.pixels.chunks_exact_mut(CHANNELS) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Reset every byte to zero (transparent black).
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.width,
            height: self.height,
            pixels: Arc::from(self.pixels.as_slice()),
        }
    }

    /// Restore a snapshot bit-for-bit, dimensions included.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.width = snapshot.width;
        self.height = snapshot.height;
        self.pixels = snapshot.pixels.to_vec();
    }

    /// Byte offset of an in-bounds pixel. Callers must have bounds-checked.
    #[inline]
    pub(crate) fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    pub(crate) fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Swap in a freshly computed raster of the same dimensions.
    pub(crate) fn replace_pixels(&mut self, pixels: Vec<u8>) {
        debug_assert_eq!(pixels.len(), self.pixels.len());
        if pixels.len() == self.pixels.len() {
            self.pixels = pixels;
        } else {
            log::warn!(
                "discarding {} byte raster for {}x{} canvas",
                pixels.len(),
                self.width,
                self.height
            );
        }
    }

    fn checked_index(&self, x: u32, y: u32) -> Result<usize, CanvasError> {
        if !self.in_bounds(x, y) {
            return Err(CanvasError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.index(x, y))
    }
}

fn check_shape(actual: usize, width: u32, height: u32) -> Result<(), CanvasError> {
    match byte_len(width, height) {
        Some(expected) if expected == actual => Ok(()),
        expected => Err(CanvasError::ShapeMismatch {
            width,
            height,
            expected: expected.unwrap_or(usize::MAX),
            actual,
        }),
    }
}
