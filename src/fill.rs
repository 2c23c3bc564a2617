// ============================================================================
// FLOOD FILL: 4-connected region growing with colour tolerance
// ============================================================================
//
// The region is grown against the seed pixel's ORIGINAL colour. A separate
// visited mask decides termination, so filling with a colour that already
// appears in the region (or equals the seed) still stops.

use crate::pixel_buffer::{CHANNELS, DirtyRect, PixelBuffer, Rgba};

/// Result of a fill: how many pixels were written and the region's bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillOutcome {
    pub painted: usize,
    pub bounds: Option<DirtyRect>,
}

/// Colour distance used for fill eligibility: the largest absolute per-channel
/// difference over R, G, B and A.
#[inline(always)]
pub fn color_distance(a: Rgba, b: Rgba) -> u8 {
    let mut d = 0u8;
    for c in 0..CHANNELS {
        d = d.max(a[c].abs_diff(b[c]));
    }
    d
}

/// Fill the region connected to `(x, y)` with `color`.
///
/// A pixel joins the region when its distance to the seed colour is at most
/// `tolerance`. An out-of-bounds seed is a no-op.
pub fn flood_fill(
    buffer: &mut PixelBuffer,
    x: u32,
    y: u32,
    color: Rgba,
    tolerance: u8,
) -> FillOutcome {
    if !buffer.in_bounds(x, y) {
        return FillOutcome::default();
    }

    let w = buffer.width();
    let h = buffer.height();
    let wu = w as usize;
    let seed_idx = y as usize * wu + x as usize;

    let pixels = buffer.raw_mut();

    #[inline(always)]
    fn pix(flat: &[u8], idx: usize) -> Rgba {
        let o = idx * CHANNELS;
        [flat[o], flat[o + 1], flat[o + 2], flat[o + 3]]
    }

    let reference = pix(pixels, seed_idx);
    let matches = |p: Rgba| color_distance(p, reference) <= tolerance;

    // visited doubles as "already queued"; pixels are painted as they are popped
    let mut visited = vec![false; wu * h as usize];
    let mut stack: Vec<usize> = Vec::with_capacity(4096);
    visited[seed_idx] = true;
    stack.push(seed_idx);

    let mut painted = 0usize;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);

    while let Some(idx) = stack.pop() {
        let px = (idx % wu) as u32;
        let py = (idx / wu) as u32;

        let o = idx * CHANNELS;
        pixels[o..o + CHANNELS].copy_from_slice(&color);
        painted += 1;

        min_x = min_x.min(px);
        max_x = max_x.max(px);
        min_y = min_y.min(py);
        max_y = max_y.max(py);

        // Neighbours are tested before any of them is painted: a neighbour is
        // either unvisited (still holds its original colour) or already visited.
        let mut visit = |ni: usize, stack: &mut Vec<usize>| {
            if !visited[ni] && matches(pix(pixels, ni)) {
                visited[ni] = true;
                stack.push(ni);
            }
        };
        if px > 0 {
            visit(idx - 1, &mut stack);
        }
        if px + 1 < w {
            visit(idx + 1, &mut stack);
        }
        if py > 0 {
            visit(idx - wu, &mut stack);
        }
        if py + 1 < h {
            visit(idx + wu, &mut stack);
        }
    }

    FillOutcome {
        painted,
        bounds: DirtyRect::from_min_max(min_x, min_y, max_x + 1, max_y + 1),
    }
}
