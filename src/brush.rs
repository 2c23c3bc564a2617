// ============================================================================
// BRUSH RASTERIZER: soft round stamps along a segment, draw or erase
// ============================================================================

use crate::pixel_buffer::{CHANNELS, DirtyRect, PixelBuffer, Rgba, Snapshot};

/// Smallest radius a brush may have. Keeps the sampling step above a quarter
/// pixel so a segment never explodes into millions of stamps.
pub const MIN_RADIUS: f32 = 0.5;
pub const MAX_RADIUS: f32 = 4096.0;

/// Per-operation brush settings. Values are sanitized on construction, so a
/// `BrushConfig` in hand is always in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushConfig {
    radius: f32,
    softness: f32,
    opacity: f32,
    color: [u8; 3],
}

impl BrushConfig {
    /// `radius` is clamped to `[MIN_RADIUS, MAX_RADIUS]`, `softness` and
    /// `opacity` to `[0, 1]`. NaN falls back to the lower bound.
    pub fn new(radius: f32, softness: f32, opacity: f32, color: [u8; 3]) -> Self {
        Self {
            radius: sanitize(radius, MIN_RADIUS, MAX_RADIUS),
            softness: sanitize(softness, 0.0, 1.0),
            opacity: sanitize(opacity, 0.0, 1.0),
            color,
        }
    }

    /// Build from a UI "size" slider, which is a diameter.
    pub fn from_diameter(size: f32, softness: f32, opacity: f32, color: [u8; 3]) -> Self {
        Self::new(size / 2.0, softness, opacity, color)
    }

    /// Hard-edged, fully opaque brush.
    pub fn solid(radius: f32, color: [u8; 3]) -> Self {
        Self::new(radius, 0.0, 1.0, color)
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn softness(&self) -> f32 {
        self.softness
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn color(&self) -> [u8; 3] {
        self.color
    }

    /// Brush color with full alpha, as written by hard fills.
    pub fn opaque_rgba(&self) -> Rgba {
        [self.color[0], self.color[1], self.color[2], 255]
    }

    /// Distance between consecutive stamps along a segment.
    pub fn spacing(&self) -> f32 {
        self.radius * 0.5
    }

    /// Falloff weight at `dist` pixels from the stamp centre.
    pub fn coverage(&self, dist: f32) -> f32 {
        coverage(dist, self.radius, self.softness)
    }
}

fn sanitize(v: f32, min: f32, max: f32) -> f32 {
    if v.is_nan() { min } else { v.clamp(min, max) }
}

/// Linear falloff: 1 inside `radius * (1 - softness)`, 0 at `radius` and beyond.
/// `softness == 0` gives a hard disc.
pub fn coverage(dist: f32, radius: f32, softness: f32) -> f32 {
    if dist > radius {
        return 0.0;
    }
    let solid = radius * (1.0 - softness);
    if dist <= solid {
        return 1.0;
    }
    let fade = radius - solid;
    if fade <= f32::EPSILON {
        return 0.0;
    }
    ((radius - dist) / fade).clamp(0.0, 1.0)
}

/// Straight-alpha source-over of `color` at strength `a` onto `dst`.
///
/// For an opaque destination this is exactly `src * a + dst * (1 - a)` per
/// channel; for translucent destinations the color is weighted by the
/// destination's own alpha so painting on transparency doesn't pull in black.
#[inline]
fn blend_over(color: [u8; 3], a: f32, dst: &[u8]) -> Rgba {
    let da = dst[3] as f32 / 255.0;
    let out_a = a + da * (1.0 - a);
    if out_a <= f32::EPSILON {
        return [dst[0], dst[1], dst[2], 0];
    }
    let keep = da * (1.0 - a);
    let mix = |src: u8, d: u8| -> u8 {
        ((src as f32 * a + d as f32 * keep) / out_a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    [
        mix(color[0], dst[0]),
        mix(color[1], dst[1]),
        mix(color[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}

/// Scale an alpha value down by `(1 - a)`. Floors, so any positive strength
/// on a non-transparent pixel removes at least one step.
#[inline]
fn erase_alpha(alpha: u8, a: f32) -> u8 {
    (alpha as f32 * (1.0 - a)).floor().clamp(0.0, 255.0) as u8
}

/// Clip the segment `p0 -> p1` to the closed box `[min, max]` (Liang–Barsky).
fn clip_segment(
    p0: (f32, f32),
    p1: (f32, f32),
    min: (f32, f32),
    max: (f32, f32),
) -> Option<((f32, f32), (f32, f32))> {
    let dx = p1.0 - p0.0;
    let dy = p1.1 - p0.1;
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    for (p, q) in [
        (-dx, p0.0 - min.0),
        (dx, max.0 - p0.0),
        (-dy, p0.1 - min.1),
        (dy, max.1 - p0.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (p0.0 + t0 * dx, p0.1 + t0 * dy),
        (p0.0 + t1 * dx, p0.1 + t1 * dy),
    ))
}

/// One open drag, from pointer-down to pointer-up.
///
/// Every pixel is recomposited from its pre-stroke value using the strongest
/// contribution any stamp of this stroke has given it, so overlapping stamps
/// never build up past the brush opacity.
pub struct Stroke {
    base: Snapshot,
    coverage: Vec<f32>,
    erase: bool,
    stamps: usize,
}

impl Stroke {
    /// `base` must be a snapshot of the buffer the stroke will paint on, taken
    /// before the first segment.
    pub fn new(base: Snapshot, erase: bool) -> Self {
        let pixel_count = base.width() as usize * base.height() as usize;
        Self {
            base,
            coverage: vec![0.0; pixel_count],
            erase,
            stamps: 0,
        }
    }

    pub fn is_erase(&self) -> bool {
        self.erase
    }

    /// Stamps applied so far, clipped-away ones excluded.
    pub fn stamp_count(&self) -> usize {
        self.stamps
    }

    /// Rasterize one segment of the drag. Returns the region that may have
    /// changed, or `None` when the segment lies entirely off the canvas.
    pub fn apply_segment(
        &mut self,
        buffer: &mut PixelBuffer,
        from: (f32, f32),
        to: (f32, f32),
        brush: &BrushConfig,
    ) -> Option<DirtyRect> {
        if buffer.width() != self.base.width() || buffer.height() != self.base.height() {
            log::warn!(
                "stroke base is {}x{} but canvas is {}x{}; segment dropped",
                self.base.width(),
                self.base.height(),
                buffer.width(),
                buffer.height()
            );
            return None;
        }
        if ![from.0, from.1, to.0, to.1].iter().all(|v| v.is_finite()) {
            log::warn!("ignoring non-finite brush segment {:?} -> {:?}", from, to);
            return None;
        }
        if buffer.is_empty() {
            return None;
        }

        let r = brush.radius();
        let (start, end) = clip_segment(
            from,
            to,
            (-r, -r),
            (buffer.width() as f32 - 1.0 + r, buffer.height() as f32 - 1.0 + r),
        )?;

        let len = (end.0 - start.0).hypot(end.1 - start.1);
        if len <= f32::EPSILON {
            return self.stamp(buffer, start.0, start.1, brush);
        }
        let steps = (len / brush.spacing()).ceil().max(1.0) as usize;

        let mut dirty = None;
        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let cx = start.0 + (end.0 - start.0) * t;
            let cy = start.1 + (end.1 - start.1) * t;
            dirty = DirtyRect::merge(dirty, self.stamp(buffer, cx, cy, brush));
        }
        dirty
    }

    fn stamp(
        &mut self,
        buffer: &mut PixelBuffer,
        cx: f32,
        cy: f32,
        brush: &BrushConfig,
    ) -> Option<DirtyRect> {
        let r = brush.radius();
        let w = buffer.width() as i64;
        let h = buffer.height() as i64;
        let min_x = ((cx - r).floor() as i64).max(0);
        let max_x = ((cx + r).ceil() as i64).min(w - 1);
        let min_y = ((cy - r).floor() as i64).max(0);
        let max_y = ((cy + r).ceil() as i64).min(h - 1);
        if min_x > max_x || min_y > max_y {
            return None;
        }
        self.stamps += 1;

        let width = buffer.width() as usize;
        let opacity = brush.opacity();
        let color = brush.color();
        let base = self.base.as_raw();
        let dst = buffer.raw_mut();

        for y in min_y..=max_y {
            let dy = y as f32 - cy;
            for x in min_x..=max_x {
                let dx = x as f32 - cx;
                let a = brush.coverage((dx * dx + dy * dy).sqrt()) * opacity;
                if a <= 0.0 {
                    continue;
                }
                let pi = y as usize * width + x as usize;
                if a <= self.coverage[pi] {
                    continue;
                }
                self.coverage[pi] = a;

                let o = pi * CHANNELS;
                let before = &base[o..o + CHANNELS];
                if self.erase {
                    dst[o..o + 3].copy_from_slice(&before[..3]);
                    dst[o + 3] = erase_alpha(before[3], a);
                } else {
                    dst[o..o + CHANNELS].copy_from_slice(&blend_over(color, a, before));
                }
            }
        }

        DirtyRect::from_min_max(
            min_x as u32,
            min_y as u32,
            max_x as u32 + 1,
            max_y as u32 + 1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke_on(buffer: &PixelBuffer, erase: bool) -> Stroke {
        Stroke::new(buffer.snapshot(), erase)
    }

    #[test]
    fn config_is_sanitized() {
        let b = BrushConfig::new(-3.0, 2.0, f32::NAN, [1, 2, 3]);
        assert_eq!(b.radius(), MIN_RADIUS);
        assert_eq!(b.softness(), 1.0);
        assert_eq!(b.opacity(), 0.0);
        assert_eq!(BrushConfig::from_diameter(24.0, 0.5, 0.85, [0; 3]).radius(), 12.0);
    }

    #[test]
    fn hard_coverage_is_a_disc() {
        assert_eq!(coverage(0.0, 4.0, 0.0), 1.0);
        assert_eq!(coverage(4.0, 4.0, 0.0), 1.0);
        assert_eq!(coverage(4.01, 4.0, 0.0), 0.0);
    }

    #[test]
    fn soft_coverage_falls_off_linearly() {
        // solid core radius 2, fade 2..4
        assert_eq!(coverage(1.5, 4.0, 0.5), 1.0);
        assert!((coverage(3.0, 4.0, 0.5) - 0.5).abs() < 1e-6);
        assert_eq!(coverage(4.0, 4.0, 0.5), 0.0);
        // fully feathered: centre is still full strength
        assert_eq!(coverage(0.0, 4.0, 1.0), 1.0);
        assert!((coverage(1.0, 4.0, 1.0) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn opaque_hard_stamp_writes_exact_color() {
        let mut buf = PixelBuffer::new(16, 16);
        buf.fill([10, 200, 30, 255]);
        let brush = BrushConfig::solid(3.0, [255, 0, 128]);
        let mut stroke = stroke_on(&buf, false);
        let dirty = stroke.apply_segment(&mut buf, (8.0, 8.0), (8.0, 8.0), &brush);

        assert_eq!(buf.get_pixel(8, 8).unwrap(), [255, 0, 128, 255]);
        assert_eq!(stroke.stamp_count(), 1);
        let dirty = dirty.unwrap();
        assert!(dirty.x <= 5 && dirty.max_x() >= 12);
        // untouched outside the disc
        assert_eq!(buf.get_pixel(0, 0).unwrap(), [10, 200, 30, 255]);
    }

    #[test]
    fn painting_on_transparency_keeps_brush_color() {
        let mut buf = PixelBuffer::new(8, 8);
        let brush = BrushConfig::new(2.0, 0.0, 0.5, [200, 100, 50]);
        let mut stroke = stroke_on(&buf, false);
        stroke.apply_segment(&mut buf, (4.0, 4.0), (4.0, 4.0), &brush);
        assert_eq!(buf.get_pixel(4, 4).unwrap(), [200, 100, 50, 128]);
    }

    #[test]
    fn overlapping_stamps_do_not_exceed_opacity() {
        let mut buf = PixelBuffer::new(32, 8);
        let brush = BrushConfig::new(3.0, 0.0, 0.5, [0, 0, 255]);
        let mut stroke = stroke_on(&buf, false);
        stroke.apply_segment(&mut buf, (2.0, 4.0), (28.0, 4.0), &brush);
        stroke.apply_segment(&mut buf, (28.0, 4.0), (2.0, 4.0), &brush);

        assert!(stroke.stamp_count() > 10);
        for x in 2..=28 {
            assert_eq!(buf.get_pixel(x, 4).unwrap()[3], 128, "x = {x}");
        }
    }

    #[test]
    fn fast_segment_leaves_no_gaps() {
        let mut buf = PixelBuffer::new(200, 10);
        let brush = BrushConfig::solid(1.0, [255, 255, 255]);
        let mut stroke = stroke_on(&buf, false);
        stroke.apply_segment(&mut buf, (0.0, 5.0), (199.0, 5.0), &brush);
        for x in 0..200 {
            assert_eq!(buf.get_pixel(x, 5).unwrap()[3], 255, "gap at x = {x}");
        }
    }

    #[test]
    fn erase_reduces_alpha_and_keeps_rgb() {
        let mut buf = PixelBuffer::new(8, 8);
        buf.fill([50, 60, 70, 255]);
        let brush = BrushConfig::new(2.0, 1.0, 0.3, [0, 0, 0]);
        let mut stroke = stroke_on(&buf, true);
        stroke.apply_segment(&mut buf, (4.0, 4.0), (4.0, 4.0), &brush);

        let px = buf.get_pixel(4, 4).unwrap();
        assert_eq!(&px[..3], &[50, 60, 70]);
        assert!(px[3] < 255);
        assert_eq!(px[3], 178);
    }

    #[test]
    fn off_canvas_segments_are_clipped() {
        let mut buf = PixelBuffer::new(10, 10);
        let brush = BrushConfig::solid(2.0, [255, 0, 0]);
        let mut stroke = stroke_on(&buf, false);

        assert_eq!(
            stroke.apply_segment(&mut buf, (-50.0, -50.0), (-40.0, -60.0), &brush),
            None
        );
        assert_eq!(stroke.stamp_count(), 0);

        // crosses the canvas from far outside
        let dirty = stroke
            .apply_segment(&mut buf, (-1.0e7, 5.0), (1.0e7, 5.0), &brush)
            .unwrap();
        assert_eq!((dirty.x, dirty.max_x()), (0, 10));
        for x in 0..10 {
            assert_eq!(buf.get_pixel(x, 5).unwrap(), [255, 0, 0, 255]);
        }
    }

    #[test]
    fn non_finite_coordinates_are_ignored() {
        let mut buf = PixelBuffer::new(4, 4);
        let brush = BrushConfig::solid(1.0, [1, 1, 1]);
        let mut stroke = stroke_on(&buf, false);
        assert_eq!(
            stroke.apply_segment(&mut buf, (f32::NAN, 0.0), (1.0, 1.0), &brush),
            None
        );
        assert!(buf.as_raw().iter().all(|&b| b == 0));
    }

    #[test]
    fn clip_keeps_inside_segment() {
        let clipped = clip_segment((1.0, 1.0), (3.0, 2.0), (0.0, 0.0), (10.0, 10.0));
        assert_eq!(clipped, Some(((1.0, 1.0), (3.0, 2.0))));
        let (a, b) = clip_segment((-10.0, 5.0), (20.0, 5.0), (0.0, 0.0), (10.0, 10.0)).unwrap();
        assert!(a.0.abs() < 1e-4 && (b.0 - 10.0).abs() < 1e-4);
        assert_eq!((a.1, b.1), (5.0, 5.0));
        assert_eq!(
            clip_segment((-3.0, -3.0), (-3.0, -3.0), (0.0, 0.0), (10.0, 10.0)),
            None
        );
    }
}
