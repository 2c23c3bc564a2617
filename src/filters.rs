// ============================================================================
// IMAGE FILTERS: blur, sharpen, invert, grayscale, brightness
// ============================================================================
//
// Every filter reads the whole source raster and writes a fresh one; nothing
// is mutated in place while neighbours are still being read. RGB only: alpha
// is copied through untouched by every filter.
// Rows are processed in parallel via rayon.
// ============================================================================

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::CanvasError;
use crate::pixel_buffer::CHANNELS;

/// Filter selection. Numeric ids follow declaration order (Blur = 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Blur,
    Sharpen,
    Invert,
    Grayscale,
    Brightness,
}

impl FilterKind {
    pub fn all() -> &'static [FilterKind] {
        &[
            FilterKind::Blur,
            FilterKind::Sharpen,
            FilterKind::Invert,
            FilterKind::Grayscale,
            FilterKind::Brightness,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterKind::Blur => "blur",
            FilterKind::Sharpen => "sharpen",
            FilterKind::Invert => "invert",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Brightness => "brightness",
        }
    }

    /// Intensity the editor toolbar applies when none is given.
    pub fn default_intensity(&self) -> f32 {
        match self {
            FilterKind::Brightness => 0.2,
            FilterKind::Invert | FilterKind::Grayscale => 1.0,
            FilterKind::Blur | FilterKind::Sharpen => 0.8,
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for FilterKind {
    type Error = CanvasError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        FilterKind::all()
            .get(id as usize)
            .copied()
            .ok_or(CanvasError::UnknownFilter(id))
    }
}

impl FromStr for FilterKind {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blur" => Ok(FilterKind::Blur),
            "sharpen" => Ok(FilterKind::Sharpen),
            "invert" => Ok(FilterKind::Invert),
            "grayscale" | "greyscale" | "desaturate" => Ok(FilterKind::Grayscale),
            "brightness" => Ok(FilterKind::Brightness),
            _ => Err(CanvasError::UnknownFilterName(s.to_string())),
        }
    }
}

/// Run `kind` over a raw `width x height` RGBA raster and return the result.
pub fn apply(src: &[u8], width: u32, height: u32, kind: FilterKind, intensity: f32) -> Vec<u8> {
    let intensity = if intensity.is_finite() { intensity } else { 0.0 };
    match kind {
        FilterKind::Blur => blur(src, width, height, blur_radius(intensity)),
        FilterKind::Sharpen => sharpen(src, width, height, intensity),
        FilterKind::Invert => invert(src, width, height, intensity),
        FilterKind::Grayscale => grayscale(src, width, height, intensity),
        FilterKind::Brightness => brightness(src, width, height, intensity),
    }
}

/// Largest blur radius any intensity maps to.
pub const MAX_BLUR_RADIUS: usize = 256;

/// Kernel radius for a blur of the given intensity: `max(1, round(5 * intensity))`,
/// capped at [`MAX_BLUR_RADIUS`].
pub fn blur_radius(intensity: f32) -> usize {
    (intensity * 5.0).round().clamp(1.0, MAX_BLUR_RADIUS as f32) as usize
}

// ---------------------------------------------------------------------------
//  Per-pixel transforms
// ---------------------------------------------------------------------------

/// Apply `transform` to every pixel's RGB. `transform` receives and returns
/// (r, g, b) as f32; results are rounded and clamped. Alpha is copied.
fn map_rgb<F>(src: &[u8], width: u32, height: u32, transform: F) -> Vec<u8>
where
    F: Fn(f32, f32, f32) -> (f32, f32, f32) + Sync,
{
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return src.to_vec();
    }
    let stride = w * CHANNELS;
    let mut dst = vec![0u8; src.len()];

    dst.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_in = &src[y * stride..(y + 1) * stride];
        for x in 0..w {
            let pi = x * CHANNELS;
            let (r, g, b) = transform(
                row_in[pi] as f32,
                row_in[pi + 1] as f32,
                row_in[pi + 2] as f32,
            );
            row_out[pi] = to_channel(r);
            row_out[pi + 1] = to_channel(g);
            row_out[pi + 2] = to_channel(b);
            row_out[pi + 3] = row_in[pi + 3];
        }
    });
    dst
}

#[inline]
fn to_channel(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// `lerp(original, 255 - original, intensity)`; intensity 1 is a full invert.
fn invert(src: &[u8], width: u32, height: u32, intensity: f32) -> Vec<u8> {
    let t = intensity.clamp(0.0, 1.0);
    map_rgb(src, width, height, move |r, g, b| {
        (
            lerp(r, 255.0 - r, t),
            lerp(g, 255.0 - g, t),
            lerp(b, 255.0 - b, t),
        )
    })
}

/// Blend toward Rec.601 luma (0.299 R + 0.587 G + 0.114 B).
fn grayscale(src: &[u8], width: u32, height: u32, intensity: f32) -> Vec<u8> {
    let t = intensity.clamp(0.0, 1.0);
    map_rgb(src, width, height, move |r, g, b| {
        let luma = 0.299 * r + 0.587 * g + 0.114 * b;
        (lerp(r, luma, t), lerp(g, luma, t), lerp(b, luma, t))
    })
}

/// Additive offset of `intensity * 255`, intensity clamped to [-1, 1].
fn brightness(src: &[u8], width: u32, height: u32, intensity: f32) -> Vec<u8> {
    let offset = intensity.clamp(-1.0, 1.0) * 255.0;
    map_rgb(src, width, height, move |r, g, b| {
        (r + offset, g + offset, b + offset)
    })
}

// ---------------------------------------------------------------------------
//  Separable Gaussian blur (rayon)
// ---------------------------------------------------------------------------

/// Normalized 1-D Gaussian kernel of `2 * radius + 1` taps. Sigma scales with
/// the radius so the outer taps still carry weight.
fn build_gaussian_kernel(radius: usize) -> Vec<f32> {
    if radius == 0 {
        return vec![1.0];
    }
    let sigma = (radius as f32 / 2.0).max(0.8);
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..radius * 2 + 1)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let inv = 1.0 / kernel.iter().sum::<f32>();
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Blurred RGB as f32 (3 floats per pixel). Edge samples clamp to the nearest
/// valid pixel.
fn gaussian_rgb(src: &[u8], w: usize, h: usize, radius: usize) -> Vec<f32> {
    let kernel = build_gaussian_kernel(radius);
    let r = radius as isize;

    // --- Horizontal pass (parallel by row) ---
    let mut buf_h = vec![0.0f32; w * h * 3];
    buf_h.par_chunks_mut(w * 3).enumerate().for_each(|(y, row_out)| {
        let row_in = &src[y * w * CHANNELS..(y + 1) * w * CHANNELS];
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - r).clamp(0, w as isize - 1) as usize;
                let idx = sx * CHANNELS;
                acc[0] += row_in[idx] as f32 * kv;
                acc[1] += row_in[idx + 1] as f32 * kv;
                acc[2] += row_in[idx + 2] as f32 * kv;
            }
            row_out[x * 3..x * 3 + 3].copy_from_slice(&acc);
        }
    });

    // --- Vertical pass (parallel by row) ---
    let mut buf_v = vec![0.0f32; w * h * 3];
    buf_v.par_chunks_mut(w * 3).enumerate().for_each(|(y, row_out)| {
        for x in 0..w {
            let mut acc = [0.0f32; 3];
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as isize + ki as isize - r).clamp(0, h as isize - 1) as usize;
                let idx = (sy * w + x) * 3;
                acc[0] += buf_h[idx] * kv;
                acc[1] += buf_h[idx + 1] * kv;
                acc[2] += buf_h[idx + 2] * kv;
            }
            row_out[x * 3..x * 3 + 3].copy_from_slice(&acc);
        }
    });

    buf_v
}

fn blur(src: &[u8], width: u32, height: u32, radius: usize) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return src.to_vec();
    }
    // taps past the longest side only resample the clamped edge
    let radius = radius.min(w.max(h));
    let blurred = gaussian_rgb(src, w, h, radius);
    let mut dst = src.to_vec();
    dst.par_chunks_mut(CHANNELS)
        .zip(blurred.par_chunks(3))
        .for_each(|(px, b)| {
            px[0] = to_channel(b[0]);
            px[1] = to_channel(b[1]);
            px[2] = to_channel(b[2]);
        });
    dst
}

/// Unsharp mask against a radius-1 blur: `orig + amount * (orig - blurred)`.
fn sharpen(src: &[u8], width: u32, height: u32, amount: f32) -> Vec<u8> {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return src.to_vec();
    }
    let amount = amount.max(0.0);
    let blurred = gaussian_rgb(src, w, h, 1);
    let mut dst = src.to_vec();
    dst.par_chunks_mut(CHANNELS)
        .zip(blurred.par_chunks(3))
        .for_each(|(px, b)| {
            for c in 0..3 {
                let o = px[c] as f32;
                px[c] = to_channel(o + amount * (o - b[c]));
            }
        });
    dst
}
