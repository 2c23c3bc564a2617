// ============================================================================
// OPERATION SCRIPTS: JSON replay of engine calls for headless runs
// ============================================================================
//
// A script is a JSON array of operations tagged by "op":
//
//   [
//     { "op": "stroke", "points": [[10, 10], [80, 40]],
//       "brush": { "size": 24, "softness": 0.5, "opacity": 0.85, "color": [255, 92, 92] } },
//     { "op": "fill", "x": 5, "y": 5, "brush": { "radius": 1, "color": [0, 0, 0] } },
//     { "op": "filter", "kind": "blur", "intensity": 0.8 },
//     { "op": "undo" }
//   ]
//
// Each `stroke` is one gesture: its points are fed as consecutive segments and
// the stroke is closed afterwards.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use canvas_engine::{BrushConfig, CanvasEngine, FilterKind};

/// Brush as written in a script. Either `radius` or `size` (diameter) may be
/// given; without both the editor's default size applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(default = "default_softness")]
    pub softness: f32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default = "default_color")]
    pub color: [u8; 3],
}

fn default_softness() -> f32 {
    0.5
}

fn default_opacity() -> f32 {
    0.85
}

fn default_color() -> [u8; 3] {
    [0xff, 0x5c, 0x5c]
}

const DEFAULT_SIZE: f32 = 24.0;

impl BrushSpec {
    pub fn to_config(&self) -> BrushConfig {
        match (self.radius, self.size) {
            (Some(r), _) => BrushConfig::new(r, self.softness, self.opacity, self.color),
            (None, Some(size)) => {
                BrushConfig::from_diameter(size, self.softness, self.opacity, self.color)
            }
            (None, None) => {
                BrushConfig::from_diameter(DEFAULT_SIZE, self.softness, self.opacity, self.color)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CanvasOp {
    Stroke {
        points: Vec<[f32; 2]>,
        brush: BrushSpec,
        #[serde(default)]
        erase: bool,
    },
    Fill {
        x: u32,
        y: u32,
        brush: BrushSpec,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tolerance: Option<u8>,
    },
    Filter {
        kind: FilterKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intensity: Option<f32>,
    },
    Clear,
    Undo,
    Redo,
}

/// What a script run did, for verbose output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    pub applied: usize,
    pub filled_pixels: usize,
    /// Undo/redo calls that found an empty stack.
    pub empty_history: usize,
}

pub fn parse_script(src: &str) -> Result<Vec<CanvasOp>> {
    let ops: Vec<CanvasOp> = serde_json::from_str(src).context("malformed operation script")?;
    for (i, op) in ops.iter().enumerate() {
        if let CanvasOp::Stroke { points, .. } = op
            && points.is_empty()
        {
            bail!("operation {}: stroke has no points", i);
        }
    }
    Ok(ops)
}

/// Replay `ops` against `engine`. Any stroke still open at the end is closed.
pub fn run_script(engine: &mut CanvasEngine, ops: &[CanvasOp]) -> ScriptReport {
    let mut report = ScriptReport::default();

    for op in ops {
        match op {
            CanvasOp::Stroke {
                points,
                brush,
                erase,
            } => {
                let brush = brush.to_config();
                engine.end_stroke();
                match points.as_slice() {
                    [] => {}
                    [p] => engine.apply_brush(p[0], p[1], p[0], p[1], &brush, *erase),
                    _ => {
                        for pair in points.windows(2) {
                            let (a, b) = (pair[0], pair[1]);
                            engine.apply_brush(a[0], a[1], b[0], b[1], &brush, *erase);
                        }
                    }
                }
                engine.end_stroke();
            }
            CanvasOp::Fill {
                x,
                y,
                brush,
                tolerance,
            } => {
                let brush = brush.to_config();
                let outcome = match tolerance {
                    Some(t) => engine.flood_fill_with_tolerance(*x, *y, &brush, *t),
                    None => engine.flood_fill(*x, *y, &brush),
                };
                report.filled_pixels += outcome.painted;
            }
            CanvasOp::Filter { kind, intensity } => {
                engine.apply_filter(*kind, intensity.unwrap_or_else(|| kind.default_intensity()));
            }
            CanvasOp::Clear => engine.clear(),
            CanvasOp::Undo => {
                if !engine.undo() {
                    report.empty_history += 1;
                }
            }
            CanvasOp::Redo => {
                if !engine.redo() {
                    report.empty_history += 1;
                }
            }
        }
        report.applied += 1;
    }

    engine.end_stroke();
    report
}
