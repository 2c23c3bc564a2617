//! Behavioural properties of the public engine façade.

use canvas_engine::{BrushConfig, CanvasEngine, CanvasError, EngineConfig, FilterKind};

fn gradient(width: u32, height: u32) -> Vec<u8> {
    let mut px = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            px.extend_from_slice(&[(x * 7) as u8, (y * 11) as u8, (x * y) as u8, 200]);
        }
    }
    px
}

#[test]
fn fresh_canvas_exports_zeros() {
    let engine = CanvasEngine::new(13, 9);
    let out = engine.export();
    assert_eq!(out.len(), 13 * 9 * 4);
    assert!(out.iter().all(|&b| b == 0));
}

#[test]
fn load_then_export_round_trips() {
    let mut engine = CanvasEngine::new(1, 1);
    let px = gradient(20, 10);
    engine.load(&px, 20, 10).unwrap();
    assert_eq!(engine.export(), px);
    assert_eq!(engine.pixels(), px.as_slice());
}

#[test]
fn mismatched_load_leaves_canvas_untouched() {
    let mut engine = CanvasEngine::new(4, 4);
    engine.load(&gradient(4, 4), 4, 4).unwrap();
    let before = engine.export();

    let err = engine.load(&[0; 15], 2, 2).unwrap_err();
    assert!(matches!(err, CanvasError::ShapeMismatch { actual: 15, expected: 16, .. }));
    assert_eq!(engine.export(), before);
    assert_eq!((engine.width(), engine.height()), (4, 4));
}

#[test]
fn undo_redo_is_lossless_for_every_tool() {
    let mut engine = CanvasEngine::new(24, 24);
    engine.load(&gradient(24, 24), 24, 24).unwrap();
    let brush = BrushConfig::new(5.0, 0.6, 0.7, [10, 220, 90]);

    let mut states = vec![engine.export()];
    engine.apply_brush(2.0, 3.0, 20.0, 18.0, &brush, false);
    engine.end_stroke();
    states.push(engine.export());
    engine.apply_brush(12.0, 12.0, 4.0, 20.0, &brush, true);
    engine.end_stroke();
    states.push(engine.export());
    engine.flood_fill(0, 23, &brush);
    states.push(engine.export());
    engine.apply_filter(FilterKind::Blur, 0.6);
    states.push(engine.export());
    engine.clear();
    states.push(engine.export());

    for expected in states.iter().rev().skip(1) {
        assert!(engine.undo());
        assert_eq!(&engine.export(), expected);
    }
    assert!(!engine.undo());

    for expected in states.iter().skip(1) {
        assert!(engine.redo());
        assert_eq!(&engine.export(), expected);
    }
    assert!(!engine.redo());
}

#[test]
fn empty_history_returns_false_and_changes_nothing() {
    let mut engine = CanvasEngine::new(3, 3);
    assert!(!engine.undo());
    assert!(!engine.redo());
    assert!(engine.export().iter().all(|&b| b == 0));
}

#[test]
fn new_mutation_discards_redo() {
    let mut engine = CanvasEngine::new(8, 8);
    engine.apply_filter(FilterKind::Brightness, 0.5);
    assert!(engine.undo());
    assert!(engine.can_redo());

    engine.flood_fill(1, 1, &BrushConfig::solid(1.0, [1, 2, 3]));
    assert!(!engine.can_redo());
    assert!(!engine.redo());
}

#[test]
fn uniform_canvas_fills_completely() {
    let mut engine = CanvasEngine::new(10, 10);
    let out = engine.flood_fill(5, 5, &BrushConfig::solid(1.0, [90, 80, 70]));
    assert_eq!(out.painted, 100);
    assert!(engine.export().chunks_exact(4).all(|p| p == [90, 80, 70, 255]));
}

#[test]
fn fill_respects_tolerance_and_connectivity() {
    // left half near-black, right half white, one near-black island on the right
    let mut px = Vec::new();
    for y in 0..6u32 {
        for x in 0..12u32 {
            let v = if x < 6 || (x == 9 && y == 3) { (x % 3) as u8 } else { 255 };
            px.extend_from_slice(&[v, v, v, 255]);
        }
    }
    let mut engine = CanvasEngine::new(1, 1);
    engine.load(&px, 12, 6).unwrap();

    let out = engine.flood_fill_with_tolerance(0, 0, &BrushConfig::solid(1.0, [255, 0, 0]), 2);
    assert_eq!(out.painted, 36);
    assert_eq!(engine.pixel(5, 5).unwrap(), [255, 0, 0, 255]);
    // island is within tolerance but not connected
    assert_eq!(engine.pixel(9, 3).unwrap(), [0, 0, 0, 255]);

    engine.undo();
    let out = engine.flood_fill_with_tolerance(0, 0, &BrushConfig::solid(1.0, [255, 0, 0]), 1);
    assert!(out.painted < 36);
}

#[test]
fn invert_twice_restores_rgb() {
    let mut engine = CanvasEngine::new(1, 1);
    let px = gradient(9, 7);
    engine.load(&px, 9, 7).unwrap();
    engine.apply_filter(FilterKind::Invert, 1.0);
    assert_ne!(engine.export(), px);
    engine.apply_filter(FilterKind::Invert, 1.0);
    assert_eq!(engine.export(), px);
}

#[test]
fn filters_never_touch_alpha() {
    let mut px = gradient(10, 10);
    for (i, a) in px.iter_mut().skip(3).step_by(4).enumerate() {
        *a = (i * 37 % 256) as u8;
    }
    for &kind in FilterKind::all() {
        for intensity in [0.0, 0.3, 1.0, 2.5, -1.0] {
            let mut engine = CanvasEngine::new(1, 1);
            engine.load(&px, 10, 10).unwrap();
            engine.apply_filter(kind, intensity);
            let out = engine.export();
            for (a, b) in out.chunks_exact(4).zip(px.chunks_exact(4)) {
                assert_eq!(a[3], b[3], "{kind} at {intensity}");
            }
        }
    }
}

#[test]
fn hard_opaque_stamp_sets_exact_color() {
    let mut engine = CanvasEngine::new(20, 20);
    engine.load(&gradient(20, 20), 20, 20).unwrap();
    let brush = BrushConfig::new(4.0, 0.0, 1.0, [12, 34, 56]);
    engine.apply_brush(10.0, 10.0, 10.0, 10.0, &brush, false);
    engine.end_stroke();
    for (x, y) in [(10, 10), (12, 10), (10, 7), (8, 12)] {
        assert_eq!(engine.pixel(x, y).unwrap(), [12, 34, 56, 255]);
    }
}

#[test]
fn erase_strictly_lowers_alpha_under_the_brush() {
    let mut engine = CanvasEngine::new(16, 16);
    engine.load(&[180; 16 * 16 * 4], 16, 16).unwrap();
    let brush = BrushConfig::new(3.0, 0.5, 0.4, [0, 0, 0]);
    engine.apply_brush(8.0, 8.0, 8.0, 8.0, &brush, true);

    let centre = engine.pixel(8, 8).unwrap();
    assert!(centre[3] < 180);
    assert_eq!(&centre[..3], &[180, 180, 180]);
    assert_eq!(engine.pixel(0, 0).unwrap(), [180; 4]);
}

#[test]
fn history_depth_is_bounded() {
    let config = EngineConfig {
        max_history_depth: 4,
        ..EngineConfig::default()
    };
    let mut engine = CanvasEngine::with_config(6, 6, config);
    for i in 0..10 {
        engine.flood_fill(0, 0, &BrushConfig::solid(1.0, [i, i, i]));
        assert!(engine.history().undo_count() <= 4);
    }
    let mut undone = 0;
    while engine.undo() {
        undone += 1;
    }
    assert_eq!(undone, 4);
    // oldest surviving undo point is the state after the sixth fill
    assert_eq!(engine.pixel(0, 0).unwrap(), [5, 5, 5, 255]);
}

#[test]
fn drag_across_and_beyond_the_edge_is_one_step() {
    let mut engine = CanvasEngine::new(32, 32);
    let brush = BrushConfig::from_diameter(24.0, 0.5, 0.85, [255, 92, 92]);
    let path = [(-40.0, 5.0), (10.0, 10.0), (30.0, 40.0), (80.0, 80.0)];
    for pair in path.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        engine.apply_brush(x0, y0, x1, y1, &brush, false);
    }
    engine.end_stroke();

    assert_eq!(engine.history().undo_count(), 1);
    assert!(engine.pixel(10, 10).unwrap()[3] > 0);
    engine.undo();
    assert!(engine.export().iter().all(|&b| b == 0));
}
