//! Bounding boxes and the margin boundary clamp.

use crate::model::{CanvasConfig, Margins, Transform};
use kurbo::{Affine, Rect};

/// Affine placing a widget's local box `(0, 0, w·sx, h·sy)` on the canvas.
pub fn widget_affine(t: &Transform) -> Affine {
    Affine::translate((t.x, t.y)) * Affine::rotate(t.angle.to_radians())
}

/// Axis-aligned bounding box of a widget on the canvas, rotation and scale
/// included.
pub fn bounding_box(t: &Transform) -> Rect {
    let (w, h) = t.scaled_size();
    widget_affine(t).transform_rect_bbox(Rect::new(0.0, 0.0, w, h))
}

/// The rectangle, inset from the canvas edges by `margins`, that widgets are
/// kept inside while dragged.
pub fn margin_boundary(config: &CanvasConfig, margins: &Margins) -> Rect {
    Rect::new(
        margins.left,
        margins.top,
        (config.width - margins.right).max(margins.left),
        (config.height - margins.bottom).max(margins.top),
    )
}

/// Offset that moves `bbox` inside `boundary`.
///
/// When the box is larger than the boundary on an axis, its left/top edge
/// is aligned with the boundary's.
pub fn clamp_offset(bbox: Rect, boundary: Rect) -> (f64, f64) {
    fn axis(lo: f64, hi: f64, min: f64, max: f64) -> f64 {
        if lo < min || hi - lo > max - min {
            min - lo
        } else if hi > max {
            max - hi
        } else {
            0.0
        }
    }
    (
        axis(bbox.x0, bbox.x1, boundary.x0, boundary.x1),
        axis(bbox.y0, bbox.y1, boundary.y0, boundary.y1),
    )
}

/// Clamp a transform's position so its bounding box stays in `boundary`.
/// Returns the adjusted transform.
pub fn clamp_into(t: &Transform, boundary: Rect) -> Transform {
    let (dx, dy) = clamp_offset(bounding_box(t), boundary);
    Transform {
        x: t.x + dx,
        y: t.y + dy,
        ..*t
    }
}
