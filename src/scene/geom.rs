//! Primitive shape meshes for diagrams (discs, rings, segments, arrow heads).
//!
//! All shapes are built as `lyon` paths and tessellated in local pt coordinates.
//! A tessellation failure degrades to an empty mesh with a warning; the object still
//! exists in the scene graph so animation tracks can address it.

use lyon::math::point;
use lyon::path::{Path, Winding};

use crate::font::tessellate::{
    Affine2x3, TessellateOptions, stroke_path_to_mesh, tessellate_path_to_mesh,
};
use crate::scene::Mesh2D;

const TOLERANCE: f32 = 0.1;

fn circle_path(center: [f32; 2], radius: f32) -> Path {
    let mut b = Path::builder();
    b.add_circle(point(center[0], center[1]), radius.max(0.01), Winding::Positive);
    b.build()
}

fn fill(path: &Path, what: &str) -> Mesh2D {
    tessellate_path_to_mesh(
        path,
        Affine2x3::IDENTITY,
        TessellateOptions {
            tolerance: TOLERANCE,
            ..Default::default()
        },
    )
    .unwrap_or_else(|e| {
        log::warn!("geom: failed to fill {what}: {e:?}");
        Mesh2D::default()
    })
}

fn stroke(path: &Path, width: f32, what: &str) -> Mesh2D {
    stroke_path_to_mesh(path, width.max(0.01), TOLERANCE).unwrap_or_else(|e| {
        log::warn!("geom: failed to stroke {what}: {e:?}");
        Mesh2D::default()
    })
}

/// Filled circle centered at the local origin.
pub fn disc(radius: f32) -> Mesh2D {
    fill(&circle_path([0.0, 0.0], radius), "disc")
}

/// Circle outline centered at the local origin; `width` straddles the radius.
pub fn ring(radius: f32, width: f32) -> Mesh2D {
    ring_at([0.0, 0.0], radius, width)
}

/// Circle outline centered at `center`.
pub fn ring_at(center: [f32; 2], radius: f32, width: f32) -> Mesh2D {
    stroke(&circle_path(center, radius), width, "ring")
}

/// Straight stroked segment between two points.
pub fn segment(from: [f32; 2], to: [f32; 2], width: f32) -> Mesh2D {
    let mut b = Path::builder();
    b.begin(point(from[0], from[1]));
    b.line_to(point(to[0], to[1]));
    b.end(false);
    stroke(&b.build(), width, "segment")
}

/// Filled triangular arrow head with its tip at `tip`, pointing along `dir`.
pub fn arrow_head(tip: [f32; 2], dir: [f32; 2], size: f32) -> Mesh2D {
    let len = (dir[0] * dir[0] + dir[1] * dir[1]).sqrt();
    if len <= f32::EPSILON {
        return Mesh2D::default();
    }
    let (ux, uy) = (dir[0] / len, dir[1] / len);
    let (px, py) = (-uy, ux);
    let back = [tip[0] - ux * size, tip[1] - uy * size];
    let half = size * 0.5;

    let mut b = Path::builder();
    b.begin(point(tip[0], tip[1]));
    b.line_to(point(back[0] + px * half, back[1] + py * half));
    b.line_to(point(back[0] - px * half, back[1] - py * half));
    b.close();
    fill(&b.build(), "arrow head")
}

/// Shorten the segment `from -> to` by `start` and `end` pt at each side.
///
/// Returns `None` if the segment is too short to survive the trim.
pub fn trim_segment(
    from: [f32; 2],
    to: [f32; 2],
    start: f32,
    end: f32,
) -> Option<([f32; 2], [f32; 2])> {
    let dx = to[0] - from[0];
    let dy = to[1] - from[1];
    let len = (dx * dx + dy * dy).sqrt();
    if len <= start + end {
        return None;
    }
    let (ux, uy) = (dx / len, dy / len);
    Some((
        [from[0] + ux * start, from[1] + uy * start],
        [to[0] - ux * end, to[1] - uy * end],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_stays_within_radius() {
        let mesh = disc(10.0);
        assert!(!mesh.is_empty());
        // Arc flattening may overshoot by up to the tolerance.
        let max = mesh
            .positions
            .iter()
            .map(|p| (p[0] * p[0] + p[1] * p[1]).sqrt())
            .fold(0.0f32, f32::max);
        assert!(max <= 10.0 + TOLERANCE, "max radius {max}");
        assert!(max >= 10.0 - TOLERANCE, "max radius {max}");
    }

    #[test]
    fn trim_shortens_both_ends() {
        let (a, b) = trim_segment([0.0, 0.0], [10.0, 0.0], 2.0, 3.0).unwrap();
        assert_eq!(a, [2.0, 0.0]);
        assert_eq!(b, [7.0, 0.0]);
        assert!(trim_segment([0.0, 0.0], [4.0, 0.0], 2.0, 3.0).is_none());
    }

    #[test]
    fn degenerate_arrow_is_empty() {
        assert!(arrow_head([0.0, 0.0], [0.0, 0.0], 8.0).is_empty());
        assert!(!arrow_head([0.0, 0.0], [1.0, 0.0], 8.0).is_empty());
    }
}
