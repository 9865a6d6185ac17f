//! Path tessellation helpers.
//!
//! Converts vector outlines (`lyon::path::Path`) into renderer-friendly triangle meshes
//! (`crate::scene::Mesh2D`):
//! - *fill* tessellation for closed contours (glyph outlines, node discs, arrow heads)
//! - *stroke* tessellation for outlines and edges (node rings, transfer lines)
//!
//! Fonts are usually authored for non-zero winding; `TessellateOptions` exposes the rule.

use lyon::path::Path;
use lyon::tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, FillVertexConstructor,
    LineCap, StrokeOptions, StrokeTessellator, StrokeVertex, StrokeVertexConstructor,
    TessellationError, VertexBuffers,
};

use crate::scene::Mesh2D;

/// Tessellation options.
///
/// - `tolerance`: smaller => more triangles (smoother curves), larger => fewer triangles.
/// - `fill_rule`: NonZero is the usual default for fonts.
#[derive(Debug, Copy, Clone)]
pub struct TessellateOptions {
    pub tolerance: f32,
    pub fill_rule: FillRule,
}

impl Default for TessellateOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.02,
            fill_rule: FillRule::NonZero,
        }
    }
}

/// Simple affine transform for 2D points (column-vector convention).
///
/// Matrix:
/// [ a c tx ]
/// [ b d ty ]
/// [ 0 0  1 ]
#[derive(Debug, Copy, Clone)]
pub struct Affine2x3 {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Affine2x3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2x3 {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    #[inline]
    pub fn scale_translate(scale: f32, tx: f32, ty: f32) -> Self {
        Self {
            a: scale,
            b: 0.0,
            c: 0.0,
            d: scale,
            tx,
            ty,
        }
    }

    #[inline]
    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        let nx = self.a * x + self.c * y + self.tx;
        let ny = self.b * x + self.d * y + self.ty;
        (nx, ny)
    }
}

/// A vertex for tessellation output (2D position only).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TessVertex {
    pub position: [f32; 2],
}

/// Builds `TessVertex` from lyon's fill and stroke vertices.
struct TessVertexCtor {
    xf: Affine2x3,
}

impl FillVertexConstructor<TessVertex> for TessVertexCtor {
    fn new_vertex(&mut self, v: FillVertex) -> TessVertex {
        let p = v.position();
        let (x, y) = self.xf.transform_point(p.x, p.y);
        TessVertex { position: [x, y] }
    }
}

impl StrokeVertexConstructor<TessVertex> for TessVertexCtor {
    fn new_vertex(&mut self, v: StrokeVertex) -> TessVertex {
        let p = v.position();
        let (x, y) = self.xf.transform_point(p.x, p.y);
        TessVertex { position: [x, y] }
    }
}

/// Fill-tessellate a path into a `scene::Mesh2D`.
///
/// `transform` is applied to every output vertex (e.g. font units -> pt + pen offset).
pub fn tessellate_path_to_mesh(
    path: &Path,
    transform: Affine2x3,
    opts: TessellateOptions,
) -> Result<Mesh2D, TessellationError> {
    let mut tess = FillTessellator::new();
    let mut buffers: VertexBuffers<TessVertex, u16> = VertexBuffers::new();

    let fill = FillOptions::tolerance(opts.tolerance).with_fill_rule(opts.fill_rule);

    let ctor = TessVertexCtor { xf: transform };
    tess.tessellate_path(path, &fill, &mut BuffersBuilder::new(&mut buffers, ctor))?;

    Ok(mesh_from_buffers(&buffers))
}

/// Stroke-tessellate a path with the given line width (round caps).
pub fn stroke_path_to_mesh(
    path: &Path,
    line_width: f32,
    tolerance: f32,
) -> Result<Mesh2D, TessellationError> {
    let mut tess = StrokeTessellator::new();
    let mut buffers: VertexBuffers<TessVertex, u16> = VertexBuffers::new();

    let stroke = StrokeOptions::tolerance(tolerance)
        .with_line_width(line_width)
        .with_line_cap(LineCap::Round);

    let ctor = TessVertexCtor {
        xf: Affine2x3::IDENTITY,
    };
    tess.tessellate_path(path, &stroke, &mut BuffersBuilder::new(&mut buffers, ctor))?;

    Ok(mesh_from_buffers(&buffers))
}

/// Convert lyon `VertexBuffers<TessVertex, u16>` into `scene::Mesh2D`.
#[inline]
pub fn mesh_from_buffers(buffers: &VertexBuffers<TessVertex, u16>) -> Mesh2D {
    Mesh2D {
        positions: buffers.vertices.iter().map(|v| v.position).collect(),
        indices: buffers.indices.clone(),
    }
}

/// Append `src` into `dst` with index offset (u16 indices).
///
/// Returns `false` (and leaves `dst` untouched) if the merged mesh would overflow u16.
pub fn append_mesh(dst: &mut Mesh2D, src: &Mesh2D) -> bool {
    let base = dst.positions.len();
    if base + src.positions.len() > u16::MAX as usize {
        log::warn!(
            "append_mesh: dropping {} vertices (u16 index overflow)",
            src.positions.len()
        );
        return false;
    }

    dst.positions.extend_from_slice(&src.positions);

    let base_u16 = base as u16;
    dst.indices
        .extend(src.indices.iter().copied().map(|i| base_u16 + i));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use lyon::math::point;

    fn unit_square() -> Path {
        let mut b = Path::builder();
        b.begin(point(0.0, 0.0));
        b.line_to(point(1.0, 0.0));
        b.line_to(point(1.0, 1.0));
        b.line_to(point(0.0, 1.0));
        b.close();
        b.build()
    }

    #[test]
    fn fill_applies_transform() {
        let mesh = tessellate_path_to_mesh(
            &unit_square(),
            Affine2x3::scale_translate(2.0, 10.0, 0.0),
            TessellateOptions::default(),
        )
        .unwrap();

        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.positions.iter().all(|p| (10.0..=12.0).contains(&p[0])));
    }

    #[test]
    fn stroke_produces_triangles() {
        let mesh = stroke_path_to_mesh(&unit_square(), 0.1, 0.01).unwrap();
        assert!(!mesh.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);
    }

    #[test]
    fn append_offsets_indices() {
        let tri = Mesh2D {
            positions: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            indices: vec![0, 1, 2],
        };
        let mut merged = Mesh2D::default();
        assert!(append_mesh(&mut merged, &tri));
        assert!(append_mesh(&mut merged, &tri));
        assert_eq!(merged.indices, vec![0, 1, 2, 3, 4, 5]);
    }
}
