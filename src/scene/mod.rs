//! Scene graph abstractions.
//!
//! The model follows manim's mental model loosely:
//! - A scene is built out of named objects ("mobjects") arranged in a tree.
//! - A camera maps world coordinates (we use **pt**, y-up) to clip space.
//! - Renderers consume a flattened list of draw items (meshes + fill + z-order).
//!
//! Every object carries two transforms:
//! - `base_from_parent`: static placement produced by a layout pass.
//! - `motion`: the animated layer written by `anim::Timeline`.
//!
//! Rendering composes `local_from_parent = base_from_parent * motion`.
//!
//! Names are indexed scene-wide (not just for roots) so animation tracks can target
//! any node, e.g. the ring of a single regex node deep inside a tree.

pub mod geom;

use std::collections::BTreeMap;

/// 2D affine transform stored as a 3x3 matrix in column-major order.
///
/// Convention:
/// - Column vectors (x, y, 1)
/// - Composition is `world_from_local = parent * local`
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine2 {
    /// Column-major 3x3 matrix.
    pub m: [[f32; 3]; 3],
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine2 {
    pub const IDENTITY: Self = Self {
        m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
    };

    #[inline]
    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [tx, ty, 1.0]],
        }
    }

    #[inline]
    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            m: [[sx, 0.0, 0.0], [0.0, sy, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    #[inline]
    pub fn rotate(rad: f32) -> Self {
        let (s, c) = rad.sin_cos();
        Self {
            m: [[c, s, 0.0], [-s, c, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Compose transforms: `self * rhs` (rhs applies first).
    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        let a = self.m;
        let b = rhs.m;

        let mut out = [[0.0f32; 3]; 3];
        for col in 0..3 {
            for row in 0..3 {
                out[col][row] =
                    a[0][row] * b[col][0] + a[1][row] * b[col][1] + a[2][row] * b[col][2];
            }
        }
        Self { m: out }
    }

    #[inline]
    pub fn transform_point(self, x: f32, y: f32) -> (f32, f32) {
        let nx = self.m[0][0] * x + self.m[1][0] * y + self.m[2][0];
        let ny = self.m[0][1] * x + self.m[1][1] * y + self.m[2][1];
        (nx, ny)
    }

    /// Translation part (where the local origin lands in parent space).
    #[inline]
    pub fn origin(self) -> [f32; 2] {
        [self.m[2][0], self.m[2][1]]
    }

    /// Embed into a 4x4 (column-major) for GPU MVP use.
    #[inline]
    pub fn to_mat4(self) -> [[f32; 4]; 4] {
        let m = self.m;
        [
            [m[0][0], m[0][1], 0.0, m[0][2]],
            [m[1][0], m[1][1], 0.0, m[1][2]],
            [0.0, 0.0, 1.0, 0.0],
            [m[2][0], m[2][1], 0.0, m[2][2]],
        ]
    }
}

/// Axis-aligned bounding box in pt-space.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Aabb2 {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Aabb2 {
    #[inline]
    pub fn from_min_max(min: [f32; 2], max: [f32; 2]) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY, f32::INFINITY],
            max: [f32::NEG_INFINITY, f32::NEG_INFINITY],
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    #[inline]
    pub fn include_point(&mut self, p: [f32; 2]) {
        self.min[0] = self.min[0].min(p[0]);
        self.min[1] = self.min[1].min(p[1]);
        self.max[0] = self.max[0].max(p[0]);
        self.max[1] = self.max[1].max(p[1]);
    }

    #[inline]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    #[inline]
    pub fn center(&self) -> [f32; 2] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ]
    }

    #[inline]
    pub fn size(&self) -> [f32; 2] {
        [self.max[0] - self.min[0], self.max[1] - self.min[1]]
    }
}

/// Errors from parsing `#rrggbb` / `#rrggbbaa` color strings.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color must start with '#': {0:?}")]
    MissingHash(String),

    #[error("color must have 6 or 8 hex digits: {0:?}")]
    BadLength(String),

    #[error("invalid hex digits in color: {0:?}")]
    BadDigit(String),
}

/// Simple RGBA color (linear space assumed; the renderer may treat as sRGB).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Result<Self, ColorParseError> {
        let digits = s
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError::MissingHash(s.to_string()))?;
        if digits.len() != 6 && digits.len() != 8 {
            return Err(ColorParseError::BadLength(s.to_string()));
        }

        let channel = |i: usize| -> Result<f32, ColorParseError> {
            digits
                .get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .map(|v| v as f32 / 255.0)
                .ok_or_else(|| ColorParseError::BadDigit(s.to_string()))
        };

        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if digits.len() == 8 { channel(6)? } else { 1.0 },
        })
    }

    #[inline]
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Per-channel linear interpolation.
    #[inline]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

/// A renderer-agnostic CPU mesh. Positions are 2D, indices are u16.
#[derive(Debug, Clone, Default)]
pub struct Mesh2D {
    pub positions: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
}

impl Mesh2D {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }
}

/// A draw item produced by flattening the scene graph.
///
/// - `world_from_local` is fully composed for this item.
/// - `z` is painter's order; higher draws later.
#[derive(Debug, Clone)]
pub struct DrawItem2D {
    pub mesh: Mesh2D,
    pub fill: Rgba,
    pub world_from_local: Affine2,
    pub z: i32,
}

/// The animated layer of a mobject transform.
///
/// Values are absolute within the animated layer (not deltas), composed as `T * R * S`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Motion {
    pub tx: f32,
    pub ty: f32,
    pub rotate: f32,
    pub scale: f32,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            tx: 0.0,
            ty: 0.0,
            rotate: 0.0,
            scale: 1.0,
        }
    }
}

impl Motion {
    #[inline]
    pub fn transform(&self) -> Affine2 {
        Affine2::translate(self.tx, self.ty)
            .mul(Affine2::rotate(self.rotate))
            .mul(Affine2::scale(self.scale, self.scale))
    }
}

/// A "mobject": a node in the scene graph.
#[derive(Debug, Clone)]
pub struct Mobject2D {
    pub name: String,
    /// Static placement (layout output).
    pub base_from_parent: Affine2,
    /// Animated layer (timeline output).
    pub motion: Motion,
    pub z: i32,

    pub fill: Rgba,
    pub mesh: Option<Mesh2D>,

    pub children: Vec<Mobject2D>,

    /// Optional cached bounds in local space (pt).
    pub local_bounds: Option<Aabb2>,
}

impl Default for Mobject2D {
    fn default() -> Self {
        Self {
            name: "mobject".to_string(),
            base_from_parent: Affine2::IDENTITY,
            motion: Motion::default(),
            z: 0,
            fill: Rgba::WHITE,
            mesh: None,
            children: Vec::new(),
            local_bounds: None,
        }
    }
}

impl Mobject2D {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn with_mesh(mut self, mesh: Mesh2D) -> Self {
        self.mesh = Some(mesh);
        self
    }

    #[inline]
    pub fn with_fill(mut self, fill: Rgba) -> Self {
        self.fill = fill;
        self
    }

    #[inline]
    pub fn with_transform(mut self, base_from_parent: Affine2) -> Self {
        self.base_from_parent = base_from_parent;
        self
    }

    #[inline]
    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }

    #[inline]
    pub fn with_child(mut self, child: Mobject2D) -> Self {
        self.children.push(child);
        self
    }

    #[inline]
    pub fn add_child(&mut self, child: Mobject2D) {
        self.children.push(child);
    }

    #[inline]
    pub fn local_from_parent(&self) -> Affine2 {
        self.base_from_parent.mul(self.motion.transform())
    }

    /// Compute a conservative local-space AABB from the mesh and children.
    ///
    /// Child bounds are brought into this node's space by transforming their 4 corners.
    pub fn compute_local_bounds(&self) -> Aabb2 {
        let mut bounds = Aabb2::empty();

        if let Some(mesh) = &self.mesh {
            for &p in &mesh.positions {
                bounds.include_point(p);
            }
        }

        for child in &self.children {
            let child_bounds = child
                .local_bounds
                .unwrap_or_else(|| child.compute_local_bounds());
            if child_bounds.is_empty() {
                continue;
            }

            let corners = [
                [child_bounds.min[0], child_bounds.min[1]],
                [child_bounds.max[0], child_bounds.min[1]],
                [child_bounds.max[0], child_bounds.max[1]],
                [child_bounds.min[0], child_bounds.max[1]],
            ];

            let xf = child.local_from_parent();
            for c in corners {
                let (x, y) = xf.transform_point(c[0], c[1]);
                bounds.include_point([x, y]);
            }
        }

        bounds
    }

    /// Flatten this subtree into draw items, composing transforms.
    pub fn flatten(&self, world_from_parent: Affine2, out: &mut Vec<DrawItem2D>) {
        let world_from_local = world_from_parent.mul(self.local_from_parent());

        if let Some(mesh) = &self.mesh
            && !mesh.is_empty()
            && self.fill.a > 0.0
        {
            out.push(DrawItem2D {
                mesh: mesh.clone(),
                fill: self.fill,
                world_from_local,
                z: self.z,
            });
        }

        for child in &self.children {
            child.flatten(world_from_local, out);
        }
    }

    fn index_into(&self, address: &mut Vec<usize>, index: &mut BTreeMap<String, Vec<usize>>) {
        index.insert(self.name.clone(), address.clone());
        for (i, child) in self.children.iter().enumerate() {
            address.push(i);
            child.index_into(address, index);
            address.pop();
        }
    }
}

/// A simple 2D camera operating in pt-space.
///
/// - `center_pt`: the world point that maps to the center of the viewport
/// - `zoom`: scale factor (world pt -> NDC)
/// - `viewport_aspect`: width/height
#[derive(Debug, Copy, Clone)]
pub struct Camera2D {
    pub center_pt: [f32; 2],
    pub zoom: f32,
    pub viewport_aspect: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            center_pt: [0.0, 0.0],
            zoom: 1.0,
            viewport_aspect: 1.0,
        }
    }
}

impl Camera2D {
    #[inline]
    pub fn set_viewport_px(&mut self, width: u32, height: u32) {
        let w = width.max(1) as f32;
        let h = height.max(1) as f32;
        self.viewport_aspect = w / h;
    }

    #[inline]
    fn aspect_factors(&self) -> (f32, f32) {
        let ax = if self.viewport_aspect > 1.0 {
            1.0 / self.viewport_aspect
        } else {
            1.0
        };
        let ay = if self.viewport_aspect < 1.0 {
            self.viewport_aspect
        } else {
            1.0
        };
        (ax, ay)
    }

    /// Affine transform from world(pt) to clip space.
    pub fn clip_from_world(&self) -> Affine2 {
        let t = Affine2::translate(-self.center_pt[0], -self.center_pt[1]);
        let (ax, ay) = self.aspect_factors();
        let s = Affine2::scale(self.zoom * ax, self.zoom * ay);
        s.mul(t)
    }

    /// Frame the given world-space bounds into the viewport with padding.
    ///
    /// `fill_ratio` is the fraction of the viewport to occupy (e.g. 0.8).
    pub fn frame_bounds(&mut self, bounds: Aabb2, padding_pt: f32, fill_ratio: f32) {
        if bounds.is_empty() {
            return;
        }

        let mut b = bounds;
        b.min[0] -= padding_pt;
        b.min[1] -= padding_pt;
        b.max[0] += padding_pt;
        b.max[1] += padding_pt;

        self.center_pt = b.center();
        self.zoom = self.zoom_to_fit(b.size(), fill_ratio);
    }

    /// Zoom so that a box of `size` pt fits into `fill_ratio` of the viewport.
    pub fn zoom_to_fit(&self, size: [f32; 2], fill_ratio: f32) -> f32 {
        let size_x = size[0].max(1e-3);
        let size_y = size[1].max(1e-3);
        let fill = fill_ratio.clamp(0.05, 0.98);
        let (ax, ay) = self.aspect_factors();

        let zoom_x = (2.0 * fill) / (size_x * ax);
        let zoom_y = (2.0 * fill) / (size_y * ay);
        zoom_x.min(zoom_y)
    }
}

/// A top-level scene that holds mobject trees plus a scene-wide name index.
///
/// The index maps every object name to its address (root index followed by child
/// indices). Duplicate names resolve to the most recently indexed object.
#[derive(Debug, Default)]
pub struct Scene2D {
    pub camera: Camera2D,
    pub roots: Vec<Mobject2D>,
    index: BTreeMap<String, Vec<usize>>,
}

impl Scene2D {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_root(&mut self, m: Mobject2D) {
        let idx = self.roots.len();
        let mut address = vec![idx];
        m.index_into(&mut address, &mut self.index);
        self.roots.push(m);
    }

    /// Attach `child` under the named object. Returns `false` if `parent` is unknown.
    pub fn add_child(&mut self, parent: &str, child: Mobject2D) -> bool {
        let (Some(mut address), Some(slot)) = (
            self.index.get(parent).cloned(),
            self.get(parent).map(|p| p.children.len()),
        ) else {
            return false;
        };
        address.push(slot);
        child.index_into(&mut address, &mut self.index);
        if let Some(node) = self.get_mut(parent) {
            node.children.push(child);
        }
        true
    }

    /// Remove every root and forget all names.
    pub fn clear(&mut self) {
        self.roots.clear();
        self.index.clear();
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Mobject2D> {
        let address = self.index.get(name)?;
        let (first, rest) = address.split_first()?;
        let mut node = self.roots.get(*first)?;
        for &i in rest {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Mobject2D> {
        let address = self.index.get(name)?;
        let (first, rest) = address.split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for &i in rest {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    /// Fully composed world transform of the named object, evaluated now.
    pub fn world_from_local(&self, name: &str) -> Option<Affine2> {
        let address = self.index.get(name)?;
        let (first, rest) = address.split_first()?;
        let mut node = self.roots.get(*first)?;
        let mut xf = node.local_from_parent();
        for &i in rest {
            node = node.children.get(i)?;
            xf = xf.mul(node.local_from_parent());
        }
        Some(xf)
    }

    /// World-space position of the named object's local origin.
    #[inline]
    pub fn world_position(&self, name: &str) -> Option<[f32; 2]> {
        self.world_from_local(name).map(Affine2::origin)
    }

    /// World-space bounds of everything currently visible.
    pub fn world_bounds(&self) -> Aabb2 {
        let mut bounds = Aabb2::empty();
        for item in self.flatten() {
            for &p in &item.mesh.positions {
                let (x, y) = item.world_from_local.transform_point(p[0], p[1]);
                bounds.include_point([x, y]);
            }
        }
        bounds
    }

    /// Flatten the full scene into draw items. Callers typically sort by `z`.
    pub fn flatten(&self) -> Vec<DrawItem2D> {
        let mut items = Vec::new();
        for root in &self.roots {
            root.flatten(Affine2::IDENTITY, &mut items);
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(name: &str) -> Mobject2D {
        Mobject2D::new(name).with_mesh(Mesh2D {
            positions: vec![[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]],
            indices: vec![0, 1, 2, 0, 2, 3],
        })
    }

    #[test]
    fn nested_names_are_indexed() {
        let mut scene = Scene2D::new();
        scene.add_root(
            Mobject2D::new("tree")
                .with_transform(Affine2::translate(10.0, 0.0))
                .with_child(square("leaf").with_transform(Affine2::translate(0.0, -5.0))),
        );

        assert!(scene.contains("tree"));
        assert!(scene.get("leaf").is_some());
        assert_eq!(scene.world_position("leaf"), Some([10.0, -5.0]));
    }

    #[test]
    fn children_added_later_are_indexed() {
        let mut scene = Scene2D::new();
        scene.add_root(Mobject2D::new("group").with_transform(Affine2::translate(1.0, 1.0)));
        assert!(scene.add_child("group", square("late")));
        assert!(!scene.add_child("absent", square("lost")));

        assert_eq!(scene.world_position("late"), Some([1.0, 1.0]));
        assert!(!scene.contains("lost"));
    }

    #[test]
    fn motion_composes_after_base() {
        let mut scene = Scene2D::new();
        scene.add_root(square("sq").with_transform(Affine2::translate(3.0, 4.0)));
        scene.get_mut("sq").unwrap().motion.tx = 2.0;

        assert_eq!(scene.world_position("sq"), Some([5.0, 4.0]));
    }

    #[test]
    fn transparent_items_are_not_drawn() {
        let mut scene = Scene2D::new();
        scene.add_root(square("a"));
        scene.add_root(square("b").with_fill(Rgba::TRANSPARENT));

        assert_eq!(scene.flatten().len(), 1);
    }

    #[test]
    fn hex_colors_parse() {
        let c = Rgba::from_hex("#ff000080").unwrap();
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.a - 128.0 / 255.0).abs() < 1e-6);

        assert_eq!(Rgba::from_hex("#fff").unwrap_err(), ColorParseError::BadLength("#fff".into()));
        assert!(matches!(Rgba::from_hex("00ff00"), Err(ColorParseError::MissingHash(_))));
        assert!(matches!(Rgba::from_hex("#gg0000"), Err(ColorParseError::BadDigit(_))));
    }
}
