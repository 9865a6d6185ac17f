//! Drawing regex trees and animating them.
//!
//! Every node becomes a group named by its identifier with three children: `{id}.disc`,
//! `{id}.ring` and `{id}.label`. Edges are separate objects named `{from}->{to}` under
//! the tree container `{root}.tree`, which is what [`RegexView::focus`] moves.
//!
//! Layout (y-down while measuring, flipped into the y-up scene at the end):
//! - concat/union: `[lhs, node, rhs]` in a row, top-aligned, with both children pushed
//!   down by `min_node_size + gap`
//! - unary nodes: the node centered above its child, `gap` apart
//! - leaves: one node

use std::collections::HashMap;

use crate::anim::Anim;
use crate::font::Labeler;
use crate::regex::{NodeIdx, RegexForest, Target};
use crate::scene::{Affine2, Mobject2D, Scene2D, geom};
use crate::theme::ColorTheme;

pub const REGEX_GAP: f32 = 64.0;
pub const MIN_REGEX_NODE_SIZE: f32 = 128.0;

/// Name of the scene root holding accept nodes.
pub const ACCEPTS_NAME: &str = "regex.accepts";

#[derive(Debug, Clone, PartialEq)]
pub struct RegexViewConfig {
    pub gap: f32,
    pub min_node_size: f32,
    /// Node diameter per label character, for labels too long for the minimum size.
    pub size_per_char: f32,
    pub stroke_width: f32,
    pub font_size_pt: f32,
}

impl Default for RegexViewConfig {
    fn default() -> Self {
        Self {
            gap: REGEX_GAP,
            min_node_size: MIN_REGEX_NODE_SIZE,
            size_per_char: 32.0,
            stroke_width: 4.0,
            font_size_pt: 48.0,
        }
    }
}

#[inline]
pub fn tree_name(root_id: &str) -> String {
    format!("{root_id}.tree")
}

#[inline]
pub fn ring_name(id: &str) -> String {
    format!("{id}.ring")
}

#[inline]
pub fn disc_name(id: &str) -> String {
    format!("{id}.disc")
}

#[inline]
pub fn label_name(id: &str) -> String {
    format!("{id}.label")
}

#[inline]
pub fn edge_name(from: &str, to: &str) -> String {
    format!("{from}->{to}")
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

/// Node centers of one tree, y-up, relative to the center of the tree's box.
#[derive(Debug, Clone, Default)]
pub struct TreeLayout {
    pub centers: HashMap<NodeIdx, [f32; 2]>,
    pub sizes: HashMap<NodeIdx, f32>,
    pub extent: Extent,
}

pub struct RegexView {
    pub config: RegexViewConfig,
    pub theme: ColorTheme,
    extents: HashMap<NodeIdx, Extent>,
}

impl RegexView {
    pub fn new(config: RegexViewConfig, theme: ColorTheme) -> Self {
        Self {
            config,
            theme,
            extents: HashMap::new(),
        }
    }

    /// Diameter of the node drawn for `idx`.
    pub fn node_size(&self, forest: &RegexForest, idx: NodeIdx) -> f32 {
        let chars = forest.node(idx).kind.label().chars().count() as f32;
        self.config
            .min_node_size
            .max(chars * self.config.size_per_char)
    }

    pub fn layout(&self, forest: &RegexForest, root: NodeIdx) -> TreeLayout {
        let mut extents = HashMap::new();
        let extent = self.measure(forest, root, &mut extents);

        let mut out = TreeLayout {
            extent,
            ..Default::default()
        };
        self.place(forest, root, 0.0, 0.0, &extents, &mut out);

        let (hw, hh) = (extent.width * 0.5, extent.height * 0.5);
        for c in out.centers.values_mut() {
            *c = [c[0] - hw, hh - c[1]];
        }
        out
    }

    fn measure(
        &self,
        forest: &RegexForest,
        idx: NodeIdx,
        extents: &mut HashMap<NodeIdx, Extent>,
    ) -> Extent {
        let size = self.node_size(forest, idx);
        let drop = self.config.min_node_size + self.config.gap;
        let extent = match forest.node(idx).subs.as_slice() {
            [] => Extent {
                width: size,
                height: size,
            },
            [sub] => {
                let c = self.measure(forest, *sub, extents);
                Extent {
                    width: size.max(c.width),
                    height: size + self.config.gap + c.height,
                }
            }
            [lhs, rhs, ..] => {
                let l = self.measure(forest, *lhs, extents);
                let r = self.measure(forest, *rhs, extents);
                Extent {
                    width: l.width + size + r.width,
                    height: size.max(drop + l.height).max(drop + r.height),
                }
            }
        };
        extents.insert(idx, extent);
        extent
    }

    fn place(
        &self,
        forest: &RegexForest,
        idx: NodeIdx,
        left: f32,
        top: f32,
        extents: &HashMap<NodeIdx, Extent>,
        out: &mut TreeLayout,
    ) {
        let size = self.node_size(forest, idx);
        let extent = extents.get(&idx).copied().unwrap_or_default();
        let drop = self.config.min_node_size + self.config.gap;
        out.sizes.insert(idx, size);

        match forest.node(idx).subs.as_slice() {
            [] => {
                out.centers
                    .insert(idx, [left + extent.width * 0.5, top + size * 0.5]);
            }
            [sub] => {
                out.centers
                    .insert(idx, [left + extent.width * 0.5, top + size * 0.5]);
                let child = extents.get(sub).copied().unwrap_or_default();
                let child_left = left + (extent.width - child.width) * 0.5;
                self.place(forest, *sub, child_left, top + size + self.config.gap, extents, out);
            }
            [lhs, rhs, ..] => {
                let l = extents.get(lhs).copied().unwrap_or_default();
                out.centers
                    .insert(idx, [left + l.width + size * 0.5, top + size * 0.5]);
                self.place(forest, *lhs, left, top + drop, extents, out);
                self.place(forest, *rhs, left + l.width + size, top + drop, extents, out);
            }
        }
    }

    fn node_object(
        &self,
        forest: &RegexForest,
        idx: NodeIdx,
        center: [f32; 2],
        size: f32,
        labeler: &mut Labeler,
    ) -> Mobject2D {
        let node = forest.node(idx);
        let radius = size * 0.5;
        let (disc_fill, label_fill) = if node.kind.is_accept() {
            (self.theme.secondary, self.theme.background)
        } else {
            (self.theme.background, self.theme.primary)
        };
        let label = labeler.label(&node.kind.label(), self.config.font_size_pt);

        Mobject2D::new(node.id.clone())
            .with_transform(Affine2::translate(center[0], center[1]))
            .with_child(
                Mobject2D::new(disc_name(&node.id))
                    .with_mesh(geom::disc(radius))
                    .with_fill(disc_fill),
            )
            .with_child(
                Mobject2D::new(ring_name(&node.id))
                    .with_mesh(geom::ring(radius, self.config.stroke_width))
                    .with_fill(self.theme.accent)
                    .with_z(1),
            )
            .with_child(
                Mobject2D::new(label_name(&node.id))
                    .with_mesh(label)
                    .with_fill(label_fill)
                    .with_z(2),
            )
    }

    fn edge_object(&self, name: String, from: ([f32; 2], f32), to: ([f32; 2], f32)) -> Mobject2D {
        let mesh = geom::trim_segment(from.0, to.0, from.1, to.1)
            .map(|(a, b)| geom::segment(a, b, self.config.stroke_width))
            .unwrap_or_default();
        Mobject2D::new(name)
            .with_mesh(mesh)
            .with_fill(self.theme.accent)
            .with_z(-1)
    }

    /// Build the container for the tree at `root`.
    pub fn build_tree(
        &mut self,
        forest: &RegexForest,
        root: NodeIdx,
        labeler: &mut Labeler,
    ) -> Mobject2D {
        let layout = self.layout(forest, root);
        self.extents.insert(root, layout.extent);

        let mut container = Mobject2D::new(tree_name(&forest.node(root).id));
        for idx in forest.preorder(root) {
            let node = forest.node(idx);
            let (Some(&center), Some(&size)) = (layout.centers.get(&idx), layout.sizes.get(&idx))
            else {
                continue;
            };
            container.add_child(self.node_object(forest, idx, center, size, labeler));

            for edge in &node.edges {
                let (Some(&to_center), Some(&to_size)) =
                    (layout.centers.get(&edge.to), layout.sizes.get(&edge.to))
                else {
                    continue;
                };
                container.add_child(self.edge_object(
                    edge_name(&node.id, &forest.node(edge.to).id),
                    (center, size * 0.5),
                    (to_center, to_size * 0.5),
                ));
            }
        }
        container
    }

    /// Build the tree at `root` and add it to `scene` with its center at `offset`.
    pub fn add_tree(
        &mut self,
        scene: &mut Scene2D,
        forest: &RegexForest,
        root: NodeIdx,
        offset: [f32; 2],
        labeler: &mut Labeler,
    ) {
        let container = self
            .build_tree(forest, root, labeler)
            .with_transform(Affine2::translate(offset[0], offset[1]));
        scene.add_root(container);
    }

    /// Add every non-accept root side by side, then place every accept node.
    pub fn add_forest(&mut self, scene: &mut Scene2D, forest: &RegexForest, labeler: &mut Labeler) {
        let (accepts, trees): (Vec<NodeIdx>, Vec<NodeIdx>) = forest
            .roots()
            .iter()
            .copied()
            .partition(|r| forest.node(*r).kind.is_accept());

        let widths: Vec<f32> = trees
            .iter()
            .map(|&r| self.layout(forest, r).extent.width)
            .collect();
        let total = widths.iter().sum::<f32>() + self.config.gap * widths.len().saturating_sub(1) as f32;
        let mut x = -total * 0.5;
        for (root, width) in trees.iter().zip(widths) {
            self.add_tree(scene, forest, *root, [x + width * 0.5, 0.0], labeler);
            x += width + self.config.gap;
        }

        for accept in accepts {
            self.add_accept(scene, forest, accept, labeler);
        }
    }

    /// World-space bottom edge of the tree drawn for `root`.
    fn tree_bottom(&self, scene: &Scene2D, forest: &RegexForest, root: NodeIdx) -> Option<f32> {
        let extent = self.extents.get(&root)?;
        let origin = scene.world_position(&tree_name(&forest.node(root).id))?;
        Some(origin[1] - extent.height * 0.5)
    }

    /// Place an accept node below the trees of its afters and link it to each after.
    ///
    /// The node sits at the mean x of its afters, `gap + min_node_size` below the lowest
    /// tree bottom. Positions are read from the scene once, now.
    pub fn add_accept(
        &mut self,
        scene: &mut Scene2D,
        forest: &RegexForest,
        accept: NodeIdx,
        labeler: &mut Labeler,
    ) -> bool {
        let node = forest.node(accept);
        let afters: Vec<(NodeIdx, [f32; 2])> = node
            .edges
            .iter()
            .filter_map(|e| {
                let pos = scene.world_position(&forest.node(e.to).id)?;
                Some((e.to, pos))
            })
            .collect();

        let bottom = afters
            .iter()
            .filter_map(|(idx, _)| self.tree_bottom(scene, forest, forest.root_of(*idx)))
            .fold(None, |acc: Option<f32>, b| Some(acc.map_or(b, |a| a.min(b))))
            .unwrap_or_else(|| scene.world_bounds().min[1].min(0.0));
        let x = if afters.is_empty() {
            log::debug!("regex: accept {:?} has no drawn afters", node.id);
            0.0
        } else {
            afters.iter().map(|(_, p)| p[0]).sum::<f32>() / afters.len() as f32
        };
        let center = [x, bottom - self.config.gap - self.config.min_node_size];
        let size = self.node_size(forest, accept);

        let mut objects = vec![self.node_object(forest, accept, center, size, labeler)];
        for (after, pos) in &afters {
            let after_size = self.node_size(forest, *after);
            objects.push(self.edge_object(
                edge_name(&node.id, &forest.node(*after).id),
                (center, size * 0.5),
                (*pos, after_size * 0.5),
            ));
        }

        if !scene.contains(ACCEPTS_NAME) {
            scene.add_root(Mobject2D::new(ACCEPTS_NAME));
        }
        objects
            .into_iter()
            .all(|obj| scene.add_child(ACCEPTS_NAME, obj))
    }

    /// Mark the tree at `root` for `targets` and animate every node and edge under it
    /// to its new state.
    ///
    /// Rings and edges go to `accent` when lit and `dimmed` otherwise; labels go to
    /// `primary` or `dimmed`. Everything runs in parallel over `duration_s`.
    pub fn highlight(
        &self,
        forest: &mut RegexForest,
        root: NodeIdx,
        targets: &[Target],
        duration_s: f32,
    ) -> Anim {
        forest.highlight(root, targets);
        self.highlight_anim(forest, root, duration_s)
    }

    fn highlight_anim(&self, forest: &RegexForest, idx: NodeIdx, duration_s: f32) -> Anim {
        let node = forest.node(idx);
        let mut parts: Vec<Anim> = node
            .subs
            .iter()
            .map(|&sub| self.highlight_anim(forest, sub, duration_s))
            .collect();

        for edge in &node.edges {
            let color = if edge.emphasized {
                self.theme.accent
            } else {
                self.theme.dimmed
            };
            parts.push(Anim::fill(
                edge_name(&node.id, &forest.node(edge.to).id),
                color,
                duration_s,
            ));
        }

        let (ring, label) = if node.highlighted {
            (self.theme.accent, self.theme.primary)
        } else {
            (self.theme.dimmed, self.theme.dimmed)
        };
        parts.push(Anim::fill(ring_name(&node.id), ring, duration_s));
        parts.push(Anim::fill(label_name(&node.id), label, duration_s));
        Anim::all(parts)
    }

    /// Move the tree at `root` so that `target` lands on the world origin.
    ///
    /// The offset is computed from the scene as it is now. Unresolvable targets yield an
    /// empty animation.
    pub fn focus(
        &self,
        scene: &Scene2D,
        forest: &RegexForest,
        root: NodeIdx,
        target: &Target,
        duration_s: f32,
    ) -> Anim {
        let resolved = match target {
            Target::Id(s) | Target::Path(s) => forest.at(root, s),
            Target::Node(idx) => (idx.0 < forest.len()).then_some(*idx),
        };
        let Some(idx) = resolved else {
            log::debug!("regex: focus target {target:?} does not resolve");
            return Anim::empty();
        };

        let container = tree_name(&forest.node(root).id);
        let (Some(target_pos), Some(tree)) = (
            scene.world_position(&forest.node(idx).id),
            scene.get(&container),
        ) else {
            log::debug!("regex: focus target {target:?} is not drawn");
            return Anim::empty();
        };

        let delta = [-target_pos[0], -target_pos[1]];
        Anim::translate(
            container,
            [tree.motion.tx + delta[0], tree.motion.ty + delta[1]],
            duration_s,
        )
    }

    /// Animate the tree at `root` back to its unshifted position.
    pub fn reset_position(&self, forest: &RegexForest, root: NodeIdx, duration_s: f32) -> Anim {
        Anim::translate(tree_name(&forest.node(root).id), [0.0, 0.0], duration_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::{Channel, Value};
    use crate::regex::RegexProps;

    fn forest(json: &str) -> (RegexForest, NodeIdx) {
        let mut forest = RegexForest::new();
        let props: RegexProps = serde_json::from_str(json).unwrap();
        let root = forest.add_tree(&props);
        (forest, root)
    }

    fn concat_ab() -> (RegexForest, NodeIdx) {
        forest(
            r#"{"type":"concat","id":"root",
                "lhs":{"type":"char","id":"a","char":"a"},
                "rhs":{"type":"char","id":"b","char":"b"}}"#,
        )
    }

    fn view() -> RegexView {
        RegexView::new(RegexViewConfig::default(), ColorTheme::dark())
    }

    #[test]
    fn binary_layout_hangs_children_below() {
        let (forest, root) = concat_ab();
        let layout = view().layout(&forest, root);

        assert_eq!(layout.extent, Extent { width: 384.0, height: 320.0 });
        let at = |id: &str| layout.centers[&forest.find(id).unwrap()];
        assert_eq!(at("root"), [0.0, 96.0]);
        assert_eq!(at("a"), [-128.0, -96.0]);
        assert_eq!(at("b"), [128.0, -96.0]);
    }

    #[test]
    fn unary_layout_stacks_and_long_labels_grow() {
        let (forest, root) = forest(
            r#"{"type":"kleene","id":"k",
                "sub":{"type":"range","id":"r","dir":"positive","set":"[a-zA-Z_]"}}"#,
        );
        let view = view();
        let layout = view.layout(&forest, root);
        let range = forest.find("r").unwrap();

        assert_eq!(view.node_size(&forest, range), 9.0 * 32.0);
        assert_eq!(layout.extent.width, 288.0);
        assert_eq!(layout.extent.height, 128.0 + 64.0 + 288.0);
        let k = layout.centers[&root];
        let r = layout.centers[&range];
        assert_eq!(k[0], r[0]);
        assert!(k[1] > r[1]);
    }

    #[test]
    fn tree_objects_are_named_for_tweens() {
        let (forest, root) = concat_ab();
        let mut view = view();
        let mut scene = Scene2D::new();
        view.add_tree(&mut scene, &forest, root, [0.0, 0.0], &mut Labeler::disabled());

        for name in ["root.tree", "root", "a.ring", "b.label", "root.disc", "root->a", "root->b"] {
            assert!(scene.contains(name), "missing {name}");
        }
        assert_eq!(scene.world_position("a"), Some([-128.0, -96.0]));
    }

    #[test]
    fn highlight_fills_follow_marks() {
        let (mut forest, root) = concat_ab();
        let view = view();
        let theme = view.theme;
        let anim = view.highlight(&mut forest, root, &["a".into()], 0.5);

        assert_eq!(anim.duration(), 0.5);
        let fill = |name: &str| anim.final_value(name, Channel::Fill);
        assert_eq!(fill("root.ring"), Some(Value::Color(theme.accent)));
        assert_eq!(fill("a.label"), Some(Value::Color(theme.primary)));
        assert_eq!(fill("b.ring"), Some(Value::Color(theme.dimmed)));
        assert_eq!(fill("root->a"), Some(Value::Color(theme.accent)));
        assert_eq!(fill("root->b"), Some(Value::Color(theme.dimmed)));
    }

    #[test]
    fn focus_moves_target_to_origin() {
        let (forest, root) = concat_ab();
        let mut view = view();
        let mut scene = Scene2D::new();
        view.add_tree(&mut scene, &forest, root, [0.0, 0.0], &mut Labeler::disabled());

        let anim = view.focus(&scene, &forest, root, &"/1".into(), 0.0);
        let tl = anim.compile(&scene, 0.0);
        tl.apply(&mut scene, 0.0);
        let b = scene.world_position("b").unwrap();
        assert!(b[0].abs() < 1e-4 && b[1].abs() < 1e-4);

        // Computed once: a second focus starts from the moved tree.
        let anim = view.focus(&scene, &forest, root, &"/".into(), 0.0);
        anim.compile(&scene, 0.0).apply(&mut scene, 0.0);
        let r = scene.world_position("root").unwrap();
        assert!(r[0].abs() < 1e-4 && r[1].abs() < 1e-4);
    }

    #[test]
    fn focus_by_node_handle() {
        let (forest, root) = concat_ab();
        let mut view = view();
        let mut scene = Scene2D::new();
        view.add_tree(&mut scene, &forest, root, [0.0, 0.0], &mut Labeler::disabled());

        let a = forest.find("a").unwrap();
        let anim = view.focus(&scene, &forest, root, &Target::Node(a), 0.0);
        anim.compile(&scene, 0.0).apply(&mut scene, 0.0);
        let p = scene.world_position("a").unwrap();
        assert!(p[0].abs() < 1e-4 && p[1].abs() < 1e-4);

        let stale = Target::Node(NodeIdx(forest.len()));
        assert_eq!(view.focus(&scene, &forest, root, &stale, 1.0), Anim::empty());
    }

    #[test]
    fn focus_on_missing_target_is_empty() {
        let (forest, root) = concat_ab();
        let mut view = view();
        let mut scene = Scene2D::new();
        view.add_tree(&mut scene, &forest, root, [0.0, 0.0], &mut Labeler::disabled());

        for target in ["/00", "nowhere"] {
            let anim = view.focus(&scene, &forest, root, &target.into(), 1.0);
            assert_eq!(anim, Anim::empty());
        }
    }

    #[test]
    fn accept_sits_below_its_afters() {
        let (mut forest, root) = concat_ab();
        let accept = forest.add_tree(
            &serde_json::from_str(r#"{"type":"accept","id":"acc","tokenId":1,"afters":["a","b"]}"#)
                .unwrap(),
        );
        let mut view = view();
        let mut scene = Scene2D::new();
        view.add_tree(&mut scene, &forest, root, [0.0, 0.0], &mut Labeler::disabled());
        assert!(view.add_accept(&mut scene, &forest, accept, &mut Labeler::disabled()));

        let pos = scene.world_position("acc").unwrap();
        assert_eq!(pos[0], 0.0);
        assert_eq!(pos[1], -160.0 - 64.0 - 128.0);
        assert!(scene.contains("acc->a"));
        assert!(scene.contains("acc->b"));
    }
}
