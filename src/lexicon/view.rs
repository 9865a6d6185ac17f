//! Drawing the lexicon graph.
//!
//! Objects live under the [`CONTAINER_NAME`] root:
//! - `state:{id}` groups with `.disc`, `.ring`, `.outline` (accepting states) and `.label`
//! - `transfer:{from}->{to}` groups with `.line`, `.head` and `.label`; parallel transfers
//!   between two states share one group and list every input in the label

use std::collections::BTreeSet;

use crate::anim::Anim;
use crate::font::Labeler;
use crate::lexicon::{LayoutSpacing, Lexicon, LexiconLayout, StateId, Transfer, layout_lexicon};
use crate::scene::{Affine2, Mobject2D, Rgba, Scene2D, geom};
use crate::theme::ColorTheme;

pub const CONTAINER_NAME: &str = "lexicon";

#[inline]
pub fn state_name(id: StateId) -> String {
    format!("state:{id}")
}

#[inline]
pub fn transfer_name(from: StateId, to: StateId) -> String {
    format!("transfer:{from}->{to}")
}

#[inline]
fn part(name: &str, suffix: &str) -> String {
    format!("{name}.{suffix}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexiconViewConfig {
    pub spacing: LayoutSpacing,
    pub state_size: f32,
    /// Distance between the state ring and the accept outline.
    pub outline_gap: f32,
    pub stroke_width: f32,
    pub arrow_size: f32,
    pub loop_radius: f32,
    pub state_font_pt: f32,
    pub input_font_pt: f32,
}

impl Default for LexiconViewConfig {
    fn default() -> Self {
        Self {
            spacing: LayoutSpacing::default(),
            state_size: 96.0,
            outline_gap: 10.0,
            stroke_width: 4.0,
            arrow_size: 18.0,
            loop_radius: 28.0,
            state_font_pt: 32.0,
            input_font_pt: 32.0,
        }
    }
}

pub struct LexiconView {
    pub config: LexiconViewConfig,
    pub theme: ColorTheme,
    layout: LexiconLayout,
    accepted: BTreeSet<StateId>,
}

impl LexiconView {
    pub fn new(lexicon: &Lexicon, config: LexiconViewConfig, theme: ColorTheme) -> Self {
        let layout = layout_lexicon(lexicon, config.spacing);
        Self {
            config,
            theme,
            layout,
            accepted: lexicon.accept_states().collect(),
        }
    }

    /// Draw accepting states without their outline until [`Self::set_accept`] marks them.
    pub fn without_accepts(mut self) -> Self {
        self.accepted.clear();
        self
    }

    #[inline]
    pub fn layout(&self) -> &LexiconLayout {
        &self.layout
    }

    fn radius(&self) -> f32 {
        self.config.state_size * 0.5
    }

    fn state_object(
        &self,
        lexicon: &Lexicon,
        state: StateId,
        labeler: &mut Labeler,
    ) -> Option<Mobject2D> {
        let pos = self.layout.position(state)?;
        let name = state_name(state);
        let r = self.radius();
        let outline_fill = if self.accepted.contains(&state) {
            self.theme.accent
        } else {
            Rgba::TRANSPARENT
        };

        Some(
            Mobject2D::new(name.clone())
                .with_transform(Affine2::translate(pos[0], pos[1]))
                .with_child(
                    Mobject2D::new(part(&name, "disc"))
                        .with_mesh(geom::disc(r))
                        .with_fill(self.theme.background),
                )
                .with_child(
                    Mobject2D::new(part(&name, "ring"))
                        .with_mesh(geom::ring(r, self.config.stroke_width))
                        .with_fill(self.theme.accent)
                        .with_z(1),
                )
                .with_child(
                    Mobject2D::new(part(&name, "outline"))
                        .with_mesh(geom::ring(
                            r + self.config.outline_gap,
                            self.config.stroke_width,
                        ))
                        .with_fill(outline_fill)
                        .with_z(1),
                )
                .with_child(
                    Mobject2D::new(part(&name, "label"))
                        .with_mesh(
                            labeler.label(&lexicon.state_label(state), self.config.state_font_pt),
                        )
                        .with_fill(self.theme.primary)
                        .with_z(2),
                ),
        )
    }

    fn self_loop(&self, name: &str, at: [f32; 2], label: Mobject2D) -> Mobject2D {
        let r = self.radius();
        let lr = self.config.loop_radius;
        let center = [0.0, r + lr * 0.5];
        Mobject2D::new(name.to_string())
            .with_transform(Affine2::translate(at[0], at[1]))
            .with_child(
                Mobject2D::new(part(name, "line"))
                    .with_mesh(geom::ring_at(center, lr, self.config.stroke_width))
                    .with_fill(self.theme.accent)
                    .with_z(-1),
            )
            .with_child(
                Mobject2D::new(part(name, "head"))
                    .with_mesh(geom::arrow_head(
                        [lr * 0.8, r],
                        [0.0, -1.0],
                        self.config.arrow_size,
                    ))
                    .with_fill(self.theme.accent)
                    .with_z(-1),
            )
            .with_child(label.with_transform(Affine2::translate(
                0.0,
                r + lr * 1.5 + self.config.input_font_pt * 0.5,
            )))
    }

    fn arrow(
        &self,
        name: &str,
        from: [f32; 2],
        to: [f32; 2],
        shifted: bool,
        label: Mobject2D,
    ) -> Mobject2D {
        let (dx, dy) = (to[0] - from[0], to[1] - from[1]);
        let len = (dx * dx + dy * dy).sqrt().max(f32::EPSILON);
        let (ux, uy) = (dx / len, dy / len);
        let (px, py) = (-uy, ux);
        // Opposite transfers are pushed apart, each to its own left.
        let shift = if shifted { 12.0 } else { 0.0 };
        let from = [from[0] + px * shift, from[1] + py * shift];
        let to = [to[0] + px * shift, to[1] + py * shift];

        let r = self.radius();
        let mut group = Mobject2D::new(name.to_string());
        if let Some((a, b)) = geom::trim_segment(from, to, r, r + self.config.outline_gap) {
            let back = self.config.arrow_size * 0.5;
            let shaft_end = [b[0] - ux * back, b[1] - uy * back];
            group.add_child(
                Mobject2D::new(part(name, "line"))
                    .with_mesh(geom::segment(a, shaft_end, self.config.stroke_width))
                    .with_fill(self.theme.accent)
                    .with_z(-1),
            );
            group.add_child(
                Mobject2D::new(part(name, "head"))
                    .with_mesh(geom::arrow_head(b, [ux, uy], self.config.arrow_size))
                    .with_fill(self.theme.accent)
                    .with_z(-1),
            );
        } else {
            group.add_child(Mobject2D::new(part(name, "line")));
            group.add_child(Mobject2D::new(part(name, "head")));
        }

        let mid = [
            (from[0] + to[0]) * 0.5 + px * 24.0,
            (from[1] + to[1]) * 0.5 + py * 24.0,
        ];
        group.with_child(label.with_transform(Affine2::translate(mid[0], mid[1])))
    }

    /// Build the whole graph under one container.
    pub fn build(&self, lexicon: &Lexicon, labeler: &mut Labeler) -> Mobject2D {
        let mut container = Mobject2D::new(CONTAINER_NAME);
        for state in lexicon.states() {
            if let Some(obj) = self.state_object(lexicon, state, labeler) {
                container.add_child(obj);
            }
        }

        let edges = lexicon.edges();
        for (&(from, to), inputs) in &edges {
            let (Some(a), Some(b)) = (self.layout.position(from), self.layout.position(to)) else {
                continue;
            };
            let name = transfer_name(from, to);
            let text = inputs
                .iter()
                .map(|&input| Transfer { from, to, input }.label())
                .collect::<Vec<_>>()
                .join(",");
            let label = Mobject2D::new(part(&name, "label"))
                .with_mesh(labeler.label(&text, self.config.input_font_pt))
                .with_fill(self.theme.primary)
                .with_z(2);

            let obj = if from == to {
                self.self_loop(&name, a, label)
            } else {
                self.arrow(&name, a, b, edges.contains_key(&(to, from)), label)
            };
            container.add_child(obj);
        }
        container
    }

    pub fn add_to(&self, scene: &mut Scene2D, lexicon: &Lexicon, labeler: &mut Labeler) {
        scene.add_root(self.build(lexicon, labeler));
    }

    /// Relabel `state` to `"{id}\n{token}"` and fade its accept outline in.
    pub fn set_accept(
        &mut self,
        scene: &mut Scene2D,
        state: StateId,
        token: &str,
        labeler: &mut Labeler,
        duration_s: f32,
    ) -> Anim {
        let name = state_name(state);
        let Some(label) = scene.get_mut(&part(&name, "label")) else {
            log::debug!("lexicon: set_accept on undrawn state {state}");
            return Anim::empty();
        };
        label.mesh = Some(labeler.label(&format!("{state}\n{token}"), self.config.state_font_pt));
        self.accepted.insert(state);
        Anim::fill(part(&name, "outline"), self.theme.accent, duration_s)
    }

    fn paint(
        &self,
        lexicon: &Lexicon,
        duration_s: f32,
        state_lit: &dyn Fn(StateId) -> bool,
        line_lit: &dyn Fn(StateId, StateId) -> bool,
        label_lit: &dyn Fn(StateId, StateId) -> bool,
    ) -> Anim {
        let t = &self.theme;
        let mut parts = Vec::new();
        for state in lexicon.states() {
            let name = state_name(state);
            let lit = state_lit(state);
            let (ring, label) = if lit {
                (t.accent, t.primary)
            } else {
                (t.dimmed, t.dimmed)
            };
            parts.push(Anim::fill(part(&name, "ring"), ring, duration_s));
            parts.push(Anim::fill(part(&name, "label"), label, duration_s));
            if self.accepted.contains(&state) {
                parts.push(Anim::fill(part(&name, "outline"), ring, duration_s));
            }
        }
        for &(from, to) in lexicon.edges().keys() {
            let name = transfer_name(from, to);
            let line = if line_lit(from, to) { t.accent } else { t.dimmed };
            let label = if label_lit(from, to) { t.primary } else { t.dimmed };
            parts.push(Anim::fill(part(&name, "line"), line, duration_s));
            parts.push(Anim::fill(part(&name, "head"), line, duration_s));
            parts.push(Anim::fill(part(&name, "label"), label, duration_s));
        }
        Anim::all(parts)
    }

    /// Light `states` and every transfer whose two ends are both listed; dim the rest.
    /// An empty list lights everything.
    pub fn highlight(&self, lexicon: &Lexicon, states: &[StateId], duration_s: f32) -> Anim {
        let lit = |s: StateId| states.is_empty() || states.contains(&s);
        let both = |from: StateId, to: StateId| lit(from) && lit(to);
        self.paint(lexicon, duration_s, &lit, &both, &both)
    }

    /// Dim every state and transfer.
    pub fn dim(&self, lexicon: &Lexicon, duration_s: f32) -> Anim {
        let none = |_: StateId, _: StateId| false;
        self.paint(lexicon, duration_s, &|_: StateId| false, &none, &none)
    }

    /// Light only `states`; every transfer stays dimmed.
    pub fn light_states(&self, lexicon: &Lexicon, states: &[StateId], duration_s: f32) -> Anim {
        self.paint(
            lexicon,
            duration_s,
            &|s: StateId| states.contains(&s),
            &|_: StateId, _: StateId| false,
            &|_: StateId, _: StateId| false,
        )
    }

    /// Light transfer input labels (`with_lines` also lights arrows); states stay dimmed.
    pub fn light_transfers(&self, lexicon: &Lexicon, with_lines: bool, duration_s: f32) -> Anim {
        self.paint(
            lexicon,
            duration_s,
            &|_: StateId| false,
            &|_: StateId, _: StateId| with_lines,
            &|_: StateId, _: StateId| true,
        )
    }

    /// Move the graph so `state` lands on the world origin. Unknown states yield an empty
    /// animation.
    pub fn focus(&self, scene: &Scene2D, state: StateId, duration_s: f32) -> Anim {
        let (Some(pos), Some(container)) = (
            scene.world_position(&state_name(state)),
            scene.get(CONTAINER_NAME),
        ) else {
            log::debug!("lexicon: focus on undrawn state {state}");
            return Anim::empty();
        };
        Anim::translate(
            CONTAINER_NAME,
            [container.motion.tx - pos[0], container.motion.ty - pos[1]],
            duration_s,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::{Channel, Value};

    fn chain() -> Lexicon {
        let mut lex = Lexicon::new();
        lex.add_token(1, "ID".into());
        for s in 1..=3 {
            lex.add_state(s, Vec::new());
        }
        lex.add_transfer(1, 2, 'a' as u32);
        lex.add_transfer(2, 3, 'b' as u32);
        lex.add_transfer(3, 3, 'b' as u32);
        lex.add_transfer(3, 2, 'c' as u32);
        lex
    }

    fn drawn(lex: &Lexicon) -> (LexiconView, Scene2D) {
        let view = LexiconView::new(lex, LexiconViewConfig::default(), ColorTheme::dark());
        let mut scene = Scene2D::new();
        view.add_to(&mut scene, lex, &mut Labeler::disabled());
        (view, scene)
    }

    #[test]
    fn graph_objects_are_named() {
        let lex = chain();
        let (_, scene) = drawn(&lex);
        for name in [
            "lexicon",
            "state:1.ring",
            "state:3.outline",
            "transfer:1->2.line",
            "transfer:3->3.head",
            "transfer:3->2.label",
        ] {
            assert!(scene.contains(name), "missing {name}");
        }
    }

    #[test]
    fn highlight_lights_transfers_between_listed_states() {
        let lex = chain();
        let (view, _) = drawn(&lex);
        let t = view.theme;
        let anim = view.highlight(&lex, &[1, 2], 0.4);
        let fill = |name: &str| anim.final_value(name, Channel::Fill);

        assert_eq!(fill("state:2.ring"), Some(Value::Color(t.accent)));
        assert_eq!(fill("state:3.ring"), Some(Value::Color(t.dimmed)));
        assert_eq!(fill("transfer:1->2.line"), Some(Value::Color(t.accent)));
        assert_eq!(fill("transfer:2->3.line"), Some(Value::Color(t.dimmed)));

        let all = view.highlight(&lex, &[], 0.4);
        assert_eq!(
            all.final_value("transfer:3->3.label", Channel::Fill),
            Some(Value::Color(t.primary))
        );
    }

    #[test]
    fn focus_centers_state() {
        let lex = chain();
        let (view, mut scene) = drawn(&lex);
        view.focus(&scene, 3, 0.0).compile(&scene, 0.0).apply(&mut scene, 0.0);
        let p = scene.world_position("state:3").unwrap();
        assert!(p[0].abs() < 1e-4 && p[1].abs() < 1e-4);

        assert_eq!(view.focus(&scene, 42, 1.0), Anim::empty());
    }

    #[test]
    fn hidden_accepts_skip_outline_paints() {
        let mut lex = chain();
        lex.set_accept(2, 7);
        let view = LexiconView::new(&lex, LexiconViewConfig::default(), ColorTheme::dark())
            .without_accepts();
        let mut scene = Scene2D::new();
        view.add_to(&mut scene, &lex, &mut Labeler::disabled());
        assert_eq!(scene.get("state:2.outline").unwrap().fill, Rgba::TRANSPARENT);
        assert_eq!(view.dim(&lex, 0.1).final_value("state:2.outline", Channel::Fill), None);
    }

    #[test]
    fn set_accept_fades_outline_in() {
        let lex = chain();
        let (mut view, mut scene) = drawn(&lex);
        assert_eq!(scene.get("state:3.outline").unwrap().fill, Rgba::TRANSPARENT);

        let anim = view.set_accept(&mut scene, 3, "ID", &mut Labeler::disabled(), 0.5);
        assert_eq!(
            anim.final_value("state:3.outline", Channel::Fill),
            Some(Value::Color(view.theme.accent))
        );
        // Accepting states keep their outline in later highlights.
        let dim = view.dim(&lex, 0.1);
        assert_eq!(
            dim.final_value("state:3.outline", Channel::Fill),
            Some(Value::Color(view.theme.dimmed))
        );
    }
}
