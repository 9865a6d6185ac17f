use std::collections::VecDeque;

use crate::anim::{Anim, Script};
use crate::font::Labeler;
use crate::regex::{NodeIdx, RegexForest, RegexView, RegexViewConfig, Target};
use crate::scene::Scene2D;
use crate::scenes::SceneScript;
use crate::theme::ColorTheme;
use crate::trace::{Trace, TraceError};

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Focus(String, f32),
    /// Highlight `targets` while focusing the last of them.
    Light(Vec<String>),
    Finale,
    Wait(f32),
}

/// Walks one regex tree: groups of nodes light up one by one while the camera follows.
///
/// Within a group highlights accumulate; every group starts from a clean slate. The
/// walk ends with everything lit and the tree back in place.
pub struct RegexWalkthrough {
    pattern: String,
    forest: RegexForest,
    root: NodeIdx,
    view: RegexView,
    steps: VecDeque<Step>,
    step_s: f32,
}

impl RegexWalkthrough {
    /// Walk the `index`-th compiled pattern of `trace`, leaf by leaf.
    pub fn from_trace(trace: &Trace, index: usize, theme: ColorTheme) -> Result<Self, TraceError> {
        let forest = RegexForest::from_trace(trace);
        let (pattern, root) = forest
            .patterns()
            .get(index)
            .cloned()
            .ok_or(TraceError::Missing("RegexCompile"))?;
        let groups = vec![forest.leaf_paths(root)];
        Ok(Self::new(pattern, forest, root, theme).with_groups(groups))
    }

    pub fn new(pattern: String, forest: RegexForest, root: NodeIdx, theme: ColorTheme) -> Self {
        Self {
            pattern,
            forest,
            root,
            view: RegexView::new(RegexViewConfig::default(), theme),
            steps: VecDeque::new(),
            step_s: 1.0,
        }
    }

    /// Replace the walk with `groups` of targets (paths or ids).
    pub fn with_groups(mut self, groups: Vec<Vec<String>>) -> Self {
        let mut steps = VecDeque::new();
        steps.push_back(Step::Focus("/".to_string(), 0.0));
        for group in groups {
            for i in 0..group.len() {
                steps.push_back(Step::Light(group[..=i].to_vec()));
            }
        }
        steps.push_back(Step::Finale);
        steps.push_back(Step::Wait(1.0));
        self.steps = steps;
        self
    }

    /// Seconds per highlight step.
    pub fn with_step_duration(mut self, step_s: f32) -> Self {
        self.step_s = step_s.max(0.0);
        self
    }

    #[inline]
    pub fn forest(&self) -> &RegexForest {
        &self.forest
    }

    #[inline]
    pub fn root(&self) -> NodeIdx {
        self.root
    }

    /// Steps not yet played.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl Script for RegexWalkthrough {
    fn next_step(&mut self, scene: &mut Scene2D) -> Option<Anim> {
        let step = self.steps.pop_front()?;
        log::debug!("walkthrough: {step:?}");
        let d = self.step_s;
        let anim = match step {
            Step::Focus(target, duration) => {
                self.view
                    .focus(scene, &self.forest, self.root, &Target::from(target), duration)
            }
            Step::Light(targets) => {
                let focus = targets.last().cloned().map(Target::from);
                let targets: Vec<Target> = targets.into_iter().map(Target::from).collect();
                let lit = self.view.highlight(&mut self.forest, self.root, &targets, d);
                match focus {
                    Some(focus) => {
                        let moved = self.view.focus(scene, &self.forest, self.root, &focus, d);
                        Anim::all([lit, moved])
                    }
                    None => lit,
                }
            }
            Step::Finale => Anim::all([
                self.view.highlight(&mut self.forest, self.root, &[], d),
                self.view.reset_position(&self.forest, self.root, d),
            ]),
            Step::Wait(duration) => Anim::wait(duration),
        };
        Some(anim)
    }
}

impl SceneScript for RegexWalkthrough {
    fn title(&self) -> String {
        format!("lexiscope: {}", self.pattern)
    }

    fn setup(&mut self, scene: &mut Scene2D, labeler: &mut Labeler) {
        self.view
            .add_tree(scene, &self.forest, self.root, [0.0, 0.0], labeler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::Player;

    fn trace() -> Trace {
        Trace::parse(
            r#"[{"$":"RegexCompile","pattern":"ab","regex":
                {"type":"concat","id":"root",
                 "lhs":{"type":"char","id":"a","char":"a"},
                 "rhs":{"type":"char","id":"b","char":"b"}}}]"#,
        )
        .unwrap()
    }

    #[test]
    fn missing_pattern_is_an_error() {
        let err = RegexWalkthrough::from_trace(&Trace::default(), 0, ColorTheme::dark());
        assert!(matches!(err, Err(TraceError::Missing("RegexCompile"))));
    }

    #[test]
    fn walk_plays_to_completion() {
        let walk = RegexWalkthrough::from_trace(&trace(), 0, ColorTheme::dark()).unwrap();
        // focus, two leaves, finale, wait
        assert_eq!(walk.remaining(), 5);

        let mut walk = walk.with_step_duration(0.5);
        let mut scene = Scene2D::new();
        walk.setup(&mut scene, &mut Labeler::disabled());

        let mut player = Player::new(walk);
        // Mid-walk the camera follows the newest leaf: "b" at the origin.
        player.update(&mut scene, 1.0);
        let b = scene.world_position("b").unwrap();
        assert!(b[0].abs() < 1e-3 && b[1].abs() < 1e-3);

        player.update(&mut scene, 10.0);
        assert!(player.is_finished());
        let tree = scene.get("root.tree").unwrap();
        assert_eq!((tree.motion.tx, tree.motion.ty), (0.0, 0.0));
        let walk = player.script();
        let forest = walk.forest();
        let lit = forest.preorder(walk.root());
        assert!(lit.iter().all(|&i| forest.node(i).highlighted));
    }
}
