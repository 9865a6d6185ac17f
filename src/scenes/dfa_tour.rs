use std::collections::VecDeque;

use crate::anim::{Anim, Script};
use crate::font::Labeler;
use crate::lexicon::{Lexicon, LexiconView, LexiconViewConfig, StateId};
use crate::scene::Scene2D;
use crate::scenes::SceneScript;
use crate::theme::ColorTheme;
use crate::trace::{Trace, TraceError};

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Dim,
    LightStates(Vec<StateId>),
    LightInputs,
    LightTransfers,
    LightAccepts(Vec<StateId>),
    Highlight(Vec<StateId>),
    /// Light `state` alone and bring it to the origin.
    Visit(StateId),
    Wait(f32),
}

/// Tour of the lexicon DFA: states, inputs, transfers, the start state and the accept
/// states in turn, then a replay of the scanner's state sequence if the trace has one.
pub struct DfaTour {
    lexicon: Lexicon,
    view: LexiconView,
    steps: VecDeque<Step>,
    step_s: f32,
    /// Outline fades from marking the accept states during setup.
    accept_marks: Option<Anim>,
}

impl DfaTour {
    pub fn from_trace(trace: &Trace, theme: ColorTheme) -> Result<Self, TraceError> {
        let lexicon = Lexicon::from_trace(trace);
        if lexicon.start_state().is_none() {
            return Err(TraceError::Missing("LexiconAddState"));
        }
        Ok(Self::new(lexicon, theme, &trace.scanner_states()))
    }

    pub fn new(lexicon: Lexicon, theme: ColorTheme, scanner_states: &[StateId]) -> Self {
        let view =
            LexiconView::new(&lexicon, LexiconViewConfig::default(), theme).without_accepts();

        let mut steps = VecDeque::new();
        let all: Vec<StateId> = lexicon.states().collect();
        let accepts: Vec<StateId> = lexicon.accept_states().collect();
        let tour = [
            Step::LightStates(all),
            Step::LightInputs,
            Step::LightTransfers,
            Step::LightStates(lexicon.start_state().into_iter().collect()),
            Step::LightAccepts(accepts),
        ];
        for step in tour {
            steps.extend([Step::Dim, step, Step::Wait(1.0)]);
        }

        // Only states the lexicon knows take part in the replay.
        let replay: Vec<StateId> = scanner_states
            .iter()
            .copied()
            .filter(|s| lexicon.contains(*s))
            .collect();
        if let Some(&first) = replay.first() {
            let mut last = first;
            for &next in &replay {
                steps.push_back(Step::Highlight(vec![last, next]));
                steps.push_back(Step::Visit(next));
                last = next;
            }
            steps.push_back(Step::Wait(1.0));
        }

        Self {
            lexicon,
            view,
            steps,
            step_s: 0.4,
            accept_marks: None,
        }
    }

    pub fn with_step_duration(mut self, step_s: f32) -> Self {
        self.step_s = step_s.max(0.0);
        self
    }

    #[inline]
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl Script for DfaTour {
    fn next_step(&mut self, scene: &mut Scene2D) -> Option<Anim> {
        let step = self.steps.pop_front()?;
        log::debug!("tour: {step:?}");
        let d = self.step_s;
        let lex = &self.lexicon;
        Some(match step {
            Step::Dim => self.view.dim(lex, d),
            Step::LightStates(states) => self.view.light_states(lex, &states, d),
            Step::LightInputs => self.view.light_transfers(lex, false, d),
            Step::LightTransfers => self.view.light_transfers(lex, true, d),
            Step::LightAccepts(states) => {
                let marks = self.accept_marks.take().unwrap_or_else(Anim::empty);
                Anim::all([self.view.light_states(lex, &states, d), marks])
            }
            Step::Highlight(states) => self.view.highlight(lex, &states, d),
            Step::Visit(state) => Anim::all([
                self.view.highlight(lex, &[state], d),
                self.view.focus(scene, state, d),
            ]),
            Step::Wait(s) => Anim::wait(s),
        })
    }
}

impl SceneScript for DfaTour {
    fn title(&self) -> String {
        "lexiscope: DFA".to_string()
    }

    fn setup(&mut self, scene: &mut Scene2D, labeler: &mut Labeler) {
        self.view.add_to(scene, &self.lexicon, labeler);
        let accepts: Vec<StateId> = self.lexicon.accept_states().collect();
        let mut marks = Vec::with_capacity(accepts.len());
        for state in accepts {
            let token = self
                .lexicon
                .accept_name(state)
                .unwrap_or_else(|| state.to_string());
            marks.push(self.view.set_accept(scene, state, &token, labeler, self.step_s));
        }
        self.accept_marks = Some(Anim::all(marks));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::Player;
    use crate::scene::Rgba;

    fn lexicon() -> Lexicon {
        let mut lex = Lexicon::new();
        for s in 1..=3 {
            lex.add_state(s, Vec::new());
        }
        lex.add_transfer(1, 2, 'a' as u32);
        lex.add_transfer(2, 3, 'b' as u32);
        lex.set_accept(3, 1);
        lex
    }

    #[test]
    fn tour_without_scanner_has_five_sections() {
        let tour = DfaTour::new(lexicon(), ColorTheme::dark(), &[]);
        assert_eq!(tour.remaining(), 15);
    }

    #[test]
    fn replay_pairs_each_move() {
        // 9 is unknown and dropped.
        let tour = DfaTour::new(lexicon(), ColorTheme::dark(), &[1, 2, 9, 3]);
        assert_eq!(tour.remaining(), 15 + 3 * 2 + 1);
    }

    #[test]
    fn replay_ends_on_last_state() {
        let theme = ColorTheme::dark();
        let tour = DfaTour::new(lexicon(), theme, &[1, 2, 3]).with_step_duration(0.1);
        let mut scene = Scene2D::new();
        let mut tour = tour;
        tour.setup(&mut scene, &mut Labeler::disabled());

        let mut player = Player::new(tour);
        player.update(&mut scene, 100.0);
        assert!(player.is_finished());
        assert_eq!(scene.get("state:3.ring").unwrap().fill, theme.accent);
        assert_eq!(scene.get("state:2.ring").unwrap().fill, theme.dimmed);
        // The replay follows the scanner, so its last state sits on the origin.
        let p = scene.world_position("state:3").unwrap();
        assert!(p[0].abs() < 1e-3 && p[1].abs() < 1e-3);
    }

    #[test]
    fn accept_section_reveals_outlines() {
        let theme = ColorTheme::dark();
        let mut tour = DfaTour::new(lexicon(), theme, &[]).with_step_duration(0.1);
        let mut scene = Scene2D::new();
        tour.setup(&mut scene, &mut Labeler::disabled());
        assert_eq!(scene.get("state:3.outline").unwrap().fill, Rgba::TRANSPARENT);
        assert_eq!(scene.get("state:2.outline").unwrap().fill, Rgba::TRANSPARENT);

        let mut player = Player::new(tour);
        player.update(&mut scene, 100.0);
        assert!(player.is_finished());
        assert_eq!(scene.get("state:3.outline").unwrap().fill, theme.accent);
    }

    #[test]
    fn empty_lexicon_is_an_error() {
        let err = DfaTour::from_trace(&Trace::default(), ColorTheme::dark());
        assert!(matches!(err, Err(TraceError::Missing("LexiconAddState"))));
    }
}
