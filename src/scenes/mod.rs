//! Scripted scenes.
//!
//! A scene draws its diagram once in [`SceneScript::setup`] and then yields one
//! animation step at a time through [`Script`].

pub mod dfa_tour;
pub mod regex_walkthrough;

use crate::anim::Script;
use crate::font::Labeler;
use crate::scene::Scene2D;

pub use dfa_tour::DfaTour;
pub use regex_walkthrough::RegexWalkthrough;

/// A [`Script`] that also knows how to draw its starting frame.
pub trait SceneScript: Script {
    /// Window title.
    fn title(&self) -> String;

    /// Add every object the script will animate.
    fn setup(&mut self, scene: &mut Scene2D, labeler: &mut Labeler);
}
