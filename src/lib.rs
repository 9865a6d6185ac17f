//! `lexiscope`: animated explainers for compiler front-end traces.
//!
//! A [`trace::Trace`] recorded by the compiler is turned into a regex forest
//! ([`regex::RegexForest`]) or a lexicon DFA ([`lexicon::Lexicon`]), drawn into a
//! [`scene::Scene2D`] and animated by a [`scenes::SceneScript`]. [`render::play`] opens a
//! window and plays a script.
//!
//! The library logs through the `log` facade and never installs a logger.

pub mod anim;
pub mod font;
pub mod lexicon;
pub mod regex;
pub mod render;
pub mod scene;
pub mod scenes;
pub mod theme;
pub mod trace;

pub use render::{StageConfig, play};
pub use theme::ColorTheme;
pub use trace::{Trace, TraceError};
