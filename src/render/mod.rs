//! Window, GPU and the stage that plays a scene.
//!
//! Entry point: [`play`], or [`app::run_with_builder`] with a custom [`app::AppState`].

pub mod app;

pub mod gpu;

/// Frame timing.
pub mod util;

/// Solid-color mesh renderer for scene draw items.
pub mod mesh_renderer;

pub mod stage;

pub use stage::{Stage, StageConfig};

use crate::scenes::SceneScript;

/// Open a window and play `script` until the window is closed.
pub fn play<S: SceneScript + 'static>(script: S, config: StageConfig) -> anyhow::Result<()> {
    let app_config = app::AppConfig {
        title: script.title(),
        ..Default::default()
    };
    app::run_with_builder(app_config, move |window| async move {
        Stage::new(window, script, config).await
    })
}
