//! Window state that plays a [`SceneScript`].

use std::sync::Arc;

use winit::window::Window;

use crate::anim::Player;
use crate::font::{FontQuery, Labeler};
use crate::render::{app::AppState, gpu::Gpu, mesh_renderer::MeshRenderer, util::FrameClock};
use crate::scene::{Aabb2, Camera2D, Rgba, Scene2D};
use crate::scenes::SceneScript;
use crate::theme::ColorTheme;

/// How a stage draws and paces its scene.
#[derive(Debug, Clone)]
pub struct StageConfig {
    pub clear: Rgba,
    /// Margin around the initial drawing, in pt.
    pub padding_pt: f32,
    /// Fraction of the viewport the framed drawing occupies.
    pub fill_ratio: f32,
    /// Playback rate; 2.0 plays twice as fast.
    pub speed: f32,
    /// Font for node labels; `None` draws no text.
    pub font: Option<FontQuery>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            clear: Rgba::rgb(0.05, 0.06, 0.08),
            padding_pt: 64.0,
            fill_ratio: 0.85,
            speed: 1.0,
            font: Some(FontQuery::default()),
        }
    }
}

impl StageConfig {
    /// Clear with the theme's background.
    pub fn with_theme(mut self, theme: &ColorTheme) -> Self {
        self.clear = theme.background;
        self
    }
}

/// Frame `bounds` with the world origin at the viewport center.
///
/// Focus moves bring their target to the origin, so the camera never pans.
pub fn frame_about_origin(camera: &mut Camera2D, bounds: Aabb2, padding_pt: f32, fill_ratio: f32) {
    if bounds.is_empty() {
        return;
    }
    let half_w = bounds.min[0].abs().max(bounds.max[0].abs()) + padding_pt;
    let half_h = bounds.min[1].abs().max(bounds.max[1].abs()) + padding_pt;
    camera.center_pt = [0.0, 0.0];
    camera.zoom = camera.zoom_to_fit([2.0 * half_w, 2.0 * half_h], fill_ratio);
}

pub struct Stage<S> {
    window: Arc<Window>,
    gpu: Gpu,
    renderer: MeshRenderer,
    scene: Scene2D,
    player: Player<S>,
    clock: FrameClock,
    playback_s: f32,
    framed: Aabb2,
    config: StageConfig,
}

impl<S: SceneScript + 'static> Stage<S> {
    /// Draw the script's first frame and frame the camera on it.
    pub async fn new(window: Arc<Window>, mut script: S, config: StageConfig) -> anyhow::Result<Self> {
        let gpu = Gpu::new(window.clone()).await?;
        let renderer = MeshRenderer::new(&gpu)?;

        let mut labeler = match &config.font {
            Some(query) => Labeler::system(query),
            None => Labeler::disabled(),
        };
        let mut scene = Scene2D::new();
        script.setup(&mut scene, &mut labeler);

        let framed = scene.world_bounds();
        scene
            .camera
            .set_viewport_px(gpu.size.width.max(1), gpu.size.height.max(1));
        frame_about_origin(&mut scene.camera, framed, config.padding_pt, config.fill_ratio);
        log::info!(
            "stage: {} ({} roots, {:.0}x{:.0} pt)",
            script.title(),
            scene.roots.len(),
            framed.size()[0],
            framed.size()[1]
        );

        Ok(Self {
            window,
            gpu,
            renderer,
            scene,
            player: Player::new(script),
            clock: FrameClock::new(),
            playback_s: 0.0,
            framed,
            config,
        })
    }

    #[inline]
    pub fn scene(&self) -> &Scene2D {
        &self.scene
    }

    #[inline]
    pub fn player(&self) -> &Player<S> {
        &self.player
    }

    fn advance(&mut self) {
        let dt = self.clock.tick();
        if self.player.is_finished() {
            return;
        }
        self.playback_s += dt * self.config.speed.max(0.0);
        self.player.update(&mut self.scene, self.playback_s);
    }
}

impl<S: SceneScript + 'static> AppState for Stage<S> {
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.gpu.resize(new_size);
        self.scene
            .camera
            .set_viewport_px(new_size.width.max(1), new_size.height.max(1));
        frame_about_origin(
            &mut self.scene.camera,
            self.framed,
            self.config.padding_pt,
            self.config.fill_ratio,
        );
    }

    fn render(&mut self) -> anyhow::Result<()> {
        self.advance();
        if self.gpu.is_minimized() {
            self.request_redraw();
            return Ok(());
        }

        let (surface_texture, view) = match self.gpu.acquire_frame() {
            Ok(v) => v,
            Err(
                wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost | wgpu::SurfaceError::Other,
            ) => {
                self.gpu.resize(self.gpu.size);
                self.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                self.request_redraw();
                return Ok(());
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(anyhow::anyhow!("wgpu SurfaceError::OutOfMemory"));
            }
        };

        let mut items = self.scene.flatten();
        items.sort_by_key(|it| it.z);
        self.renderer
            .prepare(&self.gpu, &self.scene.camera, &items);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Stage Encoder"),
            });
        {
            let clear = self.config.clear;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Stage Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(clear.r),
                            g: f64::from(clear.g),
                            b: f64::from(clear.b),
                            a: f64::from(clear.a),
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            self.renderer.draw(&mut pass);
        }

        self.gpu.queue.submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        surface_texture.present();
        self.request_redraw();
        Ok(())
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framing_keeps_origin_centered() {
        let mut camera = Camera2D::default();
        camera.set_viewport_px(800, 800);
        let bounds = Aabb2::from_min_max([-50.0, -10.0], [150.0, 20.0]);
        frame_about_origin(&mut camera, bounds, 0.0, 0.5);
        assert_eq!(camera.center_pt, [0.0, 0.0]);
        // Widest side: 300 pt filling half the viewport.
        assert!((camera.zoom - 1.0 / 300.0).abs() < 1e-6);
    }

    #[test]
    fn empty_bounds_leave_camera_alone() {
        let mut camera = Camera2D::default();
        frame_about_origin(&mut camera, Aabb2::empty(), 10.0, 0.5);
        assert_eq!(camera.zoom, 1.0);
    }
}
