//! Cooperative step player.
//!
//! A [`Script`] yields one [`Anim`] per step. The [`Player`] pulls the next step only
//! once the previous one has completed, and compiles it against the scene *as it is at
//! that moment*. Anything a step derives from the scene (absolute positions for a focus
//! move, current colors) is therefore computed once, at the step boundary.

use crate::anim::{Anim, Timeline};
use crate::scene::Scene2D;

/// Upper bound on zero-length steps settled within a single `update`.
const MAX_STEPS_PER_UPDATE: usize = 4096;

/// A scene script: a sequence of steps produced on demand.
pub trait Script {
    /// Produce the next step, or `None` when the script is over.
    ///
    /// Called exactly once per step, after every earlier step has fully applied.
    fn next_step(&mut self, scene: &mut Scene2D) -> Option<Anim>;
}

impl<F> Script for F
where
    F: FnMut(&mut Scene2D) -> Option<Anim>,
{
    fn next_step(&mut self, scene: &mut Scene2D) -> Option<Anim> {
        self(scene)
    }
}

/// Drives a script against a scene from an external clock.
pub struct Player<S> {
    script: S,
    timeline: Timeline,
    step_start_s: f32,
    step_end_s: f32,
    steps: usize,
    finished: bool,
}

impl<S: Script> Player<S> {
    pub fn new(script: S) -> Self {
        Self {
            script,
            timeline: Timeline::new(),
            step_start_s: 0.0,
            step_end_s: 0.0,
            steps: 0,
            finished: false,
        }
    }

    /// Advance to absolute time `t_s` (seconds since playback start).
    ///
    /// Time is expected to be monotonic; going backwards only re-samples the current step.
    pub fn update(&mut self, scene: &mut Scene2D, t_s: f32) {
        let mut settled = 0usize;
        while !self.finished && t_s >= self.step_end_s {
            if settled >= MAX_STEPS_PER_UPDATE {
                log::warn!("player: too many instant steps in one update; deferring the rest");
                break;
            }
            settled += 1;

            // Settle the finished step exactly at its end.
            self.timeline.apply(scene, self.step_end_s);

            match self.script.next_step(scene) {
                Some(anim) => {
                    let start = self.step_end_s;
                    self.timeline = anim.compile(scene, start);
                    self.step_start_s = start;
                    self.step_end_s = start + anim.duration();
                    self.steps += 1;
                    log::debug!(
                        "player: step {} at {:.2}s ({} tweens, {:.2}s)",
                        self.steps,
                        start,
                        anim.tween_count(),
                        anim.duration()
                    );
                }
                None => {
                    self.finished = true;
                    log::info!(
                        "player: script finished after {} steps ({:.2}s)",
                        self.steps,
                        self.step_end_s
                    );
                }
            }
        }

        self.timeline
            .apply(scene, t_s.clamp(self.step_start_s, self.step_end_s));
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Steps started so far.
    #[inline]
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// End time of the current step.
    #[inline]
    pub fn step_end_s(&self) -> f32 {
        self.step_end_s
    }

    #[inline]
    pub fn script(&self) -> &S {
        &self.script
    }

    #[inline]
    pub fn script_mut(&mut self) -> &mut S {
        &mut self.script
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::Ease;
    use crate::scene::Mobject2D;

    fn scene_with(name: &str) -> Scene2D {
        let mut scene = Scene2D::new();
        scene.add_root(Mobject2D::new(name));
        scene
    }

    #[test]
    fn steps_run_sequentially() {
        let mut scene = scene_with("x");
        let mut queue = vec![
            Anim::scale("x", 3.0, 1.0).with_ease(Ease::Linear),
            Anim::scale("x", 2.0, 1.0).with_ease(Ease::Linear),
        ]
        .into_iter();
        let mut player = Player::new(move |_: &mut Scene2D| queue.next());

        player.update(&mut scene, 0.5);
        assert_eq!(scene.get("x").unwrap().motion.scale, 2.0);
        assert_eq!(player.steps(), 1);

        player.update(&mut scene, 1.5);
        assert_eq!(player.steps(), 2);
        assert_eq!(scene.get("x").unwrap().motion.scale, 2.5);

        player.update(&mut scene, 10.0);
        assert!(player.is_finished());
        assert_eq!(scene.get("x").unwrap().motion.scale, 2.0);
    }

    #[test]
    fn instant_steps_snap() {
        let mut scene = scene_with("x");
        let mut queue = vec![Anim::translate("x", [5.0, -5.0], 0.0)].into_iter();
        let mut player = Player::new(move |_: &mut Scene2D| queue.next());

        player.update(&mut scene, 0.0);
        assert!(player.is_finished());
        let motion = scene.get("x").unwrap().motion;
        assert_eq!((motion.tx, motion.ty), (5.0, -5.0));
    }

    #[test]
    fn next_step_sees_settled_scene() {
        let mut scene = scene_with("x");
        let mut n = 0;
        let mut player = Player::new(move |scene: &mut Scene2D| {
            // Each step starts from where the previous one settled.
            assert_eq!(scene.get("x").unwrap().motion.tx, n as f32 * 10.0);
            n += 1;
            (n <= 2).then(|| Anim::translate("x", [n as f32 * 10.0, 0.0], 1.0))
        });

        player.update(&mut scene, 5.0);
        assert!(player.is_finished());
        assert_eq!(scene.get("x").unwrap().motion.tx, 20.0);
    }
}
