//! Composable animation values.
//!
//! An [`Anim`] is a description of timed property changes:
//! - [`Anim::tween`]: move one channel of one named object to a value over a duration
//! - [`Anim::all`]: start everything together; done when the slowest part is done
//! - [`Anim::chain`]: run parts one after another
//! - [`Anim::wait`]: a pure delay
//!
//! Tweens only know their *destination*. The starting value is captured when the
//! animation is compiled into a [`Timeline`], from the live scene or from the previous
//! tween on the same channel.

use std::collections::HashMap;

use crate::anim::{AnimTarget, Ease, Timeline, Track, Value};
use crate::scene::{Mobject2D, Rgba, Scene2D};

/// An animatable channel of a mobject.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    Alpha,
    TranslateX,
    TranslateY,
    Rotate,
    Scale,
    Fill,
}

impl Channel {
    /// Current value of this channel on `obj`.
    pub fn read(self, obj: &Mobject2D) -> Value {
        match self {
            Channel::Alpha => Value::Scalar(obj.fill.a),
            Channel::TranslateX => Value::Scalar(obj.motion.tx),
            Channel::TranslateY => Value::Scalar(obj.motion.ty),
            Channel::Rotate => Value::Scalar(obj.motion.rotate),
            Channel::Scale => Value::Scalar(obj.motion.scale),
            Channel::Fill => Value::Color(obj.fill),
        }
    }

    fn new_track(self, target: AnimTarget) -> Track {
        match self {
            Channel::Alpha => Track::new_alpha(target),
            Channel::TranslateX => Track::new_translate_x(target),
            Channel::TranslateY => Track::new_translate_y(target),
            Channel::Rotate => Track::new_rotate(target),
            Channel::Scale => Track::new_scale(target),
            Channel::Fill => Track::new_fill(target),
        }
    }
}

/// One channel of one object moving to `to` over `duration_s`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: String,
    pub channel: Channel,
    pub to: Value,
    pub duration_s: f32,
    pub ease: Ease,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Anim {
    Tween(Tween),
    All(Vec<Anim>),
    Chain(Vec<Anim>),
    Wait(f32),
}

impl Anim {
    /// An animation that does nothing and completes immediately.
    #[inline]
    pub fn empty() -> Self {
        Anim::All(Vec::new())
    }

    pub fn tween(target: impl Into<String>, channel: Channel, to: Value, duration_s: f32) -> Self {
        Anim::Tween(Tween {
            target: target.into(),
            channel,
            to,
            duration_s: duration_s.max(0.0),
            ease: Ease::default(),
        })
    }

    /// Recolor `target` to `color`.
    pub fn fill(target: impl Into<String>, color: Rgba, duration_s: f32) -> Self {
        Self::tween(target, Channel::Fill, Value::Color(color), duration_s)
    }

    /// Fade `target` to `alpha`.
    pub fn fade(target: impl Into<String>, alpha: f32, duration_s: f32) -> Self {
        Self::tween(target, Channel::Alpha, Value::Scalar(alpha), duration_s)
    }

    /// Move the motion-layer translation of `target` to `to`.
    pub fn translate(target: impl Into<String>, to: [f32; 2], duration_s: f32) -> Self {
        let target = target.into();
        Anim::All(vec![
            Self::tween(
                target.clone(),
                Channel::TranslateX,
                Value::Scalar(to[0]),
                duration_s,
            ),
            Self::tween(target, Channel::TranslateY, Value::Scalar(to[1]), duration_s),
        ])
    }

    pub fn scale(target: impl Into<String>, to: f32, duration_s: f32) -> Self {
        Self::tween(target, Channel::Scale, Value::Scalar(to), duration_s)
    }

    pub fn all(parts: impl IntoIterator<Item = Anim>) -> Self {
        Anim::All(parts.into_iter().collect())
    }

    pub fn chain(parts: impl IntoIterator<Item = Anim>) -> Self {
        Anim::Chain(parts.into_iter().collect())
    }

    #[inline]
    pub fn wait(duration_s: f32) -> Self {
        Anim::Wait(duration_s.max(0.0))
    }

    /// Replace the easing of every tween inside.
    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.set_ease(ease);
        self
    }

    fn set_ease(&mut self, ease: Ease) {
        match self {
            Anim::Tween(tw) => tw.ease = ease,
            Anim::All(parts) | Anim::Chain(parts) => {
                parts.iter_mut().for_each(|p| p.set_ease(ease));
            }
            Anim::Wait(_) => {}
        }
    }

    /// Total duration in seconds.
    pub fn duration(&self) -> f32 {
        match self {
            Anim::Tween(tw) => tw.duration_s,
            Anim::All(parts) => parts.iter().map(Anim::duration).fold(0.0, f32::max),
            Anim::Chain(parts) => parts.iter().map(Anim::duration).sum(),
            Anim::Wait(d) => *d,
        }
    }

    /// Number of tweens inside.
    pub fn tween_count(&self) -> usize {
        match self {
            Anim::Tween(_) => 1,
            Anim::All(parts) | Anim::Chain(parts) => parts.iter().map(Anim::tween_count).sum(),
            Anim::Wait(_) => 0,
        }
    }

    /// Every tween with its start offset (relative to this animation's start).
    pub fn scheduled(&self) -> Vec<(f32, &Tween)> {
        let mut out = Vec::new();
        self.schedule_into(0.0, &mut out);
        out
    }

    /// Last tween destination for `(target, channel)`, in schedule order.
    pub fn final_value(&self, target: &str, channel: Channel) -> Option<Value> {
        let mut scheduled = self.scheduled();
        scheduled.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scheduled
            .into_iter()
            .filter(|(_, tw)| tw.target == target && tw.channel == channel)
            .map(|(_, tw)| tw.to)
            .last()
    }

    fn schedule_into<'a>(&'a self, start_s: f32, out: &mut Vec<(f32, &'a Tween)>) {
        match self {
            Anim::Tween(tw) => out.push((start_s, tw)),
            Anim::All(parts) => {
                for part in parts {
                    part.schedule_into(start_s, out);
                }
            }
            Anim::Chain(parts) => {
                let mut t = start_s;
                for part in parts {
                    part.schedule_into(t, out);
                    t += part.duration();
                }
            }
            Anim::Wait(_) => {}
        }
    }

    /// Compile into a timeline starting at absolute time `start_s`.
    ///
    /// - Start values come from the live scene, or from the previous tween on the same
    ///   `(target, channel)` in this animation.
    /// - Tweens on the same `(target, channel)` share one track.
    /// - Tweens whose target is missing, or whose value kind does not match the
    ///   channel, are skipped.
    pub fn compile(&self, scene: &Scene2D, start_s: f32) -> Timeline {
        let mut scheduled = self.scheduled();
        scheduled.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut projected: HashMap<(&str, Channel), Value> = HashMap::new();
        let mut track_of: HashMap<(&str, Channel), usize> = HashMap::new();
        let mut timeline = Timeline::new();

        for (offset, tw) in scheduled {
            let key = (tw.target.as_str(), tw.channel);
            let from = match projected.get(&key) {
                Some(v) => *v,
                None => match scene.get(&tw.target) {
                    Some(obj) => tw.channel.read(obj),
                    None => {
                        log::debug!("anim: skipping tween on missing target {:?}", tw.target);
                        continue;
                    }
                },
            };

            let idx = *track_of.entry(key).or_insert_with(|| {
                timeline.add_track(tw.channel.new_track(AnimTarget::Name(tw.target.clone())));
                timeline.tracks.len() - 1
            });

            let t0 = start_s + offset;
            let t1 = t0 + tw.duration_s;
            if !timeline.tracks[idx].push_segment(t0, t1, from, tw.to, tw.ease) {
                log::warn!(
                    "anim: value {:?} does not fit channel {:?} on {:?}",
                    tw.to,
                    tw.channel,
                    tw.target
                );
                continue;
            }
            projected.insert(key, tw.to);
        }

        for track in &mut timeline.tracks {
            track.sort_keyframes();
        }
        timeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_compose() {
        let a = Anim::chain([
            Anim::fade("x", 1.0, 0.5),
            Anim::all([Anim::fade("y", 1.0, 1.0), Anim::wait(2.0)]),
        ]);
        assert_eq!(a.duration(), 2.5);
        assert_eq!(a.tween_count(), 2);
        assert_eq!(Anim::empty().duration(), 0.0);
    }

    #[test]
    fn chained_tweens_start_where_previous_ended() {
        let mut scene = Scene2D::new();
        scene.add_root(Mobject2D::new("x"));

        let anim = Anim::chain([
            Anim::scale("x", 2.0, 1.0).with_ease(crate::anim::Ease::Linear),
            Anim::scale("x", 4.0, 1.0).with_ease(crate::anim::Ease::Linear),
        ]);
        let tl = anim.compile(&scene, 10.0);
        assert_eq!(tl.tracks.len(), 1);

        tl.apply(&mut scene, 10.5);
        assert_eq!(scene.get("x").unwrap().motion.scale, 1.5);
        tl.apply(&mut scene, 11.5);
        assert_eq!(scene.get("x").unwrap().motion.scale, 3.0);
        tl.apply(&mut scene, 99.0);
        assert_eq!(scene.get("x").unwrap().motion.scale, 4.0);
    }

    #[test]
    fn missing_targets_are_skipped() {
        let scene = Scene2D::new();
        let tl = Anim::fade("ghost", 0.0, 1.0).compile(&scene, 0.0);
        assert!(tl.tracks.is_empty());
    }

    #[test]
    fn mismatched_values_are_skipped() {
        let mut scene = Scene2D::new();
        scene.add_root(Mobject2D::new("x"));
        let tl = Anim::tween("x", Channel::Fill, Value::Scalar(1.0), 1.0).compile(&scene, 0.0);
        assert!(tl.bounds().is_none());
    }

    #[test]
    fn final_value_follows_schedule_order() {
        let anim = Anim::chain([
            Anim::fill("x", Rgba::WHITE, 1.0),
            Anim::fill("x", Rgba::BLACK, 1.0),
        ]);
        assert_eq!(
            anim.final_value("x", Channel::Fill),
            Some(Value::Color(Rgba::BLACK))
        );
        assert_eq!(anim.final_value("x", Channel::Alpha), None);
    }
}
