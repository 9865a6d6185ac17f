//! Minimal animation timeline for `Scene2D`.
//!
//! Animated properties:
//! - `Mobject2D.motion` (translate / rotate / uniform scale)
//! - `Mobject2D.fill` (full color, or just alpha for fades)
//!
//! A `Timeline` is a flat set of keyframe tracks sampled at absolute time `t`.
//! Scene scripts rarely build tracks by hand; they compose [`Anim`] values
//! (`tween`, `all`, `chain`, `wait`) and the [`Player`] compiles each step into a
//! timeline when the step starts.
//!
//! Usage sketch:
//! ```ignore
//! use lexiscope::anim::{Timeline, Ease, AnimTarget, Track, Keyframe};
//! let mut tl = Timeline::new();
//! tl.add_track(Track::new_alpha(AnimTarget::Name("label".into()))
//!     .with_keyframes(vec![
//!         Keyframe::at(0.0, 0.0).ease(Ease::OutCubic),
//!         Keyframe::at(0.6, 1.0).ease(Ease::OutCubic),
//!     ]));
//! // per frame:
//! tl.apply(&mut scene, t);
//! ```

pub mod compose;
pub mod player;

pub use compose::{Anim, Channel, Tween};
pub use player::{Player, Script};

use crate::scene::{Rgba, Scene2D};

/// How to map animation time into a normalized [0,1] parameter.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Ease {
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    #[default]
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
}

impl Ease {
    #[inline]
    pub fn sample(self, x: f32) -> f32 {
        let t = x.clamp(0.0, 1.0);
        match self {
            Ease::Linear => t,
            Ease::InQuad => t * t,
            Ease::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Ease::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) * 0.5
                }
            }
            Ease::InCubic => t * t * t,
            Ease::OutCubic => 1.0 - (1.0 - t).powi(3),
            Ease::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) * 0.5
                }
            }
            Ease::InQuart => t.powi(4),
            Ease::OutQuart => 1.0 - (1.0 - t).powi(4),
            Ease::InOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) * 0.5
                }
            }
        }
    }
}

/// Identifies which object in the scene to animate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnimTarget {
    /// Any named object in the scene (roots and descendants).
    Name(String),
}

impl AnimTarget {
    #[inline]
    pub fn name(&self) -> &str {
        match self {
            AnimTarget::Name(name) => name,
        }
    }
}

/// Values a keyframe can interpolate.
pub trait Lerp: Copy {
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Rgba {
    #[inline]
    fn lerp(self, other: Self, t: f32) -> Self {
        Rgba::lerp(self, other, t)
    }
}

/// A keyframe in seconds. The ease applies to the segment that *starts* here.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Keyframe<T = f32> {
    pub time_s: f32,
    pub value: T,
    pub ease: Ease,
}

impl<T> Keyframe<T> {
    #[inline]
    pub fn at(time_s: f32, value: T) -> Self {
        Self {
            time_s: time_s.max(0.0),
            value,
            ease: Ease::Linear,
        }
    }

    #[inline]
    pub fn ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

/// Interpolate a track across keyframes (sorted by time).
///
/// Before the first keyframe the first value holds; at or past the last keyframe the
/// last value holds. The end check comes first so zero-length segments snap.
fn sample_keyframes<T: Lerp>(frames: &[Keyframe<T>], t_s: f32) -> Option<T> {
    let last = frames.last()?;
    if t_s >= last.time_s {
        return Some(last.value);
    }

    let mut prev = frames[0];
    if t_s <= prev.time_s {
        return Some(prev.value);
    }

    for next in &frames[1..] {
        if t_s < next.time_s {
            let dt = (next.time_s - prev.time_s).max(1e-6);
            let u = (t_s - prev.time_s) / dt;
            let k = prev.ease.sample(u);
            return Some(prev.value.lerp(next.value, k));
        }
        prev = *next;
    }

    Some(last.value)
}

fn time_bounds<T>(frames: &[Keyframe<T>]) -> Option<(f32, f32)> {
    if frames.is_empty() {
        return None;
    }
    Some((
        frames.iter().map(|k| k.time_s).fold(f32::INFINITY, f32::min),
        frames
            .iter()
            .map(|k| k.time_s)
            .fold(f32::NEG_INFINITY, f32::max),
    ))
}

fn sort_by_time<T>(frames: &mut [Keyframe<T>]) {
    // Stable: equal-time keyframes keep insertion order.
    frames.sort_by(|a, b| {
        a.time_s
            .partial_cmp(&b.time_s)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// A sampled property value.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Value {
    Scalar(f32),
    Color(Rgba),
}

/// What property to animate for a target.
#[derive(Debug, Clone)]
pub enum Property {
    /// Alpha channel (`fill.a`).
    Alpha { keyframes: Vec<Keyframe> },

    /// Translation X (pt) of the motion layer.
    TranslateX { keyframes: Vec<Keyframe> },

    /// Translation Y (pt) of the motion layer.
    TranslateY { keyframes: Vec<Keyframe> },

    /// Rotation (radians) of the motion layer.
    Rotate { keyframes: Vec<Keyframe> },

    /// Uniform scale of the motion layer.
    Scale { keyframes: Vec<Keyframe> },

    /// Full fill color.
    Fill { keyframes: Vec<Keyframe<Rgba>> },
}

impl Property {
    fn scalar_frames_mut(&mut self) -> Option<&mut Vec<Keyframe>> {
        match self {
            Property::Alpha { keyframes }
            | Property::TranslateX { keyframes }
            | Property::TranslateY { keyframes }
            | Property::Rotate { keyframes }
            | Property::Scale { keyframes } => Some(keyframes),
            Property::Fill { .. } => None,
        }
    }

    fn start_end(&self) -> Option<(f32, f32)> {
        match self {
            Property::Alpha { keyframes }
            | Property::TranslateX { keyframes }
            | Property::TranslateY { keyframes }
            | Property::Rotate { keyframes }
            | Property::Scale { keyframes } => time_bounds(keyframes),
            Property::Fill { keyframes } => time_bounds(keyframes),
        }
    }

    fn sample(&self, t_s: f32) -> Option<Value> {
        match self {
            Property::Alpha { keyframes }
            | Property::TranslateX { keyframes }
            | Property::TranslateY { keyframes }
            | Property::Rotate { keyframes }
            | Property::Scale { keyframes } => sample_keyframes(keyframes, t_s).map(Value::Scalar),
            Property::Fill { keyframes } => sample_keyframes(keyframes, t_s).map(Value::Color),
        }
    }

    fn sort(&mut self) {
        match self {
            Property::Fill { keyframes } => sort_by_time(keyframes),
            other => {
                if let Some(k) = other.scalar_frames_mut() {
                    sort_by_time(k);
                }
            }
        }
    }
}

/// One animation track applies one property to one target.
#[derive(Debug, Clone)]
pub struct Track {
    pub target: AnimTarget,
    pub property: Property,
}

impl Track {
    pub fn new_alpha(target: AnimTarget) -> Self {
        Self {
            target,
            property: Property::Alpha {
                keyframes: Vec::new(),
            },
        }
    }

    pub fn new_translate_x(target: AnimTarget) -> Self {
        Self {
            target,
            property: Property::TranslateX {
                keyframes: Vec::new(),
            },
        }
    }

    pub fn new_translate_y(target: AnimTarget) -> Self {
        Self {
            target,
            property: Property::TranslateY {
                keyframes: Vec::new(),
            },
        }
    }

    pub fn new_rotate(target: AnimTarget) -> Self {
        Self {
            target,
            property: Property::Rotate {
                keyframes: Vec::new(),
            },
        }
    }

    pub fn new_scale(target: AnimTarget) -> Self {
        Self {
            target,
            property: Property::Scale {
                keyframes: Vec::new(),
            },
        }
    }

    pub fn new_fill(target: AnimTarget) -> Self {
        Self {
            target,
            property: Property::Fill {
                keyframes: Vec::new(),
            },
        }
    }

    /// Set scalar keyframes. No-op on a `Fill` track.
    pub fn with_keyframes(mut self, keyframes: Vec<Keyframe>) -> Self {
        if let Some(k) = self.property.scalar_frames_mut() {
            *k = keyframes;
        }
        self.property.sort();
        self
    }

    /// Set color keyframes. No-op on scalar tracks.
    pub fn with_color_keyframes(mut self, keyframes: Vec<Keyframe<Rgba>>) -> Self {
        if let Property::Fill { keyframes: k } = &mut self.property {
            *k = keyframes;
        }
        self.property.sort();
        self
    }

    /// Append a segment `from -> to` over `[start_s, end_s]`.
    ///
    /// Returns `false` if the value kind does not match the property.
    pub(crate) fn push_segment(
        &mut self,
        start_s: f32,
        end_s: f32,
        from: Value,
        to: Value,
        ease: Ease,
    ) -> bool {
        match (&mut self.property, from, to) {
            (Property::Fill { keyframes }, Value::Color(a), Value::Color(b)) => {
                keyframes.push(Keyframe::at(start_s, a).ease(ease));
                keyframes.push(Keyframe::at(end_s, b));
                true
            }
            (property, Value::Scalar(a), Value::Scalar(b)) => match property.scalar_frames_mut() {
                Some(keyframes) => {
                    keyframes.push(Keyframe::at(start_s, a).ease(ease));
                    keyframes.push(Keyframe::at(end_s, b));
                    true
                }
                None => false,
            },
            _ => false,
        }
    }

    pub(crate) fn sort_keyframes(&mut self) {
        self.property.sort();
    }

    pub fn bounds(&self) -> Option<(f32, f32)> {
        self.property.start_end()
    }
}

/// A timeline holds multiple tracks. Tracks are evaluated independently at time t.
#[derive(Debug, Default)]
pub struct Timeline {
    pub tracks: Vec<Track>,
}

impl Timeline {
    pub fn new() -> Self {
        Self { tracks: Vec::new() }
    }

    pub fn add_track(&mut self, track: Track) -> &mut Self {
        self.tracks.push(track);
        self
    }

    /// Compute the time bounds of the whole timeline.
    pub fn bounds(&self) -> Option<(f32, f32)> {
        let mut start = f32::INFINITY;
        let mut end = f32::NEG_INFINITY;
        let mut any = false;

        for tr in &self.tracks {
            if let Some((s, e)) = tr.bounds() {
                start = start.min(s);
                end = end.max(e);
                any = true;
            }
        }

        if any { Some((start, end)) } else { None }
    }

    /// Apply this timeline to the scene at time `t_s`.
    ///
    /// - Only properties that have a track are written; everything else on the object
    ///   keeps its current value (so steps compiled one after another compose).
    /// - Conflicts on the same object/property: last track wins.
    /// - Alpha tracks apply after fill tracks, so a fade survives a recolor.
    /// - Tracks whose target is missing from the scene are skipped.
    pub fn apply(&self, scene: &mut Scene2D, t_s: f32) {
        let (alpha, rest): (Vec<&Track>, Vec<&Track>) = self
            .tracks
            .iter()
            .partition(|tr| matches!(tr.property, Property::Alpha { .. }));

        for tr in rest.into_iter().chain(alpha) {
            let Some(v) = tr.property.sample(t_s) else {
                continue;
            };
            let Some(obj) = scene.get_mut(tr.target.name()) else {
                continue;
            };

            match (&tr.property, v) {
                (Property::Alpha { .. }, Value::Scalar(a)) => obj.fill.a = a.clamp(0.0, 1.0),
                (Property::TranslateX { .. }, Value::Scalar(x)) => obj.motion.tx = x,
                (Property::TranslateY { .. }, Value::Scalar(y)) => obj.motion.ty = y,
                (Property::Rotate { .. }, Value::Scalar(r)) => obj.motion.rotate = r,
                (Property::Scale { .. }, Value::Scalar(s)) => obj.motion.scale = s,
                (Property::Fill { .. }, Value::Color(c)) => obj.fill = c,
                _ => {}
            }
        }
    }
}
