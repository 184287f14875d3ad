use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::events::{CueRequest, MovementOutput};

/// Duration reported when a cue has no clip to play.
pub const MISSING_CUE_DURATION: f32 = 0.1;

/// Outward animation trigger. The core never knows how cues are rendered.
pub trait CuePlayer {
    /// Start a timed cue; returns its effective duration in seconds.
    fn play_timed_cue(&mut self, id: &str, rate: f32, start: f32, stop_competing: bool) -> f32;
}

/// One row of the animation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementAnimation {
    pub name: String,
    /// Clip identifier understood by the animation layer.
    pub clip: Option<String>,
    /// Clip length in seconds at rate 1.
    pub clip_length: f32,
    pub play_rate: f32,
    pub start_position: f32,
    pub stop_competing: bool,
}

impl Default for MovementAnimation {
    fn default() -> Self {
        Self {
            name: String::new(),
            clip: None,
            clip_length: 0.0,
            play_rate: 1.0,
            start_position: 0.0,
            stop_competing: true,
        }
    }
}

impl MovementAnimation {
    pub fn clip(name: &str, clip: &str, clip_length: f32) -> Self {
        Self {
            name: name.into(),
            clip: Some(clip.into()),
            clip_length,
            ..default()
        }
    }

    /// Play through any cue player.
    pub fn play_with(&self, player: &mut dyn CuePlayer) -> f32 {
        let Some(clip) = &self.clip else {
            warn!("Animation row '{}' has no clip, skipping cue", self.name);
            return MISSING_CUE_DURATION;
        };
        player.play_timed_cue(clip, self.play_rate, self.start_position, self.stop_competing)
    }
}

/// Animation rows used by the controller itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementAnimations {
    pub prone: MovementAnimation,
    pub slide: MovementAnimation,
    pub double_jump: MovementAnimation,
    pub parachute: MovementAnimation,
}

/// Built-in player: queues the cue on the operation output and reports
/// `clip_length * rate` as the duration.
pub struct CueQueue<'a> {
    pub out: &'a mut MovementOutput,
    pub clip_length: f32,
}

impl CuePlayer for CueQueue<'_> {
    fn play_timed_cue(&mut self, id: &str, rate: f32, start: f32, stop_competing: bool) -> f32 {
        self.out.cues.push(CueRequest {
            id: id.into(),
            rate,
            start,
            stop_competing,
        });
        self.clip_length * rate
    }
}

/// Queue `anim` on `out`.
pub fn play_animation(out: &mut MovementOutput, anim: &MovementAnimation) -> f32 {
    let mut queue = CueQueue {
        out,
        clip_length: anim.clip_length,
    };
    anim.play_with(&mut queue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_cue_reports_scaled_length() {
        let mut out = MovementOutput::default();
        let mut anim = MovementAnimation::clip("double_jump", "flip_01", 1.2);
        anim.play_rate = 2.0;
        let duration = play_animation(&mut out, &anim);
        assert!((duration - 2.4).abs() < 1e-6);
        assert_eq!(out.cues.len(), 1);
        assert_eq!(out.cues[0].id, "flip_01");
        assert!(out.cues[0].stop_competing);
    }

    #[test]
    fn missing_clip_is_skipped() {
        let mut out = MovementOutput::default();
        let duration = play_animation(&mut out, &MovementAnimation::default());
        assert_eq!(duration, MISSING_CUE_DURATION);
        assert!(out.cues.is_empty());
    }
}
