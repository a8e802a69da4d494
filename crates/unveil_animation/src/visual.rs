//! Visual states for reveal transitions
//!
//! A reveal is a move between two configurations: a pre-reveal state
//! (reduced opacity, offset position) and the resting revealed state. Which
//! one applies is a pure function of whether the viewport signal fired and
//! whether the delay elapsed; the curve in between only matters to renderers.

use crate::easing::Easing;

/// Renderable configuration of a revealed subtree
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisualState {
    /// Opacity (0.0 to 1.0)
    pub opacity: f32,
    /// Translation X in pixels
    pub translate_x: f32,
    /// Translation Y in pixels
    pub translate_y: f32,
    /// Uniform scale factor
    pub scale: f32,
}

impl VisualState {
    /// Fully opaque at the resting position
    pub const RESTING: Self = Self {
        opacity: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
    };

    pub fn lerp(&self, to: &VisualState, t: f32) -> VisualState {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        VisualState {
            opacity: mix(self.opacity, to.opacity),
            translate_x: mix(self.translate_x, to.translate_x),
            translate_y: mix(self.translate_y, to.translate_y),
            scale: mix(self.scale, to.scale),
        }
    }
}

impl Default for VisualState {
    fn default() -> Self {
        Self::RESTING
    }
}

/// Where the subtree starts from before it is revealed
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RevealPreset {
    /// Fade in place
    Fade,
    /// Fade in while rising by `distance` pixels
    FadeUp { distance: f32 },
    /// Fade in while sliding in from the left
    SlideFromLeft { distance: f32 },
    /// Fade in while sliding in from the right
    SlideFromRight { distance: f32 },
    /// Fade in while growing from `from` scale
    ScaleIn { from: f32 },
}

impl RevealPreset {
    pub fn pre_reveal(&self) -> VisualState {
        let hidden = VisualState {
            opacity: 0.0,
            ..VisualState::RESTING
        };
        match *self {
            RevealPreset::Fade => hidden,
            RevealPreset::FadeUp { distance } => VisualState {
                translate_y: distance,
                ..hidden
            },
            RevealPreset::SlideFromLeft { distance } => VisualState {
                translate_x: -distance,
                ..hidden
            },
            RevealPreset::SlideFromRight { distance } => VisualState {
                translate_x: distance,
                ..hidden
            },
            RevealPreset::ScaleIn { from } => VisualState {
                scale: from,
                ..hidden
            },
        }
    }

    pub fn revealed(&self) -> VisualState {
        VisualState::RESTING
    }
}

impl Default for RevealPreset {
    fn default() -> Self {
        RevealPreset::FadeUp { distance: 20.0 }
    }
}

/// The two-state outcome of a reveal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealPhase {
    PreReveal,
    Revealed,
}

/// Pure reveal rule: revealed only once the signal fired and the delay passed
pub fn reveal_phase(fired: bool, delay_elapsed: bool) -> RevealPhase {
    if fired && delay_elapsed {
        RevealPhase::Revealed
    } else {
        RevealPhase::PreReveal
    }
}

/// A timed transition from a preset's pre-reveal state to rest
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealTransition {
    pub preset: RevealPreset,
    pub duration_ms: u32,
    pub easing: Easing,
}

impl RevealTransition {
    pub fn new(preset: RevealPreset, duration_ms: u32) -> Self {
        Self {
            preset,
            duration_ms,
            easing: Easing::default(),
        }
    }

    /// Visual state `elapsed_ms` after the reveal was applied, or the
    /// pre-reveal state if it has not been applied
    pub fn sample(&self, elapsed_ms: Option<u64>) -> VisualState {
        let from = self.preset.pre_reveal();
        let to = self.preset.revealed();
        match elapsed_ms {
            None => from,
            Some(_) => from.lerp(&to, self.progress(elapsed_ms)),
        }
    }

    /// Eased progress in `0.0..=1.0`; zero until the reveal is applied
    pub fn progress(&self, elapsed_ms: Option<u64>) -> f32 {
        match elapsed_ms {
            None => 0.0,
            Some(_) if self.duration_ms == 0 => 1.0,
            Some(elapsed) => {
                let linear = (elapsed as f32 / self.duration_ms as f32).min(1.0);
                self.easing.apply(linear)
            }
        }
    }

    /// Whether the transition has settled at rest
    pub fn is_settled(&self, elapsed_ms: Option<u64>) -> bool {
        elapsed_ms.is_some_and(|elapsed| elapsed >= self.duration_ms as u64)
    }
}

impl Default for RevealTransition {
    fn default() -> Self {
        Self::new(RevealPreset::default(), 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reveal_phase_needs_both_conditions() {
        assert_eq!(reveal_phase(false, false), RevealPhase::PreReveal);
        assert_eq!(reveal_phase(true, false), RevealPhase::PreReveal);
        assert_eq!(reveal_phase(false, true), RevealPhase::PreReveal);
        assert_eq!(reveal_phase(true, true), RevealPhase::Revealed);
    }

    #[test]
    fn test_presets_start_hidden_and_end_at_rest() {
        for preset in [
            RevealPreset::Fade,
            RevealPreset::FadeUp { distance: 20.0 },
            RevealPreset::SlideFromLeft { distance: 50.0 },
            RevealPreset::SlideFromRight { distance: 50.0 },
            RevealPreset::ScaleIn { from: 0.8 },
        ] {
            assert_eq!(preset.pre_reveal().opacity, 0.0);
            assert_eq!(preset.revealed(), VisualState::RESTING);
        }
        assert_eq!(
            RevealPreset::SlideFromLeft { distance: 50.0 }.pre_reveal().translate_x,
            -50.0
        );
    }

    #[test]
    fn test_sample_progresses_to_rest() {
        let transition = RevealTransition {
            easing: Easing::Linear,
            ..RevealTransition::default()
        };

        assert_eq!(transition.sample(None).translate_y, 20.0);
        let halfway = transition.sample(Some(250));
        assert!((halfway.opacity - 0.5).abs() < 1e-6);
        assert!((halfway.translate_y - 10.0).abs() < 1e-6);
        assert_eq!(transition.sample(Some(500)), VisualState::RESTING);
        assert_eq!(transition.sample(Some(5000)), VisualState::RESTING);
    }

    #[test]
    fn test_zero_duration_jumps_to_rest() {
        let transition = RevealTransition::new(RevealPreset::Fade, 0);
        assert_eq!(transition.sample(Some(0)), VisualState::RESTING);
        assert!(transition.is_settled(Some(0)));
        assert!(!transition.is_settled(None));
    }

    #[test]
    fn test_progress_is_eased_and_clamped() {
        let transition = RevealTransition::new(RevealPreset::Fade, 1000);
        assert_eq!(transition.progress(None), 0.0);
        assert_eq!(transition.progress(Some(0)), 0.0);

        let early = transition.progress(Some(250));
        assert!(early > 0.25, "ease-out runs ahead of linear: {early}");
        assert_eq!(transition.progress(Some(1000)), 1.0);
        assert_eq!(transition.progress(Some(60_000)), 1.0);
    }
}
