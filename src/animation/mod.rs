use std::time::Duration;

use clap::ValueEnum;

use crate::{
    color::{Color, ColorFrame},
    event::LifecycleEvent,
};

mod engine;

pub use engine::AnimationEngine;

/// How long wake and response colors stay up on their own
pub const HOLD: Duration = Duration::from_millis(1000);
/// Each half of a connect flash
pub const FLASH_HALF_CYCLE: Duration = Duration::from_millis(300);
pub const FLASH_COUNT: usize = 3;

/// What the LEDs are showing. Every state has its own presentation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LightState {
    /// Black
    Idle,
    /// Solid yellow
    Listening,
    /// Blue, held for a second
    WakeDetected,
    /// Solid yellow
    Processing,
    /// Green, held for a second
    Responding,
    /// Black
    StreamEnded,
    /// Green/black flashing, three times
    SatelliteConnecting,
    /// Solid red
    SatelliteDisconnected,
}

impl From<LifecycleEvent> for LightState {
    fn from(event: LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::StreamingStarted => LightState::Listening,
            LifecycleEvent::WakeDetected => LightState::WakeDetected,
            LifecycleEvent::VoiceStarted => LightState::Listening,
            LifecycleEvent::TranscriptReady => LightState::Responding,
            LifecycleEvent::StreamingStopped => LightState::Idle,
            LifecycleEvent::SatelliteRun => LightState::Idle,
            LifecycleEvent::SatelliteConnected => LightState::SatelliteConnecting,
            LifecycleEvent::SatelliteDisconnected => LightState::SatelliteDisconnected,
        }
    }
}

impl LightState {
    /// The steps that present this state on `led_count` LEDs
    pub fn sequence(self, led_count: usize) -> AnimationSequence {
        let solid = |color| AnimationSequence::solid(led_count, color);
        let held = |color| {
            AnimationSequence::new(vec![AnimationStep::fill(led_count, color, HOLD)])
        };

        match self {
            LightState::Idle | LightState::StreamEnded => solid(Color::BLACK),
            LightState::Listening | LightState::Processing => solid(Color::YELLOW),
            LightState::WakeDetected => held(Color::BLUE),
            LightState::Responding => held(Color::GREEN),
            LightState::SatelliteDisconnected => solid(Color::RED),
            LightState::SatelliteConnecting => AnimationSequence::new(
                (0..FLASH_COUNT)
                    .flat_map(|_| {
                        [
                            AnimationStep::fill(led_count, Color::GREEN, FLASH_HALF_CYCLE),
                            AnimationStep::fill(led_count, Color::BLACK, FLASH_HALF_CYCLE),
                        ]
                    })
                    .collect(),
            ),
        }
    }
}

/// A frame and how long it stays up before the next step. A zero hold means
/// the frame stays until something else replaces it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationStep {
    pub frame: ColorFrame,
    pub hold: Duration,
}

impl AnimationStep {
    pub fn fill(led_count: usize, color: Color, hold: Duration) -> Self {
        Self {
            frame: ColorFrame::filled(led_count, color),
            hold,
        }
    }
}

/// Steps played back to back
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationSequence {
    steps: Vec<AnimationStep>,
}

impl AnimationSequence {
    pub fn new(steps: Vec<AnimationStep>) -> Self {
        Self { steps }
    }

    pub fn solid(led_count: usize, color: Color) -> Self {
        Self::new(vec![AnimationStep::fill(led_count, color, Duration::ZERO)])
    }

    pub fn steps(&self) -> &[AnimationStep] {
        &self.steps
    }

    /// Total time the sequence takes when nothing interrupts it
    pub fn duration(&self) -> Duration {
        self.steps.iter().map(|step| step.hold).sum()
    }

    /// Whether playing this needs the engine to wait at all
    pub fn is_timed(&self) -> bool {
        !self.duration().is_zero()
    }
}

impl IntoIterator for AnimationSequence {
    type Item = AnimationStep;
    type IntoIter = std::vec::IntoIter<AnimationStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_map_to_states() {
        use LifecycleEvent::*;

        let expected = [
            (StreamingStarted, LightState::Listening),
            (WakeDetected, LightState::WakeDetected),
            (VoiceStarted, LightState::Listening),
            (TranscriptReady, LightState::Responding),
            (StreamingStopped, LightState::Idle),
            (SatelliteRun, LightState::Idle),
            (SatelliteConnected, LightState::SatelliteConnecting),
            (SatelliteDisconnected, LightState::SatelliteDisconnected),
        ];

        for (event, state) in expected {
            assert_eq!(LightState::from(event), state);
        }
    }

    #[test]
    fn solid_states_do_not_wait() {
        for state in [
            LightState::Idle,
            LightState::Listening,
            LightState::Processing,
            LightState::StreamEnded,
            LightState::SatelliteDisconnected,
        ] {
            let sequence = state.sequence(3);
            assert_eq!(sequence.steps().len(), 1);
            assert!(!sequence.is_timed());
        }

        assert_eq!(
            LightState::SatelliteDisconnected.sequence(2).steps()[0].frame,
            ColorFrame::filled(2, Color::RED)
        );
    }

    #[test]
    fn holds_last_one_second() {
        let wake = LightState::WakeDetected.sequence(3);
        assert_eq!(wake.steps(), &[AnimationStep::fill(3, Color::BLUE, HOLD)]);

        let responding = LightState::Responding.sequence(3);
        assert_eq!(responding.duration(), Duration::from_secs(1));
    }

    #[test]
    fn connect_flash_alternates_green_and_black() {
        let flash = LightState::SatelliteConnecting.sequence(1);

        let colors: Vec<Color> = flash.steps().iter().map(|step| step.frame[0]).collect();
        assert_eq!(colors, [Color::GREEN, Color::BLACK].repeat(3));
        assert_eq!(flash.duration(), Duration::from_millis(1800));
    }
}
