use std::fmt::{self, Display};

/// The satellite lifecycle events that change the LEDs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    StreamingStarted,
    WakeDetected,
    VoiceStarted,
    TranscriptReady,
    StreamingStopped,
    SatelliteRun,
    SatelliteConnected,
    SatelliteDisconnected,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 8] = [
        LifecycleEvent::StreamingStarted,
        LifecycleEvent::WakeDetected,
        LifecycleEvent::VoiceStarted,
        LifecycleEvent::TranscriptReady,
        LifecycleEvent::StreamingStopped,
        LifecycleEvent::SatelliteRun,
        LifecycleEvent::SatelliteConnected,
        LifecycleEvent::SatelliteDisconnected,
    ];

    /// Map a Wyoming event type onto a lifecycle event. Anything that doesn't
    /// affect the LEDs is `None`.
    pub fn from_wire(kind: &str) -> Option<Self> {
        LifecycleEvent::ALL
            .into_iter()
            .find(|event| event.wire_name() == kind)
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            LifecycleEvent::StreamingStarted => "streaming-started",
            LifecycleEvent::WakeDetected => "detection",
            LifecycleEvent::VoiceStarted => "voice-started",
            LifecycleEvent::TranscriptReady => "transcript",
            LifecycleEvent::StreamingStopped => "streaming-stopped",
            LifecycleEvent::SatelliteRun => "run-satellite",
            LifecycleEvent::SatelliteConnected => "satellite-connected",
            LifecycleEvent::SatelliteDisconnected => "satellite-disconnected",
        }
    }
}

impl Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
