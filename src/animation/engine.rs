use std::future::Future;

use log::{debug, info};
use tokio::{sync::mpsc, time::sleep};

use super::LightState;
use crate::{
    controller::LedController,
    error::LedError,
    event::LifecycleEvent,
    sink::{PixelSink, Transport},
};

/// How a sequence ended
enum Playback {
    Completed,
    /// A newer event arrived during a hold
    Preempted(LifecycleEvent),
    /// The event stream closed during a hold
    Closed,
}

/// Turns lifecycle events into LED colors.
///
/// Events are handled one at a time, in the order they arrive. Holds and
/// flashes are raced against the next event: whichever comes first wins, and
/// a new event throws away whatever is left of the current animation. The
/// last event always decides what the LEDs show.
pub struct AnimationEngine<S: PixelSink = Transport> {
    controller: LedController<S>,
    state: LightState,
}

impl<S: PixelSink> AnimationEngine<S> {
    /// Starts out idle without sending anything
    pub fn new(controller: LedController<S>) -> Self {
        Self {
            controller,
            state: LightState::Idle,
        }
    }

    pub fn state(&self) -> LightState {
        self.state
    }

    pub fn controller(&self) -> &LedController<S> {
        &self.controller
    }

    /// Direct access for one-off updates outside of an animation
    pub fn controller_mut(&mut self) -> &mut LedController<S> {
        &mut self.controller
    }

    pub fn into_controller(self) -> LedController<S> {
        self.controller
    }

    /// Handle events until the sender side goes away. Transport errors stop
    /// the engine.
    pub async fn run(
        &mut self,
        events: &mut mpsc::Receiver<LifecycleEvent>,
    ) -> Result<(), LedError> {
        let mut pending = None;

        loop {
            let event = match pending.take() {
                Some(event) => event,
                None => match events.recv().await {
                    Some(event) => event,
                    None => break,
                },
            };

            match self.play(event, events).await? {
                Playback::Completed => {}
                Playback::Preempted(next) => pending = Some(next),
                Playback::Closed => break,
            }
        }

        info!("Event stream closed");
        Ok(())
    }

    /// Show a state from start to finish, without listening for events
    pub async fn present(&mut self, state: LightState) -> Result<(), LedError> {
        self.present_until(state, std::future::pending()).await?;
        Ok(())
    }

    /// Like [`AnimationEngine::present`], but gives up as soon as `stop`
    /// resolves. Returns whether the whole sequence was shown.
    pub async fn present_until<F>(&mut self, state: LightState, stop: F) -> Result<bool, LedError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(stop);

        self.state = state;
        for step in state.sequence(self.controller.led_count()) {
            self.controller.set_frame(step.frame)?;
            if step.hold.is_zero() {
                continue;
            }

            tokio::select! {
                biased;

                _ = &mut stop => {
                    debug!("{:?} stopped early", state);
                    return Ok(false);
                }
                _ = sleep(step.hold) => {}
            }
        }

        Ok(true)
    }

    /// Force the LEDs off and let go of the transport
    pub fn shutdown(mut self) {
        self.state = LightState::Idle;
        self.controller.cleanup();
    }

    async fn play(
        &mut self,
        event: LifecycleEvent,
        events: &mut mpsc::Receiver<LifecycleEvent>,
    ) -> Result<Playback, LedError> {
        let state = LightState::from(event);
        debug!("{} -> {:?}", event, state);
        self.state = state;

        for step in state.sequence(self.controller.led_count()) {
            self.controller.set_frame(step.frame)?;
            if step.hold.is_zero() {
                continue;
            }

            tokio::select! {
                biased;

                next = events.recv() => {
                    return Ok(match next {
                        Some(next) => {
                            debug!("{:?} cut short by {}", state, next);
                            Playback::Preempted(next)
                        }
                        None => Playback::Closed,
                    });
                }
                _ = sleep(step.hold) => {}
            }
        }

        Ok(Playback::Completed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;

    use super::*;
    use crate::{
        color::{Color, ColorFrame},
        sink::testing::RecordingSink,
    };

    const LEDS: usize = 3;

    fn engine() -> (AnimationEngine<RecordingSink>, RecordingSink) {
        let sink = RecordingSink::default();
        let controller = LedController::new(LEDS, sink.clone()).unwrap();
        (AnimationEngine::new(controller), sink)
    }

    fn fill(color: Color) -> ColorFrame {
        ColorFrame::filled(LEDS, color)
    }

    fn assert_at(elapsed: Duration, expected_ms: u64) {
        let expected = Duration::from_millis(expected_ms);
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(5),
            "expected ~{:?}, got {:?}",
            expected,
            elapsed
        );
    }

    /// Send each event after its delay, then close the stream once `linger`
    /// has passed
    async fn feed(
        tx: mpsc::Sender<LifecycleEvent>,
        script: Vec<(Duration, LifecycleEvent)>,
        linger: Duration,
    ) {
        for (delay, event) in script {
            sleep(delay).await;
            tx.send(event).await.unwrap();
        }
        sleep(linger).await;
    }

    #[tokio::test(start_paused = true)]
    async fn starts_idle_without_sending() {
        let (mut engine, sink) = engine();
        let (tx, mut rx) = mpsc::channel(8);
        drop(tx);

        engine.run(&mut rx).await.unwrap();

        assert_eq!(engine.state(), LightState::Idle);
        assert!(sink.frames().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn solid_states_follow_events() {
        let (mut engine, sink) = engine();
        let (tx, mut rx) = mpsc::channel(8);

        let script = vec![
            (Duration::ZERO, LifecycleEvent::SatelliteRun),
            (Duration::ZERO, LifecycleEvent::StreamingStarted),
            (Duration::ZERO, LifecycleEvent::StreamingStopped),
            (Duration::ZERO, LifecycleEvent::SatelliteDisconnected),
        ];
        let (result, ()) = tokio::join!(
            engine.run(&mut rx),
            feed(tx, script, Duration::from_secs(1))
        );
        result.unwrap();

        assert_eq!(
            sink.frames(),
            vec![
                fill(Color::BLACK),
                fill(Color::YELLOW),
                fill(Color::BLACK),
                fill(Color::RED),
            ]
        );
        assert_eq!(engine.state(), LightState::SatelliteDisconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_flash_runs_to_completion() {
        let (mut engine, sink) = engine();
        let (tx, mut rx) = mpsc::channel(8);
        let start = Instant::now();

        let script = vec![(Duration::ZERO, LifecycleEvent::SatelliteConnected)];
        let (result, ()) = tokio::join!(
            engine.run(&mut rx),
            feed(tx, script, Duration::from_secs(5))
        );
        result.unwrap();

        let frames = sink.timed_frames();
        assert_eq!(frames.len(), 6);
        for (i, (at, frame)) in frames.iter().enumerate() {
            let color = if i % 2 == 0 { Color::GREEN } else { Color::BLACK };
            assert_eq!(frame, &fill(color));
            assert_at(*at - start, 300 * i as u64);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_cancels_connect_flash() {
        let (mut engine, sink) = engine();
        let (tx, mut rx) = mpsc::channel(8);

        let script = vec![
            (Duration::ZERO, LifecycleEvent::SatelliteConnected),
            (Duration::from_millis(500), LifecycleEvent::SatelliteDisconnected),
        ];
        let (result, ()) = tokio::join!(
            engine.run(&mut rx),
            feed(tx, script, Duration::from_secs(3))
        );
        result.unwrap();

        // Green at 0ms, black at 300ms, then red as soon as the disconnect
        // arrives. Nothing from the flash comes after it.
        assert_eq!(
            sink.frames(),
            vec![fill(Color::GREEN), fill(Color::BLACK), fill(Color::RED)]
        );
        assert_eq!(engine.state(), LightState::SatelliteDisconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn new_event_cuts_a_hold_short() {
        let (mut engine, sink) = engine();
        let (tx, mut rx) = mpsc::channel(8);
        let start = Instant::now();

        let script = vec![
            (Duration::ZERO, LifecycleEvent::WakeDetected),
            (Duration::from_millis(200), LifecycleEvent::VoiceStarted),
        ];
        let (result, ()) = tokio::join!(
            engine.run(&mut rx),
            feed(tx, script, Duration::from_secs(2))
        );
        result.unwrap();

        let frames = sink.timed_frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].1, fill(Color::BLUE));
        assert_eq!(frames[1].1, fill(Color::YELLOW));
        assert_at(frames[1].0 - start, 200);
    }

    #[tokio::test(start_paused = true)]
    async fn closing_the_stream_ends_a_hold() {
        let (mut engine, sink) = engine();
        let (tx, mut rx) = mpsc::channel(8);

        let script = vec![(Duration::ZERO, LifecycleEvent::TranscriptReady)];
        let (result, ()) = tokio::join!(engine.run(&mut rx), feed(tx, script, Duration::ZERO));
        result.unwrap();

        assert_eq!(sink.frames(), vec![fill(Color::GREEN)]);
        assert_eq!(engine.state(), LightState::Responding);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_stop_the_engine() {
        let controller = LedController::new(LEDS, RecordingSink::failing()).unwrap();
        let mut engine = AnimationEngine::new(controller);
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(LifecycleEvent::StreamingStarted).await.unwrap();

        assert!(matches!(
            engine.run(&mut rx).await,
            Err(LedError::Transport(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn present_plays_the_whole_sequence() {
        let (mut engine, sink) = engine();
        let start = Instant::now();

        engine.present(LightState::SatelliteConnecting).await.unwrap();

        assert_eq!(sink.frames().len(), 6);
        assert_at(Instant::now() - start, 1800);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupted_presentation_stops_mid_flash() {
        let (mut engine, sink) = engine();
        let start = Instant::now();

        let finished = engine
            .present_until(LightState::SatelliteConnecting, sleep(Duration::from_millis(500)))
            .await
            .unwrap();

        assert!(!finished);
        assert_at(Instant::now() - start, 500);
        assert_eq!(sink.frames(), vec![fill(Color::GREEN), fill(Color::BLACK)]);

        engine.shutdown();
        assert_eq!(sink.frames().last(), Some(&fill(Color::BLACK)));
        assert_eq!(sink.frames().len(), 3);
        assert_eq!(sink.power_offs(), 1);
        assert_eq!(sink.closes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_forces_black_and_closes() {
        let (mut engine, sink) = engine();
        engine.present(LightState::Listening).await.unwrap();

        engine.shutdown();

        assert_eq!(sink.frames().last(), Some(&fill(Color::BLACK)));
        assert_eq!(sink.closes(), 1);
    }
}
