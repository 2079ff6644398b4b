//! Frame-driven playback of both protocols side by side.
//!
//! The renderer calls [`Scheduler::frame`] once per display frame. Each
//! frame moves in-flight transfers forward and, for each protocol whose
//! round delay has elapsed and whose transfers have drained, runs one
//! flooding round or one TGL stage. Observers follow along through a
//! `tokio::sync::watch` channel.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tglsim_engine::{reset, DropMalicious, Engine, FaultModel, Settings};
use tglsim_metrics::compare_runs;
use tglsim_topology::{NetworkState, Protocol};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::events::{PlaybackStatus, SimEvent, SimSnapshot};

/// Shortest frame [`Scheduler::run_headless`] will feed.
pub const MIN_FRAME_MS: f64 = 1.0;

/// Wall time of a frame, with NaN, infinite and negative deltas read as 0.
fn frame_delta(delta_ms: f64) -> f64 {
    if delta_ms.is_finite() {
        delta_ms.max(0.0)
    } else {
        0.0
    }
}

/// Playback speed multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    /// Pause playback
    Paused,
    /// 0.25x speed
    QuarterSpeed,
    /// 0.5x speed
    HalfSpeed,
    /// Normal speed (1x)
    Normal,
    /// 2x speed
    Double,
    /// 4x speed
    Quadruple,
    /// 10x speed
    TenX,
    /// No round delay, transfers drain in a single frame
    Maximum,
}

impl PlaybackSpeed {
    pub fn multiplier(&self) -> f64 {
        match self {
            PlaybackSpeed::Paused => 0.0,
            PlaybackSpeed::QuarterSpeed => 0.25,
            PlaybackSpeed::HalfSpeed => 0.5,
            PlaybackSpeed::Normal => 1.0,
            PlaybackSpeed::Double => 2.0,
            PlaybackSpeed::Quadruple => 4.0,
            PlaybackSpeed::TenX => 10.0,
            PlaybackSpeed::Maximum => f64::INFINITY,
        }
    }

    /// Simulated milliseconds that pass during a frame of `wall_ms`.
    ///
    /// `None` while paused; at maximum speed a frame lasts as long as one
    /// transfer so everything in flight arrives at once.
    fn scale(&self, wall_ms: f64, transfer_duration_ms: f64) -> Option<f64> {
        match self {
            PlaybackSpeed::Paused => None,
            PlaybackSpeed::Maximum => Some(transfer_duration_ms.max(wall_ms)),
            speed => Some(wall_ms * speed.multiplier()),
        }
    }

    /// Delay between advances at this speed, in simulated milliseconds.
    fn delay_ms(&self, base_ms: u64) -> f64 {
        match self {
            PlaybackSpeed::Maximum => 0.0,
            // The clock is already scaled; the delay is in simulated time.
            _ => base_ms as f64,
        }
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlaybackSpeed::Paused => "paused",
            PlaybackSpeed::QuarterSpeed => "0.25x",
            PlaybackSpeed::HalfSpeed => "0.5x",
            PlaybackSpeed::Normal => "1x",
            PlaybackSpeed::Double => "2x",
            PlaybackSpeed::Quadruple => "4x",
            PlaybackSpeed::TenX => "10x",
            PlaybackSpeed::Maximum => "max",
        };
        f.write_str(label)
    }
}

/// Unknown playback speed label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown speed {0:?}, expected one of paused, 0.25x, 0.5x, 1x, 2x, 4x, 10x, max")]
pub struct ParseSpeedError(String);

impl FromStr for PlaybackSpeed {
    type Err = ParseSpeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paused" | "0" | "0x" => Ok(PlaybackSpeed::Paused),
            "0.25" | "0.25x" => Ok(PlaybackSpeed::QuarterSpeed),
            "0.5" | "0.5x" => Ok(PlaybackSpeed::HalfSpeed),
            "1" | "1x" | "normal" => Ok(PlaybackSpeed::Normal),
            "2" | "2x" => Ok(PlaybackSpeed::Double),
            "4" | "4x" => Ok(PlaybackSpeed::Quadruple),
            "10" | "10x" => Ok(PlaybackSpeed::TenX),
            "max" | "maximum" => Ok(PlaybackSpeed::Maximum),
            _ => Err(ParseSpeedError(s.to_string())),
        }
    }
}

/// Current state of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Networks freshly built, nothing advanced
    Stopped,
    /// Frames advance the simulation
    Playing,
    /// Frames are ignored
    Paused,
    /// Both protocols completed
    Finished,
}

/// One protocol's network plus the time since it last advanced.
#[derive(Debug, Clone)]
struct Lane {
    state: NetworkState,
    since_advance_ms: f64,
}

impl Lane {
    fn new(state: NetworkState) -> Self {
        Self {
            state,
            since_advance_ms: 0.0,
        }
    }

    fn ready(&self, delay_ms: f64) -> bool {
        !self.state.is_complete
            && !self.state.has_transfers_in_flight()
            && self.since_advance_ms >= delay_ms
    }

    /// Run one round or stage and record what happened.
    fn advance<F: FaultModel>(
        &mut self,
        engine: &Engine<F>,
        rng: &mut StdRng,
        events: &mut Vec<SimEvent>,
        frame: u64,
    ) {
        let ran = self.state.phase;
        self.state = engine.advance(&self.state, rng);
        self.since_advance_ms = 0.0;

        let s = &self.state;
        events.push(match s.protocol {
            Protocol::Flooding => SimEvent::RoundAdvanced {
                round: s.round,
                coverage: s.coverage,
                messages: s.total_messages_sent,
                frame,
            },
            Protocol::Hierarchical => SimEvent::StageAdvanced {
                phase: ran,
                round: s.round,
                coverage: s.coverage,
                messages: s.total_messages_sent,
                frame,
            },
        });

        if let Some(reason) = s.termination {
            events.push(SimEvent::RunCompleted {
                protocol: s.protocol,
                reason,
                round: s.round,
                coverage: s.coverage,
                messages: s.total_messages_sent,
                frame,
            });
        }
    }
}

/// Drives both networks from display frames.
pub struct Scheduler<F: FaultModel = DropMalicious> {
    settings: Settings,
    engine: Engine<F>,
    seed: u64,
    rng: StdRng,
    flooding: Lane,
    hierarchical: Lane,
    state: PlaybackState,
    speed: PlaybackSpeed,
    frame: u64,
    events: Vec<SimEvent>,
    snapshots: watch::Sender<SimSnapshot>,
}

impl Scheduler<DropMalicious> {
    /// Build both networks from `settings`. Without a configured seed a random
    /// one is drawn and logged so the run can be replayed.
    pub fn new(settings: Settings) -> tglsim_engine::Result<Self> {
        let engine = Engine::from_settings(&settings);
        Self::with_engine(settings, engine)
    }
}

impl<F: FaultModel> Scheduler<F> {
    pub fn with_engine(settings: Settings, engine: Engine<F>) -> tglsim_engine::Result<Self> {
        let seed = settings.seed().unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let (flooding, hierarchical) = reset(&settings, &mut rng)?;
        info!(seed, "scheduler ready");

        let mut scheduler = Self {
            settings,
            engine,
            seed,
            rng,
            flooding: Lane::new(flooding.clone()),
            hierarchical: Lane::new(hierarchical.clone()),
            state: PlaybackState::Stopped,
            speed: PlaybackSpeed::Normal,
            frame: 0,
            events: Vec::new(),
            snapshots: watch::channel(SimSnapshot {
                playback: PlaybackStatus {
                    state: PlaybackState::Stopped,
                    speed: PlaybackSpeed::Normal,
                    frame: 0,
                    seed,
                },
                flooding,
                hierarchical,
                comparison: None,
            })
            .0,
        };
        scheduler.record_reset();
        Ok(scheduler)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn flooding(&self) -> &NetworkState {
        &self.flooding.state
    }

    pub fn hierarchical(&self) -> &NetworkState {
        &self.hierarchical.state
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// Frames processed while playing since the last reset.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            state: self.state,
            speed: self.speed,
            frame: self.frame,
            seed: self.seed,
        }
    }

    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            playback: self.status(),
            flooding: self.flooding.state.clone(),
            hierarchical: self.hierarchical.state.clone(),
            comparison: compare_runs(&self.flooding.state, &self.hierarchical.state),
        }
    }

    /// Receive a fresh [`SimSnapshot`] after every change.
    pub fn subscribe(&self) -> watch::Receiver<SimSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn is_finished(&self) -> bool {
        self.flooding.state.is_complete && self.hierarchical.state.is_complete
    }

    /// Start or resume. Playing a finished run starts it over.
    pub fn play(&mut self) -> tglsim_engine::Result<()> {
        if self.state == PlaybackState::Finished {
            self.reset()?;
        }
        if self.speed == PlaybackSpeed::Paused {
            self.speed = PlaybackSpeed::Normal;
        }
        self.state = PlaybackState::Playing;
        self.publish();
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            self.publish();
        }
    }

    /// Stop and rebuild both networks.
    pub fn stop(&mut self) -> tglsim_engine::Result<()> {
        self.reset()
    }

    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
        if speed == PlaybackSpeed::Paused && self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
        self.publish();
    }

    /// Discard both runs and rebuild them from the current settings and seed.
    pub fn reset(&mut self) -> tglsim_engine::Result<()> {
        self.rng = StdRng::seed_from_u64(self.seed);
        let (flooding, hierarchical) = reset(&self.settings, &mut self.rng)?;
        self.flooding = Lane::new(flooding);
        self.hierarchical = Lane::new(hierarchical);
        self.state = PlaybackState::Stopped;
        self.frame = 0;
        self.events.clear();
        self.record_reset();
        self.publish();
        Ok(())
    }

    /// Replace the settings and rebuild. A missing seed draws a new one.
    pub fn update_settings(&mut self, settings: Settings, engine: Engine<F>) -> tglsim_engine::Result<()> {
        self.seed = settings.seed().unwrap_or_else(rand::random);
        self.settings = settings;
        self.engine = engine;
        info!(seed = self.seed, "settings updated");
        self.reset()
    }

    /// Advance every protocol that can advance right now, ignoring the
    /// round delay. Protocols with transfers in flight are skipped.
    ///
    /// Returns whether anything advanced.
    pub fn step(&mut self) -> bool {
        let mut advanced = false;
        for lane in [&mut self.flooding, &mut self.hierarchical] {
            if lane.ready(0.0) {
                lane.advance(&self.engine, &mut self.rng, &mut self.events, self.frame);
                advanced = true;
            }
        }
        if self.state == PlaybackState::Stopped && advanced {
            self.state = PlaybackState::Paused;
        }
        self.check_finished();
        self.publish();
        advanced
    }

    /// Process one display frame that lasted `delta_ms` of wall time.
    ///
    /// Does nothing unless playing. A NaN, infinite or negative delta counts
    /// as an empty frame. Returns whether any network changed.
    pub fn frame(&mut self, delta_ms: f64) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        let Some(sim_ms) = self
            .speed
            .scale(frame_delta(delta_ms), self.engine.transfer_duration_ms())
        else {
            return false;
        };

        self.frame += 1;
        let delay = self.speed.delay_ms(self.settings.round_delay_ms());
        let mut changed = false;

        for lane in [&mut self.flooding, &mut self.hierarchical] {
            if lane.state.is_complete {
                continue;
            }
            changed |= lane.state.has_transfers_in_flight();
            lane.state = self.engine.tick(&lane.state, sim_ms);
            lane.since_advance_ms += sim_ms;

            if lane.ready(delay) {
                lane.advance(&self.engine, &mut self.rng, &mut self.events, self.frame);
                changed = true;
            }
        }

        self.check_finished();
        self.publish();
        changed
    }

    /// Play until both protocols finish, feeding fixed frames of `frame_ms`.
    ///
    /// Frames shorter than [`MIN_FRAME_MS`], or not finite, are raised to it
    /// so simulated time always moves. Returns the number of frames processed.
    pub fn run_headless(&mut self, frame_ms: f64) -> tglsim_engine::Result<u64> {
        let frame_ms = frame_delta(frame_ms).max(MIN_FRAME_MS);
        self.play()?;
        let start = self.frame;
        while self.state == PlaybackState::Playing {
            self.frame(frame_ms);
        }
        Ok(self.frame - start)
    }

    /// Play in wall-clock time, one frame per tick of `period`.
    pub async fn run_realtime(&mut self, period: Duration) -> tglsim_engine::Result<u64> {
        self.play()?;
        let start = self.frame;
        let mut interval = tokio::time::interval(period);
        let mut last = tokio::time::Instant::now();

        while self.state == PlaybackState::Playing {
            let now = interval.tick().await;
            let delta = now.saturating_duration_since(last);
            last = now;
            self.frame(delta.as_secs_f64() * 1000.0);
        }
        Ok(self.frame - start)
    }

    fn check_finished(&mut self) {
        if self.state == PlaybackState::Finished || !self.is_finished() {
            return;
        }
        self.state = PlaybackState::Finished;
        let comparison = compare_runs(&self.flooding.state, &self.hierarchical.state);
        self.events.push(SimEvent::AllCompleted {
            comparison,
            frame: self.frame,
        });
        info!(
            frames = self.frame,
            flooding_messages = self.flooding.state.total_messages_sent,
            tgl_messages = self.hierarchical.state.total_messages_sent,
            "both runs finished"
        );
    }

    fn record_reset(&mut self) {
        self.events.push(SimEvent::Reset {
            seed: self.seed,
            node_count: self.settings.node_count(),
            relay_count: self.settings.relay_count(),
            leaf_count: self.settings.leaf_count(),
            malicious_percentage: self.settings.malicious_percentage(),
            frame: self.frame,
        });
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        debug!(frame = snapshot.playback.frame, "publishing snapshot");
        self.snapshots.send_replace(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Scheduler {
        let mut settings = Settings::default();
        settings.set_seed(Some(42));
        Scheduler::new(settings).unwrap()
    }

    #[test]
    fn starts_stopped_with_reset_event() {
        let scheduler = seeded();
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
        assert_eq!(scheduler.frame_count(), 0);
        assert!(matches!(scheduler.events(), [SimEvent::Reset { seed: 42, .. }]));
    }

    #[test]
    fn frames_are_ignored_unless_playing() {
        let mut scheduler = seeded();
        assert!(!scheduler.frame(1000.0));
        assert_eq!(scheduler.flooding().round, 0);

        scheduler.play().unwrap();
        scheduler.pause();
        assert!(!scheduler.frame(1000.0));
        assert_eq!(scheduler.frame_count(), 0);
    }

    #[test]
    fn advance_waits_for_round_delay() {
        let mut scheduler = seeded();
        scheduler.play().unwrap();

        // 800 ms delay at 1x: nothing happens before it elapses.
        scheduler.frame(500.0);
        assert_eq!(scheduler.flooding().round, 0);
        assert_eq!(scheduler.hierarchical().total_messages_sent, 0);

        scheduler.frame(400.0);
        assert_eq!(scheduler.flooding().round, 1);
        assert!(scheduler.hierarchical().total_messages_sent > 0);
    }

    #[test]
    fn in_flight_transfers_block_the_next_advance() {
        let mut scheduler = seeded();
        scheduler.play().unwrap();
        scheduler.frame(800.0);
        assert_eq!(scheduler.flooding().round, 1);
        assert!(scheduler.flooding().has_transfers_in_flight());

        // The 400 ms transfers have not landed, so even a manual step waits.
        assert!(!scheduler.step());
        scheduler.frame(300.0);
        assert!(scheduler.flooding().has_transfers_in_flight());
        assert_eq!(scheduler.flooding().round, 1);

        // Landed, but the round delay restarted at the last advance.
        scheduler.frame(300.0);
        assert!(!scheduler.flooding().has_transfers_in_flight());
        assert_eq!(scheduler.flooding().round, 1);

        scheduler.frame(200.0);
        assert_eq!(scheduler.flooding().round, 2);
    }

    #[test]
    fn degenerate_deltas_are_empty_frames() {
        let mut scheduler = seeded();
        scheduler.play().unwrap();
        for delta in [f64::NAN, f64::INFINITY, -250.0, 0.0] {
            assert!(!scheduler.frame(delta));
        }
        assert_eq!(scheduler.frame_count(), 4);
        assert_eq!(scheduler.flooding().round, 0);
        assert_eq!(scheduler.flooding().clock_ms, 0.0);

        scheduler.frame(800.0);
        assert_eq!(scheduler.flooding().round, 1);
    }

    #[test]
    fn headless_run_with_zero_frames_still_finishes() {
        for frame_ms in [0.0, -16.0, f64::NAN] {
            let mut settings = Settings::default();
            settings.set_seed(Some(42));
            settings.set_round_delay_ms(50);
            settings.set_transfer_duration_ms(10.0);
            let mut scheduler = Scheduler::new(settings).unwrap();
            scheduler.set_speed(PlaybackSpeed::TenX);

            let frames = scheduler.run_headless(frame_ms).unwrap();
            assert!(frames > 0);
            assert!(scheduler.is_finished());
            assert_eq!(scheduler.state(), PlaybackState::Finished);
        }
    }

    #[test]
    fn paused_speed_pauses() {
        let mut scheduler = seeded();
        scheduler.play().unwrap();
        scheduler.set_speed(PlaybackSpeed::Paused);
        assert_eq!(scheduler.state(), PlaybackState::Paused);
        scheduler.play().unwrap();
        assert_eq!(scheduler.speed(), PlaybackSpeed::Normal);
    }

    #[test]
    fn headless_run_finishes_both() {
        let mut scheduler = seeded();
        scheduler.set_speed(PlaybackSpeed::Maximum);
        let frames = scheduler.run_headless(16.0).unwrap();

        assert!(frames > 0);
        assert_eq!(scheduler.state(), PlaybackState::Finished);
        assert!(scheduler.is_finished());
        assert!(matches!(
            scheduler.events().last(),
            Some(SimEvent::AllCompleted { .. })
        ));
        let completions = scheduler
            .events()
            .iter()
            .filter(|e| matches!(e, SimEvent::RunCompleted { .. }))
            .count();
        assert_eq!(completions, 2);
    }

    #[test]
    fn same_seed_same_outcome() {
        let mut a = seeded();
        let mut b = seeded();
        a.set_speed(PlaybackSpeed::Maximum);
        b.set_speed(PlaybackSpeed::Maximum);
        a.run_headless(16.0).unwrap();
        b.run_headless(16.0).unwrap();
        assert_eq!(a.flooding(), b.flooding());
        assert_eq!(a.hierarchical(), b.hierarchical());
        assert_eq!(a.events(), b.events());
    }

    #[test]
    fn reset_rebuilds_identical_networks() {
        let mut scheduler = seeded();
        let initial = scheduler.flooding().clone();
        scheduler.set_speed(PlaybackSpeed::Maximum);
        scheduler.run_headless(16.0).unwrap();

        scheduler.reset().unwrap();
        assert_eq!(scheduler.state(), PlaybackState::Stopped);
        assert_eq!(scheduler.flooding(), &initial);
        assert_eq!(scheduler.events().len(), 1);
    }

    #[test]
    fn step_advances_once() {
        let mut scheduler = seeded();
        assert!(scheduler.step());
        assert_eq!(scheduler.state(), PlaybackState::Paused);
        assert_eq!(scheduler.flooding().round, 1);
        assert_eq!(scheduler.hierarchical().phase, tglsim_topology::Phase::Gossip);
        // Transfers from that step are still in flight.
        assert!(!scheduler.step());
    }

    #[test]
    fn observers_see_updates() {
        let mut scheduler = seeded();
        let rx = scheduler.subscribe();
        scheduler.step();
        let snap = rx.borrow();
        assert_eq!(snap.flooding.round, 1);
        assert_eq!(snap.playback.seed, 42);
    }

    #[test]
    fn speed_labels_parse() {
        assert_eq!("2x".parse::<PlaybackSpeed>().unwrap(), PlaybackSpeed::Double);
        assert_eq!("MAX".parse::<PlaybackSpeed>().unwrap(), PlaybackSpeed::Maximum);
        assert!("7x".parse::<PlaybackSpeed>().is_err());
        for speed in [PlaybackSpeed::QuarterSpeed, PlaybackSpeed::TenX] {
            assert_eq!(speed.to_string().parse::<PlaybackSpeed>().unwrap(), speed);
        }
    }

    #[tokio::test]
    async fn realtime_run_finishes() {
        let mut scheduler = seeded();
        scheduler.set_speed(PlaybackSpeed::Maximum);
        let frames = scheduler
            .run_realtime(Duration::from_millis(1))
            .await
            .unwrap();
        assert!(frames > 0);
        assert!(scheduler.is_finished());
    }
}
