//! Marker replay engine.
//!
//! [`AnimationEngine`] walks a cursor over the active point sequence, one point
//! per timer tick, moving and rotating the map marker as it goes. The engine
//! never touches the map or the clock directly: it talks to a [`MarkerLayer`]
//! for drawing and a [`Scheduler`] for the periodic tick, so the page can plug
//! in Leaflet and `gloo-timers` while tests plug in plain structs.
//!
//! States:
//! - `Stopped`: no timer, cursor at 0 (or at the end after a finished run).
//! - `Running`: exactly one live timer handle.
//! - `Paused`: no timer, cursor and marker kept where they were.

use crate::{defaults, initial_bearing, Point, TrackKey, TrackSet};
use log::{debug, info, warn};
use std::fmt;

/// Drawing surface for the single position marker.
pub trait MarkerLayer {
    fn has_active_marker(&self) -> bool;
    fn add_marker(&mut self);
    fn remove_marker(&mut self);
    fn set_location(&mut self, point: Point);
    /// Rotate the marker icon, in degrees clockwise from north.
    fn set_orientation(&mut self, degrees: f64);
}

/// Source of the periodic tick.
///
/// The returned handle owns the timer: dropping it must cancel the timer so
/// that no further tick is delivered.
pub trait Scheduler {
    type Handle;

    fn schedule(&mut self, period_ms: u32) -> Self::Handle;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Stopped,
    Running,
    Paused,
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackStatus::Stopped => write!(f, "stopped"),
            PlaybackStatus::Running => write!(f, "running"),
            PlaybackStatus::Paused => write!(f, "paused"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// Play was requested but the selection has no points.
    EmptyActiveSequence { selection: TrackKey },
}

impl fmt::Display for AnimationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnimationError::EmptyActiveSequence { selection } => {
                write!(f, "No track data for selection '{}'", selection)
            }
        }
    }
}

impl std::error::Error for AnimationError {}

/// Playback speed multiplier, always within `[MIN_SPEED, MAX_SPEED]` and on
/// the `SPEED_STEP` grid.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SpeedFactor(f64);

impl SpeedFactor {
    /// Clamp and snap an arbitrary value. Non-finite input falls back to the default.
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return SpeedFactor::default();
        }
        let clamped = value.clamp(defaults::MIN_SPEED, defaults::MAX_SPEED);
        let snapped = (clamped / defaults::SPEED_STEP).round() * defaults::SPEED_STEP;
        SpeedFactor(snapped.clamp(defaults::MIN_SPEED, defaults::MAX_SPEED))
    }

    pub fn get(self) -> f64 {
        self.0
    }

    /// Tick period for this speed, in whole milliseconds (never below 1).
    pub fn period_ms(self) -> u32 {
        (defaults::BASE_INTERVAL_MS / self.0).round().max(1.0) as u32
    }
}

impl Default for SpeedFactor {
    fn default() -> Self {
        SpeedFactor(defaults::DEFAULT_SPEED)
    }
}

impl fmt::Display for SpeedFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

pub struct AnimationEngine<M: MarkerLayer, S: Scheduler> {
    tracks: TrackSet,
    layer: M,
    scheduler: S,
    selection: TrackKey,
    // Resolved once per selection change.
    active: Vec<Point>,
    speed: SpeedFactor,
    current_index: usize,
    status: PlaybackStatus,
    // Some(_) exactly when status == Running.
    timer: Option<S::Handle>,
    heading: Option<f64>,
}

impl<M: MarkerLayer, S: Scheduler> AnimationEngine<M, S> {
    /// New engine in `Stopped`, playing every track back to back at 1x.
    pub fn new(tracks: TrackSet, layer: M, scheduler: S) -> Self {
        let selection = TrackKey::All;
        let active = tracks.resolve(selection);
        AnimationEngine {
            tracks,
            layer,
            scheduler,
            selection,
            active,
            speed: SpeedFactor::default(),
            current_index: 0,
            status: PlaybackStatus::Stopped,
            timer: None,
            heading: None,
        }
    }

    /// Start from `Stopped` or resume from `Paused`.
    ///
    /// A finished run restarts from the first point. Playing an empty
    /// selection leaves the engine untouched and reports
    /// [`AnimationError::EmptyActiveSequence`].
    pub fn play(&mut self) -> Result<PlaybackStatus, AnimationError> {
        if self.status == PlaybackStatus::Running {
            return Ok(self.status);
        }
        if self.active.is_empty() {
            let err = AnimationError::EmptyActiveSequence {
                selection: self.selection,
            };
            warn!("{}", err);
            return Err(err);
        }

        if !self.layer.has_active_marker() {
            self.layer.add_marker();
        }
        if self.current_index >= self.active.len() {
            self.current_index = 0;
        }

        self.start_timer();
        self.status = PlaybackStatus::Running;
        debug!(
            "Playback running at {} from point {}/{}",
            self.speed,
            self.current_index,
            self.active.len()
        );
        Ok(self.status)
    }

    /// Stop ticking but keep the cursor and the marker. No-op unless running.
    pub fn pause(&mut self) {
        if self.status != PlaybackStatus::Running {
            return;
        }
        self.cancel_timer();
        self.status = PlaybackStatus::Paused;
        debug!("Playback paused at point {}", self.current_index);
    }

    /// Back to `Stopped`: no timer, cursor at 0, marker removed.
    pub fn reset(&mut self) {
        self.cancel_timer();
        self.current_index = 0;
        self.heading = None;
        if self.layer.has_active_marker() {
            self.layer.remove_marker();
        }
        self.status = PlaybackStatus::Stopped;
        debug!("Playback reset");
    }

    /// Change the speed; a running replay continues from the same point at
    /// the new rate. Returns the clamped factor actually applied.
    pub fn set_speed(&mut self, factor: f64) -> SpeedFactor {
        let speed = SpeedFactor::new(factor);
        if speed == self.speed {
            return speed;
        }
        self.speed = speed;
        debug!("Speed set to {} ({} ms per point)", speed, speed.period_ms());

        if self.status == PlaybackStatus::Running {
            self.cancel_timer();
            self.start_timer();
        }
        speed
    }

    /// Switch the active sequence. Always resets, whatever the current state.
    pub fn select_track(&mut self, key: TrackKey) {
        self.reset();
        self.selection = key;
        self.active = self.tracks.resolve(key);
        debug!("Selected '{}' ({} points)", key, self.active.len());
    }

    /// Advance by one point. Ticks that arrive while not running are ignored.
    pub fn tick(&mut self) -> PlaybackStatus {
        if self.status != PlaybackStatus::Running {
            debug!("Ignoring tick while {}", self.status);
            return self.status;
        }
        if self.current_index >= self.active.len() {
            self.finish();
            return self.status;
        }

        let point = self.active[self.current_index];
        self.layer.set_location(point);

        if let Some(&next) = self.active.get(self.current_index + 1) {
            let heading = initial_bearing(point, next);
            self.layer.set_orientation(heading);
            self.heading = Some(heading);
        }

        self.current_index += 1;
        if self.current_index >= self.active.len() {
            self.finish();
        }
        self.status
    }

    /// End of the sequence: stop the timer, keep the marker on the last point.
    fn finish(&mut self) {
        self.cancel_timer();
        self.status = PlaybackStatus::Stopped;
        info!("Playback finished after {} points", self.active.len());
    }

    fn start_timer(&mut self) {
        // Never two timers at once.
        self.cancel_timer();
        self.timer = Some(self.scheduler.schedule(self.speed.period_ms()));
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            drop(handle);
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn active_points(&self) -> &[Point] {
        &self.active
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn selection(&self) -> TrackKey {
        self.selection
    }

    pub fn speed(&self) -> SpeedFactor {
        self.speed
    }

    pub fn period_ms(&self) -> u32 {
        self.speed.period_ms()
    }

    /// Heading applied on the most recent tick, if any.
    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    /// Share of the active sequence already visited, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.active.is_empty() {
            0.0
        } else {
            self.current_index as f64 / self.active.len() as f64
        }
    }

    pub fn tracks(&self) -> &TrackSet {
        &self.tracks
    }

    pub fn layer(&self) -> &M {
        &self.layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Track;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingLayer {
        active: bool,
        added: usize,
        removed: usize,
        visits: Vec<Point>,
        headings: Vec<f64>,
    }

    impl MarkerLayer for RecordingLayer {
        fn has_active_marker(&self) -> bool {
            self.active
        }
        fn add_marker(&mut self) {
            self.active = true;
            self.added += 1;
        }
        fn remove_marker(&mut self) {
            self.active = false;
            self.removed += 1;
        }
        fn set_location(&mut self, point: Point) {
            self.visits.push(point);
        }
        fn set_orientation(&mut self, degrees: f64) {
            self.headings.push(degrees);
        }
    }

    /// Counts live timers and records every requested period.
    #[derive(Default, Clone)]
    struct TestScheduler {
        live: Rc<Cell<usize>>,
        periods: Rc<RefCell<Vec<u32>>>,
    }

    struct TestTimer {
        live: Rc<Cell<usize>>,
    }

    impl Drop for TestTimer {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    impl Scheduler for TestScheduler {
        type Handle = TestTimer;

        fn schedule(&mut self, period_ms: u32) -> TestTimer {
            self.live.set(self.live.get() + 1);
            assert_eq!(self.live.get(), 1, "more than one timer alive");
            self.periods.borrow_mut().push(period_ms);
            TestTimer {
                live: self.live.clone(),
            }
        }
    }

    fn track_set() -> TrackSet {
        TrackSet::new(vec![
            Track::new(
                "a.gpx",
                vec![Point::new(0.0, 0.0), Point::new(0.0, 1.0), Point::new(1.0, 1.0)],
            )
            .unwrap(),
            Track::new("b.gpx", vec![Point::new(5.0, 5.0), Point::new(6.0, 5.0)]).unwrap(),
        ])
    }

    fn engine() -> (AnimationEngine<RecordingLayer, TestScheduler>, TestScheduler) {
        let scheduler = TestScheduler::default();
        let engine = AnimationEngine::new(track_set(), RecordingLayer::default(), scheduler.clone());
        (engine, scheduler)
    }

    #[test]
    fn test_speed_factor_clamps_and_snaps() {
        assert_eq!(SpeedFactor::new(0.1).get(), 0.5);
        assert_eq!(SpeedFactor::new(9.0).get(), 5.0);
        assert_eq!(SpeedFactor::new(1.3).get(), 1.5);
        assert_eq!(SpeedFactor::new(f64::NAN).get(), 1.0);
        assert_eq!(SpeedFactor::new(2.0).period_ms(), 25);
        assert_eq!(SpeedFactor::new(0.5).period_ms(), 100);
        assert_eq!(SpeedFactor::new(1.5).to_string(), "1.5x");
        assert_eq!(SpeedFactor::default().to_string(), "1x");
    }

    #[test]
    fn test_three_point_track_plays_three_ticks() {
        let (mut engine, scheduler) = engine();
        engine.select_track(TrackKey::Index(0));
        assert_eq!(engine.play(), Ok(PlaybackStatus::Running));
        assert!(engine.layer().has_active_marker());
        assert_eq!(scheduler.live.get(), 1);
        assert_eq!(scheduler.periods.borrow().as_slice(), &[50]);

        assert_eq!(engine.tick(), PlaybackStatus::Running);
        assert_eq!(engine.tick(), PlaybackStatus::Running);
        assert_eq!(engine.tick(), PlaybackStatus::Stopped);

        assert_eq!(engine.layer().visits, track_set().tracks()[0].points);
        // Headings only between consecutive points.
        assert_eq!(engine.layer().headings.len(), 2);
        assert!((engine.layer().headings[0] - 90.0).abs() < 1e-9);
        assert!(engine.layer().headings[1].abs() < 1e-9);
        assert_eq!(scheduler.live.get(), 0);
        assert!(!engine.is_running());
        assert_eq!(engine.current_index(), 3);
        assert_eq!(engine.progress(), 1.0);

        // Stale tick after the end does nothing.
        assert_eq!(engine.tick(), PlaybackStatus::Stopped);
        assert_eq!(engine.layer().visits.len(), 3);
    }

    #[test]
    fn test_play_after_finish_restarts_from_first_point() {
        let (mut engine, _) = engine();
        engine.select_track(TrackKey::Index(1));
        engine.play().unwrap();
        engine.tick();
        engine.tick();
        assert_eq!(engine.status(), PlaybackStatus::Stopped);

        engine.play().unwrap();
        assert_eq!(engine.current_index(), 0);
        engine.tick();
        assert_eq!(engine.layer().visits.last(), Some(&Point::new(5.0, 5.0)));
    }

    #[test]
    fn test_all_tracks_concatenated_in_order() {
        let (mut engine, _) = engine();
        assert_eq!(engine.selection(), TrackKey::All);
        engine.play().unwrap();
        while engine.tick() == PlaybackStatus::Running {}
        assert_eq!(engine.layer().visits, track_set().all_points());
    }

    #[test]
    fn test_pause_keeps_index_and_marker() {
        let (mut engine, scheduler) = engine();
        engine.play().unwrap();
        engine.tick();
        engine.tick();
        engine.pause();

        assert_eq!(engine.status(), PlaybackStatus::Paused);
        assert_eq!(engine.current_index(), 2);
        assert!(engine.layer().has_active_marker());
        assert_eq!(scheduler.live.get(), 0);

        // Ticks queued before the pause are dropped.
        engine.tick();
        assert_eq!(engine.current_index(), 2);
    }

    #[test]
    fn test_pause_twice_is_noop() {
        let (mut engine, scheduler) = engine();
        engine.play().unwrap();
        engine.tick();
        engine.pause();
        engine.pause();
        assert_eq!(engine.status(), PlaybackStatus::Paused);
        assert_eq!(engine.current_index(), 1);
        assert_eq!(scheduler.live.get(), 0);
    }

    #[test]
    fn test_pause_while_stopped_is_noop() {
        let (mut engine, _) = engine();
        engine.pause();
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
    }

    #[test]
    fn test_resume_continues_from_index() {
        let (mut engine, scheduler) = engine();
        engine.play().unwrap();
        engine.tick();
        engine.pause();
        engine.play().unwrap();
        assert_eq!(engine.status(), PlaybackStatus::Running);
        assert_eq!(engine.current_index(), 1);
        assert_eq!(scheduler.live.get(), 1);
        assert_eq!(engine.layer().added, 1);
    }

    #[test]
    fn test_reset_from_every_state() {
        let (mut engine, scheduler) = engine();

        engine.reset();
        assert_eq!(engine.current_index(), 0);
        assert!(!engine.is_running());

        engine.play().unwrap();
        engine.tick();
        engine.reset();
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert_eq!(engine.current_index(), 0);
        assert!(!engine.is_running());
        assert!(!engine.layer().has_active_marker());
        assert_eq!(scheduler.live.get(), 0);

        engine.play().unwrap();
        engine.tick();
        engine.pause();
        engine.reset();
        assert_eq!(engine.current_index(), 0);
        assert!(!engine.is_running());
        assert_eq!(engine.layer().removed, 2);
    }

    #[test]
    fn test_select_track_while_running_resets() {
        let (mut engine, scheduler) = engine();
        engine.play().unwrap();
        engine.tick();
        engine.tick();

        engine.select_track(TrackKey::Index(1));
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert_eq!(engine.current_index(), 0);
        assert!(!engine.layer().has_active_marker());
        assert_eq!(scheduler.live.get(), 0);

        engine.play().unwrap();
        engine.tick();
        assert_eq!(engine.layer().visits.last(), Some(&Point::new(5.0, 5.0)));
        assert_eq!(engine.active_len(), 2);
    }

    #[test]
    fn test_speed_change_while_running_keeps_index() {
        let (mut engine, scheduler) = engine();
        engine.play().unwrap();
        engine.tick();
        engine.tick();

        assert_eq!(engine.set_speed(2.0).get(), 2.0);
        assert_eq!(engine.status(), PlaybackStatus::Running);
        assert_eq!(engine.current_index(), 2);
        assert_eq!(scheduler.live.get(), 1);
        assert_eq!(scheduler.periods.borrow().as_slice(), &[50, 25]);

        engine.tick();
        assert_eq!(engine.layer().visits.last(), Some(&Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_speed_change_while_paused_applies_on_resume() {
        let (mut engine, scheduler) = engine();
        engine.play().unwrap();
        engine.pause();
        engine.set_speed(0.2);
        assert_eq!(engine.speed().get(), 0.5);
        assert_eq!(scheduler.live.get(), 0);

        engine.play().unwrap();
        assert_eq!(scheduler.periods.borrow().as_slice(), &[50, 100]);
    }

    #[test]
    fn test_play_empty_selection_is_noop() {
        let (mut engine, scheduler) = engine();
        engine.select_track(TrackKey::Index(9));
        assert_eq!(
            engine.play(),
            Err(AnimationError::EmptyActiveSequence {
                selection: TrackKey::Index(9)
            })
        );
        assert_eq!(engine.status(), PlaybackStatus::Stopped);
        assert!(!engine.layer().has_active_marker());
        assert_eq!(scheduler.live.get(), 0);
    }

    #[test]
    fn test_single_point_track_sets_no_heading() {
        let scheduler = TestScheduler::default();
        let tracks = TrackSet::new(vec![Track::new("one.gpx", vec![Point::new(2.0, 3.0)]).unwrap()]);
        let mut engine = AnimationEngine::new(tracks, RecordingLayer::default(), scheduler.clone());
        engine.play().unwrap();
        assert_eq!(engine.tick(), PlaybackStatus::Stopped);
        assert_eq!(engine.layer().visits, vec![Point::new(2.0, 3.0)]);
        assert!(engine.layer().headings.is_empty());
        assert_eq!(engine.heading(), None);
        assert_eq!(scheduler.live.get(), 0);
    }
}
