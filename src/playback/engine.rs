use std::time::Duration;

use crate::foundation::config::FlipbookConfig;
use crate::foundation::core::{Direction, FrameIndex, LoopMode};
use crate::foundation::error::{FlipbookError, FlipbookResult};
use crate::playback::store::FrameStore;

/// Factor applied to the tick interval by [`PlaybackEngine::faster`] (and divided out by
/// [`PlaybackEngine::slower`]).
pub const SPEED_FACTOR: f64 = 0.7;

/// Shortest period a timer is ever scheduled with.
pub const MIN_TICK: Duration = Duration::from_millis(1);

/// Longest period a timer is ever scheduled with.
pub const MAX_TICK: Duration = Duration::from_secs(3600);

/// Most ticks a single [`PlaybackEngine::advance`] call fires before dropping the backlog.
pub const MAX_CATCH_UP_TICKS: usize = 1024;

/// Playback settings carried by an artifact.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PlaybackConfig {
    /// Delay between ticks in milliseconds.
    pub interval_ms: f64,
    /// Loop mode the engine starts in.
    pub default_mode: LoopMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self::from(&FlipbookConfig::default())
    }
}

impl From<&FlipbookConfig> for PlaybackConfig {
    fn from(cfg: &FlipbookConfig) -> Self {
        Self {
            interval_ms: cfg.interval_ms,
            default_mode: cfg.default_mode,
        }
    }
}

impl PlaybackConfig {
    /// Validate static invariants.
    pub fn validate(&self) -> FlipbookResult<()> {
        if !self.interval_ms.is_finite() || self.interval_ms <= 0.0 {
            return Err(FlipbookError::validation(
                "playback interval_ms must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Coarse engine state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlaybackState {
    /// Never played since construction.
    Idle,
    /// A timer steps towards the last frame.
    PlayingForward,
    /// A timer steps towards the first frame.
    PlayingReverse,
    /// Stopped by `pause` or by a `once` boundary.
    Paused,
}

#[derive(Clone, Copy, Debug)]
struct ActiveTimer {
    id: u64,
    direction: Direction,
    period: Duration,
    due: Duration,
}

/// Timer-driven frame player over any [`FrameStore`].
///
/// The engine owns its clock: hosts report elapsed time through [`advance`](Self::advance) and
/// may sleep for [`next_deadline`](Self::next_deadline) in between. At most one timer is ever
/// active, and clearing it in [`pause`](Self::pause) guarantees no further tick fires.
pub struct PlaybackEngine<S> {
    store: S,
    frame_count: usize,
    current: FrameIndex,
    frame: String,
    state: PlaybackState,
    loop_mode: LoopMode,
    interval_ms: f64,
    timer: Option<ActiveTimer>,
    next_timer_id: u64,
    clock: Duration,
    // Time base for timers started now; equals `clock` except while ticks are being fired.
    now: Duration,
}

impl<S: FrameStore> PlaybackEngine<S> {
    /// Open `store` for playback and show its first frame.
    pub fn new(store: S, cfg: &PlaybackConfig) -> FlipbookResult<Self> {
        cfg.validate()?;
        let frame_count = store.frame_count();
        if frame_count == 0 {
            return Err(FlipbookError::validation(
                "cannot play an empty frame sequence",
            ));
        }
        let frame = store.reconstruct(FrameIndex::FIRST)?;
        Ok(Self {
            store,
            frame_count,
            current: FrameIndex::FIRST,
            frame,
            state: PlaybackState::Idle,
            loop_mode: cfg.default_mode,
            interval_ms: cfg.interval_ms,
            timer: None,
            next_timer_id: 0,
            clock: Duration::ZERO,
            now: Duration::ZERO,
        })
    }

    /// Borrow the underlying frame store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of frames in the sequence.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Index of the displayed frame.
    pub fn current_index(&self) -> FrameIndex {
        self.current
    }

    /// Reconstructed content of the displayed frame.
    pub fn current_frame(&self) -> &str {
        &self.frame
    }

    /// Current coarse state.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Direction of the active timer, or `None` when not playing.
    pub fn direction(&self) -> Option<Direction> {
        self.timer.map(|t| t.direction)
    }

    /// Return `true` while a timer is active.
    pub fn is_timing(&self) -> bool {
        self.timer.is_some()
    }

    /// Boundary policy in effect.
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Change the boundary policy; takes effect at the next boundary.
    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    /// Tick interval in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Time until the active timer fires, or `None` when not playing.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timer.map(|t| t.due.saturating_sub(self.clock))
    }

    /// Seek to `index` without touching direction or timer state.
    pub fn set_frame(&mut self, index: FrameIndex) -> FlipbookResult<()> {
        index.checked(self.frame_count)?;
        if index == self.current {
            return Ok(());
        }
        let frame = if index > self.current {
            self.store.advance(self.current, &self.frame, index)?
        } else {
            self.store.reconstruct(index)?
        };
        self.frame = frame;
        self.current = index;
        Ok(())
    }

    /// Step one frame forward, clamped at the last frame.
    pub fn next_frame(&mut self) -> FlipbookResult<()> {
        let last = FrameIndex::last(self.frame_count);
        self.set_frame(FrameIndex((self.current.0 + 1).min(last.0)))
    }

    /// Step one frame back, clamped at the first frame.
    pub fn previous_frame(&mut self) -> FlipbookResult<()> {
        self.set_frame(FrameIndex(self.current.0.saturating_sub(1)))
    }

    /// Seek to the first frame.
    pub fn first_frame(&mut self) -> FlipbookResult<()> {
        self.set_frame(FrameIndex::FIRST)
    }

    /// Seek to the last frame.
    pub fn last_frame(&mut self) -> FlipbookResult<()> {
        self.set_frame(FrameIndex::last(self.frame_count))
    }

    /// Start playing forward. Ignored while a timer is already active.
    pub fn play(&mut self) {
        self.start(Direction::Forward);
    }

    /// Start playing backward. Ignored while a timer is already active.
    pub fn reverse(&mut self) {
        self.start(Direction::Reverse);
    }

    /// Cancel any pending tick. Always succeeds and is idempotent.
    pub fn pause(&mut self) {
        self.timer = None;
        self.state = PlaybackState::Paused;
    }

    /// Shorten the tick interval, restarting an active timer at the new rate.
    pub fn faster(&mut self) {
        self.interval_ms = clamp_interval_ms(self.interval_ms * SPEED_FACTOR);
        self.retime();
    }

    /// Lengthen the tick interval, restarting an active timer at the new rate.
    pub fn slower(&mut self) {
        self.interval_ms = clamp_interval_ms(self.interval_ms / SPEED_FACTOR);
        self.retime();
    }

    /// Advance the engine clock by `elapsed`, firing every tick that falls due.
    ///
    /// At most [`MAX_CATCH_UP_TICKS`] ticks fire per call; any further backlog is skipped and the
    /// timer resumes one period after the new clock. Returns the number of ticks fired.
    pub fn advance(&mut self, elapsed: Duration) -> FlipbookResult<usize> {
        self.clock = self.clock.saturating_add(elapsed);
        let mut fired = 0;
        while let Some(timer) = self.timer {
            if timer.due > self.clock {
                break;
            }
            if fired == MAX_CATCH_UP_TICKS {
                tracing::debug!(
                    timer = timer.id,
                    fired,
                    "playback fell behind; skipping missed ticks"
                );
                if let Some(active) = self.timer.as_mut() {
                    active.due = self.clock.saturating_add(timer.period);
                }
                break;
            }
            self.now = timer.due;
            let next_due = timer.due.saturating_add(timer.period);
            if let Some(active) = self.timer.as_mut() {
                active.due = next_due;
            }
            if let Err(e) = self.step(timer.direction) {
                self.now = self.clock;
                return Err(e);
            }
            fired += 1;
            // The clock saturated; the schedule cannot move past it.
            if next_due == timer.due {
                break;
            }
        }
        self.now = self.clock;
        Ok(fired)
    }

    fn start(&mut self, direction: Direction) {
        if let Some(active) = self.timer {
            tracing::debug!(
                timer = active.id,
                requested = ?direction,
                "playback already timing; ignoring start until paused"
            );
            return;
        }
        self.start_timer(direction);
    }

    fn start_timer(&mut self, direction: Direction) {
        let period = self.tick_period();
        let id = self.next_timer_id;
        self.next_timer_id += 1;
        self.timer = Some(ActiveTimer {
            id,
            direction,
            period,
            due: self.now.saturating_add(period),
        });
        self.state = match direction {
            Direction::Forward => PlaybackState::PlayingForward,
            Direction::Reverse => PlaybackState::PlayingReverse,
        };
    }

    fn restart_timer(&mut self, direction: Direction) {
        self.timer = None;
        self.start_timer(direction);
        tracing::debug!(
            ?direction,
            interval_ms = self.interval_ms,
            "playback timer restarted"
        );
    }

    fn retime(&mut self) {
        if let Some(active) = self.timer {
            self.restart_timer(active.direction);
        }
    }

    fn tick_period(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_ms / 1000.0)
            .unwrap_or(MAX_TICK)
            .clamp(MIN_TICK, MAX_TICK)
    }

    fn step(&mut self, direction: Direction) -> FlipbookResult<()> {
        let last = FrameIndex::last(self.frame_count);
        let (boundary, wrap, next) = match direction {
            Direction::Forward => (last, FrameIndex::FIRST, FrameIndex(self.current.0 + 1)),
            Direction::Reverse => (
                FrameIndex::FIRST,
                last,
                FrameIndex(self.current.0.wrapping_sub(1)),
            ),
        };
        if self.current != boundary {
            return self.set_frame(next);
        }

        match self.loop_mode {
            LoopMode::Loop => self.set_frame(wrap),
            LoopMode::Reflect => {
                self.set_frame(boundary)?;
                self.restart_timer(direction.flipped());
                Ok(())
            }
            LoopMode::Once => {
                self.pause();
                self.set_frame(boundary)
            }
        }
    }
}

fn clamp_interval_ms(ms: f64) -> f64 {
    let lo = MIN_TICK.as_secs_f64() * 1000.0;
    let hi = MAX_TICK.as_secs_f64() * 1000.0;
    if ms.is_nan() { hi } else { ms.clamp(lo, hi) }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/engine.rs"]
mod tests;
