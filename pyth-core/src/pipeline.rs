//! From raw pointer and timer events to root parameters.
//!
//! Two producers feed the pipeline:
//! 1. Pointer moves, mapped through the height and lean scales. A
//!    re-entrancy guard drops new moves until the previous one has been
//!    applied with [`Pipeline::apply`].
//! 2. A [`Ticker`] that fires a fixed number of growth ticks, each raising
//!    the recursion ceiling by one.
//!
//! Whenever either side produces a value the output record is recomputed
//! from the latest value of both sides (a latest-value join). Nothing is
//! emitted until the timer has ticked at least once.

use std::collections::VecDeque;

use glam::DVec2;

use crate::{
    config::{Config, ConfigError},
    scale::LinearScale,
    tree::TriangleNode,
};

/// Pointer-derived half of the root parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Shape {
    pub height_factor: f64,
    pub lean: f64,
}

/// Everything the tree builder needs besides the fixed trunk layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootParams {
    pub height_factor: f64,
    pub lean: f64,
    pub max_level: u32,
}

impl RootParams {
    /// The trunk node for these parameters under `cfg`'s layout.
    pub fn trunk(&self, cfg: &Config) -> TriangleNode {
        TriangleNode::trunk(
            cfg.trunk_width,
            cfg.trunk_origin(),
            self.height_factor,
            self.lean,
            self.max_level,
        )
    }
}

/// Input events, in the order they were observed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// Pointer position in surface pixels.
    PointerMoved(DVec2),
    /// Growth tick; carries the new recursion ceiling.
    Tick(u32),
}

/// Whether a pointer move made it past the re-entrancy guard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatch {
    Accepted,
    Dropped,
}

/// Periodic growth timer.
///
/// Tick `n` (1-based) is due `n * interval` seconds after `start`. After
/// `limit` ticks the timer is finished and stays silent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ticker {
    interval: f64,
    limit: u32,
    start: f64,
    fired: u32,
}

impl Ticker {
    pub fn new(interval: f64, limit: u32, start: f64) -> Self {
        Self {
            interval,
            limit,
            start,
            fired: 0,
        }
    }

    pub fn from_config(cfg: &Config, start: f64) -> Self {
        Self::new(cfg.tick_interval, cfg.max_level, start)
    }

    /// Returns the ticks that became due since the last poll.
    ///
    /// Several ticks may fire at once when polls are further apart than
    /// the interval; each is reported so no level is skipped.
    pub fn poll(&mut self, now: f64) -> std::ops::RangeInclusive<u32> {
        let elapsed = (now - self.start).max(0.0);
        let due = ((elapsed / self.interval).floor() as u32).min(self.limit);

        let from = self.fired + 1;
        self.fired = self.fired.max(due);
        from..=due
    }

    pub fn fired(&self) -> u32 {
        self.fired
    }

    pub fn is_finished(&self) -> bool {
        self.fired >= self.limit
    }

    /// Starts counting again from `start` with no ticks fired.
    pub fn restart(&mut self, start: f64) {
        self.start = start;
        self.fired = 0;
    }
}

/// Latest-value join of pointer and timer streams.
#[derive(Debug)]
pub struct Pipeline {
    height_scale: LinearScale,
    lean_scale: LinearScale,

    shape: Shape,
    max_level: Option<u32>,

    in_flight: bool,
    pending: Option<RootParams>,
    queue: VecDeque<Event>,

    dropped: u64,
}

impl Pipeline {
    pub fn new(cfg: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            height_scale: cfg.height_scale()?,
            lean_scale: cfg.lean_scale()?,
            shape: Shape::default(),
            max_level: None,
            in_flight: false,
            pending: None,
            queue: VecDeque::new(),
            dropped: 0,
        })
    }

    /// Maps a surface position to height factor and lean. Positions
    /// outside the surface are extrapolated, not clamped.
    pub fn map_pointer(&self, pos: DVec2) -> Shape {
        Shape {
            height_factor: self.height_scale.map(pos.y),
            lean: self.lean_scale.map(pos.x),
        }
    }

    /// Handles one pointer move.
    pub fn on_pointer(&mut self, pos: DVec2) -> Dispatch {
        if self.in_flight {
            self.dropped += 1;
            log::trace!("pointer move at {pos} dropped, previous update not applied yet");
            return Dispatch::Dropped;
        }

        self.in_flight = true;
        self.shape = self.map_pointer(pos);
        self.recompute();
        Dispatch::Accepted
    }

    /// Handles one timer tick carrying the new recursion ceiling.
    pub fn on_tick(&mut self, max_level: u32) {
        self.max_level = Some(max_level);
        self.recompute();
    }

    fn recompute(&mut self) {
        if let Some(max_level) = self.max_level {
            self.pending = Some(RootParams {
                height_factor: self.shape.height_factor,
                lean: self.shape.lean,
                max_level,
            });
        }
    }

    /// Enqueues an event for the next [`Pipeline::drain`].
    pub fn push(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Dispatches queued events in FIFO order and returns how many
    /// pointer moves were dropped by the guard.
    pub fn drain(&mut self) -> usize {
        let mut dropped = 0;
        while let Some(event) = self.queue.pop_front() {
            match event {
                Event::PointerMoved(pos) => {
                    if self.on_pointer(pos) == Dispatch::Dropped {
                        dropped += 1;
                    }
                }
                Event::Tick(level) => self.on_tick(level),
            }
        }
        dropped
    }

    /// Takes the latest combined record, if any, and releases the guard.
    ///
    /// The guard stays engaged while no record has been produced yet, so
    /// pointer moves before the first tick leave only the first one
    /// standing.
    pub fn apply(&mut self) -> Option<RootParams> {
        let params = self.pending.take()?;
        self.in_flight = false;
        log::debug!(
            "applied root params: height_factor={:.3} lean={:.3} max_level={}",
            params.height_factor,
            params.lean,
            params.max_level
        );
        Some(params)
    }

    /// Forgets the timer side, e.g. before replaying growth.
    pub fn reset_level(&mut self) {
        self.max_level = None;
        self.pending = None;
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn max_level(&self) -> Option<u32> {
        self.max_level
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Total pointer moves dropped since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
