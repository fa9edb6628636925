//! Countdown clocks driven by the one-second tick

use chrono::{DateTime, Duration, Local};

/// Period of the driver tick. The incident clock removes one second per tick.
pub const TICK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// Longest delay a schedule clock accepts; larger values are clamped
pub const MAX_SCHEDULE_DELAY_SECONDS: u64 = 7 * 24 * 3600;

/// Identifies one arming of a clock. Every `arm` returns a fresh handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockHandle(u64);

impl ClockHandle {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// Result of ticking a clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Not armed
    Idle,
    /// Armed, with whole seconds left
    Running { remaining: u64 },
    /// Reached zero on this tick; the clock is now disarmed
    Expired(ClockHandle),
}

/// Countdown for the active incident's time limit.
///
/// Counts ticks, not wall time: each `tick` removes one second.
#[derive(Debug, Default)]
pub struct IncidentClock {
    generation: u64,
    armed: Option<(ClockHandle, u64)>,
}

impl IncidentClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm with a duration in seconds, replacing any previous arming
    pub fn arm(&mut self, seconds: u64) -> ClockHandle {
        self.generation += 1;
        let handle = ClockHandle(self.generation);
        self.armed = Some((handle, seconds));
        handle
    }

    /// Disarm without firing
    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn tick(&mut self) -> ClockTick {
        let Some((handle, remaining)) = self.armed.as_mut() else {
            return ClockTick::Idle;
        };

        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            let handle = *handle;
            self.armed = None;
            ClockTick::Expired(handle)
        } else {
            ClockTick::Running {
                remaining: *remaining,
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn handle(&self) -> Option<ClockHandle> {
        self.armed.map(|(handle, _)| handle)
    }

    pub fn remaining(&self) -> Option<u64> {
        self.armed.map(|(_, remaining)| remaining)
    }
}

/// Countdown to an absolute "next incident" time.
///
/// The target is fixed when armed; every tick recomputes the remaining time
/// from the supplied wall-clock time, so missed ticks do not drift it.
#[derive(Debug, Default)]
pub struct ScheduleClock {
    generation: u64,
    armed: Option<(ClockHandle, DateTime<Local>)>,
}

impl ScheduleClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm to fire `delay_seconds` after `now`, replacing any previous arming
    pub fn arm(&mut self, delay_seconds: u64, now: DateTime<Local>) -> ClockHandle {
        self.generation += 1;
        let handle = ClockHandle(self.generation);
        let delay = delay_seconds.min(MAX_SCHEDULE_DELAY_SECONDS) as i64;
        self.armed = Some((handle, now + Duration::seconds(delay)));
        handle
    }

    /// Disarm without firing
    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn tick(&mut self, now: DateTime<Local>) -> ClockTick {
        let Some((handle, target)) = self.armed else {
            return ClockTick::Idle;
        };

        if now >= target {
            self.armed = None;
            return ClockTick::Expired(handle);
        }

        ClockTick::Running {
            remaining: remaining_until(target, now),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn handle(&self) -> Option<ClockHandle> {
        self.armed.map(|(handle, _)| handle)
    }

    pub fn target(&self) -> Option<DateTime<Local>> {
        self.armed.map(|(_, target)| target)
    }

    /// Seconds until the target, rounded up and floored at zero
    pub fn remaining(&self, now: DateTime<Local>) -> Option<u64> {
        self.armed.map(|(_, target)| remaining_until(target, now))
    }
}

fn remaining_until(target: DateTime<Local>, now: DateTime<Local>) -> u64 {
    let millis = (target - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis as u64).div_ceil(1000)
    }
}
