/// Simulation tick clock
///
/// Fixed timestep accumulator that turns wall-clock frame time into a whole
/// number of simulation ticks. The running tick counter is the time base for
/// every control block: hold, repeat and release delays are measured in ticks.
use std::time::{Duration, Instant};

/// Simulation rate (ticks per second)
pub const TICKS_PER_SECOND: u32 = 60;

/// Duration of one tick in seconds
pub const TICK_SECONDS: f32 = 1.0 / TICKS_PER_SECOND as f32;
const TICK_DURATION: Duration = Duration::from_micros(16_667); // ~1/60 second

/// Maximum number of ticks per frame to prevent spiral of death
const MAX_TICKS_PER_FRAME: u32 = 5;

/// Convert a duration in seconds to whole ticks.
///
/// Anything shorter than one tick collapses to 0, which callers treat as
/// "disabled".
pub fn seconds_to_ticks(seconds: f32) -> u64 {
    if !seconds.is_finite() || seconds < TICK_SECONDS {
        return 0;
    }
    (seconds * TICKS_PER_SECOND as f32).round() as u64
}

/// Convert a tick count back to seconds
pub fn ticks_to_seconds(ticks: u64) -> f32 {
    ticks as f32 / TICKS_PER_SECOND as f32
}

/// Fixed-step simulation clock
pub struct TickClock {
    /// Accumulated time not yet consumed by ticks
    accumulator: Duration,

    /// Time of last frame
    last_frame_time: Instant,

    /// Whether the simulation is paused
    paused: bool,

    /// Total ticks executed
    tick: u64,
}

impl TickClock {
    /// Create a new clock starting at tick 0
    pub fn new() -> Self {
        Self {
            accumulator: Duration::ZERO,
            last_frame_time: Instant::now(),
            paused: false,
            tick: 0,
        }
    }

    /// Begin a new frame using wall-clock time, returns the number of ticks to run
    pub fn begin_frame(&mut self) -> u32 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.last_frame_time);
        self.last_frame_time = now;
        self.advance(frame_time)
    }

    /// Feed an explicit frame duration, returns the number of ticks to run
    pub fn advance(&mut self, frame_time: Duration) -> u32 {
        // If paused, don't accumulate time for ticks
        if self.paused {
            return 0;
        }

        self.accumulator += frame_time;

        let mut ticks = 0;
        while self.accumulator >= TICK_DURATION && ticks < MAX_TICKS_PER_FRAME {
            self.accumulator -= TICK_DURATION;
            ticks += 1;
        }

        // Drop whatever we could not catch up on instead of bursting later
        if ticks == MAX_TICKS_PER_FRAME && self.accumulator >= TICK_DURATION {
            self.accumulator = Duration::ZERO;
        }

        ticks
    }

    /// Advance the tick counter by one and return the new tick
    pub fn step(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Current tick
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Check if the clock is paused
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Pause the simulation
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            log::info!("Simulation paused at tick {}", self.tick);
        }
    }

    /// Resume the simulation
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            // Reset accumulator to prevent tick burst
            self.accumulator = Duration::ZERO;
            self.last_frame_time = Instant::now();
            log::info!("Simulation resumed at tick {}", self.tick);
        }
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new()
    }
}
