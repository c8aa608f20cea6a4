// Hold / repeat / release trigger state machine

/// When a satisfied combination fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriggerMode {
    /// Fire on press (after hold, then every repeat)
    #[default]
    OnPress,
    /// Fire on press and again on release
    OnPressAndRelease,
    /// Fire only on release
    OnReleaseOnly,
}

impl TriggerMode {
    /// Numeric form used in settings
    pub fn index(&self) -> u8 {
        match self {
            Self::OnPress => 0,
            Self::OnPressAndRelease => 1,
            Self::OnReleaseOnly => 2,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::OnPress),
            1 => Some(Self::OnPressAndRelease),
            2 => Some(Self::OnReleaseOnly),
            _ => None,
        }
    }

    /// Whether presses fire (and so whether hold/repeat apply)
    pub fn fires_on_press(&self) -> bool {
        matches!(self, Self::OnPress | Self::OnPressAndRelease)
    }

    /// Whether releases fire (and so whether the release delay applies)
    pub fn fires_on_release(&self) -> bool {
        matches!(self, Self::OnPressAndRelease | Self::OnReleaseOnly)
    }
}

/// Timing thresholds in ticks, 0 meaning disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Thresholds {
    pub hold: u64,
    pub repeat: u64,
    pub release: u64,
}

/// Outcome of a tick that fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fire {
    /// True when fired by a release rather than a press
    pub released: bool,
}

impl Fire {
    const PRESS: Self = Self { released: false };
    const RELEASE: Self = Self { released: true };
}

/// Per-block trigger timers
///
/// Fed the combination's pressed state once per tick; decides whether that
/// tick fires. At most one fire per tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerState {
    last_pressed: bool,
    last_trigger: Option<u64>,
    last_pressed_time: Option<u64>,
    last_release_time: Option<u64>,
}

impl TriggerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pressed state seen on the last update
    pub fn is_pressed(&self) -> bool {
        self.last_pressed
    }

    /// Tick of the last press-side fire, cleared on each new press
    pub fn last_trigger(&self) -> Option<u64> {
        self.last_trigger
    }

    /// Tick the pending hold started, if a hold is pending
    pub fn pending_hold(&self) -> Option<u64> {
        self.last_pressed_time
    }

    /// Tick the pending delayed release started, if one is pending
    pub fn pending_release(&self) -> Option<u64> {
        self.last_release_time
    }

    /// Forget all timers
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance the state machine by one tick
    pub fn update(
        &mut self,
        now: u64,
        pressed: bool,
        mode: TriggerMode,
        thresholds: Thresholds,
    ) -> Option<Fire> {
        let changed = pressed != self.last_pressed;
        self.last_pressed = pressed;

        let (hold, repeat) = if mode.fires_on_press() {
            (thresholds.hold, thresholds.repeat)
        } else {
            (0, 0)
        };
        let release = if mode.fires_on_release() {
            thresholds.release
        } else {
            0
        };

        if pressed {
            if changed {
                self.last_trigger = None;

                if hold > 0 {
                    self.last_pressed_time = Some(now);
                } else if mode.fires_on_press() {
                    self.last_trigger = Some(now);
                    return Some(Fire::PRESS);
                }
            }

            if hold > 0 {
                if let Some(start) = self.last_pressed_time {
                    if now >= start + hold {
                        self.last_pressed_time = None;
                        self.last_release_time = None;
                        self.last_trigger = Some(now);
                        return Some(Fire::PRESS);
                    }
                }
            }

            // Repeat starts once the hold (if any) completed, timed from the last fire
            if repeat > 0 && self.hold_satisfied(hold) {
                if let Some(last) = self.last_trigger {
                    if now >= last + repeat {
                        self.last_trigger = Some(now);
                        return Some(Fire::PRESS);
                    }
                }
            }
        } else if changed {
            let hold_satisfied = self.hold_satisfied(hold);
            self.last_pressed_time = None;

            if hold_satisfied {
                if release > 0 {
                    self.last_release_time = Some(now);
                } else if mode.fires_on_release() {
                    return Some(Fire::RELEASE);
                }
            }
        }

        if release > 0 {
            if let Some(start) = self.last_release_time {
                if (pressed || self.hold_satisfied(hold)) && now >= start + release {
                    self.last_release_time = None;
                    return Some(Fire::RELEASE);
                }
            }
        }

        None
    }

    fn hold_satisfied(&self, hold: u64) -> bool {
        hold == 0 || self.last_pressed_time.is_none()
    }
}
