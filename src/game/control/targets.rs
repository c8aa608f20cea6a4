// Action targets a control block can drive

use crate::engine::input::PressedSnapshot;

/// How a target reacts to a fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Pulsed with no payload (timers and the like)
    Pulse,
    /// Runs with the captured input snapshot; only ever on the authority
    Program,
}

/// State handed to a program target when it runs
#[derive(Debug, Clone, Copy)]
pub struct ProgramInput<'a> {
    pub entity_id: u64,
    pub snapshot: &'a PressedSnapshot,
    /// True when the fire came from a release
    pub released: bool,
}

/// Something a control block fires into
pub trait ActionTarget {
    fn kind(&self) -> TargetKind;

    /// Called on fire for pulse targets
    fn pulse(&mut self) {}

    /// Called on fire for program targets
    fn run(&mut self, _input: &ProgramInput<'_>) {}
}

/// Pulse target that counts how often it was triggered
#[derive(Debug, Default)]
pub struct PulseCounter {
    pulses: u64,
}

impl PulseCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pulses(&self) -> u64 {
        self.pulses
    }
}

impl ActionTarget for PulseCounter {
    fn kind(&self) -> TargetKind {
        TargetKind::Pulse
    }

    fn pulse(&mut self) {
        self.pulses += 1;
        log::info!("Pulse #{}", self.pulses);
    }
}

/// Program target that logs every run
#[derive(Debug, Default)]
pub struct LoggingProgram {
    runs: u64,
}

impl LoggingProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> u64 {
        self.runs
    }
}

impl ActionTarget for LoggingProgram {
    fn kind(&self) -> TargetKind {
        TargetKind::Program
    }

    fn run(&mut self, input: &ProgramInput<'_>) {
        self.runs += 1;

        let values = input
            .snapshot
            .iter()
            .map(|(name, value)| {
                let components = value.components();
                if components.is_empty() {
                    name.to_string()
                } else {
                    let joined = components
                        .iter()
                        .map(|c| format!("{:.3}", c))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{}=({})", name, joined)
                }
            })
            .collect::<Vec<_>>()
            .join(" ");

        log::info!(
            "Program on entity {} run #{} ({}): {}",
            input.entity_id,
            self.runs,
            if input.released { "released" } else { "pressed" },
            if values.is_empty() { "-" } else { values.as_str() }
        );
    }
}
