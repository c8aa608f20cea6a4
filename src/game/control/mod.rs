// Control module - binds input combinations to action targets
//
// A control block watches a combination of named inputs, decides through its
// trigger state machine when to fire, and either pulses its target or hands
// it a snapshot of the pressed inputs. On non-authoritative sides the
// snapshot is replicated to the authority instead.
//
// ## Architecture
//
// - `trigger`: Hold / repeat / release timers
// - `settings`: Block settings and the `[ControlModuleMod]` text section
// - `legacy`: One-shot migration of settings embedded in display names
// - `targets`: Action target trait and the stock targets
// - `block`: Per-block tick logic and property surface
// - `session`: Blocks by entity id, replication routing

pub mod block;
pub mod legacy;
pub mod session;
pub mod settings;
pub mod targets;
pub mod trigger;

pub use block::{ControlBlock, Controller, TickContext, SAVE_DELAY_TICKS};
pub use legacy::{migrate_display_name, LegacyMigration};
pub use session::ControlSession;
pub use settings::{ControlSettings, InputSelection, SettingsChange, SECTION_NAME};
pub use targets::{ActionTarget, ProgramInput, TargetKind};
pub use trigger::{Fire, Thresholds, TriggerMode, TriggerState};

use crate::engine::input::InputError;

/// Errors surfaced by control block settings and properties
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("Line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("{0} is only available on program targets")]
    ProgramOnly(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_error_display() {
        let err = ControlError::Parse {
            line: 3,
            reason: "Invalid State value '7'".to_string(),
        };
        assert_eq!(err.to_string(), "Line 3: Invalid State value '7'");

        let err: ControlError = InputError::UnknownInput("zzz".to_string()).into();
        assert_eq!(err.to_string(), "Unknown input: zzz");
    }
}
