// Input handling system
//
// This module turns raw keyboard, mouse and gamepad state into named inputs
// that control blocks can combine, evaluate and capture.
//
// ## Architecture
//
// - `source`: Physical input sources and analog axes
// - `controls`: Abstract game controls and their physical bindings
// - `state`: Per-tick input state and the `InputOracle` read-only view
// - `manager`: Feeds winit/gilrs events into the input state
// - `catalog`: Registry of named inputs ("a", "m.left", "g.lsanalog", "c.view", ...)
// - `combination`: Ordered sets of named inputs with any/all evaluation
// - `snapshot`: Captured input values handed to program targets
//
// ## Usage Example
//
// ```rust
// use engine::input::{CombineMode, InputCatalog, InputCombination, InputManager};
//
// let catalog = InputCatalog::standard();
// let combination = InputCombination::parse(&catalog, "shift m.left")?;
//
// let mut input_manager = InputManager::default();
// // In your event loop, process device events
// input_manager.process_keyboard_event(&key_event);
//
// // Once per tick
// input_manager.begin_tick();
// if combination.is_satisfied(CombineMode::All, input_manager.state(), false) {
//     let snapshot = combination.capture(false, input_manager.state());
// }
// input_manager.end_tick();
// ```

pub mod catalog;
pub mod combination;
pub mod controls;
pub mod manager;
pub mod snapshot;
pub mod source;
pub mod state;

// Re-export commonly used types
pub use catalog::{Binding, InputCatalog, InputDescriptor, InputKind};
pub use combination::{CombineMode, InputCombination};
pub use controls::{ControlAxis, ControlBindings, GameControl};
pub use manager::InputManager;
pub use snapshot::{PressedSnapshot, SampleValue};
pub use source::{Axis, InputSource};
pub use state::{InputOracle, InputState};

/// Input lookup and parsing errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("Unknown input: {0}")]
    UnknownInput(String),

    #[error("Unknown input '{token}' in combination")]
    UnresolvedCombination { token: String },

    #[error("Combination has no inputs")]
    Empty,
}
