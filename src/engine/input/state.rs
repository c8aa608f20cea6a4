// Device input state and the read-only oracle used by control blocks

use super::source::{Axis, InputSource};
use std::collections::{HashMap, HashSet};

/// Read-only view of the input devices for the current tick
///
/// Control blocks never touch devices directly; everything they sample goes
/// through this trait so tests can script it.
pub trait InputOracle {
    /// Check if a source is currently held
    fn is_pressed(&self, source: InputSource) -> bool;

    /// Check if a source became held this tick
    fn just_pressed(&self, source: InputSource) -> bool;

    /// Current value of an analog channel
    fn axis(&self, axis: Axis) -> f32;

    /// Value of an analog channel on the previous tick
    fn previous_axis(&self, axis: Axis) -> f32;

    /// Whether a menu or other GUI screen currently has focus
    fn in_menu(&self) -> bool;
}

/// Input state for the local player
#[derive(Debug, Default)]
pub struct InputState {
    /// Sources that are currently pressed
    pressed: HashSet<InputSource>,

    /// Sources that were pressed in the previous tick
    previous_pressed: HashSet<InputSource>,

    /// Current analog values
    axes: HashMap<Axis, f32>,

    /// Analog values from the previous tick
    previous_axes: HashMap<Axis, f32>,

    /// Whether a menu has focus
    in_menu: bool,
}

impl InputState {
    /// Create an empty input state
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a press
    pub fn press(&mut self, source: InputSource) {
        self.pressed.insert(source);
    }

    /// Register a release
    pub fn release(&mut self, source: InputSource) {
        self.pressed.remove(&source);
    }

    /// Set the absolute value of an analog channel
    pub fn set_axis(&mut self, axis: Axis, value: f32) {
        if value == 0.0 {
            self.axes.remove(&axis);
        } else {
            self.axes.insert(axis, value);
        }
    }

    /// Accumulate a relative movement into an analog channel
    pub fn add_axis(&mut self, axis: Axis, delta: f32) {
        let value = self.axis(axis) + delta;
        self.set_axis(axis, value);
    }

    /// Zero every analog channel matching the predicate
    pub fn clear_axes(&mut self, mut predicate: impl FnMut(&Axis) -> bool) {
        self.axes.retain(|axis, _| !predicate(axis));
    }

    /// Set whether a menu has focus
    pub fn set_in_menu(&mut self, in_menu: bool) {
        self.in_menu = in_menu;
    }

    /// Finish a tick: remember this tick's state and zero per-tick deltas
    /// Call this once per tick after all control blocks were evaluated
    pub fn end_tick(&mut self) {
        self.previous_pressed.clone_from(&self.pressed);
        self.previous_axes.clone_from(&self.axes);
        self.axes.retain(|axis, _| !axis.is_relative());
    }

    /// Reset all input state
    pub fn reset(&mut self) {
        self.pressed.clear();
        self.previous_pressed.clear();
        self.axes.clear();
        self.previous_axes.clear();
    }

    /// Get all currently pressed sources
    pub fn pressed_sources(&self) -> Vec<InputSource> {
        self.pressed.iter().copied().collect()
    }
}

impl InputOracle for InputState {
    fn is_pressed(&self, source: InputSource) -> bool {
        self.pressed.contains(&source)
    }

    fn just_pressed(&self, source: InputSource) -> bool {
        self.pressed.contains(&source) && !self.previous_pressed.contains(&source)
    }

    fn axis(&self, axis: Axis) -> f32 {
        self.axes.get(&axis).copied().unwrap_or(0.0)
    }

    fn previous_axis(&self, axis: Axis) -> f32 {
        self.previous_axes.get(&axis).copied().unwrap_or(0.0)
    }

    fn in_menu(&self) -> bool {
        self.in_menu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode;

    fn key_a() -> InputSource {
        InputSource::key(KeyCode::KeyA)
    }

    #[test]
    fn test_press_and_release() {
        let mut state = InputState::new();
        state.press(key_a());
        assert!(state.is_pressed(key_a()));
        assert!(state.just_pressed(key_a()));

        state.release(key_a());
        assert!(!state.is_pressed(key_a()));
    }

    #[test]
    fn test_just_pressed_cleared_on_end_tick() {
        let mut state = InputState::new();
        state.press(key_a());
        state.end_tick();

        assert!(state.is_pressed(key_a()));
        assert!(!state.just_pressed(key_a()));
    }

    #[test]
    fn test_absolute_axis_survives_tick() {
        let mut state = InputState::new();
        let stick = Axis::Gamepad(gilrs::Axis::LeftStickX);
        state.set_axis(stick, 0.75);
        state.end_tick();

        assert_eq!(state.axis(stick), 0.75);
        assert_eq!(state.previous_axis(stick), 0.75);
    }

    #[test]
    fn test_relative_axis_zeroed_on_tick() {
        let mut state = InputState::new();
        state.add_axis(Axis::MouseX, 3.0);
        state.add_axis(Axis::MouseX, 2.0);
        assert_eq!(state.axis(Axis::MouseX), 5.0);

        state.end_tick();
        assert_eq!(state.axis(Axis::MouseX), 0.0);
        assert_eq!(state.previous_axis(Axis::MouseX), 5.0);
    }

    #[test]
    fn test_menu_flag() {
        let mut state = InputState::new();
        assert!(!state.in_menu());
        state.set_in_menu(true);
        assert!(state.in_menu());
    }

    #[test]
    fn test_reset() {
        let mut state = InputState::new();
        state.press(key_a());
        state.set_axis(Axis::MouseScroll, 1.0);
        state.reset();

        assert!(state.pressed_sources().is_empty());
        assert_eq!(state.axis(Axis::MouseScroll), 0.0);
    }
}
