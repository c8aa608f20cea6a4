// Input manager - feeds device events into the input state

use super::controls::{ControlAxis, ControlBindings, GameControl};
use super::source::{Axis, InputSource};
use super::state::{InputOracle, InputState};
use gilrs::EventType;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta};
use winit::keyboard::PhysicalKey;

/// Stick values below this are treated as centered
const STICK_DEADZONE: f32 = 0.1;

/// Pixel scroll deltas per wheel notch
const PIXELS_PER_LINE: f32 = 20.0;

/// Translates winit and gilrs events into [`InputState`] and derives the
/// abstract game controls from their bindings
pub struct InputManager {
    state: InputState,
    bindings: ControlBindings,
}

impl InputManager {
    /// Create a new input manager
    pub fn new(bindings: ControlBindings) -> Self {
        Self {
            state: InputState::new(),
            bindings,
        }
    }

    /// Process a keyboard event from winit
    pub fn process_keyboard_event(&mut self, event: &KeyEvent) {
        // Only process physical key presses
        if let PhysicalKey::Code(key_code) = event.physical_key {
            if event.repeat {
                return;
            }
            let pressed = event.state == ElementState::Pressed;
            self.set_source(InputSource::key(key_code), pressed);
        }
    }

    /// Process a mouse button event from winit
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        self.set_source(InputSource::mouse(button), state == ElementState::Pressed);
    }

    /// Process raw mouse motion
    pub fn process_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.state.add_axis(Axis::MouseX, dx as f32);
        self.state.add_axis(Axis::MouseY, dy as f32);
    }

    /// Process a mouse wheel event from winit
    pub fn process_mouse_wheel(&mut self, delta: MouseScrollDelta) {
        let notches = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
        };
        self.state.add_axis(Axis::MouseScroll, notches);
    }

    /// Process a gamepad event from gilrs
    pub fn process_gamepad_event(&mut self, event: &EventType) {
        match *event {
            EventType::ButtonPressed(button, _) => self.set_source(InputSource::pad(button), true),
            EventType::ButtonReleased(button, _) => {
                self.set_source(InputSource::pad(button), false)
            }
            EventType::ButtonChanged(gilrs::Button::LeftTrigger2, value, _) => {
                self.state.set_axis(Axis::Gamepad(gilrs::Axis::LeftZ), value);
            }
            EventType::ButtonChanged(gilrs::Button::RightTrigger2, value, _) => {
                self.state.set_axis(Axis::Gamepad(gilrs::Axis::RightZ), value);
            }
            EventType::AxisChanged(axis, value, _) => {
                let value = if value.abs() < STICK_DEADZONE { 0.0 } else { value };
                self.state.set_axis(Axis::Gamepad(axis), value);
            }
            EventType::Disconnected => {
                log::info!("Gamepad disconnected, releasing its inputs");
                self.release_gamepad();
            }
            _ => {}
        }
    }

    /// Press or release a physical source and update any control bound to it
    pub fn set_source(&mut self, source: InputSource, pressed: bool) {
        if pressed {
            self.state.press(source);
        } else {
            self.state.release(source);
        }

        if let Some(control) = self.bindings.get_control(source) {
            self.refresh_control(control);
        }
    }

    /// Set whether a menu has focus
    pub fn set_in_menu(&mut self, in_menu: bool) {
        self.state.set_in_menu(in_menu);
    }

    /// Derive the analog game-control channels for the coming tick
    /// Call this once per tick before evaluating control blocks
    pub fn begin_tick(&mut self) {
        let digital = |state: &InputState, negative: GameControl, positive: GameControl| {
            let value = |c| {
                if state.is_pressed(InputSource::control(c)) {
                    1.0
                } else {
                    0.0
                }
            };
            value(positive) - value(negative)
        };
        let pad = |state: &InputState, axis| state.axis(Axis::Gamepad(axis));

        let s = &self.state;
        let move_x = digital(s, GameControl::StrafeLeft, GameControl::StrafeRight)
            + pad(s, gilrs::Axis::LeftStickX);
        let move_y = digital(s, GameControl::Crouch, GameControl::Jump);
        // Forward is -Z
        let move_z = digital(s, GameControl::Forward, GameControl::Backward)
            - pad(s, gilrs::Axis::LeftStickY);
        let roll = digital(s, GameControl::RollLeft, GameControl::RollRight);
        let look_x = s.axis(Axis::MouseX)
            + pad(s, gilrs::Axis::RightStickX)
            + digital(s, GameControl::LookLeft, GameControl::LookRight);
        let look_y = s.axis(Axis::MouseY)
            - pad(s, gilrs::Axis::RightStickY)
            + digital(s, GameControl::LookUp, GameControl::LookDown);

        let channels = [
            (ControlAxis::MoveX, move_x.clamp(-1.0, 1.0)),
            (ControlAxis::MoveY, move_y),
            (ControlAxis::MoveZ, move_z.clamp(-1.0, 1.0)),
            (ControlAxis::Roll, roll),
            (ControlAxis::LookX, look_x),
            (ControlAxis::LookY, look_y),
        ];
        for (axis, value) in channels {
            self.state.set_axis(Axis::Control(axis), value);
        }
    }

    /// Finish the tick
    pub fn end_tick(&mut self) {
        self.state.end_tick();
    }

    /// The input state as seen by control blocks
    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// Get the control bindings
    pub fn bindings(&self) -> &ControlBindings {
        &self.bindings
    }

    /// Get mutable control bindings
    pub fn bindings_mut(&mut self) -> &mut ControlBindings {
        &mut self.bindings
    }

    /// Reset all input state
    pub fn reset_all(&mut self) {
        self.state.reset();
    }

    fn refresh_control(&mut self, control: GameControl) {
        let held = self
            .bindings
            .get_sources(control)
            .iter()
            .any(|source| self.state.is_pressed(*source));

        if held {
            self.state.press(InputSource::control(control));
        } else {
            self.state.release(InputSource::control(control));
        }
    }

    fn release_gamepad(&mut self) {
        let buttons: Vec<_> = self
            .state
            .pressed_sources()
            .into_iter()
            .filter(|source| matches!(source, InputSource::Gamepad(_)))
            .collect();
        for source in buttons {
            self.set_source(source, false);
        }
        self.state
            .clear_axes(|axis| matches!(axis, Axis::Gamepad(_)));
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new(ControlBindings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::keyboard::KeyCode;

    #[test]
    fn test_physical_press_drives_control() {
        let mut manager = InputManager::default();
        manager.set_source(InputSource::key(KeyCode::KeyW), true);

        assert!(manager.state().is_pressed(InputSource::key(KeyCode::KeyW)));
        assert!(manager.state().is_pressed(InputSource::control(GameControl::Forward)));

        manager.set_source(InputSource::key(KeyCode::KeyW), false);
        assert!(!manager.state().is_pressed(InputSource::control(GameControl::Forward)));
    }

    #[test]
    fn test_control_held_while_any_binding_held() {
        let mut manager = InputManager::default();
        let jump = InputSource::control(GameControl::Jump);

        manager.set_source(InputSource::key(KeyCode::Space), true);
        manager.set_source(InputSource::pad(gilrs::Button::South), true);
        manager.set_source(InputSource::key(KeyCode::Space), false);
        assert!(manager.state().is_pressed(jump));

        manager.set_source(InputSource::pad(gilrs::Button::South), false);
        assert!(!manager.state().is_pressed(jump));
    }

    #[test]
    fn test_movement_axes() {
        let mut manager = InputManager::default();
        manager.set_source(InputSource::key(KeyCode::KeyW), true);
        manager.set_source(InputSource::key(KeyCode::KeyD), true);
        manager.begin_tick();

        let state = manager.state();
        assert_eq!(state.axis(Axis::Control(ControlAxis::MoveX)), 1.0);
        assert_eq!(state.axis(Axis::Control(ControlAxis::MoveZ)), -1.0);
        assert_eq!(state.axis(Axis::Control(ControlAxis::MoveY)), 0.0);
    }

    #[test]
    fn test_mouse_motion_feeds_look() {
        let mut manager = InputManager::default();
        manager.process_mouse_motion(4.0, -2.0);
        manager.begin_tick();
        assert_eq!(manager.state().axis(Axis::Control(ControlAxis::LookX)), 4.0);
        assert_eq!(manager.state().axis(Axis::Control(ControlAxis::LookY)), -2.0);

        // Mouse deltas only last one tick
        manager.end_tick();
        manager.begin_tick();
        assert_eq!(manager.state().axis(Axis::Control(ControlAxis::LookX)), 0.0);
    }

    #[test]
    fn test_mouse_wheel_lines() {
        let mut manager = InputManager::default();
        manager.process_mouse_wheel(MouseScrollDelta::LineDelta(0.0, 1.0));
        manager.process_mouse_wheel(MouseScrollDelta::LineDelta(0.0, 1.0));
        assert_eq!(manager.state().axis(Axis::MouseScroll), 2.0);
    }

    #[test]
    fn test_mouse_button() {
        let mut manager = InputManager::default();
        manager.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(manager
            .state()
            .is_pressed(InputSource::control(GameControl::PrimaryAction)));
    }

    #[test]
    fn test_reset_all() {
        let mut manager = InputManager::default();
        manager.set_source(InputSource::key(KeyCode::KeyA), true);
        manager.reset_all();
        assert!(manager.state().pressed_sources().is_empty());
    }
}
