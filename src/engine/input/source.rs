// Physical and abstract input sources

use super::controls::{ControlAxis, GameControl};
use gilrs::Button;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// A digital input source (keyboard key, mouse button, gamepad button or game control)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Keyboard(KeyCode),
    Mouse(MouseButton),
    Gamepad(Button),
    Control(GameControl),
}

impl InputSource {
    /// Create a keyboard input source
    pub fn key(code: KeyCode) -> Self {
        Self::Keyboard(code)
    }

    /// Create a mouse button input source
    pub fn mouse(button: MouseButton) -> Self {
        Self::Mouse(button)
    }

    /// Create a gamepad button input source
    pub fn pad(button: Button) -> Self {
        Self::Gamepad(button)
    }

    /// Create a game control input source
    pub fn control(control: GameControl) -> Self {
        Self::Control(control)
    }

    /// Whether this source is a physical device input (not an abstract control)
    pub fn is_physical(&self) -> bool {
        !matches!(self, Self::Control(_))
    }

    /// Human-readable name of the physical key or button
    pub fn label(&self) -> String {
        match self {
            Self::Keyboard(code) => key_label(*code).to_string(),
            Self::Mouse(button) => format!("Mouse {}", mouse_label(*button)),
            Self::Gamepad(button) => format!("Gamepad {}", pad_label(*button)),
            Self::Control(control) => control.label().to_string(),
        }
    }
}

/// An analog channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Horizontal mouse movement this tick
    MouseX,
    /// Vertical mouse movement this tick
    MouseY,
    /// Scroll wheel movement this tick
    MouseScroll,
    Gamepad(gilrs::Axis),
    Control(ControlAxis),
}

impl Axis {
    /// Axes that only carry a per-tick delta and are zeroed when a tick ends
    pub fn is_relative(&self) -> bool {
        matches!(self, Self::MouseX | Self::MouseY | Self::MouseScroll)
    }
}

/// Display name for a keyboard key
pub fn key_label(code: KeyCode) -> &'static str {
    match code {
        // Letters
        KeyCode::KeyA => "A",
        KeyCode::KeyB => "B",
        KeyCode::KeyC => "C",
        KeyCode::KeyD => "D",
        KeyCode::KeyE => "E",
        KeyCode::KeyF => "F",
        KeyCode::KeyG => "G",
        KeyCode::KeyH => "H",
        KeyCode::KeyI => "I",
        KeyCode::KeyJ => "J",
        KeyCode::KeyK => "K",
        KeyCode::KeyL => "L",
        KeyCode::KeyM => "M",
        KeyCode::KeyN => "N",
        KeyCode::KeyO => "O",
        KeyCode::KeyP => "P",
        KeyCode::KeyQ => "Q",
        KeyCode::KeyR => "R",
        KeyCode::KeyS => "S",
        KeyCode::KeyT => "T",
        KeyCode::KeyU => "U",
        KeyCode::KeyV => "V",
        KeyCode::KeyW => "W",
        KeyCode::KeyX => "X",
        KeyCode::KeyY => "Y",
        KeyCode::KeyZ => "Z",

        // Numbers
        KeyCode::Digit0 => "0",
        KeyCode::Digit1 => "1",
        KeyCode::Digit2 => "2",
        KeyCode::Digit3 => "3",
        KeyCode::Digit4 => "4",
        KeyCode::Digit5 => "5",
        KeyCode::Digit6 => "6",
        KeyCode::Digit7 => "7",
        KeyCode::Digit8 => "8",
        KeyCode::Digit9 => "9",

        // Function keys
        KeyCode::F1 => "F1",
        KeyCode::F2 => "F2",
        KeyCode::F3 => "F3",
        KeyCode::F4 => "F4",
        KeyCode::F5 => "F5",
        KeyCode::F6 => "F6",
        KeyCode::F7 => "F7",
        KeyCode::F8 => "F8",
        KeyCode::F9 => "F9",
        KeyCode::F10 => "F10",
        KeyCode::F11 => "F11",
        KeyCode::F12 => "F12",

        // Arrows & navigation
        KeyCode::ArrowUp => "Up",
        KeyCode::ArrowDown => "Down",
        KeyCode::ArrowLeft => "Left",
        KeyCode::ArrowRight => "Right",
        KeyCode::Insert => "Insert",
        KeyCode::Delete => "Delete",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "Page Up",
        KeyCode::PageDown => "Page Down",

        // Modifiers
        KeyCode::ShiftLeft => "Left Shift",
        KeyCode::ShiftRight => "Right Shift",
        KeyCode::ControlLeft => "Left Ctrl",
        KeyCode::ControlRight => "Right Ctrl",
        KeyCode::AltLeft => "Left Alt",
        KeyCode::AltRight => "Right Alt",
        KeyCode::CapsLock => "Caps Lock",

        // Special keys
        KeyCode::Space => "Space",
        KeyCode::Enter => "Enter",
        KeyCode::Escape => "Escape",
        KeyCode::Backspace => "Backspace",
        KeyCode::Tab => "Tab",

        // Punctuation
        KeyCode::Comma => ",",
        KeyCode::Period => ".",
        KeyCode::Slash => "/",
        KeyCode::Backslash => "\\",
        KeyCode::Semicolon => ";",
        KeyCode::Quote => "'",
        KeyCode::BracketLeft => "[",
        KeyCode::BracketRight => "]",
        KeyCode::Backquote => "`",
        KeyCode::Minus => "-",
        KeyCode::Equal => "=",

        // Numpad
        KeyCode::Numpad0 => "Numpad 0",
        KeyCode::Numpad1 => "Numpad 1",
        KeyCode::Numpad2 => "Numpad 2",
        KeyCode::Numpad3 => "Numpad 3",
        KeyCode::Numpad4 => "Numpad 4",
        KeyCode::Numpad5 => "Numpad 5",
        KeyCode::Numpad6 => "Numpad 6",
        KeyCode::Numpad7 => "Numpad 7",
        KeyCode::Numpad8 => "Numpad 8",
        KeyCode::Numpad9 => "Numpad 9",
        KeyCode::NumpadAdd => "Numpad +",
        KeyCode::NumpadSubtract => "Numpad -",
        KeyCode::NumpadMultiply => "Numpad *",
        KeyCode::NumpadDivide => "Numpad /",
        KeyCode::NumpadEnter => "Numpad Enter",
        KeyCode::NumpadDecimal => "Numpad .",

        _ => "Unknown",
    }
}

fn mouse_label(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "Left",
        MouseButton::Right => "Right",
        MouseButton::Middle => "Middle",
        MouseButton::Back => "Button 4",
        MouseButton::Forward => "Button 5",
        MouseButton::Other(_) => "Other",
    }
}

fn pad_label(button: Button) -> &'static str {
    match button {
        Button::South => "A",
        Button::East => "B",
        Button::West => "X",
        Button::North => "Y",
        Button::LeftTrigger => "LB",
        Button::RightTrigger => "RB",
        Button::LeftTrigger2 => "LT",
        Button::RightTrigger2 => "RT",
        Button::LeftThumb => "LS",
        Button::RightThumb => "RS",
        Button::Select => "Back",
        Button::Start => "Start",
        Button::Mode => "Guide",
        Button::DPadUp => "D-Pad Up",
        Button::DPadDown => "D-Pad Down",
        Button::DPadLeft => "D-Pad Left",
        Button::DPadRight => "D-Pad Right",
        _ => "Unknown",
    }
}
