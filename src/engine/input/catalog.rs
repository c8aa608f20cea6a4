// Registry of named inputs

use super::controls::{ControlAxis, GameControl};
use super::snapshot::SampleValue;
use super::source::{Axis, InputSource};
use super::state::InputOracle;
use super::InputError;
use gilrs::Button;
use glam::{Vec2, Vec3};
use std::collections::HashMap;
use std::sync::Arc;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// What kind of value an input produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    /// A single key or button
    Digital,
    /// One analog channel
    AnalogScalar,
    /// Two analog channels read as a 2-vector
    Analog2,
    /// Three analog channels read as a 3-vector
    Analog3,
    /// Several digital sources read as one (any of them held)
    CompositeNamed,
}

impl InputKind {
    /// Number of value components carried in a snapshot (0 for digital inputs)
    pub fn value_arity(&self) -> usize {
        match self {
            Self::Digital | Self::CompositeNamed => 0,
            Self::AnalogScalar => 1,
            Self::Analog2 => 2,
            Self::Analog3 => 3,
        }
    }

    /// Name of the value type, as shown to operators
    pub fn type_name(&self) -> &'static str {
        match self.value_arity() {
            0 => "none",
            1 => "float",
            2 => "Vector2",
            _ => "Vector3",
        }
    }

    pub fn is_analog(&self) -> bool {
        self.value_arity() > 0
    }
}

/// Where an input's value comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Button(InputSource),
    AnyOf(Vec<InputSource>),
    Axis(Axis),
    Axes2([Axis; 2]),
    Axes3([Axis; 3]),
}

impl Binding {
    fn kind(&self) -> InputKind {
        match self {
            Self::Button(_) => InputKind::Digital,
            Self::AnyOf(_) => InputKind::CompositeNamed,
            Self::Axis(_) => InputKind::AnalogScalar,
            Self::Axes2(_) => InputKind::Analog2,
            Self::Axes3(_) => InputKind::Analog3,
        }
    }
}

/// A named input
#[derive(Debug, Clone, PartialEq)]
pub struct InputDescriptor {
    name: String,
    label: String,
    kind: InputKind,
    binding: Binding,
}

impl InputDescriptor {
    pub fn new(name: &str, label: &str, binding: Binding) -> Self {
        Self {
            name: name.to_lowercase(),
            label: label.to_string(),
            kind: binding.kind(),
            binding,
        }
    }

    /// Canonical (lowercase) name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable label
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Sample this input as a boolean.
    ///
    /// With `just_pressed` the input only counts on the tick it went from
    /// released to held. Analog inputs count as held while their magnitude is
    /// above epsilon.
    pub fn sample(&self, oracle: &dyn InputOracle, just_pressed: bool) -> bool {
        match &self.binding {
            Binding::Button(source) => {
                if just_pressed {
                    oracle.just_pressed(*source)
                } else {
                    oracle.is_pressed(*source)
                }
            }
            Binding::AnyOf(sources) => {
                if just_pressed {
                    // Newly held only if none of the members were held before
                    let held: Vec<_> = sources.iter().filter(|s| oracle.is_pressed(**s)).collect();
                    !held.is_empty() && held.iter().all(|s| oracle.just_pressed(**s))
                } else {
                    sources.iter().any(|s| oracle.is_pressed(*s))
                }
            }
            _ => {
                let now = self.sample_analog(oracle).is_nonzero();
                if just_pressed {
                    now && !self.read_axes(oracle, true).is_nonzero()
                } else {
                    now
                }
            }
        }
    }

    /// Sample this input's analog value; digital inputs yield `SampleValue::None`
    pub fn sample_analog(&self, oracle: &dyn InputOracle) -> SampleValue {
        self.read_axes(oracle, false)
    }

    fn read_axes(&self, oracle: &dyn InputOracle, previous: bool) -> SampleValue {
        let read = |axis: Axis| {
            if previous {
                oracle.previous_axis(axis)
            } else {
                oracle.axis(axis)
            }
        };

        match &self.binding {
            Binding::Button(_) | Binding::AnyOf(_) => SampleValue::None,
            Binding::Axis(axis) => SampleValue::Scalar(read(*axis)),
            Binding::Axes2([x, y]) => SampleValue::Vec2(Vec2::new(read(*x), read(*y))),
            Binding::Axes3([x, y, z]) => {
                SampleValue::Vec3(Vec3::new(read(*x), read(*y), read(*z)))
            }
        }
    }

    /// Physical bindings of this input, for display
    pub fn physical_sources(&self) -> Vec<InputSource> {
        match &self.binding {
            Binding::Button(source) => vec![*source],
            Binding::AnyOf(sources) => sources.clone(),
            _ => Vec::new(),
        }
    }
}

/// Immutable registry mapping canonical names to inputs
///
/// Built once and shared between all combinations and control blocks.
#[derive(Debug, Default)]
pub struct InputCatalog {
    /// Entries in registration order
    entries: Vec<Arc<InputDescriptor>>,

    /// Lookup by canonical name
    by_name: HashMap<String, Arc<InputDescriptor>>,
}

impl InputCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an input; returns false if the name is already taken
    pub fn register(&mut self, name: &str, label: &str, binding: Binding) -> bool {
        let descriptor = Arc::new(InputDescriptor::new(name, label, binding));
        if self.by_name.contains_key(descriptor.name()) {
            log::error!("Duplicate input name in catalog: {}", descriptor.name());
            return false;
        }
        self.by_name
            .insert(descriptor.name().to_string(), Arc::clone(&descriptor));
        self.entries.push(descriptor);
        true
    }

    /// Look up an input by name (case-insensitive)
    pub fn resolve(&self, name: &str) -> Result<&Arc<InputDescriptor>, InputError> {
        self.get(name)
            .ok_or_else(|| InputError::UnknownInput(name.to_string()))
    }

    /// Look up an input by name (case-insensitive), if it exists
    pub fn get(&self, name: &str) -> Option<&Arc<InputDescriptor>> {
        match self.by_name.get(name) {
            Some(descriptor) => Some(descriptor),
            None => self.by_name.get(&name.to_lowercase()),
        }
    }

    /// Check if a name is known
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All inputs in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<InputDescriptor>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the full catalog of keyboard, mouse, gamepad and game-control inputs
    pub fn standard() -> Self {
        let mut catalog = Self::new();

        for (name, code) in KEYS {
            catalog.register(
                name,
                super::source::key_label(*code),
                Binding::Button(InputSource::key(*code)),
            );
        }

        let either = |left: KeyCode, right: KeyCode| {
            Binding::AnyOf(vec![InputSource::key(left), InputSource::key(right)])
        };
        catalog.register("shift", "Shift (either)", either(KeyCode::ShiftLeft, KeyCode::ShiftRight));
        catalog.register("ctrl", "Ctrl (either)", either(KeyCode::ControlLeft, KeyCode::ControlRight));
        catalog.register("alt", "Alt (either)", either(KeyCode::AltLeft, KeyCode::AltRight));

        // Mouse
        for (name, label, button) in MOUSE_BUTTONS {
            catalog.register(name, label, Binding::Button(InputSource::mouse(*button)));
        }
        catalog.register("m.x", "Mouse X axis", Binding::Axis(Axis::MouseX));
        catalog.register("m.y", "Mouse Y axis", Binding::Axis(Axis::MouseY));
        catalog.register("m.scroll", "Mouse scroll", Binding::Axis(Axis::MouseScroll));
        catalog.register(
            "m.analog",
            "Mouse X, Y and scroll",
            Binding::Axes3([Axis::MouseX, Axis::MouseY, Axis::MouseScroll]),
        );

        // Gamepad
        for (name, label, button) in PAD_BUTTONS {
            catalog.register(name, label, Binding::Button(InputSource::pad(*button)));
        }
        let pad = Axis::Gamepad;
        for (name, label, axis) in PAD_AXES {
            catalog.register(name, label, Binding::Axis(pad(*axis)));
        }
        catalog.register(
            "g.lsanalog",
            "Gamepad left stick",
            Binding::Axes2([pad(gilrs::Axis::LeftStickX), pad(gilrs::Axis::LeftStickY)]),
        );
        catalog.register(
            "g.rsanalog",
            "Gamepad right stick",
            Binding::Axes2([pad(gilrs::Axis::RightStickX), pad(gilrs::Axis::RightStickY)]),
        );

        // Game controls
        for (name, control) in CONTROLS {
            catalog.register(name, control.label(), Binding::Button(InputSource::control(*control)));
        }
        let control = Axis::Control;
        catalog.register(
            "c.view",
            "Look rotation",
            Binding::Axes2([control(ControlAxis::LookX), control(ControlAxis::LookY)]),
        );
        catalog.register(
            "c.movement",
            "Movement",
            Binding::Axes3([
                control(ControlAxis::MoveX),
                control(ControlAxis::MoveY),
                control(ControlAxis::MoveZ),
            ]),
        );
        catalog.register("c.roll", "Roll", Binding::Axis(control(ControlAxis::Roll)));

        catalog
    }
}

const KEYS: &[(&str, KeyCode)] = &[
    ("a", KeyCode::KeyA),
    ("b", KeyCode::KeyB),
    ("c", KeyCode::KeyC),
    ("d", KeyCode::KeyD),
    ("e", KeyCode::KeyE),
    ("f", KeyCode::KeyF),
    ("g", KeyCode::KeyG),
    ("h", KeyCode::KeyH),
    ("i", KeyCode::KeyI),
    ("j", KeyCode::KeyJ),
    ("k", KeyCode::KeyK),
    ("l", KeyCode::KeyL),
    ("m", KeyCode::KeyM),
    ("n", KeyCode::KeyN),
    ("o", KeyCode::KeyO),
    ("p", KeyCode::KeyP),
    ("q", KeyCode::KeyQ),
    ("r", KeyCode::KeyR),
    ("s", KeyCode::KeyS),
    ("t", KeyCode::KeyT),
    ("u", KeyCode::KeyU),
    ("v", KeyCode::KeyV),
    ("w", KeyCode::KeyW),
    ("x", KeyCode::KeyX),
    ("y", KeyCode::KeyY),
    ("z", KeyCode::KeyZ),
    ("0", KeyCode::Digit0),
    ("1", KeyCode::Digit1),
    ("2", KeyCode::Digit2),
    ("3", KeyCode::Digit3),
    ("4", KeyCode::Digit4),
    ("5", KeyCode::Digit5),
    ("6", KeyCode::Digit6),
    ("7", KeyCode::Digit7),
    ("8", KeyCode::Digit8),
    ("9", KeyCode::Digit9),
    ("f1", KeyCode::F1),
    ("f2", KeyCode::F2),
    ("f3", KeyCode::F3),
    ("f4", KeyCode::F4),
    ("f5", KeyCode::F5),
    ("f6", KeyCode::F6),
    ("f7", KeyCode::F7),
    ("f8", KeyCode::F8),
    ("f9", KeyCode::F9),
    ("f10", KeyCode::F10),
    ("f11", KeyCode::F11),
    ("f12", KeyCode::F12),
    ("up", KeyCode::ArrowUp),
    ("down", KeyCode::ArrowDown),
    ("left", KeyCode::ArrowLeft),
    ("right", KeyCode::ArrowRight),
    ("insert", KeyCode::Insert),
    ("delete", KeyCode::Delete),
    ("home", KeyCode::Home),
    ("end", KeyCode::End),
    ("pageup", KeyCode::PageUp),
    ("pagedown", KeyCode::PageDown),
    ("lshift", KeyCode::ShiftLeft),
    ("rshift", KeyCode::ShiftRight),
    ("lctrl", KeyCode::ControlLeft),
    ("rctrl", KeyCode::ControlRight),
    ("lalt", KeyCode::AltLeft),
    ("ralt", KeyCode::AltRight),
    ("capslock", KeyCode::CapsLock),
    ("space", KeyCode::Space),
    ("enter", KeyCode::Enter),
    ("escape", KeyCode::Escape),
    ("backspace", KeyCode::Backspace),
    ("tab", KeyCode::Tab),
    ("comma", KeyCode::Comma),
    ("period", KeyCode::Period),
    ("slash", KeyCode::Slash),
    ("backslash", KeyCode::Backslash),
    ("semicolon", KeyCode::Semicolon),
    ("quote", KeyCode::Quote),
    ("openbracket", KeyCode::BracketLeft),
    ("closebracket", KeyCode::BracketRight),
    ("tilde", KeyCode::Backquote),
    ("minus", KeyCode::Minus),
    ("plus", KeyCode::Equal),
    ("numpad0", KeyCode::Numpad0),
    ("numpad1", KeyCode::Numpad1),
    ("numpad2", KeyCode::Numpad2),
    ("numpad3", KeyCode::Numpad3),
    ("numpad4", KeyCode::Numpad4),
    ("numpad5", KeyCode::Numpad5),
    ("numpad6", KeyCode::Numpad6),
    ("numpad7", KeyCode::Numpad7),
    ("numpad8", KeyCode::Numpad8),
    ("numpad9", KeyCode::Numpad9),
    ("numpadadd", KeyCode::NumpadAdd),
    ("numpadsubtract", KeyCode::NumpadSubtract),
    ("numpadmultiply", KeyCode::NumpadMultiply),
    ("numpaddivide", KeyCode::NumpadDivide),
    ("numpadenter", KeyCode::NumpadEnter),
    ("numpaddecimal", KeyCode::NumpadDecimal),
];

const MOUSE_BUTTONS: &[(&str, &str, MouseButton)] = &[
    ("m.left", "Left mouse button", MouseButton::Left),
    ("m.right", "Right mouse button", MouseButton::Right),
    ("m.middle", "Middle mouse button", MouseButton::Middle),
    ("m.button4", "Mouse button 4", MouseButton::Back),
    ("m.button5", "Mouse button 5", MouseButton::Forward),
];

const PAD_BUTTONS: &[(&str, &str, Button)] = &[
    ("g.a", "Gamepad A", Button::South),
    ("g.b", "Gamepad B", Button::East),
    ("g.x", "Gamepad X", Button::West),
    ("g.y", "Gamepad Y", Button::North),
    ("g.lb", "Gamepad left bumper", Button::LeftTrigger),
    ("g.rb", "Gamepad right bumper", Button::RightTrigger),
    ("g.lt", "Gamepad left trigger", Button::LeftTrigger2),
    ("g.rt", "Gamepad right trigger", Button::RightTrigger2),
    ("g.ls", "Gamepad left stick click", Button::LeftThumb),
    ("g.rs", "Gamepad right stick click", Button::RightThumb),
    ("g.back", "Gamepad back", Button::Select),
    ("g.start", "Gamepad start", Button::Start),
    ("g.guide", "Gamepad guide", Button::Mode),
    ("g.dpadup", "Gamepad D-pad up", Button::DPadUp),
    ("g.dpaddown", "Gamepad D-pad down", Button::DPadDown),
    ("g.dpadleft", "Gamepad D-pad left", Button::DPadLeft),
    ("g.dpadright", "Gamepad D-pad right", Button::DPadRight),
];

const PAD_AXES: &[(&str, &str, gilrs::Axis)] = &[
    ("g.lsx", "Gamepad left stick X", gilrs::Axis::LeftStickX),
    ("g.lsy", "Gamepad left stick Y", gilrs::Axis::LeftStickY),
    ("g.rsx", "Gamepad right stick X", gilrs::Axis::RightStickX),
    ("g.rsy", "Gamepad right stick Y", gilrs::Axis::RightStickY),
    ("g.ltanalog", "Gamepad left trigger (analog)", gilrs::Axis::LeftZ),
    ("g.rtanalog", "Gamepad right trigger (analog)", gilrs::Axis::RightZ),
];

const CONTROLS: &[(&str, GameControl)] = &[
    ("c.forward", GameControl::Forward),
    ("c.backward", GameControl::Backward),
    ("c.strafeleft", GameControl::StrafeLeft),
    ("c.straferight", GameControl::StrafeRight),
    ("c.jump", GameControl::Jump),
    ("c.crouch", GameControl::Crouch),
    ("c.rollleft", GameControl::RollLeft),
    ("c.rollright", GameControl::RollRight),
    ("c.lookup", GameControl::LookUp),
    ("c.lookdown", GameControl::LookDown),
    ("c.lookleft", GameControl::LookLeft),
    ("c.lookright", GameControl::LookRight),
    ("c.primaryaction", GameControl::PrimaryAction),
    ("c.secondaryaction", GameControl::SecondaryAction),
    ("c.use", GameControl::Use),
    ("c.sprint", GameControl::Sprint),
    ("c.lights", GameControl::Lights),
    ("c.park", GameControl::Park),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::state::InputState;

    #[test]
    fn test_standard_catalog_names_are_lowercase_and_unique() {
        let catalog = InputCatalog::standard();
        let mut seen = std::collections::HashSet::new();
        for descriptor in catalog.iter() {
            assert_eq!(descriptor.name(), descriptor.name().to_lowercase());
            assert!(seen.insert(descriptor.name().to_string()));
        }
        assert_eq!(seen.len(), catalog.len());
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let catalog = InputCatalog::standard();
        assert_eq!(catalog.resolve("M.Left").unwrap().name(), "m.left");
        assert_eq!(catalog.resolve("A").unwrap().name(), "a");
    }

    #[test]
    fn test_resolve_unknown() {
        let catalog = InputCatalog::standard();
        let err = catalog.resolve("zzz").unwrap_err();
        assert!(matches!(err, InputError::UnknownInput(ref name) if name == "zzz"));
    }

    #[test]
    fn test_kinds() {
        let catalog = InputCatalog::standard();
        let kind = |name: &str| catalog.resolve(name).unwrap().kind();
        assert_eq!(kind("a"), InputKind::Digital);
        assert_eq!(kind("shift"), InputKind::CompositeNamed);
        assert_eq!(kind("m.scroll"), InputKind::AnalogScalar);
        assert_eq!(kind("g.lsanalog"), InputKind::Analog2);
        assert_eq!(kind("c.view"), InputKind::Analog2);
        assert_eq!(kind("m.analog"), InputKind::Analog3);
        assert_eq!(InputKind::Analog3.type_name(), "Vector3");
        assert_eq!(InputKind::Digital.type_name(), "none");
    }

    #[test]
    fn test_register_duplicate_rejected() {
        let mut catalog = InputCatalog::new();
        let binding = Binding::Button(InputSource::key(KeyCode::KeyA));
        assert!(catalog.register("a", "A", binding.clone()));
        assert!(!catalog.register("A", "A", binding));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_sample_digital() {
        let catalog = InputCatalog::standard();
        let mut state = InputState::new();
        let a = catalog.resolve("a").unwrap();

        assert!(!a.sample(&state, false));
        state.press(InputSource::key(KeyCode::KeyA));
        assert!(a.sample(&state, false));
        assert!(a.sample(&state, true));

        state.end_tick();
        assert!(a.sample(&state, false));
        assert!(!a.sample(&state, true));
    }

    #[test]
    fn test_sample_composite() {
        let catalog = InputCatalog::standard();
        let mut state = InputState::new();
        let shift = catalog.resolve("shift").unwrap();

        state.press(InputSource::key(KeyCode::ShiftRight));
        assert!(shift.sample(&state, false));
        assert!(shift.sample(&state, true));
        assert_eq!(shift.sample_analog(&state), SampleValue::None);
    }

    #[test]
    fn test_sample_analog_epsilon() {
        let catalog = InputCatalog::standard();
        let mut state = InputState::new();
        let stick = catalog.resolve("g.lsanalog").unwrap();

        state.set_axis(Axis::Gamepad(gilrs::Axis::LeftStickX), 1e-7);
        assert!(!stick.sample(&state, false));

        state.set_axis(Axis::Gamepad(gilrs::Axis::LeftStickY), -0.5);
        assert!(stick.sample(&state, false));
        assert!(stick.sample(&state, true));
        assert_eq!(
            stick.sample_analog(&state),
            SampleValue::Vec2(Vec2::new(1e-7, -0.5))
        );

        state.end_tick();
        assert!(stick.sample(&state, false));
        assert!(!stick.sample(&state, true));
    }
}
