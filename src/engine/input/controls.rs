// Abstract game controls and their physical bindings

use super::source::InputSource;
use gilrs::Button;
use std::collections::HashMap;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// Abstract game controls, independent of the device that drives them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameControl {
    // Movement
    Forward,
    Backward,
    StrafeLeft,
    StrafeRight,
    Jump,
    Crouch,
    RollLeft,
    RollRight,

    // Looking (digital look keys)
    LookUp,
    LookDown,
    LookLeft,
    LookRight,

    // Actions
    PrimaryAction,
    SecondaryAction,
    Use,
    Sprint,
    Lights,
    Park,
}

impl GameControl {
    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Forward => "Forward",
            Self::Backward => "Backward",
            Self::StrafeLeft => "Strafe left",
            Self::StrafeRight => "Strafe right",
            Self::Jump => "Up / Jump",
            Self::Crouch => "Down / Crouch",
            Self::RollLeft => "Roll left",
            Self::RollRight => "Roll right",
            Self::LookUp => "Look up",
            Self::LookDown => "Look down",
            Self::LookLeft => "Look left",
            Self::LookRight => "Look right",
            Self::PrimaryAction => "Primary action",
            Self::SecondaryAction => "Secondary action",
            Self::Use => "Use",
            Self::Sprint => "Sprint",
            Self::Lights => "Toggle lights",
            Self::Park => "Park",
        }
    }
}

/// Analog game control channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAxis {
    LookX,
    LookY,
    MoveX,
    MoveY,
    MoveZ,
    Roll,
}

/// Maps physical input sources to game controls
#[derive(Debug, Clone)]
pub struct ControlBindings {
    /// Mapping from input sources to controls
    bindings: HashMap<InputSource, GameControl>,

    /// Reverse mapping for quick lookups (control -> all sources)
    control_to_sources: HashMap<GameControl, Vec<InputSource>>,
}

impl ControlBindings {
    /// Create an empty binding table
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            control_to_sources: HashMap::new(),
        }
    }

    /// Create a binding table from a list of bindings
    pub fn from_bindings(bindings: Vec<(InputSource, GameControl)>) -> Self {
        let mut table = Self::new();
        for (source, control) in bindings {
            table.bind(source, control);
        }
        table
    }

    /// Bind a physical input source to a control
    pub fn bind(&mut self, source: InputSource, control: GameControl) {
        // Controls cannot drive other controls
        if !source.is_physical() {
            log::warn!("Ignoring binding of {:?} to {:?}", source, control);
            return;
        }

        // Remove any existing binding for this source
        self.unbind_source(source);

        self.bindings.insert(source, control);
        self.control_to_sources
            .entry(control)
            .or_default()
            .push(source);
    }

    /// Unbind an input source
    pub fn unbind_source(&mut self, source: InputSource) {
        if let Some(control) = self.bindings.remove(&source) {
            if let Some(sources) = self.control_to_sources.get_mut(&control) {
                sources.retain(|s| *s != source);
                if sources.is_empty() {
                    self.control_to_sources.remove(&control);
                }
            }
        }
    }

    /// Unbind all sources for a control
    pub fn unbind_control(&mut self, control: GameControl) {
        if let Some(sources) = self.control_to_sources.remove(&control) {
            for source in sources {
                self.bindings.remove(&source);
            }
        }
    }

    /// Get the control bound to an input source
    pub fn get_control(&self, source: InputSource) -> Option<GameControl> {
        self.bindings.get(&source).copied()
    }

    /// Get all input sources bound to a control, in binding order
    pub fn get_sources(&self, control: GameControl) -> &[InputSource] {
        self.control_to_sources
            .get(&control)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Check if a control has any bindings
    pub fn has_binding(&self, control: GameControl) -> bool {
        self.control_to_sources.contains_key(&control)
    }

    /// Clear all bindings
    pub fn clear(&mut self) {
        self.bindings.clear();
        self.control_to_sources.clear();
    }

    /// Reset to the default keyboard/mouse/gamepad layout
    pub fn reset_to_defaults(&mut self) {
        self.clear();
        for (source, control) in default_bindings() {
            self.bind(source, control);
        }
    }
}

impl Default for ControlBindings {
    fn default() -> Self {
        Self::from_bindings(default_bindings())
    }
}

/// Default bindings for the abstract game controls
pub fn default_bindings() -> Vec<(InputSource, GameControl)> {
    vec![
        // Movement (WASD - standard gaming layout)
        (InputSource::key(KeyCode::KeyW), GameControl::Forward),
        (InputSource::key(KeyCode::KeyS), GameControl::Backward),
        (InputSource::key(KeyCode::KeyA), GameControl::StrafeLeft),
        (InputSource::key(KeyCode::KeyD), GameControl::StrafeRight),
        (InputSource::key(KeyCode::Space), GameControl::Jump),
        (InputSource::key(KeyCode::KeyC), GameControl::Crouch),
        (InputSource::key(KeyCode::KeyQ), GameControl::RollLeft),
        (InputSource::key(KeyCode::KeyE), GameControl::RollRight),
        // Look keys
        (InputSource::key(KeyCode::ArrowUp), GameControl::LookUp),
        (InputSource::key(KeyCode::ArrowDown), GameControl::LookDown),
        (InputSource::key(KeyCode::ArrowLeft), GameControl::LookLeft),
        (InputSource::key(KeyCode::ArrowRight), GameControl::LookRight),
        // Actions
        (InputSource::mouse(MouseButton::Left), GameControl::PrimaryAction),
        (InputSource::mouse(MouseButton::Right), GameControl::SecondaryAction),
        (InputSource::key(KeyCode::KeyF), GameControl::Use),
        (InputSource::key(KeyCode::ShiftLeft), GameControl::Sprint),
        (InputSource::key(KeyCode::KeyL), GameControl::Lights),
        (InputSource::key(KeyCode::KeyP), GameControl::Park),
        // Gamepad
        (InputSource::pad(Button::South), GameControl::Jump),
        (InputSource::pad(Button::East), GameControl::Crouch),
        (InputSource::pad(Button::West), GameControl::Use),
        (InputSource::pad(Button::LeftTrigger), GameControl::RollLeft),
        (InputSource::pad(Button::RightTrigger), GameControl::RollRight),
        (InputSource::pad(Button::RightTrigger2), GameControl::PrimaryAction),
        (InputSource::pad(Button::LeftTrigger2), GameControl::SecondaryAction),
        (InputSource::pad(Button::LeftThumb), GameControl::Sprint),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_control() {
        let mut bindings = ControlBindings::new();
        let source = InputSource::key(KeyCode::KeyA);
        bindings.bind(source, GameControl::StrafeLeft);

        assert_eq!(bindings.get_control(source), Some(GameControl::StrafeLeft));
    }

    #[test]
    fn test_controls_cannot_bind_controls() {
        let mut bindings = ControlBindings::new();
        bindings.bind(InputSource::control(GameControl::Jump), GameControl::Forward);
        assert!(!bindings.has_binding(GameControl::Forward));
    }

    #[test]
    fn test_unbind_source() {
        let mut bindings = ControlBindings::new();
        let source = InputSource::key(KeyCode::KeyA);
        bindings.bind(source, GameControl::StrafeLeft);
        bindings.unbind_source(source);

        assert_eq!(bindings.get_control(source), None);
        assert!(!bindings.has_binding(GameControl::StrafeLeft));
    }

    #[test]
    fn test_unbind_control() {
        let mut bindings = ControlBindings::new();
        let source1 = InputSource::key(KeyCode::Space);
        let source2 = InputSource::pad(Button::South);

        bindings.bind(source1, GameControl::Jump);
        bindings.bind(source2, GameControl::Jump);
        bindings.unbind_control(GameControl::Jump);

        assert_eq!(bindings.get_control(source1), None);
        assert_eq!(bindings.get_control(source2), None);
    }

    #[test]
    fn test_get_sources_in_order() {
        let bindings = ControlBindings::default();
        let sources = bindings.get_sources(GameControl::Jump);
        assert_eq!(
            sources,
            &[
                InputSource::key(KeyCode::Space),
                InputSource::pad(Button::South)
            ]
        );
        assert!(ControlBindings::new().get_sources(GameControl::Jump).is_empty());
    }

    #[test]
    fn test_rebind_source() {
        let mut bindings = ControlBindings::new();
        let source = InputSource::key(KeyCode::KeyW);

        bindings.bind(source, GameControl::Forward);
        bindings.bind(source, GameControl::Jump);

        assert_eq!(bindings.get_control(source), Some(GameControl::Jump));
        assert!(!bindings.has_binding(GameControl::Forward));
    }

    #[test]
    fn test_reset_to_defaults() {
        let mut bindings = ControlBindings::new();
        bindings.bind(InputSource::key(KeyCode::KeyZ), GameControl::Forward);
        bindings.reset_to_defaults();

        assert_eq!(
            bindings.get_sources(GameControl::Forward),
            &[InputSource::key(KeyCode::KeyW)]
        );
    }

    #[test]
    fn test_no_duplicate_sources_in_defaults() {
        let mut seen_sources = std::collections::HashSet::new();
        for (source, _) in default_bindings() {
            assert!(
                seen_sources.insert(source),
                "Duplicate input source found in default bindings"
            );
        }
    }
}
