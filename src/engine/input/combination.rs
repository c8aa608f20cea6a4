// Ordered, de-duplicated sets of named inputs

use super::catalog::{InputCatalog, InputDescriptor};
use super::controls::ControlBindings;
use super::snapshot::PressedSnapshot;
use super::source::InputSource;
use super::state::InputOracle;
use super::InputError;
use std::fmt;
use std::sync::Arc;

/// How the members of a combination are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CombineMode {
    /// Satisfied when any member is pressed
    #[default]
    Any,
    /// Satisfied only when every member is pressed
    All,
}

impl CombineMode {
    /// Numeric form used in settings
    pub fn index(&self) -> u8 {
        match self {
            Self::Any => 0,
            Self::All => 1,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Any),
            1 => Some(Self::All),
            _ => None,
        }
    }
}

/// An ordered set of distinct catalog inputs
///
/// Never empty: removing the last member yields no combination at all.
/// Mutations build a new value; the canonical string is always rebuilt from
/// the member list.
#[derive(Debug, Clone)]
pub struct InputCombination {
    inputs: Vec<Arc<InputDescriptor>>,
    combination_string: String,
}

impl InputCombination {
    /// Parse a whitespace separated list of input names.
    ///
    /// Names are case-insensitive and duplicates are dropped, keeping the
    /// first occurrence. A single unknown name fails the whole parse.
    pub fn parse(catalog: &InputCatalog, text: &str) -> Result<Self, InputError> {
        let mut inputs: Vec<Arc<InputDescriptor>> = Vec::new();

        for token in text.split_whitespace() {
            let descriptor = catalog
                .get(token)
                .ok_or_else(|| InputError::UnresolvedCombination {
                    token: token.to_lowercase(),
                })?;

            if !inputs.iter().any(|i| Arc::ptr_eq(i, descriptor)) {
                inputs.push(Arc::clone(descriptor));
            }
        }

        Self::from_inputs(inputs).ok_or(InputError::Empty)
    }

    /// Parse, returning `None` on failure and optionally logging why
    pub fn try_parse(catalog: &InputCatalog, text: &str, log_errors: bool) -> Option<Self> {
        match Self::parse(catalog, text) {
            Ok(combination) => Some(combination),
            Err(e) => {
                if log_errors {
                    log::warn!("Invalid input combination '{}': {}", text, e);
                }
                None
            }
        }
    }

    /// Build a combination from already resolved inputs; `None` if empty
    pub fn from_inputs(inputs: Vec<Arc<InputDescriptor>>) -> Option<Self> {
        if inputs.is_empty() {
            return None;
        }
        let combination_string = inputs
            .iter()
            .map(|i| i.name())
            .collect::<Vec<_>>()
            .join(" ");
        Some(Self {
            inputs,
            combination_string,
        })
    }

    /// Canonical serialized form
    pub fn combination_string(&self) -> &str {
        &self.combination_string
    }

    pub fn inputs(&self) -> &[Arc<InputDescriptor>] {
        &self.inputs
    }

    /// Member names in order
    pub fn names(&self) -> Vec<&str> {
        self.inputs.iter().map(|i| i.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.inputs.iter().any(|i| i.name() == name)
    }

    /// Check the members against the current input state
    pub fn is_satisfied(
        &self,
        mode: CombineMode,
        oracle: &dyn InputOracle,
        just_pressed: bool,
    ) -> bool {
        match mode {
            CombineMode::Any => self.inputs.iter().any(|i| i.sample(oracle, just_pressed)),
            CombineMode::All => self.inputs.iter().all(|i| i.sample(oracle, just_pressed)),
        }
    }

    /// A new combination with `name` appended; unchanged if already present
    pub fn with_input(&self, catalog: &InputCatalog, name: &str) -> Result<Self, InputError> {
        let descriptor = catalog.resolve(name)?;
        if self.inputs.iter().any(|i| Arc::ptr_eq(i, descriptor)) {
            return Ok(self.clone());
        }

        let mut inputs = self.inputs.clone();
        inputs.push(Arc::clone(descriptor));
        Self::from_inputs(inputs).ok_or(InputError::Empty)
    }

    /// A new combination without `name`; `None` when the last member is removed
    pub fn without_input(
        &self,
        catalog: &InputCatalog,
        name: &str,
    ) -> Result<Option<Self>, InputError> {
        let descriptor = catalog.resolve(name)?;
        let inputs = self
            .inputs
            .iter()
            .filter(|i| !Arc::ptr_eq(*i, descriptor))
            .cloned()
            .collect();
        Ok(Self::from_inputs(inputs))
    }

    /// Capture the members' current values
    pub fn capture(&self, released: bool, oracle: &dyn InputOracle) -> PressedSnapshot {
        PressedSnapshot::capture(&self.inputs, released, oracle)
    }

    /// Render the members as the physical keys and buttons that drive them
    pub fn friendly_string(&self, mode: CombineMode, bindings: &ControlBindings) -> String {
        let separator = match mode {
            CombineMode::Any => " or ",
            CombineMode::All => " + ",
        };

        self.inputs
            .iter()
            .map(|input| friendly_name(input, bindings))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

fn friendly_name(input: &InputDescriptor, bindings: &ControlBindings) -> String {
    let sources = input.physical_sources();
    if sources.is_empty() {
        return input.label().to_string();
    }

    let mut labels = Vec::new();
    for source in sources {
        match source {
            InputSource::Control(control) => {
                let bound = bindings.get_sources(control);
                if bound.is_empty() {
                    labels.push(format!("{} (unbound)", control.label()));
                } else {
                    labels.extend(bound.iter().map(InputSource::label));
                }
            }
            physical => labels.push(physical.label()),
        }
    }
    labels.join("/")
}

impl PartialEq for InputCombination {
    fn eq(&self, other: &Self) -> bool {
        self.combination_string == other.combination_string
    }
}

impl fmt::Display for InputCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.combination_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::catalog::InputKind;
    use crate::engine::input::state::InputState;
    use winit::keyboard::KeyCode;

    fn parse(catalog: &InputCatalog, text: &str) -> InputCombination {
        InputCombination::parse(catalog, text).unwrap()
    }

    #[test]
    fn test_parse_lowercases_and_keeps_order() {
        let catalog = InputCatalog::standard();
        let combination = parse(&catalog, "  B   M.Left\tc.view ");
        assert_eq!(combination.combination_string(), "b m.left c.view");
        assert_eq!(combination.names(), vec!["b", "m.left", "c.view"]);
    }

    #[test]
    fn test_parse_deduplicates() {
        let catalog = InputCatalog::standard();
        let combination = parse(&catalog, "a a b A");
        assert_eq!(combination.len(), 2);
        assert_eq!(combination.combination_string(), "a b");
    }

    #[test]
    fn test_unknown_token_invalidates_parse() {
        let catalog = InputCatalog::standard();
        let err = InputCombination::parse(&catalog, "a zzz").unwrap_err();
        assert!(matches!(err, InputError::UnresolvedCombination { ref token } if token == "zzz"));
        assert!(InputCombination::try_parse(&catalog, "a zzz", false).is_none());
    }

    #[test]
    fn test_empty_text_is_no_combination() {
        let catalog = InputCatalog::standard();
        assert!(matches!(
            InputCombination::parse(&catalog, "   "),
            Err(InputError::Empty)
        ));
    }

    #[test]
    fn test_parse_is_idempotent() {
        let catalog = InputCatalog::standard();
        for text in ["a", "m.left shift g.lsanalog", "c.forward c.movement 5 f12"] {
            let first = parse(&catalog, text);
            let second = parse(&catalog, first.combination_string());
            assert_eq!(first, second);
            assert_eq!(first.names(), second.names());
        }
    }

    #[test]
    fn test_order_matters_for_identity_not_evaluation() {
        let catalog = InputCatalog::standard();
        let ab = parse(&catalog, "a b");
        let ba = parse(&catalog, "b a");
        assert_ne!(ab, ba);

        let mut state = InputState::new();
        state.press(InputSource::key(KeyCode::KeyB));
        assert_eq!(
            ab.is_satisfied(CombineMode::Any, &state, false),
            ba.is_satisfied(CombineMode::Any, &state, false)
        );
    }

    #[test]
    fn test_any_vs_all() {
        let catalog = InputCatalog::standard();
        let combination = parse(&catalog, "a b");
        let mut state = InputState::new();
        state.press(InputSource::key(KeyCode::KeyA));

        assert!(combination.is_satisfied(CombineMode::Any, &state, false));
        assert!(!combination.is_satisfied(CombineMode::All, &state, false));

        state.press(InputSource::key(KeyCode::KeyB));
        assert!(combination.is_satisfied(CombineMode::All, &state, false));
    }

    #[test]
    fn test_with_input() {
        let catalog = InputCatalog::standard();
        let combination = parse(&catalog, "a");

        let added = combination.with_input(&catalog, "G.A").unwrap();
        assert_eq!(added.combination_string(), "a g.a");

        let same = added.with_input(&catalog, "a").unwrap();
        assert_eq!(same, added);

        assert!(matches!(
            combination.with_input(&catalog, "nope"),
            Err(InputError::UnknownInput(_))
        ));
    }

    #[test]
    fn test_without_input() {
        let catalog = InputCatalog::standard();
        let combination = parse(&catalog, "a b");

        let removed = combination.without_input(&catalog, "a").unwrap().unwrap();
        assert_eq!(removed.combination_string(), "b");

        // Removing the last member leaves no combination
        assert!(removed.without_input(&catalog, "b").unwrap().is_none());

        assert!(combination.without_input(&catalog, "nope").is_err());
    }

    #[test]
    fn test_friendly_string() {
        let catalog = InputCatalog::standard();
        let bindings = ControlBindings::default();
        let combination = parse(&catalog, "c.jump m.left shift g.rsanalog");

        assert_eq!(
            combination.friendly_string(CombineMode::All, &bindings),
            "Space/Gamepad A + Mouse Left + Left Shift/Right Shift + Gamepad right stick"
        );

        let unbound = parse(&catalog, "c.forward");
        assert_eq!(
            unbound.friendly_string(CombineMode::Any, &ControlBindings::new()),
            "Forward (unbound)"
        );
    }

    #[test]
    fn test_capture_uses_member_kinds() {
        let catalog = InputCatalog::standard();
        let combination = parse(&catalog, "a m.analog");
        let state = InputState::new();

        let snapshot = combination.capture(true, &state);
        assert_eq!(snapshot.len(), 1);
        let kind = catalog.resolve("m.analog").unwrap().kind();
        assert_eq!(kind, InputKind::Analog3);
    }
}
