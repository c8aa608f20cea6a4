// Point-in-time capture of sampled input values

use super::catalog::{InputDescriptor, InputKind};
use super::state::InputOracle;
use crate::core::math::is_nonzero;
use glam::{Vec2, Vec3};
use indexmap::IndexMap;
use std::sync::Arc;

/// A sampled input value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleValue {
    /// Digital input, presence means "held"
    None,
    Scalar(f32),
    Vec2(Vec2),
    Vec3(Vec3),
}

impl SampleValue {
    /// The neutral value for an input kind
    pub fn zero(kind: InputKind) -> Self {
        match kind {
            InputKind::Digital | InputKind::CompositeNamed => Self::None,
            InputKind::AnalogScalar => Self::Scalar(0.0),
            InputKind::Analog2 => Self::Vec2(Vec2::ZERO),
            InputKind::Analog3 => Self::Vec3(Vec3::ZERO),
        }
    }

    /// Build a value from its components; 0 to 3 components are accepted
    pub fn from_components(components: &[f32]) -> Option<Self> {
        match *components {
            [] => Some(Self::None),
            [x] => Some(Self::Scalar(x)),
            [x, y] => Some(Self::Vec2(Vec2::new(x, y))),
            [x, y, z] => Some(Self::Vec3(Vec3::new(x, y, z))),
            _ => None,
        }
    }

    /// Components of the value, empty for `None`
    pub fn components(&self) -> Vec<f32> {
        match self {
            Self::None => Vec::new(),
            Self::Scalar(x) => vec![*x],
            Self::Vec2(v) => v.to_array().to_vec(),
            Self::Vec3(v) => v.to_array().to_vec(),
        }
    }

    /// Whether the value's magnitude is above the analog epsilon
    pub fn is_nonzero(&self) -> bool {
        match self {
            Self::None => false,
            Self::Scalar(x) => is_nonzero(*x),
            Self::Vec2(v) => is_nonzero(v.length()),
            Self::Vec3(v) => is_nonzero(v.length()),
        }
    }
}

/// Map of input name to sampled value, in capture order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PressedSnapshot {
    values: IndexMap<String, SampleValue>,
}

impl PressedSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the given inputs.
    ///
    /// Held digital inputs are recorded as `SampleValue::None`, released ones
    /// are left out. Analog inputs are always recorded; when `released` is set
    /// they are recorded as zero so consumers see a neutral value instead of
    /// whatever the device reports.
    pub fn capture<'a>(
        inputs: impl IntoIterator<Item = &'a Arc<InputDescriptor>>,
        released: bool,
        oracle: &dyn InputOracle,
    ) -> Self {
        let mut snapshot = Self::new();
        for input in inputs {
            let kind = input.kind();
            if kind.is_analog() {
                let value = if released {
                    SampleValue::zero(kind)
                } else {
                    input.sample_analog(oracle)
                };
                snapshot.insert(input.name(), value);
            } else if !released && input.sample(oracle, false) {
                snapshot.insert(input.name(), SampleValue::None);
            }
        }
        snapshot
    }

    pub fn insert(&mut self, name: &str, value: SampleValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&SampleValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SampleValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
