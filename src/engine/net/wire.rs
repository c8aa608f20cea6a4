// Input snapshot wire format
//
// ```text
// <entity id>;<name>;<name>=<x>;<name>=<x>,<y>;<name>=<x>,<y>,<z>
// ```
//
// The text is sent as UTF-16 (little endian). A bare name is a held digital
// input; the number of components after `=` decides whether the value is a
// scalar, a 2-vector or a 3-vector.

use crate::engine::input::{PressedSnapshot, SampleValue};

/// Application-level tag of input snapshot messages on the shared channel
pub const INPUT_MESSAGE_ID: u16 = 0xC0DE;

/// Messages larger than this are likely to be rejected by the transport, and
/// are refused on decode
pub const MAX_MESSAGE_BYTES: usize = 4096;

const FIELD_SEPARATOR: char = ';';
const VALUE_SEPARATOR: char = '=';
const COMPONENT_SEPARATOR: char = ',';

/// Errors that can occur when decoding a snapshot message
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WireError {
    #[error("Message is {0} bytes, over the {} byte limit", MAX_MESSAGE_BYTES)]
    TooLarge(usize),

    #[error("Message has odd length {0}, not UTF-16")]
    OddLength(usize),

    #[error("Message is not valid UTF-16")]
    InvalidUtf16,

    #[error("Message has no entity id")]
    MissingEntityId,

    #[error("Invalid entity id: {0:?}")]
    InvalidEntityId(String),

    #[error("Empty input name in field {0}")]
    EmptyName(usize),

    #[error("Input {name} listed twice")]
    DuplicateName { name: String },

    #[error("Invalid value {value:?} for input {name}")]
    InvalidComponent { name: String, value: String },

    #[error("Input {name} has {count} components, expected 1 to 3")]
    BadArity { name: String, count: usize },
}

/// Serialize a snapshot for the given entity
pub fn encode(snapshot: &PressedSnapshot, entity_id: u64) -> Vec<u8> {
    let mut text = entity_id.to_string();

    for (name, value) in snapshot.iter() {
        text.push(FIELD_SEPARATOR);
        text.push_str(name);

        let components = value.components();
        if !components.is_empty() {
            text.push(VALUE_SEPARATOR);
            let joined = components
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(&COMPONENT_SEPARATOR.to_string());
            text.push_str(&joined);
        }
    }

    let bytes: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();

    if bytes.len() > MAX_MESSAGE_BYTES {
        log::warn!(
            "Input message for entity {} is {} bytes, over the {} byte limit",
            entity_id,
            bytes.len(),
            MAX_MESSAGE_BYTES
        );
    }

    bytes
}

/// Parse a snapshot message; any malformed field rejects the whole message
pub fn decode(bytes: &[u8]) -> Result<(u64, PressedSnapshot), WireError> {
    if bytes.len() > MAX_MESSAGE_BYTES {
        return Err(WireError::TooLarge(bytes.len()));
    }
    if bytes.len() % 2 != 0 {
        return Err(WireError::OddLength(bytes.len()));
    }

    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let text = String::from_utf16(&units).map_err(|_| WireError::InvalidUtf16)?;

    let mut fields = text.split(FIELD_SEPARATOR);

    let id_field = fields.next().unwrap_or_default();
    if id_field.is_empty() {
        return Err(WireError::MissingEntityId);
    }
    let entity_id = id_field
        .parse::<u64>()
        .map_err(|_| WireError::InvalidEntityId(id_field.to_string()))?;

    let mut snapshot = PressedSnapshot::new();
    for (index, field) in fields.enumerate() {
        let (name, value) = parse_field(index + 1, field)?;
        if snapshot.contains(name) {
            return Err(WireError::DuplicateName {
                name: name.to_string(),
            });
        }
        snapshot.insert(name, value);
    }

    Ok((entity_id, snapshot))
}

fn parse_field(index: usize, field: &str) -> Result<(&str, SampleValue), WireError> {
    let (name, value) = match field.split_once(VALUE_SEPARATOR) {
        Some((name, value)) => (name, Some(value)),
        None => (field, None),
    };

    if name.is_empty() {
        return Err(WireError::EmptyName(index));
    }

    let Some(value) = value else {
        return Ok((name, SampleValue::None));
    };

    let components = value
        .split(COMPONENT_SEPARATOR)
        .map(|c| {
            c.parse::<f32>().map_err(|_| WireError::InvalidComponent {
                name: name.to_string(),
                value: value.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // An empty value list never comes from encode, so it is malformed too
    match SampleValue::from_components(&components) {
        Some(sample) if !components.is_empty() => Ok((name, sample)),
        _ => Err(WireError::BadArity {
            name: name.to_string(),
            count: components.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    fn utf16(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    fn mixed_snapshot() -> PressedSnapshot {
        let mut snapshot = PressedSnapshot::new();
        snapshot.insert("a", SampleValue::None);
        snapshot.insert("m.scroll", SampleValue::Scalar(-1.5));
        snapshot.insert("g.lsanalog", SampleValue::Vec2(Vec2::new(0.25, -0.75)));
        snapshot.insert("c.movement", SampleValue::Vec3(Vec3::new(0.0, 1.0, -0.1)));
        snapshot
    }

    #[test]
    fn test_encode_format() {
        let bytes = encode(&mixed_snapshot(), 42);
        assert_eq!(
            bytes,
            utf16("42;a;m.scroll=-1.5;g.lsanalog=0.25,-0.75;c.movement=0,1,-0.1")
        );
    }

    #[test]
    fn test_round_trip() {
        let snapshot = mixed_snapshot();
        let (id, decoded) = decode(&encode(&snapshot, 7)).unwrap();
        assert_eq!(id, 7);
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn test_empty_snapshot() {
        let (id, decoded) = decode(&encode(&PressedSnapshot::new(), u64::MAX)).unwrap();
        assert_eq!(id, u64::MAX);
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_oversize_message() {
        let mut snapshot = PressedSnapshot::new();
        for i in 0..200 {
            snapshot.insert(&format!("input.{}", i), SampleValue::Vec3(Vec3::splat(0.125)));
        }

        // Still encoded, but the authority refuses it
        let bytes = encode(&snapshot, 1);
        assert!(bytes.len() > MAX_MESSAGE_BYTES);
        assert_eq!(decode(&bytes), Err(WireError::TooLarge(bytes.len())));

        // Right at the limit is fine
        let padded = format!("1;{}", "a".repeat(MAX_MESSAGE_BYTES / 2 - 2));
        assert_eq!(utf16(&padded).len(), MAX_MESSAGE_BYTES);
        assert!(decode(&utf16(&padded)).is_ok());
    }

    #[test]
    fn test_odd_length_rejected() {
        assert_eq!(decode(&[0x31, 0x00, 0x3b]), Err(WireError::OddLength(3)));
    }

    #[test]
    fn test_invalid_utf16_rejected() {
        // Lone high surrogate
        assert_eq!(decode(&[0x00, 0xD8]), Err(WireError::InvalidUtf16));
    }

    #[test]
    fn test_bad_entity_id_rejected() {
        assert_eq!(decode(&utf16("")), Err(WireError::MissingEntityId));
        assert!(matches!(
            decode(&utf16("abc;a")),
            Err(WireError::InvalidEntityId(_))
        ));
    }

    #[test]
    fn test_malformed_fields_reject_whole_message() {
        assert_eq!(decode(&utf16("1;a;;b")), Err(WireError::EmptyName(2)));
        assert!(matches!(
            decode(&utf16("1;a;m.x=abc")),
            Err(WireError::InvalidComponent { .. })
        ));
        assert!(matches!(
            decode(&utf16("1;m.x=")),
            Err(WireError::InvalidComponent { .. })
        ));
        assert!(matches!(
            decode(&utf16("1;m.x=1,2,3,4")),
            Err(WireError::BadArity { count: 4, .. })
        ));
        assert!(matches!(
            decode(&utf16("1;a;a")),
            Err(WireError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_truncated_message_rejected() {
        let bytes = encode(&mixed_snapshot(), 3);
        // Cut inside the last value
        let truncated = &bytes[..bytes.len() - 6];
        let result = decode(truncated);
        // "...c.movement=0,1,-" leaves a dangling sign
        assert!(matches!(result, Err(WireError::InvalidComponent { .. })));
    }
}
