// Math utilities and helper functions

/// Smallest analog magnitude that still counts as "pressed"
pub const ANALOG_EPSILON: f32 = 1e-6;

/// Check whether an analog reading is far enough from zero to count as input
pub fn is_nonzero(value: f32) -> bool {
    value.abs() > ANALOG_EPSILON
}

/// Round a value to a fixed number of decimal places
pub fn round_to(value: f32, decimals: i32) -> f32 {
    let scale = 10f32.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_nonzero() {
        assert!(!is_nonzero(0.0));
        assert!(!is_nonzero(-0.0));
        assert!(!is_nonzero(5e-7));
        assert!(is_nonzero(1e-5));
        assert!(is_nonzero(-0.25));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.12345, 3), 0.123);
        assert_eq!(round_to(1.0005, 0), 1.0);
        assert_eq!(round_to(2.5, 3), 2.5);
    }
}
