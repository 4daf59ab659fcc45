//! Cardinal directions used by grid locomotion and dash taps.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// One of the four screen-space directions (+Y is up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinal {
    /// Toward +Y.
    Up,
    /// Toward -Y.
    Down,
    /// Toward -X.
    Left,
    /// Toward +X.
    Right,
}

impl Cardinal {
    /// Unit vector pointing in this direction.
    #[must_use]
    pub const fn to_vec2(self) -> Vec2 {
        match self {
            Self::Up => Vec2::Y,
            Self::Down => Vec2::NEG_Y,
            Self::Left => Vec2::NEG_X,
            Self::Right => Vec2::X,
        }
    }

    /// Quantizes a movement intent to a cardinal direction.
    ///
    /// The horizontal axis wins whenever it is non-zero, so a diagonal
    /// intent resolves to `Left` or `Right`. Returns `None` for a zero
    /// (or non-finite) intent.
    #[must_use]
    pub fn from_intent(intent: Vec2) -> Option<Self> {
        if !intent.is_finite() {
            return None;
        }
        if intent.x > 0.0 {
            Some(Self::Right)
        } else if intent.x < 0.0 {
            Some(Self::Left)
        } else if intent.y > 0.0 {
            Some(Self::Up)
        } else if intent.y < 0.0 {
            Some(Self::Down)
        } else {
            None
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// All directions.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Up, Self::Down, Self::Left, Self::Right]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unit_vectors() {
        for dir in Cardinal::all() {
            assert!((dir.to_vec2().length() - 1.0).abs() < f32::EPSILON);
            assert_eq!(dir.to_vec2(), -dir.opposite().to_vec2());
        }
    }

    #[test]
    fn test_zero_intent() {
        assert_eq!(Cardinal::from_intent(Vec2::ZERO), None);
        assert_eq!(Cardinal::from_intent(Vec2::new(f32::NAN, 1.0)), None);
    }

    #[test]
    fn test_vertical_only() {
        assert_eq!(Cardinal::from_intent(Vec2::new(0.0, -1.0)), Some(Cardinal::Down));
        assert_eq!(Cardinal::from_intent(Vec2::new(0.0, 0.5)), Some(Cardinal::Up));
    }

    proptest! {
        #[test]
        fn prop_quantized_direction_agrees_with_dominant_sign(x in -1.0f32..1.0, y in -1.0f32..1.0) {
            let quantized = Cardinal::from_intent(Vec2::new(x, y));
            match quantized {
                Some(Cardinal::Right) => prop_assert!(x > 0.0),
                Some(Cardinal::Left) => prop_assert!(x < 0.0),
                Some(Cardinal::Up) => prop_assert!(x == 0.0 && y > 0.0),
                Some(Cardinal::Down) => prop_assert!(x == 0.0 && y < 0.0),
                None => prop_assert!(x == 0.0 && y == 0.0),
            }
        }
    }
}
