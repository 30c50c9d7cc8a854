//! # Stair Shapes
//!
//! Stairs are recognised by the unrotated footprint of their definition.

/// How a stair-like object connects planes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StairShape {
    /// 2×2 spiral staircase.
    Spiral,
    /// Straight staircase, 2×3, 2×4, 3×2, 4×2, 3×1 or 1×3.
    Shift,
    /// 1×1 ladder.
    Ladder,
}

impl StairShape {
    /// Classifies a definition size. `None` for unrecognised shapes.
    #[must_use]
    pub const fn classify(size_x: u8, size_y: u8) -> Option<Self> {
        match (size_x, size_y) {
            (2, 2) => Some(Self::Spiral),
            (2, 3) | (2, 4) | (3, 2) | (4, 2) | (3, 1) | (1, 3) => Some(Self::Shift),
            (1, 1) => Some(Self::Ladder),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(StairShape::classify(2, 2), Some(StairShape::Spiral));
        assert_eq!(StairShape::classify(1, 1), Some(StairShape::Ladder));
        for (x, y) in [(2, 3), (2, 4), (3, 2), (4, 2), (3, 1), (1, 3)] {
            assert_eq!(StairShape::classify(x, y), Some(StairShape::Shift), "{x}x{y}");
        }
        assert_eq!(StairShape::classify(3, 3), None);
        assert_eq!(StairShape::classify(1, 2), None);
        assert_eq!(StairShape::classify(0, 0), None);
    }
}
