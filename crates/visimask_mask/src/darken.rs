//! Shading policy for fragments that fail a mask

use serde::{Deserialize, Serialize};

use crate::frustum::Visibility;

/// How strongly masked-out fragments are darkened
///
/// The output color is `rgb * factor` with alpha forced to 1. A factor of 0
/// blacks the fragment out entirely; 1 leaves it unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DarkenPolicy {
    pub factor: f32,
}

impl DarkenPolicy {
    /// Fully black
    pub const BLACK: Self = Self { factor: 0.0 };
    /// Keep 5% of the original brightness
    pub const DIM: Self = Self { factor: 0.05 };

    /// Create a policy, clamping the factor to [0, 1]
    pub fn new(factor: f32) -> Self {
        let factor = if factor.is_nan() { 0.0 } else { factor.clamp(0.0, 1.0) };
        Self { factor }
    }

    /// Darken one RGBA color
    #[inline]
    pub fn apply(self, color: [f32; 4]) -> [f32; 4] {
        [
            color[0] * self.factor,
            color[1] * self.factor,
            color[2] * self.factor,
            1.0,
        ]
    }
}

impl Default for DarkenPolicy {
    fn default() -> Self {
        Self::DIM
    }
}

/// Final color of a fragment given its frustum visibility
///
/// Visible fragments pass through untouched.
pub fn shade_fragment(color: [f32; 4], visibility: Visibility, policy: DarkenPolicy) -> [f32; 4] {
    if visibility.is_visible() {
        color
    } else {
        policy.apply(color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_passes_through() {
        let c = [0.2, 0.4, 0.6, 0.5];
        assert_eq!(shade_fragment(c, Visibility::Visible, DarkenPolicy::BLACK), c);
    }

    #[test]
    fn test_black_policy() {
        let c = [0.2, 0.4, 0.6, 0.5];
        assert_eq!(
            shade_fragment(c, Visibility::Occluded, DarkenPolicy::BLACK),
            [0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_dim_keeps_five_percent() {
        let out = DarkenPolicy::DIM.apply([1.0, 0.5, 0.0, 0.3]);
        assert!((out[0] - 0.05).abs() < 1e-6);
        assert!((out[1] - 0.025).abs() < 1e-6);
        assert_eq!(out[2], 0.0);
        assert_eq!(out[3], 1.0);
    }

    #[test]
    fn test_new_clamps() {
        assert_eq!(DarkenPolicy::new(-1.0).factor, 0.0);
        assert_eq!(DarkenPolicy::new(3.0).factor, 1.0);
        assert_eq!(DarkenPolicy::new(f32::NAN).factor, 0.0);
    }
}
