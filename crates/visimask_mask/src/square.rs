//! Axis-aligned square region in the horizontal plane
//!
//! A fragment at `p` is inside the region around `c` with half extent `s` when
//! `|p.x - c.x| <= s` and `|p.z - c.z| <= s`. The boundary counts as inside and
//! the height is ignored.

use serde::{Deserialize, Serialize};
use visimask_math::Vec3;

/// Square region centered on a reference point
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SquareRegion {
    center: Vec3,
    half_extent: f32,
}

impl SquareRegion {
    /// Create a region; negative or NaN extents are clamped to 0
    pub fn new(center: Vec3, half_extent: f32) -> Self {
        Self { center, half_extent: sanitize_extent(half_extent) }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn half_extent(&self) -> f32 {
        self.half_extent
    }

    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }

    pub fn set_half_extent(&mut self, half_extent: f32) {
        self.half_extent = sanitize_extent(half_extent);
    }

    /// Closed containment test over X and Z
    #[inline]
    pub fn contains(&self, p: Vec3) -> bool {
        (p.x - self.center.x).abs() <= self.half_extent
            && (p.z - self.center.z).abs() <= self.half_extent
    }
}

pub(crate) fn sanitize_extent(half_extent: f32) -> f32 {
    if half_extent >= 0.0 {
        half_extent
    } else {
        log::warn!("Square mask size {} is negative; clamping to 0", half_extent);
        0.0
    }
}

/// How the square mask colors fragments
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SquareMaskStyle {
    /// Inside keeps its color, outside is black
    #[default]
    Recolor,
    /// Inside is white, outside is black
    Binary,
}

impl SquareMaskStyle {
    pub fn toggled(self) -> Self {
        match self {
            SquareMaskStyle::Recolor => SquareMaskStyle::Binary,
            SquareMaskStyle::Binary => SquareMaskStyle::Recolor,
        }
    }
}

const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Final color of a fragment given its containment
pub fn shade(color: [f32; 4], inside: bool, style: SquareMaskStyle) -> [f32; 4] {
    match (style, inside) {
        (SquareMaskStyle::Recolor, true) => color,
        (SquareMaskStyle::Binary, true) => WHITE,
        (_, false) => BLACK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_is_inside() {
        let region = SquareRegion::new(Vec3::ZERO, 5.0);
        assert!(region.contains(Vec3::new(5.0, 0.0, 3.0)));
        assert!(!region.contains(Vec3::new(5.01, 0.0, 3.0)));
        assert!(region.contains(Vec3::new(-5.0, 0.0, -5.0)));
    }

    #[test]
    fn test_height_is_ignored() {
        let region = SquareRegion::new(Vec3::new(1.0, 0.0, 1.0), 1.0);
        assert!(region.contains(Vec3::new(1.5, 1000.0, 0.5)));
    }

    #[test]
    fn test_zero_extent_contains_only_center_column() {
        let region = SquareRegion::new(Vec3::new(2.0, 0.0, 3.0), 0.0);
        assert!(region.contains(Vec3::new(2.0, 7.0, 3.0)));
        assert!(!region.contains(Vec3::new(2.001, 0.0, 3.0)));
    }

    #[test]
    fn test_negative_extent_is_clamped() {
        let mut region = SquareRegion::new(Vec3::ZERO, -3.0);
        assert_eq!(region.half_extent(), 0.0);
        region.set_half_extent(f32::NAN);
        assert_eq!(region.half_extent(), 0.0);
        region.set_half_extent(2.5);
        assert_eq!(region.half_extent(), 2.5);
    }

    #[test]
    fn test_follows_center() {
        let mut region = SquareRegion::new(Vec3::ZERO, 1.0);
        let p = Vec3::new(4.0, 0.0, 4.0);
        assert!(!region.contains(p));
        region.set_center(Vec3::new(3.5, 0.0, 3.5));
        assert!(region.contains(p));
    }

    #[test]
    fn test_shade_styles() {
        let c = [0.3, 0.6, 0.9, 1.0];
        assert_eq!(shade(c, true, SquareMaskStyle::Recolor), c);
        assert_eq!(shade(c, false, SquareMaskStyle::Recolor), BLACK);
        assert_eq!(shade(c, true, SquareMaskStyle::Binary), WHITE);
        assert_eq!(shade(c, false, SquareMaskStyle::Binary), BLACK);
    }
}
