use serde::{Deserialize, Serialize};

/// Identity of an entity in the registry.
///
/// Ids are arena slots handed out in insertion order and never reused, so
/// equality of ids is equality of entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Arena slot backing this id.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Linear RGBA tint in the 0..=1 range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgb8(255, 255, 255);
    pub const RED: Self = Self::rgb8(230, 41, 55);
    pub const PURPLE: Self = Self::rgb8(200, 122, 255);
    pub const DARKGRAY: Self = Self::rgb8(80, 80, 80);
    pub const RAYWHITE: Self = Self::rgb8(245, 245, 245);

    /// Build an opaque color from 8-bit channels.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
