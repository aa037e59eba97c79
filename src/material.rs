//! Keeps surface materials in step with the [`ColorModel`](crate::color::ColorModel).

use serde::Serialize;

use crate::color::Color;
use crate::scene::RenderablePart;

/// PBR parameters for every recolorable part.
pub const METALNESS: f32 = 0.7;
pub const ROUGHNESS: f32 = 0.5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BackdropKind {
    /// Scene clear color.
    Background,
    /// Display plate under the bag.
    Plate,
}

/// A surface outside the loaded model that follows the ambient tint.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct BackdropSurface {
    pub kind: BackdropKind,
    pub tint: Color,
}

impl BackdropSurface {
    pub fn new(kind: BackdropKind) -> Self {
        Self { kind, tint: Color::WHITE }
    }
}

/// Recolors every part that is neither fixed-textured nor a decal.
///
/// Returns how many parts were touched. Calling it again with the same color
/// leaves everything as it was.
pub fn apply(parts: &mut [RenderablePart], color: Color) -> usize {
    let mut touched = 0;
    for part in parts.iter_mut().filter(|p| p.is_recolorable()) {
        part.color = Some(color);
        touched += 1;
    }
    touched
}

pub fn sync_backdrop(surfaces: &mut [BackdropSurface], tint: Color) {
    for surface in surfaces {
        surface.tint = tint;
    }
}
