//! What the crate knows about the loaded model.
//!
//! The rendering surface owns the real mesh graph. After a load it hands back
//! one [`RenderablePart`] per mesh, already tagged with whether the mesh carries
//! a fixed texture or is a decal, so recoloring never has to inspect materials.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Axis-aligned bounding box in model space.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderablePart {
    pub name: String,
    #[serde(default)]
    pub has_fixed_texture: bool,
    #[serde(default)]
    pub is_decal: bool,
    #[serde(default)]
    pub color: Option<Color>,
    pub bounds: Aabb,
}

impl RenderablePart {
    pub fn new(name: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            has_fixed_texture: false,
            is_decal: false,
            color: None,
            bounds,
        }
    }

    pub fn with_fixed_texture(mut self) -> Self {
        self.has_fixed_texture = true;
        self
    }

    /// Parts with branding (fixed textures, decals) keep their look.
    #[inline]
    pub fn is_recolorable(&self) -> bool {
        !self.has_fixed_texture && !self.is_decal
    }
}

/// Description of the loaded model, one entry per mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGraph {
    parts: Vec<RenderablePart>,
}

impl SceneGraph {
    pub fn new(parts: Vec<RenderablePart>) -> Self {
        Self { parts }
    }

    /// Parses the JSON part list the browser surface resolves a load with.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Vec<RenderablePart>>(text).map(Self::new)
    }

    pub fn parts(&self) -> &[RenderablePart] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut [RenderablePart] {
        &mut self.parts
    }

    pub fn find(&self, name: &str) -> Option<&RenderablePart> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub fn decal_count(&self) -> usize {
        self.parts.iter().filter(|p| p.is_decal).count()
    }

    pub(crate) fn push(&mut self, part: RenderablePart) {
        self.parts.push(part);
    }
}
