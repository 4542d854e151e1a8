use cgmath::Vector3;

use crate::{
    error::ParameterError,
    gfx::{
        color::Color,
        geometry::PrimitiveKind,
        scene::{
            object::{SceneObject, Shading},
            transform::Transform,
        },
    },
};

/// Light slots understood by the default scene program.
pub const DEFAULT_LIGHT_CAPACITY: usize = 2;
pub const POINT_LIGHT_SLOT: usize = 0;
pub const DIRECTIONAL_LIGHT_SLOT: usize = 1;

const GIZMO_RADIUS: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    /// Emits from its position; uploaded with `w = 1`.
    Point,
    /// Position holds the direction toward the light; uploaded with `w = 0`.
    Directional,
}

/// A point or directional light.
///
/// The light's placement lives in `object.transform.position`; `object` also
/// carries the small unlit sphere used to visualise the light.
#[derive(Debug, Clone)]
pub struct Light {
    pub kind: LightKind,
    pub object: SceneObject,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
}

impl Light {
    pub fn point(position: Vector3<f32>) -> Self {
        Self::new(LightKind::Point, position, true)
    }

    /// `direction` points from the scene toward the light.
    pub fn directional(direction: Vector3<f32>) -> Self {
        Self::new(LightKind::Directional, direction, false)
    }

    fn new(kind: LightKind, position: Vector3<f32>, gizmo_visible: bool) -> Self {
        // Only the point-light marker is drawn without lighting.
        let (name, shading) = match kind {
            LightKind::Point => ("Point Light", Shading::Unlit),
            LightKind::Directional => ("Directional Light", Shading::Lit),
        };
        let object = SceneObject::new(name)
            .with_mesh(PrimitiveKind::Sphere.mesh())
            .with_transform(
                Transform::from_position(position)
                    .with_scale(Vector3::new(GIZMO_RADIUS, GIZMO_RADIUS, GIZMO_RADIUS)),
            )
            .with_shading(shading)
            .with_visible(gizmo_visible);

        Self {
            kind,
            object,
            ambient: Color::rgb(0.1, 0.1, 0.1),
            diffuse: Color::WHITE,
            specular: Color::WHITE,
        }
    }

    pub fn with_colors(mut self, ambient: Color, diffuse: Color, specular: Color) -> Self {
        self.ambient = ambient;
        self.diffuse = diffuse;
        self.specular = specular;
        self
    }

    pub fn position(&self) -> Vector3<f32> {
        self.object.transform.position
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.object.transform.position = position;
    }

    pub fn parameters(&self) -> LightParameters {
        let p = self.position();
        let w = match self.kind {
            LightKind::Point => 1.0,
            LightKind::Directional => 0.0,
        };
        LightParameters {
            ambient: self.ambient.to_rgb_array(),
            diffuse: self.diffuse.to_rgb_array(),
            specular: self.specular.to_rgb_array(),
            position: [p.x, p.y, p.z, w],
        }
    }
}

/// The per-light values the scene program reads from `u_lights[i]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParameters {
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub position: [f32; 4],
}

impl LightParameters {
    /// What an empty slot uploads: contributes nothing to the lighting sum.
    pub const OFF: LightParameters = LightParameters {
        ambient: [0.0; 3],
        diffuse: [0.0; 3],
        specular: [0.0; 3],
        position: [0.0, 0.0, 0.0, 1.0],
    };
}

/// Fixed-capacity, slot-indexed light table.
#[derive(Debug, Clone)]
pub struct LightSlots {
    slots: Vec<Option<Light>>,
}

impl LightSlots {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Installs `light` in `slot`, returning whatever was there before.
    pub fn set(&mut self, slot: usize, light: Light) -> Result<Option<Light>, ParameterError> {
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(ParameterError::UnknownLight(slot))?;
        Ok(entry.replace(light))
    }

    pub fn take(&mut self, slot: usize) -> Option<Light> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    pub fn get(&self, slot: usize) -> Option<&Light> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Light> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Occupied slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Light)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, light)| light.as_ref().map(|light| (slot, light)))
    }

    /// One entry per slot, empty slots switched off.
    pub fn parameters(&self) -> Vec<LightParameters> {
        self.slots
            .iter()
            .map(|light| light.as_ref().map_or(LightParameters::OFF, Light::parameters))
            .collect()
    }
}

impl Default for LightSlots {
    fn default() -> Self {
        Self::new(DEFAULT_LIGHT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_carries_kind_tag() {
        let point = Light::point(Vector3::new(1.0, 2.0, 3.0));
        let sun = Light::directional(Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(point.parameters().position, [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(sun.parameters().position, [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_gizmo_defaults() {
        let point = Light::point(Vector3::new(0.0, 0.0, 0.0));
        let sun = Light::directional(Vector3::new(0.0, 1.0, 0.0));
        assert!(point.object.visible);
        assert!(!sun.object.visible);
        assert_eq!(point.object.shading, Shading::Unlit);
        assert_eq!(sun.object.shading, Shading::Lit);
        assert!(point.object.mesh.ready().is_some_and(|mesh| mesh.vertex_count() > 0));
    }

    #[test]
    fn test_slots_are_bounded() {
        let mut slots = LightSlots::default();
        assert!(slots.set(POINT_LIGHT_SLOT, Light::point(Vector3::new(0.0, 0.0, 0.0))).is_ok());
        assert_eq!(
            slots.set(2, Light::point(Vector3::new(0.0, 0.0, 0.0))).unwrap_err(),
            ParameterError::UnknownLight(2)
        );

        let parameters = slots.parameters();
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[DIRECTIONAL_LIGHT_SLOT], LightParameters::OFF);
        assert_eq!(slots.iter().count(), 1);
    }
}
