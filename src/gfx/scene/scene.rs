use cgmath::Vector3;
use rand::Rng;

use super::{
    mesh::{mesh_channel, MeshLoadSender, MeshState, PendingMesh},
    object::{ObjectId, SceneObject},
};
use crate::{
    error::MeshError,
    gfx::{
        camera::Camera,
        color::Color,
        geometry::PrimitiveKind,
        lighting::{Light, LightSlots, DIRECTIONAL_LIGHT_SLOT, POINT_LIGHT_SLOT},
    },
};

/// Everything one frame needs: the ordered object list, the camera and the
/// light slots.
///
/// Insertion order is draw order. Objects are only ever removed all at once
/// through [`SceneState::clear`].
#[derive(Debug)]
pub struct SceneState {
    pub camera: Camera,
    pub lights: LightSlots,
    objects: Vec<(ObjectId, SceneObject)>,
    pending: Vec<(ObjectId, PendingMesh)>,
    next_id: usize,
}

impl SceneState {
    pub fn new(camera: Camera, light_capacity: usize) -> Self {
        Self {
            camera,
            lights: LightSlots::new(light_capacity),
            objects: Vec::new(),
            pending: Vec::new(),
            next_id: 0,
        }
    }

    /// Point light in slot 0 at (5, 5, 5) and a directional light in slot 1
    /// shining from (1, 1, 1). Slots beyond capacity are skipped.
    pub fn with_default_lights(mut self) -> Self {
        let dim = Color::rgb(0.1, 0.1, 0.1);
        let defaults = [
            (POINT_LIGHT_SLOT, Light::point(Vector3::new(5.0, 5.0, 5.0))),
            (DIRECTIONAL_LIGHT_SLOT, Light::directional(Vector3::new(1.0, 1.0, 1.0))),
        ];
        for (slot, light) in defaults {
            let light = light.with_colors(dim, Color::WHITE, Color::WHITE);
            if let Err(e) = self.lights.set(slot, light) {
                log::debug!("default light skipped: {}", e);
            }
        }
        self
    }

    pub fn add_object(&mut self, object: SceneObject) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        log::info!("added object {} '{}'", id, object.name);
        self.objects.push((id, object));
        id
    }

    /// Adds a procedural cube or sphere with a random opaque color.
    pub fn create_object(&mut self, kind: PrimitiveKind) -> ObjectId {
        let mut rng = rand::rng();
        let color = Color::rgb(rng.random(), rng.random(), rng.random());
        let name = self.ensure_unique_name(kind.name());
        self.add_object(SceneObject::new(name).with_color(color).with_mesh(kind.mesh()))
    }

    /// Adds an object whose mesh arrives later through the returned sender.
    /// The object is skipped by the renderer until [`SceneState::poll_loads`]
    /// sees the completed load.
    pub fn begin_load(&mut self, name: &str) -> (ObjectId, MeshLoadSender) {
        let name = self.ensure_unique_name(name);
        let mut object = SceneObject::new(name);
        object.mesh = MeshState::Loading;
        let id = self.add_object(object);

        let (sender, pending) = mesh_channel();
        self.pending.push((id, pending));
        (id, sender)
    }

    /// Moves finished loads into their objects, returning how many finished.
    pub fn poll_loads(&mut self) -> usize {
        let mut finished = Vec::new();
        self.pending.retain_mut(|(id, pending)| match pending.poll() {
            Some(result) => {
                finished.push((*id, result));
                false
            }
            None => true,
        });

        let count = finished.len();
        for (id, result) in finished {
            let Some(object) = self.object_mut(id) else {
                continue;
            };
            object.mesh = match result {
                Ok(mesh) => {
                    log::info!(
                        "mesh for '{}' ready: {} triangles",
                        object.name,
                        mesh.triangle_count()
                    );
                    MeshState::Ready(mesh)
                }
                Err(e @ MeshError::Cancelled) => {
                    log::warn!("mesh load for '{}' abandoned", object.name);
                    MeshState::Failed(e)
                }
                Err(e) => {
                    log::warn!("mesh load for '{}' failed: {}", object.name, e);
                    MeshState::Failed(e)
                }
            };
        }
        count
    }

    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }

    /// Drops every object and every outstanding load. Camera and lights stay.
    pub fn clear(&mut self) {
        log::info!(
            "clearing scene: {} objects, {} pending loads",
            self.objects.len(),
            self.pending.len()
        );
        self.objects.clear();
        self.pending.clear();
    }

    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter().map(|(id, object)| (*id, object))
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, object)| object)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects
            .iter_mut()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, object)| object)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Everything the renderer visits, in draw order: scene objects first,
    /// then light gizmos by slot.
    pub fn drawables(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects
            .iter()
            .map(|(_, object)| object)
            .chain(self.lights.iter().map(|(_, light)| &light.object))
    }

    pub fn ensure_unique_name(&self, desired_name: &str) -> String {
        let mut counter = 0;
        let mut name = desired_name.to_string();
        while self.objects.iter().any(|(_, object)| object.name == name) {
            counter += 1;
            name = format!("{} ({})", desired_name, counter);
        }
        name
    }

    pub fn statistics(&self) -> SceneStatistics {
        let ready = self.objects.iter().filter_map(|(_, object)| object.mesh.ready());
        let (total_vertices, total_triangles) = ready.fold((0, 0), |(v, t), mesh| {
            (v + mesh.vertex_count(), t + mesh.triangle_count())
        });
        SceneStatistics {
            object_count: self.objects.len(),
            pending_loads: self.pending.len(),
            total_vertices,
            total_triangles,
        }
    }
}

impl Default for SceneState {
    fn default() -> Self {
        SceneState::new(Camera::default(), crate::gfx::lighting::DEFAULT_LIGHT_CAPACITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub pending_loads: usize,
    pub total_vertices: usize,
    pub total_triangles: usize,
}
