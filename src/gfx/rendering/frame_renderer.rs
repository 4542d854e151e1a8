//! Per-frame upload and draw protocol
//!
//! One frame is:
//!
//! 1. clear to the background color
//! 2. camera position and every light slot
//! 3. view and projection matrices
//! 4. for every drawable (scene objects in order, then light gizmos by
//!    slot): model, normal and material uniforms, texture flags, transient
//!    attribute buffers, then the filled pass and/or the edge pass
//!
//! Objects that are hidden, still loading, failed or empty are skipped
//! before anything is uploaded for them.

use super::{
    context::RendererContext,
    device::{BufferHandle, DrawMode, RenderDevice, UniformValue},
    uniforms::{self, LightField},
};
use crate::{
    config::RenderParameters,
    error::RenderResult,
    gfx::{
        color::Color,
        material::Material,
        scene::{SceneObject, SceneState, Shading},
    },
};

/// `(factor, units)` set before each pass. Offset only ever applies to
/// filled polygons, so the edge value has no effect on triangles.
pub const FILL_POLYGON_OFFSET: (f32, f32) = (0.0, 0.0);
pub const EDGE_POLYGON_OFFSET: (f32, f32) = (1.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub objects_drawn: usize,
    pub draw_calls: usize,
    pub vertices_submitted: usize,
}

#[derive(Debug, Default)]
pub struct FrameRenderer {
    frames_rendered: u64,
    last_stats: FrameStats,
}

impl FrameRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    pub fn render_frame<D: RenderDevice>(
        &mut self,
        context: &mut RendererContext<D>,
        scene: &SceneState,
        params: &RenderParameters,
    ) -> RenderResult<FrameStats> {
        let device = context.device_mut();
        device.begin_frame(params.background_color)?;

        upload_frame_uniforms(device, scene);

        let mut stats = FrameStats::default();
        for object in scene.drawables() {
            draw_object(device, object, params, &mut stats);
        }

        device.end_frame()?;

        self.frames_rendered += 1;
        self.last_stats = stats;
        log::trace!("frame {}: {:?}", self.frames_rendered, stats);
        Ok(stats)
    }
}

fn upload_frame_uniforms<D: RenderDevice>(device: &mut D, scene: &SceneState) {
    device.set_uniform(uniforms::CAMERA_POSITION, scene.camera.position().into());

    for (slot, light) in scene.lights.parameters().into_iter().enumerate() {
        let values = [
            (LightField::Diffuse, UniformValue::Vec3(light.diffuse)),
            (LightField::Ambient, UniformValue::Vec3(light.ambient)),
            (LightField::Specular, UniformValue::Vec3(light.specular)),
            (LightField::Position, UniformValue::Vec4(light.position)),
        ];
        for (field, value) in values {
            device.set_uniform(&uniforms::light_uniform(slot, field), value);
        }
    }

    let (width, height) = device.viewport();
    device.set_uniform(uniforms::VIEW_MATRIX, scene.camera.view_matrix().into());
    device.set_uniform(
        uniforms::PROJECTION_MATRIX,
        scene.camera.projection_matrix(width, height).into(),
    );
}

fn draw_object<D: RenderDevice>(
    device: &mut D,
    object: &SceneObject,
    params: &RenderParameters,
    stats: &mut FrameStats,
) {
    let Some(mesh) = object.drawable_mesh() else {
        return;
    };

    device.set_uniform(uniforms::MODEL_MATRIX, object.transform.model_matrix().into());
    device.set_uniform(uniforms::NORMAL_MATRIX, object.transform.normal_matrix().into());
    upload_material(device, &Material::for_object(object.color, params.material_shininess));

    device.set_uniform(uniforms::USE_TEXTURE, object.texture.is_some().into());
    if let Some(texture) = object.texture {
        device.set_uniform(uniforms::TEXTURE, UniformValue::Int(texture.unit as i32));
        device.set_uniform(uniforms::TEXTURE_SCALE, texture.scale.into());
    }

    let mut buffers: Vec<BufferHandle> = vec![
        device.create_buffer(uniforms::VERTEX_POSITION, 3, mesh.positions()),
        device.create_buffer(uniforms::VERTEX_NORMAL, 3, mesh.normals()),
    ];
    if let Some(tex_coords) = mesh.tex_coords() {
        buffers.push(device.create_buffer(uniforms::TEXTURE_POSITION, 2, tex_coords));
    }

    let count = mesh.vertex_count() as u32;
    if params.draw_polygons {
        let lit = params.draw_light && object.shading == Shading::Lit;
        device.set_uniform(uniforms::USE_LIGHTING, lit.into());
        device.set_polygon_offset(FILL_POLYGON_OFFSET.0, FILL_POLYGON_OFFSET.1);
        device.draw_arrays(DrawMode::Triangles, 0, count);
        stats.draw_calls += 1;
        stats.vertices_submitted += count as usize;
    }

    if params.draw_edges {
        set_edge_state(device, params.edge_color);
        device.set_polygon_offset(EDGE_POLYGON_OFFSET.0, EDGE_POLYGON_OFFSET.1);
        device.draw_arrays(DrawMode::LineLoop, 0, count);
        stats.draw_calls += 1;
        stats.vertices_submitted += count as usize;
    }

    for buffer in buffers {
        device.delete_buffer(buffer);
    }
    stats.objects_drawn += 1;
}

fn upload_material<D: RenderDevice>(device: &mut D, material: &Material) {
    device.set_uniform(uniforms::MATERIAL_DIFFUSE, material.diffuse.into());
    device.set_uniform(uniforms::MATERIAL_AMBIENT, material.ambient.into());
    device.set_uniform(uniforms::MATERIAL_SPECULAR, material.specular.into());
    device.set_uniform(uniforms::MATERIAL_SHININESS, material.shininess.into());
}

// Edges are flat-colored and untextured whatever the object's settings.
fn set_edge_state<D: RenderDevice>(device: &mut D, edge_color: Color) {
    device.set_uniform(uniforms::MATERIAL_DIFFUSE, edge_color.into());
    device.set_uniform(uniforms::USE_LIGHTING, false.into());
    device.set_uniform(uniforms::USE_TEXTURE, false.into());
}
