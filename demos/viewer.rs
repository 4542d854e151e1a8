//! Interactive viewer with a cube, a textured sphere, a mesh delivered by a
//! background loader, and both default lights.
//!
//! Controls: W/S forward and back, A/D strafe, E/Q up and down, drag with the
//! left mouse button to look around, Escape to quit.
//!
//! Run with `RUST_LOG=debug` to see per-second frame statistics.

use std::{thread, time::Duration};

use cgmath::Vector3;
use vantage::prelude::*;

fn checkerboard(size: u32, cell: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let value = if (x / cell + y / cell) % 2 == 0 { 230 } else { 40 };
            pixels.extend_from_slice(&[value, value, value, 255]);
        }
    }
    pixels
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let render = RenderParameters::default()
        .with_edges(true)
        .with_edge_hex("#303030")?;
    let config = ViewerConfig::default()
        .with_title("Vantage Viewer")
        .with_render(render);
    let mut app = ViewerApp::new(config)?;

    let scene = app.scene_mut();
    let cube = scene.create_object(PrimitiveKind::Cube);
    let sphere = scene.create_object(PrimitiveKind::Sphere);
    if let Some(object) = scene.object_mut(sphere) {
        object.transform.position = Vector3::new(0.0, 0.0, 2.5);
        object.texture = Some(TextureBinding::new(0).with_scale(2.0));
    }

    // Stands in for a file parser finishing on its own thread.
    let (loaded, sender) = scene.begin_load("loaded.obj");
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(500));
        let mesh = PrimitiveKind::Sphere.mesh();
        let delivered = sender.finish(
            mesh.positions().to_vec(),
            mesh.normals().to_vec(),
            mesh.tex_coords().map(<[f32]>::to_vec),
        );
        if !delivered {
            log::warn!("scene was cleared before the mesh arrived");
        }
    });

    app.add_texture(0, 64, 64, checkerboard(64, 8));

    let updates = app.parameter_sender();
    updates.send(ParameterUpdate::Object(
        cube,
        ObjectChange::ColorHex("#3080ff".to_string()),
    ))?;
    updates.send(ParameterUpdate::Object(
        cube,
        ObjectChange::RotationDegrees(Axis::Y, 30.0),
    ))?;
    updates.send(ParameterUpdate::Object(
        loaded,
        ObjectChange::Position(Axis::Z, -2.5),
    ))?;
    updates.send(ParameterUpdate::Object(
        loaded,
        ObjectChange::Scale(Axis::Y, 1.5),
    ))?;
    updates.send(ParameterUpdate::Camera(CameraChange::FovDegrees(60.0)))?;
    updates.send(ParameterUpdate::Render(RenderChange::BackgroundHex(
        "#101820".to_string(),
    )))?;

    app.run()
}
