pub mod light;
pub mod shading;

pub use light::{
    Light, LightKind, LightParameters, LightSlots, DEFAULT_LIGHT_CAPACITY,
    DIRECTIONAL_LIGHT_SLOT, POINT_LIGHT_SLOT,
};
pub use shading::{evaluate_lighting, shade, SurfacePoint};
