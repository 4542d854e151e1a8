//! Flat triangle-list mesh data and its loading lifecycle

use futures::channel::oneshot;

use crate::error::MeshError;

pub const FLOATS_PER_VERTEX: usize = 3;
pub const FLOATS_PER_TRIANGLE: usize = 9;
pub const FLOATS_PER_TEX_COORD: usize = 2;

/// Non-indexed triangle list: every 9 position floats form one triangle.
///
/// Construction validates the buffer contract, so a `MeshData` that exists
/// is always drawable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    positions: Vec<f32>,
    normals: Vec<f32>,
    tex_coords: Option<Vec<f32>>,
}

impl MeshData {
    pub fn new(
        positions: Vec<f32>,
        normals: Vec<f32>,
        tex_coords: Option<Vec<f32>>,
    ) -> Result<Self, MeshError> {
        if positions.len() % FLOATS_PER_TRIANGLE != 0 {
            return Err(MeshError::LayoutMismatch(format!(
                "{} position floats is not a whole number of triangles",
                positions.len()
            )));
        }
        if normals.len() != positions.len() {
            return Err(MeshError::LayoutMismatch(format!(
                "{} normal floats for {} position floats",
                normals.len(),
                positions.len()
            )));
        }
        if let Some(tex_coords) = &tex_coords {
            let expected = positions.len() / FLOATS_PER_VERTEX * FLOATS_PER_TEX_COORD;
            if tex_coords.len() != expected {
                return Err(MeshError::LayoutMismatch(format!(
                    "{} texture coordinate floats, expected {}",
                    tex_coords.len(),
                    expected
                )));
            }
        }

        Ok(Self {
            positions,
            normals,
            tex_coords,
        })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn tex_coords(&self) -> Option<&[f32]> {
        self.tex_coords.as_deref()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / FLOATS_PER_VERTEX
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / FLOATS_PER_TRIANGLE
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Where an object's geometry is in its lifecycle. Only `Ready` meshes are
/// drawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MeshState {
    #[default]
    NotLoaded,
    Loading,
    Ready(MeshData),
    Failed(MeshError),
}

impl MeshState {
    pub fn ready(&self) -> Option<&MeshData> {
        match self {
            MeshState::Ready(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, MeshState::Loading)
    }
}

pub type MeshLoadResult = Result<MeshData, MeshError>;

/// Completion side of an asynchronous mesh load.
///
/// Handed to whatever parses the mesh file; it may be moved to another
/// thread. Dropping it without completing marks the load as cancelled.
#[derive(Debug)]
pub struct MeshLoadSender {
    sender: oneshot::Sender<MeshLoadResult>,
}

impl MeshLoadSender {
    /// Delivers the load outcome. Returns `false` if the scene no longer
    /// waits for this load (it was cleared in the meantime).
    pub fn complete(self, result: MeshLoadResult) -> bool {
        self.sender.send(result).is_ok()
    }

    /// Validates raw buffers and delivers them.
    pub fn finish(
        self,
        positions: Vec<f32>,
        normals: Vec<f32>,
        tex_coords: Option<Vec<f32>>,
    ) -> bool {
        self.complete(MeshData::new(positions, normals, tex_coords))
    }

    pub fn fail(self, reason: impl Into<String>) -> bool {
        self.complete(Err(MeshError::LoadFailed(reason.into())))
    }
}

/// Receiving side, polled by the scene once per tick.
#[derive(Debug)]
pub(crate) struct PendingMesh {
    receiver: oneshot::Receiver<MeshLoadResult>,
}

impl PendingMesh {
    /// `None` while the load is still in flight.
    pub(crate) fn poll(&mut self) -> Option<MeshLoadResult> {
        match self.receiver.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(MeshError::Cancelled)),
        }
    }
}

pub(crate) fn mesh_channel() -> (MeshLoadSender, PendingMesh) {
    let (sender, receiver) = oneshot::channel();
    (MeshLoadSender { sender }, PendingMesh { receiver })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<f32> {
        vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
    }

    #[test]
    fn test_valid_triangle_list() {
        let mesh = MeshData::new(triangle(), triangle(), Some(vec![0.0; 6])).unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.tex_coords().map(<[f32]>::len), Some(6));
    }

    #[test]
    fn test_empty_mesh_is_valid() {
        let mesh = MeshData::new(Vec::new(), Vec::new(), None).unwrap();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_layout_violations_are_rejected() {
        // Six floats are two vertices, not a triangle.
        assert!(matches!(
            MeshData::new(vec![0.0; 6], vec![0.0; 6], None),
            Err(MeshError::LayoutMismatch(_))
        ));
        assert!(matches!(
            MeshData::new(triangle(), vec![0.0; 3], None),
            Err(MeshError::LayoutMismatch(_))
        ));
        assert!(matches!(
            MeshData::new(triangle(), triangle(), Some(vec![0.0; 4])),
            Err(MeshError::LayoutMismatch(_))
        ));
    }

    #[test]
    fn test_pending_load_lifecycle() {
        let (sender, mut pending) = mesh_channel();
        assert_eq!(pending.poll(), None);
        assert!(sender.finish(triangle(), triangle(), None));
        assert!(matches!(pending.poll(), Some(Ok(mesh)) if mesh.triangle_count() == 1));
    }

    #[test]
    fn test_dropped_sender_cancels() {
        let (sender, mut pending) = mesh_channel();
        drop(sender);
        assert_eq!(pending.poll(), Some(Err(MeshError::Cancelled)));
    }

    #[test]
    fn test_completion_after_receiver_dropped() {
        let (sender, pending) = mesh_channel();
        drop(pending);
        assert!(!sender.fail("parser gave up"));
    }
}
