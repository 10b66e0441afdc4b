pub mod renderer;
pub mod sphere_geometry;

use thiserror::Error;

pub use renderer::WgpuSphereRenderer;
pub use sphere_geometry::{MeshOptions, SphereMesh, Vertex};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisualizationError {
    #[error("point {index} has {dim} coordinates, only 3-dimensional points can be displayed")]
    UnsupportedDimension { index: usize, dim: usize },
}
