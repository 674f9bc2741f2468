pub mod geometry;
pub mod graph;
pub mod material;
pub mod resources;

pub use geometry::{Geometry, MeshData, Shape};
pub use graph::{DisposeReport, Mesh, Node, NodeId, NodeKind, ObjectMut, Scene, Transform};
pub use material::{Material, MaterialDesc, Shading};
pub use resources::{ResourceKind, ResourceLedger};
