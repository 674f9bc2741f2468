use glam::{EulerRot, Mat4, Quat, Vec3};

use super::geometry::{Geometry, Shape};
use super::material::{Material, MaterialDesc};
use super::resources::ResourceLedger;
use crate::math::Color;

/// Index of a node inside its scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Local transform, rotation as XYZ euler angles in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Geometry,
    /// Every entry is disposed on teardown; the first one is used for drawing
    pub materials: Vec<Material>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Group,
    Mesh(Mesh),
    AmbientLight { color: Color, intensity: f32 },
    PointLight { color: Color, intensity: f32 },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub transform: Transform,
    pub kind: NodeKind,
    parent: Option<NodeId>,
    attached_to_root: bool,
    children: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            transform: Transform::default(),
            kind,
            parent: None,
            attached_to_root: false,
            children: Vec::new(),
        }
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

/// Counts of what a scene teardown released
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisposeReport {
    pub meshes: usize,
    pub orphans: usize,
}

/// Scene graph - node arena with an implicit root
///
/// Nodes are created detached; only nodes reachable from the root via
/// [`Scene::add`] / [`Scene::add_child`] are drawn.
#[derive(Debug)]
pub struct Scene {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    background: Color,
    ledger: ResourceLedger,
    geometries: Vec<Geometry>,
    materials: Vec<Material>,
}

impl Scene {
    pub fn new(ledger: ResourceLedger) -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            background: Color::BACKGROUND,
            ledger,
            geometries: Vec::new(),
            materials: Vec::new(),
        }
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    // === Resources ===

    /// The scene keeps a handle, so teardown releases it even if no mesh uses it
    pub fn create_geometry(&mut self, shape: Shape) -> Geometry {
        let geometry = Geometry::allocate(shape, &self.ledger);
        self.geometries.push(geometry.clone());
        geometry
    }

    pub fn create_material(&mut self, desc: MaterialDesc) -> Material {
        let material = Material::allocate(desc, &self.ledger);
        self.materials.push(material.clone());
        material
    }

    // === Nodes ===

    fn spawn(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_mesh(&mut self, geometry: Geometry, material: Material) -> NodeId {
        self.create_mesh_with_materials(geometry, vec![material])
    }

    pub fn create_mesh_with_materials(&mut self, geometry: Geometry, materials: Vec<Material>) -> NodeId {
        self.spawn(NodeKind::Mesh(Mesh { geometry, materials }))
    }

    pub fn create_group(&mut self) -> NodeId {
        self.spawn(NodeKind::Group)
    }

    pub fn create_ambient_light(&mut self, color: Color, intensity: f32) -> NodeId {
        self.spawn(NodeKind::AmbientLight { color, intensity })
    }

    pub fn create_point_light(&mut self, color: Color, intensity: f32) -> NodeId {
        self.spawn(NodeKind::PointLight { color, intensity })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Attach a node to the scene root, moving it from any previous parent
    pub fn add(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.detach(id);
        self.nodes[id.0].attached_to_root = true;
        self.roots.push(id);
        true
    }

    /// Attach `child` under `parent`; refuses cycles
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.contains(parent) || !self.contains(child) || self.is_ancestor(child, parent) {
            return false;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        true
    }

    /// Remove a node (and its subtree) from the drawn graph
    pub fn remove(&mut self, id: NodeId) {
        if self.contains(id) {
            self.detach(id);
        }
    }

    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
        if self.nodes[id.0].attached_to_root {
            self.nodes[id.0].attached_to_root = false;
            self.roots.retain(|r| *r != id);
        }
    }

    fn is_ancestor(&self, candidate: NodeId, of: NodeId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    /// True if the node is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(node_id.0) else {
                return false;
            };
            if node.attached_to_root {
                return true;
            }
            current = node.parent;
        }
        false
    }

    /// Depth-first walk over attached nodes with their world matrices
    pub fn traverse(&self, mut visit: impl FnMut(NodeId, &Node, Mat4)) {
        let mut stack: Vec<(NodeId, Mat4)> = self
            .roots
            .iter()
            .rev()
            .map(|id| (*id, Mat4::IDENTITY))
            .collect();

        while let Some((id, parent_world)) = stack.pop() {
            let node = &self.nodes[id.0];
            let world = parent_world * node.transform.matrix();
            visit(id, node, world);
            stack.extend(node.children.iter().rev().map(|c| (*c, world)));
        }
    }

    /// Dispose geometry and every material of every mesh
    ///
    /// Attached nodes are released through a full traversal, then nodes that
    /// were created but never attached are swept. Last, every handle the scene
    /// ever handed out is released, covering resources no mesh holds anymore.
    pub fn dispose_resources(&mut self) -> DisposeReport {
        let mut report = DisposeReport::default();
        let mut visited = vec![false; self.nodes.len()];

        self.traverse(|id, node, _| {
            visited[id.0] = true;
            if let Some(mesh) = node.mesh() {
                release_mesh(mesh);
                report.meshes += 1;
            }
        });

        for (index, node) in self.nodes.iter().enumerate() {
            if visited[index] {
                continue;
            }
            if let Some(mesh) = node.mesh() {
                release_mesh(mesh);
                report.orphans += 1;
            }
        }

        for geometry in self.geometries.drain(..) {
            geometry.dispose();
        }
        for material in self.materials.drain(..) {
            material.dispose();
        }

        self.roots.clear();
        self.nodes.clear();
        report
    }
}

fn release_mesh(mesh: &Mesh) {
    mesh.geometry.dispose();
    for material in &mesh.materials {
        material.dispose();
    }
}

/// Mutable view of the object returned from `init`, handed to `update`
pub struct ObjectMut<'a> {
    scene: &'a mut Scene,
    id: NodeId,
}

impl<'a> ObjectMut<'a> {
    /// `None` when `id` does not belong to `scene`
    pub fn new(scene: &'a mut Scene, id: NodeId) -> Option<Self> {
        scene.contains(id).then_some(Self { scene, id })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &Node {
        &self.scene.nodes[self.id.0]
    }

    pub fn node_mut(&mut self) -> &mut Node {
        &mut self.scene.nodes[self.id.0]
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.node_mut().transform
    }

    pub fn materials(&self) -> &[Material] {
        self.node().mesh().map(|m| m.materials.as_slice()).unwrap_or(&[])
    }

    /// Whole scene, for definitions that animate children of a group
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.scene
    }
}
