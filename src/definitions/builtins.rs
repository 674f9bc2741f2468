use crate::math::Color;
use crate::scene::{MaterialDesc, NodeId, ObjectMut, Scene, Shape};
use crate::traits::AnimationContract;

pub const WIREFRAME_BLOB: &str = "wireframe-blob";
pub const ROTATING_CUBE: &str = "rotating-cube";
pub const BOBBING_SPHERE: &str = "bobbing-sphere";

pub const BUILTIN_NAMES: [&str; 3] = [WIREFRAME_BLOB, ROTATING_CUBE, BOBBING_SPHERE];

/// Look up a built-in definition by name
pub fn builtin(name: &str) -> Option<Box<dyn AnimationContract>> {
    match name.trim() {
        WIREFRAME_BLOB => Some(Box::new(WireframeBlob)),
        ROTATING_CUBE => Some(Box::new(RotatingCube::default())),
        BOBBING_SPHERE => Some(Box::new(BobbingSphere::default())),
        _ => None,
    }
}

fn add_mesh(scene: &mut Scene, shape: Shape, material: MaterialDesc) -> NodeId {
    let geometry = scene.create_geometry(shape);
    let material = scene.create_material(material);
    let mesh = scene.create_mesh(geometry, material);
    scene.add(mesh);
    mesh
}

/// Starting point handed to every participant: a static wireframe icosahedron
#[derive(Debug, Default, Clone, Copy)]
pub struct WireframeBlob;

impl AnimationContract for WireframeBlob {
    fn init(&mut self, scene: &mut Scene) -> Option<NodeId> {
        Some(add_mesh(
            scene,
            Shape::Icosahedron {
                radius: 1.5,
                detail: 0,
            },
            MaterialDesc::normal().with_wireframe(true),
        ))
    }

    fn name(&self) -> &str {
        WIREFRAME_BLOB
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RotatingCube {
    pub size: f32,
    /// Radians per second around y; x turns at half the rate
    pub speed: f32,
    pub color: Color,
}

impl Default for RotatingCube {
    fn default() -> Self {
        Self {
            size: 1.5,
            speed: 1.0,
            color: Color::from_hex(0x44aa88),
        }
    }
}

impl AnimationContract for RotatingCube {
    fn init(&mut self, scene: &mut Scene) -> Option<NodeId> {
        Some(add_mesh(scene, Shape::cube(self.size), MaterialDesc::lambert(self.color)))
    }

    fn update(&mut self, mut object: ObjectMut<'_>, elapsed: f32) -> anyhow::Result<()> {
        let rotation = &mut object.transform_mut().rotation;
        rotation.x = elapsed * self.speed * 0.5;
        rotation.y = elapsed * self.speed;
        Ok(())
    }

    fn name(&self) -> &str {
        ROTATING_CUBE
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BobbingSphere {
    pub radius: f32,
    pub height: f32,
    /// Bobs per second
    pub frequency: f32,
    pub color: Color,
}

impl Default for BobbingSphere {
    fn default() -> Self {
        Self {
            radius: 1.0,
            height: 1.0,
            frequency: 0.5,
            color: Color::from_hex(0xff6699),
        }
    }
}

impl AnimationContract for BobbingSphere {
    fn init(&mut self, scene: &mut Scene) -> Option<NodeId> {
        Some(add_mesh(scene, Shape::sphere(self.radius), MaterialDesc::lambert(self.color)))
    }

    fn update(&mut self, mut object: ObjectMut<'_>, elapsed: f32) -> anyhow::Result<()> {
        let phase = elapsed * self.frequency * std::f32::consts::TAU;
        object.transform_mut().position.y = phase.sin() * self.height;
        Ok(())
    }

    fn name(&self) -> &str {
        BOBBING_SPHERE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ResourceLedger, Shading};

    #[test]
    fn test_every_name_resolves() {
        for name in BUILTIN_NAMES {
            let contract = builtin(name).unwrap();
            assert_eq!(contract.name(), name);
        }
        assert!(builtin("teapot").is_none());
    }

    #[test]
    fn test_wireframe_blob_shape() {
        let mut scene = Scene::new(ResourceLedger::new());
        let id = WireframeBlob.init(&mut scene).unwrap();
        let mesh = scene.node(id).unwrap().mesh().unwrap();

        assert_eq!(
            mesh.geometry.shape(),
            Shape::Icosahedron {
                radius: 1.5,
                detail: 0
            }
        );
        let desc = mesh.materials[0].desc();
        assert_eq!(desc.shading, Shading::Normal);
        assert!(desc.wireframe);
        assert!(scene.is_attached(id));
    }

    #[test]
    fn test_bobbing_sphere_moves_vertically() {
        let mut scene = Scene::new(ResourceLedger::new());
        let mut sphere = BobbingSphere::default();
        let id = sphere.init(&mut scene).unwrap();

        // quarter period of 0.5 Hz
        sphere.update(ObjectMut::new(&mut scene, id).unwrap(), 0.5).unwrap();
        let position = scene.node(id).unwrap().transform.position;
        assert!((position.y - 1.0).abs() < 1e-5);
        assert_eq!(position.x, 0.0);
    }
}
