use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::DefinitionLoader;
use crate::error::{HarnessError, HarnessResult};
use crate::scene::{MaterialDesc, NodeId, ObjectMut, Scene, Shape, Transform};
use crate::traits::AnimationContract;

/// One animation term applied every frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Animation {
    /// Constant angular velocity, radians per second per axis
    Spin { speed: [f32; 3] },
    /// Sine offset of the position along `axis`
    Oscillate {
        axis: [f32; 3],
        amplitude: f32,
        frequency: f32,
    },
    /// Sine scaling around 1.0
    Pulse { amplitude: f32, frequency: f32 },
}

impl Animation {
    fn apply(&self, base: &Transform, transform: &mut Transform, elapsed: f32) {
        let wave = |frequency: f32| (elapsed * frequency * std::f32::consts::TAU).sin();
        match *self {
            Animation::Spin { speed } => {
                transform.rotation += Vec3::from(speed) * elapsed;
            }
            Animation::Oscillate {
                axis,
                amplitude,
                frequency,
            } => {
                transform.position += Vec3::from(axis).normalize_or_zero() * amplitude * wave(frequency);
            }
            Animation::Pulse {
                amplitude,
                frequency,
            } => {
                transform.scale = base.scale * (1.0 + amplitude * wave(frequency));
            }
        }
    }
}

/// Declarative definition: one mesh plus a list of animation terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default = "default_name")]
    pub name: String,
    pub shape: Shape,
    #[serde(default)]
    pub material: MaterialDesc,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default)]
    pub animations: Vec<Animation>,
}

fn default_name() -> String {
    "recipe".to_string()
}

impl Recipe {
    pub fn from_json(source: &str) -> HarnessResult<Self> {
        serde_json::from_str(source).map_err(|e| HarnessError::definition(format!("invalid recipe: {e}")))
    }
}

impl AnimationContract for Recipe {
    fn init(&mut self, scene: &mut Scene) -> Option<NodeId> {
        let geometry = scene.create_geometry(self.shape);
        let material = scene.create_material(self.material);
        let mesh = scene.create_mesh(geometry, material);
        if let Some(node) = scene.node_mut(mesh) {
            node.name = Some(self.name.clone());
            node.transform.position = Vec3::from(self.position);
        }
        scene.add(mesh);
        Some(mesh)
    }

    fn update(&mut self, mut object: ObjectMut<'_>, elapsed: f32) -> anyhow::Result<()> {
        if !elapsed.is_finite() {
            anyhow::bail!("non-finite elapsed time {elapsed}");
        }
        let base = Transform {
            position: Vec3::from(self.position),
            ..Transform::default()
        };
        let mut transform = base;
        for animation in &self.animations {
            animation.apply(&base, &mut transform, elapsed);
        }
        *object.transform_mut() = transform;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Loads [`Recipe`] JSON documents
#[derive(Debug, Default, Clone, Copy)]
pub struct RecipeLoader;

impl DefinitionLoader for RecipeLoader {
    fn load(&mut self, source: &str) -> HarnessResult<Box<dyn AnimationContract>> {
        Ok(Box::new(Recipe::from_json(source)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ResourceLedger, Shading};

    const SPINNER: &str = r#"{
        "name": "spinner",
        "shape": { "type": "box", "width": 1, "height": 2, "depth": 1 },
        "material": { "shading": "normal", "wireframe": true },
        "animations": [
            { "type": "spin", "speed": [0, 2, 0] },
            { "type": "pulse", "amplitude": 0.5, "frequency": 1 }
        ]
    }"#;

    #[test]
    fn test_parse_recipe() {
        let recipe = Recipe::from_json(SPINNER).unwrap();
        assert_eq!(recipe.name, "spinner");
        assert_eq!(recipe.material.shading, Shading::Normal);
        assert!(recipe.material.wireframe);
        assert_eq!(recipe.animations.len(), 2);
    }

    #[test]
    fn test_invalid_recipe_is_definition_error() {
        let err = RecipeLoader.load("{ \"shape\": 3 }").err().unwrap();
        assert!(matches!(err, HarnessError::Definition(_)));
    }

    #[test]
    fn test_animations_drive_transform() {
        let mut recipe = Recipe::from_json(SPINNER).unwrap();
        let mut scene = Scene::new(ResourceLedger::new());
        let id = recipe.init(&mut scene).unwrap();

        // quarter period: pulse at its peak
        recipe.update(ObjectMut::new(&mut scene, id).unwrap(), 0.25).unwrap();
        let transform = scene.node(id).unwrap().transform;
        assert!((transform.rotation.y - 0.5).abs() < 1e-5);
        assert!((transform.scale.x - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_oscillate_around_position() {
        let mut recipe = Recipe {
            name: "bob".into(),
            shape: Shape::sphere(1.0),
            material: MaterialDesc::default(),
            position: [1.0, 0.0, 0.0],
            animations: vec![Animation::Oscillate {
                axis: [0.0, 2.0, 0.0],
                amplitude: 0.5,
                frequency: 1.0,
            }],
        };
        let mut scene = Scene::new(ResourceLedger::new());
        let id = recipe.init(&mut scene).unwrap();

        recipe.update(ObjectMut::new(&mut scene, id).unwrap(), 0.25).unwrap();
        let position = scene.node(id).unwrap().transform.position;
        assert!((position - Vec3::new(1.0, 0.5, 0.0)).length() < 1e-5);
    }
}
