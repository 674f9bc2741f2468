use crate::scene::{NodeId, ObjectMut, Scene};

/// Animation contract every user definition satisfies
///
/// `init` runs once per scene generation and must attach what it creates to
/// the scene itself; the harness attaches nothing implicitly. It returns the
/// node to animate, or `None` to signal a contract violation.
///
/// `update` runs once per rendered frame with that node and the seconds since
/// the generation started. It is optional: the default does nothing and the
/// harness keeps drawing static frames. An `Err` (or a panic) stops the
/// generation's frame loop and is reported on the error channel.
pub trait AnimationContract {
    fn init(&mut self, scene: &mut Scene) -> Option<NodeId>;

    fn update(&mut self, _object: ObjectMut<'_>, _elapsed: f32) -> anyhow::Result<()> {
        Ok(())
    }

    /// Name for logs
    fn name(&self) -> &str {
        "definition"
    }
}

/// A contract instance tagged with the version of the source it came from
///
/// The reconciler compares versions, never instances: a new version means a
/// full teardown and re-creation even if the code did not change in meaning.
pub struct UserDefinition {
    version: u64,
    contract: Box<dyn AnimationContract>,
}

impl UserDefinition {
    pub fn new(version: u64, contract: Box<dyn AnimationContract>) -> Self {
        Self { version, contract }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn name(&self) -> &str {
        self.contract.name()
    }

    pub fn contract_mut(&mut self) -> &mut dyn AnimationContract {
        self.contract.as_mut()
    }
}

impl std::fmt::Debug for UserDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDefinition")
            .field("version", &self.version)
            .field("name", &self.contract.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{MaterialDesc, ResourceLedger, Shape};

    struct StaticCube;

    impl AnimationContract for StaticCube {
        fn init(&mut self, scene: &mut Scene) -> Option<NodeId> {
            let geometry = scene.create_geometry(Shape::cube(1.0));
            let material = scene.create_material(MaterialDesc::normal());
            let id = scene.create_mesh(geometry, material);
            scene.add(id);
            Some(id)
        }
    }

    #[test]
    fn test_update_is_optional() {
        let mut scene = Scene::new(ResourceLedger::new());
        let mut cube = StaticCube;
        let id = cube.init(&mut scene).unwrap();

        let object = ObjectMut::new(&mut scene, id).unwrap();
        assert!(cube.update(object, 1.0).is_ok());
        assert_eq!(cube.name(), "definition");
    }

    #[test]
    fn test_definition_debug_shows_version() {
        let def = UserDefinition::new(3, Box::new(StaticCube));
        let debug = format!("{:?}", def);
        assert!(debug.contains("version: 3"));
        assert_eq!(def.version(), 3);
    }
}
