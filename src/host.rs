use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Instant;

use glam::Vec3;

use crate::camera::{CameraSettings, PerspectiveCamera};
use crate::core::{OutputSurface, SurfaceId, Viewport};
use crate::error::{HarnessError, HarnessResult};
use crate::math::Color;
use crate::scene::{DisposeReport, NodeId, ObjectMut, ResourceLedger, Scene};
use crate::traits::{AnimationContract, Mount, Renderer, RendererFactory, UserDefinition};

pub const AMBIENT_INTENSITY: f32 = 0.5;
pub const POINT_LIGHT_INTENSITY: f32 = 1.0;
pub const POINT_LIGHT_POSITION: Vec3 = Vec3::new(5.0, 5.0, 5.0);

/// Sequence number of a scene generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenerationId(pub u64);

/// Scene, camera, renderer and animated object of one initialization
///
/// Only [`SceneHost::dispose_generation`] releases a generation, and it
/// consumes it, so a generation cannot be disposed twice.
pub struct SceneGeneration {
    id: GenerationId,
    definition_version: u64,
    scene: Scene,
    camera: PerspectiveCamera,
    renderer: Box<dyn Renderer>,
    object: NodeId,
}

impl SceneGeneration {
    pub fn id(&self) -> GenerationId {
        self.id
    }

    /// Version of the definition this generation was created from
    pub fn definition_version(&self) -> u64 {
        self.definition_version
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// The node returned from `init`
    pub fn object(&self) -> NodeId {
        self.object
    }

    pub fn surface(&self) -> Rc<OutputSurface> {
        self.renderer.surface()
    }

    /// Run `update` for this frame, then draw
    pub(crate) fn advance(
        &mut self,
        contract: &mut dyn AnimationContract,
        elapsed: f32,
        now: Instant,
    ) -> HarnessResult<()> {
        let object = ObjectMut::new(&mut self.scene, self.object)
            .ok_or_else(|| HarnessError::contract("animated object is no longer part of the scene"))?;

        match catch_unwind(AssertUnwindSafe(|| contract.update(object, elapsed))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(HarnessError::contract(format!("update failed: {e:#}"))),
            Err(payload) => {
                return Err(HarnessError::contract(format!(
                    "update panicked: {}",
                    panic_message(payload.as_ref())
                )))
            }
        }

        self.renderer.render(&self.scene, &self.camera, now);
        Ok(())
    }
}

impl std::fmt::Debug for SceneGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGeneration")
            .field("id", &self.id)
            .field("definition_version", &self.definition_version)
            .field("nodes", &self.scene.node_count())
            .field("surface", &self.renderer.surface().id())
            .finish()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Scene Host - allocates and releases scene generations
pub struct SceneHost {
    factory: Box<dyn RendererFactory>,
    ledger: ResourceLedger,
    camera: CameraSettings,
    next_generation: u64,
    next_surface: u64,
    created: u64,
    disposed: u64,
}

impl SceneHost {
    pub fn new(factory: Box<dyn RendererFactory>, camera: CameraSettings) -> Self {
        Self {
            factory,
            ledger: ResourceLedger::new(),
            camera,
            next_generation: 0,
            next_surface: 0,
            created: 0,
            disposed: 0,
        }
    }

    /// Allocation counters shared by every generation of this host
    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn disposed(&self) -> u64 {
        self.disposed
    }

    /// Build a generation for `definition` inside `mount`
    ///
    /// Scene, lights and camera come first, then `init`, then the renderer.
    /// A contract violation in `init` rolls back every node it created, so
    /// either a complete generation is returned or nothing stays allocated.
    pub fn create_generation(
        &mut self,
        mount: &mut dyn Mount,
        definition: &mut UserDefinition,
        background: Color,
    ) -> HarnessResult<SceneGeneration> {
        let viewport = mount.viewport();
        let mut scene = Scene::new(self.ledger.clone());
        scene.set_background(background);
        add_default_lights(&mut scene);
        let camera = PerspectiveCamera::new(self.camera, viewport.aspect());

        let version = definition.version();
        let object = match run_init(definition.contract_mut(), &mut scene) {
            Ok(object) => object,
            Err(e) => {
                let report = scene.dispose_resources();
                log::warn!(
                    "definition v{} rejected: {} (rolled back {} meshes)",
                    version,
                    e,
                    report.meshes + report.orphans
                );
                return Err(e);
            }
        };

        if !scene.is_attached(object) {
            log::warn!("object returned from init is not attached to the scene");
        }

        self.next_surface += 1;
        let surface = SurfaceId(self.next_surface);
        let renderer = self.factory.create(viewport, surface, &self.ledger);
        mount.attach(surface);

        self.next_generation += 1;
        self.created += 1;
        let id = GenerationId(self.next_generation);
        log::info!(
            "generation {} created for '{}' v{} ({}x{})",
            id.0,
            definition.name(),
            version,
            viewport.width,
            viewport.height
        );

        Ok(SceneGeneration {
            id,
            definition_version: version,
            scene,
            camera,
            renderer,
            object,
        })
    }

    /// Release every mesh resource, the renderer and its surface
    ///
    /// The frame loop of the generation must already be cancelled.
    pub fn dispose_generation(&mut self, generation: SceneGeneration, mount: &mut dyn Mount) -> DisposeReport {
        let SceneGeneration {
            id,
            mut scene,
            mut renderer,
            ..
        } = generation;

        let report = scene.dispose_resources();
        let surface = renderer.surface().id();
        renderer.dispose();
        mount.detach(surface);

        self.disposed += 1;
        log::info!(
            "generation {} disposed ({} meshes, {} unattached)",
            id.0,
            report.meshes,
            report.orphans
        );
        report
    }

    /// Follow a viewport change without re-creating the generation
    pub fn resize(&self, generation: &mut SceneGeneration, viewport: Viewport) {
        generation.camera.set_aspect(viewport.aspect());
        generation.renderer.set_viewport(viewport);
        log::debug!(
            "generation {} resized to {}x{} @{}",
            generation.id.0,
            viewport.width,
            viewport.height,
            viewport.pixel_ratio
        );
    }
}

fn add_default_lights(scene: &mut Scene) {
    let ambient = scene.create_ambient_light(Color::WHITE, AMBIENT_INTENSITY);
    scene.add(ambient);

    let point = scene.create_point_light(Color::WHITE, POINT_LIGHT_INTENSITY);
    if let Some(node) = scene.node_mut(point) {
        node.transform.position = POINT_LIGHT_POSITION;
    }
    scene.add(point);
}

fn run_init(contract: &mut dyn AnimationContract, scene: &mut Scene) -> HarnessResult<NodeId> {
    let returned = catch_unwind(AssertUnwindSafe(|| contract.init(scene))).map_err(|payload| {
        HarnessError::contract(format!("init panicked: {}", panic_message(payload.as_ref())))
    })?;

    match returned {
        Some(id) if scene.contains(id) => Ok(id),
        Some(_) => Err(HarnessError::contract("init returned a node that is not part of the scene")),
        None => Err(HarnessError::contract("init returned no object")),
    }
}
