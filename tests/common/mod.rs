//! Fixtures shared by the integration tests
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use aster_harness::camera::CameraSettings;
use aster_harness::capture::{CaptureSettings, CaptureSubsystem};
use aster_harness::core::{FrameQueue, SurfaceId, Viewport};
use aster_harness::math::Color;
use aster_harness::renderer::SoftwareRendererFactory;
use aster_harness::scene::{MaterialDesc, NodeId, ObjectMut, Scene, Shape};
use aster_harness::traits::{AnimationContract, Mount, Navigator, Notifier};
use aster_harness::{Harness, SceneHost};

pub const FRAME: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Small fixed-size mount
#[derive(Debug, Default)]
pub struct TestMount {
    pub attached: Vec<SurfaceId>,
}

impl Mount for TestMount {
    fn viewport(&self) -> Viewport {
        Viewport::new(16, 12, 1.0)
    }

    fn attach(&mut self, surface: SurfaceId) {
        self.attached.push(surface);
    }

    fn detach(&mut self, surface: SurfaceId) {
        self.attached.retain(|s| *s != surface);
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub alerts: RefCell<Vec<String>>,
    pub validations: RefCell<Vec<String>>,
    pub errors: RefCell<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn alert(&self, message: &str) {
        self.alerts.borrow_mut().push(message.to_string());
    }

    fn validation(&self, message: &str) {
        self.validations.borrow_mut().push(message.to_string());
    }

    fn contract_error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    pub redirects: RefCell<Vec<Duration>>,
}

impl Navigator for RecordingNavigator {
    fn navigate_to_gallery(&self, after: Duration) {
        self.redirects.borrow_mut().push(after);
    }
}

pub fn harness(notifier: Rc<dyn Notifier>, capture: CaptureSettings) -> Harness<TestMount, FrameQueue> {
    Harness::new(
        SceneHost::new(Box::new(SoftwareRendererFactory), CameraSettings::default()),
        TestMount::default(),
        FrameQueue::new(),
        notifier,
        CaptureSubsystem::mjpeg(capture),
        Color::BACKGROUND,
    )
}

/// Pump `count` frames spaced one display refresh apart, starting after `from`
pub fn run_frames(harness: &mut Harness<TestMount, FrameQueue>, from: Instant, count: u32) -> Instant {
    let mut now = from;
    for _ in 0..count {
        now += FRAME;
        harness.pump(now);
    }
    now
}

/// Box that counts its updates and can be told to fault
#[derive(Debug, Clone, Default)]
pub struct Spinner {
    pub updates: Rc<Cell<u32>>,
    pub last_elapsed: Rc<Cell<f32>>,
    pub fail_after: Option<u32>,
    pub panic_after: Option<u32>,
}

impl AnimationContract for Spinner {
    fn init(&mut self, scene: &mut Scene) -> Option<NodeId> {
        let geometry = scene.create_geometry(Shape::cube(1.0));
        let material = scene.create_material(MaterialDesc::normal());
        let id = scene.create_mesh(geometry, material);
        scene.add(id);
        Some(id)
    }

    fn update(&mut self, mut object: ObjectMut<'_>, elapsed: f32) -> anyhow::Result<()> {
        let count = self.updates.get() + 1;
        self.updates.set(count);
        self.last_elapsed.set(elapsed);
        if self.panic_after.is_some_and(|n| count > n) {
            panic!("spinner panicked on update {count}");
        }
        if self.fail_after.is_some_and(|n| count > n) {
            anyhow::bail!("spinner failed on update {count}");
        }
        object.transform_mut().rotation.y = elapsed;
        Ok(())
    }

    fn name(&self) -> &str {
        "spinner"
    }
}
