use std::time::Instant;

use crate::core::Clock;
use crate::error::HarnessError;
use crate::host::{GenerationId, SceneGeneration};
use crate::traits::{AnimationContract, FrameRequest, FrameScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    /// Stopped by a contract violation in `update`
    Halted,
    Cancelled,
}

#[derive(Debug)]
pub enum TickOutcome {
    Rendered { elapsed: f32 },
    /// Request was stale, cancelled or belongs to another generation
    Ignored,
    Halted(HarnessError),
}

/// Frame loop of one generation
///
/// Holds at most one pending frame request. `cancel` withdraws it from the
/// scheduler, and a tick for any request other than the pending one is
/// ignored, so nothing runs against a generation after cancellation.
#[derive(Debug)]
pub struct RenderLoop {
    generation: GenerationId,
    state: LoopState,
    pending: Option<FrameRequest>,
    clock: Option<Clock>,
    frames: u64,
}

impl RenderLoop {
    pub fn new(generation: GenerationId) -> Self {
        Self {
            generation,
            state: LoopState::Idle,
            pending: None,
            clock: None,
            frames: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn generation(&self) -> GenerationId {
        self.generation
    }

    /// Frames rendered so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    /// Start the generation clock and schedule the first tick
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler, now: Instant) {
        if self.state != LoopState::Idle {
            return;
        }
        self.clock = Some(Clock::starting_at(now));
        self.pending = Some(scheduler.request_frame());
        self.state = LoopState::Running;
    }

    /// Run one frame if `request` is this loop's pending request
    pub fn tick(
        &mut self,
        request: FrameRequest,
        generation: &mut SceneGeneration,
        contract: &mut dyn AnimationContract,
        scheduler: &mut dyn FrameScheduler,
        now: Instant,
    ) -> TickOutcome {
        if self.state != LoopState::Running
            || self.pending != Some(request)
            || generation.id() != self.generation
        {
            log::trace!("ignoring frame request {:?} for generation {}", request, self.generation.0);
            return TickOutcome::Ignored;
        }
        self.pending = None;

        let elapsed = self.clock.map(|c| c.elapsed(now)).unwrap_or(0.0);
        match generation.advance(contract, elapsed, now) {
            Ok(()) => {
                self.frames += 1;
                self.pending = Some(scheduler.request_frame());
                TickOutcome::Rendered { elapsed }
            }
            Err(e) => {
                self.state = LoopState::Halted;
                log::error!("generation {} halted: {}", self.generation.0, e);
                TickOutcome::Halted(e)
            }
        }
    }

    /// Withdraw the pending request; must run before the generation is disposed
    pub fn cancel(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(request) = self.pending.take() {
            scheduler.cancel_frame(request);
        }
        self.state = LoopState::Cancelled;
        log::debug!(
            "frame loop of generation {} cancelled after {} frames",
            self.generation.0,
            self.frames
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraSettings;
    use crate::core::{FrameQueue, SurfaceId, Viewport};
    use crate::host::SceneHost;
    use crate::math::Color;
    use crate::renderer::SoftwareRendererFactory;
    use crate::scene::{MaterialDesc, NodeId, ObjectMut, Scene, Shape};
    use crate::traits::{Mount, UserDefinition};

    struct NullMount;

    impl Mount for NullMount {
        fn viewport(&self) -> Viewport {
            Viewport::new(16, 16, 1.0)
        }
        fn attach(&mut self, _surface: SurfaceId) {}
        fn detach(&mut self, _surface: SurfaceId) {}
    }

    struct Spinner {
        fail_after: Option<u32>,
        calls: u32,
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
            self.calls += 1;
            if Some(self.calls) == self.fail_after {
                anyhow::bail!("spin exploded");
            }
            object.transform_mut().rotation.y = elapsed;
            Ok(())
        }
    }

    fn setup(fail_after: Option<u32>) -> (SceneHost, SceneGeneration, UserDefinition) {
        let mut host = SceneHost::new(Box::new(SoftwareRendererFactory), CameraSettings::default());
        let mut def = UserDefinition::new(
            1,
            Box::new(Spinner {
                fail_after,
                calls: 0,
            }),
        );
        let generation = host.create_generation(&mut NullMount, &mut def, Color::BACKGROUND).unwrap();
        (host, generation, def)
    }

    #[test]
    fn test_first_tick_is_scheduled_not_run() {
        let (mut host, mut generation, mut def) = setup(None);
        let mut queue = FrameQueue::new();
        let mut frame_loop = RenderLoop::new(generation.id());
        let start = Instant::now();

        frame_loop.start(&mut queue, start);
        assert_eq!(frame_loop.frames(), 0);
        assert_eq!(queue.pending(), 1);

        let due = queue.take_due();
        let outcome = frame_loop.tick(
            due[0],
            &mut generation,
            def.contract_mut(),
            &mut queue,
            start + std::time::Duration::from_millis(500),
        );

        assert!(matches!(outcome, TickOutcome::Rendered { elapsed } if (elapsed - 0.5).abs() < 1e-3));
        assert_eq!(queue.pending(), 1);

        frame_loop.cancel(&mut queue);
        host.dispose_generation(generation, &mut NullMount);
    }

    #[test]
    fn test_cancelled_request_is_ignored() {
        let (mut host, mut generation, mut def) = setup(None);
        let mut queue = FrameQueue::new();
        let mut frame_loop = RenderLoop::new(generation.id());
        let now = Instant::now();

        frame_loop.start(&mut queue, now);
        let stale = frame_loop.pending().unwrap();
        frame_loop.cancel(&mut queue);

        assert_eq!(queue.pending(), 0);
        let outcome = frame_loop.tick(stale, &mut generation, def.contract_mut(), &mut queue, now);
        assert!(matches!(outcome, TickOutcome::Ignored));
        assert_eq!(frame_loop.frames(), 0);
        host.dispose_generation(generation, &mut NullMount);
    }

    #[test]
    fn test_update_error_halts_loop() {
        let (mut host, mut generation, mut def) = setup(Some(2));
        let mut queue = FrameQueue::new();
        let mut frame_loop = RenderLoop::new(generation.id());
        let now = Instant::now();
        frame_loop.start(&mut queue, now);

        for _ in 0..2 {
            let due = queue.take_due();
            let outcome = frame_loop.tick(due[0], &mut generation, def.contract_mut(), &mut queue, now);
            if let TickOutcome::Halted(e) = outcome {
                assert!(e.to_string().contains("spin exploded"));
            }
        }

        assert_eq!(frame_loop.state(), LoopState::Halted);
        assert_eq!(frame_loop.frames(), 1);
        assert_eq!(queue.pending(), 0);
        host.dispose_generation(generation, &mut NullMount);
    }
}
