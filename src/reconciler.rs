use std::rc::Rc;
use std::time::Instant;

use crate::capture::{CaptureState, CaptureSubsystem, Clip};
use crate::error::{HarnessError, HarnessResult};
use crate::host::{GenerationId, SceneGeneration, SceneHost};
use crate::math::Color;
use crate::render_loop::{LoopState, RenderLoop, TickOutcome};
use crate::scene::ResourceLedger;
use crate::traits::{FrameRequest, FrameScheduler, Mount, Notifier, UserDefinition};

/// What the mount point currently shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessStatus {
    /// No definition yet; neutral placeholder, nothing allocated
    Placeholder,
    Running(GenerationId),
    /// `update` faulted; the generation stays allocated but no longer ticks
    Halted(GenerationId),
    /// `init` of this definition version violated the contract
    Failed { version: u64 },
}

struct LiveGeneration {
    generation: SceneGeneration,
    frame_loop: RenderLoop,
}

/// Lifecycle Reconciler - keeps exactly zero or one generation live
///
/// A new definition version or background color tears the live generation
/// down (frame loop cancelled first, then resources released) before the
/// next one is created.
pub struct Harness<M: Mount, S: FrameScheduler> {
    host: SceneHost,
    mount: M,
    scheduler: S,
    notifier: Rc<dyn Notifier>,
    capture: CaptureSubsystem,
    definition: Option<UserDefinition>,
    background: Color,
    live: Option<LiveGeneration>,
    failed_version: Option<u64>,
    capture_outcome: Option<HarnessResult<Clip>>,
}

impl<M: Mount, S: FrameScheduler> Harness<M, S> {
    pub fn new(
        host: SceneHost,
        mount: M,
        scheduler: S,
        notifier: Rc<dyn Notifier>,
        capture: CaptureSubsystem,
        background: Color,
    ) -> Self {
        log::debug!("harness mounted, showing placeholder");
        Self {
            host,
            mount,
            scheduler,
            notifier,
            capture,
            definition: None,
            background,
            live: None,
            failed_version: None,
            capture_outcome: None,
        }
    }

    // === Accessors ===

    pub fn status(&self) -> HarnessStatus {
        match (&self.live, self.failed_version) {
            (Some(live), _) if live.frame_loop.state() == LoopState::Halted => {
                HarnessStatus::Halted(live.generation.id())
            }
            (Some(live), _) => HarnessStatus::Running(live.generation.id()),
            (None, Some(version)) => HarnessStatus::Failed { version },
            (None, None) => HarnessStatus::Placeholder,
        }
    }

    /// Fill color shown when no generation is live
    pub fn placeholder_color(&self) -> Color {
        Color::PLACEHOLDER
    }

    pub fn generation(&self) -> Option<&SceneGeneration> {
        self.live.as_ref().map(|live| &live.generation)
    }

    pub fn definition_version(&self) -> Option<u64> {
        self.definition.as_ref().map(UserDefinition::version)
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn host(&self) -> &SceneHost {
        &self.host
    }

    pub fn ledger(&self) -> &ResourceLedger {
        self.host.ledger()
    }

    pub fn mount(&self) -> &M {
        &self.mount
    }

    pub fn mount_mut(&mut self) -> &mut M {
        &mut self.mount
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn capture(&self) -> &CaptureSubsystem {
        &self.capture
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture.state()
    }

    // === Reconciliation ===

    /// Swap in a new definition; the same version again is a no-op
    pub fn set_definition(&mut self, definition: UserDefinition, now: Instant) {
        if self.definition_version() == Some(definition.version()) {
            log::debug!("definition v{} already live", definition.version());
            return;
        }
        log::info!("definition changed to '{}' v{}", definition.name(), definition.version());
        self.teardown();
        self.definition = Some(definition);
        self.reconcile(now);
    }

    pub fn set_background(&mut self, background: Color, now: Instant) {
        if background == self.background {
            return;
        }
        log::info!("background changed to {:#08x}", background.0);
        self.teardown();
        self.background = background;
        self.reconcile(now);
    }

    fn reconcile(&mut self, now: Instant) {
        debug_assert!(self.live.is_none());
        self.failed_version = None;

        let Some(definition) = self.definition.as_mut() else {
            return;
        };

        match self
            .host
            .create_generation(&mut self.mount, definition, self.background)
        {
            Ok(generation) => {
                let mut frame_loop = RenderLoop::new(generation.id());
                frame_loop.start(&mut self.scheduler, now);
                self.notifier.clear_contract_error();
                self.live = Some(LiveGeneration {
                    generation,
                    frame_loop,
                });
            }
            Err(e) => {
                self.failed_version = Some(definition.version());
                self.notifier.contract_error(&e.to_string());
            }
        }
    }

    /// Cancel the live frame loop, then release the generation
    fn teardown(&mut self) {
        let Some(mut live) = self.live.take() else {
            return;
        };
        live.frame_loop.cancel(&mut self.scheduler);
        self.host.dispose_generation(live.generation, &mut self.mount);
    }

    // === Frames ===

    /// Dispatch one fired frame request
    pub fn on_frame(&mut self, request: FrameRequest, now: Instant) {
        let Some(live) = self.live.as_mut() else {
            log::trace!("frame request {:?} with no live generation", request);
            return;
        };
        let Some(definition) = self.definition.as_mut() else {
            return;
        };

        let outcome = live.frame_loop.tick(
            request,
            &mut live.generation,
            definition.contract_mut(),
            &mut self.scheduler,
            now,
        );
        if let TickOutcome::Halted(e) = outcome {
            self.notifier.contract_error(&e.to_string());
        }
    }

    /// Run every due frame, then advance capture; returns frames dispatched
    pub fn pump(&mut self, now: Instant) -> usize {
        let due = self.scheduler.take_due();
        for request in &due {
            self.on_frame(*request, now);
        }
        self.poll_capture(now);
        due.len()
    }

    /// Re-read the mount's viewport and resize the live generation in place
    pub fn on_resize(&mut self) {
        let viewport = self.mount.viewport();
        if let Some(live) = self.live.as_mut() {
            self.host.resize(&mut live.generation, viewport);
        }
    }

    // === Capture ===

    /// Start recording the live generation's output surface
    pub fn start_capture(&mut self, now: Instant) -> HarnessResult<()> {
        let surface = self
            .live
            .as_ref()
            .filter(|live| live.frame_loop.state() == LoopState::Running)
            .map(|live| live.generation.surface());
        self.capture_outcome = None;
        self.capture.start(surface.as_deref(), now)
    }

    /// Advance the capture session; also driven by the host's timer
    pub fn poll_capture(&mut self, now: Instant) {
        if let Some(outcome) = self.capture.poll(now) {
            self.capture_outcome = Some(outcome);
        }
    }

    /// Finished capture, handed over once
    pub fn take_capture_outcome(&mut self) -> Option<HarnessResult<Clip>> {
        self.capture_outcome.take()
    }

    /// Last rendered frame of the live generation
    pub fn frame_pixels(&self) -> Option<(u32, u32, &[u8])> {
        self.live
            .as_ref()
            .map(|live| live.generation.renderer().pixels())
    }
}

impl<M: Mount, S: FrameScheduler> Drop for Harness<M, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// `start_capture` failure that the submission flow reports to the user
pub fn is_capture_start_error(error: &HarnessError) -> bool {
    matches!(error, HarnessError::NoSurface | HarnessError::SessionBusy)
}
