use std::rc::Rc;
use std::time::Instant;

use crate::camera::PerspectiveCamera;
use crate::core::{OutputSurface, SurfaceId, Viewport};
use crate::scene::{ResourceLedger, Scene};

/// Renderer - draws a scene through a camera into its output surface
pub trait Renderer {
    /// Current drawing buffer viewport
    fn viewport(&self) -> Viewport;

    /// Resize the drawing buffer without recreating the renderer
    fn set_viewport(&mut self, viewport: Viewport);

    /// Draw one frame and publish it, stamped `now`, on the output surface
    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera, now: Instant);

    /// Output surface streaming drawn frames
    fn surface(&self) -> Rc<OutputSurface>;

    /// Last drawn frame as tightly packed RGBA8 with its physical size
    fn pixels(&self) -> (u32, u32, &[u8]);

    /// Release GPU-side resources; the surface is closed
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

/// Creates one renderer per scene generation
pub trait RendererFactory {
    fn create(&mut self, viewport: Viewport, surface: SurfaceId, ledger: &ResourceLedger) -> Box<dyn Renderer>;
}
