use crate::core::{SurfaceId, Viewport};

/// Mount point - the host element a renderer's output surface lives in
pub trait Mount {
    /// Current client size and device pixel ratio
    fn viewport(&self) -> Viewport;

    /// Attach a renderer's output surface
    fn attach(&mut self, surface: SurfaceId);

    /// Detach a previously attached surface
    fn detach(&mut self, surface: SurfaceId);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mock mount for testing trait implementation
    struct MockMount {
        viewport: Viewport,
        attached: Vec<SurfaceId>,
    }

    impl Mount for MockMount {
        fn viewport(&self) -> Viewport {
            self.viewport
        }

        fn attach(&mut self, surface: SurfaceId) {
            self.attached.push(surface);
        }

        fn detach(&mut self, surface: SurfaceId) {
            self.attached.retain(|s| *s != surface);
        }
    }

    #[test]
    fn test_mount_attach_detach() {
        let mut mount = MockMount {
            viewport: Viewport::new(800, 600, 1.0),
            attached: Vec::new(),
        };

        mount.attach(SurfaceId(1));
        mount.attach(SurfaceId(2));
        mount.detach(SurfaceId(1));

        assert_eq!(mount.attached, vec![SurfaceId(2)]);
        assert_eq!(mount.viewport().width, 800);
    }

    #[test]
    fn test_mount_as_trait_object() {
        let mut mount: Box<dyn Mount> = Box::new(MockMount {
            viewport: Viewport::new(10, 20, 2.0),
            attached: Vec::new(),
        });
        mount.attach(SurfaceId(9));
        assert_eq!(mount.viewport().physical_size(), (20, 40));
    }
}
