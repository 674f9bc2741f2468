/// Handle to one scheduled per-frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Per-frame callback primitive of the host (display refresh driven)
///
/// Single-threaded and cooperative: requests only fire when the host drains
/// them, so a cancelled request can never fire.
pub trait FrameScheduler {
    /// Schedule one callback for the next paint
    fn request_frame(&mut self) -> FrameRequest;

    /// Cancel a pending callback; unknown or fired requests are ignored
    fn cancel_frame(&mut self, request: FrameRequest);

    /// Take every request due for this paint
    fn take_due(&mut self) -> Vec<FrameRequest>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct MockScheduler {
        next: u64,
        pending: Vec<FrameRequest>,
    }

    impl FrameScheduler for MockScheduler {
        fn request_frame(&mut self) -> FrameRequest {
            self.next += 1;
            let request = FrameRequest(self.next);
            self.pending.push(request);
            request
        }

        fn cancel_frame(&mut self, request: FrameRequest) {
            self.pending.retain(|r| *r != request);
        }

        fn take_due(&mut self) -> Vec<FrameRequest> {
            std::mem::take(&mut self.pending)
        }
    }

    #[test]
    fn test_frame_request_hash() {
        let mut set = HashSet::new();
        set.insert(FrameRequest(1));
        set.insert(FrameRequest(1));
        set.insert(FrameRequest(2));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_scheduler_trait_object() {
        let mut scheduler: Box<dyn FrameScheduler> = Box::new(MockScheduler {
            next: 0,
            pending: Vec::new(),
        });

        let a = scheduler.request_frame();
        let b = scheduler.request_frame();
        scheduler.cancel_frame(a);

        assert_eq!(scheduler.take_due(), vec![b]);
        assert!(scheduler.take_due().is_empty());
    }
}
