use crate::traits::{FrameRequest, FrameScheduler};

/// Cooperative frame scheduler for a single-threaded host loop
///
/// The host calls [`FrameScheduler::take_due`] once per paint (winit's
/// `RedrawRequested`) and dispatches the returned requests.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_id: u64,
    pending: Vec<FrameRequest>,
    requested: u64,
    cancelled: u64,
    fired: u64,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of callbacks waiting for the next paint
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, request: FrameRequest) -> bool {
        self.pending.contains(&request)
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl FrameScheduler for FrameQueue {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        self.requested += 1;
        let request = FrameRequest(self.next_id);
        self.pending.push(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let before = self.pending.len();
        self.pending.retain(|r| *r != request);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }

    fn take_due(&mut self) -> Vec<FrameRequest> {
        let due = std::mem::take(&mut self.pending);
        self.fired += due.len() as u64;
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_are_unique() {
        let mut queue = FrameQueue::new();
        let a = queue.request_frame();
        let b = queue.request_frame();
        assert_ne!(a, b);
        assert_eq!(queue.pending(), 2);
    }

    #[test]
    fn test_cancelled_request_never_fires() {
        let mut queue = FrameQueue::new();
        let a = queue.request_frame();
        queue.cancel_frame(a);

        assert!(!queue.is_pending(a));
        assert!(queue.take_due().is_empty());
        assert_eq!(queue.cancelled(), 1);
        assert_eq!(queue.fired(), 0);
    }

    #[test]
    fn test_cancel_after_fire_is_ignored() {
        let mut queue = FrameQueue::new();
        let a = queue.request_frame();
        assert_eq!(queue.take_due(), vec![a]);

        queue.cancel_frame(a);
        assert_eq!(queue.cancelled(), 0);
        assert_eq!(queue.fired(), 1);
    }

    #[test]
    fn test_requests_made_during_dispatch_wait_for_next_paint() {
        let mut queue = FrameQueue::new();
        queue.request_frame();

        let due = queue.take_due();
        assert_eq!(due.len(), 1);
        let next = queue.request_frame();

        assert_eq!(queue.take_due(), vec![next]);
        assert_eq!(queue.requested(), 2);
    }
}
