use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};

/// Identifies one renderer output surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u64);

/// Frame - one drawn image plus its timing
#[derive(Debug, Clone)]
pub struct SurfaceFrame {
    pub number: u64,
    pub captured_at: Instant,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8
    pub pixels: Rc<[u8]>,
}

impl SurfaceFrame {
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Receiving end of a surface's frame stream
pub type FrameStream = UnboundedReceiver<SurfaceFrame>;

/// Output surface of a renderer, streams every drawn frame to subscribers
///
/// Closing the surface drops all senders, so subscribers observe the end of
/// the stream instead of waiting on frames that will never come.
#[derive(Debug)]
pub struct OutputSurface {
    id: SurfaceId,
    subscribers: RefCell<Vec<UnboundedSender<SurfaceFrame>>>,
    closed: Cell<bool>,
}

impl OutputSurface {
    pub fn new(id: SurfaceId) -> Rc<Self> {
        Rc::new(Self {
            id,
            subscribers: RefCell::new(Vec::new()),
            closed: Cell::new(false),
        })
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// Subscribe to frames drawn from now on
    /// A closed surface hands out an already-terminated stream
    pub fn subscribe(&self) -> FrameStream {
        let (tx, rx) = unbounded();
        if !self.closed.get() {
            self.subscribers.borrow_mut().push(tx);
        }
        rx
    }

    pub fn has_subscribers(&self) -> bool {
        self.subscribers.borrow().iter().any(|tx| !tx.is_closed())
    }

    /// Publish a frame; pixels are only copied when someone is listening
    pub fn publish(&self, number: u64, captured_at: Instant, width: u32, height: u32, pixels: &[u8]) {
        if self.closed.get() {
            return;
        }

        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|tx| !tx.is_closed());
        if subscribers.is_empty() {
            return;
        }

        let frame = SurfaceFrame {
            number,
            captured_at,
            width,
            height,
            pixels: Rc::from(pixels),
        };
        subscribers.retain(|tx| tx.unbounded_send(frame.clone()).is_ok());
    }

    /// End every stream; later publishes are ignored
    pub fn close(&self) {
        self.closed.set(true);
        self.subscribers.borrow_mut().clear();
    }
}
