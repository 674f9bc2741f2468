pub mod clock;
pub mod frame;
pub mod gpu_context;
pub mod present;
pub mod scheduler;
pub mod timer;
pub mod viewport;

pub use clock::Clock;
pub use frame::{FrameStream, OutputSurface, SurfaceFrame, SurfaceId};
pub use gpu_context::GpuContext;
pub use present::SurfacePresenter;
pub use scheduler::FrameQueue;
pub use timer::{Countdown, FixedRate, Throttled};
pub use viewport::Viewport;
