pub mod contract;
pub mod mount;
pub mod notify;
pub mod renderer;
pub mod scheduler;
pub mod store;

pub use contract::*;
pub use mount::*;
pub use notify::*;
pub use renderer::*;
pub use scheduler::*;
pub use store::*;
