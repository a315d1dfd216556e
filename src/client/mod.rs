pub mod facade;
pub mod health;
pub mod queue;
pub mod registry;

pub use facade::{ApiClient, FlushOutcome};
pub use health::HealthTracker;
pub use queue::PendingEventQueue;
pub use registry::ClientRegistry;
