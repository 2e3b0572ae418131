//! Client-facing side: session registry and per-client streaming sessions

pub mod registry;
pub mod session;

pub use registry::ClientRegistry;
pub use session::{ClientSession, SessionPhase};
