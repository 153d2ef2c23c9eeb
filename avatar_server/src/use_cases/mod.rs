// Use cases layer: session lifecycle workflows.

pub mod session_manager;
pub mod sweep;

#[cfg(test)]
pub(crate) mod test_support;

pub use session_manager::{CloseOutcome, CloseSession, CreatedSession, SendMessage, SessionManager};
pub use sweep::spawn_sweeper;
