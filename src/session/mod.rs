pub mod manager;
pub mod store;
pub mod token;

pub use manager::{LoginOutcome, LogoutReason, SessionEvent, SessionManager};
pub use store::{PersistedSession, SessionStore};
