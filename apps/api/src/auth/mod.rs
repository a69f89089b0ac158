// Login, credential records and request sessions.

pub mod credentials;
pub mod handlers;
pub mod session;

pub use session::{AuthedProfile, SessionKeys};
