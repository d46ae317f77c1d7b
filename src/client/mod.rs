//! Typed client for the candidate auth API, used by the careers site and
//! by integration tooling.

mod api;
mod flow;
mod session;

pub use api::{ApiClient, ClientError};
pub use flow::{login, logout, RegistrationFlow, RegistrationStep, ResetFlow, ResetStep};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionError, SessionStore};
