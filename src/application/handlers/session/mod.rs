//! Play session command and query handlers.

mod end_session;
mod get_session;
mod list_sessions;
mod start_session;

pub use end_session::{EndSessionCommand, EndSessionHandler, EndSessionResult};
pub use get_session::{GetSessionHandler, GetSessionQuery};
pub use list_sessions::{ListSessionsHandler, ListSessionsQuery, MAX_SESSION_PAGE_SIZE};
pub use start_session::{StartSessionCommand, StartSessionHandler, StartSessionResult};
