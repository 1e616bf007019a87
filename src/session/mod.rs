pub mod manager;
pub mod pending;
pub mod session;

pub use manager::{ManagerEvent, SessionManager};
pub use pending::{AppliedBreakpoint, PendingBreakpoint, PendingBreakpointKind, PendingBreakpointStore};
pub use session::{BreakpointOptions, DebugSession, RedirectMode, SessionState};
