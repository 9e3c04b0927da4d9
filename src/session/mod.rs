//! Authentication state: persisted credentials, the shared context, the
//! login/logout operations and the route guard.

mod context;
pub mod guard;
pub mod storage;
mod store;

pub use context::SessionContext;
pub use guard::{GuardState, RouteGuard};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StoredSession};
pub use store::SessionStore;
