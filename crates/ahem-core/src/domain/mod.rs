//! Domain model (IDs, users, scopes, notifications, records, errors).

pub mod context;
pub mod deferred;
pub mod errors;
pub mod ids;
pub mod notification;
pub mod scope;
pub mod user;
pub mod user_backend;

pub use self::context::Context;
pub use self::deferred::DeferredNotification;
pub use self::errors::{AhemError, BackendError};
pub use self::ids::{DeferredId, TaskId, UserBackendId, UserId};
pub use self::notification::{DEFAULT_TEMPLATE, Notification};
pub use self::scope::{ContextFilterScope, QuerySetScope, Scope, ScopeResolver};
pub use self::user::{User, UserFilter};
pub use self::user_backend::UserBackendRegistry;
