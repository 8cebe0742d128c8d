pub mod current_user;

pub use current_user::{AuthError, CurrentUser};

/// Scope required by the read-only resource endpoints
pub const READ_SCOPE: &str = "read";
/// Scope required by the resource endpoints that change state
pub const WRITE_SCOPE: &str = "write";
