//! Authentication plumbing: cookies, extractors, and the route guard.

mod cookie;
mod errors;
mod extractors;
mod guard;
mod state;

pub use cookie::{
    ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME, REFRESH_COOKIE_PATH, SetCookie, get_cookie,
};
pub use errors::{ApiAuthError, AuthErrorKind};
pub use extractors::{ApiAuth, AuthenticatedUser};
pub use guard::{DASHBOARD_PATH, GuardState, LANDING_PATH, PROTECTED_PREFIXES, route_guard};
pub use state::HasAuthState;
