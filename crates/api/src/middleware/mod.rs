//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors, installed by the binary)
//! 2. `TraceLayer` (request tracing)
//! 3. CORS (credentialed requests from the configured origins)
//! 4. Request ID (add unique ID to each request)
//! 5. Session layer (tower-sessions)
//! 6. Rate limiting on `/api/auth` (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod session;

pub use auth::{RequireAuth, clear_current_user, set_current_user};
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
pub use session::create_session_layer;
