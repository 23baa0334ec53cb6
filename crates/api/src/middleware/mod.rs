//! HTTP middleware stack for the API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Path normalization (trailing slashes), applied around the router
//! 2. Sentry layers (hub per request, HTTP context)
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//!
//! Authentication is an extractor ([`RequireAuth`]) rather than a layer, so
//! only the handlers that ask for a user pay for the token lookup.

pub mod auth;
pub mod request_id;

pub use auth::RequireAuth;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
