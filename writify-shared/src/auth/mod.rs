//! Authentication for Writify
//!
//! Sign-in is delegated entirely to Google; we never see a password.
//!
//! - `oauth`: the Google authorization-code flow (authorize URL, code
//!   exchange, userinfo fetch) and the institutional email-domain policy
//! - `session`: signed session tokens issued after a successful callback,
//!   carried in an HttpOnly cookie
//! - `middleware`: extracting and validating the session on API requests

pub mod middleware;
pub mod oauth;
pub mod session;
