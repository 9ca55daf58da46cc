//! Authentication and authorization
//!
//! - [`pin`] - argon2 PIN hashing
//! - [`JwtService`] - token issue and validation
//! - [`authenticate`] / [`require_admin`] - middleware
//! - [`RateLimiter`] - PIN check throttling

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod pin;
pub mod rate_limit;

pub use extractor::{ClientIp, Operator};
pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{authenticate, require_admin};
pub use rate_limit::{RateLimiter, pin_rate_limit};
