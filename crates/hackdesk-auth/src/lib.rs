//! Authentication primitives for hackdesk
//!
//! Session tokens (JWT), password hashing, and the caller identity types
//! consumed by the authorization guard.

pub mod identity;
pub mod jwt;
pub mod password;

pub use identity::{Caller, UserRole};
pub use jwt::{JwtError, JwtValidator, SessionClaims};
pub use password::{hash_password, verify_password, PasswordError};
