//! Authentication utilities library
//!
//! Provides reusable authentication infrastructure for microservices:
//! - Password hashing (bcrypt, Argon2id)
//! - JWT token issuance and verification (HS256)
//! - Authentication coordination
//! - Route-level authorization decisions
//!
//! Each service defines its own identity store and HTTP wiring and adapts
//! these implementations. Nothing in here performs I/O.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::bcrypt(4);
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! ```
//!
//! ## JWT Tokens
//! ```
//! use std::collections::HashMap;
//!
//! use auth::JwtHandler;
//! use chrono::Duration;
//!
//! let handler = JwtHandler::from_secret("secret_key_at_least_32_bytes_long!").unwrap();
//! let token = handler
//!     .issue("admin@email.com", HashMap::new(), Duration::hours(1))
//!     .unwrap();
//! let claims = handler.parse(&token).unwrap();
//! assert_eq!(claims.sub, "admin@email.com");
//! ```
//!
//! ## Authorization
//! ```
//! use auth::access::{authorize, AccessDecision, AccessState, Principal, Requirement};
//!
//! struct Caller;
//! impl Principal for Caller {
//!     fn has_role(&self, role: &str) -> bool {
//!         role == "USER"
//!     }
//! }
//!
//! let decision = authorize(&AccessState::Authenticated(Caller), &Requirement::role("ADMIN"));
//! assert_eq!(decision, AccessDecision::Forbidden);
//! ```

pub mod access;
pub mod authenticator;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use access::AccessDecision;
pub use access::AccessState;
pub use access::Principal;
pub use access::Requirement;
pub use authenticator::AuthenticationError;
pub use authenticator::Authenticator;
pub use authenticator::IssuedToken;
pub use jwt::Claims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::SigningKey;
pub use password::HashAlgorithm;
pub use password::PasswordError;
pub use password::PasswordHasher;
