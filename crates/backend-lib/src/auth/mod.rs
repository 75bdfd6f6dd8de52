// ============================
// talentlobby-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod extractor;
pub mod session;
pub mod token_generator;
mod service;

pub use extractor::{AuthUser, SESSION_COOKIE};
pub use service::{AuthService, DefaultAuth};
pub use session::{Session, SessionManager, UserRole, SESSION_TTL};
