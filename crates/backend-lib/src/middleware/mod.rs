// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the talent-lobby HTTP control plane.

pub mod rate_limit;

pub use rate_limit::rate_limit;

#[cfg(test)]
mod tests;
