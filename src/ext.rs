//! Public extension contracts.
//!
//! Hooks observe traffic without being able to alter it. Custom transports plug in through
//! [`crate::http::HttpTransport`] instead.

pub mod hook;

pub use hook::*;
