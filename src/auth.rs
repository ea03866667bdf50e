//! Credential types and the access token lifecycle.

pub mod manager;
pub mod secret;
pub mod token;

pub use manager::*;
pub use secret::*;
pub use token::*;
