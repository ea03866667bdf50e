//! Domain models exchanged with the offers service.

pub mod offer;
pub mod product;

pub use offer::*;
pub use product::*;
