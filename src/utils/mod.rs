//! Utility modules

pub mod memory;
pub mod money;
pub mod validation;

pub use memory::*;
pub use money::*;
pub use validation::*;
