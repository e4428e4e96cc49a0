//! Common constants and helpers shared by the façade and the store implementations.

mod constants;
mod util;

pub use constants::*;
pub use util::*;
