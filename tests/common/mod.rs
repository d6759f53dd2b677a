pub mod fixtures;
pub mod gateways;

pub use fixtures::*;
pub use gateways::*;
