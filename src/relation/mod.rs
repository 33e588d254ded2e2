//! Relation mutation inputs and the ordering engine keeping join-table order
//! intact across draft/publish transitions.

mod bidirectional;
mod extract;
mod input;
mod orderer;
mod plan;
mod resolve;

pub use bidirectional::*;
pub use extract::*;
pub use input::*;
pub use orderer::*;
pub use plan::*;
pub use resolve::*;
