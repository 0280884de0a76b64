//! Network base type, weight files and parameter key remapping.

mod lightnet;
mod network;
mod remap;
mod weights;

pub use self::lightnet::*;
pub use network::*;
pub use remap::*;
pub use weights::*;
