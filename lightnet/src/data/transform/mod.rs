//! Image and annotation preprocessing pipelines.
//!
//! A [Compose] chains [Transform]s. Transforms implementing
//! [MultiTransform] accept any [TransformData] kind and dispatch it to the
//! matching handler.

mod compose;
mod data;
mod letterbox;
mod multi;
mod random_flip;

pub use compose::*;
pub use data::*;
pub use letterbox::*;
pub use multi::*;
pub use random_flip::*;
