//! Datasets with a per-batch input dimension, batch sampling and loading.

mod annotation;
mod collate;
mod dataloader;
mod dataset;
mod image_folder;
mod sampler;
pub mod transform;

pub use annotation::*;
pub use collate::*;
pub use dataloader::*;
pub use dataset::*;
pub use image_folder::*;
pub use sampler::*;
