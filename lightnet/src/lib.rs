//! Building blocks of the lightnet detection framework.
//!
//! - [network]: network base type, weight loading and key remapping.
//! - [models]: Darknet, Darknet19 and Yolt architectures.
//! - [data]: resizable datasets, batch sampling and data loading.
//! - [data::transform]: image and annotation preprocessing pipelines.
//! - [engine]: hyperparameter container and training state checkpoints.

mod common;
pub mod data;
pub mod engine;
pub mod models;
pub mod network;

pub use tch_modules as layer;
