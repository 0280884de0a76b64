use crate::common::*;

/// Flattens every dimension but the batch dimension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flatten {
    _private: [u8; 0],
}

impl Flatten {
    pub fn new() -> Self {
        Self { _private: [] }
    }
}

impl nn::Module for Flatten {
    fn forward(&self, xs: &Tensor) -> Tensor {
        xs.flatten(1, -1)
    }
}
