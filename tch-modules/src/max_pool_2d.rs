use crate::common::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxPool2D {
    pub kernel: usize,
    pub stride: usize,
}

impl MaxPool2D {
    pub fn new(kernel: usize, stride: usize) -> Self {
        Self { kernel, stride }
    }
}

impl nn::Module for MaxPool2D {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let k = self.kernel as i64;
        let s = self.stride as i64;
        xs.max_pool2d(&[k, k], &[s, s], &[0, 0], &[1, 1], false)
    }
}
