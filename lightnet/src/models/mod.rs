//! Network architectures.

mod darknet;
mod darknet19;
mod yolt;

pub use darknet::*;
pub use darknet19::*;
pub use yolt::*;

use crate::common::*;

/// A conv/batch-norm/leaky block keeping the spatial size.
fn convbatch<'p>(in_c: usize, out_c: usize, k: usize) -> impl FnOnce(nn::Path<'p>) -> Conv2dBatchReLU {
    move |path| Conv2dBatchReLUInit::new(in_c, out_c, k, 1, k / 2).build(path)
}

/// A 2x2 max-pool halving the spatial size.
fn max_pool<'p>() -> impl FnOnce(nn::Path<'p>) -> MaxPool2D {
    |_| MaxPool2D::new(2, 2)
}
