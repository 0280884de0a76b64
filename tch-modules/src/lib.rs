//! Layer building blocks and the module tree used by the networks.

mod common;

pub mod batch_norm_2d;
pub mod concat_2d;
pub mod conv_2d;
pub mod conv_2d_batch_relu;
pub mod flatten;
pub mod global_avg_pool_2d;
pub mod layer;
pub mod layer_list;
pub mod max_pool_2d;
pub mod reorg;
pub mod sequential;

pub use batch_norm_2d::*;
pub use concat_2d::*;
pub use conv_2d::*;
pub use conv_2d_batch_relu::*;
pub use flatten::*;
pub use global_avg_pool_2d::*;
pub use layer::*;
pub use layer_list::*;
pub use max_pool_2d::*;
pub use reorg::*;
pub use sequential::*;
pub use tch_act::Activation;
