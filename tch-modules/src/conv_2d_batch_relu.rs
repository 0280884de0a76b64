use crate::{
    batch_norm_2d::{BatchNorm2D, BatchNorm2DInit},
    common::*,
};

/// Convolution without bias, followed by batch normalization and an activation.
///
/// The convolution parameters are registered under `layers.0` and the batch
/// normalization under `layers.1`, matching the layout of exported weights
/// of the reference networks.
#[derive(Debug, Clone)]
pub struct Conv2dBatchReLUInit {
    pub in_c: usize,
    pub out_c: usize,
    pub k: usize,
    pub s: usize,
    pub p: usize,
    pub activation: Activation,
    pub batch_norm: BatchNorm2DInit,
}

impl Conv2dBatchReLUInit {
    pub fn new(in_c: usize, out_c: usize, k: usize, s: usize, p: usize) -> Self {
        Self {
            in_c,
            out_c,
            k,
            s,
            p,
            activation: Activation::default(),
            batch_norm: Default::default(),
        }
    }

    pub fn build<'p, P>(self, path: P) -> Conv2dBatchReLU
    where
        P: Borrow<nn::Path<'p>>,
    {
        let path = path.borrow();
        let layers = path / "layers";

        let Self {
            in_c,
            out_c,
            k,
            s,
            p,
            activation,
            batch_norm,
        } = self;

        let conv = nn::conv2d(
            &layers / "0",
            in_c as i64,
            out_c as i64,
            k as i64,
            nn::ConvConfig {
                stride: s as i64,
                padding: p as i64,
                bias: false,
                ..Default::default()
            },
        );
        let bn = batch_norm.build(&layers / "1", out_c as i64);

        Conv2dBatchReLU {
            conv,
            bn,
            activation,
        }
    }
}

#[derive(Debug)]
pub struct Conv2dBatchReLU {
    conv: nn::Conv2D,
    bn: BatchNorm2D,
    activation: Activation,
}

impl nn::ModuleT for Conv2dBatchReLU {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        let Self {
            ref conv,
            ref bn,
            activation,
        } = *self;

        bn.forward_t(&xs.apply(conv), train).activation(activation)
    }
}

impl Conv2dBatchReLU {
    pub fn out_channels(&self) -> i64 {
        self.bn.num_features()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::kind::FLOAT_CPU;

    #[test]
    fn conv_batch_relu_shape() {
        let vs = nn::VarStore::new(Device::Cpu);
        let layer = Conv2dBatchReLUInit::new(3, 16, 3, 1, 1).build(&vs.root() / "block");

        let input = Tensor::rand(&[2, 3, 8, 8], FLOAT_CPU);
        let output = layer.forward_t(&input, true);
        assert_eq!(output.size(), [2, 16, 8, 8]);
        assert_eq!(layer.out_channels(), 16);
    }

    #[test]
    fn conv_batch_relu_parameter_names() {
        let vs = nn::VarStore::new(Device::Cpu);
        let _layer = Conv2dBatchReLUInit::new(3, 8, 1, 1, 0).build(&vs.root() / "block");

        let mut names: Vec<_> = vs.variables().into_keys().collect();
        names.sort();
        assert_eq!(
            names,
            [
                "block.layers.0.weight",
                "block.layers.1.bias",
                "block.layers.1.running_mean",
                "block.layers.1.running_var",
                "block.layers.1.weight",
            ]
        );
    }
}
