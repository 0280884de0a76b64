use crate::common::*;

#[derive(Debug, Clone)]
pub struct BatchNorm2DInit {
    pub cudnn_enabled: bool,
    pub eps: R64,
    pub momentum: R64,
    pub ws_init: nn::Init,
    pub bs_init: nn::Init,
}

impl Default for BatchNorm2DInit {
    fn default() -> Self {
        Self {
            cudnn_enabled: true,
            eps: r64(1e-5),
            momentum: r64(0.1),
            ws_init: nn::Init::Const(1.0),
            bs_init: nn::Init::Const(0.0),
        }
    }
}

impl BatchNorm2DInit {
    pub fn build<'a>(self, path: impl Borrow<nn::Path<'a>>, out_dim: i64) -> BatchNorm2D {
        let path = path.borrow();
        let Self {
            cudnn_enabled,
            eps,
            momentum,
            ws_init,
            bs_init,
        } = self;

        BatchNorm2D {
            ws: path.var("weight", &[out_dim], ws_init),
            bs: path.var("bias", &[out_dim], bs_init),
            running_mean: path.zeros_no_train("running_mean", &[out_dim]),
            running_var: path.ones_no_train("running_var", &[out_dim]),
            cudnn_enabled,
            eps: eps.raw(),
            momentum: momentum.raw(),
        }
    }
}

/// Batch normalization over the channel dimension of `[N, C, H, W]` inputs.
///
/// The running statistics are stored as non-trainable variables, so they are
/// part of saved weights but ignored by optimizers.
#[derive(Debug)]
pub struct BatchNorm2D {
    ws: Tensor,
    bs: Tensor,
    running_mean: Tensor,
    running_var: Tensor,
    cudnn_enabled: bool,
    eps: f64,
    momentum: f64,
}

impl nn::ModuleT for BatchNorm2D {
    fn forward_t(&self, input: &Tensor, train: bool) -> Tensor {
        let Self {
            ref ws,
            ref bs,
            ref running_mean,
            ref running_var,
            cudnn_enabled,
            eps,
            momentum,
        } = *self;

        Tensor::batch_norm(
            input,
            Some(ws),
            Some(bs),
            Some(running_mean),
            Some(running_var),
            train,
            momentum,
            eps,
            cudnn_enabled,
        )
    }
}

impl BatchNorm2D {
    pub fn num_features(&self) -> i64 {
        self.ws.size()[0]
    }

    pub fn running_mean(&self) -> &Tensor {
        &self.running_mean
    }

    pub fn running_var(&self) -> &Tensor {
        &self.running_var
    }
}
