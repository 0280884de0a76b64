use crate::common::*;

/// Plain 2D convolution with bias, the prediction head of the networks.
#[derive(Debug, Clone)]
pub struct Conv2DInit {
    pub in_c: usize,
    pub out_c: usize,
    pub k: usize,
    pub s: usize,
    pub p: usize,
    pub bias: bool,
}

impl Conv2DInit {
    pub fn new(in_c: usize, out_c: usize, k: usize, s: usize, p: usize) -> Self {
        Self {
            in_c,
            out_c,
            k,
            s,
            p,
            bias: true,
        }
    }

    pub fn build<'p, P>(self, path: P) -> nn::Conv2D
    where
        P: Borrow<nn::Path<'p>>,
    {
        let Self {
            in_c,
            out_c,
            k,
            s,
            p,
            bias,
        } = self;

        nn::conv2d(
            path.borrow(),
            in_c as i64,
            out_c as i64,
            k as i64,
            nn::ConvConfig {
                stride: s as i64,
                padding: p as i64,
                bias,
                ..Default::default()
            },
        )
    }
}
