use crate::Activation;
use tch::{nn, Tensor};

impl nn::Module for Activation {
    fn forward(&self, xs: &Tensor) -> Tensor {
        use Activation::*;

        match *self {
            Linear => xs.shallow_clone(),
            Relu => xs.relu(),
            Leaky(slope) => leaky_relu_ext(xs, Some(slope)),
            Logistic => xs.sigmoid(),
            Mish => xs.mish(),
            Swish => swish(xs),
            Tanh => xs.tanh(),
        }
    }
}

pub fn swish(tensor: &Tensor) -> Tensor {
    tensor * tensor.sigmoid()
}

pub fn leaky_relu_ext(tensor: &Tensor, negative_slope: Option<f64>) -> Tensor {
    tensor.maximum(&(tensor * negative_slope.unwrap_or(0.01)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::nn::Module as _;

    #[test]
    fn leaky_activation_test() {
        let input = Tensor::of_slice(&[-10.0f32, -1.0, 0.0, 2.0]);
        let output = Activation::Leaky(0.1).forward(&input);
        let values = Vec::<f32>::from(&output);
        let expect = [-1.0f32, -0.1, 0.0, 2.0];
        values
            .iter()
            .zip(expect.iter())
            .for_each(|(lhs, rhs)| assert!((lhs - rhs).abs() <= 1e-6));
    }

    #[test]
    fn linear_activation_is_identity() {
        let input = Tensor::of_slice(&[-3.0f32, 5.0]);
        let output = Activation::Linear.forward(&input);
        assert_eq!(Vec::<f32>::from(&output), vec![-3.0, 5.0]);
    }
}
