//! Activation functions shared by the layer library.

#[cfg(feature = "tch")]
pub use impls::*;
#[cfg(feature = "tch")]
mod impls;

#[cfg(feature = "tch")]
pub use r#trait::*;
#[cfg(feature = "tch")]
mod r#trait;

/// The default negative slope of [Activation::Leaky].
pub const DEFAULT_LEAKY_SLOPE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Activation {
    Linear,
    Relu,
    /// Leaky ReLU with the given negative slope.
    Leaky(f64),
    Logistic,
    Mish,
    Swish,
    Tanh,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Leaky(DEFAULT_LEAKY_SLOPE)
    }
}
