use crate::common::*;

/// Channel-wise concatenation of feature maps with equal batch and spatial sizes.
#[derive(Debug)]
pub struct Concat2D {
    _private: [u8; 0],
}

impl Concat2D {
    pub fn new() -> Self {
        Self { _private: [] }
    }

    pub fn forward(
        &self,
        tensors: impl IntoIterator<Item = impl Borrow<Tensor>>,
    ) -> Result<Tensor> {
        let tensors: Vec<_> = tensors.into_iter().collect();
        let shapes: Vec<_> = tensors
            .iter()
            .map(|tensor| tensor.borrow().size4())
            .try_collect()?;

        let (b, _, h, w) = *shapes
            .first()
            .ok_or_else(|| format_err!("empty input is not allowed"))?;
        ensure!(
            shapes.iter().all(|&(bi, _, hi, wi)| (bi, hi, wi) == (b, h, w)),
            "feature maps must share batch and spatial sizes, but get {:?}",
            shapes
        );

        let output = Tensor::f_cat(&tensors, 1)?;
        Ok(output)
    }
}

impl Default for Concat2D {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::kind::FLOAT_CPU;

    #[test]
    fn concat_channels() {
        let lhs = Tensor::rand(&[2, 3, 4, 4], FLOAT_CPU);
        let rhs = Tensor::rand(&[2, 5, 4, 4], FLOAT_CPU);
        let output = Concat2D::new().forward(&[lhs, rhs]).unwrap();
        assert_eq!(output.size(), [2, 8, 4, 4]);
    }

    #[test]
    fn concat_rejects_mismatched_sizes() {
        let lhs = Tensor::rand(&[2, 3, 4, 4], FLOAT_CPU);
        let rhs = Tensor::rand(&[2, 3, 2, 2], FLOAT_CPU);
        assert!(Concat2D::new().forward(&[lhs, rhs]).is_err());
        assert!(Concat2D::new().forward(Vec::<Tensor>::new()).is_err());
    }
}
