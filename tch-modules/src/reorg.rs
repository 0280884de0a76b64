use crate::common::*;

/// Space-to-depth rearrangement in the darknet channel ordering.
///
/// An input of shape `[N, C, H, W]` becomes `[N, C * s * s, H / s, W / s]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reorg {
    stride: usize,
}

impl Reorg {
    pub fn new(stride: usize) -> Result<Self> {
        ensure!(stride > 0, "reorg stride must be positive");
        Ok(Self { stride })
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let s = self.stride as i64;
        let (b, c, h, w) = xs.size4()?;
        ensure!(
            h % s == 0 && w % s == 0,
            "input height {} and width {} must be divisible by reorg stride {}",
            h,
            w,
            s
        );
        let (oh, ow) = (h / s, w / s);

        let xs = xs
            .view([b, c, oh, s, ow, s])
            .transpose(3, 4)
            .contiguous()
            .view([b, c, oh * ow, s * s])
            .transpose(2, 3)
            .contiguous()
            .view([b, c, s * s, oh, ow])
            .transpose(1, 2)
            .contiguous()
            .view([b, s * s * c, oh, ow]);

        Ok(xs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::kind::FLOAT_CPU;

    #[test]
    fn reorg_shape() {
        let reorg = Reorg::new(2).unwrap();
        let input = Tensor::rand(&[2, 3, 8, 6], FLOAT_CPU);
        let output = reorg.forward(&input).unwrap();
        assert_eq!(output.size(), [2, 12, 4, 3]);
    }

    #[test]
    fn reorg_groups_pixels_by_offset() {
        let reorg = Reorg::new(2).unwrap();
        let input = Tensor::arange(16, FLOAT_CPU).view([1, 1, 4, 4]);
        let output = reorg.forward(&input).unwrap();

        // the first output channel collects the top-left pixel of every 2x2 cell
        let first = Vec::<f32>::from(&output.i((0, 0)).reshape(&[-1]));
        assert_eq!(first, vec![0.0, 2.0, 8.0, 10.0]);

        let last = Vec::<f32>::from(&output.i((0, 3)).reshape(&[-1]));
        assert_eq!(last, vec![5.0, 7.0, 13.0, 15.0]);
    }

    #[test]
    fn reorg_rejects_indivisible_input() {
        let reorg = Reorg::new(2).unwrap();
        let input = Tensor::rand(&[1, 1, 5, 4], FLOAT_CPU);
        assert!(reorg.forward(&input).is_err());
        assert!(Reorg::new(0).is_err());
    }
}
